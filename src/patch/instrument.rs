// Copyright (c) 2024 Mike Tsao

use super::{Generator, GeneratorType, InstrumentRegion, PatchError, PresetRegion};

/// The generator records of one zone, in file order.
pub type Zone = Vec<Generator>;

/// Splits off the global zone, if there is one. The first zone is global when
/// it is empty or doesn't end with the generator that names its target.
fn split_global(zones: &[Zone], terminal: GeneratorType) -> (&[Generator], &[Zone]) {
    match zones.split_first() {
        Some((first, rest))
            if first
                .last()
                .map_or(true, |g| g.generator_type != terminal as u16) =>
        {
            (first.as_slice(), rest)
        }
        _ => (&[], zones),
    }
}

/// A set of sample regions that together make up one playable sound.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Instrument {
    name: String,
    regions: Vec<InstrumentRegion>,
}
impl Instrument {
    /// Resolves the instrument's zones into regions. `sample_count` is the
    /// number of sample headers in the bank, for checking sample IDs.
    pub fn new_with(name: &str, zones: &[Zone], sample_count: usize) -> Result<Self, PatchError> {
        if zones.is_empty() {
            return Err(PatchError::NoZones {
                name: name.to_string(),
            });
        }
        let (global, locals) = split_global(zones, GeneratorType::SampleId);
        let regions = locals
            .iter()
            .map(|local| InstrumentRegion::new_with(name, global, local, sample_count))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: name.to_string(),
            regions,
        })
    }

    #[allow(missing_docs)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[allow(missing_docs)]
    pub fn regions(&self) -> &[InstrumentRegion] {
        &self.regions
    }
}

/// What a MIDI program change selects: a bank/patch number pair and the
/// instrument regions it layers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Preset {
    name: String,
    patch_number: i32,
    bank_number: i32,
    regions: Vec<PresetRegion>,
}
impl Preset {
    /// Resolves the preset's zones into regions. `instrument_count` is the
    /// number of instruments in the bank, for checking instrument IDs.
    pub fn new_with(
        name: &str,
        patch_number: i32,
        bank_number: i32,
        zones: &[Zone],
        instrument_count: usize,
    ) -> Result<Self, PatchError> {
        if zones.is_empty() {
            return Err(PatchError::NoZones {
                name: name.to_string(),
            });
        }
        let (global, locals) = split_global(zones, GeneratorType::Instrument);
        let regions = locals
            .iter()
            .map(|local| PresetRegion::new_with(name, global, local, instrument_count))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: name.to_string(),
            patch_number,
            bank_number,
            regions,
        })
    }

    #[allow(missing_docs)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[allow(missing_docs)]
    pub fn patch_number(&self) -> i32 {
        self.patch_number
    }

    #[allow(missing_docs)]
    pub fn bank_number(&self) -> i32 {
        self.bank_number
    }

    /// The key used for preset lookup: bank in the high 16 bits, patch in the
    /// low.
    pub fn id(&self) -> i32 {
        (self.bank_number << 16) | self.patch_number
    }

    #[allow(missing_docs)]
    pub fn regions(&self) -> &[PresetRegion] {
        &self.regions
    }
}

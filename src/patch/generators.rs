// Copyright (c) 2024 Mike Tsao

use core::ops::Index;
use serde::{Deserialize, Serialize};
use strum::EnumCount;
use strum_macros::{EnumCount as EnumCountMacro, EnumIter, FromRepr, IntoStaticStr};

/// The synthesis parameters a zone can set, numbered as in SoundFont 2.
/// Unused and reserved slots keep their numbers so that the table index of
/// every generator matches its wire value.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumCountMacro, EnumIter, FromRepr, IntoStaticStr,
)]
#[repr(u16)]
#[allow(missing_docs)]
pub enum GeneratorType {
    StartAddressOffset = 0,
    EndAddressOffset = 1,
    StartLoopAddressOffset = 2,
    EndLoopAddressOffset = 3,
    StartAddressCoarseOffset = 4,
    ModulationLfoToPitch = 5,
    VibratoLfoToPitch = 6,
    ModulationEnvelopeToPitch = 7,
    InitialFilterCutoffFrequency = 8,
    InitialFilterQ = 9,
    ModulationLfoToFilterCutoffFrequency = 10,
    ModulationEnvelopeToFilterCutoffFrequency = 11,
    EndAddressCoarseOffset = 12,
    ModulationLfoToVolume = 13,
    Unused1 = 14,
    ChorusEffectsSend = 15,
    ReverbEffectsSend = 16,
    Pan = 17,
    Unused2 = 18,
    Unused3 = 19,
    Unused4 = 20,
    DelayModulationLfo = 21,
    FrequencyModulationLfo = 22,
    DelayVibratoLfo = 23,
    FrequencyVibratoLfo = 24,
    DelayModulationEnvelope = 25,
    AttackModulationEnvelope = 26,
    HoldModulationEnvelope = 27,
    DecayModulationEnvelope = 28,
    SustainModulationEnvelope = 29,
    ReleaseModulationEnvelope = 30,
    KeyNumberToModulationEnvelopeHold = 31,
    KeyNumberToModulationEnvelopeDecay = 32,
    DelayVolumeEnvelope = 33,
    AttackVolumeEnvelope = 34,
    HoldVolumeEnvelope = 35,
    DecayVolumeEnvelope = 36,
    SustainVolumeEnvelope = 37,
    ReleaseVolumeEnvelope = 38,
    KeyNumberToVolumeEnvelopeHold = 39,
    KeyNumberToVolumeEnvelopeDecay = 40,
    Instrument = 41,
    Reserved1 = 42,
    KeyRange = 43,
    VelocityRange = 44,
    StartLoopAddressCoarseOffset = 45,
    KeyNumber = 46,
    Velocity = 47,
    InitialAttenuation = 48,
    Reserved2 = 49,
    EndLoopAddressCoarseOffset = 50,
    CoarseTune = 51,
    FineTune = 52,
    SampleId = 53,
    SampleModes = 54,
    Reserved3 = 55,
    ScaleTuning = 56,
    ExclusiveClass = 57,
    OverridingRootKey = 58,
    Unused5 = 59,
    UnusedEnd = 60,
}
impl GeneratorType {
    /// The number of slots in a [GeneratorTable].
    pub const SLOT_COUNT: usize = Self::COUNT;

    /// Generators that describe the sample itself. When a preset region is
    /// layered over an instrument region, these come from the instrument alone
    /// instead of being summed.
    pub fn is_instrument_only(&self) -> bool {
        matches!(
            self,
            GeneratorType::StartAddressOffset
                | GeneratorType::EndAddressOffset
                | GeneratorType::StartLoopAddressOffset
                | GeneratorType::EndLoopAddressOffset
                | GeneratorType::StartAddressCoarseOffset
                | GeneratorType::EndAddressCoarseOffset
                | GeneratorType::StartLoopAddressCoarseOffset
                | GeneratorType::EndLoopAddressCoarseOffset
                | GeneratorType::KeyRange
                | GeneratorType::VelocityRange
                | GeneratorType::KeyNumber
                | GeneratorType::Velocity
                | GeneratorType::Instrument
                | GeneratorType::SampleId
                | GeneratorType::SampleModes
                | GeneratorType::ExclusiveClass
                | GeneratorType::OverridingRootKey
        )
    }
}

/// One raw (type, amount) record as it appears in a zone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generator {
    /// Wire value of the [GeneratorType]. Values the table doesn't know are
    /// ignored when zones are resolved.
    pub generator_type: u16,
    #[allow(missing_docs)]
    pub value: i16,
}
impl Generator {
    #[allow(missing_docs)]
    pub fn new(generator_type: GeneratorType, value: i16) -> Self {
        Self {
            generator_type: generator_type as u16,
            value,
        }
    }

    /// A [GeneratorType::KeyRange] or [GeneratorType::VelocityRange] record.
    /// The low byte holds the start of the range, the high byte the end.
    pub fn new_range(generator_type: GeneratorType, start: u8, end: u8) -> Self {
        Self::new(
            generator_type,
            (((end as u16) << 8) | start as u16) as i16,
        )
    }
}

/// A resolved set of generator values, one slot per [GeneratorType].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeneratorTable([i16; GeneratorType::SLOT_COUNT]);
impl Default for GeneratorTable {
    fn default() -> Self {
        Self([0; GeneratorType::SLOT_COUNT])
    }
}
impl Index<GeneratorType> for GeneratorTable {
    type Output = i16;

    fn index(&self, index: GeneratorType) -> &Self::Output {
        &self.0[index as usize]
    }
}
impl GeneratorTable {
    /// Overwrites one slot.
    pub fn set(&mut self, generator_type: GeneratorType, value: i16) {
        self.0[generator_type as usize] = value;
    }

    /// Applies a raw record, silently skipping generator types outside the
    /// table.
    pub fn apply(&mut self, generator: &Generator) {
        if let Some(slot) = self.0.get_mut(generator.generator_type as usize) {
            *slot = generator.value;
        }
    }

    /// Applies each record in order, so later records win.
    pub fn apply_all(&mut self, generators: &[Generator]) {
        generators.iter().for_each(|g| self.apply(g));
    }

    /// The low byte of a range slot.
    pub fn range_start(&self, generator_type: GeneratorType) -> u8 {
        (self[generator_type] as u16 & 0xFF) as u8
    }

    /// The high byte of a range slot.
    pub fn range_end(&self, generator_type: GeneratorType) -> u8 {
        ((self[generator_type] as u16 >> 8) & 0xFF) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn generator_numbering_matches_table_index() {
        assert_eq!(GeneratorType::SLOT_COUNT, 61);
        for (i, g) in GeneratorType::iter().enumerate() {
            assert_eq!(g as usize, i);
            assert_eq!(GeneratorType::from_repr(i as u16), Some(g));
        }
        assert_eq!(GeneratorType::from_repr(61), None);
        assert_eq!(
            <&'static str>::from(GeneratorType::OverridingRootKey),
            "OverridingRootKey"
        );
    }

    #[test]
    fn apply_skips_unknown_types() {
        let mut t = GeneratorTable::default();
        t.apply(&Generator {
            generator_type: 99,
            value: 5,
        });
        assert_eq!(t, GeneratorTable::default());

        t.apply_all(&[
            Generator::new(GeneratorType::Pan, 100),
            Generator::new(GeneratorType::Pan, -200),
        ]);
        assert_eq!(t[GeneratorType::Pan], -200, "later records should win");
    }

    #[test]
    fn ranges_pack_into_one_slot() {
        let mut t = GeneratorTable::default();
        t.apply(&Generator::new_range(GeneratorType::KeyRange, 36, 127));
        assert_eq!(t.range_start(GeneratorType::KeyRange), 36);
        assert_eq!(t.range_end(GeneratorType::KeyRange), 127);
    }
}

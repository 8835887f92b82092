// Copyright (c) 2024 Mike Tsao

use super::{Instrument, Preset, SampleHeader};
use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

/// Structural problems found while assembling a [PatchBank]. Any of these
/// aborts construction.
#[derive(Debug, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum PatchError {
    #[error("the patch bank has no presets")]
    NoPresets,
    #[error("{name:?} has no zones")]
    NoZones { name: String },
    #[error("the instrument {instrument:?} refers to sample {id}, which doesn't exist")]
    InvalidSampleId { instrument: String, id: i32 },
    #[error("the preset {preset:?} refers to instrument {id}, which doesn't exist")]
    InvalidInstrumentId { preset: String, id: i32 },
    #[error("the sample {name:?} spans {start}..{end}, outside the {len} frames of sample data")]
    SampleOutOfBounds {
        name: String,
        start: i32,
        end: i32,
        len: usize,
    },
    #[error("the sample {name:?} has a sample rate of {sample_rate}, which must be positive")]
    InvalidSampleRate { name: String, sample_rate: i32 },
    #[error("16-bit sample data needs an even number of bytes, but got {len}")]
    InvalidSampleData { len: usize },
}

/// Converts a little-endian 16-bit PCM blob, as stored in a bank's sample
/// chunk, to samples.
pub fn wave_data_from_le_bytes(bytes: &[u8]) -> Result<Vec<i16>, PatchError> {
    if bytes.len() % 2 != 0 {
        return Err(PatchError::InvalidSampleData { len: bytes.len() });
    }
    let mut wave_data = vec![0; bytes.len() / 2];
    LittleEndian::read_i16_into(bytes, &mut wave_data);
    Ok(wave_data)
}

/// A complete, validated set of presets, instruments, and sample data. Once
/// built it is immutable and can be shared among synthesizers.
#[derive(Debug, Default, PartialEq)]
pub struct PatchBank {
    wave_data: Vec<i16>,
    sample_headers: Vec<SampleHeader>,
    instruments: Vec<Instrument>,
    presets: Vec<Preset>,
}
impl PatchBank {
    /// Assembles a bank and checks that every cross-reference resolves.
    pub fn new_with(
        wave_data: Vec<i16>,
        sample_headers: Vec<SampleHeader>,
        instruments: Vec<Instrument>,
        presets: Vec<Preset>,
    ) -> Result<Self, PatchError> {
        if presets.is_empty() {
            return Err(PatchError::NoPresets);
        }
        for header in sample_headers.iter() {
            if header.start < 0 || header.start > header.end || header.end as usize > wave_data.len()
            {
                return Err(PatchError::SampleOutOfBounds {
                    name: header.name.clone(),
                    start: header.start,
                    end: header.end,
                    len: wave_data.len(),
                });
            }
            if header.sample_rate <= 0 {
                return Err(PatchError::InvalidSampleRate {
                    name: header.name.clone(),
                    sample_rate: header.sample_rate,
                });
            }
        }
        for instrument in instruments.iter() {
            if let Some(region) = instrument
                .regions()
                .iter()
                .find(|r| r.sample_id() >= sample_headers.len())
            {
                return Err(PatchError::InvalidSampleId {
                    instrument: instrument.name().to_string(),
                    id: region.sample_id() as i32,
                });
            }
        }
        for preset in presets.iter() {
            if let Some(region) = preset
                .regions()
                .iter()
                .find(|r| r.instrument_id() >= instruments.len())
            {
                return Err(PatchError::InvalidInstrumentId {
                    preset: preset.name().to_string(),
                    id: region.instrument_id() as i32,
                });
            }
        }
        Ok(Self {
            wave_data,
            sample_headers,
            instruments,
            presets,
        })
    }

    /// All the sample frames that [SampleHeader]s point into.
    pub fn wave_data(&self) -> &[i16] {
        &self.wave_data
    }

    #[allow(missing_docs)]
    pub fn sample_headers(&self) -> &[SampleHeader] {
        &self.sample_headers
    }

    #[allow(missing_docs)]
    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    #[allow(missing_docs)]
    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }
}

// Copyright (c) 2024 Mike Tsao

//! The patch database: sample headers, instruments, presets, and the regions
//! that connect them. Turning a bank file into these records happens outside
//! this crate; here they are resolved into generator tables and validated.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{
        EffectiveRegion, Generator, GeneratorType, Instrument, PatchBank, PatchError, Preset,
        SampleHeader,
    };
}

pub use bank::{wave_data_from_le_bytes, PatchBank, PatchError};
pub use generators::{Generator, GeneratorTable, GeneratorType};
pub use instrument::{Instrument, Preset, Zone};
pub use region::{EffectiveRegion, InstrumentRegion, PresetRegion};
pub use sample::{LoopMode, SampleHeader};

mod bank;
mod generators;
mod instrument;
mod region;
mod sample;

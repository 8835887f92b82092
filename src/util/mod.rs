// Copyright (c) 2024 Mike Tsao

//! System utilities.

/// Commonly used imports.
pub mod prelude {
    pub use super::{
        settings::{SettingsError, SynthesizerSettings, SynthesizerSettingsBuilder},
        MidiUtils,
    };
}

pub use midi::MidiUtils;
pub use settings::{SettingsError, SynthesizerSettings, SynthesizerSettingsBuilder};

pub mod math;
mod midi;
mod settings;

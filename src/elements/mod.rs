// Copyright (c) 2024 Mike Tsao

//! Building blocks for other parts of the system, especially the voices of
//! the wavetable synthesizer.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{
        BiQuadFilter, EnvelopeStage, Lfo, ModulationEnvelope, Oscillator, VolumeEnvelope,
    };
}

pub use envelopes::{EnvelopeStage, ModulationEnvelope, VolumeEnvelope};
pub use filter::BiQuadFilter;
pub use lfo::Lfo;
pub use oscillator::Oscillator;

mod envelopes;
mod filter;
mod lfo;
mod oscillator;

// Copyright (c) 2024 Mike Tsao

//! The instrument core and its send effects. These know nothing about files
//! or sequencing; they take events and render audio.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{
        effects::{Chorus, EffectsBus, Reverb},
        instruments::{Channel, Synthesizer},
    };
}

pub mod effects;
pub mod instruments;

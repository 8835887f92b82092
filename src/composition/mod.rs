// Copyright (c) 2024 Mike Tsao

//! Sequencing: merging tracks of timed events into a performance, and playing
//! it through a synthesizer.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{MidiFile, MidiFileSequencer, SequenceError, TrackEvent};
}

pub use midi_file::{MidiFile, SequenceError, TrackEvent};
pub use sequencers::MidiFileSequencer;

mod midi_file;
mod sequencers;

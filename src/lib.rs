// Copyright (c) 2024 Mike Tsao

#![warn(missing_docs, unused_imports, unused_variables)]
#![allow(rustdoc::private_intra_doc_links)]

//! Ensnare SoundFont is a sample-based wavetable synthesizer. It plays the
//! presets of a [PatchBank](patch::PatchBank) in response to MIDI events and
//! renders stereo audio a block at a time.
//!
//! There are two ways to drive it, depending on how much control you need.
//!
//! * *Play a file*: Build a [MidiFile] from the tracks of a Standard MIDI
//! File, hand it to a [MidiFileSequencer], and call
//! [render()](MidiFileSequencer::render()) until
//! [is_end_of_sequence()](MidiFileSequencer::is_end_of_sequence()).
//! * *Play live*: Send events to a [Synthesizer] with
//! [note_on()](Synthesizer::note_on()),
//! [process_midi_message()](Synthesizer::process_midi_message()), or the
//! [HandlesMidi](traits::HandlesMidi) trait, and call
//! [render()](Synthesizer::render()) from your audio callback.
//!
//! In both cases the bank is immutable once built, so one
//! [PatchBank](patch::PatchBank) can be shared among several synthesizers.

/// A collection of imports that are useful to users of this crate. `use
/// ensnare_soundfont::prelude::*;` for easier onboarding.
pub mod prelude {
    pub use super::{
        composition::prelude::*, cores::prelude::*, elements::prelude::*, patch::prelude::*,
        traits::prelude::*, types::prelude::*, util::prelude::*,
    };
}

// Fundamental structures that are important enough to re-export at top level.
pub use {
    composition::{MidiFile, MidiFileSequencer},
    cores::instruments::Synthesizer,
};

pub mod composition;
pub mod cores;
pub mod elements;
pub mod patch;
pub mod traits;
pub mod types;
pub mod util;

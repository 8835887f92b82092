// Copyright (c) 2024 Mike Tsao

//! The traits that define many characteristics and relationships among parts of
//! the system.

use crate::prelude::*;
use derivative::Derivative;
use midly::MidiMessage;

/// Quick import of all important traits.
pub mod prelude {
    pub use super::{Configurable, Configurables, GeneratesStereo, HandlesMidi, Serializable};
}

/// A convenience struct for the fields implied by [Configurable]. Note that
/// this struct is not serde-compliant, because these fields are fixed when the
/// engine is built and aren't meant to be serialized.
#[derive(Debug, Derivative, Clone, Copy, PartialEq)]
#[derivative(Default)]
pub struct Configurables {
    sample_rate: SampleRate,
    #[derivative(Default(value = "64"))]
    block_size: usize,
}
impl Configurables {
    #[allow(missing_docs)]
    pub fn new_with(sample_rate: SampleRate, block_size: usize) -> Self {
        Self {
            sample_rate,
            block_size,
        }
    }
}
impl Configurable for Configurables {
    fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn update_sample_rate(&mut self, sample_rate: SampleRate) {
        self.sample_rate = sample_rate
    }
}

/// Something that is [Configurable] renders at a fixed sample rate, one block
/// of a fixed size at a time.
pub trait Configurable {
    /// Returns this item's sample rate.
    fn sample_rate(&self) -> SampleRate;

    /// The sample rate changed.
    #[allow(unused_variables)]
    fn update_sample_rate(&mut self, sample_rate: SampleRate) {}

    /// Returns the number of frames this item produces per block.
    fn block_size(&self) -> usize;

    /// The duration of one block.
    fn block_duration(&self) -> Seconds {
        self.sample_rate().frames_to_seconds(self.block_size())
    }
}

/// Methods that help manage serialization of structs that keep buffers and
/// other state that can't be serialized.
pub trait Serializable {
    /// Called just before saving to disk.
    fn before_ser(&mut self) {}
    /// Called just after loading from disk, or after a builder creates the
    /// struct. Allocate ephemeral state here.
    fn after_deser(&mut self) {}
}

/// Indicates that an instrument knows about MIDI.
pub trait HandlesMidi {
    /// Takes a standard MIDI channel message and acts on it. Messages that the
    /// instrument doesn't understand are ignored.
    fn handle_midi_message(&mut self, channel: MidiChannel, message: MidiMessage);
}

/// Something that fills stereo audio buffers on request.
pub trait GeneratesStereo {
    /// Fills the two buffers with the next frames of audio. The buffers should
    /// be the same length; if they aren't, only the shorter length is rendered.
    fn render(&mut self, left: &mut [SampleType], right: &mut [SampleType]);
}

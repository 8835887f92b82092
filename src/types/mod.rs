// Copyright (c) 2024 Mike Tsao

//! Common data types used throughout the system.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{
        ChannelMessage, MidiChannel, Normal, ParameterType, SampleRate, SampleType, Seconds, Tempo,
    };
}

pub use {
    midi::{u4, u7, ChannelMessage, MidiChannel},
    numbers::{ParameterType, SampleType},
    ranges::{Normal, RangedF64},
    time::{SampleRate, Seconds, Tempo},
};

mod midi;
mod numbers;
mod ranges;
mod time;

// Copyright (c) 2024 Mike Tsao

use serde::{Deserialize, Serialize};

/// Describes one waveform inside the bank's shared sample data. All offsets
/// index into [PatchBank::wave_data()](super::PatchBank::wave_data).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SampleHeader {
    #[allow(missing_docs)]
    pub name: String,
    /// First sample frame.
    pub start: i32,
    /// One past the last sample frame.
    pub end: i32,
    #[allow(missing_docs)]
    pub start_loop: i32,
    #[allow(missing_docs)]
    pub end_loop: i32,
    /// The rate the sample was recorded at, in Hertz.
    pub sample_rate: i32,
    /// The MIDI key at which the sample plays back unshifted.
    pub original_pitch: u8,
    /// Tuning correction in cents.
    pub pitch_correction: i8,
    /// For stereo pairs, the index of the other channel's header.
    pub link: u16,
    /// Mono, left, right, linked, or ROM, as a raw SoundFont value.
    pub sample_type: u16,
}
impl SampleHeader {
    /// A mono header with its loop spanning the whole sample.
    pub fn new_with(name: &str, start: i32, end: i32, sample_rate: i32, original_pitch: u8) -> Self {
        Self {
            name: name.to_string(),
            start,
            end,
            start_loop: start,
            end_loop: end,
            sample_rate,
            original_pitch,
            pitch_correction: 0,
            link: 0,
            sample_type: 1,
        }
    }

    /// Sets the loop points. Builder-style, for constructing banks in code.
    pub fn with_loop(mut self, start_loop: i32, end_loop: i32) -> Self {
        self.start_loop = start_loop;
        self.end_loop = end_loop;
        self
    }
}

/// How an oscillator treats the loop points of its sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopMode {
    /// Plays from start to end once.
    #[default]
    NoLoop,
    /// Loops for as long as the voice lasts, including its release.
    Continuous,
    /// Loops until the note is released, then plays out the tail.
    LoopUntilNoteOff,
}
impl From<i32> for LoopMode {
    /// Converts a SoundFont `sampleModes` value. The reserved value 2 means
    /// no loop.
    fn from(value: i32) -> Self {
        match value {
            1 => LoopMode::Continuous,
            3 => LoopMode::LoopUntilNoteOff,
            _ => LoopMode::NoLoop,
        }
    }
}

// Copyright (c) 2024 Mike Tsao

use serde::{Deserialize, Serialize};
use synonym::Synonym;

pub use midly::num::{u4, u7};

/// Newtype for MIDI channel.
#[derive(Synonym, Serialize, Deserialize)]
pub struct MidiChannel(pub u8);
#[allow(missing_docs)]
impl MidiChannel {
    pub const MIN_VALUE: u8 = 0;
    pub const MAX_VALUE: u8 = 15; // inclusive
    pub const COUNT: usize = 16;

    /// General MIDI reserves the tenth channel (zero-based 9) for percussion.
    pub const PERCUSSION_VALUE: u8 = 9;
    pub const PERCUSSION: Self = Self(Self::PERCUSSION_VALUE);

    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    pub const fn is_percussion(&self) -> bool {
        self.0 == Self::PERCUSSION_VALUE
    }
}
impl From<u4> for MidiChannel {
    fn from(value: u4) -> Self {
        Self(value.as_int())
    }
}

/// A channel voice message in wire form: the channel, the status nibble
/// (0x80, 0x90, ..., 0xE0), and two data bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// Zero-based channel, 0..=15.
    pub channel: u8,
    /// Status byte with the channel nibble masked off.
    pub command: u8,
    #[allow(missing_docs)]
    pub data1: u8,
    #[allow(missing_docs)]
    pub data2: u8,
}

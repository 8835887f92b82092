// Copyright (c) 2024 Mike Tsao

use crate::types::{u7, ChannelMessage, MidiChannel};
use midly::{num::u14, MidiMessage, PitchBend};

/// Provides MIDI-related utility functionality.
pub struct MidiUtils {}
impl MidiUtils {
    /// Convenience function to make a note-on [MidiMessage].
    pub fn new_note_on(note: u8, vel: u8) -> MidiMessage {
        MidiMessage::NoteOn {
            key: u7::from(note),
            vel: u7::from(vel),
        }
    }

    /// Convenience function to make a note-off [MidiMessage].
    pub fn new_note_off(note: u8, vel: u8) -> MidiMessage {
        MidiMessage::NoteOff {
            key: u7::from(note),
            vel: u7::from(vel),
        }
    }

    /// Convenience function to make a controller-change [MidiMessage].
    pub fn new_controller(controller: u8, value: u8) -> MidiMessage {
        MidiMessage::Controller {
            controller: u7::from(controller),
            value: u7::from(value),
        }
    }

    /// Convenience function to make a pitch-bend [MidiMessage] from a
    /// centered value in -8192..=8191.
    pub fn new_pitch_bend(bend: i16) -> MidiMessage {
        let raw = (bend.clamp(-8192, 8191) as i32 + 8192) as u16;
        MidiMessage::PitchBend {
            bend: PitchBend(u14::from(raw)),
        }
    }

    /// Flattens a typed message into its status nibble and two data bytes.
    pub fn to_channel_message(channel: MidiChannel, message: &MidiMessage) -> ChannelMessage {
        let (command, data1, data2) = match message {
            MidiMessage::NoteOff { key, vel } => (0x80, key.as_int(), vel.as_int()),
            MidiMessage::NoteOn { key, vel } => (0x90, key.as_int(), vel.as_int()),
            MidiMessage::Aftertouch { key, vel } => (0xA0, key.as_int(), vel.as_int()),
            MidiMessage::Controller { controller, value } => {
                (0xB0, controller.as_int(), value.as_int())
            }
            MidiMessage::ProgramChange { program } => (0xC0, program.as_int(), 0),
            MidiMessage::ChannelAftertouch { vel } => (0xD0, vel.as_int(), 0),
            MidiMessage::PitchBend { bend } => {
                let raw = bend.0.as_int();
                (0xE0, (raw & 0x7F) as u8, (raw >> 7) as u8)
            }
        };
        ChannelMessage {
            channel: channel.0,
            command,
            data1,
            data2,
        }
    }
}

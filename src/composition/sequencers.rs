// Copyright (c) 2024 Mike Tsao

use super::{MidiFile, TrackEvent};
use crate::{cores::instruments::Synthesizer, prelude::*};
use delegate::delegate;
use log::debug;
use std::sync::Arc;

/// Plays a [MidiFile] through a [Synthesizer]. Events are dispatched at block
/// boundaries, so timing is accurate to one block.
#[derive(Debug)]
pub struct MidiFileSequencer {
    synthesizer: Synthesizer,

    midi_file: Option<Arc<MidiFile>>,
    is_looping: bool,

    // Frames of the current block already handed out.
    block_wrote: usize,
    current_time: Seconds,
    event_index: usize,
}
impl Configurable for MidiFileSequencer {
    delegate! {
        to self.synthesizer {
            fn sample_rate(&self) -> SampleRate;
            fn block_size(&self) -> usize;
        }
    }
}
impl MidiFileSequencer {
    #[allow(missing_docs)]
    pub fn new_with(synthesizer: Synthesizer) -> Self {
        let block_size = synthesizer.block_size();
        Self {
            synthesizer,
            midi_file: None,
            is_looping: false,
            block_wrote: block_size,
            current_time: Seconds::zero(),
            event_index: 0,
        }
    }

    /// Starts `midi_file` from the beginning. With `is_looping`, playback
    /// wraps to the start whenever the last event has been dispatched.
    pub fn play(&mut self, midi_file: Arc<MidiFile>, is_looping: bool) {
        self.midi_file = Some(midi_file);
        self.is_looping = is_looping;
        self.rewind();
        self.synthesizer.reset();
    }

    /// Forgets the current file and silences the synthesizer.
    pub fn stop(&mut self) {
        self.midi_file = None;
        self.synthesizer.reset();
    }

    fn rewind(&mut self) {
        self.block_wrote = self.synthesizer.block_size();
        self.current_time = Seconds::zero();
        self.event_index = 0;
    }

    /// Renders audio, dispatching due events each time a new block begins.
    pub fn render(&mut self, left: &mut [SampleType], right: &mut [SampleType]) {
        let length = left.len().min(right.len());
        let block_size = self.synthesizer.block_size();
        let block_duration = self.synthesizer.block_duration();

        let mut wrote = 0;
        while wrote < length {
            if self.block_wrote == block_size {
                self.process_events();
                self.block_wrote = 0;
                self.current_time = Seconds(self.current_time.0 + block_duration.0);
            }

            let count = (block_size - self.block_wrote).min(length - wrote);
            self.synthesizer
                .render(&mut left[wrote..wrote + count], &mut right[wrote..wrote + count]);

            self.block_wrote += count;
            wrote += count;
        }
    }

    fn process_events(&mut self) {
        let Some(midi_file) = self.midi_file.as_ref() else {
            return;
        };

        let events = midi_file.events();
        while let Some((time, event)) = events.get(self.event_index) {
            if time.0 > self.current_time.0 {
                break;
            }
            if let TrackEvent::Channel(message) = event {
                self.synthesizer.process_midi_message(
                    message.channel,
                    message.command,
                    message.data1,
                    message.data2,
                );
            }
            self.event_index += 1;
        }

        if self.event_index == events.len() && self.is_looping {
            debug!("looping after {:.3}s", self.current_time.0);
            self.current_time = Seconds::zero();
            self.event_index = 0;
            self.synthesizer.note_off_all(false);
        }
    }

    /// How far into the file playback has reached.
    pub fn position(&self) -> Seconds {
        self.current_time
    }

    /// True once every event has been dispatched, or if nothing is playing.
    /// A looping sequence never ends.
    pub fn is_end_of_sequence(&self) -> bool {
        self.midi_file
            .as_ref()
            .map_or(true, |f| self.event_index == f.events().len())
    }

    #[allow(missing_docs)]
    pub fn midi_file(&self) -> Option<&Arc<MidiFile>> {
        self.midi_file.as_ref()
    }

    #[allow(missing_docs)]
    pub fn synthesizer(&self) -> &Synthesizer {
        &self.synthesizer
    }

    #[allow(missing_docs)]
    pub fn synthesizer_mut(&mut self) -> &mut Synthesizer {
        &mut self.synthesizer
    }
}
impl GeneratesStereo for MidiFileSequencer {
    fn render(&mut self, left: &mut [SampleType], right: &mut [SampleType]) {
        MidiFileSequencer::render(self, left, right);
    }
}

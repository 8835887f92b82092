// Copyright (c) 2024 Mike Tsao

use crate::prelude::*;
use core::fmt::Debug;
use log::debug;

/// What a [VoiceStore] needs to know about a voice to decide which one to
/// hand out.
pub trait IsVoice: Debug {
    /// How much the voice is worth keeping. The lowest is stolen first.
    fn priority(&self) -> f32;

    /// Frames rendered since the voice started.
    fn voice_length(&self) -> usize;

    /// Nonzero if only one voice of this class may sound on a channel at once.
    fn exclusive_class(&self) -> i32;

    /// The channel the voice is playing on.
    fn channel(&self) -> MidiChannel;
}

/// A fixed set of preallocated voices. The first `active_voice_count` are
/// sounding; the rest are free. Nothing is allocated after construction.
#[derive(Debug, Default)]
pub struct VoiceStore<V: IsVoice> {
    voices: Vec<V>,
    active_voice_count: usize,
}
impl<V: IsVoice> VoiceStore<V> {
    /// Creates `capacity` voices by calling `new_voice_fn` for each.
    pub fn new_with_voice<F>(capacity: usize, new_voice_fn: F) -> Self
    where
        F: Fn() -> V,
    {
        Self {
            voices: (0..capacity).map(|_| new_voice_fn()).collect(),
            active_voice_count: 0,
        }
    }

    /// Returns a voice to start a new note on, or None if the store has no
    /// voices at all.
    ///
    /// In order of preference: an active voice on the same channel with the
    /// same nonzero exclusive class; a free voice; the active voice with the
    /// lowest priority. Among equal priorities the one that has played
    /// longest is stolen, and after that the one nearest the front.
    pub fn request_new(&mut self, exclusive_class: i32, channel: MidiChannel) -> Option<&mut V> {
        if exclusive_class != 0 {
            if let Some(index) = self.active_voices().iter().position(|v| {
                v.exclusive_class() == exclusive_class && v.channel() == channel
            }) {
                return self.voices.get_mut(index);
            }
        }

        if self.active_voice_count < self.voices.len() {
            self.active_voice_count += 1;
            return self.voices.get_mut(self.active_voice_count - 1);
        }

        let mut candidate: Option<(usize, f32, usize)> = None;
        for (index, voice) in self.active_voices().iter().enumerate() {
            let priority = voice.priority();
            let length = voice.voice_length();
            let is_better = match candidate {
                None => true,
                Some((_, lowest_priority, longest_length)) => {
                    priority < lowest_priority
                        || (priority == lowest_priority && length > longest_length)
                }
            };
            if is_better {
                candidate = Some((index, priority, length));
            }
        }
        let (index, priority, _) = candidate?;
        debug!("stealing voice {index} (priority {priority})");
        self.voices.get_mut(index)
    }

    /// Calls `f` on every active voice. A voice for which `f` returns false
    /// is freed by swapping it with the last active voice, so the order of
    /// the active voices can change.
    pub fn process_with<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut V) -> bool,
    {
        let mut i = 0;
        while i < self.active_voice_count {
            if f(&mut self.voices[i]) {
                i += 1;
            } else {
                self.active_voice_count -= 1;
                self.voices.swap(i, self.active_voice_count);
            }
        }
    }

    /// Frees every voice. The next start() on a voice fully reinitializes it.
    pub fn clear(&mut self) {
        self.active_voice_count = 0;
    }

    #[allow(missing_docs)]
    pub fn capacity(&self) -> usize {
        self.voices.len()
    }

    #[allow(missing_docs)]
    pub fn active_voice_count(&self) -> usize {
        self.active_voice_count
    }

    /// The sounding voices, in no particular order.
    pub fn active_voices(&self) -> &[V] {
        &self.voices[..self.active_voice_count]
    }

    #[allow(missing_docs)]
    pub fn active_voices_mut(&mut self) -> &mut [V] {
        &mut self.voices[..self.active_voice_count]
    }
}

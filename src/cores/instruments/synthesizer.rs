// Copyright (c) 2024 Mike Tsao

use super::{Channel, IsVoice, Voice, VoiceStore};
use crate::{
    cores::effects::EffectsBus,
    patch::{EffectiveRegion, PatchBank, Preset},
    prelude::*,
    util::math::write_block,
};
use delegate::delegate;
use log::{debug, info};
use midly::MidiMessage;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A sample-based wavetable synthesizer. It plays the presets in a
/// [PatchBank] on sixteen MIDI channels and renders stereo audio one block at
/// a time. Events take effect at the next block boundary.
#[derive(Debug)]
pub struct Synthesizer {
    settings: SynthesizerSettings,
    c: Configurables,

    patch_bank: Arc<PatchBank>,
    preset_lookup: FxHashMap<i32, usize>,
    default_preset: usize,

    channels: Vec<Channel>,
    voices: VoiceStore<Voice>,

    block_left: Vec<SampleType>,
    block_right: Vec<SampleType>,
    block_read: usize,

    master_volume: SampleType,

    effects: Option<EffectsBus>,
}
impl Configurable for Synthesizer {
    delegate! {
        to self.c {
            fn sample_rate(&self) -> SampleRate;
            fn block_size(&self) -> usize;
        }
    }
}
impl Synthesizer {
    /// The gain applied to the whole mix unless changed.
    pub const DEFAULT_MASTER_VOLUME: SampleType = 0.5;

    /// Creates a synthesizer for the given bank. Fails only if the settings
    /// are out of range.
    pub fn new_with(
        patch_bank: Arc<PatchBank>,
        settings: &SynthesizerSettings,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;
        let c = settings.configurables();

        let mut preset_lookup = FxHashMap::default();
        let mut default_preset = 0;
        let mut min_preset_id = i32::MAX;
        for (index, preset) in patch_bank.presets().iter().enumerate() {
            preset_lookup.insert(preset.id(), index);

            // With a General MIDI bank the lowest ID is the piano.
            if preset.id() < min_preset_id {
                min_preset_id = preset.id();
                default_preset = index;
            }
        }

        let channels = (0..MidiChannel::COUNT)
            .map(|i| Channel::new_with(i as u8 == MidiChannel::PERCUSSION_VALUE))
            .collect();
        let voices = VoiceStore::new_with_voice(settings.maximum_polyphony(), || Voice::new_with(c));
        let effects = if settings.enable_reverb_and_chorus() {
            Some(EffectsBus::new_with(c))
        } else {
            None
        };

        info!(
            "synthesizer: {} Hz, block size {}, polyphony {}, effects {}, {} presets",
            c.sample_rate(),
            c.block_size(),
            settings.maximum_polyphony(),
            settings.enable_reverb_and_chorus(),
            patch_bank.presets().len()
        );

        Ok(Self {
            settings: settings.clone(),
            c,
            patch_bank,
            preset_lookup,
            default_preset,
            channels,
            voices,
            block_left: vec![0.0; c.block_size()],
            block_right: vec![0.0; c.block_size()],
            block_read: c.block_size(),
            master_volume: Self::DEFAULT_MASTER_VOLUME,
            effects,
        })
    }

    /// Handles one raw channel message. `command` is the status byte; its
    /// channel nibble is ignored. Unknown commands and controllers, and
    /// channels past 15, are ignored.
    pub fn process_midi_message(&mut self, channel: u8, command: u8, data1: u8, data2: u8) {
        let index = channel as usize;
        if index >= self.channels.len() {
            return;
        }

        match command & 0xF0 {
            0x80 => self.note_off(channel, data1),
            0x90 => self.note_on(channel, data1, data2),
            0xB0 => match data1 {
                0x00 => self.channels[index].set_bank(data2),
                0x01 => self.channels[index].set_modulation_coarse(data2),
                0x21 => self.channels[index].set_modulation_fine(data2),
                0x06 => self.channels[index].data_entry_coarse(data2),
                0x26 => self.channels[index].data_entry_fine(data2),
                0x07 => self.channels[index].set_volume_coarse(data2),
                0x27 => self.channels[index].set_volume_fine(data2),
                0x0A => self.channels[index].set_pan_coarse(data2),
                0x2A => self.channels[index].set_pan_fine(data2),
                0x0B => self.channels[index].set_expression_coarse(data2),
                0x2B => self.channels[index].set_expression_fine(data2),
                0x40 => self.channels[index].set_hold_pedal(data2),
                0x5B => self.channels[index].set_reverb_send(data2),
                0x5D => self.channels[index].set_chorus_send(data2),
                0x65 => self.channels[index].set_rpn_coarse(data2),
                0x64 => self.channels[index].set_rpn_fine(data2),
                0x78 => self.note_off_all_channel(channel, true),
                0x79 => self.reset_all_controllers_channel(channel),
                0x7B => self.note_off_all_channel(channel, false),
                _ => {}
            },
            0xC0 => self.channels[index].set_patch(data1),
            0xE0 => self.channels[index].set_pitch_bend(data1, data2),
            _ => {}
        }
    }

    /// Starts a voice for every region of the channel's preset that covers
    /// this key and velocity. A velocity of zero is a note-off.
    pub fn note_on(&mut self, channel: u8, key: u8, velocity: u8) {
        if velocity == 0 {
            self.note_off(channel, key);
            return;
        }
        let Some(channel_info) = self.channels.get(channel as usize) else {
            return;
        };

        let bank = Arc::clone(&self.patch_bank);
        let Some(preset) = self.resolve_preset(channel_info.preset_id(), &bank) else {
            return;
        };
        let midi_channel = MidiChannel(channel);
        for preset_region in preset.regions().iter().filter(|r| r.contains(key, velocity)) {
            let Some(instrument) = bank.instruments().get(preset_region.instrument_id()) else {
                continue;
            };
            for instrument_region in instrument
                .regions()
                .iter()
                .filter(|r| r.contains(key, velocity))
            {
                let Some(sample) = bank.sample_headers().get(instrument_region.sample_id()) else {
                    continue;
                };
                let region = EffectiveRegion::combine(preset_region, instrument_region, sample);
                if let Some(voice) = self
                    .voices
                    .request_new(region.exclusive_class(), midi_channel)
                {
                    voice.start(&region, midi_channel, key, velocity, bank.wave_data().len());
                }
            }
        }
    }

    /// Looks up a preset by ID. If it doesn't exist, tries the same patch in
    /// bank 0 (or the standard drum kit for percussion banks), and then the
    /// bank's lowest-numbered preset.
    fn resolve_preset<'a>(&self, preset_id: i32, bank: &'a PatchBank) -> Option<&'a Preset> {
        let index = match self.preset_lookup.get(&preset_id) {
            Some(index) => *index,
            None => {
                let bank_number = preset_id >> 16;
                let fallback_id = if bank_number < 128 {
                    preset_id & 0xFFFF
                } else {
                    128 << 16
                };
                let index = self
                    .preset_lookup
                    .get(&fallback_id)
                    .copied()
                    .unwrap_or(self.default_preset);
                debug!(
                    "no preset {}:{}; using {}",
                    bank_number,
                    preset_id & 0xFFFF,
                    bank.presets()
                        .get(index)
                        .map(|p| p.name())
                        .unwrap_or_default()
                );
                index
            }
        };
        bank.presets().get(index)
    }

    /// Releases every voice playing `key` on `channel`.
    pub fn note_off(&mut self, channel: u8, key: u8) {
        if channel as usize >= self.channels.len() {
            return;
        }
        let midi_channel = MidiChannel(channel);
        self.voices
            .active_voices_mut()
            .iter_mut()
            .filter(|v| v.channel() == midi_channel && v.key() == key)
            .for_each(|v| v.end());
    }

    /// Releases every voice. If `immediate`, they stop without a release
    /// stage.
    pub fn note_off_all(&mut self, immediate: bool) {
        if immediate {
            self.voices.clear();
        } else {
            self.voices
                .active_voices_mut()
                .iter_mut()
                .for_each(|v| v.end());
        }
    }

    /// Like [Synthesizer::note_off_all()], for one channel.
    pub fn note_off_all_channel(&mut self, channel: u8, immediate: bool) {
        let midi_channel = MidiChannel(channel);
        self.voices
            .active_voices_mut()
            .iter_mut()
            .filter(|v| v.channel() == midi_channel)
            .for_each(|v| if immediate { v.kill() } else { v.end() });
    }

    /// Resets the performance controllers on every channel.
    pub fn reset_all_controllers(&mut self) {
        self.channels
            .iter_mut()
            .for_each(|c| c.reset_all_controllers());
    }

    /// Resets the performance controllers on one channel.
    pub fn reset_all_controllers_channel(&mut self, channel: u8) {
        if let Some(c) = self.channels.get_mut(channel as usize) {
            c.reset_all_controllers();
        }
    }

    /// Stops all sound and returns every channel to its power-on state.
    pub fn reset(&mut self) {
        self.voices.clear();
        self.channels.iter_mut().for_each(|c| c.reset());
        if let Some(effects) = self.effects.as_mut() {
            effects.mute();
        }
        self.block_read = self.c.block_size();
    }

    /// Fills both buffers with the next frames. Any length works; internally
    /// the synthesizer still advances a whole block at a time, so splitting a
    /// render into several calls produces identical output.
    pub fn render(&mut self, left: &mut [SampleType], right: &mut [SampleType]) {
        let length = left.len().min(right.len());
        let block_size = self.c.block_size();
        let mut wrote = 0;
        while wrote < length {
            if self.block_read == block_size {
                self.render_block();
                self.block_read = 0;
            }

            let count = (block_size - self.block_read).min(length - wrote);
            let src = self.block_read..self.block_read + count;
            let dst = wrote..wrote + count;
            left[dst.clone()].copy_from_slice(&self.block_left[src.clone()]);
            right[dst].copy_from_slice(&self.block_right[src]);

            self.block_read += count;
            wrote += count;
        }
    }

    fn render_block(&mut self) {
        let channels = &self.channels;
        let data = self.patch_bank.wave_data();
        self.voices.process_with(|voice| {
            channels
                .get(voice.channel().0 as usize)
                .is_some_and(|channel| voice.process(channel, data))
        });

        self.block_left.fill(0.0);
        self.block_right.fill(0.0);
        let master_volume = self.master_volume;
        for voice in self.voices.active_voices() {
            let (previous, current) = voice.mix_gains();
            write_block(
                master_volume * previous[0],
                master_volume * current[0],
                voice.block(),
                &mut self.block_left,
            );
            write_block(
                master_volume * previous[1],
                master_volume * current[1],
                voice.block(),
                &mut self.block_right,
            );
        }

        if let Some(effects) = self.effects.as_mut() {
            effects.begin_block();
            for voice in self.voices.active_voices() {
                let (previous, current) = voice.mix_gains();
                let (previous_chorus, current_chorus) = voice.chorus_sends();
                effects.send_to_chorus(
                    voice.block(),
                    [previous_chorus * previous[0], previous_chorus * previous[1]],
                    [current_chorus * current[0], current_chorus * current[1]],
                );
                let (previous_reverb, current_reverb) = voice.reverb_sends();
                effects.send_to_reverb(
                    voice.block(),
                    previous_reverb * (previous[0] + previous[1]),
                    current_reverb * (current[0] + current[1]),
                );
            }
            effects.process(master_volume, &mut self.block_left, &mut self.block_right);
        }
    }
}
#[allow(missing_docs)]
impl Synthesizer {
    pub fn settings(&self) -> &SynthesizerSettings {
        &self.settings
    }

    pub fn patch_bank(&self) -> &Arc<PatchBank> {
        &self.patch_bank
    }

    pub fn master_volume(&self) -> SampleType {
        self.master_volume
    }

    pub fn set_master_volume(&mut self, master_volume: SampleType) {
        self.master_volume = master_volume;
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.active_voice_count()
    }

    /// A read-only view of one channel's controller state.
    pub fn channel(&self, channel: u8) -> Option<&Channel> {
        self.channels.get(channel as usize)
    }

    /// The name of the preset a note-on on this channel would play.
    pub fn preset_name_for(&self, channel: u8) -> Option<&str> {
        let channel = self.channels.get(channel as usize)?;
        self.resolve_preset(channel.preset_id(), &self.patch_bank)
            .map(|p| p.name())
    }

    /// The chorus and reverb, if they were enabled.
    pub fn effects(&self) -> Option<&EffectsBus> {
        self.effects.as_ref()
    }

    pub fn effects_mut(&mut self) -> Option<&mut EffectsBus> {
        self.effects.as_mut()
    }
}
impl HandlesMidi for Synthesizer {
    fn handle_midi_message(&mut self, channel: MidiChannel, message: MidiMessage) {
        let m = MidiUtils::to_channel_message(channel, &message);
        self.process_midi_message(m.channel, m.command, m.data1, m.data2);
    }
}
impl GeneratesStereo for Synthesizer {
    fn render(&mut self, left: &mut [SampleType], right: &mut [SampleType]) {
        Synthesizer::render(self, left, right);
    }
}

// Copyright (c) 2024 Mike Tsao

use super::{Channel, IsVoice};
use crate::{
    elements::{BiQuadFilter, Lfo, ModulationEnvelope, Oscillator, VolumeEnvelope},
    patch::EffectiveRegion,
    prelude::*,
    util::math::{
        cents_to_multiplying_factor, decibels_to_linear, linear_to_decibels, HALF_PI, NON_AUDIBLE,
    },
};
use delegate::delegate;

/// Where a voice is in its note's life.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VoiceState {
    /// Sounding normally.
    #[default]
    Playing,
    /// Note-off arrived but hasn't taken effect yet, because the note is too
    /// new or the hold pedal is down.
    ReleaseRequested,
    /// The envelopes are in their release stage.
    Released,
}

/// One sounding note. Owns all of its DSP state and renders one block at a
/// time into its own buffer, which the synthesizer then mixes.
#[derive(Debug)]
pub struct Voice {
    c: Configurables,

    volume_envelope: VolumeEnvelope,
    modulation_envelope: ModulationEnvelope,
    vibrato_lfo: Lfo,
    modulation_lfo: Lfo,
    oscillator: Oscillator,
    filter: BiQuadFilter,

    block: Vec<SampleType>,

    // The mix ramps from the previous block's gains to the current ones.
    previous_mix_gains: [SampleType; 2],
    current_mix_gains: [SampleType; 2],
    previous_reverb_send: SampleType,
    current_reverb_send: SampleType,
    previous_chorus_send: SampleType,
    current_chorus_send: SampleType,

    exclusive_class: i32,
    channel: MidiChannel,
    key: u8,
    velocity: u8,

    note_gain: f32,

    cutoff: f32,
    resonance: f32,

    vibrato_lfo_to_pitch: f32,
    modulation_lfo_to_pitch: f32,
    modulation_envelope_to_pitch: f32,

    modulation_lfo_to_cutoff: i32,
    modulation_envelope_to_cutoff: i32,
    dynamic_cutoff: bool,

    modulation_lfo_to_volume: f32,
    dynamic_volume: bool,

    instrument_pan: f32,
    instrument_reverb: f32,
    instrument_chorus: f32,

    smoothed_cutoff: f32,

    state: VoiceState,
    voice_length: usize,
    minimum_voice_duration: usize,
}
impl Configurable for Voice {
    delegate! {
        to self.c {
            fn sample_rate(&self) -> SampleRate;
            fn block_size(&self) -> usize;
        }
    }
}
impl IsVoice for Voice {
    fn priority(&self) -> f32 {
        if self.note_gain < NON_AUDIBLE {
            0.0
        } else {
            self.volume_envelope.priority()
        }
    }

    fn voice_length(&self) -> usize {
        self.voice_length
    }

    fn exclusive_class(&self) -> i32 {
        self.exclusive_class
    }

    fn channel(&self) -> MidiChannel {
        self.channel
    }
}
impl Voice {
    /// A voice ignores note-off until it has played this fraction of a second
    /// (expressed as a divisor of the sample rate).
    const MINIMUM_DURATION_DIVISOR: usize = 500;

    #[allow(missing_docs)]
    pub fn new_with(c: Configurables) -> Self {
        Self {
            c,
            volume_envelope: VolumeEnvelope::new_with(c),
            modulation_envelope: ModulationEnvelope::new_with(c),
            vibrato_lfo: Lfo::new_with(c),
            modulation_lfo: Lfo::new_with(c),
            oscillator: Oscillator::new_with(c),
            filter: BiQuadFilter::new_with(c),
            block: vec![0.0; c.block_size()],
            previous_mix_gains: Default::default(),
            current_mix_gains: Default::default(),
            previous_reverb_send: Default::default(),
            current_reverb_send: Default::default(),
            previous_chorus_send: Default::default(),
            current_chorus_send: Default::default(),
            exclusive_class: Default::default(),
            channel: Default::default(),
            key: Default::default(),
            velocity: Default::default(),
            note_gain: Default::default(),
            cutoff: Default::default(),
            resonance: Default::default(),
            vibrato_lfo_to_pitch: Default::default(),
            modulation_lfo_to_pitch: Default::default(),
            modulation_envelope_to_pitch: Default::default(),
            modulation_lfo_to_cutoff: Default::default(),
            modulation_envelope_to_cutoff: Default::default(),
            dynamic_cutoff: Default::default(),
            modulation_lfo_to_volume: Default::default(),
            dynamic_volume: Default::default(),
            instrument_pan: Default::default(),
            instrument_reverb: Default::default(),
            instrument_chorus: Default::default(),
            smoothed_cutoff: Default::default(),
            state: Default::default(),
            voice_length: Default::default(),
            minimum_voice_duration: c.sample_rate().0 / Self::MINIMUM_DURATION_DIVISOR,
        }
    }

    /// Begins a note. `data_len` is the length of the wave data that
    /// [Voice::process()] will be given.
    pub fn start(
        &mut self,
        region: &EffectiveRegion,
        channel: MidiChannel,
        key: u8,
        velocity: u8,
        data_len: usize,
    ) {
        self.exclusive_class = region.exclusive_class();
        self.channel = channel;
        self.key = key;
        self.velocity = velocity;

        self.note_gain = if velocity > 0 {
            // Initial attenuation counts at 40%.
            let sample_attenuation = 0.4 * region.initial_attenuation();
            let filter_attenuation = 0.5 * region.initial_filter_q();
            let decibels = 2.0 * linear_to_decibels(velocity as f32 / 127.0)
                - sample_attenuation
                - filter_attenuation;
            decibels_to_linear(decibels)
        } else {
            0.0
        };

        self.cutoff = region.initial_filter_cutoff_frequency();
        self.resonance = decibels_to_linear(region.initial_filter_q());

        self.vibrato_lfo_to_pitch = 0.01 * region.vibrato_lfo_to_pitch() as f32;
        self.modulation_lfo_to_pitch = 0.01 * region.modulation_lfo_to_pitch() as f32;
        self.modulation_envelope_to_pitch = 0.01 * region.modulation_envelope_to_pitch() as f32;

        self.modulation_lfo_to_cutoff = region.modulation_lfo_to_filter_cutoff_frequency();
        self.modulation_envelope_to_cutoff =
            region.modulation_envelope_to_filter_cutoff_frequency();
        self.dynamic_cutoff =
            self.modulation_lfo_to_cutoff != 0 || self.modulation_envelope_to_cutoff != 0;

        self.modulation_lfo_to_volume = region.modulation_lfo_to_volume();
        self.dynamic_volume = self.modulation_lfo_to_volume > 0.05;

        self.instrument_pan = region.pan().clamp(-50.0, 50.0);
        self.instrument_reverb = 0.01 * region.reverb_effects_send();
        self.instrument_chorus = 0.01 * region.chorus_effects_send();

        self.volume_envelope.start_with_region(region, key);
        self.modulation_envelope
            .start_with_region(region, key, velocity);
        self.vibrato_lfo.start_vibrato(region);
        self.modulation_lfo.start_modulation(region);
        self.oscillator.start_with_region(region, data_len);
        self.filter.clear_buffer();
        self.filter.set_low_pass_filter(self.cutoff, self.resonance);

        self.smoothed_cutoff = self.cutoff;

        self.state = VoiceState::Playing;
        self.voice_length = 0;
    }

    /// Asks the note to release. Has an effect only while playing.
    pub fn end(&mut self) {
        if self.state == VoiceState::Playing {
            self.state = VoiceState::ReleaseRequested;
        }
    }

    /// Silences the voice immediately. It is freed on its next block.
    pub fn kill(&mut self) {
        self.note_gain = 0.0;
    }

    fn release_if_necessary(&mut self, channel: &Channel) {
        if self.voice_length < self.minimum_voice_duration {
            return;
        }
        if self.state == VoiceState::ReleaseRequested && !channel.hold_pedal() {
            self.volume_envelope.release();
            self.modulation_envelope.release();
            self.oscillator.release();
            self.state = VoiceState::Released;
        }
    }

    /// Renders the next block into the voice's buffer using the current state
    /// of its channel. Returns false when the voice has finished and can be
    /// reused.
    pub fn process(&mut self, channel: &Channel, data: &[i16]) -> bool {
        if self.note_gain < NON_AUDIBLE {
            return false;
        }

        self.release_if_necessary(channel);

        if !self.volume_envelope.process(self.c.block_size()) {
            return false;
        }
        self.modulation_envelope.process(self.c.block_size());
        self.vibrato_lfo.process();
        self.modulation_lfo.process();

        let vibrato_pitch_change =
            (0.01 * channel.modulation() + self.vibrato_lfo_to_pitch) * self.vibrato_lfo.value();
        let modulation_pitch_change = self.modulation_lfo_to_pitch * self.modulation_lfo.value()
            + self.modulation_envelope_to_pitch * self.modulation_envelope.value();
        let channel_pitch_change = channel.tune() + channel.pitch_bend();
        let pitch =
            self.key as f32 + vibrato_pitch_change + modulation_pitch_change + channel_pitch_change;
        if !self.oscillator.process(data, &mut self.block, pitch) {
            return false;
        }

        if self.dynamic_cutoff {
            let cents = self.modulation_lfo_to_cutoff as f32 * self.modulation_lfo.value()
                + self.modulation_envelope_to_cutoff as f32 * self.modulation_envelope.value();
            let new_cutoff = cents_to_multiplying_factor(cents) * self.cutoff;

            // At most an octave per block.
            self.smoothed_cutoff =
                new_cutoff.clamp(0.5 * self.smoothed_cutoff, 2.0 * self.smoothed_cutoff);
            self.filter
                .set_low_pass_filter(self.smoothed_cutoff, self.resonance);
        }
        self.filter.process(&mut self.block);

        self.previous_mix_gains = self.current_mix_gains;
        self.previous_reverb_send = self.current_reverb_send;
        self.previous_chorus_send = self.current_chorus_send;

        let volume_expression = channel.volume() * channel.expression();
        let channel_gain = volume_expression * volume_expression;
        let mut mix_gain = self.note_gain * channel_gain * self.volume_envelope.value();
        if self.dynamic_volume {
            let decibels = self.modulation_lfo_to_volume * self.modulation_lfo.value();
            mix_gain *= decibels_to_linear(decibels);
        }

        let angle = core::f32::consts::PI / 200.0 * (channel.pan() + self.instrument_pan + 50.0);
        self.current_mix_gains = if angle <= 0.0 {
            [mix_gain, 0.0]
        } else if angle >= HALF_PI {
            [0.0, mix_gain]
        } else {
            [mix_gain * angle.cos(), mix_gain * angle.sin()]
        };

        self.current_reverb_send = (channel.reverb_send() + self.instrument_reverb).clamp(0.0, 1.0);
        self.current_chorus_send = (channel.chorus_send() + self.instrument_chorus).clamp(0.0, 1.0);

        if self.voice_length == 0 {
            self.previous_mix_gains = self.current_mix_gains;
            self.previous_reverb_send = self.current_reverb_send;
            self.previous_chorus_send = self.current_chorus_send;
        }

        self.voice_length += self.c.block_size();

        true
    }
}
#[allow(missing_docs)]
impl Voice {
    /// The most recently rendered block, before panning and gain.
    pub fn block(&self) -> &[SampleType] {
        &self.block
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn key(&self) -> u8 {
        self.key
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    /// `[left, right]` gains for the previous and the current block.
    pub fn mix_gains(&self) -> ([SampleType; 2], [SampleType; 2]) {
        (self.previous_mix_gains, self.current_mix_gains)
    }

    /// Reverb send level for the previous and the current block.
    pub fn reverb_sends(&self) -> (SampleType, SampleType) {
        (self.previous_reverb_send, self.current_reverb_send)
    }

    /// Chorus send level for the previous and the current block.
    pub fn chorus_sends(&self) -> (SampleType, SampleType) {
        (self.previous_chorus_send, self.current_chorus_send)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{Generator, GeneratorType, InstrumentRegion, PresetRegion, SampleHeader};
    use float_cmp::approx_eq;
    use more_asserts::{assert_gt, assert_lt};

    const BLOCK_SIZE: usize = 64;

    fn configurables() -> Configurables {
        Configurables::new_with(SampleRate::DEFAULT, BLOCK_SIZE)
    }

    // A looping square-ish wave at 44.1 kHz, rooted on key 60.
    fn wave_data() -> Vec<i16> {
        (0..4410)
            .map(|i| if (i / 50) % 2 == 0 { 16000 } else { -16000 })
            .collect()
    }

    fn region(instrument_generators: &[Generator]) -> EffectiveRegion {
        let sample = SampleHeader::new_with("square", 0, 4400, 44100, 60).with_loop(100, 4300);
        let mut local = instrument_generators.to_vec();
        local.push(Generator::new(GeneratorType::SampleModes, 1));
        local.push(Generator::new(GeneratorType::SampleId, 0));
        let instrument = InstrumentRegion::new_with("test", &[], &local, 1).unwrap();
        let preset =
            PresetRegion::new_with("test", &[], &[Generator::new(GeneratorType::Instrument, 0)], 1)
                .unwrap();
        EffectiveRegion::combine(&preset, &instrument, &sample)
    }

    fn started_voice(generators: &[Generator], velocity: u8) -> (Voice, Vec<i16>) {
        let data = wave_data();
        let mut voice = Voice::new_with(configurables());
        voice.start(&region(generators), MidiChannel(0), 60, velocity, data.len());
        (voice, data)
    }

    #[test]
    fn plays_and_reports_gains() {
        let (mut voice, data) = started_voice(&[], 127);
        let channel = Channel::new_with(false);
        assert_eq!(voice.state(), VoiceState::Playing);
        assert!(voice.process(&channel, &data));
        assert!(voice.block().iter().any(|s| *s != 0.0));

        let (previous, current) = voice.mix_gains();
        assert_eq!(previous, current, "the first block doesn't ramp in");
        assert_gt!(current[0], 0.0);
        assert!(approx_eq!(f32, current[0], current[1], epsilon = 1e-3));
        assert_eq!(voice.voice_length(), BLOCK_SIZE);

        let (_, reverb) = voice.reverb_sends();
        assert!(approx_eq!(f32, reverb, 40.0 / 127.0, epsilon = 1e-6));
    }

    #[test]
    fn velocity_zero_is_silent_and_dead() {
        let (mut voice, data) = started_voice(&[], 0);
        assert_eq!(voice.priority(), 0.0);
        assert!(!voice.process(&Channel::new_with(false), &data));
    }

    #[test]
    fn kill_frees_on_next_block() {
        let (mut voice, data) = started_voice(&[], 100);
        let channel = Channel::new_with(false);
        assert!(voice.process(&channel, &data));
        voice.kill();
        assert_eq!(voice.priority(), 0.0);
        assert!(!voice.process(&channel, &data));
    }

    #[test]
    fn release_waits_for_minimum_duration_and_hold_pedal() {
        let (mut voice, data) = started_voice(&[], 100);
        let mut channel = Channel::new_with(false);

        voice.end();
        assert_eq!(voice.state(), VoiceState::ReleaseRequested);
        assert!(voice.process(&channel, &data));
        assert_eq!(
            voice.state(),
            VoiceState::ReleaseRequested,
            "a brand-new voice doesn't release yet"
        );

        // 88 frames at 44.1 kHz; two blocks is enough.
        channel.set_hold_pedal(127);
        for _ in 0..3 {
            assert!(voice.process(&channel, &data));
        }
        assert_eq!(voice.state(), VoiceState::ReleaseRequested);

        channel.set_hold_pedal(0);
        assert!(voice.process(&channel, &data));
        assert_eq!(voice.state(), VoiceState::Released);

        voice.end();
        assert_eq!(voice.state(), VoiceState::Released, "end() is idempotent");
    }

    #[test]
    fn released_voice_eventually_dies() {
        let (mut voice, data) = started_voice(
            &[Generator::new(GeneratorType::ReleaseVolumeEnvelope, -1200)],
            100,
        );
        let channel = Channel::new_with(false);
        voice.process(&channel, &data);
        voice.process(&channel, &data);
        voice.end();

        // A half-second release at 64 frames a block.
        let mut blocks = 0;
        while voice.process(&channel, &data) {
            blocks += 1;
            assert_lt!(blocks, 1000, "voice never finished");
        }
        assert_gt!(blocks, 100);
    }

    #[test]
    fn pan_law() {
        let (mut voice, data) = started_voice(&[Generator::new(GeneratorType::Pan, -500)], 100);
        voice.process(&Channel::new_with(false), &data);
        let (_, gains) = voice.mix_gains();
        assert_gt!(gains[0], 0.0);
        assert!(
            approx_eq!(f32, gains[1], 0.0, epsilon = 1e-3),
            "hard left, got {gains:?}"
        );

        let (mut voice, data) = started_voice(&[Generator::new(GeneratorType::Pan, 500)], 100);
        let mut channel = Channel::new_with(false);
        channel.set_pan_coarse(127);
        voice.process(&channel, &data);
        let (_, gains) = voice.mix_gains();
        assert_eq!(gains[0], 0.0, "beyond hard right clamps");
        assert_gt!(gains[1], 0.0);
    }

    #[test]
    fn sends_are_clamped() {
        let (mut voice, data) = started_voice(
            &[
                Generator::new(GeneratorType::ReverbEffectsSend, 1000),
                Generator::new(GeneratorType::ChorusEffectsSend, 1000),
            ],
            100,
        );
        let mut channel = Channel::new_with(false);
        channel.set_reverb_send(127);
        channel.set_chorus_send(127);
        voice.process(&channel, &data);
        assert_eq!(voice.reverb_sends().1, 1.0);
        assert_eq!(voice.chorus_sends().1, 1.0);
    }

    #[test]
    fn channel_volume_changes_ramp() {
        let (mut voice, data) = started_voice(&[], 100);
        let mut channel = Channel::new_with(false);

        // Let the envelope reach its sustain level.
        for _ in 0..10 {
            voice.process(&channel, &data);
        }
        let (_, before) = voice.mix_gains();

        channel.set_volume_coarse(50);
        voice.process(&channel, &data);
        let (previous, current) = voice.mix_gains();
        assert_eq!(previous, before);
        assert_lt!(current[0], previous[0]);
    }
}

// Copyright (c) 2024 Mike Tsao

use crate::{
    patch::EffectiveRegion,
    prelude::*,
    util::math::{decibels_to_linear, exp_cutoff, key_number_to_multiplying_factor, NON_AUDIBLE},
};
use delegate::delegate;

/// The stages of a DAHDSR envelope, in the order they happen. An envelope only
/// moves forward through these, except that [EnvelopeStage::Release] can be
/// entered from any stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnvelopeStage {
    #[default]
    #[allow(missing_docs)]
    Delay,
    #[allow(missing_docs)]
    Attack,
    #[allow(missing_docs)]
    Hold,
    /// Falling toward the sustain level, and then holding there.
    Decay,
    #[allow(missing_docs)]
    Release,
}
impl EnvelopeStage {
    /// The stage that follows this one when its time runs out. Decay lasts
    /// until an explicit release, so it has no timed successor.
    pub fn next(&self) -> Self {
        match self {
            EnvelopeStage::Delay => EnvelopeStage::Attack,
            EnvelopeStage::Attack => EnvelopeStage::Hold,
            EnvelopeStage::Hold => EnvelopeStage::Decay,
            EnvelopeStage::Decay => EnvelopeStage::Decay,
            EnvelopeStage::Release => EnvelopeStage::Release,
        }
    }
}

/// The times, measured from note-on, at which the timed stages end.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct StageTimes {
    attack_start: f64,
    hold_start: f64,
    decay_start: f64,
}
impl StageTimes {
    fn new_with(delay: f32, attack: f32, hold: f32) -> Self {
        let attack_start = delay as f64;
        let hold_start = attack_start + attack as f64;
        let decay_start = hold_start + hold as f64;
        Self {
            attack_start,
            hold_start,
            decay_start,
        }
    }

    fn end_of(&self, stage: EnvelopeStage) -> Option<f64> {
        match stage {
            EnvelopeStage::Delay => Some(self.attack_start),
            EnvelopeStage::Attack => Some(self.hold_start),
            EnvelopeStage::Hold => Some(self.decay_start),
            EnvelopeStage::Decay | EnvelopeStage::Release => None,
        }
    }

    /// Walks forward past every stage that has already ended. Zero-length
    /// stages are skipped in one call.
    fn advance(&self, mut stage: EnvelopeStage, current_time: f64) -> EnvelopeStage {
        while let Some(end) = self.end_of(stage) {
            if current_time < end {
                break;
            }
            stage = stage.next();
        }
        stage
    }
}

/// Shapes a voice's amplitude. Decay and release fall exponentially, which
/// sounds linear in decibels.
#[derive(Clone, Debug, Default)]
pub struct VolumeEnvelope {
    c: Configurables,

    times: StageTimes,
    attack_slope: f64,
    decay_slope: f64,
    release_slope: f64,
    sustain_level: f32,

    release_start_time: f64,
    release_level: f32,

    processed_sample_count: usize,
    stage: EnvelopeStage,
    value: f32,
    priority: f32,
}
impl Configurable for VolumeEnvelope {
    delegate! {
        to self.c {
            fn sample_rate(&self) -> SampleRate;
            fn block_size(&self) -> usize;
        }
    }
}
impl VolumeEnvelope {
    /// Natural-log drop over the nominal decay or release time, about 80 dB.
    const CURVE_SCALE: f64 = -9.226;

    #[allow(missing_docs)]
    pub fn new_with(c: Configurables) -> Self {
        Self {
            c,
            ..Default::default()
        }
    }

    /// Starts a new note. Times are in seconds; `sustain` is a linear level
    /// and is clamped to [0, 1].
    pub fn start(&mut self, delay: f32, attack: f32, hold: f32, decay: f32, sustain: f32, release: f32) {
        self.times = StageTimes::new_with(delay, attack, hold);
        self.attack_slope = 1.0 / attack as f64;
        self.decay_slope = Self::CURVE_SCALE / decay as f64;
        self.release_slope = Self::CURVE_SCALE / release as f64;
        self.sustain_level = sustain.clamp(0.0, 1.0);
        self.release_start_time = 0.0;
        self.release_level = 0.0;
        self.processed_sample_count = 0;
        self.stage = EnvelopeStage::Delay;
        self.value = 0.0;
        self.process(0);
    }

    /// Starts from a region's volume-envelope generators. Hold and decay scale
    /// with key number, and release is at least 10 ms so that notes don't
    /// click off.
    pub fn start_with_region(&mut self, region: &EffectiveRegion, key: u8) {
        let key = key as i32;
        self.start(
            region.delay_volume_envelope(),
            region.attack_volume_envelope(),
            region.hold_volume_envelope()
                * key_number_to_multiplying_factor(region.key_number_to_volume_envelope_hold(), key),
            region.decay_volume_envelope()
                * key_number_to_multiplying_factor(
                    region.key_number_to_volume_envelope_decay(),
                    key,
                ),
            decibels_to_linear(-region.sustain_volume_envelope()),
            region.release_volume_envelope().max(0.01),
        );
    }

    /// Begins the release stage from wherever the envelope is now.
    pub fn release(&mut self) {
        self.stage = EnvelopeStage::Release;
        self.release_start_time = self.current_time();
        self.release_level = self.value;
    }

    fn current_time(&self) -> f64 {
        self.processed_sample_count as f64 / f64::from(self.c.sample_rate())
    }

    /// Advances by `sample_count` frames. Returns false once the level has
    /// fallen below audibility, which ends the voice.
    pub fn process(&mut self, sample_count: usize) -> bool {
        self.processed_sample_count += sample_count;
        let current_time = self.current_time();
        self.stage = self.times.advance(self.stage, current_time);

        match self.stage {
            EnvelopeStage::Delay => {
                self.value = 0.0;
                self.priority = 4.0 + self.value;
                true
            }
            EnvelopeStage::Attack => {
                self.value = (self.attack_slope * (current_time - self.times.attack_start)) as f32;
                self.priority = 3.0 + self.value;
                true
            }
            EnvelopeStage::Hold => {
                self.value = 1.0;
                self.priority = 2.0 + self.value;
                true
            }
            EnvelopeStage::Decay => {
                self.value = (exp_cutoff(self.decay_slope * (current_time - self.times.decay_start))
                    as f32)
                    .max(self.sustain_level);
                self.priority = 1.0 + self.value;
                self.value > NON_AUDIBLE
            }
            EnvelopeStage::Release => {
                self.value = self.release_level
                    * exp_cutoff(self.release_slope * (current_time - self.release_start_time))
                        as f32;
                self.priority = self.value;
                self.value > NON_AUDIBLE
            }
        }
    }

    /// The current level, 0..=1.
    pub fn value(&self) -> f32 {
        self.value
    }

    #[allow(missing_docs)]
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// How much this voice is worth keeping. Earlier stages and louder levels
    /// rank higher; the voice store steals the lowest.
    pub fn priority(&self) -> f32 {
        self.priority
    }
}

/// Drives pitch and filter modulation. Unlike [VolumeEnvelope], its decay and
/// release are straight lines.
#[derive(Clone, Debug, Default)]
pub struct ModulationEnvelope {
    c: Configurables,

    times: StageTimes,
    attack_slope: f64,
    decay_slope: f64,
    release_slope: f64,
    sustain_level: f32,

    decay_end_time: f64,
    release_end_time: f64,
    release_level: f32,

    processed_sample_count: usize,
    stage: EnvelopeStage,
    value: f32,
}
impl Configurable for ModulationEnvelope {
    delegate! {
        to self.c {
            fn sample_rate(&self) -> SampleRate;
            fn block_size(&self) -> usize;
        }
    }
}
impl ModulationEnvelope {
    #[allow(missing_docs)]
    pub fn new_with(c: Configurables) -> Self {
        Self {
            c,
            ..Default::default()
        }
    }

    /// Starts a new note. Times are in seconds; `sustain` is clamped to
    /// [0, 1].
    pub fn start(&mut self, delay: f32, attack: f32, hold: f32, decay: f32, sustain: f32, release: f32) {
        self.times = StageTimes::new_with(delay, attack, hold);
        self.attack_slope = 1.0 / attack as f64;
        self.decay_slope = 1.0 / decay as f64;
        self.release_slope = 1.0 / release as f64;
        self.decay_end_time = self.times.decay_start + decay as f64;
        self.release_end_time = release as f64;
        self.sustain_level = sustain.clamp(0.0, 1.0);
        self.release_level = 0.0;
        self.processed_sample_count = 0;
        self.stage = EnvelopeStage::Delay;
        self.value = 0.0;
        self.process(0);
    }

    /// Starts from a region's modulation-envelope generators. Harder notes
    /// attack faster.
    pub fn start_with_region(&mut self, region: &EffectiveRegion, key: u8, velocity: u8) {
        let key = key as i32;
        self.start(
            region.delay_modulation_envelope(),
            region.attack_modulation_envelope() * ((145 - velocity as i32) as f32 / 144.0),
            region.hold_modulation_envelope()
                * key_number_to_multiplying_factor(
                    region.key_number_to_modulation_envelope_hold(),
                    key,
                ),
            region.decay_modulation_envelope()
                * key_number_to_multiplying_factor(
                    region.key_number_to_modulation_envelope_decay(),
                    key,
                ),
            1.0 - region.sustain_modulation_envelope() / 100.0,
            region.release_modulation_envelope(),
        );
    }

    /// Begins the release stage from wherever the envelope is now.
    pub fn release(&mut self) {
        self.stage = EnvelopeStage::Release;
        self.release_end_time += self.current_time();
        self.release_level = self.value;
    }

    fn current_time(&self) -> f64 {
        self.processed_sample_count as f64 / f64::from(self.c.sample_rate())
    }

    /// Advances by `sample_count` frames. Returns false once the release has
    /// finished.
    pub fn process(&mut self, sample_count: usize) -> bool {
        self.processed_sample_count += sample_count;
        let current_time = self.current_time();
        self.stage = self.times.advance(self.stage, current_time);

        match self.stage {
            EnvelopeStage::Delay => {
                self.value = 0.0;
                true
            }
            EnvelopeStage::Attack => {
                self.value = (self.attack_slope * (current_time - self.times.attack_start)) as f32;
                true
            }
            EnvelopeStage::Hold => {
                self.value = 1.0;
                true
            }
            EnvelopeStage::Decay => {
                self.value = ((self.decay_slope * (self.decay_end_time - current_time)) as f32)
                    .max(self.sustain_level);
                self.value > NON_AUDIBLE
            }
            EnvelopeStage::Release => {
                self.value = ((self.release_level as f64
                    * self.release_slope
                    * (self.release_end_time - current_time)) as f32)
                    .max(0.0);
                self.value > NON_AUDIBLE
            }
        }
    }

    /// The current level, 0..=1.
    pub fn value(&self) -> f32 {
        self.value
    }

    #[allow(missing_docs)]
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use more_asserts::{assert_ge, assert_gt, assert_le, assert_lt};

    // Small enough that one frame is a round number of seconds.
    const SAMPLE_RATE: usize = 1000;

    fn c() -> Configurables {
        Configurables::new_with(SampleRate(SAMPLE_RATE), 10)
    }

    #[test]
    fn volume_envelope_walks_through_stages() {
        let mut e = VolumeEnvelope::new_with(c());
        e.start(0.125, 0.25, 0.125, 0.5, 0.5, 0.25);
        assert_eq!(e.stage(), EnvelopeStage::Delay);
        assert_eq!(e.value(), 0.0);
        assert_eq!(e.priority(), 4.0);

        assert!(e.process(125));
        assert_eq!(e.stage(), EnvelopeStage::Attack);
        assert!(e.process(125));
        assert_eq!(e.stage(), EnvelopeStage::Attack);
        assert!(approx_eq!(f32, e.value(), 0.5, epsilon = 1e-6));
        assert!(approx_eq!(f32, e.priority(), 3.5, epsilon = 1e-6));

        assert!(e.process(125));
        assert_eq!(e.stage(), EnvelopeStage::Hold);
        assert_eq!(e.value(), 1.0);

        assert!(e.process(125));
        assert_eq!(e.stage(), EnvelopeStage::Decay);
        assert!(approx_eq!(f32, e.value(), 1.0, epsilon = 1e-6));

        assert!(e.process(1000));
        assert_eq!(e.stage(), EnvelopeStage::Decay);
        assert_eq!(e.value(), 0.5, "decay should bottom out at the sustain level");
        assert!(approx_eq!(f32, e.priority(), 1.5, epsilon = 1e-6));
    }

    #[test]
    fn volume_envelope_decay_is_exponential() {
        let mut e = VolumeEnvelope::new_with(c());
        e.start(0.0, 0.0, 0.0, 1.0, 0.0, 1.0);
        assert_eq!(e.stage(), EnvelopeStage::Decay, "zero-length stages are skipped");
        e.process(500);
        assert!(approx_eq!(
            f32,
            e.value(),
            (-9.226f64 * 0.5).exp() as f32,
            epsilon = 1e-6
        ));
        // The curve crosses the audible floor about three quarters of the way
        // through the nominal decay time.
        assert!(e.process(240));
        assert_gt!(e.value(), NON_AUDIBLE);
        assert!(!e.process(20));
    }

    #[test]
    fn volume_envelope_release_from_any_stage() {
        let mut e = VolumeEnvelope::new_with(c());
        e.start(0.0, 1.0, 0.0, 1.0, 1.0, 0.5);
        e.process(250);
        let level = e.value();
        assert!(approx_eq!(f32, level, 0.25, epsilon = 1e-6));

        e.release();
        assert_eq!(e.stage(), EnvelopeStage::Release);
        assert!(e.process(0));
        assert!(approx_eq!(f32, e.value(), level, epsilon = 1e-6));
        assert!(approx_eq!(f32, e.priority(), level, epsilon = 1e-6));

        e.process(100);
        assert_lt!(e.value(), level);
        assert!(!e.process(1000));
        assert_eq!(e.value(), 0.0);
    }

    #[test]
    fn sustain_is_clamped() {
        let mut e = VolumeEnvelope::new_with(c());
        e.start(0.0, 0.0, 0.0, 0.1, 3.0, 0.1);
        e.process(1000);
        assert_eq!(e.value(), 1.0);

        let mut e = ModulationEnvelope::new_with(c());
        e.start(0.0, 0.0, 0.0, 0.1, -1.0, 0.1);
        assert!(!e.process(1000), "a zero sustain decays to silence");
    }

    #[test]
    fn stages_never_regress() {
        let mut e = VolumeEnvelope::new_with(c());
        e.start(0.05, 0.05, 0.05, 0.05, 0.5, 0.05);
        let mut m = ModulationEnvelope::new_with(c());
        m.start(0.05, 0.05, 0.05, 0.05, 0.5, 0.05);
        let mut last = (e.stage(), m.stage());
        for _ in 0..100 {
            e.process(7);
            m.process(7);
            assert_ge!(e.stage(), last.0);
            assert_ge!(m.stage(), last.1);
            last = (e.stage(), m.stage());
        }
        assert_eq!(last, (EnvelopeStage::Decay, EnvelopeStage::Decay));
    }

    #[test]
    fn modulation_envelope_is_linear() {
        let mut e = ModulationEnvelope::new_with(c());
        e.start(0.0, 0.25, 0.0, 1.0, 0.0, 0.5);
        e.process(125);
        assert!(approx_eq!(f32, e.value(), 0.5, epsilon = 1e-6));
        e.process(125);
        assert_eq!(e.stage(), EnvelopeStage::Decay);
        e.process(250);
        assert!(approx_eq!(f32, e.value(), 0.75, epsilon = 1e-6));

        e.release();
        let level = e.value();
        e.process(250);
        assert!(approx_eq!(f32, e.value(), level * 0.5, epsilon = 1e-5));
        assert!(!e.process(300));
        assert_eq!(e.value(), 0.0);
    }

    #[test]
    fn next_stage() {
        let mut stage = EnvelopeStage::default();
        let mut seen = vec![stage];
        for _ in 0..5 {
            stage = stage.next();
            assert_le!(*seen.last().unwrap(), stage);
            seen.push(stage);
        }
        assert_eq!(stage, EnvelopeStage::Decay);
        assert_eq!(EnvelopeStage::Release.next(), EnvelopeStage::Release);
    }
}

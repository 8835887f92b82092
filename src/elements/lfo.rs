// Copyright (c) 2024 Mike Tsao

use crate::{patch::EffectiveRegion, prelude::*};
use delegate::delegate;

/// A triangle-wave low-frequency oscillator that advances once per block.
/// Output is in [-1, 1], starting at zero and rising.
#[derive(Clone, Debug, Default)]
pub struct Lfo {
    c: Configurables,
    active: bool,
    delay: f64,
    period: f64,
    processed_sample_count: usize,
    value: f32,
}
impl Configurable for Lfo {
    delegate! {
        to self.c {
            fn sample_rate(&self) -> SampleRate;
            fn block_size(&self) -> usize;
        }
    }
}
impl Lfo {
    /// Frequencies at or below this (Hz) leave the LFO switched off.
    const MINIMUM_FREQUENCY: f32 = 1.0e-3;

    #[allow(missing_docs)]
    pub fn new_with(c: Configurables) -> Self {
        Self {
            c,
            ..Default::default()
        }
    }

    /// Restarts the wave. `delay` is seconds of silence before it begins.
    pub fn start(&mut self, delay: f32, frequency: f32) {
        self.value = 0.0;
        if frequency > Self::MINIMUM_FREQUENCY {
            self.active = true;
            self.delay = delay as f64;
            self.period = 1.0 / frequency as f64;
            self.processed_sample_count = 0;
        } else {
            self.active = false;
        }
    }

    /// Starts with the region's vibrato LFO settings.
    pub fn start_vibrato(&mut self, region: &EffectiveRegion) {
        self.start(region.delay_vibrato_lfo(), region.frequency_vibrato_lfo());
    }

    /// Starts with the region's modulation LFO settings.
    pub fn start_modulation(&mut self, region: &EffectiveRegion) {
        self.start(
            region.delay_modulation_lfo(),
            region.frequency_modulation_lfo(),
        );
    }

    /// Advances by one block.
    pub fn process(&mut self) {
        if !self.active {
            return;
        }
        self.processed_sample_count += self.c.block_size();
        let current_time =
            self.processed_sample_count as f64 / f64::from(self.c.sample_rate());
        if current_time < self.delay {
            self.value = 0.0;
            return;
        }

        let phase = ((current_time - self.delay) % self.period) / self.period;
        self.value = if phase < 0.25 {
            4.0 * phase
        } else if phase < 0.75 {
            4.0 * (0.5 - phase)
        } else {
            4.0 * (phase - 1.0)
        } as f32;
    }

    /// The current output, -1..=1.
    pub fn value(&self) -> f32 {
        self.value
    }

    #[allow(missing_docs)]
    pub fn is_active(&self) -> bool {
        self.active
    }
}

// Copyright (c) 2024 Mike Tsao

use crate::prelude::*;
use core::f64::consts::PI;
use delegate::delegate;

/// Biquad coefficients, already divided through by a0.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct CoefficientSet {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}
impl CoefficientSet {
    fn new_normalized(a0: f64, a1: f64, a2: f64, b0: f64, b1: f64, b2: f64) -> Self {
        Self {
            b0: (b0 / a0) as f32,
            b1: (b1 / a0) as f32,
            b2: (b2 / a0) as f32,
            a1: (a1 / a0) as f32,
            a2: (a2 / a0) as f32,
        }
    }
}

/// A resonant 12dB/octave low-pass filter that works a block at a time.
///
/// <https://en.wikipedia.org/wiki/Digital_biquad_filter>
/// <https://www.w3.org/TR/audio-eq-cookbook/>
#[derive(Clone, Debug, Default)]
pub struct BiQuadFilter {
    c: Configurables,
    active: bool,
    coefficients: CoefficientSet,

    // Working variables
    sample_m1: f32, // x(n-1)
    sample_m2: f32,
    output_m1: f32,
    output_m2: f32,
}
impl Configurable for BiQuadFilter {
    delegate! {
        to self.c {
            fn sample_rate(&self) -> SampleRate;
            fn block_size(&self) -> usize;
        }
    }
}
impl BiQuadFilter {
    /// 1 - 1/√2. Offsets the Q so that the resonant peak lands near the
    /// requested height (within about 3%).
    const RESONANCE_PEAK_OFFSET: f32 = 1.0 - core::f32::consts::FRAC_1_SQRT_2;

    #[allow(missing_docs)]
    pub fn new_with(c: Configurables) -> Self {
        Self {
            c,
            ..Default::default()
        }
    }

    fn rbj_intermediates_q(
        sample_rate: SampleRate,
        cutoff: f64,
        q: f64,
    ) -> (f64, f64, f64, f64) {
        let w0 = 2.0f64 * PI * cutoff / sample_rate.0 as f64;
        let w0cos = w0.cos();
        let w0sin = w0.sin();
        let alpha = w0sin / (2.0 * q.max(f64::EPSILON));
        (w0, w0cos, w0sin, alpha)
    }

    /// Zeroes the filter history.
    pub fn clear_buffer(&mut self) {
        self.sample_m1 = 0.0;
        self.sample_m2 = 0.0;
        self.output_m1 = 0.0;
        self.output_m2 = 0.0;
    }

    /// Sets the cutoff in Hertz and the resonance as a linear peak gain (1.0 is
    /// no peak). Cutoffs at or near Nyquist turn the filter into a
    /// pass-through.
    pub fn set_low_pass_filter(&mut self, cutoff: f32, resonance: f32) {
        if cutoff >= 0.499 * f32::from(self.c.sample_rate()) {
            self.active = false;
            return;
        }
        self.active = true;

        let q = resonance - Self::RESONANCE_PEAK_OFFSET / (1.0 + 6.0 * (resonance - 1.0));
        let (_w0, w0cos, _w0sin, alpha) =
            Self::rbj_intermediates_q(self.c.sample_rate(), cutoff as f64, q as f64);
        self.coefficients = CoefficientSet::new_normalized(
            1.0 + alpha,
            -2.0f64 * w0cos,
            1.0 - alpha,
            (1.0 - w0cos) / 2.0f64,
            1.0 - w0cos,
            (1.0 - w0cos) / 2.0f64,
        );
    }

    /// Whether the last [BiQuadFilter::set_low_pass_filter()] left the filter
    /// doing anything.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Filters the block in place. When inactive, the block passes through
    /// untouched but the history still tracks it, so that turning the filter
    /// back on doesn't click.
    pub fn process(&mut self, block: &mut [SampleType]) {
        if self.active {
            let c = self.coefficients;
            for sample in block.iter_mut() {
                let input = *sample;
                let output = c.b0 * input + c.b1 * self.sample_m1 + c.b2 * self.sample_m2
                    - c.a1 * self.output_m1
                    - c.a2 * self.output_m2;

                // Scroll everything forward in time.
                self.sample_m2 = self.sample_m1;
                self.sample_m1 = input;
                self.output_m2 = self.output_m1;
                self.output_m1 = output;

                *sample = output;
            }
        } else if let [.., x2, x1] = block {
            self.sample_m2 = *x2;
            self.sample_m1 = *x1;
            self.output_m2 = *x2;
            self.output_m1 = *x1;
        }
    }
}

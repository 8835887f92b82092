// Copyright (c) 2024 Mike Tsao

//! Unit conversions used by SoundFont-style generators, and the two buffer
//! primitives the mixer is built on.

use crate::types::SampleType;

/// π/2, the pan angle at which a voice is hard right.
pub const HALF_PI: f32 = core::f32::consts::FRAC_PI_2;

/// Anything quieter than this is treated as silence.
pub const NON_AUDIBLE: f32 = 1.0e-3;

/// ln([NON_AUDIBLE]), precomputed for the exponential envelope curve.
pub const LOG_NON_AUDIBLE: f64 = -6.907_755_278_982_137;

/// Converts timecents to seconds. 1200 timecents double the duration.
pub fn timecents_to_seconds(x: f32) -> f32 {
    2.0f64.powf(x as f64 / 1200.0) as f32
}

/// Converts absolute cents (0 = MIDI key 0, about 8.176 Hz) to Hertz.
pub fn cents_to_hertz(x: f32) -> f32 {
    (8.176 * 2.0f64.powf(x as f64 / 1200.0)) as f32
}

/// Converts a relative pitch in cents to a frequency ratio.
pub fn cents_to_multiplying_factor(x: f32) -> f32 {
    2.0f64.powf(x as f64 / 1200.0) as f32
}

#[allow(missing_docs)]
pub fn decibels_to_linear(x: f32) -> f32 {
    10.0f64.powf(0.05 * x as f64) as f32
}

#[allow(missing_docs)]
pub fn linear_to_decibels(x: f32) -> f32 {
    (20.0 * (x as f64).log10()) as f32
}

/// Scales an envelope time by key number. `cents` is the per-key change in
/// timecents; key 60 is the pivot where the factor is 1.
pub fn key_number_to_multiplying_factor(cents: i32, key: i32) -> f32 {
    timecents_to_seconds((cents * (60 - key)) as f32)
}

/// `exp(x)`, except that anything below the audible floor becomes exactly
/// zero.
pub fn exp_cutoff(x: f64) -> f64 {
    if x < LOG_NON_AUDIBLE {
        0.0
    } else {
        x.exp()
    }
}

/// `destination[i] += a * x[i]`
pub fn multiply_add(a: SampleType, x: &[SampleType], destination: &mut [SampleType]) {
    destination
        .iter_mut()
        .zip(x.iter())
        .for_each(|(d, x)| *d += a * x);
}

/// Like [multiply_add], but `a` moves by `step` after every sample. Used to
/// ramp a gain change across a block.
pub fn multiply_add_slope(
    a: SampleType,
    step: SampleType,
    x: &[SampleType],
    destination: &mut [SampleType],
) {
    let mut a = a;
    for (d, x) in destination.iter_mut().zip(x.iter()) {
        *d += a * x;
        a += step;
    }
}

/// Mixes `source` into `destination`, ramping the gain from `previous_gain`
/// at the first frame toward `current_gain`. Nothing is written if both gains
/// are inaudible.
pub fn write_block(
    previous_gain: SampleType,
    current_gain: SampleType,
    source: &[SampleType],
    destination: &mut [SampleType],
) {
    if previous_gain.max(current_gain) < NON_AUDIBLE {
        return;
    }
    if (current_gain - previous_gain).abs() < 1.0e-3 {
        multiply_add(current_gain, source, destination);
    } else {
        let step = (current_gain - previous_gain) / destination.len().max(1) as SampleType;
        multiply_add_slope(previous_gain, step, source, destination);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use more_asserts::assert_gt;

    #[test]
    fn conversions() {
        assert_eq!(timecents_to_seconds(0.0), 1.0);
        assert_eq!(timecents_to_seconds(-1200.0), 0.5);
        assert!(approx_eq!(f32, cents_to_hertz(6900.0), 440.0, epsilon = 0.01));
        assert_eq!(cents_to_multiplying_factor(1200.0), 2.0);
        assert!(approx_eq!(f32, decibels_to_linear(-20.0), 0.1, ulps = 4));
        assert!(approx_eq!(f32, linear_to_decibels(0.1), -20.0, ulps = 4));
        assert_eq!(key_number_to_multiplying_factor(100, 60), 1.0);
        assert_eq!(key_number_to_multiplying_factor(100, 48), 2.0);
        assert!(approx_eq!(
            f64,
            LOG_NON_AUDIBLE,
            (NON_AUDIBLE as f64).ln(),
            epsilon = 1e-6
        ));
    }

    #[test]
    fn exp_cutoff_floors_to_zero() {
        assert_eq!(exp_cutoff(0.0), 1.0);
        assert_eq!(exp_cutoff(-7.0), 0.0);
        assert_gt!(exp_cutoff(-6.0), 0.0);
    }

    #[test]
    fn multiply_add_variants() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let mut d = [1.0; 4];
        multiply_add(0.5, &x, &mut d);
        assert_eq!(d, [1.5, 2.0, 2.5, 3.0]);

        let mut d = [0.0; 4];
        multiply_add_slope(0.0, 0.25, &x, &mut d);
        assert_eq!(d, [0.0, 0.5, 1.5, 3.0]);
    }

    #[test]
    fn write_block_ramps_or_skips() {
        let x = [1.0; 4];
        let mut d = [0.0; 4];
        write_block(0.0, 0.0005, &x, &mut d);
        assert_eq!(d, [0.0; 4], "inaudible gains write nothing");

        write_block(0.5, 0.5, &x, &mut d);
        assert_eq!(d, [0.5; 4]);

        let mut d = [0.0; 4];
        write_block(0.0, 1.0, &x, &mut d);
        assert_eq!(d, [0.0, 0.25, 0.5, 0.75]);
    }
}

// Copyright (c) 2024 Mike Tsao

//! Handles digital-audio and wall-clock time.

use crate::prelude::*;
use core::ops::Mul;
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use synonym::Synonym;

/// Beats per minute.
#[derive(Synonym, Serialize, Deserialize, Clone, Copy, Debug, Derivative, PartialEq)]
#[derivative(Default)]
#[synonym(skip(Default))]
#[serde(rename_all = "kebab-case")]
pub struct Tempo(#[derivative(Default(value = "120.0"))] pub ParameterType);
impl Tempo {
    /// The number of microseconds in a minute, used to convert the
    /// microseconds-per-quarter-note form found in MIDI files.
    pub const MICROSECONDS_PER_MINUTE: ParameterType = 60_000_000.0;

    /// Converts a MIDI set-tempo value (microseconds per quarter note).
    pub fn from_microseconds_per_quarter(microseconds: u32) -> Self {
        if microseconds == 0 {
            Self::default()
        } else {
            Self(Self::MICROSECONDS_PER_MINUTE / microseconds as ParameterType)
        }
    }

    /// Beats per second.
    pub fn bps(&self) -> ParameterType {
        self.0 / 60.0
    }

    /// How long one tick lasts at this tempo, given the file's
    /// ticks-per-quarter-note resolution.
    pub fn seconds_per_tick(&self, resolution: u16) -> Seconds {
        Seconds(60.0 / (resolution as ParameterType * self.0))
    }
}

/// Represents the [seconds](https://en.wikipedia.org/wiki/Second) unit of time.
#[derive(Synonym, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Seconds(pub f64);
impl Seconds {
    /// Zero seconds.
    pub const fn zero() -> Seconds {
        Seconds(0.0)
    }

    /// Converts SoundFont timecents (1200 per octave of time) to seconds.
    pub fn from_timecents(timecents: f64) -> Self {
        Self(2.0f64.powf(timecents / 1200.0))
    }
}
impl From<f32> for Seconds {
    fn from(value: f32) -> Self {
        Self(value as f64)
    }
}
impl From<Seconds> for f32 {
    fn from(value: Seconds) -> Self {
        value.0 as f32
    }
}
/// Samples per second. Always a positive integer; cannot be zero.
#[derive(Synonym, Serialize, Deserialize, Derivative)]
#[derivative(Default)]
#[synonym(skip(Default))]
#[serde(rename_all = "kebab-case")]
pub struct SampleRate(#[derivative(Default(value = "44100"))] pub usize);
#[allow(missing_docs)]
impl SampleRate {
    pub const DEFAULT_SAMPLE_RATE: usize = 44100;
    pub const DEFAULT: SampleRate = SampleRate::new(Self::DEFAULT_SAMPLE_RATE);

    pub const fn new(value: usize) -> Self {
        if value != 0 {
            Self(value)
        } else {
            Self(Self::DEFAULT_SAMPLE_RATE)
        }
    }

    /// How long the given number of frames lasts at this rate.
    pub fn frames_to_seconds(&self, frames: usize) -> Seconds {
        Seconds(frames as f64 / self.0 as f64)
    }
}
impl From<f64> for SampleRate {
    fn from(value: f64) -> Self {
        Self::new(value as usize)
    }
}
impl From<SampleRate> for f64 {
    fn from(value: SampleRate) -> Self {
        value.0 as f64
    }
}
impl From<SampleRate> for f32 {
    fn from(value: SampleRate) -> Self {
        value.0 as f32
    }
}
impl Mul<Seconds> for SampleRate {
    type Output = usize;

    // (sample rate x seconds) = buffer size
    fn mul(self, rhs: Seconds) -> Self::Output {
        (self.0 as f64 * rhs.0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn tempo() {
        let t = Tempo::default();
        assert_eq!(t.0, 120.0);
        assert_eq!(t.bps(), 2.0);

        assert_eq!(Tempo::from_microseconds_per_quarter(500_000).0, 120.0);
        assert_eq!(Tempo::from_microseconds_per_quarter(1_000_000).0, 60.0);
        assert_eq!(
            Tempo::from_microseconds_per_quarter(0).0,
            Tempo::default().0,
            "a zero set-tempo value should fall back to the default"
        );

        assert!(approx_eq!(
            f64,
            Tempo::default().seconds_per_tick(480).0 * 480.0,
            0.5,
            epsilon = 1e-12
        ));
    }

    #[test]
    fn sample_rate_default_is_reasonable() {
        let sr = SampleRate::default();
        assert_eq!(sr.0, 44100);
        assert_eq!(SampleRate::new(0), SampleRate::DEFAULT);
        assert_eq!(sr * Seconds(0.5), 22050);
        assert_eq!(sr.frames_to_seconds(44100).0, 1.0);
    }

    #[test]
    fn timecents() {
        assert_eq!(Seconds::from_timecents(0.0).0, 1.0);
        assert_eq!(Seconds::from_timecents(1200.0).0, 2.0);
        assert!(approx_eq!(
            f64,
            Seconds::from_timecents(-12000.0).0,
            1.0 / 1024.0,
            epsilon = 1e-12
        ));
    }
}

// Copyright (c) 2024 Mike Tsao

//! Structs that hold configuration information about various parts of the
//! system. Intended to be serialized.

use crate::prelude::*;
use derivative::Derivative;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a [SynthesizerSettings] can't be used to build a synthesizer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[allow(missing_docs)]
    #[error("the sample rate must be between 16000 and 192000 Hz, but was {0}")]
    SampleRate(usize),
    #[allow(missing_docs)]
    #[error("the block size must be between 8 and 1024, but was {0}")]
    BlockSize(usize),
    #[allow(missing_docs)]
    #[error("the maximum polyphony must be between 8 and 256, but was {0}")]
    MaximumPolyphony(usize),
}

/// Construction-time settings for a synthesizer. These can't change while the
/// synthesizer is running.
#[derive(Clone, Debug, Builder, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(default, rename_all = "kebab-case")]
#[builder(default, build_fn(private, name = "build_from_builder"))]
pub struct SynthesizerSettings {
    /// Output sample rate, in Hertz.
    sample_rate: SampleRate,

    /// Number of frames each voice renders at a time. Events take effect on
    /// block boundaries.
    #[derivative(Default(value = "64"))]
    block_size: usize,

    /// The most voices that can sound at once before older or quieter ones are
    /// stolen.
    #[derivative(Default(value = "64"))]
    maximum_polyphony: usize,

    /// Whether the chorus and reverb send buses exist at all.
    #[derivative(Default(value = "true"))]
    enable_reverb_and_chorus: bool,
}
impl SynthesizerSettingsBuilder {
    /// The overridden Builder build() method. Unlike the generated one, this
    /// also range-checks the fields.
    pub fn build(&self) -> anyhow::Result<SynthesizerSettings> {
        let settings = self.build_from_builder()?;
        settings.validate()?;
        Ok(settings)
    }
}
#[allow(missing_docs)]
impl SynthesizerSettings {
    pub const SAMPLE_RATE_RANGE: core::ops::RangeInclusive<usize> = 16000..=192000;
    pub const BLOCK_SIZE_RANGE: core::ops::RangeInclusive<usize> = 8..=1024;
    pub const MAXIMUM_POLYPHONY_RANGE: core::ops::RangeInclusive<usize> = 8..=256;

    /// Settings at the given sample rate, everything else default.
    pub fn new_with(sample_rate: SampleRate) -> Self {
        Self {
            sample_rate,
            ..Default::default()
        }
    }

    /// Checks that every field is in its supported range.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !Self::SAMPLE_RATE_RANGE.contains(&self.sample_rate.0) {
            return Err(SettingsError::SampleRate(self.sample_rate.0));
        }
        if !Self::BLOCK_SIZE_RANGE.contains(&self.block_size) {
            return Err(SettingsError::BlockSize(self.block_size));
        }
        if !Self::MAXIMUM_POLYPHONY_RANGE.contains(&self.maximum_polyphony) {
            return Err(SettingsError::MaximumPolyphony(self.maximum_polyphony));
        }
        Ok(())
    }

    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    pub fn set_sample_rate(&mut self, sample_rate: SampleRate) {
        self.sample_rate = sample_rate;
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn set_block_size(&mut self, block_size: usize) {
        self.block_size = block_size;
    }

    pub fn maximum_polyphony(&self) -> usize {
        self.maximum_polyphony
    }

    pub fn set_maximum_polyphony(&mut self, maximum_polyphony: usize) {
        self.maximum_polyphony = maximum_polyphony;
    }

    pub fn enable_reverb_and_chorus(&self) -> bool {
        self.enable_reverb_and_chorus
    }

    pub fn set_enable_reverb_and_chorus(&mut self, enable: bool) {
        self.enable_reverb_and_chorus = enable;
    }

    /// The sample rate and block size as a [Configurables].
    pub fn configurables(&self) -> Configurables {
        Configurables::new_with(self.sample_rate, self.block_size)
    }
}

// Copyright (c) 2024 Mike Tsao

use crate::{
    patch::{EffectiveRegion, LoopMode},
    prelude::*,
};
use delegate::delegate;

/// A wavetable oscillator that plays back one sample out of a shared 16-bit
/// PCM array, resampled to the engine rate with linear interpolation.
///
/// The read position is fixed-point: the integer sample index lives above
/// [Oscillator::FRAC_BITS], the fraction below it.
#[derive(Clone, Debug, Default)]
pub struct Oscillator {
    c: Configurables,

    loop_mode: LoopMode,
    sample_sample_rate: i32,
    start: i32,
    end: i32,
    start_loop: i32,
    end_loop: i32,
    root_key: i32,

    tune: f64,
    pitch_change_scale: f64,
    sample_rate_ratio: f64,

    looping: bool,
    position_fp: i64,
}
impl Configurable for Oscillator {
    delegate! {
        to self.c {
            fn sample_rate(&self) -> SampleRate;
            fn block_size(&self) -> usize;
        }
    }
}
impl Oscillator {
    /// Bits of fraction in the fixed-point read position.
    pub const FRAC_BITS: u32 = 24;
    const FRAC_UNIT: i64 = 1 << Self::FRAC_BITS;
    const FRAC_MASK: i64 = Self::FRAC_UNIT - 1;
    const FP_TO_SAMPLE: f32 = 1.0 / (32768.0 * Self::FRAC_UNIT as f32);

    #[allow(missing_docs)]
    pub fn new_with(c: Configurables) -> Self {
        Self {
            c,
            ..Default::default()
        }
    }

    /// Prepares to play a sample. Offsets are absolute frame indexes into the
    /// data that will be passed to [Oscillator::process()]; they are clamped
    /// to `data_len` so that no read can fall outside it. A loop with no
    /// length plays as [LoopMode::NoLoop].
    #[allow(clippy::too_many_arguments)]
    pub fn start(
        &mut self,
        data_len: usize,
        loop_mode: LoopMode,
        sample_rate: i32,
        start: i32,
        end: i32,
        start_loop: i32,
        end_loop: i32,
        root_key: i32,
        coarse_tune: i32,
        fine_tune: i32,
        scale_tuning: i32,
    ) {
        let last = (data_len.min(i32::MAX as usize) as i32 - 1).max(0);
        self.end = end.clamp(0, last);
        self.start = start.clamp(0, self.end);
        self.start_loop = start_loop.clamp(0, self.end);
        self.end_loop = end_loop.clamp(self.start_loop, self.end);
        self.loop_mode = if self.end_loop > self.start_loop {
            loop_mode
        } else {
            LoopMode::NoLoop
        };

        self.sample_sample_rate = sample_rate;
        self.root_key = root_key;
        self.tune = coarse_tune as f64 + 0.01 * fine_tune as f64;
        self.pitch_change_scale = 0.01 * scale_tuning as f64;
        self.sample_rate_ratio = if sample_rate > 0 {
            sample_rate as f64 / f64::from(self.c.sample_rate())
        } else {
            0.0
        };
        self.looping = self.loop_mode != LoopMode::NoLoop;
        self.position_fp = (self.start as i64) << Self::FRAC_BITS;
    }

    /// [Oscillator::start()] with everything taken from a region.
    pub fn start_with_region(&mut self, region: &EffectiveRegion, data_len: usize) {
        self.start(
            data_len,
            region.loop_mode(),
            region.sample_rate(),
            region.sample_start(),
            region.sample_end(),
            region.sample_start_loop(),
            region.sample_end_loop(),
            region.root_key(),
            region.coarse_tune(),
            region.fine_tune(),
            region.scale_tuning(),
        );
    }

    /// Stops looping if the loop mode says to stop at note-off. The rest of the
    /// sample then plays out.
    pub fn release(&mut self) {
        if self.loop_mode == LoopMode::LoopUntilNoteOff {
            self.looping = false;
        }
    }

    /// Fills `block` at the given pitch (a MIDI key number, fractional for
    /// bends and modulation). Returns false if the sample had already ended,
    /// which means the voice is done. A sample that ends partway through the
    /// block is padded with silence. A sample without a positive sample rate
    /// never plays.
    pub fn process(&mut self, data: &[i16], block: &mut [SampleType], pitch: f32) -> bool {
        if self.sample_sample_rate <= 0 || data.len() <= self.end as usize {
            return false;
        }
        let pitch_change =
            self.pitch_change_scale * (f64::from(pitch) - self.root_key as f64) + self.tune;
        let pitch_ratio = self.sample_rate_ratio * 2.0f64.powf(pitch_change / 12.0);
        self.fill_block(data, block, pitch_ratio)
    }

    fn fill_block(&mut self, data: &[i16], block: &mut [SampleType], pitch_ratio: f64) -> bool {
        let pitch_ratio_fp = (Self::FRAC_UNIT as f64 * pitch_ratio) as i64;
        if self.looping {
            self.fill_block_continuous(data, block, pitch_ratio_fp)
        } else {
            self.fill_block_no_loop(data, block, pitch_ratio_fp)
        }
    }

    fn interpolate(x1: i16, x2: i16, a_fp: i64) -> SampleType {
        let x1 = x1 as i64;
        let x2 = x2 as i64;
        Self::FP_TO_SAMPLE * ((x1 << Self::FRAC_BITS) + a_fp * (x2 - x1)) as f32
    }

    fn fill_block_no_loop(
        &mut self,
        data: &[i16],
        block: &mut [SampleType],
        pitch_ratio_fp: i64,
    ) -> bool {
        for t in 0..block.len() {
            let index = (self.position_fp >> Self::FRAC_BITS) as usize;
            if index >= self.end as usize {
                if t > 0 {
                    block[t..].fill(0.0);
                    return true;
                } else {
                    return false;
                }
            }
            block[t] = Self::interpolate(
                data[index],
                data[index + 1],
                self.position_fp & Self::FRAC_MASK,
            );
            self.position_fp += pitch_ratio_fp;
        }
        true
    }

    fn fill_block_continuous(
        &mut self,
        data: &[i16],
        block: &mut [SampleType],
        pitch_ratio_fp: i64,
    ) -> bool {
        let start_loop_fp = (self.start_loop as i64) << Self::FRAC_BITS;
        let end_loop_fp = (self.end_loop as i64) << Self::FRAC_BITS;
        let loop_length = (self.end_loop - self.start_loop) as usize;
        let loop_length_fp = (loop_length as i64) << Self::FRAC_BITS;

        for sample in block.iter_mut() {
            if self.position_fp >= end_loop_fp {
                self.position_fp = start_loop_fp + (self.position_fp - start_loop_fp) % loop_length_fp;
            }
            let index1 = (self.position_fp >> Self::FRAC_BITS) as usize;
            let mut index2 = index1 + 1;
            if index2 >= self.end_loop as usize {
                index2 -= loop_length;
            }
            *sample = Self::interpolate(
                data[index1],
                data[index2],
                self.position_fp & Self::FRAC_MASK,
            );
            self.position_fp += pitch_ratio_fp;
        }
        true
    }

    /// The integer part of the read position.
    pub fn position(&self) -> usize {
        (self.position_fp >> Self::FRAC_BITS) as usize
    }
}

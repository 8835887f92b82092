// Copyright (c) 2024 Mike Tsao

use crate::prelude::*;

/// Buffer values whose magnitude is under about 1.0e-6 are replaced with
/// zero. Recirculating buffers otherwise decay into denormal territory, which
/// is very slow on some CPUs.
pub(crate) fn flush_denormal(value: SampleType) -> SampleType {
    if (value.to_bits() & 0x7FFF_FFFF) < 897_988_541 {
        0.0
    } else {
        value
    }
}

#[allow(missing_docs)]
pub(crate) trait Delays {
    /// Pushes one input sample and returns the corresponding output sample.
    fn pop_output(&mut self, input: SampleType) -> SampleType;

    /// Zeroes the delay buffer without changing any settings.
    fn mute(&mut self);
}

/// A recirculating delay line with a one-pole low-pass filter in the feedback
/// path (the Freeverb "lowpass-feedback comb").
#[derive(Clone, Debug, Default)]
pub(crate) struct CombFilter {
    buffer: Vec<SampleType>,
    buffer_pointer: usize,
    filter_store: SampleType,

    feedback: SampleType,
    damp1: SampleType,
    damp2: SampleType,
}
impl CombFilter {
    pub(crate) fn new_with(buffer_size: usize) -> Self {
        Self {
            buffer: vec![0.0; buffer_size.max(1)],
            ..Default::default()
        }
    }

    pub(crate) fn set_feedback(&mut self, feedback: SampleType) {
        self.feedback = feedback;
    }

    pub(crate) fn set_damp(&mut self, damp: SampleType) {
        self.damp1 = damp;
        self.damp2 = 1.0 - damp;
    }
}
impl Delays for CombFilter {
    fn pop_output(&mut self, input: SampleType) -> SampleType {
        let output = flush_denormal(self.buffer[self.buffer_pointer]);
        self.filter_store =
            flush_denormal(output * self.damp2 + self.filter_store * self.damp1);
        self.buffer[self.buffer_pointer] = input + self.filter_store * self.feedback;

        self.buffer_pointer += 1;
        if self.buffer_pointer >= self.buffer.len() {
            self.buffer_pointer = 0;
        }
        output
    }

    fn mute(&mut self) {
        self.buffer.fill(0.0);
        self.filter_store = 0.0;
    }
}

/// Schroeder all-pass section with a fixed feedback coefficient.
#[derive(Clone, Debug, Default)]
pub(crate) struct AllPassFilter {
    buffer: Vec<SampleType>,
    buffer_pointer: usize,
    feedback: SampleType,
}
impl AllPassFilter {
    pub(crate) fn new_with(buffer_size: usize, feedback: SampleType) -> Self {
        Self {
            buffer: vec![0.0; buffer_size.max(1)],
            buffer_pointer: 0,
            feedback,
        }
    }
}
impl Delays for AllPassFilter {
    fn pop_output(&mut self, input: SampleType) -> SampleType {
        let buffer_output = flush_denormal(self.buffer[self.buffer_pointer]);
        self.buffer[self.buffer_pointer] = input + buffer_output * self.feedback;

        self.buffer_pointer += 1;
        if self.buffer_pointer >= self.buffer.len() {
            self.buffer_pointer = 0;
        }
        buffer_output - input
    }

    fn mute(&mut self) {
        self.buffer.fill(0.0);
    }
}

/// A delay line read by a fractional tap. The caller supplies the delay (in
/// frames) on every sample, which is how the chorus sweeps it.
#[derive(Clone, Debug, Default)]
pub(crate) struct ModulatedDelayLine {
    buffer: Vec<SampleType>,
    buffer_pointer: usize,
}
impl ModulatedDelayLine {
    pub(crate) fn new_with(buffer_size: usize) -> Self {
        Self {
            buffer: vec![0.0; buffer_size.max(2)],
            buffer_pointer: 0,
        }
    }

    /// Reads the interpolated sample `delay` frames behind the write head,
    /// then writes `input`.
    pub(crate) fn pop_output_at(&mut self, input: SampleType, delay: f64) -> SampleType {
        let len = self.buffer.len();
        let mut position = self.buffer_pointer as f64 - delay;
        if position < 0.0 {
            position += len as f64;
        }
        if position >= len as f64 {
            position -= len as f64;
        }

        let index1 = (position as usize).min(len - 1);
        let index2 = if index1 + 1 == len { 0 } else { index1 + 1 };
        let x1 = self.buffer[index1] as f64;
        let x2 = self.buffer[index2] as f64;
        let a = position - index1 as f64;
        let output = (x1 + a * (x2 - x1)) as SampleType;

        self.buffer[self.buffer_pointer] = input;
        self.buffer_pointer += 1;
        if self.buffer_pointer == len {
            self.buffer_pointer = 0;
        }
        output
    }

    pub(crate) fn mute(&mut self) {
        self.buffer.fill(0.0);
    }
}

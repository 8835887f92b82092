// Copyright (c) 2024 Mike Tsao

use super::{Chorus, Reverb};
use crate::{
    prelude::*,
    util::math::{multiply_add, write_block},
};
use delegate::delegate;

/// The shared chorus and reverb that every voice sends into. Voices add their
/// sends during a block; [EffectsBus::process] then runs both effects and mixes
/// the results into the main output.
#[derive(Debug)]
pub struct EffectsBus {
    c: Configurables,
    chorus: Chorus,
    reverb: Reverb,

    chorus_input: [Vec<SampleType>; 2],
    chorus_output: [Vec<SampleType>; 2],
    reverb_input: Vec<SampleType>,
    reverb_output: [Vec<SampleType>; 2],
}
impl Configurable for EffectsBus {
    delegate! {
        to self.c {
            fn sample_rate(&self) -> SampleRate;
            fn block_size(&self) -> usize;
        }
    }
}
impl EffectsBus {
    #[allow(missing_docs)]
    pub fn new_with(c: Configurables) -> Self {
        let mut chorus = Chorus::default();
        chorus.update_sample_rate(c.sample_rate());
        let mut reverb = Reverb::default();
        reverb.update_sample_rate(c.sample_rate());

        let block = || vec![0.0; c.block_size()];
        Self {
            c,
            chorus,
            reverb,
            chorus_input: [block(), block()],
            chorus_output: [block(), block()],
            reverb_input: block(),
            reverb_output: [block(), block()],
        }
    }

    /// Zeroes the send buffers. Call once at the start of every block.
    pub fn begin_block(&mut self) {
        self.chorus_input.iter_mut().for_each(|b| b.fill(0.0));
        self.reverb_input.fill(0.0);
    }

    /// Adds a voice's block to the chorus input, ramping from the previous to
    /// the current `[left, right]` gains.
    pub fn send_to_chorus(
        &mut self,
        block: &[SampleType],
        previous_gains: [SampleType; 2],
        current_gains: [SampleType; 2],
    ) {
        for (side, input) in self.chorus_input.iter_mut().enumerate() {
            write_block(previous_gains[side], current_gains[side], block, input);
        }
    }

    /// Adds a voice's block to the mono reverb input. The reverb's fixed input
    /// gain is applied here.
    pub fn send_to_reverb(
        &mut self,
        block: &[SampleType],
        previous_gain: SampleType,
        current_gain: SampleType,
    ) {
        write_block(
            Reverb::INPUT_GAIN * previous_gain,
            Reverb::INPUT_GAIN * current_gain,
            block,
            &mut self.reverb_input,
        );
    }

    /// Runs both effects over this block's sends and adds their output, scaled
    /// by `gain`, into `left` and `right`.
    pub fn process(&mut self, gain: SampleType, left: &mut [SampleType], right: &mut [SampleType]) {
        let [chorus_input_left, chorus_input_right] = &self.chorus_input;
        let [chorus_output_left, chorus_output_right] = &mut self.chorus_output;
        self.chorus.process(
            chorus_input_left,
            chorus_input_right,
            chorus_output_left,
            chorus_output_right,
        );
        multiply_add(gain, chorus_output_left, left);
        multiply_add(gain, chorus_output_right, right);

        let [reverb_output_left, reverb_output_right] = &mut self.reverb_output;
        self.reverb
            .process(&self.reverb_input, reverb_output_left, reverb_output_right);
        self.reverb.mix(reverb_output_left, reverb_output_right);
        multiply_add(gain, reverb_output_left, left);
        multiply_add(gain, reverb_output_right, right);
    }

    /// Silences both effects' tails.
    pub fn mute(&mut self) {
        self.chorus.mute();
        self.reverb.mute();
    }

    #[allow(missing_docs)]
    pub fn chorus(&self) -> &Chorus {
        &self.chorus
    }

    #[allow(missing_docs)]
    pub fn chorus_mut(&mut self) -> &mut Chorus {
        &mut self.chorus
    }

    #[allow(missing_docs)]
    pub fn reverb(&self) -> &Reverb {
        &self.reverb
    }

    #[allow(missing_docs)]
    pub fn reverb_mut(&mut self) -> &mut Reverb {
        &mut self.reverb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_sends_stay_silent() {
        let mut bus = EffectsBus::new_with(Configurables::default());
        let mut left = vec![0.0; 64];
        let mut right = vec![0.0; 64];
        for _ in 0..100 {
            bus.begin_block();
            bus.process(1.0, &mut left, &mut right);
        }
        assert!(left.iter().chain(right.iter()).all(|s| *s == 0.0));
    }

    #[test]
    fn sends_come_back_and_mute_stops_them() {
        let mut bus = EffectsBus::new_with(Configurables::default());
        let block = vec![1.0; 64];
        let mut heard_something = false;

        for i in 0..100 {
            bus.begin_block();
            if i == 0 {
                bus.send_to_chorus(&block, [1.0, 1.0], [1.0, 1.0]);
                bus.send_to_reverb(&block, 1.0, 1.0);
            }
            let mut left = vec![0.0; 64];
            let mut right = vec![0.0; 64];
            bus.process(0.5, &mut left, &mut right);
            heard_something |= left.iter().chain(right.iter()).any(|s| *s != 0.0);
        }
        assert!(heard_something);

        bus.mute();
        let mut left = vec![0.0; 64];
        let mut right = vec![0.0; 64];
        bus.begin_block();
        bus.process(0.5, &mut left, &mut right);
        assert!(left.iter().chain(right.iter()).all(|s| *s == 0.0));
    }
}

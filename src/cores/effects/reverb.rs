// Copyright (c) 2024 Mike Tsao

use super::delay::{AllPassFilter, CombFilter, Delays};
use crate::prelude::*;
use delegate::delegate;
use derivative::Derivative;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Freeverb-style Schroeder reverb. Each side runs eight parallel damped comb
/// filters into four series all-pass filters. Input is mono; the two sides
/// differ only in their delay lengths.
#[derive(Debug, Derivative, Builder, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(rename_all = "kebab-case")]
#[builder(default, build_fn(private, name = "build_from_builder"))]
pub struct Reverb {
    /// Larger rooms ring longer.
    #[derivative(Default(value = "0.5.into()"))]
    room_size: Normal,

    /// How quickly high frequencies die away.
    #[derivative(Default(value = "0.5.into()"))]
    damp: Normal,

    /// Output level.
    #[derivative(Default(value = "(1.0 / 3.0).into()"))]
    wet: Normal,

    /// Stereo spread. 0.0 is mono.
    #[derivative(Default(value = "1.0.into()"))]
    width: Normal,

    #[serde(skip)]
    #[builder(setter(skip))]
    e: ReverbEphemerals,
}
#[derive(Clone, Debug, Default)]
struct ReverbEphemerals {
    c: Configurables,
    combs: [Vec<CombFilter>; 2],
    all_passes: [Vec<AllPassFilter>; 2],
    wet1: SampleType,
    wet2: SampleType,
}
impl ReverbBuilder {
    /// The overridden Builder build() method.
    pub fn build(&self) -> Result<Reverb, ReverbBuilderError> {
        match self.build_from_builder() {
            Ok(mut s) => {
                s.after_deser();
                Ok(s)
            }
            Err(e) => Err(e),
        }
    }
}
impl Serializable for Reverb {
    fn after_deser(&mut self) {
        self.allocate();
    }
}
impl Configurable for Reverb {
    delegate! {
        to self.e.c {
            fn sample_rate(&self) -> SampleRate;
            fn block_size(&self) -> usize;
        }
    }

    fn update_sample_rate(&mut self, sample_rate: SampleRate) {
        self.e.c.update_sample_rate(sample_rate);
        self.allocate();
    }
}
impl Reverb {
    /// Every voice's reverb send is scaled by this before it reaches the
    /// input.
    pub const INPUT_GAIN: SampleType = 0.015;

    const SCALE_WET: f64 = 3.0;
    const SCALE_DAMP: f64 = 0.4;
    const SCALE_ROOM: f64 = 0.28;
    const OFFSET_ROOM: f64 = 0.7;
    const STEREO_SPREAD: usize = 23;
    const ALL_PASS_FEEDBACK: SampleType = 0.5;

    // Delay lengths in frames at 44.1 kHz, for the left side.
    const COMB_TUNINGS: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
    const ALL_PASS_TUNINGS: [usize; 4] = [556, 441, 341, 225];

    fn scale_tuning(&self, tuning: usize) -> usize {
        (f64::from(self.e.c.sample_rate()) / 44100.0 * tuning as f64).round() as usize
    }

    fn allocate(&mut self) {
        for (side, spread) in [0, Self::STEREO_SPREAD].into_iter().enumerate() {
            self.e.combs[side] = Self::COMB_TUNINGS
                .iter()
                .map(|t| CombFilter::new_with(self.scale_tuning(t + spread)))
                .collect();
            self.e.all_passes[side] = Self::ALL_PASS_TUNINGS
                .iter()
                .map(|t| {
                    AllPassFilter::new_with(self.scale_tuning(t + spread), Self::ALL_PASS_FEEDBACK)
                })
                .collect();
        }
        self.update();
    }

    // The four user parameters feed every filter, so all of them are
    // recomputed whenever any one changes.
    fn update(&mut self) {
        let wet = self.wet.0 * Self::SCALE_WET;
        let width = self.width.0;
        self.e.wet1 = (wet * (width / 2.0 + 0.5)) as SampleType;
        self.e.wet2 = (wet * ((1.0 - width) / 2.0)) as SampleType;

        let feedback = (self.room_size.0 * Self::SCALE_ROOM + Self::OFFSET_ROOM) as SampleType;
        let damp = (self.damp.0 * Self::SCALE_DAMP) as SampleType;
        self.e.combs.iter_mut().flatten().for_each(|comb| {
            comb.set_feedback(feedback);
            comb.set_damp(damp);
        });
    }

    /// Reverberates a mono block into two output blocks, overwriting them.
    pub fn process(
        &mut self,
        input: &[SampleType],
        output_left: &mut [SampleType],
        output_right: &mut [SampleType],
    ) {
        if self.e.combs[0].is_empty() {
            self.allocate();
        }
        for (side, output) in [output_left, output_right].into_iter().enumerate() {
            for (input, output) in input.iter().zip(output.iter_mut()) {
                let mut sum = 0.0;
                for comb in self.e.combs[side].iter_mut() {
                    sum += comb.pop_output(*input);
                }
                for all_pass in self.e.all_passes[side].iter_mut() {
                    sum = all_pass.pop_output(sum);
                }
                *output = sum;
            }
        }
    }

    /// Applies the wet level and stereo width to blocks that [Reverb::process]
    /// produced.
    pub fn mix(&self, left: &mut [SampleType], right: &mut [SampleType]) {
        // With the default settings this is the identity.
        if 1.0 - self.e.wet1 > 1.0e-3 || self.e.wet2 > 1.0e-3 {
            for (l, r) in left.iter_mut().zip(right.iter_mut()) {
                let (dry_l, dry_r) = (*l, *r);
                *l = dry_l * self.e.wet1 + dry_r * self.e.wet2;
                *r = dry_r * self.e.wet1 + dry_l * self.e.wet2;
            }
        }
    }

    /// Silences everything still ringing.
    pub fn mute(&mut self) {
        self.e
            .combs
            .iter_mut()
            .flatten()
            .for_each(|comb| comb.mute());
        self.e
            .all_passes
            .iter_mut()
            .flatten()
            .for_each(|all_pass| all_pass.mute());
    }
}
#[allow(missing_docs)]
impl Reverb {
    pub fn room_size(&self) -> Normal {
        self.room_size
    }

    pub fn set_room_size(&mut self, room_size: Normal) {
        self.room_size = room_size;
        self.update();
    }

    pub fn damp(&self) -> Normal {
        self.damp
    }

    pub fn set_damp(&mut self, damp: Normal) {
        self.damp = damp;
        self.update();
    }

    pub fn wet(&self) -> Normal {
        self.wet
    }

    pub fn set_wet(&mut self, wet: Normal) {
        self.wet = wet;
        self.update();
    }

    pub fn width(&self) -> Normal {
        self.width
    }

    pub fn set_width(&mut self, width: Normal) {
        self.width = width;
        self.update();
    }
}

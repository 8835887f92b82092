// Copyright (c) 2024 Mike Tsao

use super::delay::ModulatedDelayLine;
use crate::prelude::*;
use delegate::delegate;
use derivative::Derivative;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Stereo chorus. Each side is a delay line whose tap sweeps around a base
/// delay along a sine wave; the right side runs a quarter period ahead of the
/// left.
#[derive(Debug, Builder, Derivative, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(rename_all = "kebab-case")]
#[builder(default, build_fn(private, name = "build_from_builder"))]
pub struct Chorus {
    /// The center of the swept delay.
    #[derivative(Default(value = "Seconds(0.002)"))]
    delay: Seconds,

    /// How far the delay swings either side of the center.
    #[derivative(Default(value = "Seconds(0.0019)"))]
    depth: Seconds,

    /// Sweep rate, in Hertz.
    #[derivative(Default(value = "0.4"))]
    frequency: ParameterType,

    #[serde(skip)]
    #[builder(setter(skip))]
    e: ChorusEphemerals,
}
#[derive(Clone, Debug, Default)]
struct ChorusEphemerals {
    c: Configurables,
    left: ModulatedDelayLine,
    right: ModulatedDelayLine,
    delay_table: Vec<f32>,
    delay_table_index_left: usize,
    delay_table_index_right: usize,
}
impl ChorusBuilder {
    /// The overridden Builder build() method.
    pub fn build(&self) -> Result<Chorus, ChorusBuilderError> {
        match self.build_from_builder() {
            Ok(mut s) => {
                s.after_deser();
                Ok(s)
            }
            Err(e) => Err(e),
        }
    }
}
impl Serializable for Chorus {
    fn after_deser(&mut self) {
        self.allocate();
    }
}
impl Configurable for Chorus {
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
impl Chorus {
    fn allocate(&mut self) {
        let sample_rate = f64::from(self.e.c.sample_rate());
        let buffer_size = (sample_rate * (self.delay.0 + self.depth.0)) as usize + 2;
        self.e.left = ModulatedDelayLine::new_with(buffer_size);
        self.e.right = ModulatedDelayLine::new_with(buffer_size);

        let table_len = if self.frequency > 0.0 {
            ((sample_rate / self.frequency).round() as usize).max(1)
        } else {
            1
        };
        self.e.delay_table = (0..table_len)
            .map(|t| {
                let phase = 2.0 * core::f64::consts::PI * t as f64 / table_len as f64;
                (sample_rate * (self.delay.0 + self.depth.0 * phase.sin())) as f32
            })
            .collect();
        self.e.delay_table_index_left = 0;
        self.e.delay_table_index_right = table_len / 4;
    }

    /// Runs a block through both sides. All four slices should be the same
    /// length; extra frames in the longer ones are left alone.
    pub fn process(
        &mut self,
        input_left: &[SampleType],
        input_right: &[SampleType],
        output_left: &mut [SampleType],
        output_right: &mut [SampleType],
    ) {
        if self.e.delay_table.is_empty() {
            self.allocate();
        }
        let table_len = self.e.delay_table.len();
        for (input, output) in input_left.iter().zip(output_left.iter_mut()) {
            let delay = self.e.delay_table[self.e.delay_table_index_left] as f64;
            *output = self.e.left.pop_output_at(*input, delay);
            self.e.delay_table_index_left = (self.e.delay_table_index_left + 1) % table_len;
        }
        for (input, output) in input_right.iter().zip(output_right.iter_mut()) {
            let delay = self.e.delay_table[self.e.delay_table_index_right] as f64;
            *output = self.e.right.pop_output_at(*input, delay);
            self.e.delay_table_index_right = (self.e.delay_table_index_right + 1) % table_len;
        }
    }

    /// Silences anything still in the delay lines.
    pub fn mute(&mut self) {
        self.e.left.mute();
        self.e.right.mute();
    }
}
#[allow(missing_docs)]
impl Chorus {
    pub fn delay(&self) -> Seconds {
        self.delay
    }

    pub fn set_delay(&mut self, delay: Seconds) {
        self.delay = delay;
        self.allocate();
    }

    pub fn depth(&self) -> Seconds {
        self.depth
    }

    pub fn set_depth(&mut self, depth: Seconds) {
        self.depth = depth;
        self.allocate();
    }

    pub fn frequency(&self) -> ParameterType {
        self.frequency
    }

    pub fn set_frequency(&mut self, frequency: ParameterType) {
        self.frequency = frequency;
        self.allocate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use more_asserts::{assert_gt, assert_lt};

    #[test]
    fn defaults() {
        let chorus = ChorusBuilder::default().build().unwrap();
        assert_eq!(chorus.delay().0, 0.002);
        assert_eq!(chorus.depth().0, 0.0019);
        assert_eq!(chorus.frequency(), 0.4);
        assert_eq!(
            chorus.e.delay_table.len(),
            110250,
            "one sweep period at 44.1 kHz"
        );
        assert_eq!(chorus.e.delay_table_index_right, 110250 / 4);
    }

    #[test]
    fn impulse_comes_back_delayed() {
        let mut chorus = ChorusBuilder::default().build().unwrap();
        let block_size = 512;
        let mut input = vec![0.0; block_size];
        input[0] = 1.0;
        let mut left = vec![0.0; block_size];
        let mut right = vec![0.0; block_size];
        chorus.process(&input, &input, &mut left, &mut right);

        // At the start of the sweep the left tap sits at the center delay
        // (about 88 frames); the right tap is at its longest (about 172).
        assert_eq!(left[0], 0.0, "nothing comes out instantly");
        let left_peak = left
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        let right_peak = right
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_gt!(left_peak, 80);
        assert_lt!(left_peak, 96);
        assert_gt!(right_peak, 160);
        assert_lt!(right_peak, 180);

        chorus.mute();
        let silence = vec![0.0; block_size];
        chorus.process(&silence, &silence, &mut left, &mut right);
        assert!(left.iter().chain(right.iter()).all(|s| *s == 0.0));
    }

    #[test]
    fn default_chorus_allocates_on_first_use() {
        let mut chorus = Chorus::default();
        assert!(chorus.e.delay_table.is_empty());

        let input = vec![0.5; 64];
        let mut left = vec![1.0; 64];
        let mut right = vec![1.0; 64];
        chorus.process(&input, &input, &mut left, &mut right);
        assert_eq!(chorus.e.delay_table.len(), 110250);
        assert!(
            left.iter().chain(right.iter()).all(|s| *s == 0.0),
            "the input hasn't come out of the delay lines yet"
        );
    }

    #[test]
    fn sample_rate_change_reallocates() {
        let mut chorus = ChorusBuilder::default().frequency(1.0).build().unwrap();
        chorus.update_sample_rate(SampleRate(22050));
        assert_eq!(chorus.sample_rate(), SampleRate(22050));
        assert_eq!(chorus.e.delay_table.len(), 22050);
    }
}

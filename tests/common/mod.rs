// Copyright (c) 2024 Mike Tsao

use ensnare_soundfont::prelude::*;
use std::sync::Arc;

/// A small bank built in memory: one looping sine-like sample, a melodic
/// preset at 0:0, and a drum kit at 128:0.
pub fn test_bank() -> Arc<PatchBank> {
    let wave_data: Vec<i16> = (0..4410)
        .map(|i| ((i as f32 * 2.0 * core::f32::consts::PI / 50.0).sin() * 12000.0) as i16)
        .collect();
    let sample_headers =
        vec![SampleHeader::new_with("sine", 0, 4400, 44100, 81).with_loop(50, 4350)];

    let zone = vec![
        Generator::new(GeneratorType::SampleModes, 1),
        Generator::new(GeneratorType::SampleId, 0),
    ];
    let instruments = vec![Instrument::new_with("sine", &[zone], 1).unwrap()];
    let presets = vec![
        Preset::new_with(
            "lead",
            0,
            0,
            &[vec![Generator::new(GeneratorType::Instrument, 0)]],
            1,
        )
        .unwrap(),
        Preset::new_with(
            "kit",
            0,
            128,
            &[vec![Generator::new(GeneratorType::Instrument, 0)]],
            1,
        )
        .unwrap(),
    ];
    Arc::new(PatchBank::new_with(wave_data, sample_headers, instruments, presets).unwrap())
}

#[allow(dead_code)]
pub fn synthesizer(settings: &SynthesizerSettings) -> Synthesizer {
    Synthesizer::new_with(test_bank(), settings).unwrap()
}

#[allow(dead_code)]
pub fn render(source: &mut impl GeneratesStereo, frames: usize) -> (Vec<f32>, Vec<f32>) {
    let mut left = vec![0.0; frames];
    let mut right = vec![0.0; frames];
    source.render(&mut left, &mut right);
    (left, right)
}

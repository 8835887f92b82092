// Copyright (c) 2024 Mike Tsao

use ensnare_soundfont::prelude::*;
use float_cmp::approx_eq;
use more_asserts::{assert_gt, assert_lt};
use std::sync::Arc;

mod common;

/// Builds a format 1 Standard MIDI File from raw track chunks.
fn smf(resolution: u16, tracks: &[&[u8]]) -> Vec<u8> {
    let mut bytes = b"MThd".to_vec();
    bytes.extend_from_slice(&6u32.to_be_bytes());
    bytes.extend_from_slice(&1u16.to_be_bytes());
    bytes.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    bytes.extend_from_slice(&resolution.to_be_bytes());
    for track in tracks {
        bytes.extend_from_slice(b"MTrk");
        bytes.extend_from_slice(&(track.len() as u32).to_be_bytes());
        bytes.extend_from_slice(track);
    }
    bytes
}

#[rustfmt::skip]
const CONDUCTOR: &[u8] = &[
    0x00, 0xFF, 0x51, 0x03, 0x0F, 0x42, 0x40, // 60 BPM
    0x00, 0xFF, 0x2F, 0x00,
];

#[rustfmt::skip]
const MELODY: &[u8] = &[
    0x00, 0x90, 0x45, 0x64,       // A4 on
    0x83, 0x60, 0x80, 0x45, 0x00, // one beat later, off
    0x00, 0x99, 0x24, 0x64,       // kick on the drum channel
    0x83, 0x60, 0x89, 0x24, 0x00,
    0x00, 0xFF, 0x2F, 0x00,
];

#[test]
fn tempo_track_slows_the_other_tracks() {
    let _ = env_logger::builder().is_test(true).try_init();
    let fast = MidiFile::new_with_smf(&smf(480, &[MELODY])).unwrap();
    let slow = MidiFile::new_with_smf(&smf(480, &[CONDUCTOR, MELODY])).unwrap();

    assert!(approx_eq!(f64, fast.length().0, 1.0, epsilon = 1e-9));
    assert!(approx_eq!(
        f64,
        slow.length().0,
        2.0 * fast.length().0,
        epsilon = 1e-9
    ));

    // The conductor's end-of-track is the only extra event.
    assert_eq!(slow.events().len(), fast.events().len() + 1);
}

#[test]
fn sequencer_plays_a_file_to_the_end() {
    let midi_file = Arc::new(MidiFile::new_with_smf(&smf(480, &[CONDUCTOR, MELODY])).unwrap());
    let mut sequencer =
        MidiFileSequencer::new_with(common::synthesizer(&SynthesizerSettings::default()));
    sequencer.play(Arc::clone(&midi_file), false);

    let mut rendered = 0;
    let mut loudest = 0.0f32;
    while !sequencer.is_end_of_sequence() {
        let (left, _) = common::render(&mut sequencer, 4410);
        loudest = left.iter().fold(loudest, |max, s| max.max(s.abs()));
        rendered += 4410;
        assert_lt!(rendered, 44100 * 10, "the sequence should end");
    }
    assert_gt!(loudest, 0.01);
    assert_gt!(sequencer.position().0, midi_file.length().0);
    assert_eq!(
        sequencer.synthesizer().channel(9).map(|c| c.bank_number()),
        Some(128)
    );
}

#[test]
fn looping_sequence_never_ends() {
    let midi_file = Arc::new(MidiFile::new_with_smf(&smf(480, &[MELODY])).unwrap());
    let mut sequencer =
        MidiFileSequencer::new_with(common::synthesizer(&SynthesizerSettings::default()));
    sequencer.play(midi_file, true);

    for _ in 0..30 {
        let _ = common::render(&mut sequencer, 4410);
        assert!(!sequencer.is_end_of_sequence());
        assert_lt!(sequencer.position().0, 1.2);
    }
}

#[test]
fn synthesizer_is_reachable_through_the_sequencer() {
    let mut sequencer =
        MidiFileSequencer::new_with(common::synthesizer(&SynthesizerSettings::default()));
    sequencer.synthesizer_mut().note_on(0, 69, 100);
    let (left, _) = common::render(&mut sequencer, 512);
    assert!(left.iter().any(|s| *s != 0.0));

    sequencer.stop();
    assert_eq!(sequencer.synthesizer().active_voice_count(), 0);
}

#[test]
fn absolute_tick_overflow_is_an_error() {
    // Seventeen maximal deltas put the last note past u32::MAX ticks.
    let mut track = Vec::new();
    for _ in 0..17 {
        track.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0x7F, 0x90, 0x3C, 0x64]);
    }
    track.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

    let err = MidiFile::new_with_smf(&smf(480, &[CONDUCTOR, &track])).unwrap_err();
    assert_eq!(
        err.downcast_ref::<SequenceError>(),
        Some(&SequenceError::TickOverflow { track: 1 })
    );
}

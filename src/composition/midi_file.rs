// Copyright (c) 2024 Mike Tsao

use crate::prelude::*;
use anyhow::Context;
use log::{info, trace};
use midly::{Format, MetaMessage, Smf, Timing, TrackEventKind};
use thiserror::Error;

/// Reasons a set of tracks can't be turned into a [MidiFile].
#[derive(Debug, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum SequenceError {
    #[error("the resolution (ticks per quarter note) must be nonzero")]
    ZeroResolution,
    #[error("event {index} of track {track} is earlier than the event before it")]
    DecreasingTicks { track: usize, index: usize },
    #[error("only metrical (ticks per quarter note) timing is supported")]
    UnsupportedTiming,
    #[error("only format 0 and format 1 files are supported")]
    UnsupportedFormat,
    #[error("the absolute tick of an event in track {track} doesn't fit in 32 bits")]
    TickOverflow { track: usize },
}

/// One event in a track, before the tracks are merged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackEvent {
    /// Goes to the synthesizer as-is.
    Channel(ChannelMessage),
    /// A new tempo, in microseconds per quarter note. Changes how later ticks
    /// convert to time but is not itself played.
    TempoChange(u32),
    #[allow(missing_docs)]
    EndOfTrack,
}

/// A performance: every track's events merged into a single list, each
/// stamped with the time it should happen.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MidiFile {
    events: Vec<(Seconds, TrackEvent)>,
}
impl MidiFile {
    /// Merges tracks of `(absolute tick, event)` pairs. `resolution` is the
    /// number of ticks in a quarter note. The tempo starts at 120 BPM.
    ///
    /// The earliest remaining event across all tracks is taken next; when two
    /// tracks have an event on the same tick, the lower-numbered track goes
    /// first. Tempo changes are applied but left out of the result.
    pub fn new_with(
        resolution: u16,
        tracks: &[Vec<(u32, TrackEvent)>],
    ) -> Result<Self, SequenceError> {
        if resolution == 0 {
            return Err(SequenceError::ZeroResolution);
        }
        for (track_index, track) in tracks.iter().enumerate() {
            if let Some(index) = track
                .windows(2)
                .position(|pair| pair[1].0 < pair[0].0)
            {
                return Err(SequenceError::DecreasingTicks {
                    track: track_index,
                    index: index + 1,
                });
            }
        }

        let mut events = Vec::with_capacity(tracks.iter().map(Vec::len).sum());
        let mut cursors = vec![0; tracks.len()];
        let mut current_tick = 0;
        let mut current_time = 0.0;
        let mut tempo = Tempo::default();

        loop {
            let mut next: Option<(usize, u32)> = None;
            for (track_index, track) in tracks.iter().enumerate() {
                if let Some((tick, _)) = track.get(cursors[track_index]) {
                    if next.map_or(true, |(_, lowest)| *tick < lowest) {
                        next = Some((track_index, *tick));
                    }
                }
            }
            let Some((track_index, tick)) = next else {
                break;
            };
            let event = tracks[track_index][cursors[track_index]].1;
            cursors[track_index] += 1;

            current_time += tempo.seconds_per_tick(resolution).0 * (tick - current_tick) as f64;
            current_tick = tick;

            if let TrackEvent::TempoChange(microseconds) = event {
                tempo = Tempo::from_microseconds_per_quarter(microseconds);
            } else {
                events.push((Seconds(current_time), event));
            }
        }

        let r = Self { events };
        info!(
            "merged {} tracks into {} events lasting {:.3}s",
            tracks.len(),
            r.events.len(),
            r.length().0
        );
        Ok(r)
    }

    /// Parses a Standard MIDI File. Only formats 0 and 1 with metrical timing
    /// are accepted. System-exclusive and meta events other than tempo and
    /// end-of-track are skipped.
    pub fn new_with_smf(bytes: &[u8]) -> anyhow::Result<Self> {
        let smf = Smf::parse(bytes).context("parsing Standard MIDI File")?;
        if !matches!(smf.header.format, Format::SingleTrack | Format::Parallel) {
            return Err(SequenceError::UnsupportedFormat.into());
        }
        let Timing::Metrical(resolution) = smf.header.timing else {
            return Err(SequenceError::UnsupportedTiming.into());
        };

        let mut tracks: Vec<Vec<(u32, TrackEvent)>> = Vec::with_capacity(smf.tracks.len());
        for (track_index, track) in smf.tracks.iter().enumerate() {
            let mut tick: u32 = 0;
            let mut events = Vec::with_capacity(track.len());
            for event in track {
                tick = tick
                    .checked_add(event.delta.as_int())
                    .ok_or(SequenceError::TickOverflow { track: track_index })?;
                let track_event = match event.kind {
                    TrackEventKind::Midi { channel, message } => Some(TrackEvent::Channel(
                        MidiUtils::to_channel_message(channel.into(), &message),
                    )),
                    TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => {
                        Some(TrackEvent::TempoChange(tempo.as_int()))
                    }
                    TrackEventKind::Meta(MetaMessage::EndOfTrack) => Some(TrackEvent::EndOfTrack),
                    other => {
                        trace!("skipping {other:?} at tick {tick}");
                        None
                    }
                };
                if let Some(track_event) = track_event {
                    events.push((tick, track_event));
                }
            }
            tracks.push(events);
        }

        Ok(Self::new_with(resolution.as_int(), &tracks)?)
    }

    /// The time of the last event, which is normally the latest end-of-track.
    pub fn length(&self) -> Seconds {
        self.events
            .last()
            .map_or(Seconds::zero(), |(time, _)| *time)
    }

    /// The merged events in time order.
    pub fn events(&self) -> &[(Seconds, TrackEvent)] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    fn note_on(channel: u8, key: u8) -> TrackEvent {
        TrackEvent::Channel(ChannelMessage {
            channel,
            command: 0x90,
            data1: key,
            data2: 100,
        })
    }

    #[test]
    fn tempo_change_stretches_later_events() {
        let at_default_tempo =
            MidiFile::new_with(480, &[vec![(480, note_on(0, 60))]]).unwrap();
        assert!(approx_eq!(f64, at_default_tempo.length().0, 0.5, epsilon = 1e-9));

        // 120 BPM -> 60 BPM on the first track, at tick 0.
        let slowed = MidiFile::new_with(
            480,
            &[
                vec![(0, TrackEvent::TempoChange(1_000_000))],
                vec![(480, note_on(0, 60))],
            ],
        )
        .unwrap();
        assert_eq!(slowed.events().len(), 1, "tempo changes aren't emitted");
        assert!(approx_eq!(
            f64,
            slowed.length().0,
            2.0 * at_default_tempo.length().0,
            epsilon = 1e-9
        ));
    }

    #[test]
    fn tempo_applies_only_after_it_happens() {
        let file = MidiFile::new_with(
            100,
            &[vec![
                (100, note_on(0, 60)),
                (100, TrackEvent::TempoChange(250_000)),
                (200, note_on(0, 62)),
                (200, TrackEvent::EndOfTrack),
            ]],
        )
        .unwrap();
        let times: Vec<f64> = file.events().iter().map(|(t, _)| t.0).collect();
        assert_eq!(times.len(), 3);
        assert!(approx_eq!(f64, times[0], 0.5, epsilon = 1e-9));
        assert!(approx_eq!(f64, times[1], 0.75, epsilon = 1e-9));
        assert!(approx_eq!(f64, times[2], 0.75, epsilon = 1e-9));
        assert_eq!(file.events()[2].1, TrackEvent::EndOfTrack);
    }

    #[test]
    fn ties_go_to_the_lower_track() {
        let file = MidiFile::new_with(
            96,
            &[
                vec![(0, note_on(0, 1)), (10, note_on(0, 3))],
                vec![(0, note_on(1, 2)), (10, note_on(1, 4))],
            ],
        )
        .unwrap();
        let keys: Vec<u8> = file
            .events()
            .iter()
            .filter_map(|(_, e)| match e {
                TrackEvent::Channel(m) => Some(m.data1),
                _ => None,
            })
            .collect();
        assert_eq!(keys, vec![1, 2, 3, 4]);
    }

    #[test]
    fn bad_input_is_rejected() {
        assert_eq!(
            MidiFile::new_with(0, &[]).unwrap_err(),
            SequenceError::ZeroResolution
        );
        assert_eq!(
            MidiFile::new_with(
                96,
                &[
                    vec![(0, note_on(0, 60))],
                    vec![(5, note_on(0, 60)), (4, note_on(0, 61))]
                ]
            )
            .unwrap_err(),
            SequenceError::DecreasingTicks { track: 1, index: 1 }
        );

        let empty = MidiFile::new_with(96, &[]).unwrap();
        assert_eq!(empty.length().0, 0.0);
        assert!(empty.events().is_empty());
    }

    fn smf_bytes(format: u16, division: u16, track: &[u8]) -> Vec<u8> {
        let mut bytes = b"MThd".to_vec();
        bytes.extend_from_slice(&6u32.to_be_bytes());
        bytes.extend_from_slice(&format.to_be_bytes());
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&division.to_be_bytes());
        bytes.extend_from_slice(b"MTrk");
        bytes.extend_from_slice(&(track.len() as u32).to_be_bytes());
        bytes.extend_from_slice(track);
        bytes
    }

    #[test]
    fn reads_standard_midi_files() {
        #[rustfmt::skip]
        let track = [
            0x00, 0xFF, 0x51, 0x03, 0x0F, 0x42, 0x40, // tempo 1,000,000 us
            0x00, 0xC0, 0x05,                         // program change
            0x00, 0x90, 0x3C, 0x64,                   // note on
            0x83, 0x60, 0x80, 0x3C, 0x00,             // 480 ticks later, note off
            0x00, 0xFF, 0x01, 0x02, 0x68, 0x69,       // text, skipped
            0x00, 0xFF, 0x2F, 0x00,                   // end of track
        ];
        let file = MidiFile::new_with_smf(&smf_bytes(0, 480, &track)).unwrap();
        let events = file.events();
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[0].1,
            TrackEvent::Channel(ChannelMessage {
                channel: 0,
                command: 0xC0,
                data1: 5,
                data2: 0
            })
        );
        assert!(approx_eq!(f64, events[2].0 .0, 1.0, epsilon = 1e-9));
        assert_eq!(events[3].1, TrackEvent::EndOfTrack);
        assert!(approx_eq!(f64, file.length().0, 1.0, epsilon = 1e-9));
    }

    #[test]
    fn rejects_unsupported_smf() {
        let track = [0x00, 0xFF, 0x2F, 0x00];

        let err = MidiFile::new_with_smf(&smf_bytes(0, 0xE728, &track)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SequenceError>(),
            Some(&SequenceError::UnsupportedTiming)
        );

        let err = MidiFile::new_with_smf(&smf_bytes(2, 480, &track)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SequenceError>(),
            Some(&SequenceError::UnsupportedFormat)
        );

        assert!(MidiFile::new_with_smf(b"not a midi file").is_err());
    }

    #[test]
    fn absolute_ticks_past_u32_are_rejected() {
        // Each delta is the largest a variable-length quantity can hold, so
        // seventeen of them add up to more than u32::MAX.
        let mut track = Vec::new();
        for _ in 0..17 {
            track.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0x7F, 0x90, 0x3C, 0x64]);
        }
        track.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

        let err = MidiFile::new_with_smf(&smf_bytes(0, 480, &track)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SequenceError>(),
            Some(&SequenceError::TickOverflow { track: 0 })
        );

        // Sixteen still fit.
        let mut track = Vec::new();
        for _ in 0..16 {
            track.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0x7F, 0x90, 0x3C, 0x64]);
        }
        track.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        let file = MidiFile::new_with_smf(&smf_bytes(0, 480, &track)).unwrap();
        assert_eq!(file.events().len(), 17);
    }
}

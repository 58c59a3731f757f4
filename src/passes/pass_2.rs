//! Pass 2: Note Segmentation
//!
//! Tracks pitch continuity frame by frame with a two-state machine, then
//! merges same-pitch notes separated by short gaps.

use crate::analysis::{hz_to_midi, NoteEvent, PitchFrame};
use crate::audio::TranscriptionState;
use crate::config::{Config, SegmentConfig};
use crate::error::Result;

/// Energy span above `min_rms` that maps onto the full velocity range
const VELOCITY_ENERGY_SPAN: f32 = 0.2;

/// Segmenter state between frames
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentState {
    Idle,
    InNote { pitch: u8, start_sec: f32, velocity: u8 },
}

/// Pitch and velocity read from a usable frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReading {
    pub pitch: u8,
    pub velocity: u8,
}

/// Rounded MIDI pitch and instantaneous velocity, or `None` if the frame is
/// unvoiced, too quiet or not confident enough
pub fn read_frame(frame: &PitchFrame, options: &SegmentConfig) -> Option<FrameReading> {
    let f0 = frame.f0_hz?;
    if frame.energy < options.min_rms || frame.confidence < options.min_conf || f0 <= 0.0 {
        return None;
    }

    let pitch = hz_to_midi(f0).round().clamp(0.0, 127.0) as u8;
    let level = ((frame.energy - options.min_rms) / VELOCITY_ENERGY_SPAN).clamp(0.0, 1.0);
    let velocity = (20.0 + 107.0 * level).round().clamp(1.0, 127.0) as u8;
    Some(FrameReading { pitch, velocity })
}

fn close_note(
    pitch: u8,
    start_sec: f32,
    velocity: u8,
    end_sec: f32,
    options: &SegmentConfig,
) -> Option<NoteEvent> {
    let duration = end_sec - start_sec;
    (duration > 0.0 && duration >= options.min_note_dur).then_some(NoteEvent {
        start_sec,
        end_sec,
        pitch,
        velocity,
    })
}

/// Apply one frame to the state machine.
///
/// Returns the next state and the note closed by this frame, if any.
pub fn transition(
    state: SegmentState,
    time_sec: f32,
    reading: Option<FrameReading>,
    options: &SegmentConfig,
) -> (SegmentState, Option<NoteEvent>) {
    match (state, reading) {
        (SegmentState::Idle, None) => (SegmentState::Idle, None),
        (SegmentState::Idle, Some(r)) => (
            SegmentState::InNote {
                pitch: r.pitch,
                start_sec: time_sec,
                velocity: r.velocity,
            },
            None,
        ),
        (
            SegmentState::InNote {
                pitch,
                start_sec,
                velocity,
            },
            None,
        ) => (
            SegmentState::Idle,
            close_note(pitch, start_sec, velocity, time_sec, options),
        ),
        (
            SegmentState::InNote {
                pitch,
                start_sec,
                velocity,
            },
            Some(r),
        ) => {
            let deviation = (r.pitch as f32 - pitch as f32).abs();
            if deviation <= options.pitch_tolerance {
                let smoothed = (0.8 * velocity as f32 + 0.2 * r.velocity as f32)
                    .round()
                    .clamp(1.0, 127.0) as u8;
                (
                    SegmentState::InNote {
                        pitch,
                        start_sec,
                        velocity: smoothed,
                    },
                    None,
                )
            } else {
                (
                    SegmentState::InNote {
                        pitch: r.pitch,
                        start_sec: time_sec,
                        velocity: r.velocity,
                    },
                    close_note(pitch, start_sec, velocity, time_sec, options),
                )
            }
        }
    }
}

/// Merge same-pitch neighbours separated by at most `merge_gap` seconds
pub fn merge_notes(mut notes: Vec<NoteEvent>, merge_gap: f32) -> Vec<NoteEvent> {
    notes.sort_by(|a, b| a.start_sec.total_cmp(&b.start_sec));

    let mut merged: Vec<NoteEvent> = Vec::with_capacity(notes.len());
    for note in notes {
        match merged.last_mut() {
            Some(prev) if prev.pitch == note.pitch && note.start_sec - prev.end_sec <= merge_gap => {
                prev.end_sec = prev.end_sec.max(note.end_sec);
                prev.velocity =
                    ((prev.velocity as f32 + note.velocity as f32) / 2.0).round() as u8;
            }
            _ => merged.push(note),
        }
    }
    merged
}

/// Turn an ordered frame sequence into note events
pub fn segment(frames: &[PitchFrame], options: &SegmentConfig) -> Vec<NoteEvent> {
    let mut state = SegmentState::Idle;
    let mut notes = Vec::new();

    for frame in frames {
        let (next, closed) = transition(state, frame.time_sec, read_frame(frame, options), options);
        notes.extend(closed);
        state = next;
    }

    if let (
        SegmentState::InNote {
            pitch,
            start_sec,
            velocity,
        },
        Some(last),
    ) = (state, frames.last())
    {
        notes.extend(close_note(pitch, start_sec, velocity, last.time_sec, options));
    }

    merge_notes(notes, options.merge_gap)
}

pub fn run(state: &mut TranscriptionState, config: &Config) -> Result<()> {
    log::info!("Pass 2: Note Segmentation");

    state.notes = segment(&state.frames, &config.segment);

    log::info!("  {} notes segmented", state.notes.len());
    for note in &state.notes {
        log::debug!(
            "  {:>7.3}s - {:>7.3}s  {:<4} vel {}",
            note.start_sec,
            note.end_sec,
            crate::analysis::note_name(note.pitch),
            note.velocity
        );
    }
    Ok(())
}

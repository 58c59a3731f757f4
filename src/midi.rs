//! Standard MIDI File (format 0) export

use crate::analysis::NoteEvent;
use crate::config::Config;
use crate::error::{Result, TranscribeError};
use crate::timeline::Timeline;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Pulses per quarter note
pub const TICKS_PER_QUARTER: u16 = 480;

const NOTE_ON: u8 = 0x90;
const NOTE_OFF: u8 = 0x80;
const PROGRAM_CHANGE: u8 = 0xC0;
const META: u8 = 0xFF;
const META_TEMPO: u8 = 0x51;
const META_END_OF_TRACK: u8 = 0x2F;

/// Export `transcription.mid` into `output_dir`
pub fn export_midi(notes: &[NoteEvent], output_dir: &Path, config: &Config) -> Result<PathBuf> {
    if notes.is_empty() {
        log::warn!("No notes to export, writing an empty MIDI track");
    }

    std::fs::create_dir_all(output_dir)?;
    let midi_path = output_dir.join("transcription.mid");

    let midi_data = encode_with_program(notes, config.export.bpm, config.export.program);

    let mut file = File::create(&midi_path)
        .map_err(|e| TranscribeError::MidiExportError(format!("{}: {}", midi_path.display(), e)))?;
    file.write_all(&midi_data)
        .map_err(|e| TranscribeError::MidiExportError(e.to_string()))?;

    log::info!(
        "Exported {} notes ({} bytes) to {}",
        notes.len(),
        midi_data.len(),
        midi_path.display()
    );
    Ok(midi_path)
}

/// Encode notes as a single-track SMF at `bpm`, program 0
pub fn encode(notes: &[NoteEvent], bpm: f32) -> Vec<u8> {
    encode_with_program(notes, bpm, 0)
}

/// Encode notes as a single-track SMF at `bpm` with the given program
pub fn encode_with_program(notes: &[NoteEvent], bpm: f32, program: u8) -> Vec<u8> {
    let mut timeline: Timeline<Vec<u8>> = Timeline::with_capacity(2 + notes.len() * 2);

    let tempo = tempo_microseconds(bpm);
    timeline.push(
        0,
        vec![
            META,
            META_TEMPO,
            0x03,
            (tempo >> 16) as u8,
            (tempo >> 8) as u8,
            tempo as u8,
        ],
    );
    timeline.push(0, vec![PROGRAM_CHANGE, program & 0x7F]);

    for note in notes {
        let key = note.pitch & 0x7F;
        timeline.push(
            seconds_to_ticks(note.start_sec, bpm),
            vec![NOTE_ON, key, note.velocity.clamp(1, 127)],
        );
        timeline.push(seconds_to_ticks(note.end_sec, bpm), vec![NOTE_OFF, key, 0]);
    }

    let mut track = Vec::new();
    for (delta, payload) in timeline.into_deltas() {
        write_vlq(&mut track, u32::try_from(delta).unwrap_or(u32::MAX));
        track.extend_from_slice(&payload);
    }
    track.extend_from_slice(&[0x00, META, META_END_OF_TRACK, 0x00]);

    let mut bytes = Vec::with_capacity(14 + 8 + track.len());
    bytes.extend_from_slice(b"MThd");
    bytes.extend_from_slice(&6u32.to_be_bytes());
    bytes.extend_from_slice(&0u16.to_be_bytes()); // format 0
    bytes.extend_from_slice(&1u16.to_be_bytes()); // one track
    bytes.extend_from_slice(&TICKS_PER_QUARTER.to_be_bytes());

    bytes.extend_from_slice(b"MTrk");
    bytes.extend_from_slice(&(track.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&track);
    bytes
}

/// Microseconds per quarter note, 24-bit
pub fn tempo_microseconds(bpm: f32) -> u32 {
    ((60_000_000.0 / bpm as f64).round() as u32).min(0x00FF_FFFF)
}

/// Absolute tick for a time in seconds
pub fn seconds_to_ticks(seconds: f32, bpm: f32) -> u64 {
    let ticks = seconds.max(0.0) as f64 * (bpm as f64 / 60.0) * TICKS_PER_QUARTER as f64;
    ticks.round() as u64
}

/// Largest value a four-byte variable-length quantity can hold
pub const MAX_VLQ: u32 = 0x0FFF_FFFF;

/// Append `value` as a MIDI variable-length quantity.
///
/// Values above [`MAX_VLQ`] saturate; such a delta is over 77 hours at 120 bpm.
pub fn write_vlq(out: &mut Vec<u8>, value: u32) {
    let value = value.min(MAX_VLQ);
    let mut groups = [0u8; 4];
    let mut count = 0;
    let mut rest = value;
    loop {
        groups[count] = (rest & 0x7F) as u8;
        count += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    for i in (0..count).rev() {
        let continuation = if i > 0 { 0x80 } else { 0x00 };
        out.push(groups[i] | continuation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vlq(value: u32) -> Vec<u8> {
        let mut out = Vec::new();
        write_vlq(&mut out, value);
        out
    }

    #[test]
    fn test_vlq_reference_values() {
        assert_eq!(vlq(0), vec![0x00]);
        assert_eq!(vlq(0x40), vec![0x40]);
        assert_eq!(vlq(0x7F), vec![0x7F]);
        assert_eq!(vlq(0x80), vec![0x81, 0x00]);
        assert_eq!(vlq(480), vec![0x83, 0x60]);
        assert_eq!(vlq(0x3FFF), vec![0xFF, 0x7F]);
        assert_eq!(vlq(0x4000), vec![0x81, 0x80, 0x00]);
        assert_eq!(vlq(0x0FFF_FFFF), vec![0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn test_vlq_saturates() {
        assert_eq!(vlq(MAX_VLQ + 1), vlq(MAX_VLQ));
        assert_eq!(vlq(u32::MAX), vec![0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn test_tempo_and_ticks() {
        assert_eq!(tempo_microseconds(120.0), 500_000);
        assert_eq!(tempo_microseconds(90.0), 666_667);
        assert_eq!(seconds_to_ticks(0.5, 120.0), 480);
        assert_eq!(seconds_to_ticks(1.0, 120.0), 960);
        assert_eq!(seconds_to_ticks(0.25, 60.0), 120);
    }

    #[test]
    fn test_empty_notes_minimal_file() {
        let bytes = encode(&[], 120.0);
        let expected_track: Vec<u8> = vec![
            0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, // tempo 500000
            0x00, 0xC0, 0x00, // program change
            0x00, 0xFF, 0x2F, 0x00, // end of track
        ];
        assert_eq!(&bytes[0..4], b"MThd");
        assert_eq!(&bytes[4..14], &[0, 0, 0, 6, 0, 0, 0, 1, 0x01, 0xE0]);
        assert_eq!(&bytes[14..18], b"MTrk");
        assert_eq!(&bytes[18..22], &(expected_track.len() as u32).to_be_bytes());
        assert_eq!(&bytes[22..], expected_track.as_slice());
    }
}

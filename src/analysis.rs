//! Frame and note data model, pitch conversions and analysis export

use crate::audio::TranscriptionState;
use crate::error::TranscribeError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Latest note end accepted from a notes file, seconds
pub const MAX_NOTE_END_SEC: f32 = 3600.0;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// One scanned analysis window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchFrame {
    /// Window start in seconds
    pub time_sec: f32,
    /// Fundamental frequency, absent for silent or unvoiced windows
    pub f0_hz: Option<f32>,
    /// Estimator confidence in [0, 1]
    pub confidence: f32,
    /// RMS amplitude of the window
    pub energy: f32,
}

/// A transcribed note
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub start_sec: f32,
    pub end_sec: f32,
    /// MIDI note number
    pub pitch: u8,
    /// MIDI velocity, 1..=127
    pub velocity: u8,
}

impl NoteEvent {
    pub fn duration_sec(&self) -> f32 {
        self.end_sec - self.start_sec
    }
}

/// Fractional MIDI note number for a frequency
pub fn hz_to_midi(frequency: f32) -> f32 {
    69.0 + 12.0 * (frequency / 440.0).log2()
}

/// Equal-tempered frequency of a MIDI note
pub fn midi_to_hz(pitch: u8) -> f32 {
    440.0 * 2.0f32.powf((pitch as f32 - 69.0) / 12.0)
}

/// Scientific pitch name, e.g. `A4` for 69
pub fn note_name(pitch: u8) -> String {
    let octave = (pitch / 12) as i32 - 1;
    format!("{}{}", NOTE_NAMES[(pitch % 12) as usize], octave)
}

#[derive(Debug, Serialize)]
struct NoteSummary {
    start_sec: f32,
    end_sec: f32,
    pitch: u8,
    name: String,
    velocity: u8,
}

#[derive(Debug, Serialize)]
struct AnalysisSummary {
    duration_sec: f32,
    sample_rate: u32,
    total_frames: usize,
    voiced_frames: usize,
    mean_confidence: f32,
    note_count: usize,
    pitch_range: Option<(u8, u8)>,
}

#[derive(Debug, Serialize)]
struct AnalysisResults<'a> {
    summary: AnalysisSummary,
    notes: Vec<NoteSummary>,
    frames: &'a [PitchFrame],
}

/// Export frames and notes as `analysis.json`
pub fn export_analysis(
    state: &TranscriptionState,
    output_dir: &Path,
) -> crate::Result<()> {
    std::fs::create_dir_all(output_dir)?;
    let analysis_path = output_dir.join("analysis.json");

    let analysis = build_analysis_results(state);
    let json = serde_json::to_string_pretty(&analysis)?;
    std::fs::write(&analysis_path, json)?;

    log::info!("Exported analysis results to {}", analysis_path.display());
    Ok(())
}

fn build_analysis_results(state: &TranscriptionState) -> AnalysisResults<'_> {
    let voiced: Vec<&PitchFrame> = state.frames.iter().filter(|f| f.f0_hz.is_some()).collect();
    let mean_confidence = if voiced.is_empty() {
        0.0
    } else {
        voiced.iter().map(|f| f.confidence).sum::<f32>() / voiced.len() as f32
    };

    let pitch_range = state
        .notes
        .iter()
        .map(|n| n.pitch)
        .min()
        .zip(state.notes.iter().map(|n| n.pitch).max());

    AnalysisResults {
        summary: AnalysisSummary {
            duration_sec: state.duration_sec(),
            sample_rate: state.sr,
            total_frames: state.frames.len(),
            voiced_frames: voiced.len(),
            mean_confidence,
            note_count: state.notes.len(),
            pitch_range,
        },
        notes: state
            .notes
            .iter()
            .map(|n| NoteSummary {
                start_sec: n.start_sec,
                end_sec: n.end_sec,
                pitch: n.pitch,
                name: note_name(n.pitch),
                velocity: n.velocity,
            })
            .collect(),
        frames: &state.frames,
    }
}

/// Load a note list previously saved as JSON (either a bare array or an
/// `analysis.json` with a `notes` field)
pub fn load_notes<P: AsRef<Path>>(path: P) -> crate::Result<Vec<NoteEvent>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NotesFile {
        Bare(Vec<NoteEvent>),
        Analysis { notes: Vec<NoteEvent> },
    }

    let content = std::fs::read_to_string(path)?;
    let notes = match serde_json::from_str::<NotesFile>(&content)? {
        NotesFile::Bare(notes) => notes,
        NotesFile::Analysis { notes } => notes,
    };
    validate_notes(&notes)?;
    Ok(notes)
}

/// Check that every note is renderable and encodable
pub fn validate_notes(notes: &[NoteEvent]) -> crate::Result<()> {
    for (i, note) in notes.iter().enumerate() {
        let problem = if !note.start_sec.is_finite() || !note.end_sec.is_finite() {
            "non-finite time"
        } else if note.start_sec < 0.0 {
            "negative start"
        } else if note.end_sec <= note.start_sec {
            "end not after start"
        } else if note.end_sec > MAX_NOTE_END_SEC {
            "ends after the one hour limit"
        } else if note.pitch > 127 {
            "pitch above 127"
        } else if !(1..=127).contains(&note.velocity) {
            "velocity outside 1..=127"
        } else {
            continue;
        };
        return Err(TranscribeError::InputValidationError(format!(
            "note {}: {} ({:?})",
            i, problem, note
        )));
    }
    Ok(())
}

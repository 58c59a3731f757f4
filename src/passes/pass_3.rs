//! Pass 3: Grid Quantization (optional)

use crate::analysis::NoteEvent;
use crate::audio::TranscriptionState;
use crate::config::{Config, QuantizeConfig};
use crate::error::Result;

/// Outcome of quantizing a note list
#[derive(Debug, Clone)]
pub struct QuantizationResult {
    pub quantized_notes: Vec<NoteEvent>,
    pub max_drift_ms: f32,
}

fn snap(time_sec: f32, grid_sec: f32, options: &QuantizeConfig, max_drift_ms: &mut f32) -> f32 {
    let snapped = (time_sec / grid_sec).round() * grid_sec;
    let drift_ms = (snapped - time_sec).abs() * 1000.0;
    if drift_ms > options.max_ms {
        // Too far from the grid to be a timing error
        return time_sec;
    }
    *max_drift_ms = max_drift_ms.max(drift_ms);
    time_sec + (snapped - time_sec) * options.strength
}

/// Pull note boundaries toward a `1/subdivisions_per_beat` beat grid at `bpm`
pub fn quantize_notes(notes: &[NoteEvent], bpm: f32, options: &QuantizeConfig) -> QuantizationResult {
    let grid_sec = 60.0 / bpm / options.subdivisions_per_beat.max(1) as f32;
    let mut max_drift_ms: f32 = 0.0;

    let mut quantized: Vec<NoteEvent> = notes
        .iter()
        .map(|note| {
            let start_sec = snap(note.start_sec, grid_sec, options, &mut max_drift_ms).max(0.0);
            let mut end_sec = snap(note.end_sec, grid_sec, options, &mut max_drift_ms);
            if end_sec <= start_sec {
                end_sec = start_sec + grid_sec;
            }
            NoteEvent {
                start_sec,
                end_sec,
                ..*note
            }
        })
        .collect();

    quantized.sort_by(|a, b| a.start_sec.total_cmp(&b.start_sec));

    // Snapping can push a note's end past the next same-pitch onset
    for i in 1..quantized.len() {
        let next_start = quantized[i].start_sec;
        let pitch = quantized[i].pitch;
        if let Some(prev) = quantized[..i].iter_mut().rev().find(|n| n.pitch == pitch) {
            if prev.end_sec > next_start {
                prev.end_sec = next_start;
            }
        }
    }
    quantized.retain(|n| n.end_sec > n.start_sec);

    QuantizationResult {
        quantized_notes: quantized,
        max_drift_ms,
    }
}

pub fn run(state: &mut TranscriptionState, config: &Config) -> Result<()> {
    if !config.quantize.enabled {
        log::debug!("Pass 3: Quantization disabled");
        return Ok(());
    }

    log::info!("Pass 3: Grid Quantization");
    let result = quantize_notes(&state.notes, config.export.bpm, &config.quantize);
    log::info!(
        "  1/{} beat grid at {:.1} bpm, max drift {:.1}ms",
        config.quantize.subdivisions_per_beat,
        config.export.bpm,
        result.max_drift_ms
    );
    state.notes = result.quantized_notes;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(start_sec: f32, end_sec: f32, pitch: u8) -> NoteEvent {
        NoteEvent {
            start_sec,
            end_sec,
            pitch,
            velocity: 100,
        }
    }

    #[test]
    fn test_snaps_to_sixteenths() {
        // 120 bpm, 4 per beat -> 0.125s grid
        let options = QuantizeConfig {
            enabled: true,
            ..QuantizeConfig::default()
        };
        let result = quantize_notes(&[note(0.26, 0.49, 60)], 120.0, &options);
        let q = result.quantized_notes[0];
        assert!((q.start_sec - 0.25).abs() < 1e-6);
        assert!((q.end_sec - 0.5).abs() < 1e-6);
        assert!((result.max_drift_ms - 10.0).abs() < 0.1);
    }

    #[test]
    fn test_collapsed_note_keeps_one_step() {
        let options = QuantizeConfig {
            enabled: true,
            ..QuantizeConfig::default()
        };
        let result = quantize_notes(&[note(0.01, 0.05, 60)], 120.0, &options);
        let q = result.quantized_notes[0];
        assert_eq!(q.start_sec, 0.0);
        assert!((q.end_sec - 0.125).abs() < 1e-6);
    }

    #[test]
    fn test_large_drift_preserved() {
        let options = QuantizeConfig {
            enabled: true,
            max_ms: 5.0,
            ..QuantizeConfig::default()
        };
        let result = quantize_notes(&[note(0.2, 0.8, 60)], 120.0, &options);
        let q = result.quantized_notes[0];
        assert_eq!(q.start_sec, 0.2);
    }
}

//! QA artifacts generation

use crate::analysis::{hz_to_midi, note_name};
use crate::audio::TranscriptionState;
use crate::config::Config;
use crate::error::TranscribeError;
use plotters::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Generate QA artifacts (plot and statistics report)
pub fn generate_artifacts(
    state: &TranscriptionState,
    output_dir: &Path,
    config: &Config,
) -> crate::Result<()> {
    let qa_dir = output_dir.join("qa");
    fs::create_dir_all(&qa_dir)?;

    log::info!("Generating QA artifacts...");

    generate_statistics_report(state, &qa_dir)?;
    if config.qa.generate_images {
        generate_pitch_contour_plot(state, &qa_dir)?;
    }

    log::info!("QA artifacts generated in {}", qa_dir.display());
    Ok(())
}

fn qa_err<E: std::fmt::Debug>(what: &str, e: E) -> TranscribeError {
    TranscribeError::QaGenerationError(format!("{}: {:?}", what, e))
}

/// Frame pitch contour with the segmented notes drawn as bars
fn generate_pitch_contour_plot(state: &TranscriptionState, output_dir: &Path) -> crate::Result<()> {
    let path = output_dir.join("pitch_contour.png");
    let root = BitMapBackend::new(&path, (1200, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| qa_err("Failed to fill plot background", e))?;

    let contour: Vec<(f64, f64)> = state
        .frames
        .iter()
        .filter_map(|f| f.f0_hz.map(|hz| (f.time_sec as f64, hz_to_midi(hz) as f64)))
        .collect();

    let (mut low, mut high) = contour
        .iter()
        .map(|&(_, p)| p)
        .chain(state.notes.iter().map(|n| n.pitch as f64))
        .fold((f64::MAX, f64::MIN), |(lo, hi), p| (lo.min(p), hi.max(p)));
    if low > high {
        low = 48.0;
        high = 72.0;
    }

    let duration = (state.duration_sec() as f64).max(0.1);
    let mut chart = ChartBuilder::on(&root)
        .caption("Pitch Contour", ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0f64..duration, (low - 2.0)..(high + 2.0))
        .map_err(|e| qa_err("Failed to build chart", e))?;

    chart
        .configure_mesh()
        .x_desc("Time (seconds)")
        .y_desc("MIDI Pitch")
        .draw()
        .map_err(|e| qa_err("Failed to draw mesh", e))?;

    chart
        .draw_series(state.notes.iter().map(|note| {
            let pitch = note.pitch as f64;
            Rectangle::new(
                [
                    (note.start_sec as f64, pitch - 0.4),
                    (note.end_sec as f64, pitch + 0.4),
                ],
                BLUE.mix(0.3).filled(),
            )
        }))
        .map_err(|e| qa_err("Failed to draw notes", e))?;

    chart
        .draw_series(
            contour
                .iter()
                .map(|&(t, p)| Circle::new((t, p), 2, RED.filled())),
        )
        .map_err(|e| qa_err("Failed to draw contour", e))?;

    root.present().map_err(|e| qa_err("Failed to write plot", e))?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct Statistics {
    duration_seconds: f32,
    sample_rate: u32,
    total_samples: usize,
    total_frames: usize,
    voiced_frames: usize,
    gated_frames: usize,
    total_notes: usize,
    mean_note_duration_sec: f32,
    mean_velocity: f32,
    pitch_histogram: Vec<(String, usize)>,
    preflight: Option<crate::passes::pass_0::PreflightReport>,
}

/// Write `statistics.json`
fn generate_statistics_report(state: &TranscriptionState, output_dir: &Path) -> crate::Result<()> {
    let path = output_dir.join("statistics.json");

    let voiced_frames = state.frames.iter().filter(|f| f.f0_hz.is_some()).count();
    let gated_frames = state
        .frames
        .iter()
        .filter(|f| f.energy < state.config.scan.energy_gate)
        .count();

    let n_notes = state.notes.len();
    let (mean_note_duration_sec, mean_velocity) = if n_notes == 0 {
        (0.0, 0.0)
    } else {
        (
            state.notes.iter().map(|n| n.duration_sec()).sum::<f32>() / n_notes as f32,
            state.notes.iter().map(|n| n.velocity as f32).sum::<f32>() / n_notes as f32,
        )
    };

    let mut counts = [0usize; 128];
    for note in &state.notes {
        counts[note.pitch as usize] += 1;
    }
    let pitch_histogram = counts
        .iter()
        .enumerate()
        .filter(|(_, c)| **c > 0)
        .map(|(p, &c)| (note_name(p as u8), c))
        .collect();

    let stats = Statistics {
        duration_seconds: state.duration_sec(),
        sample_rate: state.sr,
        total_samples: state.n_samples(),
        total_frames: state.frames.len(),
        voiced_frames,
        gated_frames,
        total_notes: n_notes,
        mean_note_duration_sec,
        mean_velocity,
        pitch_histogram,
        preflight: state.preflight.clone(),
    };

    let json = serde_json::to_string_pretty(&stats)?;
    fs::write(path, json)?;

    Ok(())
}

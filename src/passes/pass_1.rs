//! Pass 1: Frame Scanning
//!
//! Slides a fixed window over the buffer, gates silent windows on RMS energy
//! and estimates a fundamental for the rest. Every window is independent.

use crate::analysis::PitchFrame;
use crate::audio::{rms, TranscriptionState};
use crate::config::Config;
use crate::error::Result;
use crate::pitch::{estimate, PitchParams};

/// Scan `samples` into one [`PitchFrame`] per full window.
///
/// Windows start every `hop` samples; a trailing partial window is dropped.
pub fn scan(
    samples: &[f32],
    sample_rate: u32,
    frame_size: usize,
    hop: usize,
    energy_gate: f32,
    params: &PitchParams,
) -> Vec<PitchFrame> {
    if frame_size == 0 || hop == 0 || samples.len() < frame_size {
        return Vec::new();
    }

    let sr = sample_rate as f32;
    (0..=samples.len() - frame_size)
        .step_by(hop)
        .map(|start| {
            let window = &samples[start..start + frame_size];
            let energy = rms(window);
            let time_sec = start as f32 / sr;

            if energy < energy_gate {
                return PitchFrame {
                    time_sec,
                    f0_hz: None,
                    confidence: 0.0,
                    energy,
                };
            }

            let est = estimate(window, sample_rate, params);
            PitchFrame {
                time_sec,
                f0_hz: est.f0_hz,
                confidence: est.confidence,
                energy,
            }
        })
        .collect()
}

pub fn run(state: &mut TranscriptionState, config: &Config) -> Result<()> {
    log::info!("Pass 1: Frame Scanning");

    let params = PitchParams::from(&config.pitch);
    state.frames = scan(
        &state.y,
        state.sr,
        config.scan.frame_size,
        config.scan.hop_size,
        config.scan.energy_gate,
        &params,
    );

    let voiced = state.frames.iter().filter(|f| f.f0_hz.is_some()).count();
    log::info!(
        "  {} frames scanned, {} voiced ({:.0}%)",
        state.frames.len(),
        voiced,
        if state.frames.is_empty() {
            0.0
        } else {
            100.0 * voiced as f32 / state.frames.len() as f32
        }
    );
    Ok(())
}

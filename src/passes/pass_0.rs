//! Pass 0: Preflight
//!
//! Measures the input level and flags conditions that make transcription
//! unreliable. The samples are left untouched.

use crate::audio::{peak, rms, TranscriptionState};
use crate::config::Config;
use crate::error::{Result, TranscribeError};
use serde::Serialize;

/// Samples at or above this magnitude count as clipped
const CLIP_LEVEL: f32 = 0.999;

/// Input level statistics
#[derive(Debug, Clone, Serialize)]
pub struct PreflightReport {
    pub duration_sec: f32,
    pub peak: f32,
    pub rms: f32,
    pub dc_offset: f32,
    pub clipped_fraction: f32,
    /// Number of full analysis windows the scanner will produce
    pub expected_frames: usize,
}

/// Compute level statistics for `samples`
pub fn analyze(samples: &[f32], sr: u32, config: &Config) -> PreflightReport {
    let n = samples.len();
    let clipped = samples.iter().filter(|x| x.abs() >= CLIP_LEVEL).count();
    let dc_offset = if n == 0 {
        0.0
    } else {
        samples.iter().sum::<f32>() / n as f32
    };

    let frame_size = config.scan.frame_size;
    let expected_frames = if n >= frame_size {
        (n - frame_size) / config.scan.hop_size.max(1) + 1
    } else {
        0
    };

    PreflightReport {
        duration_sec: n as f32 / sr as f32,
        peak: peak(samples),
        rms: rms(samples),
        dc_offset,
        clipped_fraction: if n == 0 { 0.0 } else { clipped as f32 / n as f32 },
        expected_frames,
    }
}

pub fn run(state: &mut TranscriptionState, config: &Config) -> Result<()> {
    log::info!("Pass 0: Preflight");

    if let Some(i) = state.y.iter().position(|x| !x.is_finite()) {
        return Err(TranscribeError::InputValidationError(format!(
            "non-finite sample at index {}",
            i
        )));
    }

    let report = analyze(&state.y, state.sr, config);
    log::debug!(
        "  {:.2}s, peak {:.3}, rms {:.4}, dc {:.4}",
        report.duration_sec,
        report.peak,
        report.rms,
        report.dc_offset
    );

    if report.expected_frames == 0 {
        log::warn!(
            "Input is shorter than one analysis frame ({} samples), no notes will be found",
            config.scan.frame_size
        );
    }
    if report.rms < config.scan.energy_gate {
        log::warn!(
            "Input level (rms {:.4}) is below the silence gate {:.4}",
            report.rms,
            config.scan.energy_gate
        );
    }
    if report.clipped_fraction > 0.001 {
        log::warn!(
            "{:.2}% of samples are clipped, pitch estimates may be unreliable",
            report.clipped_fraction * 100.0
        );
    }
    if report.dc_offset.abs() > 0.05 {
        log::warn!("Large DC offset ({:.3}) in input", report.dc_offset);
    }

    state.preflight = Some(report);
    Ok(())
}

//! YIN fundamental-frequency estimation for a single window
//!
//! The estimator works on the cumulative mean normalized difference function
//! (CMNDF) of the window. A lag is accepted at the first point where the
//! CMNDF dips under the absolute threshold, after descending to the bottom of
//! that dip, and is then refined with parabolic interpolation.

use serde::{Deserialize, Serialize};

/// Floor for the CMNDF running sum
const RUNNING_SUM_EPSILON: f32 = 1e-12;

/// Search bounds and acceptance threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchParams {
    /// Lowest detectable frequency in Hz (sets the longest lag)
    pub f_min: f32,
    /// Highest detectable frequency in Hz (sets the shortest lag)
    pub f_max: f32,
    /// CMNDF acceptance ceiling
    pub threshold: f32,
}

impl Default for PitchParams {
    fn default() -> Self {
        Self {
            f_min: 65.0,
            f_max: 1000.0,
            threshold: 0.12,
        }
    }
}

impl From<&crate::config::PitchConfig> for PitchParams {
    fn from(config: &crate::config::PitchConfig) -> Self {
        Self {
            f_min: config.f_min,
            f_max: config.f_max,
            threshold: config.threshold,
        }
    }
}

/// Result of estimating one window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    pub f0_hz: Option<f32>,
    pub confidence: f32,
}

impl PitchEstimate {
    /// No voiced pitch found
    pub const UNVOICED: PitchEstimate = PitchEstimate {
        f0_hz: None,
        confidence: 0.0,
    };
}

/// Estimate the fundamental frequency of `window`.
///
/// Returns [`PitchEstimate::UNVOICED`] when the window is too short for
/// `params.f_min`, when it does not vary at all (silence or DC), or when no lag in the
/// search range passes the threshold.
pub fn estimate(window: &[f32], sample_rate: u32, params: &PitchParams) -> PitchEstimate {
    let n = window.len();
    let sr = sample_rate as f32;
    let max_lag = (sr / params.f_min).floor() as usize;
    let min_lag = ((sr / params.f_max).floor() as usize).max(1);

    if max_lag >= n || min_lag > max_lag {
        return PitchEstimate::UNVOICED;
    }

    let diff = difference_function(window, max_lag);

    // Silent or constant windows have d[τ] = 0 for every lag and would read as perfectly periodic
    if diff[1..].iter().sum::<f32>() < RUNNING_SUM_EPSILON {
        return PitchEstimate::UNVOICED;
    }
    let cmndf = cumulative_mean_normalized(&diff);

    let Some(tau) = absolute_threshold(&cmndf, min_lag, max_lag, params.threshold) else {
        return PitchEstimate::UNVOICED;
    };

    let better_tau = parabolic_interpolation(&cmndf, tau, max_lag);
    if better_tau <= 0.0 {
        return PitchEstimate::UNVOICED;
    }

    PitchEstimate {
        f0_hz: Some(sr / better_tau),
        confidence: (1.0 - cmndf[tau]).clamp(0.0, 1.0),
    }
}

/// Squared difference `d[τ]` for `τ` in `0..=max_lag`
fn difference_function(window: &[f32], max_lag: usize) -> Vec<f32> {
    let n = window.len();
    let mut diff = vec![0.0f32; max_lag + 1];
    for (tau, d) in diff.iter_mut().enumerate().skip(1) {
        *d = window[..n - tau]
            .iter()
            .zip(&window[tau..])
            .map(|(&a, &b)| {
                let delta = a - b;
                delta * delta
            })
            .sum();
    }
    diff
}

fn cumulative_mean_normalized(diff: &[f32]) -> Vec<f32> {
    let mut cmndf = vec![1.0f32; diff.len()];
    let mut running_sum = 0.0f32;
    for tau in 1..diff.len() {
        running_sum += diff[tau];
        cmndf[tau] = diff[tau] * tau as f32 / running_sum.max(RUNNING_SUM_EPSILON);
    }
    cmndf
}

/// First lag under `threshold`, advanced to the bottom of its dip
fn absolute_threshold(
    cmndf: &[f32],
    min_lag: usize,
    max_lag: usize,
    threshold: f32,
) -> Option<usize> {
    let mut tau = (min_lag..=max_lag).find(|&t| cmndf[t] < threshold)?;
    while tau < max_lag && cmndf[tau + 1] < cmndf[tau] {
        tau += 1;
    }
    Some(tau)
}

fn parabolic_interpolation(cmndf: &[f32], tau: usize, max_lag: usize) -> f32 {
    let s0 = cmndf[tau.saturating_sub(1).max(1)];
    let s1 = cmndf[tau];
    let s2 = cmndf[(tau + 1).min(max_lag)];
    let denom = 2.0 * s1 - s2 - s0;
    if denom != 0.0 {
        tau as f32 + (s2 - s0) / (2.0 * denom)
    } else {
        tau as f32
    }
}

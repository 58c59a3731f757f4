//! Configuration system for the transcriber

use crate::error::{Result, TranscribeError};
use crate::render::Waveform;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: String,
    pub pitch: PitchConfig,
    pub scan: ScanConfig,
    pub segment: SegmentConfig,
    pub quantize: QuantizeConfig,
    pub export: ExportConfig,
    pub render: RenderConfig,
    pub qa: QaConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            pitch: PitchConfig::default(),
            scan: ScanConfig::default(),
            segment: SegmentConfig::default(),
            quantize: QuantizeConfig::default(),
            export: ExportConfig::default(),
            render: RenderConfig::default(),
            qa: QaConfig::default(),
        }
    }
}

/// YIN search bounds and acceptance threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchConfig {
    pub f_min: f32,
    pub f_max: f32,
    pub threshold: f32,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            f_min: 65.0,
            f_max: 1000.0,
            threshold: 0.12,
        }
    }
}

/// Frame scanner windowing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub frame_size: usize,
    pub hop_size: usize,
    /// RMS below which a window is treated as silence
    pub energy_gate: f32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            hop_size: 512,
            energy_gate: 0.01,
        }
    }
}

/// Note segmentation thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    pub min_rms: f32,
    pub min_conf: f32,
    /// Seconds
    pub min_note_dur: f32,
    /// Seconds
    pub merge_gap: f32,
    /// Semitones
    pub pitch_tolerance: f32,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            min_rms: 0.01,
            min_conf: 0.5,
            min_note_dur: 0.08,
            merge_gap: 0.06,
            pitch_tolerance: 0.5,
        }
    }
}

/// Optional grid quantization of note boundaries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantizeConfig {
    pub enabled: bool,
    pub subdivisions_per_beat: u32,
    pub strength: f32,
    pub max_ms: f32,
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            subdivisions_per_beat: 4,
            strength: 1.0,
            max_ms: 60.0,
        }
    }
}

/// MIDI export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub bpm: f32,
    pub program: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            program: 0,
        }
    }
}

/// WAV preview rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub enabled: bool,
    pub sample_rate: u32,
    pub waveform: Waveform,
    pub attack: f32,
    pub release: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_rate: 44100,
            waveform: Waveform::Sine,
            attack: 0.01,
            release: 0.05,
        }
    }
}

/// QA artifacts configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    pub generate_images: bool,
    pub write_analysis: bool,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            generate_images: true,
            write_analysis: true,
        }
    }
}

fn invalid(msg: impl Into<String>) -> TranscribeError {
    TranscribeError::ConfigValidationFailed(msg.into())
}

/// Validate configuration parameters
pub fn validate_config(config: &Config) -> Result<()> {
    let pitch = &config.pitch;
    if !(pitch.f_min > 0.0 && pitch.f_min < pitch.f_max) {
        return Err(invalid(format!(
            "pitch.f_min ({}) must be positive and below pitch.f_max ({})",
            pitch.f_min, pitch.f_max
        )));
    }
    if !(pitch.threshold > 0.0 && pitch.threshold <= 1.0) {
        return Err(invalid("pitch.threshold must be in (0, 1]"));
    }

    if config.scan.frame_size < 2 {
        return Err(invalid("scan.frame_size must be at least 2 samples"));
    }
    if config.scan.hop_size == 0 {
        return Err(invalid("scan.hop_size must be at least 1 sample"));
    }
    if config.scan.energy_gate < 0.0 {
        return Err(invalid("scan.energy_gate must be non-negative"));
    }

    let seg = &config.segment;
    for (name, value) in [
        ("segment.min_rms", seg.min_rms),
        ("segment.min_conf", seg.min_conf),
        ("segment.min_note_dur", seg.min_note_dur),
        ("segment.merge_gap", seg.merge_gap),
        ("segment.pitch_tolerance", seg.pitch_tolerance),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(invalid(format!("{} must be a non-negative number", name)));
        }
    }

    if !(config.export.bpm.is_finite() && config.export.bpm > 0.0) {
        return Err(invalid("export.bpm must be positive"));
    }
    if config.export.program > 127 {
        return Err(invalid("export.program must be in 0..=127"));
    }

    if config.quantize.enabled {
        if config.quantize.subdivisions_per_beat == 0 {
            return Err(invalid("quantize.subdivisions_per_beat must be at least 1"));
        }
        if !(0.0..=1.0).contains(&config.quantize.strength) {
            return Err(invalid("quantize.strength must be in [0, 1]"));
        }
    }

    if config.render.sample_rate == 0 {
        return Err(invalid("render.sample_rate must be positive"));
    }
    if config.render.attack < 0.0 || config.render.release < 0.0 {
        return Err(invalid("render.attack and render.release must be non-negative"));
    }

    Ok(())
}

/// Load configuration from JSON file
pub fn load_config<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Save configuration to JSON file
pub fn save_config<P: AsRef<std::path::Path>>(config: &Config, path: P) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

//! Audio I/O and pipeline state

use crate::analysis::{NoteEvent, PitchFrame};
use crate::config::Config;
use crate::error::{Result, TranscribeError};
use crate::passes::pass_0::PreflightReport;
use hound::WavReader;
use std::path::Path;

/// Audio plus everything the passes derive from it
#[derive(Debug, Clone)]
pub struct TranscriptionState {
    /// Audio samples (mono, [-1, 1])
    pub y: Vec<f32>,
    /// Sample rate in Hz
    pub sr: u32,
    /// Configuration reference
    pub config: Config,

    // Pass 0: Preflight
    /// Level statistics of the input
    pub preflight: Option<PreflightReport>,

    // Pass 1: Frame scanning
    /// One pitch frame per analysis window
    pub frames: Vec<PitchFrame>,

    // Pass 2: Segmentation (and pass 3 quantization when enabled)
    /// Final note list
    pub notes: Vec<NoteEvent>,
}

impl TranscriptionState {
    /// Load audio file and create initial state
    pub fn load<P: AsRef<Path>>(path: P, config: &Config) -> Result<Self> {
        let (y, sr) = load_audio_file(path)?;
        Self::from_samples(y, sr, config)
    }

    /// Wrap an in-memory mono buffer
    pub fn from_samples(samples: Vec<f32>, sr: u32, config: &Config) -> Result<Self> {
        if sr == 0 {
            return Err(TranscribeError::UnsupportedSampleRate(sr));
        }
        Ok(TranscriptionState {
            y: samples,
            sr,
            config: config.clone(),
            preflight: None,
            frames: Vec::new(),
            notes: Vec::new(),
        })
    }

    /// Get audio duration in seconds
    pub fn duration_sec(&self) -> f32 {
        self.y.len() as f32 / self.sr as f32
    }

    /// Get number of samples
    pub fn n_samples(&self) -> usize {
        self.y.len()
    }
}

/// Load audio file and return mono samples with sample rate
pub fn load_audio_file<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, u32)> {
    let path = path.as_ref();

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "wav" | "wave" => load_wav_file(path),
        _ => Err(TranscribeError::InvalidAudioFormat(format!(
            "Unsupported audio format: {}",
            extension
        ))),
    }
}

fn load_wav_file(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    if spec.channels == 0 {
        return Err(TranscribeError::InvalidAudioFormat(
            "WAV header declares zero channels".to_string(),
        ));
    }
    if spec.bits_per_sample > 32 {
        return Err(TranscribeError::InvalidAudioFormat(format!(
            "Unsupported bit depth: {}",
            spec.bits_per_sample
        )));
    }

    let mut interleaved: Vec<f32> = Vec::with_capacity(reader.len() as usize);
    match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            for sample in reader.samples::<i32>() {
                interleaved.push(sample? as f32 / max_value);
            }
        }
        hound::SampleFormat::Float => {
            for sample in reader.samples::<f32>() {
                interleaved.push(sample?);
            }
        }
    }

    let samples = downmix(&interleaved, spec.channels as usize);
    log::debug!(
        "Loaded {} ({} Hz, {} ch, {} bit) -> {} mono samples",
        path.display(),
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        samples.len()
    );
    Ok((samples, spec.sample_rate))
}

/// Average interleaved channels into one
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Validate audio file format and content
pub fn validate_audio_file<P: AsRef<Path>>(path: P, config: &Config) -> Result<()> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(TranscribeError::InputValidationError(format!(
            "Audio file does not exist: {}",
            path.display()
        )));
    }

    let (samples, sr) = load_audio_file(path)?;

    if samples.is_empty() {
        return Err(TranscribeError::InputValidationError(
            "Audio file contains no samples".to_string(),
        ));
    }

    if !(8000..=192000).contains(&sr) {
        return Err(TranscribeError::UnsupportedSampleRate(sr));
    }

    if samples.len() < config.scan.frame_size {
        return Err(TranscribeError::InputValidationError(format!(
            "Audio file too short: {} samples (one analysis frame is {})",
            samples.len(),
            config.scan.frame_size
        )));
    }

    let peak_level = peak(&samples);
    if peak_level > 0.99 {
        log::warn!("Audio file may be clipped (peak = {:.3})", peak_level);
    }

    Ok(())
}

/// Root-mean-square amplitude
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|&x| x * x).sum::<f32>() / samples.len() as f32).sqrt()
}

/// Largest absolute sample value
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms() {
        assert_eq!(rms(&[]), 0.0);
        assert!((rms(&[1.0, -1.0, 1.0, -1.0]) - 1.0).abs() < 1e-6);
        assert!((rms(&[0.5; 16]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_peak() {
        assert_eq!(peak(&[0.1, -0.7, 0.3]), 0.7);
        assert_eq!(peak(&[]), 0.0);
    }

    #[test]
    fn test_downmix_stereo() {
        let interleaved = vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(downmix(&interleaved, 2), vec![0.5, 0.5, 0.0]);
        assert_eq!(downmix(&interleaved, 1), interleaved);
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        let result = TranscriptionState::from_samples(vec![0.0; 10], 0, &Config::default());
        assert!(matches!(result, Err(TranscribeError::UnsupportedSampleRate(0))));
    }

    #[test]
    fn test_load_stereo_int_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..100 {
            writer.write_sample(16384i16).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let (samples, sr) = load_audio_file(&path).unwrap();
        assert_eq!(sr, 8000);
        assert_eq!(samples.len(), 100);
        assert!((samples[0] - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_rejects_unknown_extension() {
        assert!(matches!(
            load_audio_file("recording.mp3"),
            Err(TranscribeError::InvalidAudioFormat(_))
        ));
    }
}

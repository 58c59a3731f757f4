//! Offline additive synthesis of a note list into a PCM16 WAV preview

use crate::analysis::{midi_to_hz, NoteEvent};
use crate::config::Config;
use crate::error::{Result, TranscribeError};
use crate::timeline::Timeline;
use crate::wav::{encode_wav, samples_to_pcm16, write_wav, WavFormat, HEADER_LEN};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Peak amplitude of a full-velocity note
const NOTE_GAIN: f32 = 0.6;
/// Silence appended after the last note, seconds
const TAIL_PADDING_SEC: f32 = 0.5;

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
    Square,
}

impl Waveform {
    /// Value at `phase` in [0, 1), in [-1, 1]
    pub fn sample(&self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (2.0 * PI * phase).sin(),
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Triangle => "triangle",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Square => "square",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Waveform {
    type Err = TranscribeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sine" => Ok(Waveform::Sine),
            "triangle" => Ok(Waveform::Triangle),
            "sawtooth" | "saw" => Ok(Waveform::Sawtooth),
            "square" => Ok(Waveform::Square),
            other => Err(TranscribeError::ConfigValidationFailed(format!(
                "unknown waveform '{}'",
                other
            ))),
        }
    }
}

/// A scheduled note in sample frames
#[derive(Debug, Clone, Copy)]
struct Voice {
    start: u64,
    end: u64,
    frequency: f32,
    peak: f32,
}

impl Voice {
    fn amplitude(&self, index: u64, sr: f32, attack: f32, release: f32) -> f32 {
        let t = (index - self.start) as f32 / sr;
        let duration = (self.end - self.start) as f32 / sr;

        let rise = if attack > 0.0 { t / attack } else { 1.0 };
        let fall = if release > 0.0 {
            (duration - t) / release
        } else {
            1.0
        };
        self.peak * rise.min(fall).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy)]
enum VoiceEvent {
    On(usize),
    Off(usize),
}

/// Total rendered length in seconds
pub fn render_duration_sec(notes: &[NoteEvent]) -> f32 {
    let last_end = notes.iter().map(|n| n.end_sec).fold(1.0f32, f32::max);
    last_end + TAIL_PADDING_SEC
}

/// Synthesize `notes` into floating-point samples in [-1, 1]
pub fn render_samples(
    notes: &[NoteEvent],
    sample_rate: u32,
    waveform: Waveform,
    attack: f32,
    release: f32,
) -> Vec<f32> {
    let sr = sample_rate as f32;
    let total = (render_duration_sec(notes) as f64 * sample_rate as f64).round() as u64;
    let mut out = vec![0.0f32; total as usize];

    let to_frame = |sec: f32| ((sec.max(0.0) as f64 * sample_rate as f64).round() as u64).min(total);

    let voices: Vec<Voice> = notes
        .iter()
        .map(|n| Voice {
            start: to_frame(n.start_sec),
            end: to_frame(n.end_sec),
            frequency: midi_to_hz(n.pitch),
            peak: (n.velocity as f32 / 127.0) * NOTE_GAIN,
        })
        .collect();

    let mut timeline = Timeline::with_capacity(voices.len() * 2);
    for (i, voice) in voices.iter().enumerate() {
        if voice.end > voice.start {
            timeline.push(voice.start, VoiceEvent::On(i));
            timeline.push(voice.end, VoiceEvent::Off(i));
        }
    }

    let mut active: Vec<usize> = Vec::new();
    let mut position = 0u64;
    for (delta, event) in timeline.into_deltas() {
        for index in position..position + delta {
            let mut mix = 0.0f32;
            for &v in &active {
                let voice = &voices[v];
                // f64 keeps the phase exact on notes lasting minutes
                let cycles = voice.frequency as f64 * (index - voice.start) as f64 / sample_rate as f64;
                let phase = cycles.fract() as f32;
                mix += waveform.sample(phase) * voice.amplitude(index, sr, attack, release);
            }
            out[index as usize] = mix.clamp(-1.0, 1.0);
        }
        position += delta;

        match event {
            VoiceEvent::On(v) => active.push(v),
            VoiceEvent::Off(v) => active.retain(|&a| a != v),
        }
    }

    out
}

fn render_err(path: &Path, e: std::io::Error) -> TranscribeError {
    TranscribeError::RenderExportError(format!("{}: {}", path.display(), e))
}

/// Render `notes` to a complete mono PCM16 WAV buffer
pub fn render(
    notes: &[NoteEvent],
    sample_rate: u32,
    waveform: Waveform,
    attack: f32,
    release: f32,
) -> Result<Vec<u8>> {
    let samples = render_samples(notes, sample_rate, waveform, attack, release);
    encode_wav(&WavFormat::mono_pcm16(sample_rate), &samples_to_pcm16(&samples))
        .map_err(|e| TranscribeError::RenderExportError(e.to_string()))
}

/// Render using the configured settings and write `path`
pub fn export_wav_to(notes: &[NoteEvent], path: &Path, config: &Config) -> Result<()> {
    let render_config = &config.render;
    let samples = render_samples(
        notes,
        render_config.sample_rate,
        render_config.waveform,
        render_config.attack,
        render_config.release,
    );
    let pcm = samples_to_pcm16(&samples);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path).map_err(|e| render_err(path, e))?;
    write_wav(
        &mut BufWriter::new(file),
        &WavFormat::mono_pcm16(render_config.sample_rate),
        &pcm,
    )
    .map_err(|e| render_err(path, e))?;

    log::info!(
        "Rendered {} notes as {} wave ({} bytes) to {}",
        notes.len(),
        render_config.waveform,
        HEADER_LEN + pcm.len(),
        path.display()
    );
    Ok(())
}

/// Write `rendering.wav` into `output_dir`
pub fn export_wav(notes: &[NoteEvent], output_dir: &Path, config: &Config) -> Result<PathBuf> {
    let path = output_dir.join("rendering.wav");
    export_wav_to(notes, &path, config)?;
    Ok(path)
}

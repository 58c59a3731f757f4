//! Validation tests for Pass 1: Frame Scanning

use hum2midi::analysis::hz_to_midi;
use hum2midi::config::Config;
use hum2midi::passes::pass_1;
use hum2midi::pitch::PitchParams;
use hum2midi::TranscriptionState;
use std::f32::consts::PI;

/// Tone for `tone_sec`, then silence for `silence_sec`
fn generate_tone_then_silence(frequency: f32, sr: u32, tone_sec: f32, silence_sec: f32) -> Vec<f32> {
    let tone_len = (tone_sec * sr as f32) as usize;
    let silence_len = (silence_sec * sr as f32) as usize;
    let mut audio: Vec<f32> = (0..tone_len)
        .map(|i| 0.4 * (2.0 * PI * frequency * i as f32 / sr as f32).sin())
        .collect();
    audio.extend(std::iter::repeat(0.0).take(silence_len));
    audio
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_frame_per_full_window() {
        let audio = generate_tone_then_silence(440.0, 44100, 0.5, 0.5);
        let frames = pass_1::scan(&audio, 44100, 2048, 512, 0.01, &PitchParams::default());
        assert_eq!(frames.len(), (audio.len() - 2048) / 512 + 1);

        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.time_sec, (i * 512) as f32 / 44100.0);
        }
    }

    #[test]
    fn test_tone_is_voiced_and_silence_is_gated() {
        let audio = generate_tone_then_silence(440.0, 44100, 0.5, 0.5);
        let frames = pass_1::scan(&audio, 44100, 2048, 512, 0.01, &PitchParams::default());

        // Windows fully inside the tone
        for frame in frames.iter().filter(|f| f.time_sec + 2048.0 / 44100.0 < 0.5) {
            let f0 = frame.f0_hz.expect("tone window should be voiced");
            assert!((hz_to_midi(f0) - 69.0).abs() < 0.2);
            assert!(frame.confidence > 0.8);
        }

        // Windows fully inside the silence
        for frame in frames.iter().filter(|f| f.time_sec > 0.5) {
            assert_eq!(frame.f0_hz, None);
            assert_eq!(frame.confidence, 0.0);
            assert_eq!(frame.energy, 0.0);
        }
    }

    #[test]
    fn test_energy_gate_suppresses_estimation() {
        let audio = generate_tone_then_silence(440.0, 44100, 0.2, 0.0);
        let frames = pass_1::scan(&audio, 44100, 2048, 512, 0.9, &PitchParams::default());
        assert!(!frames.is_empty());
        assert!(frames.iter().all(|f| f.f0_hz.is_none() && f.energy > 0.2));
    }

    #[test]
    fn test_run_populates_state() {
        let config = Config::default();
        let audio = generate_tone_then_silence(220.0, 44100, 0.3, 0.1);
        let mut state = TranscriptionState::from_samples(audio, 44100, &config).unwrap();
        pass_1::run(&mut state, &config).unwrap();
        assert!(!state.frames.is_empty());
        assert!(state.frames.iter().any(|f| f.f0_hz.is_some()));
        assert!(state.notes.is_empty());
    }
}

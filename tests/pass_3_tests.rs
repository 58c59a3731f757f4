//! Validation tests for Pass 3: Grid Quantization

use hum2midi::analysis::NoteEvent;
use hum2midi::config::{Config, QuantizeConfig};
use hum2midi::passes::pass_3::{self, quantize_notes};
use hum2midi::TranscriptionState;

/// Slightly late and early notes around a 120 bpm sixteenth grid
fn generate_loose_notes() -> Vec<NoteEvent> {
    vec![
        NoteEvent {
            start_sec: 0.012,
            end_sec: 0.240,
            pitch: 60,
            velocity: 90,
        },
        NoteEvent {
            start_sec: 0.245,
            end_sec: 0.51,
            pitch: 62,
            velocity: 80,
        },
        NoteEvent {
            start_sec: 0.49,
            end_sec: 0.98,
            pitch: 64,
            velocity: 70,
        },
    ]
}

fn enabled() -> QuantizeConfig {
    QuantizeConfig {
        enabled: true,
        ..QuantizeConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_strength_lands_on_grid() {
        let result = quantize_notes(&generate_loose_notes(), 120.0, &enabled());
        let grid = 0.125f32;
        for note in &result.quantized_notes {
            let steps = note.start_sec / grid;
            assert!((steps - steps.round()).abs() < 1e-4, "{:?}", note);
        }
        assert!(result.max_drift_ms <= 20.0 + 1e-3);
    }

    #[test]
    fn test_half_strength_moves_halfway() {
        let options = QuantizeConfig {
            strength: 0.5,
            ..enabled()
        };
        let notes = [NoteEvent {
            start_sec: 0.26,
            end_sec: 0.49,
            pitch: 60,
            velocity: 100,
        }];
        let result = quantize_notes(&notes, 120.0, &options);
        let q = result.quantized_notes[0];
        assert!((q.start_sec - 0.255).abs() < 1e-5);
        assert!((q.end_sec - 0.495).abs() < 1e-5);
    }

    #[test]
    fn test_output_sorted_and_pitch_and_velocity_kept() {
        let result = quantize_notes(&generate_loose_notes(), 120.0, &enabled());
        let pitches: Vec<u8> = result.quantized_notes.iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![60, 62, 64]);
        let velocities: Vec<u8> = result.quantized_notes.iter().map(|n| n.velocity).collect();
        assert_eq!(velocities, vec![90, 80, 70]);
        for pair in result.quantized_notes.windows(2) {
            assert!(pair[0].start_sec <= pair[1].start_sec);
        }
    }

    #[test]
    fn test_same_pitch_overlap_is_trimmed() {
        let notes = [
            NoteEvent {
                start_sec: 0.0,
                end_sec: 0.26,
                pitch: 67,
                velocity: 100,
            },
            NoteEvent {
                start_sec: 0.24,
                end_sec: 0.5,
                pitch: 67,
                velocity: 100,
            },
        ];
        let options = QuantizeConfig {
            subdivisions_per_beat: 2,
            ..enabled()
        };
        // 0.25s grid: first end snaps to 0.25, second start to 0.25
        let result = quantize_notes(&notes, 120.0, &options);
        assert_eq!(result.quantized_notes.len(), 2);
        assert!(result.quantized_notes[0].end_sec <= result.quantized_notes[1].start_sec);
    }

    #[test]
    fn test_run_is_noop_when_disabled() {
        let config = Config::default();
        let mut state = TranscriptionState::from_samples(vec![0.0; 4096], 44100, &config).unwrap();
        state.notes = generate_loose_notes();
        pass_3::run(&mut state, &config).unwrap();
        assert_eq!(state.notes, generate_loose_notes());
    }

    #[test]
    fn test_run_quantizes_when_enabled() {
        let mut config = Config::default();
        config.quantize.enabled = true;
        let mut state = TranscriptionState::from_samples(vec![0.0; 4096], 44100, &config).unwrap();
        state.notes = generate_loose_notes();
        pass_3::run(&mut state, &config).unwrap();
        assert_eq!(state.notes[0].start_sec, 0.0);
    }
}

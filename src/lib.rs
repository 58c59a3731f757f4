//! Monophonic Audio-to-MIDI Transcription
//!
//! Estimates a pitch per analysis frame (YIN), segments the frame stream into
//! notes and serializes them as a Standard MIDI File and a synthesized WAV
//! preview.

pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod midi;
pub mod passes;
pub mod pitch;
pub mod qa;
pub mod render;
pub mod timeline;
pub mod wav;

pub use analysis::{NoteEvent, PitchFrame};
pub use audio::TranscriptionState;
pub use config::Config;
pub use error::{Result, TranscribeError};
pub use render::Waveform;

use std::path::{Path, PathBuf};

/// Files written by [`Hum2Midi::process`]
#[derive(Debug, Clone)]
pub struct ExportedFiles {
    pub midi: PathBuf,
    pub wav: Option<PathBuf>,
    pub analysis: Option<PathBuf>,
}

/// Main processing pipeline for audio-to-MIDI conversion
pub struct Hum2Midi {
    config: Config,
}

impl Hum2Midi {
    /// Create a new processor with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Process an audio file and write MIDI, WAV and analysis output
    pub fn process<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_dir: Q,
    ) -> Result<(TranscriptionState, ExportedFiles)> {
        let mut state = TranscriptionState::load(input_path, &self.config)?;
        self.run_pipeline(&mut state)?;
        let files = self.export_results(&state, output_dir.as_ref())?;
        Ok((state, files))
    }

    /// Transcribe an in-memory mono buffer without touching the filesystem
    pub fn transcribe_samples(&self, samples: Vec<f32>, sample_rate: u32) -> Result<TranscriptionState> {
        let mut state = TranscriptionState::from_samples(samples, sample_rate, &self.config)?;
        self.run_pipeline(&mut state)?;
        Ok(state)
    }

    /// Execute the complete multi-pass pipeline
    fn run_pipeline(&self, state: &mut TranscriptionState) -> Result<()> {
        // Pass 0: Preflight
        passes::pass_0::run(state, &self.config)?;

        // Pass 1: Frame Scanning
        passes::pass_1::run(state, &self.config)?;

        // Pass 2: Note Segmentation
        passes::pass_2::run(state, &self.config)?;

        // Pass 3: Grid Quantization
        passes::pass_3::run(state, &self.config)?;

        Ok(())
    }

    /// Export MIDI, rendering and analysis results
    fn export_results(&self, state: &TranscriptionState, output_dir: &Path) -> Result<ExportedFiles> {
        let midi = midi::export_midi(&state.notes, output_dir, &self.config)?;

        let wav = if self.config.render.enabled {
            Some(render::export_wav(&state.notes, output_dir, &self.config)?)
        } else {
            None
        };

        let analysis = if self.config.qa.write_analysis {
            analysis::export_analysis(state, output_dir)?;
            Some(output_dir.join("analysis.json"))
        } else {
            None
        };

        // QA output is diagnostic only
        if let Err(e) = qa::generate_artifacts(state, output_dir, &self.config) {
            log::warn!("Skipping QA artifacts: {}", e);
        }

        Ok(ExportedFiles { midi, wav, analysis })
    }
}

/// Validate configuration and input files
pub fn validate_input<P: AsRef<Path>>(input_path: P, config: &Config) -> Result<()> {
    config::validate_config(config)?;
    audio::validate_audio_file(input_path, config)?;
    Ok(())
}

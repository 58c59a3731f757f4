use clap::{Parser, Subcommand};
use hum2midi::{validate_input, Config, Hum2Midi, Waveform};
use std::path::PathBuf;

/// Monophonic Audio-to-MIDI Transcription
#[derive(Parser)]
#[command(name = "hum2midi")]
#[command(about = "Transcribe monophonic recordings (voice, whistling, solo instruments) to MIDI")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transcribe an audio file to MIDI and a rendered preview
    Transcribe {
        /// Input audio file (WAV)
        input: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Custom configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Tempo written to the MIDI file
        #[arg(long)]
        bpm: Option<f32>,

        /// Oscillator used for the WAV preview
        #[arg(long, value_enum)]
        waveform: Option<Waveform>,

        /// Skip the WAV preview
        #[arg(long)]
        no_render: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Quiet output
        #[arg(short, long)]
        quiet: bool,
    },
    /// Render a saved note list (notes JSON or analysis.json) to WAV
    Render {
        /// Notes file
        notes: PathBuf,

        /// Output WAV file
        #[arg(short, long, default_value = "rendering.wav")]
        output: PathBuf,

        /// Custom configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Oscillator shape
        #[arg(long, value_enum)]
        waveform: Option<Waveform>,
    },
    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config: PathBuf,
    },
    /// Show default configuration
    ShowConfig,
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_or_default(path: Option<PathBuf>) -> anyhow::Result<Config> {
    Ok(match path {
        Some(path) => hum2midi::config::load_config(path)?,
        None => Config::default(),
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Transcribe {
            input,
            output,
            config,
            bpm,
            waveform,
            no_render,
            verbose,
            quiet,
        } => {
            if verbose && quiet {
                anyhow::bail!("Cannot specify both --verbose and --quiet");
            }
            init_logging(verbose, quiet);

            let mut config = load_or_default(config)?;
            if let Some(bpm) = bpm {
                config.export.bpm = bpm;
            }
            if let Some(waveform) = waveform {
                config.render.waveform = waveform;
            }
            if no_render {
                config.render.enabled = false;
            }

            validate_input(&input, &config)?;

            let processor = Hum2Midi::new(config);

            if !quiet {
                println!("Processing {}...", input.display());
            }

            let (state, files) = processor.process(&input, &output)?;

            if !quiet {
                println!("Transcribed {} notes", state.notes.len());
                println!("MIDI saved to {}", files.midi.display());
                if let Some(wav) = files.wav {
                    println!("Preview saved to {}", wav.display());
                }
            }
        }
        Commands::Render {
            notes,
            output,
            config,
            waveform,
        } => {
            init_logging(false, false);

            let mut config = load_or_default(config)?;
            if let Some(waveform) = waveform {
                config.render.waveform = waveform;
            }
            hum2midi::config::validate_config(&config)?;

            let notes = hum2midi::analysis::load_notes(&notes)?;
            hum2midi::render::export_wav_to(&notes, &output, &config)?;
            println!("Rendered {} notes to {}", notes.len(), output.display());
        }
        Commands::ValidateConfig { config } => {
            let config = hum2midi::config::load_config(config)?;
            println!("Configuration is valid");
            if let Ok(json) = serde_json::to_string_pretty(&config) {
                println!("{}", json);
            }
        }
        Commands::ShowConfig => {
            let config = Config::default();
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
    }

    Ok(())
}

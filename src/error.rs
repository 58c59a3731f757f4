//! Error types for the transcription system

use thiserror::Error;

/// Custom error type for transcription and export
#[derive(Debug, Error)]
pub enum TranscribeError {
    /// E001: Invalid audio format (e.g., unsupported container or bit depth)
    #[error("E001: Invalid audio format - {0}")]
    InvalidAudioFormat(String),
    /// E002: Unsupported sample rate
    #[error("E002: Unsupported sample rate {0} Hz")]
    UnsupportedSampleRate(u32),
    /// E003: Configuration validation failed
    #[error("E003: Configuration validation failed - {0}")]
    ConfigValidationFailed(String),
    /// E005: Audio file I/O error
    #[error("E005: Audio file I/O error - {0}")]
    AudioFileError(String),
    /// E010: MIDI export error
    #[error("E010: MIDI export error - {0}")]
    MidiExportError(String),
    /// E011: Analysis export error
    #[error("E011: Analysis export error - {0}")]
    AnalysisExportError(String),
    /// E012: QA artifact generation error
    #[error("E012: QA artifact generation error - {0}")]
    QaGenerationError(String),
    /// E013: Input validation error
    #[error("E013: Input validation error - {0}")]
    InputValidationError(String),
    /// E016: WAV render export error
    #[error("E016: WAV render error - {0}")]
    RenderExportError(String),
}

impl From<std::io::Error> for TranscribeError {
    fn from(err: std::io::Error) -> Self {
        TranscribeError::AudioFileError(format!("File I/O error: {}", err))
    }
}

impl From<serde_json::Error> for TranscribeError {
    fn from(err: serde_json::Error) -> Self {
        TranscribeError::AnalysisExportError(format!("JSON serialization error: {}", err))
    }
}

impl From<hound::Error> for TranscribeError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => TranscribeError::AudioFileError(e.to_string()),
            other => TranscribeError::InvalidAudioFormat(other.to_string()),
        }
    }
}

/// Result type alias for transcription operations
pub type Result<T> = std::result::Result<T, TranscribeError>;

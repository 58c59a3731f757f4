//! Transcription passes, run in order by [`crate::Hum2Midi`]

pub mod pass_0;
pub mod pass_1;
pub mod pass_2;
pub mod pass_3;

//! Microphone capture, the recording control and the dictation feed.
//!
//! Nothing in here is fatal to an interview: failures are reported to the
//! session as [`MediaError`] / [`RecognitionError`] and shown as a notice
//! while typed answers keep working.
//!
//! ```text
//! cpal callback ──AudioChunk──▶ Recorder (collects, times)
//!                └─AudioChunk──▶ Dictation worker
//!                                  ├─ to_mono_16k
//!                                  ├─ SpeechRecognizer::transcribe (per window)
//!                                  └─ SessionCommand::TranscriptUpdated { index, text }
//! ```

pub mod capture;
pub mod dictation;
pub mod recognizer;
pub mod recorder;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use capture::{to_mono_16k, AudioChunk, Microphone, StreamHandle, TARGET_SAMPLE_RATE};
pub use dictation::Dictation;
pub use recognizer::{SpeechRecognizer, WhisperRecognizer};
pub use recorder::Recorder;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Microphone and recognizer availability problems.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("microphone access was denied")]
    PermissionDenied,

    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("audio device error: {0}")]
    Device(String),
}

impl MediaError {
    /// Message shown to the candidate.
    pub fn user_message(&self) -> &'static str {
        match self {
            MediaError::PermissionDenied => {
                "Microphone access was denied. Please allow microphone access."
            }
            MediaError::NoDevice => {
                "No microphone was found. Please ensure your microphone is connected."
            }
            MediaError::Unsupported(_) => "Speech recognition is not available on this system.",
            MediaError::Device(_) => "The microphone could not be used. Please try again.",
        }
    }
}

/// Transient speech-recognition failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    #[error("no speech detected")]
    NoSpeech,

    #[error("speech recognition failed: {0}")]
    Engine(String),
}

impl RecognitionError {
    pub fn user_message(&self) -> &'static str {
        match self {
            RecognitionError::NoSpeech => "No speech was detected. Please try again.",
            RecognitionError::Engine(_) => "Speech recognition failed. Please try again.",
        }
    }
}

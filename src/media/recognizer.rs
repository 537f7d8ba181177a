//! Speech recognizers used by the dictation worker.
//!
//! [`SpeechRecognizer`] is object-safe and `Send + Sync` so one loaded model
//! can sit behind an `Arc<dyn SpeechRecognizer>` and be reused by every
//! dictation run.  [`WhisperRecognizer`] wraps a `whisper_rs::WhisperContext`
//! and creates a fresh `WhisperState` per call.

use std::path::Path;

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::{MediaError, RecognitionError};
use crate::config::SpeechConfig;

/// Shortest window Whisper is given; shorter input is padded with silence.
pub const MIN_WINDOW_SAMPLES: usize = 16_000;

/// Transcribes 16 kHz mono audio.
pub trait SpeechRecognizer: Send + Sync {
    /// Text spoken in `audio`, or an empty string for silence.
    fn transcribe(&self, audio: &[f32]) -> Result<String, RecognitionError>;
}

// ---------------------------------------------------------------------------
// WhisperRecognizer
// ---------------------------------------------------------------------------

pub struct WhisperRecognizer {
    ctx: WhisperContext,
    language: Option<String>,
    threads: i32,
}

impl std::fmt::Debug for WhisperRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperRecognizer")
            .field("language", &self.language)
            .field("threads", &self.threads)
            .finish_non_exhaustive()
    }
}

impl WhisperRecognizer {
    /// Load the GGML model at `model_path`.
    ///
    /// A missing or unreadable model means dictation is unavailable, reported
    /// as [`MediaError::Unsupported`].
    pub fn load(model_path: impl AsRef<Path>, config: &SpeechConfig) -> Result<Self, MediaError> {
        let path = model_path.as_ref();
        if !path.exists() {
            return Err(MediaError::Unsupported(format!(
                "speech model not found: {}",
                path.display()
            )));
        }
        let path_str = path.to_str().ok_or_else(|| {
            MediaError::Unsupported(format!("non-UTF-8 model path: {}", path.display()))
        })?;

        let mut params = WhisperContextParameters::default();
        params.use_gpu = config.use_gpu;
        let ctx = WhisperContext::new_with_params(path_str, params)
            .map_err(|e| MediaError::Unsupported(format!("failed to load speech model: {e}")))?;

        log::info!("dictation: loaded model {}", path.display());
        Ok(Self {
            ctx,
            language: (config.language != "auto").then(|| config.language.clone()),
            threads: inference_threads(),
        })
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn transcribe(&self, audio: &[f32]) -> Result<String, RecognitionError> {
        let mut padded;
        let audio = if audio.len() < MIN_WINDOW_SAMPLES {
            padded = audio.to_vec();
            padded.resize(MIN_WINDOW_SAMPLES, 0.0);
            &padded[..]
        } else {
            audio
        };

        let mut fp = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        fp.set_language(self.language.as_deref());
        fp.set_n_threads(self.threads);
        fp.set_no_context(true);
        fp.set_print_progress(false);
        fp.set_print_realtime(false);
        fp.set_print_special(false);
        fp.set_print_timestamps(false);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| RecognitionError::Engine(e.to_string()))?;
        state
            .full(fp, audio)
            .map_err(|e| RecognitionError::Engine(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| RecognitionError::Engine(e.to_string()))?;

        let mut text = String::new();
        for i in 0..n_segments {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| RecognitionError::Engine(format!("segment {i}: {e}")))?;
            text.push_str(&segment);
        }
        Ok(text.trim().to_string())
    }
}

/// Whisper scales poorly past eight threads.
fn inference_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8))
        .unwrap_or(4) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_is_unsupported() {
        let err = WhisperRecognizer::load("/nonexistent/ggml-base.en.bin", &SpeechConfig::default())
            .unwrap_err();
        assert!(matches!(err, MediaError::Unsupported(_)), "got {err:?}");
        assert_eq!(
            err.user_message(),
            "Speech recognition is not available on this system."
        );
    }

    #[test]
    fn recognizer_is_object_safe() {
        struct Silent;
        impl SpeechRecognizer for Silent {
            fn transcribe(&self, _: &[f32]) -> Result<String, RecognitionError> {
                Ok(String::new())
            }
        }
        let r: Box<dyn SpeechRecognizer> = Box::new(Silent);
        assert_eq!(r.transcribe(&[0.0; 10]).unwrap(), "");
    }

    #[test]
    fn thread_count_is_bounded() {
        let t = inference_threads();
        assert!((1..=8).contains(&t));
    }
}

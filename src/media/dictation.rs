//! Dictation feed: turns microphone audio into transcript updates.
//!
//! A worker thread buffers 16 kHz mono audio, transcribes it in fixed
//! windows and sends the *whole* accumulated transcript to the session after
//! every window that produced text.  The session overwrites the current
//! answer with it, so the transcript is seeded with the answer that was
//! already there when dictation started.
//!
//! Silent windows are skipped without calling the recognizer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;

use tokio::sync::mpsc as tokio_mpsc;

use super::capture::{rms, to_mono_16k, AudioChunk, TARGET_SAMPLE_RATE};
use super::recognizer::{SpeechRecognizer, MIN_WINDOW_SAMPLES};
use super::RecognitionError;
use crate::session::{SessionCommand, SessionEvent};

/// Windows quieter than this RMS are treated as silence.
pub const SILENCE_RMS: f32 = 0.01;

// ---------------------------------------------------------------------------
// Dictation
// ---------------------------------------------------------------------------

/// A running dictation worker for one question.
pub struct Dictation {
    tap: Option<mpsc::Sender<AudioChunk>>,
    cancelled: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl Dictation {
    /// Start a worker for question `index` that appends to `seed` and
    /// reports into `session_tx`.
    pub fn start(
        recognizer: Arc<dyn SpeechRecognizer>,
        window_secs: f32,
        index: usize,
        seed: String,
        session_tx: tokio_mpsc::Sender<SessionEvent>,
    ) -> Self {
        let (tap, chunks) = mpsc::channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let window_samples = window_samples(window_secs);

        let worker = {
            let cancelled = Arc::clone(&cancelled);
            std::thread::Builder::new()
                .name("dictation".into())
                .spawn(move || {
                    let transcript = Transcript::new(index, seed);
                    run_worker(chunks, recognizer.as_ref(), window_samples, transcript, &cancelled, &session_tx)
                })
        };
        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("dictation: could not spawn worker: {e}");
                None
            }
        };

        log::info!("dictation: started for question {index} ({window_samples} samples per window)");
        Self {
            tap: Some(tap),
            cancelled,
            worker,
        }
    }

    /// Sender the recorder forwards captured chunks into.
    pub fn tap(&self) -> Option<mpsc::Sender<AudioChunk>> {
        self.tap.clone()
    }

    /// Stop accepting audio.  The worker still transcribes what it already
    /// has once the recorder's tap closes; poll [`is_running`](Self::is_running)
    /// to see when the last update has been sent.
    pub fn finish(&mut self) {
        self.tap = None;
    }

    /// Stop immediately; nothing more is sent to the session.
    pub fn cancel(self) {
        drop(self);
    }

    /// `true` until the worker has exited.
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }
}

impl Drop for Dictation {
    fn drop(&mut self) {
        if self.is_running() {
            self.cancelled.store(true, Ordering::SeqCst);
            log::debug!("dictation: cancelled");
        }
    }
}

fn window_samples(window_secs: f32) -> usize {
    let samples = (window_secs.max(0.0) * TARGET_SAMPLE_RATE as f32) as usize;
    samples.max(MIN_WINDOW_SAMPLES)
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Accumulated text for one question.
pub struct Transcript {
    index: usize,
    text: String,
    windows: usize,
    heard_speech: bool,
}

impl Transcript {
    pub fn new(index: usize, seed: String) -> Self {
        Self {
            index,
            text: seed,
            windows: 0,
            heard_speech: false,
        }
    }
}

/// Worker loop; returns when the chunk channel closes, the session goes
/// away or `cancelled` is set.
pub fn run_worker(
    chunks: mpsc::Receiver<AudioChunk>,
    recognizer: &dyn SpeechRecognizer,
    window_samples: usize,
    mut transcript: Transcript,
    cancelled: &AtomicBool,
    session_tx: &tokio_mpsc::Sender<SessionEvent>,
) {
    let mut pending: Vec<f32> = Vec::with_capacity(window_samples);

    for chunk in chunks {
        if cancelled.load(Ordering::SeqCst) {
            return;
        }
        pending.extend(to_mono_16k(&chunk));

        while pending.len() >= window_samples {
            let window: Vec<f32> = pending.drain(..window_samples).collect();
            if !process_window(&window, recognizer, &mut transcript, cancelled, session_tx) {
                return;
            }
        }
    }

    // Tail shorter than a window, at least one second long.
    if pending.len() >= MIN_WINDOW_SAMPLES && !cancelled.load(Ordering::SeqCst) {
        process_window(&pending, recognizer, &mut transcript, cancelled, session_tx);
    }
    log::debug!("dictation: worker done after {} windows", transcript.windows);
}

/// Returns `false` when the worker should stop.
fn process_window(
    window: &[f32],
    recognizer: &dyn SpeechRecognizer,
    transcript: &mut Transcript,
    cancelled: &AtomicBool,
    session_tx: &tokio_mpsc::Sender<SessionEvent>,
) -> bool {
    transcript.windows += 1;
    let first_window = transcript.windows == 1;

    let text = if rms(window) < SILENCE_RMS {
        String::new()
    } else {
        match recognizer.transcribe(window) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("dictation: {e}");
                return send(session_tx, cancelled, SessionCommand::RecognitionFailed(e));
            }
        }
    };

    if cancelled.load(Ordering::SeqCst) {
        return false;
    }

    let text = text.trim();
    if text.is_empty() {
        if first_window && !transcript.heard_speech {
            return send(
                session_tx,
                cancelled,
                SessionCommand::RecognitionFailed(RecognitionError::NoSpeech),
            );
        }
        return true;
    }

    transcript.heard_speech = true;
    if !transcript.text.is_empty() && !transcript.text.ends_with(char::is_whitespace) {
        transcript.text.push(' ');
    }
    transcript.text.push_str(text);
    log::debug!("dictation: +{} chars", text.len());

    send(
        session_tx,
        cancelled,
        SessionCommand::TranscriptUpdated {
            index: transcript.index,
            text: transcript.text.clone(),
        },
    )
}

fn send(
    session_tx: &tokio_mpsc::Sender<SessionEvent>,
    cancelled: &AtomicBool,
    command: SessionCommand,
) -> bool {
    if cancelled.load(Ordering::SeqCst) {
        return false;
    }
    if session_tx.blocking_send(command.into()).is_err() {
        log::debug!("dictation: session gone, stopping");
        return false;
    }
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

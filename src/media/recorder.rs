//! The recording control.
//!
//! [`Recorder`] owns the microphone stream while recording.  A collector
//! thread drains the capture channel, counts the 16 kHz mono samples
//! captured and forwards every chunk to an optional tap (the dictation
//! worker).  Stopping drops the stream, which closes the channel and lets
//! the collector return its count through its `JoinHandle`.

use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::capture::{to_mono_16k, AudioChunk, Microphone, StreamHandle, TARGET_SAMPLE_RATE};
use super::MediaError;

#[derive(Default)]
pub struct Recorder {
    stream: Option<StreamHandle>,
    collector: Option<JoinHandle<usize>>,
    started_at: Option<Instant>,
    last_elapsed: Duration,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start recording from `mic`, forwarding chunks to `tap` if given.
    /// Starting while already recording is a no-op.
    pub fn start(
        &mut self,
        mic: &Microphone,
        tap: Option<mpsc::Sender<AudioChunk>>,
    ) -> Result<(), MediaError> {
        if self.is_recording() {
            return Ok(());
        }
        let (tx, rx) = mpsc::channel();
        let stream = mic.start(tx)?;
        self.begin(Some(stream), rx, tap);
        Ok(())
    }

    fn begin(
        &mut self,
        stream: Option<StreamHandle>,
        rx: mpsc::Receiver<AudioChunk>,
        tap: Option<mpsc::Sender<AudioChunk>>,
    ) {
        let collector = std::thread::Builder::new()
            .name("recorder".into())
            .spawn(move || collect(rx, tap));

        match collector {
            Ok(handle) => {
                self.stream = stream;
                self.collector = Some(handle);
                self.started_at = Some(Instant::now());
                self.last_elapsed = Duration::ZERO;
                log::info!("recorder: started");
            }
            Err(e) => log::error!("recorder: could not spawn collector: {e}"),
        }
    }

    /// Stop recording and return how much audio was captured.
    pub fn stop(&mut self) -> Duration {
        let Some(started_at) = self.started_at.take() else {
            return Duration::ZERO;
        };
        self.last_elapsed = started_at.elapsed();
        drop(self.stream.take());

        let samples = self
            .collector
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or(0);
        let captured = Duration::from_secs_f64(samples as f64 / f64::from(TARGET_SAMPLE_RATE));
        log::info!(
            "recorder: stopped after {:.1}s, {:.1}s of audio",
            self.last_elapsed.as_secs_f32(),
            captured.as_secs_f32()
        );
        captured
    }

    pub fn is_recording(&self) -> bool {
        self.started_at.is_some()
    }

    /// Time since `start`, or the length of the last recording once stopped.
    pub fn elapsed(&self) -> Duration {
        self.started_at
            .map(|t| t.elapsed())
            .unwrap_or(self.last_elapsed)
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.stop();
    }
}

fn collect(rx: mpsc::Receiver<AudioChunk>, mut tap: Option<mpsc::Sender<AudioChunk>>) -> usize {
    let mut samples = 0;
    for chunk in rx {
        samples += to_mono_16k(&chunk).len();
        if let Some(t) = &tap {
            if t.send(chunk).is_err() {
                log::debug!("recorder: tap closed");
                tap = None;
            }
        }
    }
    samples
}

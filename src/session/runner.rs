//! Session driver: feeds queued events into [`InterviewSession`] and carries
//! out the effects it asks for.
//!
//! ```text
//! spawn_session()
//!   └─▶ SessionDriver::run()                       tokio task
//!         ├─ api.generate_questions ─▶ questions_loaded / questions_failed
//!         └─ loop over SessionEvent (mpsc)
//!               ├─ lock, apply event, unlock
//!               └─ effects
//!                    ├─ ArmTimer(s)   → Countdown::arm      (Tick events)
//!                    ├─ DisarmTimer   → Countdown::disarm
//!                    └─ Submit(pairs) → spawn submit_all    (EvaluationsFinished)
//!
//! SharedSession (Arc<Mutex<InterviewSession>>) ←── read by the egui view
//! ```
//!
//! The lock is never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::api::{InterviewApi, InterviewConfig};
use crate::evaluation::{submit_all, QaPair};

use super::event::{SessionCommand, SessionEvent};
use super::machine::{Effect, InterviewSession};
use super::timer::Countdown;

/// Capacity of the per-session event queue.
pub const EVENT_QUEUE_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// SharedSession
// ---------------------------------------------------------------------------

/// Session state shared between the driver and the UI.
pub type SharedSession = Arc<Mutex<InterviewSession>>;

/// Lock the session, recovering the guard if a previous holder panicked.
pub fn lock_session(shared: &SharedSession) -> MutexGuard<'_, InterviewSession> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// SessionDriver
// ---------------------------------------------------------------------------

/// Owns the collaborators of one session: the countdown, the API client and
/// the in-flight evaluation batch.
pub struct SessionDriver {
    state: SharedSession,
    api: Arc<dyn InterviewApi>,
    events_tx: mpsc::Sender<SessionEvent>,
    timer: Option<Countdown>,
    submission: Option<JoinHandle<()>>,
}

impl SessionDriver {
    /// `events_tx` must feed the receiver later passed to [`run`](Self::run);
    /// the countdown and the evaluation task report through it.
    pub fn new(
        state: SharedSession,
        api: Arc<dyn InterviewApi>,
        events_tx: mpsc::Sender<SessionEvent>,
    ) -> Self {
        Self {
            state,
            api,
            events_tx,
            timer: None,
            submission: None,
        }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Fetch the questions, then apply events until the session reaches a
    /// terminal phase or a [`SessionCommand::Close`] arrives.
    pub async fn run(mut self, mut events_rx: mpsc::Receiver<SessionEvent>) {
        self.load_questions().await;

        while !self.is_finished() {
            let Some(event) = events_rx.recv().await else {
                log::info!("session: event queue closed");
                break;
            };
            if !self.handle_event(event) {
                log::info!("session: closed by the view");
                break;
            }
        }

        self.disarm_timer();
        let phase = lock_session(&self.state).phase();
        log::info!("session: driver finished in phase {phase:?}");
    }

    fn is_finished(&self) -> bool {
        lock_session(&self.state).phase().is_terminal()
    }

    async fn load_questions(&mut self) {
        let config = lock_session(&self.state).config().clone();
        log::info!(
            "session: requesting questions (topic={:?}, difficulty={}, {} min)",
            config.topic,
            config.difficulty.label(),
            config.duration
        );

        let result = self.api.generate_questions(&config).await;
        let effects = {
            let mut session = lock_session(&self.state);
            match result {
                Ok(questions) => session.questions_loaded(questions),
                Err(e) => {
                    session.questions_failed(e);
                    Vec::new()
                }
            }
        };
        self.execute(effects);
    }

    // -----------------------------------------------------------------------
    // Event handling
    // -----------------------------------------------------------------------

    /// Apply one event.  Returns `false` when the driver should stop.
    fn handle_event(&mut self, event: SessionEvent) -> bool {
        let effects = {
            let mut session = lock_session(&self.state);
            match event {
                SessionEvent::Tick { remaining } => {
                    log::trace!("session: tick, timer reports {remaining}s left");
                    session.tick()
                }
                SessionEvent::EvaluationsFinished(result) => {
                    self.submission = None;
                    session.submission_finished(result);
                    Vec::new()
                }
                SessionEvent::Command(command) => match command {
                    SessionCommand::Next => session.next(),
                    SessionCommand::Previous => {
                        session.previous();
                        Vec::new()
                    }
                    SessionCommand::AnswerChanged(text) => {
                        session.answer_changed(text);
                        Vec::new()
                    }
                    SessionCommand::TranscriptUpdated { index, text } => {
                        session.transcript_updated(index, text);
                        Vec::new()
                    }
                    SessionCommand::RecordingChanged(recording) => {
                        session.recording_changed(recording);
                        Vec::new()
                    }
                    SessionCommand::MediaFailed(e) => {
                        log::warn!("session: media failure: {e}");
                        session.set_notice(e.user_message());
                        Vec::new()
                    }
                    SessionCommand::RecognitionFailed(e) => {
                        log::warn!("session: recognition failure: {e}");
                        session.set_notice(e.user_message());
                        Vec::new()
                    }
                    SessionCommand::DismissNotice => {
                        session.dismiss_notice();
                        Vec::new()
                    }
                    SessionCommand::Close => return false,
                },
            }
        };
        self.execute(effects);
        true
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ArmTimer(secs) => {
                    self.disarm_timer();
                    self.timer = Some(Countdown::arm(secs, self.events_tx.clone()));
                }
                Effect::DisarmTimer => self.disarm_timer(),
                Effect::Submit(pairs) => self.submit(pairs),
            }
        }
    }

    fn submit(&mut self, pairs: Vec<QaPair>) {
        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        self.submission = Some(tokio::spawn(async move {
            let result = submit_all(api, pairs).await;
            if tx.send(SessionEvent::EvaluationsFinished(result)).await.is_err() {
                log::debug!("evaluation: session gone before results arrived");
            }
        }));
    }

    fn disarm_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.disarm();
        }
    }
}

impl Drop for SessionDriver {
    fn drop(&mut self) {
        if let Some(task) = self.submission.take() {
            task.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// SessionHandle
// ---------------------------------------------------------------------------

/// The view's handle on a running session.
///
/// Dropping the handle stops the driver, its countdown and any evaluation
/// still in flight.
pub struct SessionHandle {
    shared: SharedSession,
    tx: mpsc::Sender<SessionEvent>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Queue a command without blocking the UI thread.  Returns `false` when
    /// the command was dropped.
    pub fn send(&self, command: SessionCommand) -> bool {
        match self.tx.try_send(command.into()) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                log::warn!("session: event queue full, dropping {event:?}");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Read the current state under the lock.
    pub fn with<R>(&self, f: impl FnOnce(&InterviewSession) -> R) -> R {
        f(&lock_session(&self.shared))
    }

    /// Owned copy of the current state.
    pub fn snapshot(&self) -> InterviewSession {
        lock_session(&self.shared).clone()
    }

    /// Sender for collaborators that report into this session (dictation).
    pub fn sender(&self) -> mpsc::Sender<SessionEvent> {
        self.tx.clone()
    }

    /// `true` while the driver task is still running.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start a session for `config` on `runtime`.
pub fn spawn_session(
    config: InterviewConfig,
    api: Arc<dyn InterviewApi>,
    runtime: &tokio::runtime::Handle,
) -> SessionHandle {
    let shared: SharedSession = Arc::new(Mutex::new(InterviewSession::new(config)));
    let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);

    let driver = SessionDriver::new(Arc::clone(&shared), api, tx.clone());
    let task = runtime.spawn(driver.run(rx));

    SessionHandle { shared, tx, task }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

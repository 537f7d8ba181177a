//! Interview session core: answer store, countdown, state machine and the
//! async driver that connects them.
//!
//! # Architecture
//!
//! ```text
//! SessionCommand (UI, dictation) ─┐
//! Tick (Countdown)               ─┼─▶ mpsc ─▶ SessionDriver::run()
//! EvaluationsFinished (JoinSet)  ─┘                │
//!                                                  ▼
//!                                   InterviewSession (pure state machine)
//!                                                  │ Vec<Effect>
//!                                                  ▼
//!                                   arm / disarm Countdown, spawn submit_all
//!
//! SharedSession (Arc<Mutex<InterviewSession>>) ←─── read by egui update()
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use interview_coach::api::{Difficulty, HttpInterviewApi, InterviewConfig};
//! use interview_coach::config::ApiConfig;
//! use interview_coach::session::{spawn_session, SessionCommand};
//!
//! let runtime = tokio::runtime::Runtime::new().expect("runtime");
//! let api = Arc::new(HttpInterviewApi::from_config(&ApiConfig::default()));
//!
//! let config = InterviewConfig {
//!     topic: "Rust".into(),
//!     experience: "2 years".into(),
//!     duration: 30,
//!     difficulty: Difficulty::Intermediate,
//! };
//! let session = spawn_session(config, api, runtime.handle());
//!
//! session.send(SessionCommand::AnswerChanged("Ownership means...".into()));
//! session.send(SessionCommand::Next);
//! println!("phase: {:?}", session.with(|s| s.phase()));
//! ```

pub mod answers;
pub mod event;
pub mod machine;
pub mod runner;
pub mod state;
pub mod timer;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use answers::AnswerStore;
pub use event::{SessionCommand, SessionEvent};
pub use machine::{Effect, InterviewSession};
pub use runner::{lock_session, spawn_session, SessionDriver, SessionHandle, SharedSession};
pub use state::{Phase, SessionError, SubmissionReason};
pub use timer::Countdown;

/// Format whole seconds as `mm:ss`.
///
/// ```
/// use interview_coach::session::format_clock;
///
/// assert_eq!(format_clock(1_800), "30:00");
/// assert_eq!(format_clock(65), "01:05");
/// assert_eq!(format_clock(0), "00:00");
/// ```
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

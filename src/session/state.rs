//! Session phase and session-level errors.
//!
//! ```text
//! Loading ──questions──▶ Active ──tick (last second)──▶ TimeUp ──▶ Processing
//!    │                    │  ▲                                       │
//!    │                    │  └── Next / Previous                     ├─ all ok ─▶ Complete
//!    │                    └──── Next on last question ──▶ Processing ┘
//!    └──fetch failed──▶ Errored ◀──────── any evaluation failed ─────┘
//! ```
//!
//! `Complete` and `Errored` are terminal.

use thiserror::Error;

use crate::api::ApiError;
use crate::evaluation::EvaluationError;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Lifecycle stage of one interview session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Questions are being fetched.
    #[default]
    Loading,
    /// The candidate is answering; the countdown is running.
    Active,
    /// The countdown reached zero; auto-submission is starting.
    TimeUp,
    /// All answers have been sent for evaluation.
    Processing,
    /// Every answer has feedback.
    Complete,
    /// Question fetch or evaluation failed.
    Errored,
}

impl Phase {
    /// `true` for phases with no outgoing transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Complete | Phase::Errored)
    }

    /// Short label for logs and the status line.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Loading => "Loading",
            Phase::Active => "Active",
            Phase::TimeUp => "Time up",
            Phase::Processing => "Processing",
            Phase::Complete => "Complete",
            Phase::Errored => "Error",
        }
    }
}

// ---------------------------------------------------------------------------
// SubmissionReason
// ---------------------------------------------------------------------------

/// Why the answers were submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionReason {
    /// The candidate pressed Next on the last question.
    Finished,
    /// The countdown expired.
    TimeUp,
}

impl SubmissionReason {
    /// Line shown above the results.
    pub fn summary(&self) -> &'static str {
        match self {
            SubmissionReason::Finished => "You finished before the time ran out.",
            SubmissionReason::TimeUp => "Time ran out; answers were submitted automatically.",
        }
    }
}

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// Fatal session errors; each one moves the session to [`Phase::Errored`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("question generation failed: {0}")]
    QuestionFetch(ApiError),

    #[error("answer evaluation failed: {0}")]
    Evaluation(EvaluationError),

    #[error("feedback missing for question {index}")]
    IncompleteFeedback { index: usize },
}

impl SessionError {
    /// Message shown to the candidate.  The `Display` form carries the
    /// technical detail and goes to the log.
    pub fn user_message(&self) -> &'static str {
        match self {
            SessionError::QuestionFetch(_) => "Failed to generate questions. Please try again.",
            SessionError::Evaluation(_) | SessionError::IncompleteFeedback { .. } => {
                "Failed to get feedback. Please try again."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_phase_is_loading() {
        assert_eq!(Phase::default(), Phase::Loading);
    }

    #[test]
    fn only_complete_and_errored_are_terminal() {
        let terminal: Vec<Phase> = [
            Phase::Loading,
            Phase::Active,
            Phase::TimeUp,
            Phase::Processing,
            Phase::Complete,
            Phase::Errored,
        ]
        .into_iter()
        .filter(Phase::is_terminal)
        .collect();
        assert_eq!(terminal, vec![Phase::Complete, Phase::Errored]);
    }

    #[test]
    fn submission_summary_mentions_expiry_only_for_time_up() {
        assert!(SubmissionReason::TimeUp.summary().contains("Time ran out"));
        assert!(!SubmissionReason::Finished.summary().contains("Time ran out"));
    }

    #[test]
    fn user_messages() {
        assert_eq!(
            SessionError::QuestionFetch(ApiError::Timeout).user_message(),
            "Failed to generate questions. Please try again."
        );
        assert_eq!(
            SessionError::IncompleteFeedback { index: 2 }.user_message(),
            "Failed to get feedback. Please try again."
        );
    }

    #[test]
    fn display_keeps_detail() {
        let e = SessionError::QuestionFetch(ApiError::Status(503));
        assert!(e.to_string().contains("503"));
    }
}

//! Events consumed by the session driver.
//!
//! Every input the session reacts to arrives as a [`SessionEvent`] on one
//! `tokio::sync::mpsc` queue, so timer ticks, UI commands, transcript
//! updates and the evaluation outcome are applied strictly one at a time.

use crate::evaluation::{EvaluationError, Feedback};
use crate::media::{MediaError, RecognitionError};

/// Commands from the UI and the media collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Advance to the next question, or submit on the last one.
    Next,
    /// Go back one question.
    Previous,
    /// The candidate edited the answer text for the current question.
    AnswerChanged(String),
    /// The dictation feed delivered its full accumulated transcript for
    /// question `index`.
    TranscriptUpdated { index: usize, text: String },
    /// The recording control started or stopped.
    RecordingChanged(bool),
    /// A microphone or camera problem; non-fatal.
    MediaFailed(MediaError),
    /// A transient speech-recognition problem; non-fatal.
    RecognitionFailed(RecognitionError),
    /// Clear the current media/recognition notice.
    DismissNotice,
    /// The view is going away; stop the driver.
    Close,
}

/// Everything delivered to the driver's queue.
#[derive(Debug)]
pub enum SessionEvent {
    Command(SessionCommand),
    /// One countdown second elapsed.  `remaining == 0` is the final,
    /// expiry tick; the countdown stops after sending it.
    Tick { remaining: u64 },
    /// The evaluation batch resolved.
    EvaluationsFinished(Result<Feedback, EvaluationError>),
}

impl From<SessionCommand> for SessionEvent {
    fn from(command: SessionCommand) -> Self {
        SessionEvent::Command(command)
    }
}

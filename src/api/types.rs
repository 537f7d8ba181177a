//! Wire types for the interview service and the validated interview setup.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

/// Question difficulty, sent to the service in lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// All variants in the order offered by the setup form.
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    /// Capitalised label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::Intermediate
    }
}

// ---------------------------------------------------------------------------
// InterviewConfig
// ---------------------------------------------------------------------------

/// Interview durations offered by the setup form, in minutes.
pub const DURATION_CHOICES: [u32; 4] = [15, 30, 45, 60];

/// Parameters of one interview attempt.
///
/// Serialises directly as the `POST /generate-questions` request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewConfig {
    pub topic: String,
    pub experience: String,
    /// Length of the interview in minutes.
    pub duration: u32,
    pub difficulty: Difficulty,
}

/// A setup field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Topic is required")]
    MissingTopic,
    #[error("Experience level is required")]
    MissingExperience,
    #[error("Duration must be at least one minute")]
    ZeroDuration,
}

impl InterviewConfig {
    /// Check every field, returning all problems at once so the form can
    /// flag each of them.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.topic.trim().is_empty() {
            errors.push(ValidationError::MissingTopic);
        }
        if self.experience.trim().is_empty() {
            errors.push(ValidationError::MissingExperience);
        }
        if self.duration == 0 {
            errors.push(ValidationError::ZeroDuration);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Total interview time in seconds.
    pub fn duration_secs(&self) -> u64 {
        u64::from(self.duration) * 60
    }
}

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

/// `POST /evaluate-answer` request body.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluateRequest<'a> {
    pub question: &'a str,
    pub answer: &'a str,
}

/// `POST /generate-questions` response body.  The field is optional so a
/// missing key is reported as such rather than as a generic parse error.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionsResponse {
    pub questions: Option<Vec<String>>,
}

/// `POST /evaluate-answer` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationResponse {
    pub evaluation: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

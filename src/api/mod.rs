//! Client for the remote interview service.
//!
//! * [`InterviewApi`] - async trait implemented by service backends.
//! * [`HttpInterviewApi`] - reqwest implementation of the JSON contract.
//! * [`InterviewConfig`] / [`Difficulty`] - the validated setup sent to
//!   `/generate-questions`.
//! * [`ApiError`] - transport, status and body errors.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use interview_coach::api::{Difficulty, HttpInterviewApi, InterviewApi, InterviewConfig};
//! use interview_coach::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let api = HttpInterviewApi::from_config(&config.api);
//!
//!     let setup = InterviewConfig {
//!         topic: "Rust".into(),
//!         experience: "2 years".into(),
//!         duration: 15,
//!         difficulty: Difficulty::Beginner,
//!     };
//!     let questions = api.generate_questions(&setup).await.unwrap();
//!     let feedback = api.evaluate_answer(&questions[0], "My answer").await.unwrap();
//!     println!("{feedback}");
//! }
//! ```

pub mod client;
pub mod types;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{parse_evaluation, parse_questions, ApiError, HttpInterviewApi, InterviewApi};
pub use types::{Difficulty, InterviewConfig, ValidationError, DURATION_CHOICES};

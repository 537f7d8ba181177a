//! Evaluation submitter: scores every answer of a finished session as one
//! all-or-nothing batch.

pub mod batch;

pub use batch::{submit_all, EvaluationError, Feedback, QaPair};

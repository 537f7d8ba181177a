//! Concurrent evaluation of every (question, answer) pair.
//!
//! [`submit_all`] spawns one task per pair on a [`JoinSet`] so all requests
//! are in flight together, then joins them in completion order.  Results are
//! re-keyed by the pair's original index.  The first failure returns
//! immediately; dropping the `JoinSet` aborts the requests still running.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinSet;

use crate::api::{ApiError, InterviewApi};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One question and the answer captured for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaPair {
    /// Position of the question in the session.
    pub index: usize,
    pub question: String,
    pub answer: String,
}

/// Evaluation text keyed by question index.
pub type Feedback = BTreeMap<usize, String>;

/// Aggregated failure of an evaluation batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// A single request failed; the rest of the batch was abandoned.
    #[error("evaluation of question {} failed: {source}", .index + 1)]
    Request { index: usize, source: ApiError },

    /// An evaluation task panicked or was cancelled.
    #[error("evaluation task failed: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// submit_all
// ---------------------------------------------------------------------------

/// Evaluate every pair concurrently.
///
/// Succeeds only when every request succeeds, yielding feedback for every
/// index in `pairs`.  Completion order does not matter.
pub async fn submit_all(
    api: Arc<dyn InterviewApi>,
    pairs: Vec<QaPair>,
) -> Result<Feedback, EvaluationError> {
    let total = pairs.len();
    log::info!("evaluation: submitting {total} answers");

    let mut tasks = JoinSet::new();
    for pair in pairs {
        let api = Arc::clone(&api);
        tasks.spawn(async move {
            let result = api.evaluate_answer(&pair.question, &pair.answer).await;
            (pair.index, result)
        });
    }

    let mut feedback = Feedback::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Ok(evaluation))) => {
                log::debug!("evaluation: question {index} done ({}/{total})", feedback.len() + 1);
                feedback.insert(index, evaluation);
            }
            Ok((index, Err(source))) => {
                log::warn!("evaluation: question {index} failed: {source}");
                return Err(EvaluationError::Request { index, source });
            }
            Err(e) => {
                log::error!("evaluation: task failed: {e}");
                return Err(EvaluationError::Internal(e.to_string()));
            }
        }
    }

    log::info!("evaluation: all {total} answers evaluated");
    Ok(feedback)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Barrier;

    use crate::api::InterviewConfig;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Echoes the answer back, optionally failing for one question.
    struct EchoApi {
        fail_on: Option<String>,
        calls: AtomicUsize,
    }

    impl EchoApi {
        fn new(fail_on: Option<&str>) -> Self {
            Self {
                fail_on: fail_on.map(str::to_string),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl InterviewApi for EchoApi {
        async fn generate_questions(&self, _: &InterviewConfig) -> Result<Vec<String>, ApiError> {
            unreachable!("not used by the batch")
        }

        async fn evaluate_answer(&self, question: &str, answer: &str) -> Result<String, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.as_deref() == Some(question) {
                return Err(ApiError::Status(500));
            }
            Ok(format!("{question}: {answer}"))
        }
    }

    /// Every call waits until all `n` calls are outstanding.  Sequential
    /// issuance would deadlock.
    struct RendezvousApi {
        barrier: Barrier,
    }

    #[async_trait]
    impl InterviewApi for RendezvousApi {
        async fn generate_questions(&self, _: &InterviewConfig) -> Result<Vec<String>, ApiError> {
            unreachable!("not used by the batch")
        }

        async fn evaluate_answer(&self, question: &str, _answer: &str) -> Result<String, ApiError> {
            self.barrier.wait().await;
            Ok(format!("ok {question}"))
        }
    }

    /// Earlier questions take longer, so completion order is reversed.
    struct SlowFirstApi;

    #[async_trait]
    impl InterviewApi for SlowFirstApi {
        async fn generate_questions(&self, _: &InterviewConfig) -> Result<Vec<String>, ApiError> {
            unreachable!("not used by the batch")
        }

        async fn evaluate_answer(&self, question: &str, _answer: &str) -> Result<String, ApiError> {
            let n: u64 = question.trim_start_matches('Q').parse().unwrap();
            tokio::time::sleep(Duration::from_millis(100 * (10 - n))).await;
            Ok(format!("feedback for {question}"))
        }
    }

    fn pairs(n: usize) -> Vec<QaPair> {
        (0..n)
            .map(|i| QaPair {
                index: i,
                question: format!("Q{i}"),
                answer: format!("A{i}"),
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn every_pair_gets_feedback_by_index() {
        let api = Arc::new(EchoApi::new(None));
        let feedback = submit_all(api.clone(), pairs(3)).await.unwrap();

        assert_eq!(feedback.len(), 3);
        assert_eq!(feedback[&0], "Q0: A0");
        assert_eq!(feedback[&2], "Q2: A2");
        assert_eq!(api.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn one_failure_fails_the_whole_batch() {
        let api = Arc::new(EchoApi::new(Some("Q1")));
        let err = submit_all(api, pairs(3)).await.unwrap_err();

        assert_eq!(
            err,
            EvaluationError::Request {
                index: 1,
                source: ApiError::Status(500)
            }
        );
    }

    #[tokio::test]
    async fn requests_are_outstanding_together() {
        let api = Arc::new(RendezvousApi {
            barrier: Barrier::new(4),
        });
        let result = tokio::time::timeout(Duration::from_secs(5), submit_all(api, pairs(4))).await;

        let feedback = result.expect("batch deadlocked: requests were serialised").unwrap();
        assert_eq!(feedback.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_order_completion_keeps_index_correlation() {
        let feedback = submit_all(Arc::new(SlowFirstApi), pairs(5)).await.unwrap();

        for i in 0..5 {
            assert_eq!(feedback[&i], format!("feedback for Q{i}"));
        }
    }

    #[tokio::test]
    async fn empty_answers_are_still_submitted() {
        let api = Arc::new(EchoApi::new(None));
        let batch = vec![QaPair {
            index: 0,
            question: "Only".into(),
            answer: String::new(),
        }];
        let feedback = submit_all(api, batch).await.unwrap();
        assert_eq!(feedback[&0], "Only: ");
    }

    #[test]
    fn request_error_names_question_number() {
        let e = EvaluationError::Request {
            index: 1,
            source: ApiError::Timeout,
        };
        assert_eq!(e.to_string(), "evaluation of question 2 failed: request timed out");
    }
}

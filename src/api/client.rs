//! `InterviewApi` trait and the reqwest-backed `HttpInterviewApi`.
//!
//! The service exposes two JSON endpoints:
//!
//! * `POST {base_url}/generate-questions` → `{ "questions": [..] }`
//! * `POST {base_url}/evaluate-answer`    → `{ "evaluation": ".." }`
//!
//! Any non-2xx status, an unparseable body, or a missing field is a failure.
//! Failures are never retried here.

use async_trait::async_trait;
use thiserror::Error;

use crate::api::types::{
    EvaluateRequest, EvaluationResponse, InterviewConfig, QuestionsResponse,
};
use crate::config::ApiConfig;

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Errors returned by the interview service client.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The service answered with a non-success status code.
    #[error("service returned status {0}")]
    Status(u16),

    /// The body was not the expected JSON.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The JSON body lacked the named field.
    #[error("response is missing `{0}`")]
    MissingField(&'static str),

    /// Question generation succeeded but produced no questions.
    #[error("service returned no questions")]
    NoQuestions,
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// InterviewApi trait
// ---------------------------------------------------------------------------

/// The remote question-generation and answer-evaluation service.
///
/// Implementors must be `Send + Sync` so a single client can be shared by
/// the concurrent evaluation tasks behind an `Arc<dyn InterviewApi>`.
#[async_trait]
pub trait InterviewApi: Send + Sync {
    /// Generate the interview questions for `config`.  Never returns an
    /// empty list on success.
    async fn generate_questions(&self, config: &InterviewConfig) -> Result<Vec<String>, ApiError>;

    /// Evaluate one answer and return the feedback text.
    async fn evaluate_answer(&self, question: &str, answer: &str) -> Result<String, ApiError>;
}

// ---------------------------------------------------------------------------
// Body parsing
// ---------------------------------------------------------------------------

/// Parse a `/generate-questions` success body.
pub fn parse_questions(body: &str) -> Result<Vec<String>, ApiError> {
    let parsed: QuestionsResponse =
        serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))?;
    let questions = parsed.questions.ok_or(ApiError::MissingField("questions"))?;
    if questions.is_empty() {
        return Err(ApiError::NoQuestions);
    }
    Ok(questions)
}

/// Parse an `/evaluate-answer` success body.
pub fn parse_evaluation(body: &str) -> Result<String, ApiError> {
    let parsed: EvaluationResponse =
        serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))?;
    parsed.evaluation.ok_or(ApiError::MissingField("evaluation"))
}

// ---------------------------------------------------------------------------
// HttpInterviewApi
// ---------------------------------------------------------------------------

/// Talks to the interview service over HTTP.
///
/// All connection details come from [`ApiConfig`].
pub struct HttpInterviewApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpInterviewApi {
    /// Build a client from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`.  A default client is used if the builder fails.
    pub fn from_config(config: &ApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Full URL for an endpoint path such as `"generate-questions"`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<String, ApiError> {
        let url = self.endpoint(path);
        let response = self.client.post(&url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("api: POST {url} returned {status}");
            return Err(ApiError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl InterviewApi for HttpInterviewApi {
    async fn generate_questions(&self, config: &InterviewConfig) -> Result<Vec<String>, ApiError> {
        log::info!(
            "api: requesting {} questions on {:?}",
            config.difficulty.label(),
            config.topic
        );
        let body = self.post_json("generate-questions", config).await?;
        let questions = parse_questions(&body)?;
        log::info!("api: received {} questions", questions.len());
        Ok(questions)
    }

    async fn evaluate_answer(&self, question: &str, answer: &str) -> Result<String, ApiError> {
        let body = self
            .post_json("evaluate-answer", &EvaluateRequest { question, answer })
            .await?;
        parse_evaluation(&body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! The interview session state machine.
//!
//! [`InterviewSession`] owns all per-attempt state.  Views read it through
//! accessors; everything that changes it goes through one of the event entry
//! points below, each of which returns the [`Effect`]s the driver must
//! perform.  The machine itself never spawns, sleeps or talks to the network.
//!
//! | Entry point              | Accepted in        | Possible effects                 |
//! |--------------------------|--------------------|----------------------------------|
//! | `questions_loaded`       | Loading            | `ArmTimer`                       |
//! | `questions_failed`       | Loading            | –                                |
//! | `next`                   | Active             | `DisarmTimer`, `Submit` on last  |
//! | `previous`               | Active, index > 0  | –                                |
//! | `answer_changed`         | Active             | –                                |
//! | `transcript_updated`     | Active, same index | –                                |
//! | `recording_changed`      | any                | –                                |
//! | `tick`                   | Active             | `DisarmTimer`, `Submit` at zero  |
//! | `submission_finished`    | Processing         | –                                |
//!
//! Events outside their accepted phases are ignored.

use crate::api::{ApiError, InterviewConfig};
use crate::evaluation::{EvaluationError, Feedback, QaPair};

use super::answers::AnswerStore;
use super::state::{Phase, SessionError, SubmissionReason};

// ---------------------------------------------------------------------------
// Effect
// ---------------------------------------------------------------------------

/// Side effects requested by a transition, executed by the driver in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start the one-second countdown from this many seconds.
    ArmTimer(u64),
    /// Stop the countdown; no further ticks may arrive.
    DisarmTimer,
    /// Evaluate every pair concurrently and report back with
    /// `submission_finished`.
    Submit(Vec<QaPair>),
}

// ---------------------------------------------------------------------------
// InterviewSession
// ---------------------------------------------------------------------------

/// State of one interview attempt.
#[derive(Debug, Clone)]
pub struct InterviewSession {
    config: InterviewConfig,
    questions: Vec<String>,
    current_index: usize,
    answers: AnswerStore,
    time_remaining: u64,
    phase: Phase,
    timed_out: bool,
    submission: Option<SubmissionReason>,
    feedback: Option<Feedback>,
    error: Option<SessionError>,
    recording: bool,
    notice: Option<String>,
}

impl InterviewSession {
    /// A new session in [`Phase::Loading`] for an already-validated config.
    pub fn new(config: InterviewConfig) -> Self {
        let time_remaining = config.duration_secs();
        Self {
            config,
            questions: Vec::new(),
            current_index: 0,
            answers: AnswerStore::new(),
            time_remaining,
            phase: Phase::Loading,
            timed_out: false,
            submission: None,
            feedback: None,
            error: None,
            recording: false,
            notice: None,
        }
    }

    // -----------------------------------------------------------------------
    // Event entry points
    // -----------------------------------------------------------------------

    /// Questions arrived: start the interview and arm the countdown.
    pub fn questions_loaded(&mut self, questions: Vec<String>) -> Vec<Effect> {
        if self.phase != Phase::Loading {
            log::warn!("session: questions arrived in phase {:?}, ignoring", self.phase);
            return Vec::new();
        }
        if questions.is_empty() {
            self.fail(SessionError::QuestionFetch(ApiError::NoQuestions));
            return Vec::new();
        }

        log::info!("session: {} questions loaded", questions.len());
        self.questions = questions;
        self.current_index = 0;
        self.time_remaining = self.config.duration_secs();
        self.set_phase(Phase::Active);

        if self.time_remaining == 0 {
            return self.expire();
        }
        vec![Effect::ArmTimer(self.time_remaining)]
    }

    /// Question generation failed; the session cannot start.
    pub fn questions_failed(&mut self, error: ApiError) {
        if self.phase != Phase::Loading {
            return;
        }
        self.fail(SessionError::QuestionFetch(error));
    }

    /// Move forward, or submit everything from the last question.
    pub fn next(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Active {
            return Vec::new();
        }
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            log::debug!("session: question {}", self.current_index + 1);
            Vec::new()
        } else {
            self.begin_submission(SubmissionReason::Finished)
        }
    }

    /// Move back one question.  No-op on the first question.
    pub fn previous(&mut self) {
        if self.phase == Phase::Active && self.current_index > 0 {
            self.current_index -= 1;
            log::debug!("session: question {}", self.current_index + 1);
        }
    }

    /// Replace the current question's answer with typed text.
    /// Returns `false` when answers are frozen.
    pub fn answer_changed(&mut self, text: impl Into<String>) -> bool {
        if self.phase != Phase::Active {
            return false;
        }
        self.answers.set_answer(self.current_index, text);
        true
    }

    /// Replace the answer to question `index` with the full accumulated
    /// transcript.  Same overwrite rule as typed edits; an update for a
    /// question the candidate has navigated away from is dropped.
    pub fn transcript_updated(&mut self, index: usize, transcript: impl Into<String>) -> bool {
        if index != self.current_index {
            log::debug!(
                "session: transcript for question {index} dropped, now on {}",
                self.current_index
            );
            return false;
        }
        let accepted = self.answer_changed(transcript);
        if !accepted {
            log::debug!("session: transcript update dropped in phase {:?}", self.phase);
        }
        accepted
    }

    /// Record whether the recording control is running.
    pub fn recording_changed(&mut self, recording: bool) {
        self.recording = recording;
    }

    /// One countdown second elapsed.
    pub fn tick(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Active {
            return Vec::new();
        }
        if self.time_remaining > 1 {
            self.time_remaining -= 1;
            Vec::new()
        } else {
            self.expire()
        }
    }

    /// The evaluation batch resolved.  Feedback is kept only when it covers
    /// every question.
    pub fn submission_finished(&mut self, result: Result<Feedback, EvaluationError>) {
        if self.phase != Phase::Processing {
            log::warn!("session: evaluation result in phase {:?}, ignoring", self.phase);
            return;
        }
        match result {
            Ok(feedback) => {
                if let Some(index) = (0..self.questions.len()).find(|i| !feedback.contains_key(i)) {
                    self.fail(SessionError::IncompleteFeedback { index });
                    return;
                }
                self.feedback = Some(feedback);
                self.set_phase(Phase::Complete);
            }
            Err(e) => self.fail(SessionError::Evaluation(e)),
        }
    }

    /// Show a non-fatal media or recognition message.
    pub fn set_notice(&mut self, message: impl Into<String>) {
        self.notice = Some(message.into());
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// The countdown hit zero: freeze answers and auto-submit.
    fn expire(&mut self) -> Vec<Effect> {
        self.time_remaining = 0;
        self.timed_out = true;
        self.set_phase(Phase::TimeUp);
        self.begin_submission(SubmissionReason::TimeUp)
    }

    /// Shared by Next-on-last and expiry.  Snapshots the answers as they are
    /// right now and enters Processing; runs at most once per session.
    fn begin_submission(&mut self, reason: SubmissionReason) -> Vec<Effect> {
        if self.submission.is_some() || !matches!(self.phase, Phase::Active | Phase::TimeUp) {
            return Vec::new();
        }
        self.submission = Some(reason);

        let answers = self.answers.snapshot(self.questions.len());
        let pairs = self
            .questions
            .iter()
            .cloned()
            .zip(answers)
            .enumerate()
            .map(|(index, (question, answer))| QaPair {
                index,
                question,
                answer,
            })
            .collect();

        self.set_phase(Phase::Processing);
        vec![Effect::DisarmTimer, Effect::Submit(pairs)]
    }

    fn fail(&mut self, error: SessionError) {
        log::error!("session: {error}");
        self.feedback = None;
        self.error = Some(error);
        self.set_phase(Phase::Errored);
    }

    fn set_phase(&mut self, phase: Phase) {
        log::debug!("session: {} -> {}", self.phase.label(), phase.label());
        self.phase = phase;
    }

    // -----------------------------------------------------------------------
    // Read accessors
    // -----------------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &InterviewConfig {
        &self.config
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Text of the question being answered, `None` before loading.
    pub fn current_question(&self) -> Option<&str> {
        self.questions.get(self.current_index).map(String::as_str)
    }

    pub fn current_answer(&self) -> &str {
        self.answers.answer(self.current_index)
    }

    pub fn answer(&self, index: usize) -> &str {
        self.answers.answer(index)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.answered_count(self.questions.len())
    }

    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 >= self.questions.len()
    }

    /// Whether the Previous control should be enabled.
    pub fn can_go_previous(&self) -> bool {
        self.phase == Phase::Active && self.current_index > 0
    }

    /// Whether the Next / Finish control should be enabled.
    pub fn can_go_next(&self) -> bool {
        self.phase == Phase::Active
    }

    /// Whether answer editing, recording and dictation are allowed.
    pub fn accepts_answers(&self) -> bool {
        self.phase == Phase::Active
    }

    /// Fraction of the questions reached, `(index + 1) / N`.
    pub fn progress(&self) -> f32 {
        if self.questions.is_empty() {
            0.0
        } else {
            (self.current_index + 1) as f32 / self.questions.len() as f32
        }
    }

    pub fn time_remaining(&self) -> u64 {
        self.time_remaining
    }

    /// `true` when at most `threshold_secs` remain.
    pub fn is_low_on_time(&self, threshold_secs: u64) -> bool {
        self.time_remaining <= threshold_secs
    }

    /// `true` once the countdown has expired; never reset.
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    pub fn submission_reason(&self) -> Option<SubmissionReason> {
        self.submission
    }

    /// Feedback for every question, present only in [`Phase::Complete`].
    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Difficulty;

    fn config(minutes: u32) -> InterviewConfig {
        InterviewConfig {
            topic: "Rust".into(),
            experience: "3 years".into(),
            duration: minutes,
            difficulty: Difficulty::Intermediate,
        }
    }

    fn questions(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("Question {i}")).collect()
    }

    fn active(n: usize, minutes: u32) -> InterviewSession {
        let mut s = InterviewSession::new(config(minutes));
        let effects = s.questions_loaded(questions(n));
        assert_eq!(effects, vec![Effect::ArmTimer(u64::from(minutes) * 60)]);
        s
    }

    fn submitted_pairs(effects: &[Effect]) -> Vec<QaPair> {
        match effects {
            [Effect::DisarmTimer, Effect::Submit(pairs)] => pairs.clone(),
            other => panic!("expected disarm + submit, got {other:?}"),
        }
    }

    // ---- Loading ---

    #[test]
    fn starts_loading_with_full_time() {
        let s = InterviewSession::new(config(2));
        assert_eq!(s.phase(), Phase::Loading);
        assert_eq!(s.time_remaining(), 120);
        assert!(s.current_question().is_none());
    }

    #[test]
    fn load_enters_active_and_arms_timer() {
        let s = active(3, 30);
        assert_eq!(s.phase(), Phase::Active);
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.current_question(), Some("Question 1"));
        assert_eq!(s.time_remaining(), 1_800);
    }

    #[test]
    fn fetch_failure_is_terminal() {
        let mut s = InterviewSession::new(config(30));
        s.questions_failed(ApiError::Status(500));

        assert_eq!(s.phase(), Phase::Errored);
        assert_eq!(
            s.error(),
            Some(&SessionError::QuestionFetch(ApiError::Status(500)))
        );
        // No way back.
        assert!(s.questions_loaded(questions(2)).is_empty());
        assert_eq!(s.phase(), Phase::Errored);
    }

    #[test]
    fn empty_question_list_is_a_fetch_failure() {
        let mut s = InterviewSession::new(config(30));
        assert!(s.questions_loaded(Vec::new()).is_empty());
        assert_eq!(s.phase(), Phase::Errored);
    }

    #[test]
    fn ticks_before_loading_are_ignored() {
        let mut s = InterviewSession::new(config(1));
        assert!(s.tick().is_empty());
        assert_eq!(s.phase(), Phase::Loading);
        assert_eq!(s.time_remaining(), 60);
    }

    // ---- Navigation ---

    #[test]
    fn next_advances_until_last_then_submits() {
        for n in 1..=5 {
            let mut s = active(n, 30);
            for k in 0..n - 1 {
                assert_eq!(s.current_index(), k);
                assert!(s.next().is_empty());
                assert_eq!(s.current_index(), k + 1);
                assert_eq!(s.phase(), Phase::Active);
            }
            let pairs = submitted_pairs(&s.next());
            assert_eq!(pairs.len(), n);
            assert_eq!(s.phase(), Phase::Processing);
            assert_eq!(s.current_index(), n - 1);
        }
    }

    #[test]
    fn previous_is_noop_at_first_question() {
        let mut s = active(3, 30);
        s.previous();
        assert_eq!(s.current_index(), 0);
        assert!(!s.can_go_previous());
    }

    #[test]
    fn previous_steps_back_by_one() {
        let mut s = active(3, 30);
        s.next();
        s.next();
        assert_eq!(s.current_index(), 2);
        s.previous();
        assert_eq!(s.current_index(), 1);
        s.previous();
        assert_eq!(s.current_index(), 0);
    }

    #[test]
    fn navigation_frozen_once_processing() {
        let mut s = active(2, 30);
        s.next();
        s.next();
        assert_eq!(s.phase(), Phase::Processing);
        assert_eq!(s.current_index(), 1);

        assert!(s.next().is_empty());
        s.previous();
        assert_eq!(s.current_index(), 1);
        assert!(!s.can_go_next());
        assert!(!s.can_go_previous());
    }

    #[test]
    fn progress_tracks_index() {
        let mut s = active(4, 30);
        assert!((s.progress() - 0.25).abs() < f32::EPSILON);
        s.next();
        s.next();
        assert!((s.progress() - 0.75).abs() < f32::EPSILON);
        assert!(!s.is_last_question());
        s.next();
        assert!(s.is_last_question());
    }

    // ---- Answers ---

    #[test]
    fn answers_follow_current_question() {
        let mut s = active(3, 30);
        assert!(s.answer_changed("first"));
        s.next();
        assert!(s.answer_changed("second"));
        s.previous();

        assert_eq!(s.current_answer(), "first");
        assert_eq!(s.answer(1), "second");
        assert_eq!(s.answer(2), "");
        assert_eq!(s.answered_count(), 2);
    }

    #[test]
    fn transcript_updates_overwrite() {
        let mut s = active(1, 30);
        s.transcript_updated(0, "a");
        s.transcript_updated(0, "ab");
        assert_eq!(s.current_answer(), "ab");
    }

    #[test]
    fn transcript_for_previous_question_is_dropped() {
        let mut s = active(2, 30);
        s.answer_changed("A1");
        s.next();
        s.previous();

        assert!(!s.transcript_updated(1, "spoken for Q2"));
        assert_eq!(s.answer(0), "A1");
        assert_eq!(s.answer(1), "");

        assert!(s.transcript_updated(0, "A1 and more"));
        assert_eq!(s.answer(0), "A1 and more");
    }

    #[test]
    fn answers_rejected_after_submission() {
        let mut s = active(1, 30);
        s.answer_changed("kept");
        s.next();

        assert!(!s.answer_changed("too late"));
        assert!(!s.transcript_updated(0, "also too late"));
        assert_eq!(s.current_answer(), "kept");
    }

    #[test]
    fn answers_rejected_while_loading() {
        let mut s = InterviewSession::new(config(30));
        assert!(!s.answer_changed("early"));
        s.questions_loaded(questions(1));
        assert_eq!(s.current_answer(), "");
    }

    // ---- Timer ---

    #[test]
    fn expiry_happens_exactly_at_tick_t() {
        let mut s = active(2, 1);
        for tick in 1..60 {
            assert!(s.tick().is_empty(), "early expiry at tick {tick}");
            assert_eq!(s.time_remaining(), 60 - tick);
            assert_eq!(s.phase(), Phase::Active);
        }
        let effects = s.tick();
        assert_eq!(submitted_pairs(&effects).len(), 2);
        assert_eq!(s.time_remaining(), 0);
        assert!(s.timed_out());
        assert_eq!(s.submission_reason(), Some(SubmissionReason::TimeUp));
        assert_eq!(s.phase(), Phase::Processing);
    }

    #[test]
    fn late_ticks_never_retrigger_submission() {
        let mut s = active(1, 1);
        for _ in 0..60 {
            s.tick();
        }
        assert_eq!(s.phase(), Phase::Processing);
        for _ in 0..10 {
            assert!(s.tick().is_empty());
        }
        assert_eq!(s.time_remaining(), 0);
    }

    #[test]
    fn ticks_stop_counting_after_manual_finish() {
        let mut s = active(1, 1);
        s.tick();
        s.next();
        assert!(s.tick().is_empty());
        assert_eq!(s.time_remaining(), 59);
        assert!(!s.timed_out());
        assert_eq!(s.submission_reason(), Some(SubmissionReason::Finished));
    }

    #[test]
    fn low_time_threshold() {
        let mut s = active(1, 2);
        assert!(!s.is_low_on_time(60));
        for _ in 0..60 {
            s.tick();
        }
        assert_eq!(s.time_remaining(), 60);
        assert!(s.is_low_on_time(60));
    }

    // ---- Submission ---

    #[test]
    fn time_up_submits_value_held_at_expiry() {
        let mut s = active(2, 1);
        s.answer_changed("x");
        for _ in 0..59 {
            s.tick();
        }
        let pairs = submitted_pairs(&s.tick());
        assert_eq!(pairs[0].answer, "x");
        assert_eq!(pairs[1].answer, "");
        assert!(!s.answer_changed("after expiry"));
        assert_eq!(s.answer(0), "x");
    }

    #[test]
    fn snapshot_pairs_questions_with_answers() {
        let mut s = active(3, 30);
        s.answer_changed("a0");
        s.next();
        s.next();
        s.answer_changed("a2");
        let pairs = submitted_pairs(&s.next());

        assert_eq!(
            pairs,
            vec![
                QaPair { index: 0, question: "Question 1".into(), answer: "a0".into() },
                QaPair { index: 1, question: "Question 2".into(), answer: String::new() },
                QaPair { index: 2, question: "Question 3".into(), answer: "a2".into() },
            ]
        );
    }

    #[test]
    fn complete_feedback_completes_session() {
        let mut s = active(2, 30);
        s.next();
        s.next();
        let feedback: Feedback = [(0, "good".to_string()), (1, "ok".to_string())].into();
        s.submission_finished(Ok(feedback.clone()));

        assert_eq!(s.phase(), Phase::Complete);
        assert_eq!(s.feedback(), Some(&feedback));
        assert!(s.error().is_none());
    }

    #[test]
    fn failed_batch_exposes_no_feedback() {
        let mut s = active(3, 30);
        s.next();
        s.next();
        s.next();
        s.submission_finished(Err(EvaluationError::Request {
            index: 1,
            source: ApiError::Status(502),
        }));

        assert_eq!(s.phase(), Phase::Errored);
        assert!(s.feedback().is_none());
        assert!(matches!(s.error(), Some(SessionError::Evaluation(_))));
    }

    #[test]
    fn partial_feedback_is_rejected() {
        let mut s = active(3, 30);
        s.next();
        s.next();
        s.next();
        let feedback: Feedback = [(0, "a".to_string()), (2, "c".to_string())].into();
        s.submission_finished(Ok(feedback));

        assert_eq!(s.phase(), Phase::Errored);
        assert!(s.feedback().is_none());
        assert_eq!(s.error(), Some(&SessionError::IncompleteFeedback { index: 1 }));
    }

    #[test]
    fn result_outside_processing_is_ignored() {
        let mut s = active(1, 30);
        s.submission_finished(Ok([(0, "early".to_string())].into()));
        assert_eq!(s.phase(), Phase::Active);
        assert!(s.feedback().is_none());
    }

    #[test]
    fn single_beginner_question_submits_immediately() {
        let mut s = InterviewSession::new(InterviewConfig {
            difficulty: Difficulty::Beginner,
            ..config(15)
        });
        s.questions_loaded(questions(1));
        let pairs = submitted_pairs(&s.next());

        assert_eq!(s.phase(), Phase::Processing);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].answer, "");
    }

    // ---- Recording / notices ---

    #[test]
    fn recording_flag_and_notice() {
        let mut s = active(1, 30);
        s.recording_changed(true);
        assert!(s.is_recording());
        s.set_notice("No speech was detected. Please try again.");
        assert_eq!(s.notice(), Some("No speech was detected. Please try again."));
        s.dismiss_notice();
        assert!(s.notice().is_none());
        assert_eq!(s.phase(), Phase::Active);
    }
}

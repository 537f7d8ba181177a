//! Interview practice window - egui/eframe application.
//!
//! [`InterviewApp`] is the top-level [`eframe::App`].  It owns the setup
//! form, the recording control and the [`SessionHandle`] of the running
//! interview.  Every frame it reads the shared session state and renders the
//! matching screen; user actions are queued to the session driver with
//! non-blocking sends.
//!
//! # Screens
//!
//! | Screen | Session phase | Visual |
//! |--------|---------------|--------|
//! | Setup | – | topic / experience / duration / difficulty form |
//! | Interview | `Loading` | spinner + "Generating questions..." |
//! | Interview | `Active` | timer, question, answer box, recording, navigation |
//! | Interview | `Processing` after expiry | "Time's Up! Submitting your answers..." |
//! | Interview | `Processing` | spinner + "Processing..." |
//! | Interview | `Errored` | error message + back to setup |
//! | Results | `Complete` | every question with answer and feedback |

use std::sync::Arc;
use std::time::Duration;

use eframe::egui;

use crate::api::{Difficulty, InterviewApi, InterviewConfig, ValidationError, DURATION_CHOICES};
use crate::config::{AppConfig, InterviewDefaults};
use crate::media::{Dictation, MediaError, Microphone, Recorder, SpeechRecognizer};
use crate::session::{
    format_clock, spawn_session, InterviewSession, Phase, SessionCommand, SessionHandle,
    SubmissionReason,
};

const ACCENT: egui::Color32 = egui::Color32::from_rgb(68, 136, 255);
const WARNING: egui::Color32 = egui::Color32::from_rgb(230, 70, 70);
const MUTED: egui::Color32 = egui::Color32::from_rgb(140, 140, 140);

// ---------------------------------------------------------------------------
// SetupForm
// ---------------------------------------------------------------------------

/// Values entered on the setup screen.
#[derive(Debug, Clone)]
pub struct SetupForm {
    pub topic: String,
    pub experience: String,
    pub duration: u32,
    pub difficulty: Difficulty,
    pub errors: Vec<ValidationError>,
}

impl SetupForm {
    pub fn from_defaults(defaults: &InterviewDefaults) -> Self {
        Self {
            topic: String::new(),
            experience: String::new(),
            duration: defaults.duration_minutes,
            difficulty: defaults.difficulty,
            errors: Vec::new(),
        }
    }

    /// Build a validated config, recording the problems on failure.
    pub fn submit(&mut self) -> Option<InterviewConfig> {
        let config = InterviewConfig {
            topic: self.topic.trim().to_string(),
            experience: self.experience.trim().to_string(),
            duration: self.duration,
            difficulty: self.difficulty,
        };
        match config.validate() {
            Ok(()) => {
                self.errors.clear();
                Some(config)
            }
            Err(errors) => {
                self.errors = errors;
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// InterviewApp
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordingControl {
    Start,
    Stop,
    /// Recording stopped; dictation is transcribing its last window.
    Flushing,
}

#[derive(Clone)]
enum Screen {
    Setup,
    Interview(Arc<SessionHandle>),
    Results(Arc<InterviewSession>),
}

/// eframe application - setup, interview and results screens.
pub struct InterviewApp {
    config: AppConfig,
    runtime: tokio::runtime::Handle,
    api: Arc<dyn InterviewApi>,
    recognizer: Option<Arc<dyn SpeechRecognizer>>,

    screen: Screen,
    form: SetupForm,

    // ── Answer editing ───────────────────────────────────────────────────
    /// Local copy of the current answer; the session is updated on change.
    draft: String,
    /// Question the draft belongs to; `None` forces a resync.
    draft_for: Option<usize>,

    // ── Media ────────────────────────────────────────────────────────────
    recorder: Recorder,
    dictation: Option<Dictation>,
}

impl InterviewApp {
    /// * `runtime`    - handle of the tokio runtime that drives sessions.
    /// * `api`        - interview service client.
    /// * `recognizer` - loaded speech model, `None` when dictation is off
    ///   or unavailable.
    pub fn new(
        config: AppConfig,
        runtime: tokio::runtime::Handle,
        api: Arc<dyn InterviewApi>,
        recognizer: Option<Arc<dyn SpeechRecognizer>>,
    ) -> Self {
        let form = SetupForm::from_defaults(&config.interview);
        Self {
            config,
            runtime,
            api,
            recognizer,
            screen: Screen::Setup,
            form,
            draft: String::new(),
            draft_for: None,
            recorder: Recorder::new(),
            dictation: None,
        }
    }

    // ── Screen transitions ───────────────────────────────────────────────

    fn start_interview(&mut self, config: InterviewConfig) {
        log::info!("app: starting interview on {:?}", config.topic);
        if self.config.interview.remember(&config) {
            if let Err(e) = self.config.save() {
                log::warn!("app: could not save interview defaults: {e}");
            }
        }
        let handle = spawn_session(config, Arc::clone(&self.api), &self.runtime);
        self.draft.clear();
        self.draft_for = None;
        self.screen = Screen::Interview(Arc::new(handle));
    }

    fn back_to_setup(&mut self) {
        self.stop_media(false);
        // Dropping the handle stops the driver and its countdown.
        self.screen = Screen::Setup;
    }

    /// Move to Results once the session completes.
    fn check_completion(&mut self) {
        let finished = match &self.screen {
            Screen::Interview(handle) => handle
                .with(|s| (s.phase() == Phase::Complete).then(|| s.clone())),
            _ => None,
        };
        if let Some(session) = finished {
            self.stop_media(false);
            self.screen = Screen::Results(Arc::new(session));
        }
    }

    // ── Media control ────────────────────────────────────────────────────

    /// Which recording control to show.
    fn recording_control(&self) -> RecordingControl {
        if self.recorder.is_recording() {
            RecordingControl::Stop
        } else if self.dictation.is_some() {
            RecordingControl::Flushing
        } else {
            RecordingControl::Start
        }
    }

    fn start_recording(&mut self, handle: &SessionHandle, index: usize) {
        if self.recording_control() != RecordingControl::Start {
            return;
        }
        let mic = match Microphone::open() {
            Ok(mic) => mic,
            Err(e) => {
                handle.send(SessionCommand::MediaFailed(e));
                return;
            }
        };

        if self.config.speech.enabled {
            match &self.recognizer {
                Some(recognizer) => {
                    self.dictation = Some(Dictation::start(
                        Arc::clone(recognizer),
                        self.config.speech.window_secs,
                        index,
                        self.draft.clone(),
                        handle.sender(),
                    ));
                }
                None => {
                    handle.send(SessionCommand::MediaFailed(MediaError::Unsupported(
                        "no speech model loaded".into(),
                    )));
                }
            }
        }

        let tap = self.dictation.as_ref().and_then(Dictation::tap);
        match self.recorder.start(&mic, tap) {
            Ok(()) => {
                handle.send(SessionCommand::RecordingChanged(true));
            }
            Err(e) => {
                self.dictation = None;
                handle.send(SessionCommand::MediaFailed(e));
            }
        }
    }

    /// Stop recording.  With `flush` the dictation worker may deliver the
    /// transcript of the last partial window; otherwise it is discarded.
    fn stop_media(&mut self, flush: bool) {
        if self.recorder.is_recording() {
            self.recorder.stop();
            if let Screen::Interview(handle) = &self.screen {
                handle.send(SessionCommand::RecordingChanged(false));
            }
        }
        match self.dictation.take() {
            Some(mut dictation) if flush => {
                dictation.finish();
                self.dictation = Some(dictation);
            }
            Some(dictation) => dictation.cancel(),
            None => {}
        }
    }

    /// Queue an edit of the current answer.  A dropped edit forces the
    /// draft to resync from the session on the next frame.
    fn queue_answer(&mut self, handle: &SessionHandle) {
        if !handle.send(SessionCommand::AnswerChanged(self.draft.clone())) {
            self.draft_for = None;
        }
    }

    /// Drop a finished dictation worker and resync the draft with whatever
    /// it delivered.
    fn reap_dictation(&mut self) {
        if self.dictation.as_ref().is_some_and(|d| !d.is_running()) {
            self.dictation = None;
            self.draft_for = None;
        }
    }

    // ── Screen renderers ─────────────────────────────────────────────────

    fn draw_setup(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.heading("AI Interview Practice");
            ui.label(
                egui::RichText::new("Get ready for your next interview with AI-powered practice")
                    .color(MUTED),
            );
        });
        ui.add_space(16.0);

        egui::Grid::new("setup_form")
            .num_columns(2)
            .spacing([12.0, 10.0])
            .show(ui, |ui| {
                ui.label("Topic");
                ui.add(egui::TextEdit::singleline(&mut self.form.topic).desired_width(360.0));
                ui.end_row();

                ui.label("Experience Level");
                ui.add(
                    egui::TextEdit::singleline(&mut self.form.experience).desired_width(360.0),
                );
                ui.end_row();

                ui.label("Duration");
                egui::ComboBox::from_id_salt("duration")
                    .selected_text(format!("{} minutes", self.form.duration))
                    .show_ui(ui, |ui| {
                        for minutes in DURATION_CHOICES {
                            ui.selectable_value(
                                &mut self.form.duration,
                                minutes,
                                format!("{minutes} minutes"),
                            );
                        }
                    });
                ui.end_row();

                ui.label("Difficulty");
                egui::ComboBox::from_id_salt("difficulty")
                    .selected_text(self.form.difficulty.label())
                    .show_ui(ui, |ui| {
                        for difficulty in Difficulty::ALL {
                            ui.selectable_value(
                                &mut self.form.difficulty,
                                difficulty,
                                difficulty.label(),
                            );
                        }
                    });
                ui.end_row();
            });

        for error in &self.form.errors {
            ui.colored_label(WARNING, error.to_string());
        }

        ui.add_space(16.0);
        ui.vertical_centered(|ui| {
            if ui.button("Start Interview").clicked() {
                if let Some(config) = self.form.submit() {
                    self.start_interview(config);
                }
            }
        });
    }

    fn draw_interview(&mut self, ui: &mut egui::Ui, handle: &SessionHandle) {
        let session = handle.snapshot();

        match session.phase() {
            Phase::Loading => {
                ui.vertical_centered(|ui| {
                    ui.add_space(80.0);
                    ui.spinner();
                    ui.label("Generating questions...");
                });
            }
            Phase::TimeUp | Phase::Processing => {
                ui.vertical_centered(|ui| {
                    ui.add_space(80.0);
                    if session.timed_out() {
                        ui.heading(egui::RichText::new("Time's Up!").color(WARNING));
                        ui.label("Submitting your answers...");
                    } else {
                        ui.label("Processing...");
                    }
                    ui.add_space(12.0);
                    ui.spinner();
                });
            }
            Phase::Errored => {
                let message = session
                    .error()
                    .map(|e| e.user_message())
                    .unwrap_or("Something went wrong. Please try again.");
                ui.vertical_centered(|ui| {
                    ui.add_space(80.0);
                    ui.colored_label(WARNING, message);
                    ui.add_space(12.0);
                    if ui.button("Back to Setup").clicked() {
                        self.back_to_setup();
                    }
                });
            }
            Phase::Active => self.draw_active(ui, handle, &session),
            // Handled by check_completion before the next frame.
            Phase::Complete => {}
        }
    }

    fn draw_active(&mut self, ui: &mut egui::Ui, handle: &SessionHandle, session: &InterviewSession) {
        let index = session.current_index();
        let dictating = self.dictation.is_some();

        // While dictating the session's answer is authoritative; otherwise
        // the draft is, until the question changes.
        if dictating || self.draft_for != Some(index) {
            self.draft = session.current_answer().to_string();
            self.draft_for = Some(index);
        }

        // ── Notice banner ────────────────────────────────────────────────
        if let Some(notice) = session.notice() {
            ui.horizontal(|ui| {
                ui.colored_label(egui::Color32::from_rgb(255, 136, 68), notice);
                if ui.small_button("x").clicked() {
                    handle.send(SessionCommand::DismissNotice);
                }
            });
            ui.separator();
        }

        // ── Recording control + timer ────────────────────────────────────
        ui.horizontal(|ui| {
            match self.recording_control() {
                RecordingControl::Stop => {
                    if ui.button("Stop Recording").clicked() {
                        self.stop_media(true);
                    }
                    ui.colored_label(
                        WARNING,
                        format!("● {}", format_clock(self.recorder.elapsed().as_secs())),
                    );
                    if dictating {
                        ui.label(egui::RichText::new("Listening...").color(MUTED));
                    }
                }
                RecordingControl::Flushing => {
                    ui.add_enabled(false, egui::Button::new("Start Recording"));
                    ui.label(egui::RichText::new("Finishing transcript...").color(MUTED));
                }
                RecordingControl::Start => {
                    if ui.button("Start Recording").clicked() {
                        self.start_recording(handle, index);
                    }
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let low = session.is_low_on_time(self.config.interview.low_time_warning_secs);
                let color = if low { WARNING } else { ACCENT };
                ui.label(
                    egui::RichText::new(format_clock(session.time_remaining()))
                        .color(color)
                        .size(28.0)
                        .strong(),
                );
            });
        });
        ui.add_space(8.0);

        // ── Question + answer ────────────────────────────────────────────
        ui.label(
            egui::RichText::new(session.current_question().unwrap_or_default()).size(18.0),
        );
        ui.add_space(8.0);

        let response = ui.add_enabled(
            !dictating,
            egui::TextEdit::multiline(&mut self.draft)
                .hint_text("Type your answer here...")
                .desired_rows(6)
                .desired_width(f32::INFINITY),
        );
        if response.changed() {
            self.queue_answer(handle);
        }
        ui.add_space(8.0);

        // ── Progress + navigation ────────────────────────────────────────
        ui.label(format!(
            "Question {} of {}",
            index + 1,
            session.question_count()
        ));
        ui.add(egui::ProgressBar::new(session.progress()));
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            if ui
                .add_enabled(session.can_go_previous(), egui::Button::new("Previous"))
                .clicked()
            {
                self.stop_media(false);
                handle.send(SessionCommand::Previous);
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let label = if session.is_last_question() {
                    "Finish Interview"
                } else {
                    "Next"
                };
                if ui
                    .add_enabled(session.can_go_next(), egui::Button::new(label))
                    .clicked()
                {
                    self.stop_media(false);
                    handle.send(SessionCommand::Next);
                }
            });
        });
    }

    fn draw_results(&mut self, ui: &mut egui::Ui, session: &InterviewSession) {
        ui.heading("Interview Results");
        let config = session.config();
        ui.label(
            egui::RichText::new(format!(
                "Topic: {} | Experience: {} | Duration: {} minutes",
                config.topic, config.experience, config.duration
            ))
            .color(MUTED),
        );
        ui.label(format!(
            "Answered {} of {} questions",
            session.answered_count(),
            session.question_count()
        ));
        match session.submission_reason() {
            Some(reason @ SubmissionReason::TimeUp) => {
                ui.colored_label(WARNING, reason.summary());
            }
            Some(reason) => {
                ui.label(egui::RichText::new(reason.summary()).color(MUTED));
            }
            None => {}
        }
        ui.add_space(8.0);

        let mut restart = false;
        egui::ScrollArea::vertical().show(ui, |ui| {
            for (index, question) in session.questions().iter().enumerate() {
                ui.label(egui::RichText::new(format!("Question {}", index + 1)).strong());
                ui.label(question);
                ui.add_space(4.0);

                ui.label(egui::RichText::new("Your Answer:").color(MUTED));
                let answer = session.answer(index);
                ui.label(if answer.is_empty() { "No answer provided" } else { answer });
                ui.add_space(4.0);

                let feedback = session
                    .feedback()
                    .and_then(|f| f.get(&index))
                    .map(String::as_str)
                    .unwrap_or("No feedback available");
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.label(egui::RichText::new("Feedback:").strong());
                    ui.label(feedback);
                });
                ui.separator();
            }

            ui.vertical_centered(|ui| {
                if ui.button("Start New Interview").clicked() {
                    restart = true;
                }
            });
        });

        if restart {
            self.form = SetupForm::from_defaults(&self.config.interview);
            self.screen = Screen::Setup;
        }
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for InterviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_completion();
        self.reap_dictation();

        // Media stops as soon as answers freeze.
        let accepting = match &self.screen {
            Screen::Interview(handle) => handle.with(|s| s.accepts_answers()),
            _ => false,
        };
        if !accepting && (self.recorder.is_recording() || self.dictation.is_some()) {
            self.stop_media(false);
        }

        // The countdown and recording timer need a steady repaint.
        if matches!(self.screen, Screen::Interview(_)) {
            ctx.request_repaint_after(Duration::from_millis(200));
        }

        // Renderers may replace `self.screen`; the clone keeps this frame's
        // session alive until drawing is done.
        let screen = self.screen.clone();
        egui::CentralPanel::default().show(ctx, |ui| match &screen {
            Screen::Setup => self.draw_setup(ui),
            Screen::Interview(handle) => self.draw_interview(ui, handle),
            Screen::Results(session) => self.draw_results(ui, session),
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.stop_media(false);
        log::info!("app: closing");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::media::RecognitionError;
    use async_trait::async_trait;

    struct OneQuestionApi;

    #[async_trait]
    impl InterviewApi for OneQuestionApi {
        async fn generate_questions(&self, _: &InterviewConfig) -> Result<Vec<String>, ApiError> {
            Ok(vec!["Tell me about yourself.".into()])
        }

        async fn evaluate_answer(&self, _: &str, _: &str) -> Result<String, ApiError> {
            Ok("Good.".into())
        }
    }

    struct SilentRecognizer;

    impl SpeechRecognizer for SilentRecognizer {
        fn transcribe(&self, _: &[f32]) -> Result<String, RecognitionError> {
            Ok(String::new())
        }
    }

    fn setup() -> InterviewConfig {
        InterviewConfig {
            topic: "Rust".into(),
            experience: "2 years".into(),
            duration: 15,
            difficulty: Difficulty::Beginner,
        }
    }

    fn app(runtime: &tokio::runtime::Runtime) -> InterviewApp {
        InterviewApp::new(
            AppConfig::default(),
            runtime.handle().clone(),
            Arc::new(OneQuestionApi),
            Some(Arc::new(SilentRecognizer)),
        )
    }

    fn wait_until(mut done: impl FnMut() -> bool) {
        for _ in 0..200 {
            if done() {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("condition not reached");
    }

    #[test]
    fn start_is_blocked_while_dictation_finishes() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mut app = app(&runtime);
        let handle = spawn_session(setup(), Arc::new(OneQuestionApi), runtime.handle());
        assert_eq!(app.recording_control(), RecordingControl::Start);

        // Worker still holds its own tap, so it keeps running.
        app.dictation = Some(Dictation::start(
            Arc::new(SilentRecognizer),
            1.0,
            0,
            String::new(),
            handle.sender(),
        ));
        assert_eq!(app.recording_control(), RecordingControl::Flushing);

        app.start_recording(&handle, 0);
        assert!(!app.recorder.is_recording());
        assert!(app.dictation.as_ref().is_some_and(Dictation::is_running));
    }

    #[test]
    fn dropped_edit_resyncs_draft() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mut app = app(&runtime);
        let handle = spawn_session(setup(), Arc::new(OneQuestionApi), runtime.handle());
        wait_until(|| handle.with(|s| s.phase() == Phase::Active));

        app.draft = "kept".into();
        app.draft_for = Some(0);
        app.queue_answer(&handle);
        assert_eq!(app.draft_for, Some(0));

        assert!(handle.send(SessionCommand::Close));
        wait_until(|| !handle.is_running());

        app.draft = "lost".into();
        app.queue_answer(&handle);
        assert_eq!(app.draft_for, None);
        assert_eq!(handle.with(|s| s.current_answer().to_string()), "kept");
    }

    #[test]
    fn form_starts_from_config_defaults() {
        let defaults = InterviewDefaults {
            duration_minutes: 45,
            difficulty: Difficulty::Advanced,
            low_time_warning_secs: 60,
        };
        let form = SetupForm::from_defaults(&defaults);
        assert_eq!(form.duration, 45);
        assert_eq!(form.difficulty, Difficulty::Advanced);
        assert!(form.topic.is_empty());
    }

    #[test]
    fn submit_trims_and_validates() {
        let mut form = SetupForm::from_defaults(&InterviewDefaults::default());
        form.topic = "  Rust  ".into();
        form.experience = "3 years".into();

        let config = form.submit().expect("valid form");
        assert_eq!(config.topic, "Rust");
        assert_eq!(config.duration, 30);
        assert!(form.errors.is_empty());
    }

    #[test]
    fn submit_reports_every_missing_field() {
        let mut form = SetupForm::from_defaults(&InterviewDefaults::default());
        form.topic = "   ".into();

        assert!(form.submit().is_none());
        assert_eq!(
            form.errors,
            vec![ValidationError::MissingTopic, ValidationError::MissingExperience]
        );

        form.topic = "Go".into();
        form.experience = "junior".into();
        assert!(form.submit().is_some());
        assert!(form.errors.is_empty());
    }
}

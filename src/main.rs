//! Application entry point - Interview Coach.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create the [`tokio`] runtime that drives interview sessions.
//! 4. Build the HTTP client for the interview service.
//! 5. Load the Whisper model for dictation (optional; typing still works
//!    without it).
//! 6. Run [`eframe::run_native`] - blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use eframe::egui;

use interview_coach::{
    api::{HttpInterviewApi, InterviewApi},
    app::InterviewApp,
    config::{AppConfig, AppPaths},
    media::{SpeechRecognizer, WhisperRecognizer},
};

// ---------------------------------------------------------------------------
// Startup helpers
// ---------------------------------------------------------------------------

fn load_recognizer(config: &AppConfig) -> Option<Arc<dyn SpeechRecognizer>> {
    if !config.speech.enabled {
        log::info!("dictation disabled in settings");
        return None;
    }

    let model_path = AppPaths::new().model_file(&config.speech.model);
    match WhisperRecognizer::load(&model_path, &config.speech) {
        Ok(recognizer) => Some(Arc::new(recognizer)),
        Err(e) => {
            log::warn!("dictation unavailable ({e}); answers can still be typed");
            None
        }
    }
}

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let (width, height) = config.ui.window_size;
    let mut vp = egui::ViewportBuilder::default()
        .with_title("Interview Coach")
        .with_inner_size([width, height])
        .with_min_inner_size([480.0, 420.0]);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Interview Coach starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime (timer, driver and evaluation fan-out)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // 4. Interview service client
    let api: Arc<dyn InterviewApi> = Arc::new(HttpInterviewApi::from_config(&config.api));
    log::info!("interview service at {}", config.api.base_url);

    // 5. Dictation model
    let recognizer = load_recognizer(&config);

    // 6. UI (blocks until the window is closed)
    let app = InterviewApp::new(config.clone(), rt.handle().clone(), api, recognizer);
    eframe::run_native(
        "Interview Coach",
        native_options(&config),
        Box::new(move |_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow!("{e}"))?;

    log::info!("Interview Coach shut down");
    Ok(())
}

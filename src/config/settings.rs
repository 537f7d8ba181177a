//! Application settings structs, defaults and TOML persistence.
//!
//! Every section carries `#[serde(default)]` so a hand-edited
//! `settings.toml` may omit any key and still load.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::api::{Difficulty, InterviewConfig};

// ---------------------------------------------------------------------------
// ApiConfig
// ---------------------------------------------------------------------------

/// Connection settings for the question-generation / evaluation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the service, without a trailing path
    /// (e.g. `http://127.0.0.1:8000`).
    pub base_url: String,
    /// Per-request timeout in seconds.  Applies to every individual
    /// generate/evaluate call; there is no separate batch deadline.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            timeout_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// InterviewDefaults
// ---------------------------------------------------------------------------

/// Values pre-filled into the setup form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterviewDefaults {
    /// Interview length in minutes.
    pub duration_minutes: u32,
    /// Question difficulty.
    pub difficulty: Difficulty,
    /// The countdown turns red once this many seconds (or fewer) remain.
    pub low_time_warning_secs: u64,
}

impl InterviewDefaults {
    /// Adopt the duration and difficulty of a started interview so the next
    /// setup form starts from them.  Returns `true` when anything changed.
    pub fn remember(&mut self, config: &InterviewConfig) -> bool {
        let changed =
            self.duration_minutes != config.duration || self.difficulty != config.difficulty;
        self.duration_minutes = config.duration;
        self.difficulty = config.difficulty;
        changed
    }
}

impl Default for InterviewDefaults {
    fn default() -> Self {
        Self {
            duration_minutes: 30,
            difficulty: Difficulty::Intermediate,
            low_time_warning_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for the dictation (speech-to-text) feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Load a Whisper model at startup and offer voice input.
    pub enabled: bool,
    /// GGML model file stem inside the models directory.
    pub model: String,
    /// ISO-639-1 language code, or `"auto"`.
    pub language: String,
    /// Seconds of audio transcribed per dictation window.
    pub window_secs: f32,
    /// Attempt GPU-accelerated inference when available.
    pub use_gpu: bool,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "ggml-base.en".into(),
            language: "en".into(),
            window_secs: 4.0,
            use_gpu: false,
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Initial inner window size in logical pixels.
    pub window_size: (f32, f32),
    /// Keep the window above all others.
    pub always_on_top: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_size: (720.0, 640.0),
            always_on_top: false,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote service settings.
    pub api: ApiConfig,
    /// Setup form defaults.
    pub interview: InterviewDefaults,
    /// Dictation settings.
    pub speech: SpeechConfig,
    /// Window settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform `settings.toml`, creating parent
    /// directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

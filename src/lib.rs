//! Interview Coach - timed mock interviews with AI-generated questions and
//! per-answer feedback.
//!
//! * [`api`] - interview service client.
//! * [`session`] - session state machine, countdown and driver.
//! * [`evaluation`] - concurrent all-or-nothing answer evaluation.
//! * [`media`] - microphone capture, recording control and dictation.
//! * [`config`] - settings persisted as TOML.
//! * [`app`] - the egui window.

pub mod api;
pub mod app;
pub mod config;
pub mod evaluation;
pub mod media;
pub mod session;

//! Microphone capture via `cpal`.
//!
//! [`Microphone`] opens the default input device.  [`Microphone::start`]
//! streams [`AudioChunk`]s over an mpsc channel and returns a
//! [`StreamHandle`]; dropping the handle stops the hardware stream.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc;

use super::MediaError;

/// Sample rate expected by the speech recognizer.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

// ---------------------------------------------------------------------------
// AudioChunk
// ---------------------------------------------------------------------------

/// One buffer of interleaved `f32` samples as delivered by the device.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub samples: Vec<f32>,
    /// Device sample rate in Hz.
    pub sample_rate: u32,
    pub channels: u16,
}

/// Keeps the cpal stream alive.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// Microphone
// ---------------------------------------------------------------------------

/// The system default input device and its preferred stream config.
pub struct Microphone {
    device: cpal::Device,
    config: cpal::StreamConfig,
}

impl Microphone {
    /// Open the default input device.
    ///
    /// # Errors
    ///
    /// [`MediaError::NoDevice`] when the host has no input device, otherwise
    /// the mapped [`cpal::DefaultStreamConfigError`].
    pub fn open() -> Result<Self, MediaError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(MediaError::NoDevice)?;
        let config = device
            .default_input_config()
            .map_err(map_config_error)?
            .into();

        if let Ok(name) = device.name() {
            log::info!("capture: using input device {name:?}");
        }
        Ok(Self { device, config })
    }

    /// Start streaming into `tx`.  Send errors are ignored so the audio
    /// thread never panics once the receiver is gone.
    pub fn start(&self, tx: mpsc::Sender<AudioChunk>) -> Result<StreamHandle, MediaError> {
        let sample_rate = self.config.sample_rate.0;
        let channels = self.config.channels;

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let _ = tx.send(AudioChunk {
                        samples: data.to_vec(),
                        sample_rate,
                        channels,
                    });
                },
                |err: cpal::StreamError| log::error!("capture: stream error: {err}"),
                None,
            )
            .map_err(map_build_error)?;

        stream.play().map_err(map_play_error)?;
        log::debug!("capture: streaming {channels}ch @ {sample_rate} Hz");
        Ok(StreamHandle { _stream: stream })
    }
}

// ---------------------------------------------------------------------------
// cpal error mapping
// ---------------------------------------------------------------------------

fn map_config_error(e: cpal::DefaultStreamConfigError) -> MediaError {
    match e {
        cpal::DefaultStreamConfigError::DeviceNotAvailable => MediaError::NoDevice,
        cpal::DefaultStreamConfigError::StreamTypeNotSupported => {
            MediaError::Unsupported("input stream type not supported".into())
        }
        cpal::DefaultStreamConfigError::BackendSpecific { err } => {
            MediaError::Device(err.description)
        }
    }
}

/// cpal has no dedicated permission variant; hosts report a refused
/// microphone as a backend error whose text says so.
fn map_build_error(e: cpal::BuildStreamError) -> MediaError {
    match e {
        cpal::BuildStreamError::DeviceNotAvailable => MediaError::NoDevice,
        cpal::BuildStreamError::StreamConfigNotSupported => {
            MediaError::Unsupported("stream config not supported".into())
        }
        cpal::BuildStreamError::BackendSpecific { err } => {
            log::warn!("capture: stream refused: {}", err.description);
            if mentions_permission(&err.description) {
                MediaError::PermissionDenied
            } else {
                MediaError::Device(err.description)
            }
        }
        other => MediaError::Device(other.to_string()),
    }
}

fn mentions_permission(description: &str) -> bool {
    let lower = description.to_lowercase();
    ["permission", "denied", "not permitted", "not authorized", "unauthorized"]
        .iter()
        .any(|needle| lower.contains(needle))
}

fn map_play_error(e: cpal::PlayStreamError) -> MediaError {
    match e {
        cpal::PlayStreamError::DeviceNotAvailable => MediaError::NoDevice,
        cpal::PlayStreamError::BackendSpecific { err } => MediaError::Device(err.description),
    }
}

// ---------------------------------------------------------------------------
// to_mono_16k
// ---------------------------------------------------------------------------

/// Downmix `chunk` to mono and linearly resample it to 16 kHz.
///
/// ```
/// use interview_coach::media::{to_mono_16k, AudioChunk};
///
/// let chunk = AudioChunk { samples: vec![0.2; 960], sample_rate: 48_000, channels: 2 };
/// let mono = to_mono_16k(&chunk);
/// assert_eq!(mono.len(), 160);
/// ```
pub fn to_mono_16k(chunk: &AudioChunk) -> Vec<f32> {
    let mono: Vec<f32> = match chunk.channels {
        0 => return Vec::new(),
        1 => chunk.samples.clone(),
        n => chunk
            .samples
            .chunks_exact(usize::from(n))
            .map(|frame| frame.iter().sum::<f32>() / f32::from(n))
            .collect(),
    };

    if chunk.sample_rate == TARGET_SAMPLE_RATE || mono.is_empty() || chunk.sample_rate == 0 {
        return mono;
    }

    let step = f64::from(chunk.sample_rate) / f64::from(TARGET_SAMPLE_RATE);
    let out_len = (mono.len() as f64 / step).ceil() as usize;
    let last = mono.len() - 1;

    (0..out_len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = (pos as usize).min(last);
            let next = (idx + 1).min(last);
            let frac = (pos - idx as f64) as f32;
            mono[idx] + (mono[next] - mono[idx]) * frac
        })
        .collect()
}

/// Root-mean-square amplitude of a mono buffer.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Pipeline configuration
//!
//! Loaded from JSON; every field has a default so a partial file (or none at
//! all) yields a working capture → H.264 → network setup.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::pipeline::queue::OverflowPolicy;
use crate::pipeline::types::PixelFormat;

pub const CAPTURE_WIDTH: u32 = 1920;
pub const CAPTURE_HEIGHT: u32 = 1080;
pub const CAPTURE_FRAME_RATE: u32 = 60;

pub const ENCODER_FRAME_RATE: u32 = 30;
pub const ENCODER_BITRATE: u64 = 4_000_000;
pub const ENCODER_GOP_SIZE: u32 = 30;
pub const ENCODER_MAX_B_FRAMES: u32 = 1;

pub const STREAM_PORT: u16 = 8554;

/// Complete configuration handed to `SenderCoordinator::start`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub capture: CaptureConfig,
    pub encoder: EncoderConfig,
    pub sink: SinkConfig,
    pub queue: QueueConfig,
}

/// Parameters for the frame producer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub width: u32,
    pub height: u32,
    pub framerate: u32,
    pub pixel_format: PixelFormat,
    /// Stop after this many frames (synthetic sources only)
    pub frame_limit: Option<u64>,
    /// Pace frames at `framerate` instead of producing as fast as possible
    pub realtime: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: CAPTURE_WIDTH,
            height: CAPTURE_HEIGHT,
            framerate: CAPTURE_FRAME_RATE,
            pixel_format: PixelFormat::Bgra,
            frame_limit: None,
            realtime: true,
        }
    }
}

/// Parameters for the frame transformer (encoder)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Codec name; `"raw"` selects the built-in uncompressed encoder
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    /// Target bitrate in bits per second
    pub bitrate: u64,
    /// Frame interval is `1 / framerate` seconds
    pub framerate: u32,
    pub gop_size: u32,
    pub max_b_frames: u32,
    pub preset: String,
    pub tune: String,
}

impl EncoderConfig {
    pub fn target_dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            codec: String::from("libx264"),
            width: CAPTURE_WIDTH,
            height: CAPTURE_HEIGHT,
            pixel_format: PixelFormat::Yuv420p,
            bitrate: ENCODER_BITRATE,
            framerate: ENCODER_FRAME_RATE,
            gop_size: ENCODER_GOP_SIZE,
            max_b_frames: ENCODER_MAX_B_FRAMES,
            preset: String::from("ultrafast"),
            tune: String::from("zerolatency"),
        }
    }
}

/// Parameters for the unit sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// `file:<path>`, `tcp://host:port` or a bare file path
    pub destination: String,
    pub transport_options: BTreeMap<String, String>,
}

impl SinkConfig {
    /// Read a boolean transport option, accepting `true/false/1/0/yes/no`
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.transport_options
            .get(key)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        let mut transport_options = BTreeMap::new();
        transport_options.insert(String::from("nodelay"), String::from("true"));
        Self {
            destination: format!("tcp://127.0.0.1:{}", STREAM_PORT),
            transport_options,
        }
    }
}

/// Handoff queue sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// `None` keeps the queues unbounded
    pub capacity: Option<usize>,
    pub overflow: OverflowPolicy,
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(PipelineError::Config(
                "capture dimensions must be non-zero".to_string(),
            ));
        }
        if self.encoder.width == 0 || self.encoder.height == 0 {
            return Err(PipelineError::Config(
                "encoder target dimensions must be non-zero".to_string(),
            ));
        }
        if self.capture.framerate == 0 || self.encoder.framerate == 0 {
            return Err(PipelineError::Config("framerate must be non-zero".to_string()));
        }
        if self.encoder.codec.trim().is_empty() {
            return Err(PipelineError::Config("encoder codec is empty".to_string()));
        }
        if self.sink.destination.trim().is_empty() {
            return Err(PipelineError::Config("sink destination is empty".to_string()));
        }
        if self.queue.capacity == Some(0) {
            return Err(PipelineError::Config(
                "queue capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Returns a version as specified in Cargo.toml
pub fn app_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub fn app_name() -> &'static str {
    env!("CARGO_PKG_NAME")
}

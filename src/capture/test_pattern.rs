//! Synthetic frame producer
//!
//! Generates a moving gradient at the configured size and pixel layout. Used
//! by the binary when no real grabber is wired in, and by tests.

use std::thread;
use std::time::{Duration, Instant};

use log::info;

use crate::capture::FrameProducer;
use crate::config::CaptureConfig;
use crate::error::CapabilityError;
use crate::pipeline::types::{PixelFormat, RawFrame, Timestamp};

pub struct TestPatternCapture {
    config: Option<CaptureConfig>,
    frame_index: u64,
    started: Instant,
}

impl TestPatternCapture {
    pub fn new() -> Self {
        Self {
            config: None,
            frame_index: 0,
            started: Instant::now(),
        }
    }

    /// Render frame `index` of the pattern
    pub fn pattern(width: u32, height: u32, format: PixelFormat, index: u64) -> Vec<u8> {
        let (w, h) = (width as usize, height as usize);
        let shift = index as usize;
        let mut data = Vec::with_capacity(format.frame_size(width, height));

        match format {
            PixelFormat::Bgra => {
                for y in 0..h {
                    for x in 0..w {
                        data.push((x + shift) as u8);
                        data.push((y + shift) as u8);
                        data.push((shift * 4) as u8);
                        data.push(0xFF);
                    }
                }
            }
            PixelFormat::Nv12 | PixelFormat::Yuv420p => {
                for y in 0..h {
                    for x in 0..w {
                        data.push((x + y + shift) as u8);
                    }
                }
                // Neutral chroma: both layouts carry the same number of chroma bytes
                let chroma = format.frame_size(width, height) - w * h;
                data.resize(data.len() + chroma, 128);
            }
        }
        data
    }

    /// Offset of frame `index` from the first frame at `framerate`
    fn frame_offset(index: u64, framerate: u32) -> Duration {
        let frame_micros = 1_000_000 / framerate.max(1) as u64;
        Duration::from_micros(index.saturating_mul(frame_micros))
    }

    fn pace(&self, framerate: u32) {
        let due = self.started + Self::frame_offset(self.frame_index, framerate);
        let now = Instant::now();
        if due > now {
            thread::sleep(due - now);
        }
    }
}

impl Default for TestPatternCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameProducer for TestPatternCapture {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CapabilityError> {
        if config.width == 0 || config.height == 0 {
            return Err(CapabilityError::fatal(format!(
                "invalid test pattern size {}x{}",
                config.width, config.height
            )));
        }
        self.config = Some(config.clone());
        self.frame_index = 0;
        self.started = Instant::now();
        info!(
            "TestPatternCapture: opened {}x{} {} @ {} fps",
            config.width, config.height, config.pixel_format, config.framerate
        );
        Ok(())
    }

    fn next_raw_unit(&mut self) -> Result<Option<RawFrame>, CapabilityError> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| CapabilityError::fatal("test pattern used before open"))?;

        if config.frame_limit.is_some_and(|limit| self.frame_index >= limit) {
            return Ok(None);
        }
        if config.realtime {
            self.pace(config.framerate);
        }

        let index = self.frame_index;
        let data = Self::pattern(config.width, config.height, config.pixel_format, index);
        let pts = Timestamp::from_frame_index(index, config.framerate);
        self.frame_index += 1;

        RawFrame::new(data, config.width, config.height, config.pixel_format, pts)
            .map(Some)
            .ok_or_else(|| CapabilityError::unit("test pattern produced a frame of the wrong size"))
    }

    fn close(&mut self) {
        if self.config.take().is_some() {
            info!("TestPatternCapture: closed after {} frames", self.frame_index);
        }
    }
}

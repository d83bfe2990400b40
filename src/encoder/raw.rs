//! Uncompressed "codec"
//!
//! Wraps each frame's bytes as a packet without transforming them. Packets are
//! released with a reorder delay of `max_b_frames`, like an encoder that holds
//! reference frames back, and the held packets come out on flush.

use std::collections::VecDeque;

use bytes::Bytes;
use log::debug;

use crate::config::EncoderConfig;
use crate::encoder::{FrameTransformer, Retrieved};
use crate::error::CapabilityError;
use crate::pipeline::types::{EncodedPacket, RawFrame};

pub struct RawEncoder {
    pending: VecDeque<EncodedPacket>,
    delay: usize,
    gop_size: u64,
    frame_count: u64,
    opened: bool,
    flushing: bool,
}

impl RawEncoder {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            delay: 0,
            gop_size: 1,
            frame_count: 0,
            opened: false,
            flushing: false,
        }
    }
}

impl Default for RawEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTransformer for RawEncoder {
    fn open(&mut self, config: &EncoderConfig) -> Result<(), CapabilityError> {
        self.delay = config.max_b_frames as usize;
        self.gop_size = config.gop_size.max(1) as u64;
        self.frame_count = 0;
        self.pending.clear();
        self.flushing = false;
        self.opened = true;
        debug!(
            "RawEncoder: opened (gop {}, reorder delay {})",
            self.gop_size, self.delay
        );
        Ok(())
    }

    fn submit(&mut self, frame: RawFrame) -> Result<(), CapabilityError> {
        if !self.opened {
            return Err(CapabilityError::fatal("raw encoder used before open"));
        }
        if self.flushing {
            return Err(CapabilityError::unit("frame submitted after flush"));
        }

        let is_keyframe = self.frame_count % self.gop_size == 0;
        self.frame_count += 1;
        self.pending
            .push_back(EncodedPacket::new(Bytes::from(frame.data), frame.pts, is_keyframe));
        Ok(())
    }

    fn retrieve(&mut self) -> Result<Retrieved, CapabilityError> {
        if self.pending.len() > self.delay || (self.flushing && !self.pending.is_empty()) {
            if let Some(packet) = self.pending.pop_front() {
                return Ok(Retrieved::Unit(packet));
            }
        }
        if self.flushing {
            Ok(Retrieved::Exhausted)
        } else {
            Ok(Retrieved::NeedsInput)
        }
    }

    fn flush(&mut self) -> Result<(), CapabilityError> {
        self.flushing = true;
        Ok(())
    }

    fn close(&mut self) {
        if !self.pending.is_empty() {
            debug!("RawEncoder: closing with {} packets held", self.pending.len());
        }
        self.pending.clear();
        self.opened = false;
    }
}

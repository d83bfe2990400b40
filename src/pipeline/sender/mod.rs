//! Sender pipeline components
//!
//! This module contains the sender-side pipeline stages:
//! - CaptureStage: pulls raw frames from a [`FrameProducer`](crate::capture::FrameProducer)
//! - EncodeStage: runs them through a [`FrameTransformer`](crate::encoder::FrameTransformer)
//! - TransmitStage: hands packets to a [`UnitSink`](crate::sink::UnitSink)
//!
//! The sender pipeline flow:
//! ```text
//! Capture → Encode → Transmit → Network
//! ```

pub mod capture_stage;
pub mod coordinator;
pub mod encode_stage;
pub mod transmit_stage;

pub use capture_stage::CaptureStage;
pub use coordinator::SenderCoordinator;
pub use encode_stage::{EncodeStage, EncoderPhase};
pub use transmit_stage::TransmitStage;

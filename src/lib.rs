//! Capture, encode and stream media through a three-stage threaded pipeline.
//!
//! Build a [`SenderCoordinator`] from a frame producer, a codec and a sink,
//! then [`start`](SenderCoordinator::start) it with a [`PipelineConfig`].

pub mod capture;
pub mod config;
pub mod encoder;
pub mod error;
pub mod pipeline;
pub mod sink;
pub mod utils;

pub use config::PipelineConfig;
pub use error::{CapabilityError, PipelineError, StageKind};
pub use pipeline::sender::SenderCoordinator;
pub use utils::sos::SignalOfStop;

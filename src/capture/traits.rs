//! Trait for frame producers consumed by the capture stage

use crate::config::CaptureConfig;
use crate::error::CapabilityError;
use crate::pipeline::types::RawFrame;

/// A source of raw frames (screen grabber, camera, decoder, test pattern).
///
/// The capture stage owns the producer exclusively and calls it from its own
/// thread. `next_raw_unit` may block, but should return within a frame
/// interval or so: the stage only observes a stop request between calls.
pub trait FrameProducer: Send {
    /// Acquire the device. Failure aborts pipeline start-up.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CapabilityError>;

    /// Next captured frame, `Ok(None)` only at a genuine end of stream
    fn next_raw_unit(&mut self) -> Result<Option<RawFrame>, CapabilityError>;

    /// Frames still held internally after capture ended (e.g. a decoder's
    /// delayed output). Called until it returns `Ok(None)`.
    fn drain_raw_unit(&mut self) -> Result<Option<RawFrame>, CapabilityError> {
        Ok(None)
    }

    /// Release the device
    fn close(&mut self);
}

//! Frame encoding
//!
//! The encode stage drives its codec through [`FrameTransformer`]: submit one
//! frame, then retrieve until the codec asks for more input. Codecs are picked
//! by name with [`open_encoder`].

#[cfg(feature = "ffmpeg")]
mod ffmpeg;
mod raw;

#[cfg(feature = "ffmpeg")]
pub use ffmpeg::FfmpegEncoder;
pub use raw::RawEncoder;

use crate::config::EncoderConfig;
use crate::error::CapabilityError;
use crate::pipeline::types::{EncodedPacket, RawFrame};

/// Result of asking a codec for output
///
/// "Needs more input" and "has nothing left" are distinct: the first is the
/// normal state between submissions, the second only follows a flush.
#[derive(Debug)]
pub enum Retrieved {
    /// One encoded packet, in output order
    Unit(EncodedPacket),
    /// Nothing available until another frame is submitted
    NeedsInput,
    /// Flushed and fully drained; no further output will ever appear
    Exhausted,
}

/// A codec consumed by the encode stage.
///
/// A codec may hold several frames before emitting a packet (lookahead,
/// B-frames) or emit several packets for one frame.
pub trait FrameTransformer: Send {
    /// Configure and open the codec. Failure aborts pipeline start-up.
    fn open(&mut self, config: &EncoderConfig) -> Result<(), CapabilityError>;

    /// Hand one frame to the codec
    fn submit(&mut self, frame: RawFrame) -> Result<(), CapabilityError>;

    /// Take the next available packet
    fn retrieve(&mut self) -> Result<Retrieved, CapabilityError>;

    /// Signal end of input; later `retrieve` calls drain what the codec still holds
    fn flush(&mut self) -> Result<(), CapabilityError>;

    /// Release the codec
    fn close(&mut self);
}

/// Pick an encoder implementation for the configured codec name
pub fn open_encoder(config: &EncoderConfig) -> Result<Box<dyn FrameTransformer>, CapabilityError> {
    match config.codec.as_str() {
        "raw" => Ok(Box::new(RawEncoder::new())),
        #[cfg(feature = "ffmpeg")]
        _ => Ok(Box::new(FfmpegEncoder::new())),
        #[cfg(not(feature = "ffmpeg"))]
        other => Err(CapabilityError::fatal(format!(
            "codec '{}' requires the ffmpeg feature",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_encoder_selects_raw() {
        let config = EncoderConfig {
            codec: "raw".to_string(),
            ..Default::default()
        };
        assert!(open_encoder(&config).is_ok());
    }

    #[cfg(not(feature = "ffmpeg"))]
    #[test]
    fn test_open_encoder_without_ffmpeg() {
        let err = open_encoder(&EncoderConfig::default()).err().unwrap();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("libx264"));
    }
}

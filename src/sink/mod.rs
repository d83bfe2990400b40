//! Delivery of encoded packets
//!
//! The transmit stage hands every packet to a [`UnitSink`]. The destination
//! scheme picks the implementation (see [`open_sink`]).

mod file;
mod tcp;

pub use file::FileSink;
pub use tcp::{RECORD_HEADER_LEN, TcpSink};

use crate::config::SinkConfig;
use crate::error::CapabilityError;
use crate::pipeline::types::EncodedPacket;

/// A network or storage endpoint consumed by the transmit stage
pub trait UnitSink: Send {
    /// Connect to the destination. Failure aborts pipeline start-up.
    fn open(&mut self, config: &SinkConfig) -> Result<(), CapabilityError>;

    /// Deliver one packet
    fn deliver(&mut self, packet: EncodedPacket) -> Result<(), CapabilityError>;

    /// Flush and disconnect
    fn close(&mut self);
}

/// Pick a sink implementation for the configured destination
pub fn open_sink(config: &SinkConfig) -> Result<Box<dyn UnitSink>, CapabilityError> {
    let destination = config.destination.trim();
    match destination.split_once("://") {
        Some(("tcp", _)) => Ok(Box::new(TcpSink::new())),
        Some(("file", _)) => Ok(Box::new(FileSink::new())),
        Some((scheme, _)) => Err(CapabilityError::fatal(format!(
            "unsupported destination scheme '{}'",
            scheme
        ))),
        None => Ok(Box::new(FileSink::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink_config(destination: &str) -> SinkConfig {
        SinkConfig {
            destination: destination.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_open_sink_by_scheme() {
        assert!(open_sink(&sink_config("tcp://127.0.0.1:8554")).is_ok());
        assert!(open_sink(&sink_config("file:///tmp/out.h264")).is_ok());
        assert!(open_sink(&sink_config("out.h264")).is_ok());

        let err = open_sink(&sink_config("rtsp://0.0.0.0:8554/live")).err().unwrap();
        assert!(err.is_fatal());
    }
}

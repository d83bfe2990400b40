//! TCP sink
//!
//! Each packet goes out as one framed record:
//!
//! ```text
//! | len: u32 BE | flags: u8 | stream: u32 BE | pts µs: i64 BE | payload (len bytes) |
//! ```
//!
//! `flags` bit 0 marks a keyframe.

use std::io::Write;
use std::net::TcpStream;

use bytes::{BufMut, BytesMut};
use log::{info, warn};

use crate::config::SinkConfig;
use crate::error::CapabilityError;
use crate::pipeline::types::EncodedPacket;
use crate::sink::UnitSink;

/// Bytes preceding the payload of every record
pub const RECORD_HEADER_LEN: usize = 4 + 1 + 4 + 8;

const FLAG_KEYFRAME: u8 = 0x01;

pub struct TcpSink {
    stream: Option<TcpStream>,
    record: BytesMut,
    peer: String,
    sent: u64,
}

impl TcpSink {
    pub fn new() -> Self {
        Self {
            stream: None,
            record: BytesMut::new(),
            peer: String::new(),
            sent: 0,
        }
    }

    /// Serialize one packet into `buf`
    pub fn encode_record(packet: &EncodedPacket, buf: &mut BytesMut) {
        buf.reserve(RECORD_HEADER_LEN + packet.size());
        buf.put_u32(packet.size() as u32);
        buf.put_u8(if packet.is_keyframe { FLAG_KEYFRAME } else { 0 });
        buf.put_u32(packet.stream_index);
        buf.put_i64(packet.pts.micros);
        buf.put_slice(&packet.data);
    }
}

impl Default for TcpSink {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitSink for TcpSink {
    fn open(&mut self, config: &SinkConfig) -> Result<(), CapabilityError> {
        let destination = config.destination.trim();
        let addr = destination.strip_prefix("tcp://").unwrap_or(destination);

        let stream = TcpStream::connect(addr)
            .map_err(|e| CapabilityError::fatal(format!("cannot connect to {}: {}", addr, e)))?;
        if let Some(nodelay) = config.flag("nodelay") {
            if let Err(e) = stream.set_nodelay(nodelay) {
                warn!("TcpSink: cannot set TCP_NODELAY: {}", e);
            }
        }

        info!("TcpSink: connected to {}", addr);
        self.stream = Some(stream);
        self.peer = addr.to_string();
        self.sent = 0;
        Ok(())
    }

    fn deliver(&mut self, packet: EncodedPacket) -> Result<(), CapabilityError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| CapabilityError::fatal("tcp sink used before open"))?;

        self.record.clear();
        Self::encode_record(&packet, &mut self.record);
        stream.write_all(&self.record)?;
        self.sent += 1;
        Ok(())
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.shutdown(std::net::Shutdown::Both) {
                warn!("TcpSink: shutdown of {} failed: {}", self.peer, e);
            }
            info!("TcpSink: disconnected from {} after {} packets", self.peer, self.sent);
        }
    }
}

//! Core types for the pipeline system

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Timestamp representation for media units
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    /// Microseconds since stream start
    pub micros: i64,
}

impl Timestamp {
    /// Create a new timestamp from microseconds
    pub fn from_micros(micros: i64) -> Self {
        Self { micros }
    }

    /// Timestamp of the `index`-th frame of a constant-rate stream
    pub fn from_frame_index(index: u64, framerate: u32) -> Self {
        let framerate = framerate.max(1) as i64;
        Self {
            micros: index as i64 * 1_000_000 / framerate,
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}µs", self.micros)
    }
}

/// Pixel layout of an uncompressed frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// Packed 8-bit B, G, R, A (what X11 and desktop grabbers produce)
    Bgra,
    /// Planar Y followed by interleaved UV at half resolution
    Nv12,
    /// Planar Y, U, V, chroma at half resolution
    Yuv420p,
}

impl PixelFormat {
    pub fn name(&self) -> &'static str {
        match self {
            PixelFormat::Bgra => "bgra",
            PixelFormat::Nv12 => "nv12",
            PixelFormat::Yuv420p => "yuv420p",
        }
    }

    /// Number of bytes of a tightly packed frame in this layout
    pub fn frame_size(&self, width: u32, height: u32) -> usize {
        let (w, h) = (width as usize, height as usize);
        match self {
            PixelFormat::Bgra => w * h * 4,
            PixelFormat::Nv12 | PixelFormat::Yuv420p => w * h + 2 * (w.div_ceil(2) * h.div_ceil(2)),
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Uncompressed frame travelling from the capture stage to the encode stage.
///
/// Move-only: exactly one stage owns a frame at any time.
pub struct RawFrame {
    /// Tightly packed pixel data
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Presentation timestamp
    pub pts: Timestamp,
}

impl RawFrame {
    /// Build a frame, returning `None` when `data` does not match the layout size
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
        pts: Timestamp,
    ) -> Option<Self> {
        if data.len() != format.frame_size(width, height) {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
            format,
            pts,
        })
    }

    /// Get the size of the frame data in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

impl std::fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("pts", &self.pts)
            .field("size", &self.size())
            .finish()
    }
}

/// Compressed unit travelling from the encode stage to the transmit stage.
///
/// Move-only, like [`RawFrame`].
pub struct EncodedPacket {
    /// Compressed payload
    pub data: Bytes,
    /// Whether this packet starts an independently decodable unit
    pub is_keyframe: bool,
    /// Logical stream this packet belongs to
    pub stream_index: u32,
    /// Presentation timestamp
    pub pts: Timestamp,
    /// Decode timestamp, differs from PTS when B-frames reorder output
    pub dts: Timestamp,
}

impl EncodedPacket {
    /// Create a packet whose decode order equals its presentation order
    pub fn new(data: Bytes, pts: Timestamp, is_keyframe: bool) -> Self {
        Self {
            data,
            is_keyframe,
            stream_index: 0,
            pts,
            dts: pts,
        }
    }

    pub fn with_stream_index(mut self, stream_index: u32) -> Self {
        self.stream_index = stream_index;
        self
    }

    pub fn with_dts(mut self, dts: Timestamp) -> Self {
        self.dts = dts;
        self
    }

    /// Get the size of the payload in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

impl std::fmt::Debug for EncodedPacket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedPacket")
            .field("stream_index", &self.stream_index)
            .field("pts", &self.pts)
            .field("dts", &self.dts)
            .field("is_keyframe", &self.is_keyframe)
            .field("size", &self.size())
            .finish()
    }
}

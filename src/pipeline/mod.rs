//! Threaded media pipeline
//!
//! Stages run on dedicated threads and hand units to each other through
//! [`HandoffQueue`]s:
//!
//! ```text
//! CaptureStage → [RawFrame] → EncodeStage → [EncodedPacket] → TransmitStage
//! ```
//!
//! A stage that runs out of input flushes what it still holds, stops its
//! output queue and returns, so end of stream travels downstream on its own.

pub mod health;
pub mod queue;
pub mod sender;
pub mod stage;
pub mod state;
pub mod types;

pub use health::{HealthSummary, StageHealth};
pub use queue::{HandoffQueue, OverflowPolicy, PushOutcome};
pub use stage::{PipelineStage, StageControl, StageReport};
pub use state::{PipelineState, StageState};
pub use types::{EncodedPacket, PixelFormat, RawFrame, Timestamp};

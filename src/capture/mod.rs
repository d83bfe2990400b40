//! Frame capture
//!
//! The capture stage talks to its device through [`FrameProducer`]. Real
//! grabbers live with the application; this module ships the trait and a
//! synthetic test pattern.

mod test_pattern;
mod traits;

pub use test_pattern::TestPatternCapture;
pub use traits::FrameProducer;

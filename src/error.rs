//! Error types for the capture → encode → stream pipeline
//!
//! Capabilities report failures as [`CapabilityError`], which tells the owning
//! stage whether to skip the unit or give up. The coordinator surfaces
//! everything else as [`PipelineError`].

use std::fmt;

use thiserror::Error;

/// Identity of one of the three pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Capture,
    Encode,
    Transmit,
}

impl StageKind {
    pub fn name(&self) -> &'static str {
        match self {
            StageKind::Capture => "CaptureStage",
            StageKind::Encode => "EncodeStage",
            StageKind::Transmit => "TransmitStage",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure reported by an external capability (capture device, codec, network sink)
#[derive(Error, Debug)]
pub enum CapabilityError {
    /// One unit was rejected; the stage logs it and moves on
    #[error("unit rejected: {0}")]
    Unit(#[source] anyhow::Error),

    /// The capability cannot be used anymore; the stage terminates
    #[error("capability unusable: {0}")]
    Fatal(#[source] anyhow::Error),
}

impl CapabilityError {
    pub fn unit(msg: impl fmt::Display) -> Self {
        CapabilityError::Unit(anyhow::anyhow!("{}", msg))
    }

    pub fn fatal(msg: impl fmt::Display) -> Self {
        CapabilityError::Fatal(anyhow::anyhow!("{}", msg))
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, CapabilityError::Fatal(_))
    }
}

impl From<std::io::Error> for CapabilityError {
    /// I/O errors that leave the handle usable are per-unit, anything else is fatal
    fn from(e: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match e.kind() {
            ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut => {
                CapabilityError::Unit(e.into())
            }
            _ => CapabilityError::Fatal(e.into()),
        }
    }
}

/// Errors surfaced by the pipeline coordinator
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A capability failed to open during start-up
    #[error("{stage} failed to initialize: {source}")]
    Initialization {
        stage: StageKind,
        #[source]
        source: CapabilityError,
    },

    /// The requested lifecycle transition is not allowed
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidState { from: String, to: String },

    /// The stage thread could not be spawned
    #[error("Failed to spawn {stage} thread: {source}")]
    Spawn {
        stage: StageKind,
        #[source]
        source: std::io::Error,
    },

    /// A stage terminated on a fatal capability error while running
    #[error("{stage} failed: {reason}")]
    StageFailed { stage: StageKind, reason: String },

    /// A stage thread panicked
    #[error("{stage} thread panicked")]
    StagePanicked { stage: StageKind },

    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience Result type using the pipeline error
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_error_classification() {
        assert!(!CapabilityError::unit("bad frame").is_fatal());
        assert!(CapabilityError::fatal("device gone").is_fatal());

        let would_block = std::io::Error::from(std::io::ErrorKind::WouldBlock);
        assert!(!CapabilityError::from(would_block).is_fatal());

        let reset = std::io::Error::from(std::io::ErrorKind::ConnectionReset);
        assert!(CapabilityError::from(reset).is_fatal());
    }

    #[test]
    fn test_initialization_error_message() {
        let err = PipelineError::Initialization {
            stage: StageKind::Encode,
            source: CapabilityError::fatal("codec 'libx264' not found"),
        };
        assert_eq!(
            err.to_string(),
            "EncodeStage failed to initialize: capability unusable: codec 'libx264' not found"
        );
    }
}

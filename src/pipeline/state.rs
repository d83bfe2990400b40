//! Pipeline and stage state management

use std::time::Instant;

/// Coordinator state machine
///
/// `Idle → Starting → Running → Stopping → Stopped`. A failed start goes
/// straight from `Starting` to `Stopping`. A stopped pipeline cannot be restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Pipeline is built but not started
    Idle,

    /// Capabilities are being opened and stage threads spawned
    Starting,

    /// Stage threads are running
    Running {
        /// When the pipeline started running
        started_at: Instant,
    },

    /// Shutdown sequence in progress
    Stopping,

    /// All stage threads have terminated
    Stopped,
}

impl PipelineState {
    /// Check if this state transition is valid
    pub fn can_transition_to(&self, target: &PipelineState) -> bool {
        use PipelineState::*;

        match (self, target) {
            (Idle, Starting) => true,

            (Starting, Running { .. }) => true,
            (Starting, Stopping) => true, // Start-up aborted

            (Running { .. }, Stopping) => true,

            (Stopping, Stopped) => true,

            (Stopped, _) => false,

            (a, b) if a == b => true,

            _ => false,
        }
    }

    /// Get a human-readable description of this state
    pub fn description(&self) -> &'static str {
        match self {
            PipelineState::Idle => "Idle",
            PipelineState::Starting => "Starting",
            PipelineState::Running { .. } => "Running",
            PipelineState::Stopping => "Stopping",
            PipelineState::Stopped => "Stopped",
        }
    }

    /// Check if the pipeline is running
    pub fn is_running(&self) -> bool {
        matches!(self, PipelineState::Running { .. })
    }

    /// Check if the pipeline is stopped or stopping
    pub fn is_stopped(&self) -> bool {
        matches!(self, PipelineState::Stopped | PipelineState::Stopping)
    }

    /// Get the duration since the pipeline started (if running)
    pub fn running_duration(&self) -> Option<std::time::Duration> {
        if let PipelineState::Running { started_at } = self {
            Some(started_at.elapsed())
        } else {
            None
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Lifecycle of a single stage thread.
/// Stored as `u8` so stage threads can publish it without locking.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StageState {
    /// Built by the coordinator, thread not yet running
    Created = 0,
    /// Pulling, transforming and pushing units
    Running = 1,
    /// Input ended; flushing internally buffered output
    Draining = 2,
    /// Output queue stopped and thread returned (or about to)
    Terminated = 3,
}

impl StageState {
    /// Convert from u8 value. Returns Terminated for invalid values.
    #[inline]
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => StageState::Created,
            1 => StageState::Running,
            2 => StageState::Draining,
            _ => StageState::Terminated,
        }
    }
}

impl std::fmt::Display for StageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StageState::Created => "created",
            StageState::Running => "running",
            StageState::Draining => "draining",
            StageState::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

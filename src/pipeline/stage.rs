//! Pipeline stage trait and per-stage control block
//!
//! Every stage runs on its own thread. The coordinator keeps an
//! `Arc<StageControl>` for each one to request a stop and to observe its
//! lifecycle and counters while the thread owns the stage itself.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::error::{PipelineError, StageKind};
use crate::pipeline::health::{HealthSummary, StageHealth};
use crate::pipeline::queue::{HandoffQueue, PushOutcome};
use crate::pipeline::state::StageState;

/// Trait for pipeline stages that move media units between queues
pub trait PipelineStage: Send {
    /// Run the stage to completion on the calling thread.
    ///
    /// Returns once the output queue (if any) has been stopped. A fatal
    /// capability error is reported as [`PipelineError::StageFailed`].
    fn run(&mut self) -> Result<StageReport, PipelineError>;

    /// Get the name of this stage for logging
    fn name(&self) -> &'static str;
}

/// Final word of a stage thread that ended without a fatal error
#[derive(Debug, Clone)]
pub struct StageReport {
    pub stage: StageKind,
    pub summary: HealthSummary,
}

/// Shared between a stage thread and the coordinator
#[derive(Debug)]
pub struct StageControl {
    kind: StageKind,
    stop_requested: AtomicBool,
    state: AtomicU8,
    health: StageHealth,
}

impl StageControl {
    pub fn new(kind: StageKind) -> Self {
        Self {
            kind,
            stop_requested: AtomicBool::new(false),
            state: AtomicU8::new(StageState::Created as u8),
            health: StageHealth::new(),
        }
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    /// Ask the stage to finish. Queued input is still processed.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    pub fn state(&self) -> StageState {
        StageState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn set_state(&self, state: StageState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub fn health(&self) -> &StageHealth {
        &self.health
    }

    pub fn report(&self) -> StageReport {
        StageReport {
            stage: self.kind,
            summary: self.health.summary(self.kind.name()),
        }
    }
}

/// Push a unit downstream and account for it in `health`.
///
/// `size` and `is_keyframe` describe `unit` and are read before it moves
/// into the queue.
pub fn push_counted<T>(
    queue: &HandoffQueue<T>,
    unit: T,
    size: usize,
    is_keyframe: bool,
    health: &StageHealth,
) {
    match queue.push(unit) {
        PushOutcome::Queued => health.record_output(size, is_keyframe),
        PushOutcome::Evicted(_) => {
            health.record_output(size, is_keyframe);
            health.record_drop();
        }
        PushOutcome::Rejected(_) => health.record_drop(),
    }
}

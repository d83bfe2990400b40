//! Capture stage for the sender pipeline
//!
//! Polls the frame producer and pushes raw frames to the encode stage.

use std::sync::Arc;

use log::{error, info, warn};

use crate::capture::FrameProducer;
use crate::error::{CapabilityError, PipelineError, StageKind};
use crate::pipeline::queue::HandoffQueue;
use crate::pipeline::stage::{PipelineStage, StageControl, StageReport, push_counted};
use crate::pipeline::state::StageState;
use crate::pipeline::types::RawFrame;
use crate::utils::sos::SignalOfStop;

/// Capture stage: source of the pipeline
pub struct CaptureStage {
    producer: Box<dyn FrameProducer>,
    output: Arc<HandoffQueue<RawFrame>>,
    control: Arc<StageControl>,
    sos: SignalOfStop,
    closed: bool,
}

impl CaptureStage {
    /// The producer must already be open
    pub fn new(
        producer: Box<dyn FrameProducer>,
        output: Arc<HandoffQueue<RawFrame>>,
        control: Arc<StageControl>,
        sos: SignalOfStop,
    ) -> Self {
        Self {
            producer,
            output,
            control,
            sos,
            closed: false,
        }
    }

    fn close_producer(&mut self) {
        if !self.closed {
            self.closed = true;
            self.producer.close();
        }
    }

    fn should_stop(&self) -> bool {
        self.control.stop_requested() || self.sos.cancelled() || self.output.is_stopped()
    }

    fn forward(&self, frame: RawFrame) {
        let size = frame.size();
        push_counted(&self.output, frame, size, false, self.control.health());
    }

    fn fail(&self, reason: String) -> PipelineError {
        error!("{}: {}", self.name(), reason);
        PipelineError::StageFailed {
            stage: StageKind::Capture,
            reason,
        }
    }

    fn capture_loop(&mut self) -> Result<(), PipelineError> {
        while !self.should_stop() {
            match self.producer.next_raw_unit() {
                Ok(Some(frame)) => {
                    self.control.health().record_input();
                    self.forward(frame);
                }
                Ok(None) => {
                    info!("{}: end of stream", self.name());
                    break;
                }
                Err(CapabilityError::Unit(e)) => {
                    self.control.health().record_unit_error();
                    warn!("{}: frame skipped: {}", self.name(), e);
                }
                Err(fatal) => return Err(self.fail(fatal.to_string())),
            }
        }

        Ok(())
    }

    /// Push whatever the producer still holds
    fn drain(&mut self) -> Result<(), PipelineError> {
        while !self.output.is_stopped() {
            match self.producer.drain_raw_unit() {
                Ok(Some(frame)) => {
                    self.control.health().record_input();
                    self.forward(frame);
                }
                Ok(None) => break,
                Err(CapabilityError::Unit(e)) => {
                    self.control.health().record_unit_error();
                    warn!("{}: drain interrupted: {}", self.name(), e);
                    break;
                }
                Err(fatal) => return Err(self.fail(fatal.to_string())),
            }
        }
        Ok(())
    }
}

impl PipelineStage for CaptureStage {
    fn run(&mut self) -> Result<StageReport, PipelineError> {
        self.control.set_state(StageState::Running);
        info!("{}: started", self.name());

        let result = self.capture_loop().and_then(|()| {
            self.control.set_state(StageState::Draining);
            self.drain()
        });

        self.output.stop();
        self.close_producer();
        self.control.set_state(StageState::Terminated);
        info!(
            "{}: finished after {} frames",
            self.name(),
            self.control.health().units_out()
        );

        result.map(|()| self.control.report())
    }

    fn name(&self) -> &'static str {
        "CaptureStage"
    }
}

impl Drop for CaptureStage {
    fn drop(&mut self) {
        // Also reached when `run` unwinds or the stage never got a thread
        self.output.stop();
        self.close_producer();
        self.control.set_state(StageState::Terminated);
    }
}

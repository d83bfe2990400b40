//! Encode stage for the sender pipeline
//!
//! Consumes raw frames, drives the codec through its submit/retrieve exchange
//! and pushes encoded packets to the transmit stage. The exchange is an
//! explicit [`EncoderPhase`] machine so each transition can be tested alone.

use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::encoder::{FrameTransformer, Retrieved};
use crate::error::{CapabilityError, PipelineError, StageKind};
use crate::pipeline::queue::HandoffQueue;
use crate::pipeline::stage::{PipelineStage, StageControl, StageReport, push_counted};
use crate::pipeline::state::StageState;
use crate::pipeline::types::{EncodedPacket, RawFrame};

/// Where the encode stage is in its exchange with the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderPhase {
    /// Waiting for the next raw frame
    AcceptingInput,
    /// A frame was submitted; retrieving until the codec needs more input
    DrainingOutput,
    /// Input ended and the codec was flushed; retrieving what it still holds
    Flushing,
    /// The codec has nothing left
    Finished,
}

/// What happened in the exchange with the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// A frame was accepted by the codec
    Submitted,
    /// The input queue is stopped and empty
    InputEnded,
    /// The codec has no output until it gets another frame
    NeedsInput,
    /// The codec will never produce output again
    Exhausted,
}

impl EncoderPhase {
    pub fn next(self, event: PhaseEvent) -> EncoderPhase {
        use EncoderPhase::*;
        use PhaseEvent::*;

        match (self, event) {
            (Finished, _) => Finished,
            (_, Exhausted) => Finished,
            (AcceptingInput, Submitted) => DrainingOutput,
            (AcceptingInput, InputEnded) => Flushing,
            (DrainingOutput, NeedsInput) => AcceptingInput,
            // A flushed codec asking for input has nothing more to give
            (Flushing, NeedsInput) => Finished,
            (phase, _) => phase,
        }
    }

    /// Phases in which `retrieve` is called
    pub fn is_retrieving(&self) -> bool {
        matches!(self, EncoderPhase::DrainingOutput | EncoderPhase::Flushing)
    }
}

/// Encode stage: transforms raw frames into encoded packets
pub struct EncodeStage {
    transformer: Box<dyn FrameTransformer>,
    input: Arc<HandoffQueue<RawFrame>>,
    output: Arc<HandoffQueue<EncodedPacket>>,
    control: Arc<StageControl>,
    phase: EncoderPhase,
    closed: bool,
}

impl EncodeStage {
    /// The transformer must already be open
    pub fn new(
        transformer: Box<dyn FrameTransformer>,
        input: Arc<HandoffQueue<RawFrame>>,
        output: Arc<HandoffQueue<EncodedPacket>>,
        control: Arc<StageControl>,
    ) -> Self {
        Self {
            transformer,
            input,
            output,
            control,
            phase: EncoderPhase::AcceptingInput,
            closed: false,
        }
    }

    fn close_transformer(&mut self) {
        if !self.closed {
            self.closed = true;
            self.transformer.close();
        }
    }

    pub fn phase(&self) -> EncoderPhase {
        self.phase
    }

    fn forward(&self, packet: EncodedPacket) {
        let size = packet.size();
        let is_keyframe = packet.is_keyframe;
        push_counted(&self.output, packet, size, is_keyframe, self.control.health());
    }

    fn fail(&self, e: CapabilityError) -> PipelineError {
        error!("{}: {}", self.name(), e);
        // Upstream observes the stopped input and gives up as well
        self.input.stop();
        PipelineError::StageFailed {
            stage: StageKind::Encode,
            reason: e.to_string(),
        }
    }

    /// Perform one step of the exchange from the current phase
    fn step(&mut self) -> Result<(), PipelineError> {
        match self.phase {
            EncoderPhase::AcceptingInput => self.accept(),
            EncoderPhase::DrainingOutput | EncoderPhase::Flushing => self.retrieve(),
            EncoderPhase::Finished => Ok(()),
        }
    }

    fn accept(&mut self) -> Result<(), PipelineError> {
        if self.output.is_stopped() {
            info!("{}: output closed downstream", self.name());
            self.input.stop();
            self.phase = EncoderPhase::Finished;
            return Ok(());
        }
        if self.control.stop_requested() {
            self.input.stop();
        }

        match self.input.wait_and_pop() {
            Some(frame) => {
                self.control.health().record_input();
                match self.transformer.submit(frame) {
                    Ok(()) => self.phase = self.phase.next(PhaseEvent::Submitted),
                    Err(CapabilityError::Unit(e)) => {
                        self.control.health().record_unit_error();
                        warn!("{}: frame rejected: {}", self.name(), e);
                    }
                    Err(fatal) => return Err(self.fail(fatal)),
                }
            }
            None => {
                debug!("{}: end of input, flushing", self.name());
                self.control.set_state(StageState::Draining);
                match self.transformer.flush() {
                    Ok(()) => self.phase = self.phase.next(PhaseEvent::InputEnded),
                    Err(CapabilityError::Unit(e)) => {
                        warn!("{}: flush failed: {}", self.name(), e);
                        self.phase = EncoderPhase::Finished;
                    }
                    Err(fatal) => return Err(self.fail(fatal)),
                }
            }
        }
        Ok(())
    }

    fn retrieve(&mut self) -> Result<(), PipelineError> {
        match self.transformer.retrieve() {
            Ok(Retrieved::Unit(packet)) => self.forward(packet),
            Ok(Retrieved::NeedsInput) => self.phase = self.phase.next(PhaseEvent::NeedsInput),
            Ok(Retrieved::Exhausted) => {
                if self.phase == EncoderPhase::DrainingOutput {
                    info!("{}: codec ended before input did", self.name());
                    self.input.stop();
                }
                self.phase = self.phase.next(PhaseEvent::Exhausted);
            }
            Err(CapabilityError::Unit(e)) => {
                // Ends the current round; during a flush it ends the flush
                self.control.health().record_unit_error();
                warn!("{}: retrieve failed: {}", self.name(), e);
                self.phase = self.phase.next(PhaseEvent::NeedsInput);
            }
            Err(fatal) => return Err(self.fail(fatal)),
        }
        Ok(())
    }
}

impl PipelineStage for EncodeStage {
    fn run(&mut self) -> Result<StageReport, PipelineError> {
        self.control.set_state(StageState::Running);
        info!("{}: started", self.name());

        let mut result = Ok(());
        while self.phase != EncoderPhase::Finished {
            if let Err(e) = self.step() {
                result = Err(e);
                break;
            }
        }

        self.output.stop();
        self.close_transformer();
        self.control.set_state(StageState::Terminated);
        info!(
            "{}: finished after {} frames, {} packets",
            self.name(),
            self.control.health().units_in(),
            self.control.health().units_out()
        );

        result.map(|()| self.control.report())
    }

    fn name(&self) -> &'static str {
        "EncodeStage"
    }
}

impl Drop for EncodeStage {
    fn drop(&mut self) {
        self.input.stop();
        self.output.stop();
        self.close_transformer();
        self.control.set_state(StageState::Terminated);
    }
}

//! Transmit stage for the sender pipeline
//!
//! Hands every encoded packet to the unit sink, in the order received.

use std::sync::Arc;

use log::{error, info, warn};

use crate::error::{CapabilityError, PipelineError, StageKind};
use crate::pipeline::queue::HandoffQueue;
use crate::pipeline::stage::{PipelineStage, StageControl, StageReport};
use crate::pipeline::state::StageState;
use crate::pipeline::types::EncodedPacket;
use crate::sink::UnitSink;

/// Transmit stage: end of the pipeline
pub struct TransmitStage {
    sink: Box<dyn UnitSink>,
    input: Arc<HandoffQueue<EncodedPacket>>,
    control: Arc<StageControl>,
    closed: bool,
}

impl TransmitStage {
    /// The sink must already be open
    pub fn new(
        sink: Box<dyn UnitSink>,
        input: Arc<HandoffQueue<EncodedPacket>>,
        control: Arc<StageControl>,
    ) -> Self {
        Self {
            sink,
            input,
            control,
            closed: false,
        }
    }

    fn close_sink(&mut self) {
        if !self.closed {
            self.closed = true;
            self.sink.close();
        }
    }

    fn transmit_loop(&mut self) -> Result<(), PipelineError> {
        loop {
            if self.control.stop_requested() {
                self.input.stop();
            }

            let Some(packet) = self.input.wait_and_pop() else {
                self.control.set_state(StageState::Draining);
                return Ok(());
            };
            self.control.health().record_input();

            let size = packet.size();
            let is_keyframe = packet.is_keyframe;
            match self.sink.deliver(packet) {
                Ok(()) => self.control.health().record_output(size, is_keyframe),
                Err(CapabilityError::Unit(e)) => {
                    self.control.health().record_unit_error();
                    warn!("{}: packet not delivered: {}", self.name(), e);
                }
                Err(fatal) => {
                    error!("{}: {}", self.name(), fatal);
                    self.input.stop();
                    return Err(PipelineError::StageFailed {
                        stage: StageKind::Transmit,
                        reason: fatal.to_string(),
                    });
                }
            }
        }
    }
}

impl PipelineStage for TransmitStage {
    fn run(&mut self) -> Result<StageReport, PipelineError> {
        self.control.set_state(StageState::Running);
        info!("{}: started", self.name());

        let result = self.transmit_loop();

        self.close_sink();
        self.control.set_state(StageState::Terminated);
        info!(
            "{}: finished after {} packets",
            self.name(),
            self.control.health().units_out()
        );

        result.map(|()| self.control.report())
    }

    fn name(&self) -> &'static str {
        "TransmitStage"
    }
}

impl Drop for TransmitStage {
    fn drop(&mut self) {
        self.input.stop();
        self.close_sink();
        self.control.set_state(StageState::Terminated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SinkConfig;
    use crate::pipeline::types::Timestamp;
    use bytes::Bytes;
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct RecordingSink {
        delivered: Arc<Mutex<Vec<i64>>>,
        reject: Option<i64>,
        fatal: Option<i64>,
        control: Option<Arc<StageControl>>,
        closes: Arc<Mutex<Vec<StageState>>>,
    }

    impl UnitSink for RecordingSink {
        fn open(&mut self, _config: &SinkConfig) -> Result<(), CapabilityError> {
            Ok(())
        }

        fn deliver(&mut self, packet: EncodedPacket) -> Result<(), CapabilityError> {
            let pts = packet.pts.micros;
            if self.fatal == Some(pts) {
                return Err(CapabilityError::fatal("connection reset"));
            }
            if self.reject == Some(pts) {
                return Err(CapabilityError::unit("send buffer full"));
            }
            self.delivered.lock().unwrap().push(pts);
            Ok(())
        }

        fn close(&mut self) {
            let state = self
                .control
                .as_ref()
                .map_or(StageState::Created, |control| control.state());
            self.closes.lock().unwrap().push(state);
        }
    }

    fn packet(pts: i64) -> EncodedPacket {
        EncodedPacket::new(Bytes::from_static(b"nal"), Timestamp::from_micros(pts), false)
    }

    fn stage_with(sink: RecordingSink) -> (TransmitStage, Arc<HandoffQueue<EncodedPacket>>) {
        let input = Arc::new(HandoffQueue::new());
        let control = Arc::new(StageControl::new(StageKind::Transmit));
        (TransmitStage::new(Box::new(sink), input.clone(), control), input)
    }

    #[test]
    fn test_delivers_in_order_until_end_of_input() {
        let sink = RecordingSink::default();
        let (mut stage, input) = stage_with(sink.clone());
        for pts in 0..3 {
            let _ = input.push(packet(pts));
        }
        input.stop();

        let report = stage.run().unwrap();
        assert_eq!(report.summary.units_out, 3);
        assert_eq!(report.summary.bytes_out, 9);
        assert_eq!(*sink.delivered.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_unit_error_does_not_end_stage() {
        let sink = RecordingSink {
            reject: Some(1),
            ..Default::default()
        };
        let (mut stage, input) = stage_with(sink.clone());
        for pts in 0..3 {
            let _ = input.push(packet(pts));
        }
        input.stop();

        let report = stage.run().unwrap();
        assert_eq!(report.summary.unit_errors, 1);
        assert_eq!(*sink.delivered.lock().unwrap(), vec![0, 2]);
    }

    #[test]
    fn test_fatal_error_stops_input() {
        let sink = RecordingSink {
            fatal: Some(0),
            ..Default::default()
        };
        let (mut stage, input) = stage_with(sink);
        let _ = input.push(packet(0));

        assert!(stage.run().is_err());
        assert!(input.is_stopped());
    }

    #[test]
    fn test_blocked_stage_wakes_on_stop() {
        let (mut stage, input) = stage_with(RecordingSink::default());
        let handle = thread::spawn(move || stage.run().is_ok());

        thread::sleep(Duration::from_millis(50));
        input.stop();
        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_end_of_input_passes_through_draining() {
        let input = Arc::new(HandoffQueue::new());
        let control = Arc::new(StageControl::new(StageKind::Transmit));
        let sink = RecordingSink {
            control: Some(control.clone()),
            ..Default::default()
        };
        let mut stage = TransmitStage::new(Box::new(sink.clone()), input.clone(), control.clone());
        let _ = input.push(packet(0));
        input.stop();

        stage.run().unwrap();
        drop(stage);

        // The sink is closed once, after the stage saw the end of input
        assert_eq!(*sink.closes.lock().unwrap(), vec![StageState::Draining]);
        assert_eq!(control.state(), StageState::Terminated);
    }

    #[test]
    fn test_unrun_stage_closes_sink_on_drop() {
        let sink = RecordingSink::default();
        let (stage, input) = stage_with(sink.clone());

        drop(stage);
        assert_eq!(sink.closes.lock().unwrap().len(), 1);
        assert!(input.is_stopped());
    }
}

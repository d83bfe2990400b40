//! Sender pipeline coordinator
//!
//! Chains capture → encode → transmit stages and manages their lifecycle.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{error, info, warn};

use crate::capture::FrameProducer;
use crate::config::PipelineConfig;
use crate::encoder::FrameTransformer;
use crate::error::{PipelineError, Result, StageKind};
use crate::pipeline::health::HealthSummary;
use crate::pipeline::queue::HandoffQueue;
use crate::pipeline::sender::capture_stage::CaptureStage;
use crate::pipeline::sender::encode_stage::EncodeStage;
use crate::pipeline::sender::transmit_stage::TransmitStage;
use crate::pipeline::stage::{PipelineStage, StageControl, StageReport};
use crate::pipeline::state::{PipelineState, StageState};
use crate::pipeline::types::{EncodedPacket, RawFrame};
use crate::sink::UnitSink;
use crate::utils::sos::SignalOfStop;

type StageThread = JoinHandle<std::result::Result<StageReport, PipelineError>>;

/// Capabilities waiting for `start`
struct Capabilities {
    producer: Box<dyn FrameProducer>,
    transformer: Box<dyn FrameTransformer>,
    sink: Box<dyn UnitSink>,
}

/// Coordinates the sender pipeline: Capture → Encode → Transmit
///
/// Owns the three capabilities until [`start`](Self::start) hands each one to
/// its stage thread. Shutdown always runs source first so every packet already
/// captured reaches the sink.
pub struct SenderCoordinator {
    capabilities: Option<Capabilities>,
    sos: SignalOfStop,
    state: PipelineState,

    capture: Arc<StageControl>,
    encode: Arc<StageControl>,
    transmit: Arc<StageControl>,

    raw_queue: Option<Arc<HandoffQueue<RawFrame>>>,
    packet_queue: Option<Arc<HandoffQueue<EncodedPacket>>>,

    capture_thread: Option<StageThread>,
    encode_thread: Option<StageThread>,
    transmit_thread: Option<StageThread>,
}

impl SenderCoordinator {
    /// Create a new sender coordinator. Nothing is opened until `start`.
    pub fn new(
        producer: Box<dyn FrameProducer>,
        transformer: Box<dyn FrameTransformer>,
        sink: Box<dyn UnitSink>,
        sos: SignalOfStop,
    ) -> Self {
        Self {
            capabilities: Some(Capabilities {
                producer,
                transformer,
                sink,
            }),
            sos,
            state: PipelineState::Idle,
            capture: Arc::new(StageControl::new(StageKind::Capture)),
            encode: Arc::new(StageControl::new(StageKind::Encode)),
            transmit: Arc::new(StageControl::new(StageKind::Transmit)),
            raw_queue: None,
            packet_queue: None,
            capture_thread: None,
            encode_thread: None,
            transmit_thread: None,
        }
    }

    /// Get the current pipeline state
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Lifecycle of each stage, in pipeline order
    pub fn stage_states(&self) -> [(StageKind, StageState); 3] {
        [
            (StageKind::Capture, self.capture.state()),
            (StageKind::Encode, self.encode.state()),
            (StageKind::Transmit, self.transmit.state()),
        ]
    }

    /// Health snapshot of each stage, in pipeline order
    pub fn health(&self) -> Vec<HealthSummary> {
        [&self.capture, &self.encode, &self.transmit]
            .iter()
            .map(|control| control.health().summary(control.kind().name()))
            .collect()
    }

    /// True while started and at least one stage thread is still working
    pub fn is_running(&self) -> bool {
        self.state.is_running()
            && [&self.capture, &self.encode, &self.transmit]
                .iter()
                .any(|control| control.state() != StageState::Terminated)
    }

    fn transition(&mut self, target: PipelineState) -> Result<()> {
        if !self.state.can_transition_to(&target) {
            return Err(PipelineError::InvalidState {
                from: self.state.to_string(),
                to: target.to_string(),
            });
        }
        info!("SenderCoordinator: {} -> {}", self.state, target);
        self.state = target;
        Ok(())
    }

    /// Open every capability, then start the stage threads.
    ///
    /// If any capability fails to open, the ones already opened are closed
    /// and no thread is started.
    pub fn start(&mut self, config: &PipelineConfig) -> Result<()> {
        self.transition(PipelineState::Starting)?;

        let result = config
            .validate()
            .and_then(|()| self.open_capabilities(config))
            .and_then(|capabilities| self.spawn_stages(config, capabilities));

        match result {
            Ok(()) => self.transition(PipelineState::Running {
                started_at: Instant::now(),
            }),
            Err(e) => {
                error!("SenderCoordinator: start failed: {}", e);
                self.transition(PipelineState::Stopping)?;
                self.transition(PipelineState::Stopped)?;
                Err(e)
            }
        }
    }

    fn open_capabilities(&mut self, config: &PipelineConfig) -> Result<Capabilities> {
        let mut capabilities = self.capabilities.take().ok_or_else(|| {
            PipelineError::InvalidState {
                from: self.state.to_string(),
                to: PipelineState::Starting.to_string(),
            }
        })?;

        if let Err(source) = capabilities.producer.open(&config.capture) {
            return Err(PipelineError::Initialization {
                stage: StageKind::Capture,
                source,
            });
        }
        if let Err(source) = capabilities.transformer.open(&config.encoder) {
            capabilities.producer.close();
            return Err(PipelineError::Initialization {
                stage: StageKind::Encode,
                source,
            });
        }
        if let Err(source) = capabilities.sink.open(&config.sink) {
            capabilities.transformer.close();
            capabilities.producer.close();
            return Err(PipelineError::Initialization {
                stage: StageKind::Transmit,
                source,
            });
        }

        Ok(capabilities)
    }

    /// Start the threads downstream first, so a source never runs without a consumer
    fn spawn_stages(&mut self, config: &PipelineConfig, capabilities: Capabilities) -> Result<()> {
        let Capabilities {
            mut producer,
            mut transformer,
            sink,
        } = capabilities;

        let raw_queue = Arc::new(HandoffQueue::with_limit(
            config.queue.capacity,
            config.queue.overflow,
        ));
        let packet_queue = Arc::new(HandoffQueue::with_limit(
            config.queue.capacity,
            config.queue.overflow,
        ));
        self.raw_queue = Some(raw_queue.clone());
        self.packet_queue = Some(packet_queue.clone());

        let transmit = TransmitStage::new(sink, packet_queue.clone(), self.transmit.clone());
        match spawn_stage(StageKind::Transmit, transmit) {
            Ok(handle) => self.transmit_thread = Some(handle),
            Err(e) => {
                transformer.close();
                producer.close();
                return Err(e);
            }
        }

        let encode = EncodeStage::new(
            transformer,
            raw_queue.clone(),
            packet_queue,
            self.encode.clone(),
        );
        match spawn_stage(StageKind::Encode, encode) {
            Ok(handle) => self.encode_thread = Some(handle),
            Err(e) => {
                producer.close();
                self.shutdown_stages();
                return Err(e);
            }
        }

        let capture = CaptureStage::new(
            producer,
            raw_queue,
            self.capture.clone(),
            self.sos.clone(),
        );
        match spawn_stage(StageKind::Capture, capture) {
            Ok(handle) => self.capture_thread = Some(handle),
            Err(e) => {
                self.shutdown_stages();
                return Err(e);
            }
        }

        Ok(())
    }

    /// Stop the pipeline and block until all three threads have ended.
    ///
    /// Calling it again, or before `start`, does nothing. The first stage
    /// failure, if any, is returned once every thread is joined.
    pub fn stop(&mut self) -> Result<()> {
        if !self.state.is_running() {
            return Ok(());
        }
        let ran_for = self.state.running_duration();
        self.transition(PipelineState::Stopping)?;
        let result = self.shutdown_stages();
        self.finish(ran_for, result)
    }

    /// Block until the pipeline ends on its own (end of stream, a stage
    /// failure or the cancellation token).
    pub fn wait(&mut self) -> Result<()> {
        if !self.state.is_running() {
            return Ok(());
        }

        let mut first_error = None;
        for (kind, thread) in [
            (StageKind::Capture, self.capture_thread.take()),
            (StageKind::Encode, self.encode_thread.take()),
            (StageKind::Transmit, self.transmit_thread.take()),
        ] {
            if let Some(thread) = thread {
                keep_first(&mut first_error, join_stage(kind, thread));
            }
        }

        let ran_for = self.state.running_duration();
        self.transition(PipelineState::Stopping)?;
        self.finish(ran_for, first_error.map_or(Ok(()), Err))
    }

    /// Ordered stop: each stage is asked to finish and its input queue is
    /// stopped, then its thread is joined before moving downstream.
    fn shutdown_stages(&mut self) -> Result<()> {
        let mut first_error = None;

        if let Some(thread) = self.capture_thread.take() {
            self.capture.request_stop();
            keep_first(&mut first_error, join_stage(StageKind::Capture, thread));
        }
        if let Some(thread) = self.encode_thread.take() {
            self.encode.request_stop();
            if let Some(queue) = &self.raw_queue {
                queue.stop();
            }
            keep_first(&mut first_error, join_stage(StageKind::Encode, thread));
        }
        if let Some(thread) = self.transmit_thread.take() {
            self.transmit.request_stop();
            if let Some(queue) = &self.packet_queue {
                queue.stop();
            }
            keep_first(&mut first_error, join_stage(StageKind::Transmit, thread));
        }

        first_error.map_or(Ok(()), Err)
    }

    fn finish(&mut self, ran_for: Option<Duration>, result: Result<()>) -> Result<()> {
        self.transition(PipelineState::Stopped)?;
        if let Some(ran_for) = ran_for {
            info!("SenderCoordinator: ran for {:.1}s", ran_for.as_secs_f64());
        }
        for summary in self.health() {
            info!("Sender pipeline: {}", summary);
        }
        result
    }
}

impl Drop for SenderCoordinator {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("SenderCoordinator: {}", e);
        }
    }
}

fn spawn_stage<S>(kind: StageKind, mut stage: S) -> Result<StageThread>
where
    S: PipelineStage + 'static,
{
    thread::Builder::new()
        .name(kind.name().to_string())
        .spawn(move || stage.run())
        .map_err(|source| PipelineError::Spawn {
            stage: kind,
            source,
        })
}

fn join_stage(kind: StageKind, thread: StageThread) -> Result<()> {
    match thread.join() {
        Ok(Ok(report)) => {
            info!("{}: joined ({})", report.stage, report.summary);
            Ok(())
        }
        Ok(Err(e)) => Err(e),
        Err(_) => {
            error!("{} thread panicked", kind);
            Err(PipelineError::StagePanicked { stage: kind })
        }
    }
}

fn keep_first(first: &mut Option<PipelineError>, result: Result<()>) {
    if let Err(e) = result {
        if first.is_none() {
            *first = Some(e);
        } else {
            warn!("SenderCoordinator: additional stage failure: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CaptureConfig, EncoderConfig, SinkConfig};
    use crate::encoder::Retrieved;
    use crate::error::CapabilityError;
    use crate::pipeline::types::{PixelFormat, Timestamp};
    use bytes::Bytes;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::sync::{Condvar, Mutex};
    use std::time::Duration;

    fn frame(pts: i64) -> RawFrame {
        RawFrame::new(vec![0; 4], 1, 1, PixelFormat::Bgra, Timestamp::from_micros(pts)).unwrap()
    }

    /// Gate a test holds closed to keep the producer waiting
    #[derive(Clone, Default)]
    struct Gate {
        inner: Arc<(Mutex<bool>, Condvar)>,
    }

    impl Gate {
        fn open(&self) {
            let (lock, cvar) = &*self.inner;
            *lock.lock().unwrap() = true;
            cvar.notify_all();
        }

        fn wait(&self) {
            let (lock, cvar) = &*self.inner;
            let mut open = lock.lock().unwrap();
            while !*open {
                open = cvar.wait(open).unwrap();
            }
        }
    }

    /// Emits frames 0..count, optionally blocking on a gate before `gate_at`
    struct FakeProducer {
        next: i64,
        count: i64,
        gate_at: Option<(i64, Gate)>,
        fail_open: bool,
        closed: Arc<AtomicBool>,
        produced: Option<mpsc::Sender<i64>>,
    }

    impl FakeProducer {
        fn new(count: i64) -> Self {
            Self {
                next: 0,
                count,
                gate_at: None,
                fail_open: false,
                closed: Arc::new(AtomicBool::new(false)),
                produced: None,
            }
        }
    }

    impl FrameProducer for FakeProducer {
        fn open(&mut self, _config: &CaptureConfig) -> std::result::Result<(), CapabilityError> {
            if self.fail_open {
                return Err(CapabilityError::fatal("no capture device"));
            }
            Ok(())
        }

        fn next_raw_unit(&mut self) -> std::result::Result<Option<RawFrame>, CapabilityError> {
            if let Some((at, gate)) = &self.gate_at {
                if self.next == *at {
                    gate.wait();
                }
            }
            if self.next >= self.count {
                return Ok(None);
            }
            let pts = self.next;
            self.next += 1;
            if let Some(tx) = &self.produced {
                let _ = tx.send(pts);
            }
            Ok(Some(frame(pts)))
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    /// Echoes each frame's timestamp, holding `delay` frames back until flush
    struct EchoCodec {
        delay: usize,
        held: VecDeque<i64>,
        flushed: bool,
        fail_open: bool,
        fatal_at: Option<i64>,
        closed: Arc<AtomicBool>,
    }

    impl EchoCodec {
        fn new(delay: usize) -> Self {
            Self {
                delay,
                held: VecDeque::new(),
                flushed: false,
                fail_open: false,
                fatal_at: None,
                closed: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    impl FrameTransformer for EchoCodec {
        fn open(&mut self, _config: &EncoderConfig) -> std::result::Result<(), CapabilityError> {
            if self.fail_open {
                return Err(CapabilityError::fatal("codec not found"));
            }
            Ok(())
        }

        fn submit(&mut self, frame: RawFrame) -> std::result::Result<(), CapabilityError> {
            if self.fatal_at == Some(frame.pts.micros) {
                return Err(CapabilityError::fatal("codec crashed"));
            }
            self.held.push_back(frame.pts.micros);
            Ok(())
        }

        fn retrieve(&mut self) -> std::result::Result<Retrieved, CapabilityError> {
            if self.held.len() > self.delay || (self.flushed && !self.held.is_empty()) {
                let pts = self.held.pop_front().unwrap_or_default();
                return Ok(Retrieved::Unit(EncodedPacket::new(
                    Bytes::from_static(b"pkt"),
                    Timestamp::from_micros(pts),
                    false,
                )));
            }
            Ok(if self.flushed {
                Retrieved::Exhausted
            } else {
                Retrieved::NeedsInput
            })
        }

        fn flush(&mut self) -> std::result::Result<(), CapabilityError> {
            self.flushed = true;
            Ok(())
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        delivered: Arc<Mutex<Vec<i64>>>,
        fail_open: bool,
        fatal_at: Option<i64>,
        closed: Arc<AtomicUsize>,
    }

    impl UnitSink for RecordingSink {
        fn open(&mut self, _config: &SinkConfig) -> std::result::Result<(), CapabilityError> {
            if self.fail_open {
                return Err(CapabilityError::fatal("connection refused"));
            }
            Ok(())
        }

        fn deliver(&mut self, packet: EncodedPacket) -> std::result::Result<(), CapabilityError> {
            if self.fatal_at == Some(packet.pts.micros) {
                return Err(CapabilityError::fatal("broken pipe"));
            }
            self.delivered.lock().unwrap().push(packet.pts.micros);
            Ok(())
        }

        fn close(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn coordinator(
        producer: FakeProducer,
        codec: EchoCodec,
        sink: RecordingSink,
    ) -> SenderCoordinator {
        SenderCoordinator::new(
            Box::new(producer),
            Box::new(codec),
            Box::new(sink),
            SignalOfStop::new(),
        )
    }

    #[test]
    fn test_three_units_arrive_in_order() {
        let sink = RecordingSink::default();
        let mut pipeline = coordinator(FakeProducer::new(3), EchoCodec::new(0), sink.clone());

        pipeline.start(&PipelineConfig::default()).unwrap();
        pipeline.wait().unwrap();

        assert_eq!(*sink.delivered.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(sink.closed.load(Ordering::SeqCst), 1);
        assert!(pipeline.state().is_stopped());
        assert!(!pipeline.is_running());
        assert!(pipeline
            .stage_states()
            .iter()
            .all(|(_, state)| *state == StageState::Terminated));
    }

    #[test]
    fn test_stop_mid_flight_keeps_pushed_units() {
        let gate = Gate::default();
        let (tx, rx) = mpsc::channel();
        let mut producer = FakeProducer::new(3);
        producer.gate_at = Some((2, gate.clone()));
        producer.produced = Some(tx);
        let sink = RecordingSink::default();
        let mut pipeline = coordinator(producer, EchoCodec::new(0), sink.clone());

        pipeline.start(&PipelineConfig::default()).unwrap();
        assert!(pipeline.is_running());

        // Unit 1 pushed, unit 2 not yet produced
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 0);
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 1);

        let stopper = {
            let gate = gate.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                gate.open();
            })
        };
        pipeline.stop().unwrap();
        stopper.join().unwrap();

        // Unit 2 was produced after the stop request and still made it through
        let delivered = sink.delivered.lock().unwrap().clone();
        assert_eq!(delivered, vec![0, 1, 2]);
        assert_eq!(sink.closed.load(Ordering::SeqCst), 1);
        assert_eq!(pipeline.health()[0].units_out as usize, delivered.len());
        assert_eq!(pipeline.health()[2].units_out as usize, delivered.len());
        assert!(pipeline.state().is_stopped());
    }

    #[test]
    fn test_lookahead_codec_loses_nothing() {
        let sink = RecordingSink::default();
        let mut pipeline = coordinator(FakeProducer::new(5), EchoCodec::new(2), sink.clone());

        pipeline.start(&PipelineConfig::default()).unwrap();
        pipeline.wait().unwrap();

        assert_eq!(*sink.delivered.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        let health = pipeline.health();
        assert_eq!(health[1].units_in, 5);
        assert_eq!(health[1].units_out, 5);
        assert_eq!(health[2].units_out, 5);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut pipeline = coordinator(
            FakeProducer::new(2),
            EchoCodec::new(0),
            RecordingSink::default(),
        );
        // Before start
        pipeline.stop().unwrap();
        assert_eq!(*pipeline.state(), PipelineState::Idle);

        pipeline.start(&PipelineConfig::default()).unwrap();
        pipeline.stop().unwrap();
        let states = pipeline.stage_states();

        pipeline.stop().unwrap();
        assert!(pipeline.state().is_stopped());
        assert_eq!(pipeline.stage_states(), states);
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let mut pipeline = coordinator(
            FakeProducer::new(1),
            EchoCodec::new(0),
            RecordingSink::default(),
        );
        pipeline.start(&PipelineConfig::default()).unwrap();

        let err = pipeline.start(&PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidState { .. }));
        pipeline.stop().unwrap();
    }

    #[test]
    fn test_start_failure_closes_opened_capabilities() {
        let producer = FakeProducer::new(3);
        let producer_closed = producer.closed.clone();
        let codec = EchoCodec::new(0);
        let codec_closed = codec.closed.clone();
        let sink = RecordingSink {
            fail_open: true,
            ..Default::default()
        };
        let mut pipeline = coordinator(producer, codec, sink.clone());

        let err = pipeline.start(&PipelineConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Initialization {
                stage: StageKind::Transmit,
                ..
            }
        ));
        assert!(producer_closed.load(Ordering::SeqCst));
        assert!(codec_closed.load(Ordering::SeqCst));
        assert!(pipeline.state().is_stopped());
        assert!(!pipeline.is_running());
        // No stage ever ran
        assert!(pipeline
            .stage_states()
            .iter()
            .all(|(_, state)| *state == StageState::Created));
    }

    #[test]
    fn test_start_failure_on_first_capability() {
        let mut codec = EchoCodec::new(0);
        codec.fail_open = true;
        let codec_closed = codec.closed.clone();
        let mut pipeline = coordinator(FakeProducer::new(1), codec, RecordingSink::default());

        let err = pipeline.start(&PipelineConfig::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "EncodeStage failed to initialize: capability unusable: codec not found"
        );
        assert!(!codec_closed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_invalid_config_starts_nothing() {
        let mut config = PipelineConfig::default();
        config.encoder.framerate = 0;
        let mut pipeline = coordinator(
            FakeProducer::new(1),
            EchoCodec::new(0),
            RecordingSink::default(),
        );

        let err = pipeline.start(&config).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert!(pipeline.state().is_stopped());
    }

    #[test]
    fn test_mid_run_encoder_failure_shuts_down_cleanly() {
        let mut codec = EchoCodec::new(0);
        codec.fatal_at = Some(2);
        let sink = RecordingSink::default();
        let mut pipeline = coordinator(FakeProducer::new(10), codec, sink.clone());

        pipeline.start(&PipelineConfig::default()).unwrap();
        let err = pipeline.wait().unwrap_err();

        assert!(matches!(
            err,
            PipelineError::StageFailed {
                stage: StageKind::Encode,
                ..
            }
        ));
        // Units encoded before the failure were still delivered
        assert_eq!(*sink.delivered.lock().unwrap(), vec![0, 1]);
        assert_eq!(sink.closed.load(Ordering::SeqCst), 1);
        assert!(pipeline.state().is_stopped());
    }

    #[test]
    fn test_mid_run_sink_failure_stops_upstream() {
        let sink = RecordingSink {
            fatal_at: Some(1),
            ..Default::default()
        };
        let mut pipeline = coordinator(FakeProducer::new(i64::MAX), EchoCodec::new(0), sink);

        pipeline.start(&PipelineConfig::default()).unwrap();
        let err = pipeline.wait().unwrap_err();

        assert!(matches!(
            err,
            PipelineError::StageFailed {
                stage: StageKind::Transmit,
                ..
            }
        ));
    }

    #[test]
    fn test_cancellation_token_ends_pipeline() {
        let sos = SignalOfStop::new();
        let sink = RecordingSink::default();
        let mut pipeline = SenderCoordinator::new(
            Box::new(FakeProducer::new(i64::MAX)),
            Box::new(EchoCodec::new(1)),
            Box::new(sink.clone()),
            sos.clone(),
        );

        pipeline.start(&PipelineConfig::default()).unwrap();
        thread::sleep(Duration::from_millis(20));
        sos.cancel();
        pipeline.wait().unwrap();

        let delivered = sink.delivered.lock().unwrap();
        assert!(delivered.windows(2).all(|w| w[1] == w[0] + 1));
        assert_eq!(pipeline.health()[0].units_out as usize, delivered.len());
    }

    #[test]
    fn test_bounded_block_queue_end_to_end() {
        let mut config = PipelineConfig::default();
        config.queue.capacity = Some(1);
        let sink = RecordingSink::default();
        let mut pipeline = coordinator(FakeProducer::new(20), EchoCodec::new(3), sink.clone());

        pipeline.start(&config).unwrap();
        pipeline.wait().unwrap();

        assert_eq!(*sink.delivered.lock().unwrap(), (0..20).collect::<Vec<_>>());
    }
}

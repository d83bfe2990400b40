//! Health counters for pipeline stages

use std::sync::atomic::{AtomicU64, Ordering};

/// Health metrics for one stage
///
/// Written only by the stage thread, read by anyone. All fields use atomic
/// operations for thread-safe access.
#[derive(Debug)]
pub struct StageHealth {
    /// Units taken from the input queue (or produced by the capability, for the capture stage)
    pub units_in: AtomicU64,

    /// Units pushed downstream (or delivered, for the transmit stage)
    pub units_out: AtomicU64,

    /// Payload bytes of the units counted in `units_out`
    pub bytes_out: AtomicU64,

    /// Keyframes among `units_out`
    pub keyframes_out: AtomicU64,

    /// Units the capability rejected
    pub unit_errors: AtomicU64,

    /// Units a bounded queue handed back because it was full
    pub units_dropped: AtomicU64,
}

impl StageHealth {
    pub fn new() -> Self {
        Self {
            units_in: AtomicU64::new(0),
            units_out: AtomicU64::new(0),
            bytes_out: AtomicU64::new(0),
            keyframes_out: AtomicU64::new(0),
            unit_errors: AtomicU64::new(0),
            units_dropped: AtomicU64::new(0),
        }
    }

    pub fn record_input(&self) {
        self.units_in.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a unit handed downstream
    pub fn record_output(&self, size: usize, is_keyframe: bool) {
        self.units_out.fetch_add(1, Ordering::Relaxed);
        self.bytes_out.fetch_add(size as u64, Ordering::Relaxed);
        if is_keyframe {
            self.keyframes_out.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_unit_error(&self) {
        self.unit_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_drop(&self) {
        self.units_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn units_in(&self) -> u64 {
        self.units_in.load(Ordering::Relaxed)
    }

    pub fn units_out(&self) -> u64 {
        self.units_out.load(Ordering::Relaxed)
    }

    pub fn bytes_out(&self) -> u64 {
        self.bytes_out.load(Ordering::Relaxed)
    }

    pub fn keyframes_out(&self) -> u64 {
        self.keyframes_out.load(Ordering::Relaxed)
    }

    pub fn unit_errors(&self) -> u64 {
        self.unit_errors.load(Ordering::Relaxed)
    }

    pub fn units_dropped(&self) -> u64 {
        self.units_dropped.load(Ordering::Relaxed)
    }

    /// Dropped units as a percentage of units handed downstream
    pub fn drop_rate(&self) -> f64 {
        let drops = self.units_dropped();
        let out = self.units_out();
        if out == 0 {
            return 0.0;
        }
        (drops as f64 / out as f64) * 100.0
    }

    pub fn summary(&self, stage: &'static str) -> HealthSummary {
        HealthSummary {
            stage,
            units_in: self.units_in(),
            units_out: self.units_out(),
            bytes_out: self.bytes_out(),
            keyframes_out: self.keyframes_out(),
            unit_errors: self.unit_errors(),
            units_dropped: self.units_dropped(),
            drop_rate: self.drop_rate(),
        }
    }
}

impl Default for StageHealth {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of one stage's health metrics
#[derive(Debug, Clone, PartialEq)]
pub struct HealthSummary {
    pub stage: &'static str,
    pub units_in: u64,
    pub units_out: u64,
    pub bytes_out: u64,
    pub keyframes_out: u64,
    pub unit_errors: u64,
    pub units_dropped: u64,
    pub drop_rate: f64,
}

impl std::fmt::Display for HealthSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} in, {} out ({} drops, {:.2}%), {} unit errors, {} bytes, {} keyframes",
            self.stage,
            self.units_in,
            self.units_out,
            self.units_dropped,
            self.drop_rate,
            self.unit_errors,
            self.bytes_out,
            self.keyframes_out
        )
    }
}

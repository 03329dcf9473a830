//! Measurement result types and calibration data model.

use serde::{Deserialize, Serialize};

use crate::config::CalibrationMethod;

/// Conversion factor between cycle-counter ticks and nanoseconds.
///
/// Produced by calibration, strictly positive, and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickRatio(f64);

impl TickRatio {
    /// Wrap a ticks-per-nanosecond value.
    ///
    /// Callers guarantee positivity; calibration validates its interval
    /// before constructing one.
    pub(crate) fn new(ticks_per_ns: f64) -> Self {
        debug_assert!(ticks_per_ns > 0.0);
        Self(ticks_per_ns)
    }

    /// Ticks per nanosecond. Roughly the CPU base frequency in GHz when the
    /// counter runs at core speed (e.g. ~2.1 on a 2.1 GHz part).
    pub fn ticks_per_ns(self) -> f64 {
        self.0
    }

    /// Convert a tick delta to nanoseconds.
    pub fn ticks_to_ns(self, ticks: u64) -> f64 {
        ticks as f64 / self.0
    }

    /// Convert nanoseconds back to ticks (reciprocal of [`ticks_to_ns`](Self::ticks_to_ns)).
    pub fn ns_to_ticks(self, ns: f64) -> f64 {
        ns * self.0
    }
}

/// Minimum observed cost of a double-read-with-no-work probe, per clock source.
///
/// Kept in raw source units (ticks, nanoseconds); converted via [`TickRatio`]
/// only at reporting time. Frozen once initialization completes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OverheadCost {
    /// Minimum ticks between two back-to-back cycle-counter reads.
    pub cycle_ticks: u64,

    /// Minimum nanoseconds between two back-to-back monotonic-clock reads.
    pub wall_nanos: u64,
}

/// The clock source a [`Sample`] was measured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockSource {
    /// Free-running CPU cycle counter; deltas are ticks.
    Cycles,

    /// OS monotonic clock; deltas are nanoseconds.
    Monotonic,
}

impl ClockSource {
    /// Mechanism name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ClockSource::Cycles => crate::measurement::timer::cycle_source_name(),
            ClockSource::Monotonic => "clock_gettime",
        }
    }
}

/// Minimum-latency result for one clock source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Sample {
    /// Which clock produced this sample.
    pub source: ClockSource,

    /// Minimum raw delta observed across all iterations, in source units.
    pub raw_min: u64,

    /// `raw_min` minus the matching overhead cost, saturated at zero.
    pub net: u64,

    /// `net` converted to nanoseconds.
    pub net_ns: f64,

    /// False when the overhead exceeded `raw_min` and the net cost was
    /// saturated rather than allowed to wrap.
    pub reliable: bool,
}

impl Sample {
    /// Build a sample from a raw minimum and its overhead, applying the
    /// saturation policy.
    pub(crate) fn from_raw(source: ClockSource, raw_min: u64, overhead: u64, to_ns: impl Fn(u64) -> f64) -> Self {
        let reliable = overhead <= raw_min;
        let net = raw_min.saturating_sub(overhead);
        Self {
            source,
            raw_min,
            net,
            net_ns: to_ns(net),
            reliable,
        }
    }
}

/// Result of timing one unit of work. Transient; owned by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measurement {
    /// Caller-supplied label for the unit of work.
    pub label: String,

    /// Logical CPU the measuring thread ended on (-1 if unknown).
    ///
    /// Without [`Config::pin_to_core`](crate::Config::pin_to_core) the
    /// thread may have migrated mid-run.
    pub cpu: i32,

    /// Cycle-counter sample; the reported line is derived from this one.
    pub cycles: Sample,

    /// Monotonic-clock sample, for cross-validation.
    pub wall: Sample,
}

impl Measurement {
    /// True when neither clock source needed saturation.
    pub fn reliable(&self) -> bool {
        self.cycles.reliable && self.wall.reliable
    }
}

/// Diagnostics from interrupt calibration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InterruptStats {
    /// Firings observed, including the one that captured the start readings.
    pub firings: u64,

    /// Cycle delta between the first and last firing.
    pub elapsed_ticks: u64,

    /// Wall-clock delta between the first and last firing, in nanoseconds.
    pub elapsed_nanos: u64,

    /// Observed interrupt frequency over the calibration window.
    pub observed_hz: f64,
}

/// Serializable summary of a completed calibration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationSummary {
    /// Strategy that produced the authoritative ratio.
    pub method: CalibrationMethod,

    /// Authoritative ticks-per-nanosecond.
    pub ticks_per_ns: f64,

    /// Cross-check ratio from the spin strategy, when it ran.
    pub spin_ticks_per_ns: Option<f64>,

    /// Interrupt diagnostics, when the interrupt strategy ran.
    pub interrupt: Option<InterruptStats>,

    /// Frozen double-read costs.
    pub overhead: OverheadCost,

    /// Cycle-counter mechanism name for this build.
    pub cycle_source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_ratio_round_trip() {
        let ratio = TickRatio::new(2.1);
        let ticks = 1234_u64;
        let ns = ratio.ticks_to_ns(ticks);
        let back = ratio.ns_to_ticks(ns);
        assert!((back - ticks as f64).abs() < 1e-9);
    }

    #[test]
    fn test_sample_subtracts_overhead() {
        let ratio = TickRatio::new(2.0);
        let sample = Sample::from_raw(ClockSource::Cycles, 100, 36, |t| ratio.ticks_to_ns(t));
        assert_eq!(sample.net, 64);
        assert!((sample.net_ns - 32.0).abs() < 1e-12);
        assert!(sample.reliable);
    }

    #[test]
    fn test_sample_saturates_instead_of_wrapping() {
        let sample = Sample::from_raw(ClockSource::Monotonic, 20, 35, |n| n as f64);
        assert_eq!(sample.net, 0);
        assert_eq!(sample.net_ns, 0.0);
        assert!(!sample.reliable);
    }

    #[test]
    fn test_measurement_reliability_is_conjunction() {
        let good = Sample::from_raw(ClockSource::Cycles, 10, 5, |t| t as f64);
        let bad = Sample::from_raw(ClockSource::Monotonic, 5, 10, |n| n as f64);
        let m = Measurement {
            label: "x".to_string(),
            cpu: 0,
            cycles: good,
            wall: bad,
        };
        assert!(!m.reliable());
    }
}

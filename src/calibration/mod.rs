//! Calibration: tick ratio derivation and overhead cancellation.
//!
//! [`Calibration::initialize`] is the blocking initialization barrier. It
//! runs the selected calibration strategy, then the overhead canceller, and
//! only then hands back a [`Calibration`] value. Every measurement call
//! takes `&Calibration`, so "calibrate before measuring" is enforced by the
//! type system rather than by convention.
//!
//! Initialization runs exactly once per process. The interrupt strategy
//! owns process-wide signal state (`SIGALRM`, `ITIMER_REAL`), so a second
//! call returns [`CalibrationError::AlreadyInitialized`] instead of
//! silently re-arming.

mod interrupt;
mod overhead;
mod spin;

use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::{CalibrationMethod, Config};
use crate::measurement::{engine, timer};
use crate::output;
use crate::result::{CalibrationSummary, InterruptStats, Measurement, OverheadCost, TickRatio};

/// Setup failure during initialization.
///
/// Everything here is fatal for benchmarking purposes: nothing is retried,
/// and no measurement can be trusted after any of these.
#[derive(Debug, Clone)]
pub enum CalibrationError {
    /// `Calibration::initialize` was already called in this process.
    AlreadyInitialized,

    /// The OS monotonic clock is unavailable.
    ClockUnavailable(String),

    /// Installing the `SIGALRM` handler failed.
    SignalHandler(String),

    /// Arming the interval timer failed.
    TimerArm(String),

    /// The calibration window collapsed to zero ticks or zero nanoseconds.
    DegenerateInterval,
}

impl std::fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalibrationError::AlreadyInitialized => {
                write!(f, "calibration already ran in this process")
            }
            CalibrationError::ClockUnavailable(reason) => {
                write!(f, "CLOCK_MONOTONIC unavailable: {}", reason)
            }
            CalibrationError::SignalHandler(reason) => {
                write!(f, "failed to install SIGALRM handler: {}", reason)
            }
            CalibrationError::TimerArm(reason) => {
                write!(f, "failed to arm ITIMER_REAL: {}", reason)
            }
            CalibrationError::DegenerateInterval => {
                write!(f, "calibration interval collapsed to zero")
            }
        }
    }
}

impl std::error::Error for CalibrationError {}

/// Guards the one-shot initialization; never reset.
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// A completed calibration: the capability required to measure.
///
/// Immutable once constructed. Cloning is cheap and shares nothing mutable;
/// clones reference the same frozen ratios and costs.
#[derive(Debug, Clone)]
pub struct Calibration {
    config: Config,
    tick_ratio: TickRatio,
    spin_ratio: Option<TickRatio>,
    interrupt: Option<InterruptStats>,
    overhead: OverheadCost,
}

impl Calibration {
    /// Run calibration and overhead cancellation, blocking until both finish.
    ///
    /// Call once, very early, before any measurement. Emits diagnostic lines
    /// (tick ratio, observed interrupt frequency, overhead costs, preflight
    /// warnings) to stderr as it goes.
    ///
    /// # Errors
    ///
    /// See [`CalibrationError`]; every variant is fatal for the process's
    /// benchmarking ambitions. An environment whose interval timer never
    /// fires blocks here forever; surface that operationally rather than
    /// masking it with a timeout.
    pub fn initialize(config: Config) -> Result<Self, CalibrationError> {
        if INITIALIZED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CalibrationError::AlreadyInitialized);
        }

        timer::probe_monotonic_clock().map_err(CalibrationError::ClockUnavailable)?;

        for warning in crate::preflight::system_check() {
            output::terminal::print_warning(&warning.description());
        }

        let (tick_ratio, spin_ratio, interrupt) = match config.method {
            CalibrationMethod::Interrupt => {
                let (ratio, stats) =
                    interrupt::calibrate(config.interrupt_period, config.target_firings())?;
                let spin_ratio = if config.spin_cross_check {
                    Some(spin::calibrate(config.spin_loops)?)
                } else {
                    None
                };
                (ratio, spin_ratio, Some(stats))
            }
            CalibrationMethod::Spin => (spin::calibrate(config.spin_loops)?, None, None),
        };

        let overhead = overhead::measure(config.overhead_trials);

        let calibration = Self {
            config,
            tick_ratio,
            spin_ratio,
            interrupt,
            overhead,
        };
        output::terminal::print_calibration(&calibration.summary());
        Ok(calibration)
    }

    /// The authoritative ticks-per-nanosecond ratio.
    pub fn tick_ratio(&self) -> TickRatio {
        self.tick_ratio
    }

    /// Cross-check ratio from the spin strategy, when it ran.
    pub fn spin_ratio(&self) -> Option<TickRatio> {
        self.spin_ratio
    }

    /// Interrupt diagnostics, when the interrupt strategy ran.
    pub fn interrupt_stats(&self) -> Option<InterruptStats> {
        self.interrupt
    }

    /// Frozen double-read costs, in raw source units.
    pub fn overhead(&self) -> OverheadCost {
        self.overhead
    }

    /// The configuration this calibration ran with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Serializable summary for diagnostics and JSON output.
    pub fn summary(&self) -> CalibrationSummary {
        CalibrationSummary {
            method: self.config.method,
            ticks_per_ns: self.tick_ratio.ticks_per_ns(),
            spin_ticks_per_ns: self.spin_ratio.map(TickRatio::ticks_per_ns),
            interrupt: self.interrupt,
            overhead: self.overhead,
            cycle_source: timer::cycle_source_name().to_string(),
        }
    }

    /// Time `work` and return the result without printing the report line.
    ///
    /// Runs the measurement loop once per clock source, keeping the minimum
    /// delta, then subtracts the matching overhead cost (saturating at zero
    /// and flagging the sample unreliable if overhead exceeded the minimum).
    ///
    /// Concurrent callers are not coordinated: each call owns its iteration
    /// state, but two threads measuring simultaneously contend for the CPU
    /// and corrupt each other's noise floor. Measure from one thread at a
    /// time.
    pub fn measure<F, T>(&self, label: &str, work: F) -> Measurement
    where
        F: FnMut() -> T,
    {
        engine::run(self, label, work)
    }

    /// Time `work` and print the fixed-format report line.
    ///
    /// Output format:
    /// `<ticks> ticks; (<ns>) ns per invocation; <label> on cpu (<core-id>)`.
    /// An unreliable sample additionally gets a warning line on stderr; the
    /// report line itself never changes shape.
    pub fn benchmark<F, T>(&self, label: &str, work: F) -> Measurement
    where
        F: FnMut() -> T,
    {
        let measurement = self.measure(label, work);
        println!("{}", output::terminal::format_measurement(&measurement));
        if !measurement.reliable() {
            output::terminal::print_warning(&format!(
                "{}: measurement overhead exceeded the observed minimum; net cost saturated to zero",
                measurement.label
            ));
        }
        measurement
    }

    /// Test-only constructor bypassing the hardware calibration path.
    /// Carries a small iteration count so unit tests stay fast.
    #[cfg(test)]
    pub(crate) fn synthetic(ticks_per_ns: f64, overhead: OverheadCost) -> Self {
        Self {
            config: Config::default().iterations(10_000),
            tick_ratio: TickRatio::new(ticks_per_ns),
            spin_ratio: None,
            interrupt: None,
            overhead,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_accessors() {
        let cal = Calibration::synthetic(
            2.1,
            OverheadCost {
                cycle_ticks: 36,
                wall_nanos: 21,
            },
        );
        assert!((cal.tick_ratio().ticks_per_ns() - 2.1).abs() < 1e-12);
        assert_eq!(cal.overhead().cycle_ticks, 36);
        assert_eq!(cal.overhead().wall_nanos, 21);
        assert!(cal.interrupt_stats().is_none());
    }

    #[test]
    fn test_summary_carries_method_and_ratio() {
        let cal = Calibration::synthetic(
            3.0,
            OverheadCost {
                cycle_ticks: 30,
                wall_nanos: 20,
            },
        );
        let summary = cal.summary();
        assert_eq!(summary.method, CalibrationMethod::Interrupt);
        assert!((summary.ticks_per_ns - 3.0).abs() < 1e-12);
        assert!(!summary.cycle_source.is_empty());
    }
}

//! Configuration for calibration and measurement.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CALIBRATION_DURATION, DEFAULT_INTERRUPT_PERIOD, DEFAULT_ITERATIONS,
    DEFAULT_OVERHEAD_TRIALS, DEFAULT_SPIN_LOOPS,
};

/// Strategy used to derive the authoritative tick ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationMethod {
    /// Anchor to a periodic OS interrupt (`setitimer` + `SIGALRM`).
    ///
    /// Scheduling jitter in any single firing cannot bias the ratio because
    /// only the first and last firings contribute readings. This is the
    /// recommended default.
    #[default]
    Interrupt,

    /// Bracket a long CPU-bound spin loop with paired reads of both clocks.
    ///
    /// Simpler and self-contained, but a frequency transition during the
    /// loop skews the ratio. Useful where `ITIMER_REAL` is unavailable or
    /// as a cross-check against the interrupt strategy.
    Spin,
}

/// Configuration options for [`Calibration::initialize`](crate::Calibration::initialize).
///
/// All tunables the engine would otherwise hard-code live here. Fields are
/// public; chainable setters are provided for the common ones.
#[derive(Debug, Clone)]
pub struct Config {
    /// Period of the calibration interrupt (default: 100 µs).
    pub interrupt_period: Duration,

    /// Total wall time spanned by interrupt calibration (default: 1 s).
    ///
    /// The firing target is `calibration_duration / interrupt_period`,
    /// clamped to at least two firings so a start and an end reading exist.
    pub calibration_duration: Duration,

    /// Iterations per measurement loop (default: 1,000,000).
    pub iterations: u64,

    /// Double-read trials per clock source in the overhead canceller
    /// (default: 1,000,000).
    pub overhead_trials: u64,

    /// Which strategy produces the authoritative tick ratio
    /// (default: [`CalibrationMethod::Interrupt`]).
    pub method: CalibrationMethod,

    /// Loop count for the spin strategy (default: 100,000,000).
    ///
    /// Only read when the spin strategy runs, either as the authoritative
    /// method or as a cross-check.
    pub spin_loops: u64,

    /// Also run the spin strategy and report its ratio as a diagnostic
    /// (default: false). Ignored when `method` is already `Spin`.
    pub spin_cross_check: bool,

    /// Pin the measuring thread to this logical core before each
    /// measurement loop (default: `None`).
    ///
    /// Without pinning, migration mid-run is possible and shows up as
    /// noise in the reported minimum.
    pub pin_to_core: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interrupt_period: DEFAULT_INTERRUPT_PERIOD,
            calibration_duration: DEFAULT_CALIBRATION_DURATION,
            iterations: DEFAULT_ITERATIONS,
            overhead_trials: DEFAULT_OVERHEAD_TRIALS,
            method: CalibrationMethod::Interrupt,
            spin_loops: DEFAULT_SPIN_LOOPS,
            spin_cross_check: false,
            pin_to_core: None,
        }
    }
}

impl Config {
    /// Set the calibration interrupt period.
    pub fn interrupt_period(mut self, period: Duration) -> Self {
        self.interrupt_period = period;
        self
    }

    /// Set the total interrupt-calibration duration.
    pub fn calibration_duration(mut self, duration: Duration) -> Self {
        self.calibration_duration = duration;
        self
    }

    /// Set the measurement iteration count.
    pub fn iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the overhead-canceller trial count.
    pub fn overhead_trials(mut self, trials: u64) -> Self {
        self.overhead_trials = trials;
        self
    }

    /// Select the authoritative calibration strategy.
    pub fn method(mut self, method: CalibrationMethod) -> Self {
        self.method = method;
        self
    }

    /// Pin measurement loops to a logical core.
    pub fn pin_to_core(mut self, core: usize) -> Self {
        self.pin_to_core = Some(core);
        self
    }

    /// Number of interrupt firings required to span the calibration window.
    pub(crate) fn target_firings(&self) -> u64 {
        let period = self.interrupt_period.as_nanos().max(1) as u64;
        let total = self.calibration_duration.as_nanos() as u64;
        (total / period).max(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.interrupt_period, Duration::from_micros(100));
        assert_eq!(config.calibration_duration, Duration::from_secs(1));
        assert_eq!(config.iterations, 1_000_000);
        assert_eq!(config.overhead_trials, 1_000_000);
        assert_eq!(config.method, CalibrationMethod::Interrupt);
        assert!(config.pin_to_core.is_none());
    }

    #[test]
    fn test_default_target_firings_spans_one_second() {
        // 1s / 100us
        assert_eq!(Config::default().target_firings(), 10_000);
    }

    #[test]
    fn test_target_firings_never_below_two() {
        let config = Config::default()
            .interrupt_period(Duration::from_millis(100))
            .calibration_duration(Duration::from_millis(10));
        assert_eq!(config.target_firings(), 2);
    }

    #[test]
    fn test_setters_chain() {
        let config = Config::default()
            .iterations(10)
            .overhead_trials(20)
            .method(CalibrationMethod::Spin)
            .pin_to_core(3);
        assert_eq!(config.iterations, 10);
        assert_eq!(config.overhead_trials, 20);
        assert_eq!(config.method, CalibrationMethod::Spin);
        assert_eq!(config.pin_to_core, Some(3));
    }
}

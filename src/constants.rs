//! Shared time-unit and default-tunable constants.

use std::time::Duration;

/// Nanoseconds per second.
pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Microseconds per second.
pub const MICROS_PER_SEC: u64 = 1_000_000;

/// Default period of the calibration interrupt.
pub const DEFAULT_INTERRUPT_PERIOD: Duration = Duration::from_micros(100);

/// Default total wall time spanned by interrupt calibration.
pub const DEFAULT_CALIBRATION_DURATION: Duration = Duration::from_secs(1);

/// Default iteration count for one measurement loop.
pub const DEFAULT_ITERATIONS: u64 = 1_000_000;

/// Default trial count for the overhead canceller.
pub const DEFAULT_OVERHEAD_TRIALS: u64 = 1_000_000;

/// Default loop count for the spin calibration strategy.
pub const DEFAULT_SPIN_LOOPS: u64 = 100_000_000;

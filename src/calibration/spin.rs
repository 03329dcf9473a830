//! Spin-loop tick-ratio calibration.
//!
//! Brackets a long CPU-bound loop with paired reads of both clocks and
//! derives ticks-per-nanosecond from the two deltas. No interrupt machinery,
//! but unlike the interrupt strategy the loop itself sits inside the window,
//! so a frequency transition mid-loop skews the result.

use crate::calibration::CalibrationError;
use crate::measurement::timer::{black_box, monotonic_ns, rdtsc};
use crate::result::TickRatio;

/// Derive the tick ratio from a CPU-bound spin of `loops` iterations.
pub(crate) fn calibrate(loops: u64) -> Result<TickRatio, CalibrationError> {
    let start_nanos = monotonic_ns();
    let start_cycles = rdtsc();

    let mut x = 1.0_f64;
    for i in 0..loops {
        // Floating-point multiply keeps the loop CPU-bound; black_box keeps
        // it from folding away.
        x = black_box(x * (i as f64 + 1.5));
    }
    black_box(x);

    let end_cycles = rdtsc();
    let end_nanos = monotonic_ns();

    let elapsed_ticks = end_cycles.saturating_sub(start_cycles);
    let elapsed_nanos = end_nanos.saturating_sub(start_nanos);
    if elapsed_nanos == 0 || elapsed_ticks == 0 {
        return Err(CalibrationError::DegenerateInterval);
    }

    Ok(TickRatio::new(elapsed_ticks as f64 / elapsed_nanos as f64))
}

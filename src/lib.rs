//! # tickbench
//!
//! Measure the wall-clock cost of a unit of work in nanoseconds, with
//! sub-10ns precision, uncontaminated by the measurement apparatus itself.
//!
//! Two independent clock sources are read around the work: the CPU's
//! free-running cycle counter and the OS monotonic clock. Their ratio is
//! derived once at startup by anchoring to a periodic OS interrupt, the
//! intrinsic cost of the timing reads is measured and subtracted, and each
//! benchmark reports the minimum latency across many iterations; scheduling
//! and cache jitter only ever add positive noise, so the minimum is the
//! estimator of true cost.
//!
//! ## Quick Start
//!
//! ```ignore
//! use tickbench::{Calibration, Config};
//!
//! // Once, at startup. Blocks ~1s while the interrupt calibration runs.
//! let calibration = Calibration::initialize(Config::default())?;
//!
//! // `<ticks> ticks; (<ns>) ns per invocation; <label> on cpu (<core-id>)`
//! calibration.benchmark("wrapping_add", || {
//!     tickbench::black_box(1_u64).wrapping_add(tickbench::black_box(2))
//! });
//! ```
//!
//! ## Preconditions
//!
//! - Calibration must complete before anything is measured. This is
//!   structural: the measurement operations live on [`Calibration`], and
//!   the only way to obtain one is [`Calibration::initialize`].
//! - Measurement calls are not coordinated across threads. Two threads
//!   benchmarking simultaneously contend for the CPU and corrupt each
//!   other's noise floor; no locking is added because a lock inside the
//!   measured window would itself corrupt the latency being measured.
//! - For stable numbers, pin the process to an idle physical core
//!   (`taskset -c N`, or [`Config::pin_to_core`]) and run with the
//!   `performance` frequency governor.
//!
//! ## Operational risk
//!
//! If `ITIMER_REAL` never fires (sandboxes that swallow `SIGALRM`, a
//! process mask blocking it), initialization blocks forever. There is no
//! fallback timeout; a hang at startup is the intended surface for that
//! misconfiguration.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod calibration;
mod config;
pub mod constants;
pub mod measurement;
pub mod output;
pub mod platform;
pub mod preflight;
mod result;

pub use calibration::{Calibration, CalibrationError};
pub use config::{CalibrationMethod, Config};
pub use measurement::{black_box, monotonic_ns, rdtsc};
pub use result::{
    CalibrationSummary, ClockSource, InterruptStats, Measurement, OverheadCost, Sample, TickRatio,
};

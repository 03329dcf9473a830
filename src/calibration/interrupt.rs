//! Interrupt-anchored tick-ratio calibration.
//!
//! A periodic `ITIMER_REAL` interval timer delivers `SIGALRM` every
//! `interrupt_period`. The handler captures a cycle reading and a monotonic
//! reading on the first firing, counts subsequent firings, and on reaching
//! the target captures both readings again and disarms the timer. The ratio
//! of the two deltas is ticks-per-nanosecond, anchored to the kernel's timer
//! machinery instead of to any single scheduling window.
//!
//! The handler runs asynchronously relative to the arming thread and must
//! only touch [`InterruptState`] atomics. Completion is published through a
//! `done` flag with Release ordering; the arming thread polls it with
//! Acquire. The completion transition itself is a `compare_exchange`, so a
//! spurious firing after disarm can never re-capture consumed readings.
//!
//! If the interrupt never fires, the wait below never returns. That is a
//! fatal environment misconfiguration (e.g. `SIGALRM` blocked process-wide,
//! or a sandbox rejecting interval timers) and is deliberately not papered
//! over with a timeout.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

use crate::calibration::CalibrationError;
use crate::measurement::timer::{monotonic_ns, rdtsc};
use crate::result::{InterruptStats, TickRatio};

/// Calibration-local state shared with the signal handler.
///
/// All fields are atomics so the handler stays async-signal-safe. `start_*`
/// are written once by the first firing, `end_*` once by the firing that wins
/// the completion exchange; neither is touched again.
pub(crate) struct InterruptState {
    target: AtomicU64,
    firings: AtomicU64,
    start_cycles: AtomicU64,
    start_nanos: AtomicU64,
    end_cycles: AtomicU64,
    end_nanos: AtomicU64,
    completed: AtomicBool,
    done: AtomicBool,
}

impl InterruptState {
    pub(crate) const fn new() -> Self {
        Self {
            target: AtomicU64::new(0),
            firings: AtomicU64::new(0),
            start_cycles: AtomicU64::new(0),
            start_nanos: AtomicU64::new(0),
            end_cycles: AtomicU64::new(0),
            end_nanos: AtomicU64::new(0),
            completed: AtomicBool::new(false),
            done: AtomicBool::new(false),
        }
    }

    fn arm(&self, target_firings: u64) {
        self.target.store(target_firings, Ordering::Relaxed);
    }

    /// Record one firing. Returns true exactly once, for the firing that
    /// completes calibration; the caller then disarms the timer.
    ///
    /// Firings after completion are no-ops: the frozen readings and the
    /// firing count are left untouched.
    fn record_firing(&self, cycles: u64, nanos: u64) -> bool {
        if self.completed.load(Ordering::Acquire) {
            return false;
        }

        let prior = self.firings.fetch_add(1, Ordering::AcqRel);
        if prior == 0 {
            self.start_cycles.store(cycles, Ordering::Relaxed);
            self.start_nanos.store(nanos, Ordering::Relaxed);
            return false;
        }

        if prior + 1 >= self.target.load(Ordering::Relaxed)
            && self
                .completed
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            self.end_cycles.store(cycles, Ordering::Relaxed);
            self.end_nanos.store(nanos, Ordering::Relaxed);
            self.done.store(true, Ordering::Release);
            return true;
        }

        false
    }

    fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    fn readings(&self) -> (u64, u64, u64, u64, u64) {
        (
            self.firings.load(Ordering::Relaxed),
            self.start_cycles.load(Ordering::Relaxed),
            self.start_nanos.load(Ordering::Relaxed),
            self.end_cycles.load(Ordering::Relaxed),
            self.end_nanos.load(Ordering::Relaxed),
        )
    }
}

/// Handler-visible state for the one process-wide calibration run.
static STATE: InterruptState = InterruptState::new();

extern "C" fn handle_alarm(_signo: libc::c_int) {
    let cycles = rdtsc();
    let nanos = monotonic_ns();
    if STATE.record_firing(cycles, nanos) {
        disarm_timer();
    }
}

fn set_timer(period: Duration) -> Result<(), CalibrationError> {
    let interval = libc::timeval {
        tv_sec: period.as_secs() as libc::time_t,
        tv_usec: period.subsec_micros() as libc::suseconds_t,
    };
    let timer = libc::itimerval {
        it_interval: interval,
        it_value: interval,
    };
    let rc = unsafe { libc::setitimer(libc::ITIMER_REAL, &timer, std::ptr::null_mut()) };
    if rc != 0 {
        return Err(CalibrationError::TimerArm(
            std::io::Error::last_os_error().to_string(),
        ));
    }
    Ok(())
}

fn disarm_timer() {
    let zero = libc::timeval {
        tv_sec: 0,
        tv_usec: 0,
    };
    let timer = libc::itimerval {
        it_interval: zero,
        it_value: zero,
    };
    // Only reachable from the firing that won the completion exchange, and
    // a redundant zeroing would be harmless anyway.
    unsafe {
        libc::setitimer(libc::ITIMER_REAL, &timer, std::ptr::null_mut());
    }
}

/// Run interrupt calibration to completion and derive the tick ratio.
///
/// Blocks the calling thread, sleeping one period per poll, until the
/// handler publishes completion. Called exactly once per process, from
/// [`Calibration::initialize`](crate::Calibration::initialize).
pub(crate) fn calibrate(
    period: Duration,
    target_firings: u64,
) -> Result<(TickRatio, InterruptStats), CalibrationError> {
    STATE.arm(target_firings);

    let action = SigAction::new(
        SigHandler::Handler(handle_alarm),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    unsafe { signal::sigaction(Signal::SIGALRM, &action) }
        .map_err(|e| CalibrationError::SignalHandler(e.to_string()))?;

    set_timer(period)?;

    while !STATE.is_done() {
        std::thread::sleep(period);
    }

    let (firings, start_cycles, start_nanos, end_cycles, end_nanos) = STATE.readings();
    derive(firings, start_cycles, start_nanos, end_cycles, end_nanos)
}

/// Turn frozen readings into a ratio and diagnostics.
fn derive(
    firings: u64,
    start_cycles: u64,
    start_nanos: u64,
    end_cycles: u64,
    end_nanos: u64,
) -> Result<(TickRatio, InterruptStats), CalibrationError> {
    let elapsed_ticks = end_cycles.saturating_sub(start_cycles);
    let elapsed_nanos = end_nanos.saturating_sub(start_nanos);
    if elapsed_nanos == 0 || elapsed_ticks == 0 {
        return Err(CalibrationError::DegenerateInterval);
    }

    let ratio = TickRatio::new(elapsed_ticks as f64 / elapsed_nanos as f64);
    // The first firing carries the start readings, so the window spans
    // firings - 1 interrupt intervals.
    let intervals = firings.saturating_sub(1).max(1);
    let observed_hz =
        intervals as f64 * crate::constants::NANOS_PER_SEC as f64 / elapsed_nanos as f64;

    Ok((
        ratio,
        InterruptStats {
            firings,
            elapsed_ticks,
            elapsed_nanos,
            observed_hz,
        },
    ))
}

//! Platform-specific clock and cycle readers.
//!
//! The two raw reads everything else is built on:
//! - [`rdtsc`]: the free-running cycle counter (`lfence; rdtsc` on x86_64,
//!   `isb; mrs cntvct_el0` on aarch64)
//! - [`monotonic_ns`]: `CLOCK_MONOTONIC` in nanoseconds, via a direct
//!   `clock_gettime` call rather than `std::time::Instant`, since the read
//!   itself sits inside the measured window
//!
//! Both return an unsigned monotonically non-decreasing count and have no
//! recoverable error path. An architecture without a supported cycle counter
//! fails at build time; the monotonic clock is probed once during
//! initialization and any later read is assumed good.

use std::hint::black_box as std_black_box;

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
compile_error!("tickbench requires a free-running cycle counter (x86_64 rdtsc or aarch64 cntvct_el0)");

/// Wrapper around `std::hint::black_box` for preventing compiler optimizations.
///
/// Wrap the measured callable (and its result) in this to keep the compiler
/// from optimizing the work away or hoisting it across the timing reads.
#[inline]
pub fn black_box<T>(x: T) -> T {
    std_black_box(x)
}

/// Read the CPU cycle counter with appropriate serialization.
///
/// On x86_64 this is `lfence; rdtsc`, ensuring all prior instructions have
/// completed before the timestamp is taken. On aarch64 it is
/// `isb; mrs cntvct_el0` for the virtual counter.
#[inline]
pub fn rdtsc() -> u64 {
    #[cfg(target_arch = "x86_64")]
    {
        rdtsc_x86_64()
    }

    #[cfg(target_arch = "aarch64")]
    {
        rdtsc_aarch64()
    }
}

#[cfg(target_arch = "x86_64")]
#[inline]
fn rdtsc_x86_64() -> u64 {
    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);

    let cycles: u64;
    unsafe {
        // lfence serializes instruction execution
        // rdtsc reads the timestamp counter
        std::arch::asm!(
            "lfence",
            "rdtsc",
            "shl rdx, 32",
            "or rax, rdx",
            out("rax") cycles,
            out("rdx") _,
            options(nostack, nomem),
        );
    }

    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);

    cycles
}

#[cfg(target_arch = "aarch64")]
#[inline]
fn rdtsc_aarch64() -> u64 {
    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);

    let cycles: u64;
    unsafe {
        // isb ensures all prior instructions are complete
        // mrs reads the virtual timer count register
        std::arch::asm!(
            "isb",
            "mrs {}, cntvct_el0",
            out(reg) cycles,
            options(nostack, nomem),
        );
    }

    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);

    cycles
}

/// Name of the cycle-counter mechanism on this architecture.
pub fn cycle_source_name() -> &'static str {
    #[cfg(target_arch = "x86_64")]
    {
        "rdtsc"
    }

    #[cfg(target_arch = "aarch64")]
    {
        "cntvct_el0"
    }
}

/// Read `CLOCK_MONOTONIC` as nanoseconds since an arbitrary reference point.
///
/// Async-signal-safe; the interrupt calibrator calls this from the `SIGALRM`
/// handler. The return code is not checked here: the clock is probed once at
/// initialization and a working vDSO read cannot start failing afterwards.
#[inline]
pub fn monotonic_ns() -> u64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    unsafe {
        libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts);
    }
    (ts.tv_sec as u64) * crate::constants::NANOS_PER_SEC + (ts.tv_nsec as u64)
}

/// Verify that the monotonic clock is usable, once, at startup.
///
/// Returns the error text from the failed `clock_gettime` if the clock is
/// unsupported; no benchmarking result can be trusted in that case.
pub(crate) fn probe_monotonic_clock() -> Result<(), String> {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    let rc = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error().to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rdtsc_monotonic() {
        let a = rdtsc();
        let b = rdtsc();
        // Should be monotonically increasing (or at least not going backwards significantly)
        assert!(b >= a || a.saturating_sub(b) < 1000);
    }

    #[test]
    fn test_monotonic_ns_non_decreasing() {
        let a = monotonic_ns();
        let b = monotonic_ns();
        assert!(b >= a);
    }

    #[test]
    fn test_monotonic_ns_advances() {
        let a = monotonic_ns();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let b = monotonic_ns();
        assert!(b - a >= 4_000_000, "slept 5ms but clock advanced {}ns", b - a);
    }

    #[test]
    fn test_probe_monotonic_clock() {
        assert!(probe_monotonic_clock().is_ok());
    }

    #[test]
    fn test_cycle_source_name_nonempty() {
        assert!(!cycle_source_name().is_empty());
    }
}

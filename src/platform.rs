//! Logical-CPU queries and affinity pinning.

use std::io;

/// Logical CPU the calling thread is currently running on, or -1 when the
/// platform cannot say.
pub fn current_cpu() -> i32 {
    #[cfg(target_os = "linux")]
    {
        unsafe { libc::sched_getcpu() }
    }

    #[cfg(not(target_os = "linux"))]
    {
        -1
    }
}

/// Pin the calling thread to one logical core.
#[cfg(target_os = "linux")]
pub fn pin_to_core(core: usize) -> io::Result<()> {
    use std::mem::MaybeUninit;

    unsafe {
        let mut set = MaybeUninit::<libc::cpu_set_t>::zeroed();
        let set_ref = set.assume_init_mut();

        libc::CPU_ZERO(set_ref);
        libc::CPU_SET(core, set_ref);

        let rc = libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), set_ref);
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
}

/// Pin the calling thread to one logical core.
#[cfg(not(target_os = "linux"))]
pub fn pin_to_core(_core: usize) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "thread pinning is only implemented for Linux",
    ))
}

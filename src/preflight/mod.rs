//! Environment checks run before calibration.
//!
//! Non-blocking. A powersave frequency governor or a hypervisor quietly
//! invalidates sub-10ns numbers, so both are reported before calibration
//! runs.

/// Warning about the measurement environment.
#[derive(Debug, Clone)]
pub enum PreflightWarning {
    /// CPU frequency scaling is not pinned to performance.
    CpuGovernorNotPerformance {
        /// Current governor setting.
        current: String,
    },

    /// Running under a hypervisor.
    VirtualMachineDetected,
}

impl PreflightWarning {
    /// Human-readable description of the warning.
    pub fn description(&self) -> String {
        match self {
            PreflightWarning::CpuGovernorNotPerformance { current } => {
                format!(
                    "CPU frequency governor is '{}'; the tick ratio drifts with core \
                     frequency. Set with: sudo cpupower frequency-set --governor performance",
                    current
                )
            }
            PreflightWarning::VirtualMachineDetected => {
                "running under a hypervisor; interrupt delivery and cycle counters \
                 are both less trustworthy here"
                    .to_string()
            }
        }
    }
}

/// Run all environment checks. Empty on platforms without them.
pub fn system_check() -> Vec<PreflightWarning> {
    #[allow(unused_mut)]
    let mut warnings = Vec::new();

    #[cfg(target_os = "linux")]
    {
        if let Some(warning) = check_cpu_governor() {
            warnings.push(warning);
        }
        if let Some(warning) = check_hypervisor() {
            warnings.push(warning);
        }
    }

    warnings
}

#[cfg(target_os = "linux")]
fn check_cpu_governor() -> Option<PreflightWarning> {
    let governor =
        std::fs::read_to_string("/sys/devices/system/cpu/cpu0/cpufreq/scaling_governor").ok()?;
    let governor = governor.trim().to_lowercase();
    if governor != "performance" {
        Some(PreflightWarning::CpuGovernorNotPerformance { current: governor })
    } else {
        None
    }
}

#[cfg(target_os = "linux")]
fn check_hypervisor() -> Option<PreflightWarning> {
    let cpuinfo = std::fs::read_to_string("/proc/cpuinfo").ok()?;
    if cpuinfo.to_lowercase().contains("hypervisor") {
        return Some(PreflightWarning::VirtualMachineDetected);
    }
    None
}

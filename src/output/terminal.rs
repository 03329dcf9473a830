//! Terminal formatting for measurements and calibration diagnostics.

use colored::Colorize;

use crate::result::{CalibrationSummary, Measurement};

/// Format the fixed per-invocation report line.
///
/// `<ticks> ticks; (<ns with 2 decimals>) ns per invocation; <label> on cpu (<core-id>)`
/// with ticks right-aligned in 8 columns, the label right-aligned in 17, and
/// the core id zero-padded to 2. Scripts parse this; keep it byte-stable.
pub fn format_measurement(measurement: &Measurement) -> String {
    format!(
        "{:>8} ticks; ({:.2}) ns per invocation; {:>17} on cpu ({:02})",
        measurement.cycles.net, measurement.cycles.net_ns, measurement.label, measurement.cpu
    )
}

/// Format the post-calibration diagnostic block.
pub fn format_calibration(summary: &CalibrationSummary) -> String {
    let mut out = String::new();
    let sep = "\u{2500}".repeat(62);

    out.push_str("tickbench calibration\n");
    out.push_str(&sep);
    out.push('\n');

    out.push_str(&format!(
        "  {} ticks per nanosecond: {:.2}\n",
        summary.cycle_source, summary.ticks_per_ns
    ));
    if let Some(spin) = summary.spin_ticks_per_ns {
        out.push_str(&format!("  spin cross-check ratio:  {:.2}\n", spin));
    }
    if let Some(stats) = &summary.interrupt {
        out.push_str(&format!(
            "  interrupt frequency: approx. {:.0} Hz ({} firings over {:.3} s)\n",
            stats.observed_hz,
            stats.firings,
            stats.elapsed_nanos as f64 / crate::constants::NANOS_PER_SEC as f64
        ));
    }
    out.push_str(&format!(
        "  overhead: {} {} ticks ({:.2} ns), clock_gettime {} ns\n",
        summary.cycle_source,
        summary.overhead.cycle_ticks,
        summary.overhead.cycle_ticks as f64 / summary.ticks_per_ns,
        summary.overhead.wall_nanos
    ));
    out.push_str(&sep);

    out
}

/// Print a calibration diagnostic block to stderr.
pub(crate) fn print_calibration(summary: &CalibrationSummary) {
    eprintln!("{}", format_calibration(summary));
}

/// Print a highlighted warning line to stderr.
pub(crate) fn print_warning(message: &str) {
    eprintln!("  {} {}", "\u{26A0}".yellow().bold(), message.yellow());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{ClockSource, Measurement, Sample};

    fn sample(source: ClockSource, net: u64, net_ns: f64) -> Sample {
        Sample {
            source,
            raw_min: net + 36,
            net,
            net_ns,
            reliable: true,
        }
    }

    #[test]
    fn test_report_line_is_byte_stable() {
        let m = Measurement {
            label: "add_u64".to_string(),
            cpu: 5,
            cycles: sample(ClockSource::Cycles, 36, 17.18),
            wall: sample(ClockSource::Monotonic, 17, 17.0),
        };
        assert_eq!(
            format_measurement(&m),
            "      36 ticks; (17.18) ns per invocation;           add_u64 on cpu (05)"
        );
    }

    #[test]
    fn test_report_line_grows_for_long_labels() {
        let m = Measurement {
            label: "a_rather_long_benchmark_label".to_string(),
            cpu: 11,
            cycles: sample(ClockSource::Cycles, 123_456_789, 58789899.52),
            wall: sample(ClockSource::Monotonic, 1, 1.0),
        };
        let line = format_measurement(&m);
        assert!(line.starts_with("123456789 ticks; (58789899.52) ns per invocation;"));
        assert!(line.ends_with("a_rather_long_benchmark_label on cpu (11)"));
    }

    #[test]
    fn test_calibration_block_mentions_frequency() {
        let summary = CalibrationSummary {
            method: crate::CalibrationMethod::Interrupt,
            ticks_per_ns: 2.1,
            spin_ticks_per_ns: None,
            interrupt: Some(crate::result::InterruptStats {
                firings: 10_000,
                elapsed_ticks: 2_100_000_000,
                elapsed_nanos: 1_000_000_000,
                observed_hz: 9_999.0,
            }),
            overhead: crate::result::OverheadCost {
                cycle_ticks: 36,
                wall_nanos: 21,
            },
            cycle_source: "rdtsc".to_string(),
        };
        let block = format_calibration(&summary);
        assert!(block.contains("ticks per nanosecond: 2.10"));
        assert!(block.contains("approx. 9999 Hz"));
        assert!(block.contains("10000 firings"));
        assert!(block.contains("36 ticks"));
    }
}

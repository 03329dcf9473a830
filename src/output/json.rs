//! JSON serialization for measurements and calibration summaries.

use crate::result::{CalibrationSummary, Measurement};

/// Serialize a measurement to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for these types).
pub fn measurement_to_json(measurement: &Measurement) -> Result<String, serde_json::Error> {
    serde_json::to_string(measurement)
}

/// Serialize a measurement to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for these types).
pub fn measurement_to_json_pretty(measurement: &Measurement) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(measurement)
}

/// Serialize a calibration summary to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for these types).
pub fn calibration_to_json(summary: &CalibrationSummary) -> Result<String, serde_json::Error> {
    serde_json::to_string(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{ClockSource, Measurement, OverheadCost, Sample};
    use crate::CalibrationMethod;

    fn make_measurement() -> Measurement {
        Measurement {
            label: "memcpy_4k".to_string(),
            cpu: 3,
            cycles: Sample {
                source: ClockSource::Cycles,
                raw_min: 120,
                net: 84,
                net_ns: 40.0,
                reliable: true,
            },
            wall: Sample {
                source: ClockSource::Monotonic,
                raw_min: 60,
                net: 39,
                net_ns: 39.0,
                reliable: true,
            },
        }
    }

    #[test]
    fn test_measurement_round_trips() {
        let json = measurement_to_json(&make_measurement()).unwrap();
        let back: Measurement = serde_json::from_str(&json).unwrap();
        assert_eq!(back.label, "memcpy_4k");
        assert_eq!(back.cycles.net, 84);
        assert_eq!(back.wall.source, ClockSource::Monotonic);
    }

    #[test]
    fn test_pretty_contains_fields() {
        let json = measurement_to_json_pretty(&make_measurement()).unwrap();
        assert!(json.contains("\"label\""));
        assert!(json.contains("\"reliable\""));
    }

    #[test]
    fn test_calibration_summary_serializes() {
        let summary = CalibrationSummary {
            method: CalibrationMethod::Spin,
            ticks_per_ns: 2.1,
            spin_ticks_per_ns: None,
            interrupt: None,
            overhead: OverheadCost {
                cycle_ticks: 36,
                wall_nanos: 21,
            },
            cycle_source: "rdtsc".to_string(),
        };
        let json = calibration_to_json(&summary).unwrap();
        assert!(json.contains("\"ticks_per_ns\":2.1"));
        assert!(json.contains("\"Spin\""));
    }
}

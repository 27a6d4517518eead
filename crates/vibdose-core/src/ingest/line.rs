//! Line classification for accelerometer log files
//!
//! Every line of a log is exactly one of a closed set of kinds. Sample rows
//! are recognized first; anything that fails to parse as a sample row is
//! reinterpreted as a metadata line and never reported as an error.
//!
//! ```text
//! 15/03/2021,14:22:05,        <- timestamp
//! Vbat=3.71 Tint=24.5         <- telemetry
//! 120,-340,16210              <- sample
//! HEARTBEAT                   <- marker
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};

use super::extra::ExtraKind;

/// Timestamp line layout, interpreted as UTC
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y,%H:%M:%S,";

const BATTERY_FIELD: &str = "Vbat=";
const INTERNAL_TEMP_FIELD: &str = "Tint=";
const SENSOR_TEMP_FIELD: &str = "Tacc=";

/// What a single log line means to the burst accumulator
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    /// Raw (unscaled) x, y, z sample
    Sample([f32; 3]),
    /// Sets the parse clock for following traces and events
    Timestamp(DateTime<Utc>),
    /// Heartbeat or power-on marker
    Marker(ExtraKind),
    /// Carries telemetry fields only
    Telemetry,
    /// Anything else; still closes an open burst
    Unrecognized,
}

impl LineKind {
    /// Whether this line continues an open burst
    pub fn is_sample(&self) -> bool {
        matches!(self, LineKind::Sample(_))
    }
}

/// Battery and temperature fields found on a non-sample line
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Telemetry {
    /// `Vbat=` value
    pub battery_voltage: Option<f32>,
    /// `Tint=` value
    pub internal_temp: Option<f32>,
    /// `Tacc=` value
    pub sensor_temp: Option<f32>,
}

impl Telemetry {
    fn is_empty(&self) -> bool {
        self.battery_voltage.is_none() && self.internal_temp.is_none() && self.sensor_temp.is_none()
    }
}

/// A classified line: its kind plus any telemetry it carried
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedLine {
    /// Line kind
    pub kind: LineKind,
    /// Telemetry fields (always empty for sample lines)
    pub telemetry: Telemetry,
}

/// Classify one line of a log file
///
/// # Example
/// ```
/// use vibdose_core::ingest::line::{classify, LineKind};
///
/// assert_eq!(classify("100,200,300").kind, LineKind::Sample([100.0, 200.0, 300.0]));
/// assert_eq!(classify("100,200,").kind, LineKind::Unrecognized);
/// ```
pub fn classify(line: &str) -> ClassifiedLine {
    if let Some(sample) = parse_sample(line) {
        return ClassifiedLine {
            kind: LineKind::Sample(sample),
            telemetry: Telemetry::default(),
        };
    }

    let telemetry = Telemetry {
        battery_voltage: field_value(line, BATTERY_FIELD),
        internal_temp: field_value(line, INTERNAL_TEMP_FIELD),
        sensor_temp: field_value(line, SENSOR_TEMP_FIELD),
    };

    // The date check takes precedence over markers
    let kind = if line.as_bytes().get(2) == Some(&b'/') {
        match parse_timestamp(line) {
            Some(at) => LineKind::Timestamp(at),
            None => {
                tracing::debug!(line, "Date-like line did not match timestamp layout");
                LineKind::Unrecognized
            }
        }
    } else if line.starts_with(ExtraKind::Heartbeat.tag()) {
        LineKind::Marker(ExtraKind::Heartbeat)
    } else if line.starts_with(ExtraKind::On.tag()) {
        LineKind::Marker(ExtraKind::On)
    } else if !telemetry.is_empty() {
        LineKind::Telemetry
    } else {
        LineKind::Unrecognized
    };

    ClassifiedLine { kind, telemetry }
}

/// Exactly three comma-separated numeric fields with a non-empty third field
fn parse_sample(line: &str) -> Option<[f32; 3]> {
    let mut fields = line.split(',');
    let (x, y, z) = (fields.next()?, fields.next()?, fields.next()?);
    if fields.next().is_some() || z.is_empty() {
        return None;
    }
    Some([
        x.trim().parse().ok()?,
        y.trim().parse().ok()?,
        z.trim().parse().ok()?,
    ])
}

fn parse_timestamp(line: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(line.trim_end(), TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Number following `name` up to the next whitespace
///
/// A present field whose value does not parse reads as 0.0, matching the
/// logger firmware's own tooling.
fn field_value(line: &str, name: &str) -> Option<f32> {
    let pos = line.find(name)?;
    let rest = &line[pos + name.len()..];
    let token = rest.split(char::is_whitespace).next().unwrap_or_default();
    Some(token.parse().unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_sample_line() {
        let line = classify("100,-200,16384");
        assert_eq!(line.kind, LineKind::Sample([100.0, -200.0, 16384.0]));
        assert_eq!(line.telemetry, Telemetry::default());
    }

    #[test]
    fn test_sample_line_with_padding() {
        assert_eq!(
            classify(" 1.5, 2 ,3").kind,
            LineKind::Sample([1.5, 2.0, 3.0])
        );
    }

    #[test]
    fn test_wrong_field_count_is_not_sample() {
        assert_eq!(classify("1,2").kind, LineKind::Unrecognized);
        assert_eq!(classify("1,2,3,4").kind, LineKind::Unrecognized);
    }

    #[test]
    fn test_empty_third_field_is_not_sample() {
        assert!(!classify("1,2,").kind.is_sample());
    }

    #[test]
    fn test_non_numeric_sample_falls_through() {
        // Reinterpreted as metadata, never an error
        let line = classify("1,abc,Vbat=3.6");
        assert_eq!(line.kind, LineKind::Telemetry);
        assert_eq!(line.telemetry.battery_voltage, Some(3.6));
    }

    #[test]
    fn test_timestamp_line() {
        let line = classify("15/03/2021,14:22:05,");
        match line.kind {
            LineKind::Timestamp(at) => {
                assert_eq!(at.day(), 15);
                assert_eq!(at.month(), 3);
                assert_eq!(at.year(), 2021);
                assert_eq!(at.hour(), 14);
                assert_eq!(at.minute(), 22);
                assert_eq!(at.second(), 5);
            }
            other => panic!("expected timestamp, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_timestamp_is_unrecognized() {
        assert_eq!(classify("15/xx/2021,14:22:05,").kind, LineKind::Unrecognized);
    }

    #[test]
    fn test_markers() {
        assert_eq!(
            classify("HEARTBEAT").kind,
            LineKind::Marker(ExtraKind::Heartbeat)
        );
        assert_eq!(classify("ON").kind, LineKind::Marker(ExtraKind::On));
        assert_eq!(classify("ONLINE").kind, LineKind::Marker(ExtraKind::On));
        assert_eq!(classify(" HEARTBEAT").kind, LineKind::Unrecognized);
    }

    #[test]
    fn test_marker_with_telemetry() {
        let line = classify("HEARTBEAT Vbat=3.7 Tint=25 Tacc=26");
        assert_eq!(line.kind, LineKind::Marker(ExtraKind::Heartbeat));
        assert_eq!(line.telemetry.battery_voltage, Some(3.7));
        assert_eq!(line.telemetry.internal_temp, Some(25.0));
        assert_eq!(line.telemetry.sensor_temp, Some(26.0));
    }

    #[test]
    fn test_telemetry_fields() {
        let line = classify("status Tacc=-4.25\tVbat=3.30");
        assert_eq!(line.kind, LineKind::Telemetry);
        assert_eq!(line.telemetry.battery_voltage, Some(3.3));
        assert_eq!(line.telemetry.internal_temp, None);
        assert_eq!(line.telemetry.sensor_temp, Some(-4.25));
    }

    #[test]
    fn test_unparseable_field_reads_zero() {
        assert_eq!(classify("Vbat=low").telemetry.battery_voltage, Some(0.0));
    }

    #[test]
    fn test_blank_line() {
        let line = classify("");
        assert_eq!(line.kind, LineKind::Unrecognized);
        assert!(!line.kind.is_sample());
    }
}

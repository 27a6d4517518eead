//! Out-of-band device events recorded between bursts

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::READING_ABSENT;

/// Kind of device event announced by a marker line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExtraKind {
    /// Hourly heartbeat record
    Heartbeat,
    /// Device power-on / reset
    On,
}

impl ExtraKind {
    /// Tag written to reports and recognized at the start of a marker line
    pub fn tag(self) -> &'static str {
        match self {
            ExtraKind::Heartbeat => "HEARTBEAT",
            ExtraKind::On => "ON",
        }
    }
}

/// A heartbeat or power-on event with the telemetry reported before it
///
/// Readings that were not reported carry [`READING_ABSENT`].
#[derive(Debug, Clone, PartialEq)]
pub struct Extra {
    /// Event kind
    pub kind: ExtraKind,
    /// Parse clock at the time the marker line was read
    pub timestamp: DateTime<Utc>,
    /// Name of the log file the event came from
    pub file_name: String,
    /// Battery voltage in volts
    pub battery_voltage: f32,
    /// Internal temperature (`Tint=`) in deg C
    pub temp_1: f32,
    /// Accelerometer temperature (`Tacc=`) in deg C
    pub temp_2: f32,
    /// Third temperature channel; no log line reports it yet
    pub temp_3: f32,
}

impl Extra {
    /// Whether a reading holds a reported value rather than the sentinel
    pub fn is_reported(reading: f32) -> bool {
        reading != READING_ABSENT
    }
}

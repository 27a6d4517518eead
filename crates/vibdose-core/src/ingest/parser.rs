//! Burst accumulation over a single log file
//!
//! Consecutive sample lines are gathered into one raw buffer. The first
//! non-sample line (or end of file) closes the buffer into a [`Trace`],
//! stamped with the parse clock and the burst's index within the file.
//!
//! Marker lines emit an [`Extra`] carrying whatever telemetry was reported
//! since the previous marker; the pending readings are then cleared.

use std::io::BufRead;

use chrono::{DateTime, Utc};

use super::extra::Extra;
use super::line::{classify, LineKind, Telemetry};
use crate::analysis::trace::Trace;
use crate::READING_ABSENT;

/// Telemetry reported since the last marker line
#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingTelemetry {
    battery_voltage: f32,
    temp_1: f32,
    temp_2: f32,
}

impl Default for PendingTelemetry {
    fn default() -> Self {
        Self {
            battery_voltage: READING_ABSENT,
            temp_1: READING_ABSENT,
            temp_2: READING_ABSENT,
        }
    }
}

impl PendingTelemetry {
    fn absorb(&mut self, telemetry: &Telemetry) {
        if let Some(v) = telemetry.battery_voltage {
            self.battery_voltage = v;
        }
        if let Some(t) = telemetry.internal_temp {
            self.temp_1 = t;
        }
        if let Some(t) = telemetry.sensor_temp {
            self.temp_2 = t;
        }
    }

    fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

/// Everything parsed out of one log file
#[derive(Debug, Default)]
pub struct ParsedFile {
    /// Finalized bursts in file order
    pub traces: Vec<Trace>,
    /// Device events in file order
    pub extras: Vec<Extra>,
}

/// Line-by-line parser state for one file
///
/// # Example
/// ```
/// use chrono::Utc;
/// use vibdose_core::ingest::parser::FileParser;
///
/// let mut parser = FileParser::new("log.csv", Utc::now());
/// for line in ["01/02/2024,08:00:00,", "10,20,30", "11,21,31", "HEARTBEAT"] {
///     parser.feed(line);
/// }
/// let (parsed, _clock) = parser.finish();
/// assert_eq!(parsed.traces.len(), 1);
/// assert_eq!(parsed.extras.len(), 1);
/// ```
#[derive(Debug)]
pub struct FileParser {
    /// Name recorded on every trace and event
    file_name: String,
    /// Timestamp for the next trace or event
    clock: DateTime<Utc>,
    /// Readings waiting for a marker line
    pending: PendingTelemetry,
    /// Open burst of raw samples
    burst: Vec<[f32; 3]>,
    /// Bursts finalized so far in this file
    bursts_in_file: usize,
    output: ParsedFile,
}

impl FileParser {
    /// Start parsing a file
    ///
    /// # Arguments
    /// * `file_name` - Name recorded on produced traces and events
    /// * `clock` - Timestamp in effect before the file's first timestamp line
    pub fn new(file_name: impl Into<String>, clock: DateTime<Utc>) -> Self {
        Self {
            file_name: file_name.into(),
            clock,
            pending: PendingTelemetry::default(),
            burst: Vec::new(),
            bursts_in_file: 0,
            output: ParsedFile::default(),
        }
    }

    /// Process one line
    pub fn feed(&mut self, line: &str) {
        let line = classify(line);

        if let LineKind::Sample(sample) = line.kind {
            self.burst.push(sample);
            return;
        }

        self.close_burst();
        self.pending.absorb(&line.telemetry);

        match line.kind {
            LineKind::Timestamp(at) => self.clock = at,
            LineKind::Marker(kind) => {
                let readings = self.pending.take();
                self.output.extras.push(Extra {
                    kind,
                    timestamp: self.clock,
                    file_name: self.file_name.clone(),
                    battery_voltage: readings.battery_voltage,
                    temp_1: readings.temp_1,
                    temp_2: readings.temp_2,
                    temp_3: READING_ABSENT,
                });
            }
            LineKind::Sample(_) | LineKind::Telemetry | LineKind::Unrecognized => {}
        }
    }

    /// Close any open burst and return the parsed contents plus the clock,
    /// which carries over into the next file of the same import
    pub fn finish(mut self) -> (ParsedFile, DateTime<Utc>) {
        self.close_burst();
        (self.output, self.clock)
    }

    /// Current parse clock
    pub fn clock(&self) -> DateTime<Utc> {
        self.clock
    }

    fn close_burst(&mut self) {
        if self.burst.is_empty() {
            return;
        }
        let raw = std::mem::take(&mut self.burst);
        let trace = Trace::from_burst(&self.file_name, self.clock, self.bursts_in_file, raw);
        self.output.traces.push(trace);
        self.bursts_in_file += 1;
    }
}

/// Parse a whole log from a reader
///
/// Invalid UTF-8 is replaced rather than rejected. Returns the parsed file
/// and the clock at end of input.
pub fn parse_reader<R: BufRead>(
    mut reader: R,
    file_name: &str,
    clock: DateTime<Utc>,
) -> std::io::Result<(ParsedFile, DateTime<Utc>)> {
    let mut parser = FileParser::new(file_name, clock);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&buf);
        parser.feed(text.trim_end_matches(['\n', '\r']));
    }

    Ok(parser.finish())
}

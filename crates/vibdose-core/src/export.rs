//! Report export
//!
//! A report holds three tables: one row per trace, one per VDV bucket and
//! one per device event. CSV output writes them as consecutive sections,
//! each with its own header row; JSON output writes one document with a
//! key per table.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::analysis::trace::Trace;
use crate::analysis::vdv::VdvBucket;
use crate::ingest::extra::Extra;

/// Date/time layout used in every table
pub const DATE_TIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Errors writing a report
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON write failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Report I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Output encoding of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format(DATE_TIME_FORMAT).to_string()
}

/// One trace row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceRow {
    pub file_name: String,
    pub date_time: String,
    pub max_deviation: f32,
    pub rms_deviation: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub windowed_max: Option<f32>,
    pub excluded: bool,
}

impl TraceRow {
    fn new(trace: &Trace, with_windowed_max: bool) -> Self {
        Self {
            file_name: trace.file_name.clone(),
            date_time: format_time(trace.start_time),
            max_deviation: trace.max_deviation,
            rms_deviation: trace.rms_deviation,
            windowed_max: with_windowed_max.then_some(trace.windowed_max),
            excluded: trace.is_excluded(),
        }
    }

    fn record(&self) -> Vec<String> {
        let mut record = vec![
            self.file_name.clone(),
            self.date_time.clone(),
            self.max_deviation.to_string(),
            self.rms_deviation.to_string(),
        ];
        if let Some(w) = self.windowed_max {
            record.push(w.to_string());
        }
        record.push(if self.excluded { "X" } else { "" }.to_string());
        record
    }
}

/// One VDV bucket row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VdvRow {
    pub start: String,
    pub end: String,
    pub vdv: f32,
}

/// One device event row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtraRow {
    pub file_name: String,
    pub date_time: String,
    pub kind: &'static str,
    pub battery_voltage: f32,
    pub temp_1: f32,
    pub temp_2: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_3: Option<f32>,
}

impl ExtraRow {
    fn record(&self) -> Vec<String> {
        vec![
            self.file_name.clone(),
            self.date_time.clone(),
            self.kind.to_string(),
            self.battery_voltage.to_string(),
            self.temp_1.to_string(),
            self.temp_2.to_string(),
            self.temp_3.map(|t| t.to_string()).unwrap_or_default(),
        ]
    }
}

/// All three report tables
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub traces: Vec<TraceRow>,
    pub vdv: Vec<VdvRow>,
    pub extras: Vec<ExtraRow>,
    #[serde(skip)]
    with_windowed_max: bool,
}

impl Report {
    /// Build a report from a finished import cycle
    ///
    /// # Arguments
    /// * `with_windowed_max` - Include the windowed maximum column
    pub fn build(
        traces: &[Trace],
        buckets: &[VdvBucket],
        extras: &[Extra],
        with_windowed_max: bool,
    ) -> Self {
        Self {
            traces: traces
                .iter()
                .map(|t| TraceRow::new(t, with_windowed_max))
                .collect(),
            vdv: buckets
                .iter()
                .map(|b| VdvRow {
                    start: format_time(b.start),
                    end: format_time(b.end),
                    vdv: b.dose,
                })
                .collect(),
            extras: extras
                .iter()
                .map(|e| ExtraRow {
                    file_name: e.file_name.clone(),
                    date_time: format_time(e.timestamp),
                    kind: e.kind.tag(),
                    battery_voltage: e.battery_voltage,
                    temp_1: e.temp_1,
                    temp_2: e.temp_2,
                    temp_3: Extra::is_reported(e.temp_3).then_some(e.temp_3),
                })
                .collect(),
            with_windowed_max,
        }
    }

    /// Write in the requested format
    pub fn write<W: Write>(&self, writer: W, format: ReportFormat) -> Result<(), ExportError> {
        match format {
            ReportFormat::Csv => self.write_csv(writer),
            ReportFormat::Json => self.write_json(writer),
        }
    }

    /// Write the three CSV sections
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        let mut csv = csv::WriterBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_writer(writer);

        let mut header = vec!["File name", "Date/time", "Max.", "RMS"];
        if self.with_windowed_max {
            header.push("Windowed Max.");
        }
        header.push("Excluded?");
        csv.write_record(&header)?;
        for row in &self.traces {
            csv.write_record(row.record())?;
        }

        csv.write_record(["Start", "End", "VDV [m s^-1.75]"])?;
        for row in &self.vdv {
            csv.write_record([row.start.clone(), row.end.clone(), row.vdv.to_string()])?;
        }

        csv.write_record([
            "File name",
            "Date/time",
            "Type",
            "V_bat [V]",
            "Temp 1 [degC]",
            "Temp2 [degC]",
            "Temp3 [degC]",
        ])?;
        for row in &self.extras {
            csv.write_record(row.record())?;
        }

        csv.flush()?;
        tracing::info!(
            traces = self.traces.len(),
            buckets = self.vdv.len(),
            extras = self.extras.len(),
            "Wrote CSV report"
        );
        Ok(())
    }

    /// Write the report as a single JSON document
    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<(), ExportError> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::extra::ExtraKind;
    use crate::READING_ABSENT;
    use chrono::TimeZone;

    fn sample_report(with_windowed_max: bool) -> Report {
        let at = Utc.with_ymd_and_hms(2024, 7, 9, 14, 5, 3).unwrap();
        let mut excluded = Trace::from_burst("a.csv", at, 0, vec![[0.0, 0.0, 0.0]]);
        excluded.exclusion_code = 1;
        let mut included = Trace::from_burst("a.csv", at, 1, vec![[0.0, 0.0, 0.0]]);
        included.windowed_max = 12.5;

        let bucket = VdvBucket {
            start: Utc.with_ymd_and_hms(2024, 7, 9, 7, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 7, 9, 23, 0, 0).unwrap(),
            dose: 0.25,
        };
        let extra = Extra {
            kind: ExtraKind::Heartbeat,
            timestamp: at,
            file_name: "a.csv".into(),
            battery_voltage: 3.7,
            temp_1: 25.0,
            temp_2: READING_ABSENT,
            temp_3: READING_ABSENT,
        };
        Report::build(&[excluded, included], &[bucket], &[extra], with_windowed_max)
    }

    fn csv_text(report: &Report) -> String {
        let mut out = Vec::new();
        report.write_csv(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_csv_sections() {
        let text = csv_text(&sample_report(true));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "File name,Date/time,Max.,RMS,Windowed Max.,Excluded?",
                "a.csv,09/07/2024 14:05:03,0,0,0,X",
                "a.csv,09/07/2024 14:05:03,0,0,12.5,",
                "Start,End,VDV [m s^-1.75]",
                "09/07/2024 07:00:00,09/07/2024 23:00:00,0.25",
                "File name,Date/time,Type,V_bat [V],Temp 1 [degC],Temp2 [degC],Temp3 [degC]",
                "a.csv,09/07/2024 14:05:03,HEARTBEAT,3.7,25,-1,",
            ]
        );
    }

    #[test]
    fn test_csv_without_windowed_max() {
        let text = csv_text(&sample_report(false));
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("File name,Date/time,Max.,RMS,Excluded?")
        );
        assert_eq!(lines.next(), Some("a.csv,09/07/2024 14:05:03,0,0,X"));
    }

    #[test]
    fn test_json_document() {
        let report = sample_report(false);
        let mut out = Vec::new();
        report.write(&mut out, ReportFormat::Json).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["traces"].as_array().unwrap().len(), 2);
        assert_eq!(value["traces"][0]["excluded"], true);
        assert!(value["traces"][0].get("windowed_max").is_none());
        assert_eq!(value["vdv"][0]["vdv"], 0.25);
        assert_eq!(value["extras"][0]["kind"], "HEARTBEAT");
        assert!(value["extras"][0].get("temp_3").is_none());
    }
}

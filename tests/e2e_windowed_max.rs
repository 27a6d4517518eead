//! E2E tests for event segmentation and windowed maxima
//!
//! Verifies that bursts are grouped into events by their start gap, that
//! each event's peak lands on its first burst, and that exclusions
//! suppress the whole event.

use approx::assert_relative_eq;
use chrono::{DateTime, Duration, TimeZone, Utc};
use vibdose::analysis::window::{WindowedPeakFilter, WINDOW_SUM};
use vibdose::{ImportSession, MemoryStore, Trace, SENSOR_SCALE};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::seconds(secs)
}

/// 50-sample burst with a 10-sample pulse of `amplitude` counts on Z
fn pulse(secs: i64, amplitude: f32) -> Trace {
    let raw = (0..50)
        .map(|i| {
            let z = if (20..30).contains(&i) { amplitude } else { 0.0 };
            [0.0, 0.0, z]
        })
        .collect();
    Trace::from_burst("log.csv", at(secs), 0, raw)
}

fn expected_max(filter: &WindowedPeakFilter, traces: &[&Trace]) -> f32 {
    let peak = traces
        .iter()
        .filter_map(|t| filter.trace_peak(t))
        .fold(0.0f64, f64::max);
    SENSOR_SCALE * (1.414213562 * peak / WINDOW_SUM) as f32
}

#[test]
fn test_close_bursts_form_one_event() {
    let filter = WindowedPeakFilter::new();
    let mut traces = vec![pulse(0, 1000.0), pulse(3, 4000.0), pulse(20, 2000.0)];

    let events = filter.apply(&mut traces);
    assert_eq!(events, 2);

    let first_event = expected_max(&filter, &[&traces[0], &traces[1]]);
    assert_relative_eq!(traces[0].windowed_max, first_event, max_relative = 1e-5);
    assert_eq!(traces[1].windowed_max, 0.0);
    let second_event = expected_max(&filter, &[&traces[2]]);
    assert_relative_eq!(traces[2].windowed_max, second_event, max_relative = 1e-5);

    // Larger pulse in the second burst drives the first event's peak
    assert!(traces[0].windowed_max > traces[2].windowed_max);
}

#[test]
fn test_gap_measured_between_consecutive_bursts() {
    let filter = WindowedPeakFilter::new();
    // Each step is under 6 s, though the span is not
    let mut traces = vec![pulse(0, 1000.0), pulse(5, 1000.0), pulse(10, 1000.0)];

    assert_eq!(filter.apply(&mut traces), 1);
    assert!(traces[0].windowed_max > 0.0);
    assert_eq!(traces[1].windowed_max, 0.0);
    assert_eq!(traces[2].windowed_max, 0.0);
}

#[test]
fn test_excluded_burst_suppresses_event() {
    let filter = WindowedPeakFilter::new();
    let mut traces = vec![pulse(0, 1000.0), pulse(2, 1000.0), pulse(30, 1000.0)];
    traces[1].exclusion_code = 2;

    assert_eq!(filter.apply(&mut traces), 2);
    assert_eq!(traces[0].windowed_max, 0.0);
    assert_eq!(traces[1].windowed_max, 0.0);
    assert!(traces[2].windowed_max > 0.0);
}

#[test]
fn test_short_bursts_have_zero_peak() {
    let filter = WindowedPeakFilter::new();
    let raw = vec![[0.0, 0.0, 1000.0]; 20];
    let mut traces = vec![Trace::from_burst("log.csv", at(0), 0, raw)];

    assert_eq!(filter.apply(&mut traces), 1);
    assert_eq!(traces[0].windowed_max, 0.0);
}

#[test]
fn test_session_applies_exclusions_before_windowed_max() {
    let dir = tempfile::tempdir().unwrap();
    let mut body = String::from("01/03/2024,09:00:00,\n");
    for i in 0..50 {
        let z = if (20..30).contains(&i) { 3000 } else { 0 };
        body.push_str(&format!("0,0,{}\n", z));
    }
    let path = dir.path().join("log.csv");
    std::fs::write(&path, body).unwrap();

    let mut session = ImportSession::new();
    session.begin_import_at(at(0));
    session.import_files(&[&path]);

    let mut store = MemoryStore::new();
    session.apply_exclusions(&store).unwrap();
    assert_eq!(session.apply_windowed_max(), 1);
    assert!(session.trace(0).unwrap().windowed_max > 0.0);

    session.set_exclusion(0, 1, &mut store).unwrap();
    session.apply_exclusions(&store).unwrap();
    session.apply_windowed_max();
    assert_eq!(session.trace(0).unwrap().windowed_max, 0.0);
}

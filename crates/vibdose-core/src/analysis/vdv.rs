//! Day/night Vibration Dose Value aggregation
//!
//! Day runs 07:00-23:00 and night 23:00-07:00 (UTC, the logger's clock).
//! Each trace's `total_4th_power_deviation` is raised to the 4th power and
//! summed into the bucket containing its start time; the 4th root of each
//! sum is the bucket's VDV in m s^-1.75.
//!
//! Exclusion codes are not consulted: excluded traces still add dose.

use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc};
use serde::Serialize;

use super::trace::Trace;
use crate::{DAY_START_HOUR, NIGHT_START_HOUR};

/// One day or night aggregation window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VdvBucket {
    /// Window start (07:00 or 23:00)
    pub start: DateTime<Utc>,
    /// Window end (23:00 or 07:00)
    pub end: DateTime<Utc>,
    /// Vibration dose value once aggregation has finished
    pub dose: f32,
}

impl VdvBucket {
    /// Day or night window containing `at`
    ///
    /// # Example
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use vibdose_core::analysis::vdv::VdvBucket;
    ///
    /// let at = Utc.with_ymd_and_hms(2024, 5, 2, 6, 59, 0).unwrap();
    /// let bucket = VdvBucket::containing(at);
    /// assert_eq!(bucket.start, Utc.with_ymd_and_hms(2024, 5, 1, 23, 0, 0).unwrap());
    /// assert_eq!(bucket.end, Utc.with_ymd_and_hms(2024, 5, 2, 7, 0, 0).unwrap());
    /// ```
    pub fn containing(at: DateTime<Utc>) -> Self {
        let date = at.date_naive();
        let day_start = date.and_time(hour(DAY_START_HOUR)).and_utc();
        let night_start = date.and_time(hour(NIGHT_START_HOUR)).and_utc();

        let (start, end) = match at.hour() {
            h if h < DAY_START_HOUR => (night_start - Duration::days(1), day_start),
            h if h < NIGHT_START_HOUR => (day_start, night_start),
            _ => (night_start, day_start + Duration::days(1)),
        };

        Self {
            start,
            end,
            dose: 0.0,
        }
    }

    /// Inclusive at both ends
    ///
    /// A trace exactly on a boundary joins whichever adjacent bucket was
    /// created first.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }

    /// Whether this is a day-time (07:00-23:00) window
    pub fn is_day(&self) -> bool {
        self.start.hour() == DAY_START_HOUR
    }
}

fn hour(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Aggregate traces into a fresh list of buckets
///
/// Buckets appear in order of first use. Traces are taken in collection
/// order; each goes to the first existing bucket that contains it, or to a
/// new one.
pub fn aggregate(traces: &[Trace]) -> Vec<VdvBucket> {
    let mut buckets: Vec<VdvBucket> = Vec::new();

    for trace in traces {
        let contribution = f64::from(trace.total_4th_power_deviation).powi(4);
        match buckets.iter_mut().find(|b| b.contains(trace.start_time)) {
            Some(bucket) => {
                bucket.dose = (f64::from(bucket.dose) + contribution) as f32;
            }
            None => {
                let mut bucket = VdvBucket::containing(trace.start_time);
                bucket.dose = contribution as f32;
                buckets.push(bucket);
            }
        }
    }

    for bucket in &mut buckets {
        bucket.dose = f64::from(bucket.dose).powf(0.25) as f32;
    }

    tracing::debug!(traces = traces.len(), buckets = buckets.len(), "Aggregated VDV");
    buckets
}

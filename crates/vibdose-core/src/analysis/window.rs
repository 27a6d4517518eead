//! Event segmentation and windowed peak magnitudes
//!
//! Bursts recorded within a few seconds of each other belong to one physical
//! event. For each event the peak of a Blackman-weighted moving sum of the
//! per-sample deviation magnitude is found across all of its bursts, scaled
//! back to sensor counts and attributed to the event's first burst.
//!
//! ```text
//! time:   |--a--| |--b--|        |--c--|
//!         <  6 s  >              >= 6 s
//! event:  [ a  b ]               [ c ]
//! peak:   a.windowed_max         c.windowed_max
//! ```

use chrono::Duration;

use super::trace::{axis_means, Trace};
use crate::{EVENT_GAP_SECS, SENSOR_SCALE};

/// Span of the window's cosine formula; coefficients use indices 1..WINDOW_SPAN
const WINDOW_SPAN: usize = 22;

/// Sum of the window coefficients
pub const WINDOW_SUM: f64 = 9.24;

/// Converts the RMS-like windowed figure back to a peak-equivalent
const PEAK_FACTOR: f64 = 1.414213562;

/// Windowed-maximum filter with a precomputed 21-point Blackman window
///
/// # Example
/// ```
/// use vibdose_core::analysis::window::WindowedPeakFilter;
///
/// let filter = WindowedPeakFilter::new();
/// assert_eq!(filter.window().len(), 21);
///
/// // Too short for a single window position
/// assert_eq!(filter.peak(&[1.0; 20]), None);
/// ```
#[derive(Debug, Clone)]
pub struct WindowedPeakFilter {
    window: Vec<f64>,
}

impl WindowedPeakFilter {
    /// Build the window
    pub fn new() -> Self {
        let m = WINDOW_SPAN as f64;
        let window = (1..WINDOW_SPAN)
            .map(|i| {
                let im = 2.0 * std::f64::consts::PI * i as f64 / m;
                0.42 - 0.50 * im.cos() + 0.08 * (2.0 * im).cos()
            })
            .collect();
        Self { window }
    }

    /// Window coefficients
    pub fn window(&self) -> &[f64] {
        &self.window
    }

    /// Largest dot product of the window with any fully overlapped slice of
    /// `magnitudes`; `None` when the sequence is shorter than the window
    pub fn peak(&self, magnitudes: &[f64]) -> Option<f64> {
        magnitudes
            .windows(self.window.len())
            .map(|slice| {
                slice
                    .iter()
                    .zip(&self.window)
                    .map(|(v, w)| w * v)
                    .sum::<f64>()
            })
            .reduce(f64::max)
    }

    /// Windowed peak of one burst's deviation magnitude
    pub fn trace_peak(&self, trace: &Trace) -> Option<f64> {
        self.peak(&deviation_magnitudes(&trace.samples))
    }

    /// Segment traces into events and set `windowed_max` on each event's
    /// first trace
    ///
    /// Traces must be in chronological order. Events containing any excluded
    /// trace get no windowed maximum. Every other trace is reset to 0.
    ///
    /// # Returns
    /// Number of events found
    pub fn apply(&self, traces: &mut [Trace]) -> usize {
        let gap = Duration::seconds(EVENT_GAP_SECS);
        let mut events = 0;
        let mut event: Option<EventAccumulator> = None;
        let mut last_start = None;

        for i in 0..traces.len() {
            traces[i].windowed_max = 0.0;
            let start = traces[i].start_time;

            // Gap is measured from the previous trace, not the event's first
            let continues = last_start.is_some_and(|last| start < last + gap);
            if !continues {
                if let Some(done) = event.take() {
                    done.close(traces);
                }
                event = Some(EventAccumulator::new(i));
                events += 1;
            }
            last_start = Some(start);

            if let Some(acc) = event.as_mut() {
                acc.add(self, &traces[i]);
            }
        }

        if let Some(done) = event {
            done.close(traces);
        }

        tracing::debug!(traces = traces.len(), events, "Applied windowed maximum");
        events
    }
}

impl Default for WindowedPeakFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Running state of the event being segmented
#[derive(Debug)]
struct EventAccumulator {
    /// Index of the event's first trace
    first: usize,
    /// Largest per-trace windowed peak so far
    peak: f64,
    excluded: bool,
}

impl EventAccumulator {
    fn new(first: usize) -> Self {
        Self {
            first,
            peak: 0.0,
            excluded: false,
        }
    }

    fn add(&mut self, filter: &WindowedPeakFilter, trace: &Trace) {
        if trace.is_excluded() {
            self.excluded = true;
        }
        if self.excluded {
            return;
        }
        if let Some(peak) = filter.trace_peak(trace) {
            self.peak = self.peak.max(peak);
        }
    }

    fn close(self, traces: &mut [Trace]) {
        if self.excluded {
            return;
        }
        traces[self.first].windowed_max =
            SENSOR_SCALE * (PEAK_FACTOR * self.peak / WINDOW_SUM) as f32;
    }
}

/// Euclidean norm of each sample's deviation from the burst's own mean
pub fn deviation_magnitudes(samples: &[[f32; 3]]) -> Vec<f64> {
    let mean = axis_means(samples);
    samples
        .iter()
        .map(|s| {
            let dx = f64::from(s[0]) - mean[0];
            let dy = f64::from(s[1]) - mean[1];
            let dz = f64::from(s[2]) - mean[2];
            (dx * dx + dy * dy + dz * dz).sqrt()
        })
        .collect()
}

//! Per-burst deviation statistics
//!
//! A burst is normalized to g by dividing by [`SENSOR_SCALE`], then reduced
//! against its own per-axis mean:
//!
//! ```text
//! d_i           = sum over axes of (v_axis - mean_axis)^2
//! max deviation = 16384 * sqrt(max d_i)
//! rms deviation = 16384 * sqrt(sum d_i / n)
//! 4th power     = (sum d_i^2 / fs)^(1/4)
//! ```
//!
//! Accumulation is done in f64 over f32 samples; results are stored as f32.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{SAMPLE_RATE_HZ, SENSOR_SCALE};

/// Accelerometer axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Axis {
    /// Axis index (0 = X, 1 = Y, 2 = Z)
    pub fn index(self) -> usize {
        self as usize
    }

    /// Axis with the largest per-axis peak
    ///
    /// X is compared with Y, the winner with Z. Each comparison keeps the
    /// later axis unless the earlier one is strictly greater, so ties go to
    /// the higher index.
    pub fn dominant(peaks: [f64; 3]) -> Axis {
        let (leader, leader_peak) = if peaks[0] > peaks[1] {
            (Axis::X, peaks[0])
        } else {
            (Axis::Y, peaks[1])
        };
        if leader_peak > peaks[2] {
            leader
        } else {
            Axis::Z
        }
    }
}

/// One contiguous burst of triaxial samples with its derived statistics
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    /// Log file the burst was read from
    pub file_name: String,
    /// Parse clock when the burst closed
    pub start_time: DateTime<Utc>,
    /// Position of the burst within its file
    pub index_in_file: usize,
    /// Sample rate in Hz
    pub sample_rate_hz: f32,
    /// Samples in g, in recording order
    pub samples: Vec<[f32; 3]>,
    /// Peak deviation from the mean, in sensor counts
    pub max_deviation: f32,
    /// RMS deviation from the mean, in sensor counts
    pub rms_deviation: f32,
    /// Fourth-root of the summed fourth-power deviation per second
    pub total_4th_power_deviation: f32,
    /// Axis with the largest single-sample squared deviation
    pub dominant_axis: Axis,
    /// Exclusion class (0 = included)
    pub exclusion_code: u32,
    /// Windowed peak of the event this burst opens (0 otherwise)
    pub windowed_max: f32,
}

impl Trace {
    /// Finalize a raw burst
    ///
    /// # Arguments
    /// * `file_name` - Source file name
    /// * `start_time` - Timestamp to record on the trace
    /// * `index_in_file` - Burst position within the file
    /// * `raw` - Unscaled samples; must not be empty
    pub fn from_burst(
        file_name: &str,
        start_time: DateTime<Utc>,
        index_in_file: usize,
        mut raw: Vec<[f32; 3]>,
    ) -> Self {
        for sample in &mut raw {
            for v in sample.iter_mut() {
                *v /= SENSOR_SCALE;
            }
        }
        let stats = DeviationStats::compute(&raw, SAMPLE_RATE_HZ);

        Self {
            file_name: file_name.to_string(),
            start_time,
            index_in_file,
            sample_rate_hz: SAMPLE_RATE_HZ,
            samples: raw,
            max_deviation: stats.max_deviation,
            rms_deviation: stats.rms_deviation,
            total_4th_power_deviation: stats.total_4th_power_deviation,
            dominant_axis: stats.dominant_axis,
            exclusion_code: 0,
            windowed_max: 0.0,
        }
    }

    /// Whether the trace carries a non-zero exclusion code
    pub fn is_excluded(&self) -> bool {
        self.exclusion_code > 0
    }

    /// Number of samples in the burst
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the burst has no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration covered by the samples, in seconds
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate_hz
    }
}

/// Deviation metrics of one normalized burst
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviationStats {
    pub max_deviation: f32,
    pub rms_deviation: f32,
    pub total_4th_power_deviation: f32,
    pub dominant_axis: Axis,
}

impl DeviationStats {
    /// Reduce normalized samples
    pub fn compute(samples: &[[f32; 3]], sample_rate_hz: f32) -> Self {
        let mean = axis_means(samples);

        let mut max_sq_dev = 0.0f64;
        let mut sum_sq_dev = 0.0f64;
        let mut sum_4th_pow = 0.0f64;
        let mut axis_peaks = [0.0f64; 3];

        for sample in samples {
            let mut sq_dev = 0.0f64;
            for axis in 0..3 {
                let d = f64::from(sample[axis]) - mean[axis];
                let axis_sq_dev = d * d;
                sq_dev += axis_sq_dev;
                if axis_sq_dev > axis_peaks[axis] {
                    axis_peaks[axis] = axis_sq_dev;
                }
            }
            if sq_dev > max_sq_dev {
                max_sq_dev = sq_dev;
            }
            sum_sq_dev += sq_dev;
            sum_4th_pow += sq_dev * sq_dev;
        }

        let n = samples.len() as f64;
        Self {
            max_deviation: SENSOR_SCALE * max_sq_dev.sqrt() as f32,
            rms_deviation: SENSOR_SCALE * (sum_sq_dev / n).sqrt() as f32,
            total_4th_power_deviation: (sum_4th_pow / f64::from(sample_rate_hz)).powf(0.25) as f32,
            dominant_axis: Axis::dominant(axis_peaks),
        }
    }
}

/// Per-axis mean of a burst
pub(crate) fn axis_means(samples: &[[f32; 3]]) -> [f64; 3] {
    let mut sum = [0.0f64; 3];
    for sample in samples {
        for axis in 0..3 {
            sum[axis] += f64::from(sample[axis]);
        }
    }
    let n = samples.len() as f64;
    [sum[0] / n, sum[1] / n, sum[2] / n]
}

//! Power-duration curve computation for performance analysis.
//!
//! The power-duration (mean-maximal power) curve gives, for every duration
//! from 1 s up to the stream length, the highest average power sustained for
//! that long.
//!
//! ## Features
//! - Full curve for a single activity via cumulative-energy differencing
//! - Best average power at selected durations
//! - All-time bests across multiple activities, with attribution
//! - Parallel processing for large activity sets
//!
//! ## Example
//! ```rust
//! use velometrics::curves::power_duration_curve;
//! use velometrics::Stream;
//!
//! let power = Stream::array((0..=100).map(f64::from).collect::<Vec<_>>());
//! let curve = power_duration_curve(&power, None, 0.0).unwrap().to_vec(0.0);
//! assert_eq!(curve.len(), 100);
//! assert_eq!(curve[0], 100.0);
//! assert_eq!(curve[49], 75.5);
//! ```

use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::Result;
use crate::preprocess::mask_values;
use crate::stream::{normalize, Stream};

/// Standard power curve durations in seconds
pub const STANDARD_POWER_DURATIONS: &[u32] = &[
    1, 5, 10, 15, 30, 60, 120, 300, 600, 1200, 1800, 3600, 5400, 7200,
];

/// Power-duration curve of a stream.
///
/// The result has `len(stream) - 1` entries; entry `t - 1` is the best
/// average power over any `t` consecutive samples. Streams with fewer than
/// two samples yield an empty curve. A series result is indexed by duration
/// in seconds.
pub fn power_duration_curve(
    stream: &Stream<f64>,
    mask: Option<&[bool]>,
    fill: f64,
) -> Result<Stream<f64>> {
    let (buffer, tag) = normalize(stream);
    let masked = mask_values(&buffer, mask, fill)?;
    let curve = power_duration_values(&masked);
    let durations = (1..=curve.len() as i64).collect();
    Ok(tag.restore_with_index(durations, curve))
}

/// Buffer-level power-duration curve.
///
/// With `E` the cumulative energy (`E[i] = x[0] + .. + x[i]`), the best total
/// energy over `t` samples is `max(E[i] - E[i - t])` for `i` in `t..n`. Lagged
/// differences of the cumulative sum only cover windows ending after `t`, so
/// a window starting at the first sample never counts. Reusing the
/// cumulative sum makes every duration a single O(n) pass instead of a fresh
/// rolling mean.
pub fn power_duration_values(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return Vec::new();
    }

    let energy: Vec<f64> = values
        .iter()
        .scan(0.0f64, |acc, &v| {
            *acc += v;
            Some(*acc)
        })
        .collect();

    let curve: Vec<f64> = (1..n)
        .map(|t| {
            let best = (t..n)
                .map(|i| energy[i] - energy[i - t])
                .fold(f64::MIN, f64::max);
            best / t as f64
        })
        .collect();

    debug!("[Curves] Computed power-duration curve over {} samples", n);
    curve
}

/// A single point on a best-power curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Duration in seconds
    pub duration: u32,
    /// Best average power in watts
    pub power: f64,
    /// Activity ID where this best was achieved (optional)
    pub activity_id: Option<String>,
    /// Timestamp when this best was achieved (optional)
    pub timestamp: Option<i64>,
}

impl CurvePoint {
    fn empty(duration: u32) -> Self {
        Self {
            duration,
            power: 0.0,
            activity_id: None,
            timestamp: None,
        }
    }
}

/// Best average power at selected durations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestPowerCurve {
    /// Points on the curve (duration → best power)
    pub points: Vec<CurvePoint>,
    /// Total activities analyzed
    pub activities_analyzed: u32,
}

impl BestPowerCurve {
    fn empty(durations: &[u32]) -> Self {
        Self {
            points: durations.iter().map(|&d| CurvePoint::empty(d)).collect(),
            activities_analyzed: 0,
        }
    }

    /// Get the best power at a specific duration
    pub fn get_power_at(&self, duration_seconds: u32) -> Option<f64> {
        self.points
            .iter()
            .find(|p| p.duration == duration_seconds)
            .map(|p| p.power)
    }

    /// Get the activity ID where the best was achieved at a duration
    pub fn get_activity_at(&self, duration_seconds: u32) -> Option<&str> {
        self.points
            .iter()
            .find(|p| p.duration == duration_seconds)
            .and_then(|p| p.activity_id.as_deref())
    }
}

/// Best average power of a single activity at the given durations.
///
/// Durations longer than the activity (or zero) report 0 W.
pub fn best_power_curve(power: &[f64], durations: &[u32]) -> BestPowerCurve {
    if power.is_empty() {
        return BestPowerCurve::empty(durations);
    }

    let points = durations
        .iter()
        .map(|&duration| CurvePoint {
            power: best_average_power(power, duration as usize),
            ..CurvePoint::empty(duration)
        })
        .collect();

    BestPowerCurve {
        points,
        activities_analyzed: 1,
    }
}

/// Best average power for a window size using a sliding sum.
pub fn best_average_power(power: &[f64], window_size: usize) -> f64 {
    if window_size == 0 || power.len() < window_size {
        return 0.0;
    }

    let mut window_sum: f64 = power[..window_size].iter().sum();
    let mut best_sum = window_sum;

    for i in window_size..power.len() {
        window_sum += power[i] - power[i - window_size];
        if window_sum > best_sum {
            best_sum = window_sum;
        }
    }

    best_sum / window_size as f64
}

/// All-time best power curve over multiple activities.
///
/// # Arguments
/// * `activities` - (activity_id, power, timestamp) tuples
/// * `durations` - Durations to compute (in seconds)
pub fn best_power_curve_multi(
    activities: &[(String, Vec<f64>, i64)],
    durations: &[u32],
) -> BestPowerCurve {
    if activities.is_empty() {
        return BestPowerCurve::empty(durations);
    }

    let mut curve = BestPowerCurve::empty(durations);
    for (activity_id, power, timestamp) in activities {
        for (point, &duration) in curve.points.iter_mut().zip(durations) {
            let avg = best_average_power(power, duration as usize);
            if avg > point.power {
                point.power = avg;
                point.activity_id = Some(activity_id.clone());
                point.timestamp = Some(*timestamp);
            }
        }
    }
    curve.activities_analyzed = activities.len() as u32;
    curve
}

/// All-time best power curve using parallel processing.
#[cfg(feature = "parallel")]
pub fn best_power_curve_multi_parallel(
    activities: &[(String, Vec<f64>, i64)],
    durations: &[u32],
) -> BestPowerCurve {
    if activities.len() < 10 {
        return best_power_curve_multi(activities, durations);
    }

    // Process activities in parallel
    let activity_curves: Vec<Vec<f64>> = activities
        .par_iter()
        .map(|(_, power, _)| {
            durations
                .iter()
                .map(|&d| best_average_power(power, d as usize))
                .collect()
        })
        .collect();

    // Merge results - first activity wins ties, as in the sequential version
    let mut curve = BestPowerCurve::empty(durations);
    for ((activity_id, _, timestamp), bests) in activities.iter().zip(activity_curves) {
        for (point, power) in curve.points.iter_mut().zip(bests) {
            if power > point.power {
                point.power = power;
                point.activity_id = Some(activity_id.clone());
                point.timestamp = Some(*timestamp);
            }
        }
    }
    curve.activities_analyzed = activities.len() as u32;
    curve
}

//! Robust outlier filtering based on rolling medians (Hampel filter).
//!
//! A sample is flagged when its distance from the local rolling median exceeds
//! `MAD_SCALE * threshold * MAD`, where MAD is the rolling median of those
//! distances. Flagged samples are replaced by the local median or by a fixed
//! replacement value.
//!
//! Windows are trailing with a minimum support of one sample, so the output
//! has the same length as the input. A local MAD of zero means any deviation
//! at all is an outlier; the comparison is a direct threshold test, so no
//! division is involved.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};
use crate::preprocess::check_window;
use crate::stream::{normalize, Stream};

/// Rescales MAD into a consistent estimator of the standard deviation for
/// Gaussian data.
pub const MAD_SCALE: f64 = 1.4826;

/// Configuration for [`median_filter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierConfig {
    /// Rolling window in samples (31 = the sample plus 30 before it)
    pub window: usize,
    /// Multiplier on the scaled MAD
    pub threshold: f64,
    /// Fixed replacement for outliers; `None` uses the local rolling median
    pub replacement: Option<f64>,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            window: 31,
            threshold: 1.0,
            replacement: None,
        }
    }
}

/// Result of filtering a buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredValues {
    pub values: Vec<f64>,
    /// Positions that were replaced
    pub outliers: Vec<usize>,
}

/// Replace statistical outliers in a stream.
///
/// Returns a new stream of the same container category and length.
pub fn median_filter(stream: &Stream<f64>, config: &OutlierConfig) -> Result<Stream<f64>> {
    let (buffer, tag) = normalize(stream);
    let filtered = hampel_values(&buffer, config)?;
    Ok(tag.restore(filtered.values))
}

/// Buffer-level Hampel filter.
pub fn hampel_values(values: &[f64], config: &OutlierConfig) -> Result<FilteredValues> {
    check_window(config.window)?;
    if config.threshold.is_nan() || config.threshold < 0.0 {
        return Err(MetricsError::invalid(format!(
            "outlier threshold must be non-negative, got {}",
            config.threshold
        )));
    }

    let medians = rolling_median(values, config.window);
    let deviations: Vec<f64> = values
        .iter()
        .zip(&medians)
        .map(|(v, m)| (v - m).abs())
        .collect();
    let mads = rolling_median(&deviations, config.window);

    let limit = MAD_SCALE * config.threshold;
    let mut out = values.to_vec();
    let mut outliers = Vec::new();
    for i in 0..values.len() {
        if deviations[i] > limit * mads[i] {
            out[i] = config.replacement.unwrap_or(medians[i]);
            outliers.push(i);
        }
    }

    debug!(
        "[Outliers] Replaced {} of {} samples (window={}, threshold={})",
        outliers.len(),
        values.len(),
        config.window,
        config.threshold
    );

    Ok(FilteredValues {
        values: out,
        outliers,
    })
}

/// Trailing rolling median with a shrinking window at the start.
///
/// Keeps the current window sorted, so each step costs O(window).
/// Even-sized windows average the two middle values.
pub fn rolling_median(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut sorted: Vec<f64> = Vec::with_capacity(window);
    let mut out = Vec::with_capacity(values.len());

    for (i, &v) in values.iter().enumerate() {
        if i >= window {
            let old = values[i - window];
            if let Ok(pos) = sorted.binary_search_by(|p| p.total_cmp(&old)) {
                sorted.remove(pos);
            }
        }
        let pos = sorted.partition_point(|p| p.total_cmp(&v).is_lt());
        sorted.insert(pos, v);
        out.push(median_of_sorted(&sorted));
    }
    out
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    let mid = n / 2;
    if n % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

//! Stream preprocessing: masking and rolling smoothing.
//!
//! All streams are assumed to be sampled at 1 Hz, so a window of `n` samples
//! is an `n`-second window.
//!
//! Every stream-level function returns a fresh stream and leaves its input
//! untouched. The only in-place operation is [`mask_values_in_place`], which
//! works on a buffer the caller explicitly hands over.
//!
//! ## Example
//! ```rust
//! use velometrics::preprocess::{rolling_mean, SmoothingConfig};
//! use velometrics::Stream;
//!
//! let power = Stream::sequence(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
//! let moving = [true, true, false, true, true];
//! let smoothed = rolling_mean(&power, Some(&moving), &SmoothingConfig::uniform(2)).unwrap();
//! assert_eq!(smoothed.to_vec(0.0), vec![1.0, 1.5, 1.0, 2.0, 4.5]);
//! ```

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};
use crate::stream::{normalize, Stream};

/// Default smoothing window in seconds.
pub const DEFAULT_SMOOTHING_WINDOW: usize = 10;

/// Averaging method for [`rolling_mean`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmoothingMode {
    /// Trailing simple moving average
    #[default]
    Uniform,
    /// Exponentially weighted moving average, window used as the span
    Ewma,
}

/// Configuration for rolling smoothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Window size in samples (span for EWMA)
    pub window: usize,
    /// Replacement for samples where the mask is false
    pub fill: f64,
    pub mode: SmoothingMode,
}

impl SmoothingConfig {
    /// Trailing moving average over `window` samples.
    pub fn uniform(window: usize) -> Self {
        Self {
            window,
            fill: 0.0,
            mode: SmoothingMode::Uniform,
        }
    }

    /// Exponentially weighted moving average with the given span.
    pub fn ewma(span: usize) -> Self {
        Self {
            window: span,
            fill: 0.0,
            mode: SmoothingMode::Ewma,
        }
    }

    /// Use `fill` for masked-out samples.
    pub fn with_fill(mut self, fill: f64) -> Self {
        self.fill = fill;
        self
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self::uniform(DEFAULT_SMOOTHING_WINDOW)
    }
}

/// Replace samples where `mask` is false with `fill`.
///
/// Without a mask the stream is returned unchanged. The result keeps the
/// container category of `stream`.
pub fn apply_mask(stream: &Stream<f64>, mask: Option<&[bool]>, fill: f64) -> Result<Stream<f64>> {
    let Some(mask) = mask else {
        return Ok(stream.clone());
    };
    let (buffer, tag) = normalize(stream);
    let masked = mask_values(&buffer, Some(mask), fill)?;
    Ok(tag.restore(masked))
}

/// Buffer-level masking. Returns a new buffer.
pub fn mask_values(values: &[f64], mask: Option<&[bool]>, fill: f64) -> Result<Vec<f64>> {
    let mut out = values.to_vec();
    if let Some(mask) = mask {
        mask_values_in_place(&mut out, mask, fill)?;
    }
    Ok(out)
}

/// Masking that overwrites `values` directly.
///
/// Only use this on a buffer you own; the stream-level API never calls it
/// on caller data.
pub fn mask_values_in_place(values: &mut [f64], mask: &[bool], fill: f64) -> Result<()> {
    MetricsError::check_lengths("mask", values.len(), mask.len())?;
    let mut replaced = 0usize;
    for (v, &keep) in values.iter_mut().zip(mask) {
        if !keep {
            *v = fill;
            replaced += 1;
        }
    }
    debug!("[Preprocess] Masked {} of {} samples", replaced, values.len());
    Ok(())
}

/// Rolling mean of a stream, after optional masking.
///
/// The output always has the same length and container category as the
/// input: the first samples use a shrinking window.
pub fn rolling_mean(
    stream: &Stream<f64>,
    mask: Option<&[bool]>,
    config: &SmoothingConfig,
) -> Result<Stream<f64>> {
    let (buffer, tag) = normalize(stream);
    let smoothed = smooth_values(&buffer, mask, config)?;
    Ok(tag.restore(smoothed))
}

/// Buffer-level rolling mean, after optional masking.
pub fn smooth_values(
    values: &[f64],
    mask: Option<&[bool]>,
    config: &SmoothingConfig,
) -> Result<Vec<f64>> {
    check_window(config.window)?;
    let masked = mask_values(values, mask, config.fill)?;
    Ok(match config.mode {
        SmoothingMode::Uniform => uniform_mean(&masked, config.window),
        SmoothingMode::Ewma => ewma(&masked, config.window),
    })
}

/// Trailing simple moving average with a shrinking window at the start.
pub fn uniform_mean(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return values.to_vec();
    }

    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0f64;
    // Non-zero samples in the window; at zero the running sum is reset so
    // masked stretches read exactly 0.0 instead of leftover rounding error.
    let mut nonzero = 0usize;
    for i in 0..values.len() {
        sum += values[i];
        if values[i] != 0.0 {
            nonzero += 1;
        }
        if i >= window {
            let leaving = values[i - window];
            sum -= leaving;
            if leaving != 0.0 {
                nonzero -= 1;
            }
        }
        if nonzero == 0 {
            sum = 0.0;
        } else if i >= window && i % window == 0 {
            // Periodic resync bounds drift over long streams
            sum = values[i + 1 - window..=i].iter().sum();
        }
        let count = (i + 1).min(window);
        out.push(sum / count as f64);
    }
    out
}

/// Exponentially weighted moving average with `alpha = 2 / (span + 1)`.
///
/// Uses bias-adjusted weights: each output is the weighted mean of all
/// samples so far with weights `(1 - alpha)^age`, so the first output equals
/// the first sample.
pub fn ewma(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;

    let mut out = Vec::with_capacity(values.len());
    let mut weighted_sum = 0.0f64;
    let mut weight_total = 0.0f64;
    for &v in values {
        weighted_sum = v + decay * weighted_sum;
        weight_total = 1.0 + decay * weight_total;
        out.push(weighted_sum / weight_total);
    }
    out
}

pub(crate) fn check_window(window: usize) -> Result<()> {
    if window == 0 {
        return Err(MetricsError::invalid("window must be a positive number of samples"));
    }
    Ok(())
}

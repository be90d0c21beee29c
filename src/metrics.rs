//! Cycling performance metrics derived from power streams.
//!
//! - Normalized power (NP) and xPower: quartic mean of smoothed power
//! - Relative intensity (IF/RI) and stress score (TSS/BikeScore)
//! - Best interval: highest rolling mean for a given duration
//! - Watts per kilogram
//!
//! ## Example
//! ```rust
//! use velometrics::metrics::{
//!     normalized_power, relative_intensity, stress_score, NormalizationMethod,
//! };
//! use velometrics::Stream;
//!
//! let power = Stream::array(vec![250.0; 3600]);
//! let np = normalized_power(&power, None, NormalizationMethod::Np).unwrap();
//! let intensity = relative_intensity(np, 250.0);
//! let tss = stress_score(np, 250.0, 3600.0);
//! assert!((intensity - 1.0).abs() < 1e-9);
//! assert!((tss - 100.0).abs() < 1e-6);
//! ```

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};
use crate::preprocess::{smooth_values, SmoothingConfig};
use crate::stream::{normalize, Stream};

/// Rolling window for normalized power, in seconds.
pub const NP_WINDOW: usize = 30;

/// EWMA span for xPower, in seconds.
pub const XPOWER_SPAN: usize = 25;

/// Smoothing applied before the quartic mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NormalizationMethod {
    /// 30 s trailing moving average
    #[default]
    #[serde(rename = "NP")]
    Np,
    /// 25 s exponentially weighted moving average
    #[serde(rename = "xPower")]
    XPower,
}

impl NormalizationMethod {
    /// Smoothing configuration for this method.
    pub fn smoothing(self) -> SmoothingConfig {
        match self {
            NormalizationMethod::Np => SmoothingConfig::uniform(NP_WINDOW),
            NormalizationMethod::XPower => SmoothingConfig::ewma(XPOWER_SPAN),
        }
    }
}

/// Normalized power of a stream (NP or xPower), masked samples set to 0.
///
/// An empty stream yields 0.0.
pub fn normalized_power(
    power: &Stream<f64>,
    mask: Option<&[bool]>,
    method: NormalizationMethod,
) -> Result<f64> {
    let (buffer, _) = normalize(power);
    normalized_power_values(&buffer, mask, method, 0.0)
}

/// Buffer-level normalized power with an explicit fill for masked samples.
pub fn normalized_power_values(
    values: &[f64],
    mask: Option<&[bool]>,
    method: NormalizationMethod,
    fill: f64,
) -> Result<f64> {
    let smoothed = smooth_values(values, mask, &method.smoothing().with_fill(fill))?;
    let np = quartic_mean(&smoothed);
    debug!(
        "[Metrics] {:?} over {} samples = {:.1}",
        method,
        values.len(),
        np
    );
    Ok(np)
}

/// `(mean(x^4))^(1/4)`; 0.0 for an empty slice.
pub fn quartic_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let fourth_power_avg = values.iter().map(|v| v.powi(4)).sum::<f64>() / values.len() as f64;
    fourth_power_avg.powf(0.25)
}

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// IF = NP / FTP (or RI = xPower / CP).
pub fn relative_intensity(norm_power: f64, threshold_power: f64) -> f64 {
    norm_power / threshold_power
}

/// TSS (from NP) or BikeScore (from xPower).
pub fn stress_score(norm_power: f64, threshold_power: f64, duration_seconds: f64) -> f64 {
    (duration_seconds / 3600.0) * relative_intensity(norm_power, threshold_power).powi(2) * 100.0
}

/// Highest mean value sustained over `window` seconds.
///
/// Windows shorter than `window` at the start of the stream also count, so a
/// stream shorter than `window` yields its overall mean. Empty streams yield 0.0.
pub fn best_interval(stream: &Stream<f64>, window: usize, mask: Option<&[bool]>) -> Result<f64> {
    let (buffer, _) = normalize(stream);
    best_interval_values(&buffer, window, mask, 0.0)
}

/// Buffer-level [`best_interval`].
pub fn best_interval_values(
    values: &[f64],
    window: usize,
    mask: Option<&[bool]>,
    fill: f64,
) -> Result<f64> {
    let smoothed = smooth_values(values, mask, &SmoothingConfig::uniform(window).with_fill(fill))?;
    Ok(smoothed.into_iter().reduce(f64::max).unwrap_or(0.0))
}

/// Power-to-weight ratio of every sample, in the caller's container category.
pub fn watts_per_kilo(power: &Stream<f64>, weight_kg: f64) -> Result<Stream<f64>> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(MetricsError::invalid(format!(
            "weight must be a positive number of kilograms, got {}",
            weight_kg
        )));
    }
    let (buffer, tag) = normalize(power);
    Ok(tag.restore(buffer.into_iter().map(|w| w / weight_kg).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_power_constant() {
        let stream = Stream::array(vec![1.0; 30]);
        let moving = vec![true; 30];
        let np = normalized_power(&stream, Some(&moving), NormalizationMethod::Np).unwrap();
        assert!((np - 1.0).abs() < 1e-12);

        let xp = normalized_power(&stream, Some(&moving), NormalizationMethod::XPower).unwrap();
        assert!((xp - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalized_power_penalizes_variability() {
        let steady = vec![200.0; 600];
        let surges: Vec<f64> = (0..600)
            .map(|i| if (i / 60) % 2 == 0 { 100.0 } else { 300.0 })
            .collect();
        let np_steady =
            normalized_power_values(&steady, None, NormalizationMethod::Np, 0.0).unwrap();
        let np_surges =
            normalized_power_values(&surges, None, NormalizationMethod::Np, 0.0).unwrap();
        assert!((mean(&surges) - 200.0).abs() < 1e-9);
        assert!(np_surges > np_steady);
    }

    #[test]
    fn test_normalized_power_empty() {
        let np = normalized_power(&Stream::array(vec![]), None, NormalizationMethod::Np).unwrap();
        assert_eq!(np, 0.0);
    }

    #[test]
    fn test_normalized_power_mask_length() {
        let err = normalized_power(
            &Stream::array(vec![1.0, 2.0]),
            Some(&[true]),
            NormalizationMethod::Np,
        )
        .unwrap_err();
        assert!(matches!(err, MetricsError::InvalidArgument { .. }));
    }

    #[test]
    fn test_relative_intensity() {
        assert_eq!(relative_intensity(300.0, 300.0), 1.0);
    }

    #[test]
    fn test_stress_score() {
        assert_eq!(stress_score(300.0, 300.0, 3600.0), 100.0);
        assert!((stress_score(150.0, 300.0, 7200.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_best_interval() {
        let stream = Stream::sequence(vec![1.0, 1.0, 1.0, 1.0, 1.0]);
        assert_eq!(best_interval(&stream, 5, None).unwrap(), 1.0);

        let power = Stream::array(vec![100.0, 200.0, 300.0, 200.0, 100.0]);
        assert_eq!(best_interval(&power, 1, None).unwrap(), 300.0);
        let best_3 = best_interval(&power, 3, None).unwrap();
        assert!((best_3 - 700.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_best_interval_masked() {
        let power = Stream::array(vec![100.0, 200.0, 900.0, 200.0, 100.0]);
        let moving = [true, true, false, true, true];
        assert_eq!(best_interval(&power, 1, Some(&moving)).unwrap(), 200.0);
    }

    #[test]
    fn test_best_interval_empty() {
        assert_eq!(best_interval(&Stream::array(vec![]), 5, None).unwrap(), 0.0);
    }

    #[test]
    fn test_watts_per_kilo() {
        let power = Stream::sequence(vec![300.0, 150.0]);
        let wpk = watts_per_kilo(&power, 75.0).unwrap();
        assert_eq!(wpk, Stream::sequence(vec![4.0, 2.0]));

        assert!(watts_per_kilo(&power, 0.0).is_err());
    }
}

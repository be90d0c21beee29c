//! FFI bindings for mobile platforms (iOS/Android).
//!
//! This module provides the UniFFI bindings that expose the metric pipeline
//! to Kotlin and Swift. Inputs are flat vectors; an empty `moving` vector
//! means "no mask". Structured results are returned as JSON strings, and a
//! failure becomes `{"error": "..."}` (or NaN for scalar results). All FFI
//! functions are prefixed with `ffi_` to avoid naming conflicts with the
//! internal API.

use log::{info, warn};
use serde::Serialize;

use crate::activity::ActivityStreams;
use crate::athlete::AthleteProfile;
use crate::curves::power_duration_values;
use crate::error::Result;
use crate::init_logging;
use crate::metrics::{normalized_power_values, stress_score, NormalizationMethod};
use crate::preprocess::{mask_values, smooth_values, SmoothingConfig};
use crate::summary::{ActivityMetrics, SummaryOptions};
use crate::zones::{zone_distribution, ZoneConfig};

fn mask_arg(moving: &[bool]) -> Option<&[bool]> {
    (!moving.is_empty()).then_some(moving)
}

fn to_json<T: Serialize>(result: Result<T>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|_| "{}".to_string()),
        Err(e) => {
            warn!("[Ffi] {}", e);
            serde_json::json!({ "error": e.to_string() }).to_string()
        }
    }
}

/// Normalized power (`method` = "NP") or xPower (`method` = "xPower").
///
/// Returns NaN when the mask length does not match or the method is unknown.
#[uniffi::export]
pub fn ffi_normalized_power(power: Vec<f64>, moving: Vec<bool>, method: String) -> f64 {
    init_logging();
    info!(
        "[Ffi] normalized_power called with {} samples ({})",
        power.len(),
        method
    );
    let method = match method.as_str() {
        "NP" => NormalizationMethod::Np,
        "xPower" => NormalizationMethod::XPower,
        other => {
            warn!("[Ffi] Unknown normalization method '{}'", other);
            return f64::NAN;
        }
    };
    normalized_power_values(&power, mask_arg(&moving), method, 0.0).unwrap_or_else(|e| {
        warn!("[Ffi] {}", e);
        f64::NAN
    })
}

/// Power-duration curve as a JSON array; element `t - 1` is the best mean
/// power over `t` seconds.
#[uniffi::export]
pub fn ffi_power_duration_curve(power: Vec<f64>, moving: Vec<bool>) -> String {
    init_logging();
    info!("[Ffi] power_duration_curve called with {} samples", power.len());
    to_json(
        mask_values(&power, mask_arg(&moving), 0.0)
            .map(|masked| power_duration_values(&masked)),
    )
}

/// Zone distribution as JSON.
///
/// Edge source precedence: non-empty `zones`, then `ftp`, then `lthr`; pass
/// 0 for thresholds that are not set.
#[uniffi::export]
pub fn ffi_time_in_zones(values: Vec<f64>, ftp: f64, lthr: f64, zones: Vec<f64>) -> String {
    init_logging();
    info!(
        "[Ffi] time_in_zones called with {} samples (ftp={}, lthr={}, {} custom edges)",
        values.len(),
        ftp,
        lthr,
        zones.len()
    );
    let config = ZoneConfig {
        ftp: Some(ftp),
        lthr: Some(lthr),
        zones: (!zones.is_empty()).then_some(zones),
        ..ZoneConfig::default()
    };
    to_json(zone_distribution(&values, &config))
}

/// Rolling mean (uniform, or EWMA when `ewma` is set) as a JSON array.
#[uniffi::export]
pub fn ffi_rolling_mean(values: Vec<f64>, moving: Vec<bool>, window: u32, ewma: bool) -> String {
    init_logging();
    info!(
        "[Ffi] rolling_mean called with {} samples (window={}, ewma={})",
        values.len(),
        window,
        ewma
    );
    let config = if ewma {
        SmoothingConfig::ewma(window as usize)
    } else {
        SmoothingConfig::uniform(window as usize)
    };
    to_json(smooth_values(&values, mask_arg(&moving), &config))
}

/// TSS (from NP) or BikeScore (from xPower).
#[uniffi::export]
pub fn ffi_stress_score(norm_power: f64, threshold_power: f64, duration_seconds: f64) -> f64 {
    init_logging();
    stress_score(norm_power, threshold_power, duration_seconds)
}

/// Full activity summary as JSON.
///
/// `streams_json` is the raw body of the streams endpoint and
/// `profile_json` an athlete profile document.
#[uniffi::export]
pub fn ffi_activity_metrics(
    activity_id: String,
    streams_json: String,
    profile_json: String,
) -> String {
    init_logging();
    info!("[Ffi] activity_metrics called for {}", activity_id);
    to_json(activity_metrics(activity_id, &streams_json, &profile_json))
}

fn activity_metrics(
    activity_id: String,
    streams_json: &str,
    profile_json: &str,
) -> Result<ActivityMetrics> {
    let streams = ActivityStreams::from_json(activity_id, streams_json)?;
    let profile: AthleteProfile = serde_json::from_str(profile_json)?;
    ActivityMetrics::compute(&streams, &profile, &SummaryOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffi_normalized_power() {
        let np = ffi_normalized_power(vec![200.0; 60], vec![], "NP".to_string());
        assert!((np - 200.0).abs() < 1e-9);
        assert!(ffi_normalized_power(vec![200.0; 60], vec![true], "NP".to_string()).is_nan());
        assert!(ffi_normalized_power(vec![200.0; 60], vec![], "FTP".to_string()).is_nan());
    }

    #[test]
    fn test_ffi_power_duration_curve() {
        assert_eq!(ffi_power_duration_curve(vec![0.0; 3], vec![]), "[0.0,0.0]");
        assert!(ffi_power_duration_curve(vec![0.0; 3], vec![true]).contains("error"));
    }

    #[test]
    fn test_ffi_time_in_zones() {
        let json = ffi_time_in_zones(vec![100.0, 250.0, 400.0], 250.0, 0.0, vec![]);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_samples"], 3);

        let json = ffi_time_in_zones(vec![100.0], 0.0, 0.0, vec![]);
        assert!(json.contains("error"));
    }

    #[test]
    fn test_ffi_rolling_mean() {
        assert_eq!(
            ffi_rolling_mean(vec![1.0, 2.0, 3.0], vec![], 2, false),
            "[1.0,1.5,2.5]"
        );
    }

    #[test]
    fn test_ffi_activity_metrics() {
        let streams = r#"[{"type": "watts", "data": [250, 250, 250, 250]}]"#;
        let json = ffi_activity_metrics(
            "1".to_string(),
            streams.to_string(),
            r#"{"ftp": 250}"#.to_string(),
        );
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["duration_seconds"], 4);

        let json = ffi_activity_metrics("1".to_string(), streams.to_string(), "{}".to_string());
        assert!(json.contains("error"));
    }
}

//! Per-activity metric summary.
//!
//! [`ActivityMetrics::compute`] runs the whole pipeline for one activity:
//! moving mask → smoothing → NP/xPower → intensity and stress scores → zone
//! distributions → best intervals.
//!
//! ## Example
//! ```rust
//! use velometrics::activity::{ActivityStreams, StreamType};
//! use velometrics::athlete::AthleteProfile;
//! use velometrics::summary::{ActivityMetrics, SummaryOptions};
//!
//! let streams = ActivityStreams::new("1").with_numeric(StreamType::Watts, vec![250.0; 3600]);
//! let profile = AthleteProfile::with_ftp(250.0);
//! let metrics = ActivityMetrics::compute(&streams, &profile, &SummaryOptions::default()).unwrap();
//! assert!((metrics.tss - 100.0).abs() < 1e-6);
//! ```

use log::{debug, info};
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::activity::{ActivityStreams, StreamType};
use crate::athlete::AthleteProfile;
use crate::error::Result;
use crate::metrics::{
    best_interval_values, mean, normalized_power_values, relative_intensity, stress_score,
    NormalizationMethod,
};
use crate::preprocess::mask_values;
use crate::stream::normalize;
use crate::zones::{zone_distribution, ZoneDistribution};

/// Interval durations reported by default, in seconds.
pub const STANDARD_INTERVALS: [u32; 5] = [5, 60, 300, 1200, 3600];

/// Options for [`ActivityMetrics::compute`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryOptions {
    /// Zero out samples where the athlete was not moving
    pub use_moving_mask: bool,
    /// Durations for best-interval search, in seconds
    pub intervals: Vec<u32>,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            use_moving_mask: true,
            intervals: STANDARD_INTERVALS.to_vec(),
        }
    }
}

/// Integrated metrics of a single activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityMetrics {
    pub activity_id: String,
    /// Moving samples (seconds at 1 Hz)
    pub duration_seconds: u64,
    pub ftp: f64,
    pub average_power: f64,
    pub peak_power: f64,
    pub normalized_power: f64,
    pub xpower: f64,
    /// NP / FTP
    pub intensity_factor: f64,
    /// xPower / FTP
    pub relative_intensity: f64,
    pub tss: f64,
    pub bike_score: f64,
    /// NP / average power; `None` for an activity without power output
    pub variability_index: Option<f64>,
    pub power_zones: ZoneDistribution,
    pub heart_rate_zones: Option<ZoneDistribution>,
    /// (duration, best mean power) pairs
    pub best_intervals: Vec<(u32, f64)>,
    /// NP per kilogram of body weight
    pub watts_per_kilo: Option<f64>,
}

impl ActivityMetrics {
    /// Compute the summary of one activity.
    ///
    /// Fails with `MissingData` without a `watts` stream and with
    /// `ConfigError` when the profile has no FTP.
    pub fn compute(
        streams: &ActivityStreams,
        profile: &AthleteProfile,
        options: &SummaryOptions,
    ) -> Result<Self> {
        let ftp = profile.require_ftp()?;
        let (watts, _) = normalize(&streams.numeric(StreamType::Watts)?);
        let mask = if options.use_moving_mask {
            streams.moving()
        } else {
            None
        };
        let power = mask_values(&watts, mask, 0.0)?;

        let duration_seconds = match mask {
            Some(moving) => moving.iter().filter(|&&m| m).count() as u64,
            None => power.len() as u64,
        };

        let average_power = mean(&power);
        let peak_power = power.iter().copied().reduce(f64::max).unwrap_or(0.0);
        let normalized_power = normalized_power_values(&power, None, NormalizationMethod::Np, 0.0)?;
        let xpower = normalized_power_values(&power, None, NormalizationMethod::XPower, 0.0)?;
        let duration = duration_seconds as f64;

        let power_zones = zone_distribution(&power, &profile.power_zone_config()?)?;
        let heart_rate_zones = heart_rate_distribution(streams, profile, mask)?;

        let best_intervals = options
            .intervals
            .iter()
            .filter(|&&d| d > 0 && d as usize <= power.len())
            .map(|&d| best_interval_values(&power, d as usize, None, 0.0).map(|best| (d, best)))
            .collect::<Result<Vec<_>>>()?;

        let watts_per_kilo = profile
            .weight_kg
            .filter(|&w| w > 0.0)
            .map(|w| normalized_power / w);

        let metrics = Self {
            activity_id: streams.activity_id.clone(),
            duration_seconds,
            ftp,
            average_power,
            peak_power,
            normalized_power,
            xpower,
            intensity_factor: relative_intensity(normalized_power, ftp),
            relative_intensity: relative_intensity(xpower, ftp),
            tss: stress_score(normalized_power, ftp, duration),
            bike_score: stress_score(xpower, ftp, duration),
            variability_index: (average_power > 0.0).then(|| normalized_power / average_power),
            power_zones,
            heart_rate_zones,
            best_intervals,
            watts_per_kilo,
        };

        info!(
            "[Summary] {}: NP={:.1} IF={:.3} TSS={:.1} over {}s",
            metrics.activity_id,
            metrics.normalized_power,
            metrics.intensity_factor,
            metrics.tss,
            metrics.duration_seconds
        );
        Ok(metrics)
    }

    /// Best mean power for a duration, if it was computed.
    pub fn best_interval(&self, duration: u32) -> Option<f64> {
        self.best_intervals
            .iter()
            .find(|(d, _)| *d == duration)
            .map(|(_, p)| *p)
    }
}

fn heart_rate_distribution(
    streams: &ActivityStreams,
    profile: &AthleteProfile,
    mask: Option<&[bool]>,
) -> Result<Option<ZoneDistribution>> {
    if !streams.has(StreamType::Heartrate) {
        debug!("[Summary] {} has no heartrate stream", streams.activity_id);
        return Ok(None);
    }
    let Ok(config) = profile.heart_rate_zone_config() else {
        debug!("[Summary] No heart rate zones configured, skipping");
        return Ok(None);
    };
    let (heartrate, _) = normalize(&streams.numeric(StreamType::Heartrate)?);
    let heartrate = mask_values(&heartrate, mask, 0.0)?;
    zone_distribution(&heartrate, &config).map(Some)
}

/// Compute summaries for many activities.
///
/// Each activity is computed independently; a failure for one activity does
/// not affect the others.
pub fn compute_metrics_batch(
    activities: &[ActivityStreams],
    profile: &AthleteProfile,
    options: &SummaryOptions,
) -> Vec<Result<ActivityMetrics>> {
    activities
        .iter()
        .map(|streams| ActivityMetrics::compute(streams, profile, options))
        .collect()
}

/// Compute summaries for many activities using parallel processing.
#[cfg(feature = "parallel")]
pub fn compute_metrics_batch_parallel(
    activities: &[ActivityStreams],
    profile: &AthleteProfile,
    options: &SummaryOptions,
) -> Vec<Result<ActivityMetrics>> {
    if activities.len() < 4 {
        return compute_metrics_batch(activities, profile, options);
    }
    activities
        .par_iter()
        .map(|streams| ActivityMetrics::compute(streams, profile, options))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetricsError;

    fn steady_ride(seconds: usize, watts: f64) -> ActivityStreams {
        ActivityStreams::new("steady")
            .with_numeric(StreamType::Time, (0..seconds).map(|t| t as f64).collect())
            .with_numeric(StreamType::Watts, vec![watts; seconds])
            .with_moving(vec![true; seconds])
    }

    #[test]
    fn test_steady_hour_at_ftp() {
        let streams = steady_ride(3600, 250.0);
        let profile = AthleteProfile {
            weight_kg: Some(62.5),
            ..AthleteProfile::with_ftp(250.0)
        };
        let m = ActivityMetrics::compute(&streams, &profile, &SummaryOptions::default()).unwrap();

        assert_eq!(m.duration_seconds, 3600);
        assert!((m.normalized_power - 250.0).abs() < 1e-9);
        assert!((m.xpower - 250.0).abs() < 1e-9);
        assert!((m.intensity_factor - 1.0).abs() < 1e-9);
        assert!((m.tss - 100.0).abs() < 1e-6);
        assert!((m.bike_score - 100.0).abs() < 1e-6);
        assert!((m.variability_index.unwrap() - 1.0).abs() < 1e-9);
        assert!((m.watts_per_kilo.unwrap() - 4.0).abs() < 1e-9);
        assert_eq!(m.best_intervals.len(), 5);
        assert_eq!(m.best_interval(3600), Some(250.0));
        // 250 W is exactly 100% of FTP: zone 4 (90-105%)
        assert_eq!(m.power_zones.get_zone_seconds(4), 3600);
        assert!(m.heart_rate_zones.is_none());
    }

    #[test]
    fn test_moving_mask_reduces_duration() {
        let mut moving = vec![true; 600];
        for m in moving.iter_mut().skip(300) {
            *m = false;
        }
        let streams = steady_ride(600, 200.0).with_moving(moving);
        let profile = AthleteProfile::with_ftp(250.0);

        let masked =
            ActivityMetrics::compute(&streams, &profile, &SummaryOptions::default()).unwrap();
        assert_eq!(masked.duration_seconds, 300);
        assert_eq!(masked.average_power, 100.0);

        let options = SummaryOptions {
            use_moving_mask: false,
            ..SummaryOptions::default()
        };
        let unmasked = ActivityMetrics::compute(&streams, &profile, &options).unwrap();
        assert_eq!(unmasked.duration_seconds, 600);
        assert_eq!(unmasked.average_power, 200.0);
    }

    #[test]
    fn test_long_intervals_skipped() {
        let streams = steady_ride(120, 200.0);
        let profile = AthleteProfile::with_ftp(250.0);
        let m = ActivityMetrics::compute(&streams, &profile, &SummaryOptions::default()).unwrap();
        let durations: Vec<u32> = m.best_intervals.iter().map(|(d, _)| *d).collect();
        assert_eq!(durations, vec![5, 60]);
    }

    #[test]
    fn test_heart_rate_zones_when_configured() {
        let streams =
            steady_ride(100, 200.0).with_numeric(StreamType::Heartrate, vec![150.0; 100]);
        let profile = AthleteProfile {
            lthr: Some(170.0),
            ..AthleteProfile::with_ftp(250.0)
        };
        let m = ActivityMetrics::compute(&streams, &profile, &SummaryOptions::default()).unwrap();
        let hr = m.heart_rate_zones.unwrap();
        // 150 / 170 = 88% of LTHR: zone 3 (83-94%)
        assert_eq!(hr.get_zone_seconds(3), 100);
    }

    #[test]
    fn test_missing_watts_and_ftp() {
        let options = SummaryOptions::default();
        let no_watts =
            ActivityStreams::new("x").with_numeric(StreamType::Heartrate, vec![120.0; 10]);
        let err = ActivityMetrics::compute(&no_watts, &AthleteProfile::with_ftp(250.0), &options)
            .unwrap_err();
        assert!(matches!(err, MetricsError::MissingData { .. }));

        let no_ftp = AthleteProfile::default();
        let err = ActivityMetrics::compute(&steady_ride(10, 100.0), &no_ftp, &options).unwrap_err();
        assert!(matches!(err, MetricsError::ConfigError { .. }));
    }

    #[test]
    fn test_negative_power_sample_still_summarized() {
        let mut watts = vec![200.0; 120];
        watts[10] = -1.0;
        let streams = steady_ride(120, 200.0).with_numeric(StreamType::Watts, watts);
        let profile = AthleteProfile::with_ftp(250.0);
        let m = ActivityMetrics::compute(&streams, &profile, &SummaryOptions::default()).unwrap();

        assert_eq!(m.duration_seconds, 120);
        assert!(m.normalized_power > 190.0 && m.normalized_power < 200.0);
        assert!(m.tss > 0.0);
        // The glitch counts in zone 1, the rest sits in zone 3 (80% of FTP)
        assert_eq!(m.power_zones.get_zone_seconds(1), 1);
        assert_eq!(m.power_zones.get_zone_seconds(3), 119);
        assert_eq!(m.power_zones.total_samples, 120);
    }

    #[test]
    fn test_zero_power_activity() {
        let streams = steady_ride(60, 0.0);
        let profile = AthleteProfile::with_ftp(250.0);
        let m = ActivityMetrics::compute(&streams, &profile, &SummaryOptions::default()).unwrap();
        assert_eq!(m.normalized_power, 0.0);
        assert_eq!(m.variability_index, None);
        assert_eq!(m.power_zones.get_zone_seconds(1), 60);
    }

    #[test]
    fn test_batch_keeps_order_and_failures() {
        let activities = vec![
            steady_ride(60, 100.0),
            ActivityStreams::new("empty"),
            steady_ride(60, 300.0),
        ];
        let profile = AthleteProfile::with_ftp(250.0);
        let results = compute_metrics_batch(&activities, &profile, &SummaryOptions::default());
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().average_power, 300.0);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_batch_parallel_matches_sequential() {
        let activities: Vec<ActivityStreams> = (0..8)
            .map(|i| steady_ride(120, 100.0 + i as f64 * 10.0))
            .collect();
        let profile = AthleteProfile::with_ftp(250.0);
        let options = SummaryOptions::default();
        assert_eq!(
            compute_metrics_batch(&activities, &profile, &options),
            compute_metrics_batch_parallel(&activities, &profile, &options)
        );
    }
}

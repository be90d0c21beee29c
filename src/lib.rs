//! # Velometrics
//!
//! Cycling stream preprocessing and training-load metrics.
//!
//! This library provides:
//! - Masking of non-moving samples and rolling smoothing (uniform and EWMA)
//! - Robust outlier replacement (rolling-median Hampel filter)
//! - Zone classification and time in zones (FTP, LTHR or custom edges)
//! - Normalized power, xPower, intensity factor, TSS and BikeScore
//! - The power-duration (mean-maximal power) curve
//! - Activity summaries and ride-to-ride comparison
//!
//! Every stream operation accepts a [`Stream`] in one of three container
//! categories (sequence with missing entries, dense array, labeled series),
//! works on a private copy and returns its result in the caller's category.
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel processing with rayon
//! - **`http`** - Enable the Strava API client for stream fetching
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use velometrics::{
//!     normalized_power, power_duration_curve, stress_score, NormalizationMethod, Stream,
//! };
//!
//! let power = Stream::sequence(vec![180.0, 220.0, 260.0, 300.0, 240.0, 200.0]);
//! let moving = [true, true, true, true, false, true];
//!
//! let np = normalized_power(&power, Some(&moving), NormalizationMethod::Np).unwrap();
//! let tss = stress_score(np, 250.0, 6.0);
//! let curve = power_duration_curve(&power, Some(&moving), 0.0).unwrap();
//!
//! assert!(np > 0.0 && tss > 0.0);
//! assert_eq!(curve.len(), 5);
//! ```

// Unified error handling
pub mod error;
pub use error::{MetricsError, OptionExt, Result};

// Stream containers and type normalization
pub mod stream;
pub use stream::{normalize, normalize_with, Series, Stream, StreamKind, StreamTag};

// Masking and rolling smoothing
pub mod preprocess;
pub use preprocess::{apply_mask, rolling_mean, SmoothingConfig, SmoothingMode};

// Rolling-median outlier filter
pub mod outliers;
pub use outliers::{median_filter, OutlierConfig};

// Zone classification
pub mod zones;
#[cfg(feature = "parallel")]
pub use zones::zone_distribution_parallel;
pub use zones::{
    compute_zones, time_in_zones, zone_distribution, ZoneConfig, ZoneDistribution, ZoneTables,
    DEFAULT_ZONE_TABLES,
};

// Scalar power metrics
pub mod metrics;
pub use metrics::{
    best_interval, normalized_power, relative_intensity, stress_score, watts_per_kilo,
    NormalizationMethod,
};

// Power-duration curves
pub mod curves;
#[cfg(feature = "parallel")]
pub use curves::best_power_curve_multi_parallel;
pub use curves::{
    best_power_curve, best_power_curve_multi, power_duration_curve, BestPowerCurve, CurvePoint,
};

// Activity streams as returned by the API
pub mod activity;
pub use activity::{ActivityStreams, RawStream, StreamType};

// Athlete thresholds and zone definitions
pub mod athlete;
pub use athlete::AthleteProfile;

// Per-activity summaries
pub mod summary;
#[cfg(feature = "parallel")]
pub use summary::compute_metrics_batch_parallel;
pub use summary::{compute_metrics_batch, ActivityMetrics, SummaryOptions};

// Ride-to-ride comparison
pub mod compare;
pub use compare::{compare_power_curves, synchronize_by_shift, SynchronizedStreams};

// Strava API client (optional)
#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "http")]
pub use http::StravaClient;

// FFI bindings for mobile platforms (iOS/Android)
#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
pub(crate) fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("Velometrics"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
pub(crate) fn init_logging() {
    // No-op on non-Android platforms
}

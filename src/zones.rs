//! Zone classification and time-in-zone calculations for power and heart rate.
//!
//! Zones are half-open bins over an ascending edge list: a value `v` is in
//! zone `k` iff `edge[k-1] < v <= edge[k]`. The built-in tables start at
//! [`ZONE_LOWER_SENTINEL`] and end at [`ZONE_UPPER_SENTINEL`], so every
//! finite value (a stopped 0 W sample, or a negative power-meter glitch)
//! lands in exactly one zone.
//!
//! ## Features
//! - FTP-based 7-zone power model
//! - LTHR-based 5-zone heart rate model
//! - Custom zone edges (e.g. athlete-defined zones from the API)
//! - Time-in-zone counts and percentage distributions
//!
//! ## Example
//! ```rust
//! use velometrics::zones::{compute_zones, ZoneConfig};
//! use velometrics::Stream;
//!
//! let power = Stream::array(vec![100.0, 180.0, 260.0, 400.0]);
//! let zones = compute_zones(&power, &ZoneConfig::from_ftp(250.0)).unwrap();
//! assert_eq!(zones, Stream::array(vec![1, 2, 4, 7]));
//! ```

use std::cmp::Ordering;

use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{MetricsError, Result};
use crate::stream::{normalize, Stream};

/// Upper edge standing in for +infinity. Finite so that zone tables survive
/// a JSON round trip.
pub const ZONE_UPPER_SENTINEL: f64 = f64::MAX;

/// Lower edge standing in for -infinity. Never scaled by a threshold.
pub const ZONE_LOWER_SENTINEL: f64 = f64::MIN;

/// FTP-relative 7-zone power edges.
pub const POWER_ZONE_FRACTIONS: [f64; 8] = [
    ZONE_LOWER_SENTINEL,
    0.55,
    0.75,
    0.90,
    1.05,
    1.20,
    1.50,
    ZONE_UPPER_SENTINEL,
];

pub const POWER_ZONE_NAMES: [&str; 7] = [
    "Active Recovery",
    "Endurance",
    "Tempo",
    "Threshold",
    "VO2Max",
    "Anaerobic",
    "Neuromuscular",
];

/// LTHR-relative 5-zone heart rate edges.
pub const HEART_RATE_ZONE_FRACTIONS: [f64; 6] = [
    ZONE_LOWER_SENTINEL,
    0.68,
    0.83,
    0.94,
    1.05,
    ZONE_UPPER_SENTINEL,
];

pub const HEART_RATE_ZONE_NAMES: [&str; 5] =
    ["Active Recovery", "Endurance", "Tempo", "Threshold", "VO2Max"];

/// Fractional edge tables used to scale FTP and LTHR into absolute edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneTables {
    pub power: Vec<f64>,
    pub heart_rate: Vec<f64>,
}

impl Default for ZoneTables {
    fn default() -> Self {
        Self {
            power: POWER_ZONE_FRACTIONS.to_vec(),
            heart_rate: HEART_RATE_ZONE_FRACTIONS.to_vec(),
        }
    }
}

/// Process-wide default tables, read-only after first use.
pub static DEFAULT_ZONE_TABLES: Lazy<ZoneTables> = Lazy::new(ZoneTables::default);

/// Configuration for zone classification.
///
/// Exactly one source of edges is used, in order of precedence: custom
/// `zones`, then `ftp`, then `lthr`. Zero values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Functional threshold power in watts
    pub ftp: Option<f64>,
    /// Lactate threshold heart rate in bpm
    pub lthr: Option<f64>,
    /// Custom absolute edges, ascending, N+1 edges for N zones
    pub zones: Option<Vec<f64>>,
    /// Labels for the N zones; defaults to 1..=N
    pub labels: Option<Vec<u32>>,
    /// Override for the fractional tables; defaults to [`DEFAULT_ZONE_TABLES`]
    pub tables: Option<ZoneTables>,
}

impl ZoneConfig {
    /// Create config from FTP using the 7-zone power model
    pub fn from_ftp(ftp: f64) -> Self {
        Self {
            ftp: Some(ftp),
            ..Self::default()
        }
    }

    /// Create config from LTHR using the 5-zone heart rate model
    pub fn from_lthr(lthr: f64) -> Self {
        Self {
            lthr: Some(lthr),
            ..Self::default()
        }
    }

    /// Create config with custom absolute edges
    pub fn custom(edges: Vec<f64>) -> Self {
        Self {
            zones: Some(edges),
            ..Self::default()
        }
    }

    pub fn with_labels(mut self, labels: Vec<u32>) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn with_tables(mut self, tables: ZoneTables) -> Self {
        self.tables = Some(tables);
        self
    }

    /// Absolute zone edges.
    pub fn edges(&self) -> Result<Vec<f64>> {
        let tables: &ZoneTables = match &self.tables {
            Some(tables) => tables,
            None => &DEFAULT_ZONE_TABLES,
        };

        let edges = if let Some(zones) = self.zones.as_ref().filter(|z| !z.is_empty()) {
            zones.clone()
        } else if let Some(ftp) = self.ftp.filter(|&v| v != 0.0) {
            scale(&tables.power, ftp)
        } else if let Some(lthr) = self.lthr.filter(|&v| v != 0.0) {
            scale(&tables.heart_rate, lthr)
        } else {
            return Err(MetricsError::config(
                "zone classification needs one of ftp, lthr or zones",
            ));
        };

        validate_edges(&edges)?;
        Ok(edges)
    }

    /// Labels for each bin, checked against the edge count.
    pub fn resolved_labels(&self, edges: &[f64]) -> Result<Vec<u32>> {
        let bins = edges.len().saturating_sub(1);
        match &self.labels {
            Some(labels) if labels.len() != bins => Err(MetricsError::invalid(format!(
                "{} labels supplied for {} zones",
                labels.len(),
                bins
            ))),
            Some(labels) => Ok(labels.clone()),
            None => Ok((1..=bins as u32).collect()),
        }
    }
}

fn scale(fractions: &[f64], threshold: f64) -> Vec<f64> {
    fractions
        .iter()
        .map(|&f| {
            if f == ZONE_UPPER_SENTINEL || f == ZONE_LOWER_SENTINEL {
                f
            } else {
                f * threshold
            }
        })
        .collect()
}

fn validate_edges(edges: &[f64]) -> Result<()> {
    if edges.len() < 2 {
        return Err(MetricsError::invalid(format!(
            "zone edges need at least 2 values, got {}",
            edges.len()
        )));
    }
    if edges
        .windows(2)
        .any(|w| w[0].partial_cmp(&w[1]) != Some(Ordering::Less))
    {
        return Err(MetricsError::invalid("zone edges must be strictly ascending"));
    }
    Ok(())
}

/// Bin position (0-based) of `value`, or `None` when it lies outside the
/// edges or is NaN.
pub fn classify(value: f64, edges: &[f64]) -> Option<usize> {
    let upper = edges.partition_point(|&e| e < value);
    if upper == 0 || upper >= edges.len() {
        return None;
    }
    Some(upper - 1)
}

/// Convert a stream into a stream of zone labels.
///
/// The result keeps the container category of `stream`. A value that falls
/// outside the edges fails with `InvalidArgument`.
pub fn compute_zones(stream: &Stream<f64>, config: &ZoneConfig) -> Result<Stream<u32>> {
    let (buffer, tag) = normalize(stream);
    let zones = zone_values(&buffer, config)?;
    Ok(tag.restore(zones))
}

/// Buffer-level zone classification.
pub fn zone_values(values: &[f64], config: &ZoneConfig) -> Result<Vec<u32>> {
    let edges = config.edges()?;
    let labels = config.resolved_labels(&edges)?;
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            classify(v, &edges).map(|bin| labels[bin]).ok_or_else(|| {
                MetricsError::invalid(format!(
                    "sample {} ({}) lies outside the zone edges",
                    i, v
                ))
            })
        })
        .collect()
}

/// Count samples (seconds at 1 Hz) per zone.
///
/// The result has one entry per zone in label order, zero-filled for zones
/// never visited. A series result is indexed by zone label.
pub fn time_in_zones(stream: &Stream<f64>, config: &ZoneConfig) -> Result<Stream<u64>> {
    let (buffer, tag) = normalize(stream);
    let distribution = zone_distribution(&buffer, config)?;
    let index = distribution.labels.iter().map(|&l| l as i64).collect();
    Ok(tag.restore_with_index(index, distribution.zone_samples))
}

/// Result of zone distribution calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneDistribution {
    /// Total data points analyzed
    pub total_samples: u64,
    /// Zone label for each bin
    pub labels: Vec<u32>,
    /// Samples in each zone
    pub zone_samples: Vec<u64>,
    /// Percentage of time in each zone
    pub zone_percentages: Vec<f64>,
    /// Average value across all samples
    pub average: f64,
    /// Peak value
    pub peak: f64,
}

impl ZoneDistribution {
    /// Get percentage for a zone label
    pub fn get_zone_percent(&self, label: u32) -> f64 {
        self.labels
            .iter()
            .position(|&l| l == label)
            .map(|i| self.zone_percentages[i])
            .unwrap_or(0.0)
    }

    /// Get seconds spent in a zone label
    pub fn get_zone_seconds(&self, label: u32) -> u64 {
        self.labels
            .iter()
            .position(|&l| l == label)
            .map(|i| self.zone_samples[i])
            .unwrap_or(0)
    }

    fn from_counts(labels: Vec<u32>, zone_samples: Vec<u64>, sum: f64, peak: f64) -> Self {
        let total: u64 = zone_samples.iter().sum();
        let zone_percentages = zone_samples
            .iter()
            .map(|&c| {
                if total == 0 {
                    0.0
                } else {
                    c as f64 / total as f64 * 100.0
                }
            })
            .collect();
        Self {
            total_samples: total,
            labels,
            zone_samples,
            zone_percentages,
            average: if total == 0 { 0.0 } else { sum / total as f64 },
            peak: if total == 0 { 0.0 } else { peak },
        }
    }
}

/// Calculate the zone distribution of a buffer.
///
/// Samples outside the edges (NaN, or below the first custom edge) are left
/// out of the counts, the average and the peak.
pub fn zone_distribution(values: &[f64], config: &ZoneConfig) -> Result<ZoneDistribution> {
    let edges = config.edges()?;
    let labels = config.resolved_labels(&edges)?;

    let mut counts = vec![0u64; labels.len()];
    let mut sum = 0.0f64;
    let mut peak = f64::MIN;
    let mut skipped = 0usize;
    for &v in values {
        match classify(v, &edges) {
            Some(bin) => {
                counts[bin] += 1;
                sum += v;
                peak = peak.max(v);
            }
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("[Zones] Skipped {} samples outside the zone edges", skipped);
    }
    debug!(
        "[Zones] Distributed {} samples over {} zones",
        values.len() - skipped,
        labels.len()
    );

    Ok(ZoneDistribution::from_counts(labels, counts, sum, peak))
}

/// Zone distribution using parallel processing.
/// More efficient for large datasets (> 10,000 samples).
#[cfg(feature = "parallel")]
pub fn zone_distribution_parallel(values: &[f64], config: &ZoneConfig) -> Result<ZoneDistribution> {
    if values.len() < 10_000 {
        // Fall back to sequential for small datasets
        return zone_distribution(values, config);
    }

    let edges = config.edges()?;
    let labels = config.resolved_labels(&edges)?;
    let bins = labels.len();

    let (counts, sum, peak, skipped) = values
        .par_iter()
        .fold(
            || (vec![0u64; bins], 0.0f64, f64::MIN, 0usize),
            |(mut counts, sum, peak, skipped), &v| match classify(v, &edges) {
                Some(bin) => {
                    counts[bin] += 1;
                    (counts, sum + v, peak.max(v), skipped)
                }
                None => (counts, sum, peak, skipped + 1),
            },
        )
        .reduce(
            || (vec![0u64; bins], 0.0f64, f64::MIN, 0),
            |(mut c1, s1, p1, k1), (c2, s2, p2, k2)| {
                for i in 0..bins {
                    c1[i] += c2[i];
                }
                (c1, s1 + s2, p1.max(p2), k1 + k2)
            },
        );

    if skipped > 0 {
        debug!("[Zones] Skipped {} samples outside the zone edges", skipped);
    }

    Ok(ZoneDistribution::from_counts(labels, counts, sum, peak))
}

//! Comparing two rides over the same course.
//!
//! Two efforts on the same route rarely start at the same point. The second
//! activity's distance axis is shifted so that its start lines up with a
//! chosen sample of the first, then its power is resampled onto the first
//! activity's distance samples.
//!
//! ## Example
//! ```rust
//! use velometrics::compare::synchronize_by_shift;
//!
//! let distance_a = [0.0, 1.0, 2.0, 3.0];
//! let power_a = [200.0, 210.0, 220.0, 230.0];
//! let distance_b = [0.0, 1.0, 2.0];
//! let power_b = [250.0, 260.0, 270.0];
//!
//! let sync = synchronize_by_shift(&distance_a, &power_a, &distance_b, &power_b, 1).unwrap();
//! assert_eq!(sync.power_b, vec![0.0, 250.0, 260.0, 270.0]);
//! assert_eq!(sync.power_a, vec![0.0, 210.0, 220.0, 230.0]);
//! ```

use log::debug;
use serde::{Deserialize, Serialize};

use crate::curves::BestPowerCurve;
use crate::error::{MetricsError, Result};

pub use crate::curves::best_power_curve_multi;
#[cfg(feature = "parallel")]
pub use crate::curves::best_power_curve_multi_parallel;

/// Interpolated power below this is treated as "B not riding here".
const ZERO_POWER_EPSILON: f64 = 1e-6;

/// Two power streams aligned on a common distance axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynchronizedStreams {
    /// Distance samples of the first activity
    pub distance: Vec<f64>,
    /// First activity's power, zeroed where the second has none
    pub power_a: Vec<f64>,
    /// Second activity's power resampled onto `distance`
    pub power_b: Vec<f64>,
    /// `power_b - power_a`
    pub difference: Vec<f64>,
    pub shift: usize,
}

impl SynchronizedStreams {
    /// Difference with every negative value clamped to zero.
    pub fn positive_difference(&self) -> Vec<f64> {
        self.difference.iter().map(|d| d.max(0.0)).collect()
    }
}

/// Align activity B onto activity A's distance axis.
///
/// B's distance is offset by `distance_a[shift]`, then B's power is linearly
/// interpolated at each of A's distance samples (0.0 outside B's range).
/// Wherever the interpolated B power is zero, A's power is zeroed too, so the
/// two profiles cover the same stretch of road. Inputs are not modified.
pub fn synchronize_by_shift(
    distance_a: &[f64],
    power_a: &[f64],
    distance_b: &[f64],
    power_b: &[f64],
    shift: usize,
) -> Result<SynchronizedStreams> {
    MetricsError::check_lengths("power_a", distance_a.len(), power_a.len())?;
    MetricsError::check_lengths("power_b", distance_b.len(), power_b.len())?;
    let Some(&offset) = distance_a.get(shift) else {
        return Err(MetricsError::invalid(format!(
            "shift {} is outside the first activity ({} samples)",
            shift,
            distance_a.len()
        )));
    };
    if distance_b.windows(2).any(|w| w[1] < w[0]) {
        return Err(MetricsError::invalid(
            "distance of the second activity must be non-decreasing",
        ));
    }

    let shifted_b: Vec<f64> = distance_b.iter().map(|d| d + offset).collect();
    let resampled_b: Vec<f64> = distance_a
        .iter()
        .map(|&x| interpolate(x, &shifted_b, power_b))
        .collect();

    let aligned_a: Vec<f64> = power_a
        .iter()
        .zip(&resampled_b)
        .map(|(&a, &b)| if b < ZERO_POWER_EPSILON { 0.0 } else { a })
        .collect();

    let difference = resampled_b
        .iter()
        .zip(&aligned_a)
        .map(|(b, a)| b - a)
        .collect();

    debug!(
        "[Compare] Synchronized {} samples against {} (shift={}, offset={:.3})",
        distance_a.len(),
        distance_b.len(),
        shift,
        offset
    );

    Ok(SynchronizedStreams {
        distance: distance_a.to_vec(),
        power_a: aligned_a,
        power_b: resampled_b,
        difference,
        shift,
    })
}

/// Piecewise-linear interpolation of `(xp, fp)` at `x`; 0.0 outside `xp`.
fn interpolate(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let (Some(&first), Some(&last)) = (xp.first(), xp.last()) else {
        return 0.0;
    };
    if x.is_nan() || x < first || x > last {
        return 0.0;
    }
    let upper = xp.partition_point(|&p| p <= x);
    if upper == xp.len() {
        return fp[xp.len() - 1];
    }
    let lower = upper - 1;
    let t = (x - xp[lower]) / (xp[upper] - xp[lower]);
    fp[lower] + t * (fp[upper] - fp[lower])
}

/// One duration of a power-curve comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveDelta {
    pub duration: u32,
    pub power_a: f64,
    pub power_b: f64,
    /// `power_b - power_a`
    pub difference: f64,
}

/// Compare two best-power curves at every duration they have in common.
pub fn compare_power_curves(a: &BestPowerCurve, b: &BestPowerCurve) -> Vec<CurveDelta> {
    a.points
        .iter()
        .filter_map(|pa| {
            b.get_power_at(pa.duration).map(|power_b| CurveDelta {
                duration: pa.duration,
                power_a: pa.power,
                power_b,
                difference: power_b - pa.power,
            })
        })
        .collect()
}

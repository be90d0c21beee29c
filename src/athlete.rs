//! Athlete profile: thresholds, body weight and zone definitions.
//!
//! Profiles are plain JSON, either stored locally (`athlete.json`) or built
//! from the Strava athlete zones endpoint.
//!
//! ```json
//! { "athlete_id": 227615, "access_token": "…", "ftp": 280, "lthr": 172, "weight_kg": 71.5 }
//! ```

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MetricsError, Result};
use crate::zones::{ZoneConfig, ZONE_LOWER_SENTINEL, ZONE_UPPER_SENTINEL};

/// Thresholds and zone definitions of a single athlete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AthleteProfile {
    #[serde(default)]
    pub athlete_id: Option<u64>,
    #[serde(default)]
    pub access_token: Option<String>,
    /// Functional threshold power in watts
    #[serde(default)]
    pub ftp: Option<f64>,
    /// Lactate threshold heart rate in bpm
    #[serde(default)]
    pub lthr: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    /// Absolute power zone edges, overriding FTP scaling
    #[serde(default)]
    pub power_zones: Option<Vec<f64>>,
    /// Absolute heart rate zone edges, overriding LTHR scaling
    #[serde(default)]
    pub heart_rate_zones: Option<Vec<f64>>,
}

impl AthleteProfile {
    /// Profile with only an FTP set.
    pub fn with_ftp(ftp: f64) -> Self {
        Self {
            ftp: Some(ftp),
            ..Default::default()
        }
    }

    /// Read a profile from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let body = fs::read_to_string(path).map_err(|e| {
            MetricsError::config(format!(
                "cannot read athlete profile {}: {}",
                path.display(),
                e
            ))
        })?;
        let profile: AthleteProfile = serde_json::from_str(&body)?;
        info!(
            "[Athlete] Loaded profile from {} (athlete_id={:?})",
            path.display(),
            profile.athlete_id
        );
        Ok(profile)
    }

    /// Write the profile as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let body = serde_json::to_string_pretty(self)?;
        fs::write(path, body)?;
        Ok(())
    }

    /// Copy zone edges from a Strava `/athlete/zones` response.
    ///
    /// Each zone is `{ "min": .., "max": .. }`; a `max` of `-1` marks the
    /// open top zone. Zone kinds absent from the response leave the
    /// corresponding field untouched.
    pub fn with_strava_zones(mut self, zones: &Value) -> Result<Self> {
        if let Some(power) = zones.get("power") {
            self.power_zones = Some(strava_zone_edges(power, "power")?);
        }
        if let Some(heart_rate) = zones.get("heart_rate") {
            self.heart_rate_zones = Some(strava_zone_edges(heart_rate, "heart_rate")?);
        }
        Ok(self)
    }

    /// Zone configuration for power streams: custom edges, else FTP tables.
    pub fn power_zone_config(&self) -> Result<ZoneConfig> {
        match (&self.power_zones, self.ftp) {
            (Some(edges), _) if !edges.is_empty() => Ok(ZoneConfig::custom(edges.clone())),
            (_, Some(ftp)) if ftp > 0.0 => Ok(ZoneConfig::from_ftp(ftp)),
            _ => Err(MetricsError::config(
                "athlete profile has neither power zones nor an FTP",
            )),
        }
    }

    /// Zone configuration for heart rate streams: custom edges, else LTHR tables.
    pub fn heart_rate_zone_config(&self) -> Result<ZoneConfig> {
        match (&self.heart_rate_zones, self.lthr) {
            (Some(edges), _) if !edges.is_empty() => Ok(ZoneConfig::custom(edges.clone())),
            (_, Some(lthr)) if lthr > 0.0 => Ok(ZoneConfig::from_lthr(lthr)),
            _ => Err(MetricsError::config(
                "athlete profile has neither heart rate zones nor an LTHR",
            )),
        }
    }

    /// FTP, or `ConfigError` when it is unset or not positive.
    pub fn require_ftp(&self) -> Result<f64> {
        self.ftp
            .filter(|&ftp| ftp > 0.0)
            .ok_or_else(|| MetricsError::config("athlete profile has no FTP"))
    }
}

fn strava_zone_edges(section: &Value, kind: &str) -> Result<Vec<f64>> {
    let zones = section
        .get("zones")
        .and_then(Value::as_array)
        .ok_or_else(|| MetricsError::ParseError {
            message: format!("{} zones: missing 'zones' list", kind),
        })?;

    let mut edges = Vec::with_capacity(zones.len() + 1);
    edges.push(ZONE_LOWER_SENTINEL);
    for zone in zones {
        let max = zone
            .get("max")
            .and_then(Value::as_f64)
            .ok_or_else(|| MetricsError::ParseError {
                message: format!("{} zones: zone without numeric 'max'", kind),
            })?;
        edges.push(if max < 0.0 { ZONE_UPPER_SENTINEL } else { max });
    }
    debug!("[Athlete] {} zone edges from API: {:?}", kind, edges);
    Ok(edges)
}

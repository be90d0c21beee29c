//! Activity streams as delivered by the Strava streams endpoint.
//!
//! The API returns a list of `{ "type": .., "data": [..] }` objects. This
//! module turns that list into a keyed set of streams and hands numeric
//! streams out as [`Stream::Sequence`] values, ready for the metric
//! functions.
//!
//! ## Example
//! ```rust
//! use velometrics::activity::{ActivityStreams, StreamType};
//!
//! let body = r#"[
//!     {"type": "time", "data": [0, 1, 2]},
//!     {"type": "watts", "data": [200, null, 240]},
//!     {"type": "moving", "data": [true, false, true]}
//! ]"#;
//! let streams = ActivityStreams::from_json("42", body).unwrap();
//! assert_eq!(streams.len(), 3);
//! assert!(streams.numeric(StreamType::Watts).is_ok());
//! assert!(streams.numeric(StreamType::Heartrate).is_err());
//! ```

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MetricsError, OptionExt, Result};
use crate::stream::Stream;

/// Stream names understood by the streams endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamType {
    Time,
    Latlng,
    Distance,
    Altitude,
    VelocitySmooth,
    Heartrate,
    Cadence,
    Watts,
    Temp,
    Moving,
    GradeSmooth,
}

impl StreamType {
    pub const ALL: [StreamType; 11] = [
        StreamType::Time,
        StreamType::Latlng,
        StreamType::Distance,
        StreamType::Altitude,
        StreamType::VelocitySmooth,
        StreamType::Heartrate,
        StreamType::Cadence,
        StreamType::Watts,
        StreamType::Temp,
        StreamType::Moving,
        StreamType::GradeSmooth,
    ];

    /// Name used by the API.
    pub fn as_str(self) -> &'static str {
        match self {
            StreamType::Time => "time",
            StreamType::Latlng => "latlng",
            StreamType::Distance => "distance",
            StreamType::Altitude => "altitude",
            StreamType::VelocitySmooth => "velocity_smooth",
            StreamType::Heartrate => "heartrate",
            StreamType::Cadence => "cadence",
            StreamType::Watts => "watts",
            StreamType::Temp => "temp",
            StreamType::Moving => "moving",
            StreamType::GradeSmooth => "grade_smooth",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == name)
    }
}

/// One element of the streams endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawStream {
    #[serde(rename = "type")]
    pub stream_type: String,
    pub data: Value,
    #[serde(default)]
    pub series_type: Option<String>,
    #[serde(default)]
    pub original_size: Option<u64>,
    #[serde(default)]
    pub resolution: Option<String>,
}

/// All streams of a single activity, keyed by type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityStreams {
    pub activity_id: String,
    numeric: HashMap<StreamType, Vec<Option<f64>>>,
    moving: Option<Vec<bool>>,
    latlng: Option<Vec<[f64; 2]>>,
}

impl ActivityStreams {
    /// Empty stream set for an activity.
    pub fn new(activity_id: impl Into<String>) -> Self {
        Self {
            activity_id: activity_id.into(),
            ..Default::default()
        }
    }

    /// Convert the list form returned by the API into a keyed stream set.
    pub fn from_raw(activity_id: impl Into<String>, raw: Vec<RawStream>) -> Result<Self> {
        let mut streams = Self::new(activity_id);
        for entry in raw {
            let Some(stream_type) = StreamType::from_name(&entry.stream_type) else {
                debug!(
                    "[Activity] Skipping unknown stream '{}' for {}",
                    entry.stream_type, streams.activity_id
                );
                continue;
            };
            streams.insert_raw(stream_type, entry.data)?;
        }
        debug!(
            "[Activity] {} has {} numeric streams, moving={}, latlng={}",
            streams.activity_id,
            streams.numeric.len(),
            streams.moving.is_some(),
            streams.latlng.is_some()
        );
        Ok(streams)
    }

    /// Parse the raw JSON body of the streams endpoint.
    pub fn from_json(activity_id: impl Into<String>, body: &str) -> Result<Self> {
        let raw: Vec<RawStream> = serde_json::from_str(body)?;
        Self::from_raw(activity_id, raw)
    }

    fn insert_raw(&mut self, stream_type: StreamType, data: Value) -> Result<()> {
        match stream_type {
            StreamType::Moving => {
                let moving = serde_json::from_value(data).map_err(|e| parse_error(stream_type, e))?;
                self.moving = Some(moving);
            }
            StreamType::Latlng => {
                let latlng = serde_json::from_value(data).map_err(|e| parse_error(stream_type, e))?;
                self.latlng = Some(latlng);
            }
            _ => {
                let values: Vec<Option<f64>> =
                    serde_json::from_value(data).map_err(|e| parse_error(stream_type, e))?;
                self.numeric.insert(stream_type, values);
            }
        }
        Ok(())
    }

    /// Add or replace a numeric stream.
    pub fn with_numeric(mut self, stream_type: StreamType, values: Vec<f64>) -> Self {
        self.numeric
            .insert(stream_type, values.into_iter().map(Some).collect());
        self
    }

    /// Add or replace the moving mask.
    pub fn with_moving(mut self, moving: Vec<bool>) -> Self {
        self.moving = Some(moving);
        self
    }

    /// A numeric stream as a sequence. Missing samples stay `None`.
    ///
    /// Fails with `MissingData` when the activity has no such stream.
    pub fn numeric(&self, stream_type: StreamType) -> Result<Stream<f64>> {
        self.numeric
            .get(&stream_type)
            .map(|values| Stream::Sequence(values.clone()))
            .ok_or_missing_stream(stream_type.as_str(), Some(self.activity_id.as_str()))
    }

    pub fn moving(&self) -> Option<&[bool]> {
        self.moving.as_deref()
    }

    pub fn latlng(&self) -> Option<&[[f64; 2]]> {
        self.latlng.as_deref()
    }

    pub fn has(&self, stream_type: StreamType) -> bool {
        match stream_type {
            StreamType::Moving => self.moving.is_some(),
            StreamType::Latlng => self.latlng.is_some(),
            _ => self.numeric.contains_key(&stream_type),
        }
    }

    /// Number of samples: the `time` stream if present, else the longest stream.
    pub fn len(&self) -> usize {
        if let Some(time) = self.numeric.get(&StreamType::Time) {
            return time.len();
        }
        self.lengths().map(|(_, n)| n).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check that every present stream has the same length.
    pub fn validate(&self) -> Result<()> {
        let expected = self.len();
        for (stream_type, n) in self.lengths() {
            MetricsError::check_lengths(stream_type.as_str(), expected, n)?;
        }
        Ok(())
    }

    fn lengths(&self) -> impl Iterator<Item = (StreamType, usize)> + '_ {
        self.numeric
            .iter()
            .map(|(t, v)| (*t, v.len()))
            .chain(self.moving.iter().map(|m| (StreamType::Moving, m.len())))
            .chain(self.latlng.iter().map(|l| (StreamType::Latlng, l.len())))
    }
}

fn parse_error(stream_type: StreamType, err: serde_json::Error) -> MetricsError {
    MetricsError::ParseError {
        message: format!("{} stream: {}", stream_type.as_str(), err),
    }
}

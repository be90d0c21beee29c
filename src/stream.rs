//! Stream containers and type normalization.
//!
//! Callers hand streams over in one of three container categories: a plain
//! ordered sequence (possibly with missing entries, as decoded from API JSON),
//! a dense numeric array, or a labeled series. Every public operation works
//! the same way:
//!
//! 1. [`normalize`] copies the input into a private `Vec<f64>` and returns a
//!    [`StreamTag`] describing the original category.
//! 2. The operation runs on the buffer.
//! 3. [`StreamTag::restore`] wraps the result back into the caller's category.
//!
//! Normalization always copies, so no operation can mutate caller-owned data.
//!
//! ## Example
//! ```rust
//! use velometrics::stream::{normalize, Stream};
//!
//! let watts = Stream::Sequence(vec![Some(200.0), None, Some(240.0)]);
//! let (buffer, tag) = normalize(&watts);
//! assert_eq!(buffer, vec![200.0, 0.0, 240.0]);
//!
//! let doubled: Vec<f64> = buffer.iter().map(|w| w * 2.0).collect();
//! let out = tag.restore(doubled);
//! assert_eq!(out.to_vec(0.0), vec![400.0, 0.0, 480.0]);
//! ```

use serde::{Deserialize, Serialize};

/// Value substituted for missing entries of a [`Stream::Sequence`] when
/// normalizing without an explicit fill.
pub const DEFAULT_NULL_FILL: f64 = 0.0;

/// Container category of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Plain ordered sequence, entries may be missing
    Sequence,
    /// Dense numeric array
    Array,
    /// Values with an integer label per sample
    Series,
}

/// A labeled series: one integer label per value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series<T> {
    /// Optional series name (e.g. "watts")
    pub name: Option<String>,
    /// Label of each sample, same length as `values`
    pub index: Vec<i64>,
    pub values: Vec<T>,
}

impl<T> Series<T> {
    /// Create a series with a positional index `0..n`.
    pub fn new(values: Vec<T>) -> Self {
        Self {
            name: None,
            index: positional_index(values.len()),
            values,
        }
    }

    /// Create a series with an explicit index.
    ///
    /// Returns `None` when the index and values differ in length.
    pub fn with_index(index: Vec<i64>, values: Vec<T>) -> Option<Self> {
        if index.len() != values.len() {
            return None;
        }
        Some(Self {
            name: None,
            index,
            values,
        })
    }

    /// Attach a name to the series.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value stored under `label`, if any.
    pub fn get(&self, label: i64) -> Option<&T> {
        self.index
            .iter()
            .position(|&l| l == label)
            .map(|i| &self.values[i])
    }
}

/// A stream in one of the supported container categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Stream<T> {
    /// Plain ordered sequence; `None` marks a missing sample
    Sequence(Vec<Option<T>>),
    /// Dense numeric array
    Array(Vec<T>),
    /// Labeled series
    Series(Series<T>),
}

impl<T> Stream<T> {
    /// Build a plain sequence with every entry present.
    pub fn sequence(values: impl IntoIterator<Item = T>) -> Self {
        Stream::Sequence(values.into_iter().map(Some).collect())
    }

    /// Build a dense array.
    pub fn array(values: impl IntoIterator<Item = T>) -> Self {
        Stream::Array(values.into_iter().collect())
    }

    /// Build a series with a positional index.
    pub fn series(values: impl IntoIterator<Item = T>) -> Self {
        Stream::Series(Series::new(values.into_iter().collect()))
    }

    pub fn kind(&self) -> StreamKind {
        match self {
            Stream::Sequence(_) => StreamKind::Sequence,
            Stream::Array(_) => StreamKind::Array,
            Stream::Series(_) => StreamKind::Series,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Stream::Sequence(v) => v.len(),
            Stream::Array(v) => v.len(),
            Stream::Series(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply `f` to every present value, keeping the container category.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Stream<U> {
        match self {
            Stream::Sequence(v) => {
                Stream::Sequence(v.iter().map(|x| x.as_ref().map(&mut f)).collect())
            }
            Stream::Array(v) => Stream::Array(v.iter().map(f).collect()),
            Stream::Series(s) => Stream::Series(Series {
                name: s.name.clone(),
                index: s.index.clone(),
                values: s.values.iter().map(f).collect(),
            }),
        }
    }
}

impl<T: Copy> Stream<T> {
    /// Copy the values out, substituting `missing` for absent sequence entries.
    pub fn to_vec(&self, missing: T) -> Vec<T> {
        match self {
            Stream::Sequence(v) => v.iter().map(|x| x.unwrap_or(missing)).collect(),
            Stream::Array(v) => v.clone(),
            Stream::Series(s) => s.values.clone(),
        }
    }
}

/// Tag remembering the container category of a normalized stream.
///
/// Carries everything needed to rebuild the caller's container around a
/// result buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamTag {
    Sequence,
    Array,
    Series { name: Option<String>, index: Vec<i64> },
}

impl StreamTag {
    pub fn kind(&self) -> StreamKind {
        match self {
            StreamTag::Sequence => StreamKind::Sequence,
            StreamTag::Array => StreamKind::Array,
            StreamTag::Series { .. } => StreamKind::Series,
        }
    }

    /// Wrap a result buffer into the original container category.
    ///
    /// A series keeps its original labels when the lengths agree and falls
    /// back to a positional index otherwise.
    pub fn restore<U>(&self, values: Vec<U>) -> Stream<U> {
        match self {
            StreamTag::Series { index, .. } if index.len() == values.len() => {
                self.restore_with_index(index.clone(), values)
            }
            _ => {
                let index = positional_index(values.len());
                self.restore_with_index(index, values)
            }
        }
    }

    /// Wrap a result buffer, using `index` as the labels if the original was
    /// a series. Sequence and array results ignore `index`.
    pub fn restore_with_index<U>(&self, index: Vec<i64>, values: Vec<U>) -> Stream<U> {
        match self {
            StreamTag::Sequence => Stream::Sequence(values.into_iter().map(Some).collect()),
            StreamTag::Array => Stream::Array(values),
            StreamTag::Series { name, .. } => {
                let index = if index.len() == values.len() {
                    index
                } else {
                    positional_index(values.len())
                };
                Stream::Series(Series {
                    name: name.clone(),
                    index,
                    values,
                })
            }
        }
    }
}

/// Normalize a stream into a private buffer, filling missing entries with
/// [`DEFAULT_NULL_FILL`].
pub fn normalize(stream: &Stream<f64>) -> (Vec<f64>, StreamTag) {
    normalize_with(stream, DEFAULT_NULL_FILL)
}

/// Normalize a stream into a private buffer, filling missing sequence
/// entries with `null_fill`. This is lossy by design: a missing sample and a
/// sample equal to `null_fill` become indistinguishable.
pub fn normalize_with(stream: &Stream<f64>, null_fill: f64) -> (Vec<f64>, StreamTag) {
    match stream {
        Stream::Sequence(v) => (
            v.iter().map(|x| x.unwrap_or(null_fill)).collect(),
            StreamTag::Sequence,
        ),
        Stream::Array(v) => (v.clone(), StreamTag::Array),
        Stream::Series(s) => (
            s.values.clone(),
            StreamTag::Series {
                name: s.name.clone(),
                index: s.index.clone(),
            },
        ),
    }
}

fn positional_index(len: usize) -> Vec<i64> {
    (0..len as i64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_sequence_fills_missing() {
        let stream = Stream::Sequence(vec![Some(1.0), None, Some(3.0)]);
        let (buffer, tag) = normalize(&stream);
        assert_eq!(buffer, vec![1.0, 0.0, 3.0]);
        assert_eq!(tag, StreamTag::Sequence);

        let (buffer, _) = normalize_with(&stream, -1.0);
        assert_eq!(buffer, vec![1.0, -1.0, 3.0]);
    }

    #[test]
    fn test_restore_keeps_category() {
        for stream in [
            Stream::sequence(vec![1.0, 2.0]),
            Stream::array(vec![1.0, 2.0]),
            Stream::series(vec![1.0, 2.0]),
        ] {
            let (buffer, tag) = normalize(&stream);
            let restored = tag.restore(buffer);
            assert_eq!(restored.kind(), stream.kind());
            assert_eq!(restored, stream);
        }
    }

    #[test]
    fn test_series_labels_survive() {
        let series = Series::with_index(vec![10, 11, 12], vec![5.0, 6.0, 7.0])
            .unwrap()
            .named("watts");
        let (buffer, tag) = normalize(&Stream::Series(series));
        match tag.restore(buffer) {
            Stream::Series(s) => {
                assert_eq!(s.index, vec![10, 11, 12]);
                assert_eq!(s.name.as_deref(), Some("watts"));
                assert_eq!(s.get(11), Some(&6.0));
            }
            other => panic!("expected series, got {:?}", other),
        }
    }

    #[test]
    fn test_series_reindexed_on_length_change() {
        let (_, tag) = normalize(&Stream::Series(
            Series::with_index(vec![7, 8, 9], vec![1.0, 2.0, 3.0]).unwrap(),
        ));
        match tag.restore(vec![1.0, 2.0]) {
            Stream::Series(s) => assert_eq!(s.index, vec![0, 1]),
            other => panic!("expected series, got {:?}", other),
        }
        match tag.restore_with_index(vec![1, 2], vec![1.0, 2.0]) {
            Stream::Series(s) => assert_eq!(s.index, vec![1, 2]),
            other => panic!("expected series, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_copies() {
        let stream = Stream::array(vec![1.0, 2.0, 3.0]);
        let (mut buffer, _) = normalize(&stream);
        buffer[0] = 99.0;
        assert_eq!(stream, Stream::array(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_empty_stream() {
        let (buffer, tag) = normalize(&Stream::<f64>::Array(vec![]));
        assert!(buffer.is_empty());
        assert!(tag.restore::<f64>(buffer).is_empty());
    }

    #[test]
    fn test_series_with_mismatched_index() {
        assert!(Series::with_index(vec![1, 2], vec![1.0]).is_none());
    }

    #[test]
    fn test_map_preserves_missing() {
        let stream = Stream::Sequence(vec![Some(2.0), None]);
        assert_eq!(stream.map(|v| v * 2.0), Stream::Sequence(vec![Some(4.0), None]));
    }
}

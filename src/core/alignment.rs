//! Time series alignment against session events.
//!
//! A window is the run of samples between the sample nearest to an event's
//! offset and the sample nearest to `offset + duration`. Samples are never
//! interpolated: every value in a window was actually recorded.

use crate::core::events::Event;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use thiserror::Error;

/// Errors raised by alignment and series construction.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlignError {
    #[error("time series is empty")]
    EmptySeries,
    #[error("channel {channel} out of range for {width}-column series")]
    ChannelOutOfRange { channel: usize, width: usize },
    #[error("row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("timestamp {time} at row {row} precedes the previous sample")]
    NonMonotonic { row: usize, time: f64 },
}

/// Sampled sensor data. Column 0 of every row is the timestamp in seconds;
/// the remaining columns are channel readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SeriesParts")]
pub struct TimeSeries {
    labels: Vec<String>,
    rows: Vec<Vec<f64>>,
}

#[derive(Deserialize)]
struct SeriesParts {
    #[serde(default)]
    labels: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl TryFrom<SeriesParts> for TimeSeries {
    type Error = AlignError;

    fn try_from(parts: SeriesParts) -> Result<Self, Self::Error> {
        Self::new(parts.labels, parts.rows)
    }
}

impl TimeSeries {
    /// Build a series, checking that rows share one width and that
    /// timestamps never decrease.
    pub fn new(labels: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, AlignError> {
        let width = rows.first().map_or(labels.len(), Vec::len);

        let mut previous = f64::NEG_INFINITY;
        for (row, sample) in rows.iter().enumerate() {
            if sample.len() != width || sample.is_empty() {
                return Err(AlignError::RaggedRow {
                    row,
                    expected: width,
                    found: sample.len(),
                });
            }
            if sample[0] < previous {
                return Err(AlignError::NonMonotonic {
                    row,
                    time: sample[0],
                });
            }
            previous = sample[0];
        }

        Ok(Self { labels, rows })
    }

    /// Column labels (may be empty for unlabelled data).
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns, timestamp included.
    pub fn width(&self) -> usize {
        self.rows.first().map_or(self.labels.len(), Vec::len)
    }

    pub fn timestamps(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(|row| row[0])
    }

    /// Index of the channel whose label is `label`.
    pub fn channel_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Keep only the samples preceding the first one later than `limit`.
    pub fn truncated_after(&self, limit: f64) -> Self {
        let end = self
            .rows
            .iter()
            .position(|row| row[0] > limit)
            .unwrap_or(self.rows.len());
        Self {
            labels: self.labels.clone(),
            rows: self.rows[..end].to_vec(),
        }
    }
}

/// Index of the sample whose timestamp is closest to `target`. On ties the
/// earliest sample wins.
pub fn nearest_sample(series: &TimeSeries, target: f64) -> Result<usize, AlignError> {
    if series.is_empty() {
        return Err(AlignError::EmptySeries);
    }

    // Only a strictly smaller distance replaces the best; NaN never does.
    let mut closest = 0;
    let mut best = f64::INFINITY;
    for (index, time) in series.timestamps().enumerate() {
        let distance = (time - target).abs();
        if distance < best {
            closest = index;
            best = distance;
        }
    }
    Ok(closest)
}

/// A slice of one channel, with times relative to the window start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub relative_times: Vec<f64>,
    pub values: Vec<f64>,
}

impl Window {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Descriptive statistics of the window values, `None` when empty.
    pub fn summary(&self) -> Option<WindowSummary> {
        if self.values.is_empty() {
            return None;
        }
        let values = self.values.as_slice();
        Some(WindowSummary {
            samples: values.len(),
            min: Statistics::min(values),
            max: Statistics::max(values),
            mean: Statistics::mean(values),
            std_dev: if values.len() > 1 {
                Statistics::std_dev(values)
            } else {
                0.0
            },
        })
    }
}

/// Summary statistics for a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub samples: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

/// Extract `duration` seconds of `channel` starting at the event offset.
///
/// The end sample is exclusive. When both ends resolve to the same sample
/// (or the end precedes the start) the window is empty.
pub fn windowed_slice(
    series: &TimeSeries,
    event: &Event,
    duration: f64,
    channel: usize,
) -> Result<Window, AlignError> {
    if series.is_empty() {
        return Err(AlignError::EmptySeries);
    }
    let width = series.width();
    if channel >= width {
        return Err(AlignError::ChannelOutOfRange { channel, width });
    }

    let target_start = event.secs as f64;
    let target_end = target_start + duration;
    let start = nearest_sample(series, target_start)?;
    let end = nearest_sample(series, target_end)?;

    if end <= start {
        return Ok(Window::default());
    }

    let rows = &series.rows[start..end];
    Ok(Window {
        relative_times: rows.iter().map(|row| row[0] - target_start).collect(),
        values: rows.iter().map(|row| row[channel]).collect(),
    })
}

/// Aligns a loaded series against events.
#[derive(Debug, Clone, Copy)]
pub struct TimeSeriesAligner<'s> {
    series: &'s TimeSeries,
}

impl<'s> TimeSeriesAligner<'s> {
    pub fn new(series: &'s TimeSeries) -> Self {
        Self { series }
    }

    pub fn nearest_sample(&self, target: f64) -> Result<usize, AlignError> {
        nearest_sample(self.series, target)
    }

    pub fn window(&self, event: &Event, duration: f64, channel: usize) -> Result<Window, AlignError> {
        windowed_slice(self.series, event, duration, channel)
    }
}

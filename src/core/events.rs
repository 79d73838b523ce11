//! Session event records and their textual schema.
//!
//! Every event is persisted as a single line of five fields in a fixed
//! order (`secs, delta, elapsed, type, info`) joined by `", "`. The
//! `elapsed` and `delta` columns use the `[-]M:SS` duration format produced
//! by [`format_duration`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Column names of the event record, in persisted order.
pub const EVENT_HEADERS: [&str; 5] = ["secs", "delta", "elapsed", "type", "info"];

/// Text written in place of a missing duration.
pub const NULL_MARKER: &str = "None";

/// Separator between record fields.
pub const FIELD_SEPARATOR: &str = ", ";

/// Kind of a session event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Controller software initialised
    Start,
    /// Connection to the controller established (the session anchor)
    Connect,
    /// Driver actuation, labelled from the driver map
    Actuation(String),
    /// Ignition command sent
    Ignition,
    /// Connection to the controller closed
    Disconnect,
}

impl EventKind {
    /// Label written to the `type` column.
    pub fn label(&self) -> &str {
        match self {
            EventKind::Start => "Start",
            EventKind::Connect => "Connect",
            EventKind::Actuation(label) => label,
            EventKind::Ignition => "Ignition",
            EventKind::Disconnect => "Disconnect",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<&str> for EventKind {
    /// Any label other than the fixed kinds is a driver actuation label.
    fn from(label: &str) -> Self {
        match label {
            "Start" => EventKind::Start,
            "Connect" => EventKind::Connect,
            "Ignition" => EventKind::Ignition,
            "Disconnect" => EventKind::Disconnect,
            other => EventKind::Actuation(other.to_string()),
        }
    }
}

/// A single event of a test session, relative to the connection anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Whole seconds since the anchor (negative before it)
    pub secs: i64,
    /// Time since the preceding event, `None` for the first event
    pub delta: Option<String>,
    /// `secs` formatted as `[-]M:SS`
    pub elapsed: String,
    /// Event kind
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Free-form detail (driver display name for actuations)
    pub info: String,
}

impl Event {
    /// Render the event as a record line (without trailing newline).
    pub fn to_record(&self) -> String {
        let delta = self.delta.as_deref().unwrap_or(NULL_MARKER);
        [
            self.secs.to_string().as_str(),
            delta,
            self.elapsed.as_str(),
            self.kind.label(),
            self.info.as_str(),
        ]
        .join(FIELD_SEPARATOR)
    }

    /// Parse a record line produced by [`Event::to_record`].
    pub fn from_record(line: &str) -> Result<Self, RecordError> {
        let line = line.trim_end_matches(|c: char| c == '\r' || c == '\n');
        let fields: Vec<&str> = line.splitn(EVENT_HEADERS.len(), FIELD_SEPARATOR).collect();
        if fields.len() != EVENT_HEADERS.len() {
            return Err(RecordError::FieldCount {
                expected: EVENT_HEADERS.len(),
                found: fields.len(),
                line: line.to_string(),
            });
        }

        let secs = fields[0]
            .trim()
            .parse::<i64>()
            .map_err(|_| RecordError::InvalidSecs(fields[0].to_string()))?;
        let delta = match fields[1] {
            NULL_MARKER => None,
            text => Some(text.to_string()),
        };

        Ok(Self {
            secs,
            delta,
            elapsed: fields[2].to_string(),
            kind: EventKind::from(fields[3]),
            info: fields[4].to_string(),
        })
    }
}

impl FromStr for Event {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_record(s)
    }
}

/// Header line of an events file.
pub fn record_header() -> String {
    EVENT_HEADERS.join(FIELD_SEPARATOR)
}

/// Errors when parsing an event record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("expected {expected} fields, found {found} in record '{line}'")]
    FieldCount {
        expected: usize,
        found: usize,
        line: String,
    },
    #[error("invalid seconds value '{0}'")]
    InvalidSecs(String),
}

/// Format a second count as `[-]M:SS`.
///
/// ```
/// use slonk_telemetry::core::format_duration;
///
/// assert_eq!(format_duration(125), "2:05");
/// assert_eq!(format_duration(-65), "-1:05");
/// ```
pub fn format_duration(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let magnitude = seconds.unsigned_abs();
    format!("{sign}{}:{:02}", magnitude / 60, magnitude % 60)
}

/// Like [`format_duration`], but renders `None` as [`NULL_MARKER`].
pub fn format_optional_duration(seconds: Option<i64>) -> String {
    seconds.map_or_else(|| NULL_MARKER.to_string(), format_duration)
}

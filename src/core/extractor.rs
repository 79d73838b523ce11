//! Event extraction from the controller console log.
//!
//! Extraction runs in two phases:
//! 1. Locate the anchor, the first line reporting an established controller
//!    connection. Its timestamp is the zero point of the session.
//! 2. Fold over every info-level line in order, classifying it against an
//!    ordered rule list and carrying the previous event offset for deltas.
//!
//! Lines that match no rule are skipped; the console log is mostly noise.

use crate::core::drivers::DriverMap;
use crate::core::events::{format_duration, Event, EventKind};
use chrono::{DateTime, NaiveDateTime};
use thiserror::Error;

/// Marker of the anchor line (also classifies as [`EventKind::Connect`]).
pub const ANCHOR_MARKER: &str = "Connection established to controller";

/// Level marker of lines considered for extraction.
pub const INFO_MARKER: &str = "[INFO]:";

const START_MARKER: &str = "Initializing slonkboard";
const ACTUATE_MARKER: &str = r#"Sent command {"type":"Actuate""#;
const IGNITION_MARKER: &str = r#"Sent command {"type":"Ignition"}"#;
const DISCONNECT_MARKER: &str = "Connection to controller closed";

/// Errors that abort extraction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no '{ANCHOR_MARKER}' line found in log")]
    MissingAnchor,
    #[error("unrecognized driver {driver_id} or state '{value}'")]
    UnrecognizedDriverOrState { driver_id: u32, value: String },
    #[error("malformed actuation command: {0}")]
    MalformedCommand(String),
    #[error("invalid timestamp in log line: {0}")]
    InvalidTimestamp(String),
}

/// A console log line split into its three parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLine<'a> {
    pub timestamp: &'a str,
    pub level: &'a str,
    pub message: &'a str,
}

impl<'a> LogLine<'a> {
    /// Split `<timestamp> [<LEVEL>]: <message>`. Returns `None` when the
    /// line does not have that layout.
    pub fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim_end_matches(|c: char| c == '\r' || c == '\n');
        let (timestamp, rest) = line.split_once(" [")?;
        let (level, message) = rest.split_once("]:")?;
        Some(Self {
            timestamp: timestamp.trim(),
            level,
            message: message.strip_prefix(' ').unwrap_or(message),
        })
    }

    /// Parse the timestamp as a naive date-time.
    pub fn time(&self) -> Result<NaiveDateTime, ExtractError> {
        parse_timestamp(self.timestamp)
            .ok_or_else(|| ExtractError::InvalidTimestamp(self.timestamp.to_string()))
    }
}

/// Parse an ISO-8601 timestamp, with or without fractional seconds or a
/// UTC offset. Offset timestamps are converted to UTC.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

/// Outcome of classifying one message.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Classified {
    Event { kind: EventKind, info: String },
    Skip,
}

type Classifier = fn(&str, &DriverMap) -> Result<Classified, ExtractError>;

/// Ordered classification rules; the first rule whose marker the message
/// contains decides the outcome.
const RULES: [(&str, Classifier); 5] = [
    (START_MARKER, classify_start),
    (ANCHOR_MARKER, classify_connect),
    (ACTUATE_MARKER, classify_actuation),
    (IGNITION_MARKER, classify_ignition),
    (DISCONNECT_MARKER, classify_disconnect),
];

fn fixed(kind: EventKind) -> Result<Classified, ExtractError> {
    Ok(Classified::Event {
        kind,
        info: String::new(),
    })
}

fn classify_start(_: &str, _: &DriverMap) -> Result<Classified, ExtractError> {
    fixed(EventKind::Start)
}

fn classify_connect(_: &str, _: &DriverMap) -> Result<Classified, ExtractError> {
    fixed(EventKind::Connect)
}

fn classify_ignition(_: &str, _: &DriverMap) -> Result<Classified, ExtractError> {
    fixed(EventKind::Ignition)
}

fn classify_disconnect(_: &str, _: &DriverMap) -> Result<Classified, ExtractError> {
    fixed(EventKind::Disconnect)
}

fn classify(message: &str, drivers: &DriverMap) -> Result<Classified, ExtractError> {
    RULES
        .iter()
        .find(|(marker, _)| message.contains(*marker))
        .map_or(Ok(Classified::Skip), |(_, classifier)| {
            classifier(message, drivers)
        })
}

/// Read `"driver_id":<id>,` and `"value":<value>}` out of an actuation
/// command and resolve them against the driver map.
fn classify_actuation(message: &str, drivers: &DriverMap) -> Result<Classified, ExtractError> {
    let driver_id = field_text(message, "driver_id\":", ',')
        .and_then(|text| text.trim().parse::<u32>().ok())
        .ok_or_else(|| ExtractError::MalformedCommand(message.to_string()))?;
    let value = field_text(message, "value\":", '}')
        .ok_or_else(|| ExtractError::MalformedCommand(message.to_string()))?;

    let unrecognized = || ExtractError::UnrecognizedDriverOrState {
        driver_id,
        value: value.to_string(),
    };
    let spec = drivers.get(driver_id).ok_or_else(unrecognized)?;
    let label = spec.states.get(value).ok_or_else(unrecognized)?;

    Ok(Classified::Event {
        kind: EventKind::Actuation(label.clone()),
        info: spec.name.clone(),
    })
}

/// Text after the first `key` up to `terminator` (or end of message).
fn field_text<'a>(message: &'a str, key: &str, terminator: char) -> Option<&'a str> {
    let (_, rest) = message.split_once(key)?;
    Some(rest.split(terminator).next().unwrap_or(rest))
}

/// Extracts typed events from an ordered console log.
#[derive(Debug, Clone, Copy)]
pub struct LogEventExtractor<'d> {
    drivers: &'d DriverMap,
}

impl<'d> LogEventExtractor<'d> {
    pub fn new(drivers: &'d DriverMap) -> Self {
        Self { drivers }
    }

    /// Find the anchor time: the timestamp of the first line containing
    /// [`ANCHOR_MARKER`], whatever its level.
    pub fn anchor<S: AsRef<str>>(&self, lines: &[S]) -> Result<NaiveDateTime, ExtractError> {
        let line = lines
            .iter()
            .map(AsRef::<str>::as_ref)
            .find(|line| line.contains(ANCHOR_MARKER))
            .ok_or(ExtractError::MissingAnchor)?;

        let timestamp = LogLine::parse(line)
            .map(|parsed| parsed.timestamp)
            .unwrap_or(line);
        parse_timestamp(timestamp)
            .ok_or_else(|| ExtractError::InvalidTimestamp(timestamp.to_string()))
    }

    /// Extract all events, in log order.
    pub fn extract<S: AsRef<str>>(&self, lines: &[S]) -> Result<Vec<Event>, ExtractError> {
        let anchor = self.anchor(lines)?;

        let mut events = Vec::new();
        let mut previous: Option<i64> = None;

        for line in lines.iter().map(AsRef::<str>::as_ref) {
            if !line.contains(INFO_MARKER) {
                continue;
            }
            let Some(parsed) = LogLine::parse(line) else {
                continue;
            };

            let secs = (parsed.time()? - anchor).num_seconds();
            let Classified::Event { kind, info } = classify(parsed.message, self.drivers)? else {
                continue;
            };

            events.push(Event {
                secs,
                delta: previous.map(|prev| format_duration(secs - prev)),
                elapsed: format_duration(secs),
                kind,
                info,
            });
            previous = Some(secs);
        }

        Ok(events)
    }
}

/// Convenience wrapper around [`LogEventExtractor::extract`].
pub fn extract<S: AsRef<str>>(lines: &[S], drivers: &DriverMap) -> Result<Vec<Event>, ExtractError> {
    LogEventExtractor::new(drivers).extract(lines)
}

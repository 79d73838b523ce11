//! Core analysis for slonk-telemetry.
//!
//! This module contains:
//! - Event records and their textual schema
//! - Event extraction from the controller console log
//! - Nearest-sample alignment of sensor data against events
//! - FIR lowpass filtering of extracted windows
//!
//! Nothing in here touches the filesystem or prints; see [`crate::session`]
//! for loading and storing session files.

pub mod alignment;
pub mod drivers;
pub mod events;
pub mod extractor;
pub mod filter;

// Re-export commonly used types
pub use alignment::{
    nearest_sample, windowed_slice, AlignError, TimeSeries, TimeSeriesAligner, Window,
    WindowSummary,
};
pub use drivers::{DriverMap, DriverSpec};
pub use events::{
    format_duration, format_optional_duration, record_header, Event, EventKind, RecordError,
    EVENT_HEADERS, NULL_MARKER,
};
pub use extractor::{extract, ExtractError, LogEventExtractor, LogLine};
pub use filter::{FilterError, FilterSpec, LowPassFilter, WindowFunction};

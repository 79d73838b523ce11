//! slonk-telemetry - event extraction and sensor windowing for test-stand
//! sessions.
//!
//! A hardware test session leaves behind two artifacts: the controller's
//! free-text console log and a high-rate CSV of sensor samples. This crate
//! turns them into a time-aligned view: typed events relative to the moment
//! the controller connected, and windows of sensor data following those
//! events, optionally smoothed by a FIR lowpass filter.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       slonk-telemetry                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  Extractor  │──▶│  Alignment  │──▶│   Filter    │       │
//! │  │ (log→events)│   │  (windows)  │   │(FIR lowpass)│       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │         ▲                 ▲                                 │
//! │         │                 │                                 │
//! │  ┌─────────────────────────────┐                            │
//! │  │   Session store (files)     │                            │
//! │  └─────────────────────────────┘                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use slonk_telemetry::core::{extract, DriverMap, DriverSpec, EventKind};
//!
//! let mut drivers = DriverMap::new();
//! drivers.insert(2, DriverSpec::new("ArmA").with_state("1", "Extend"));
//!
//! let log = [
//!     "2024-03-02T14:00:00 [INFO]: Initializing slonkboard",
//!     "2024-03-02T14:00:05 [INFO]: Connection established to controller",
//!     r#"2024-03-02T14:00:10 [INFO]: Sent command {"type":"Actuate","driver_id":2,"value":1}"#,
//! ];
//!
//! let events = extract(&log, &drivers).unwrap();
//! assert_eq!(events[0].elapsed, "-0:05");
//! assert_eq!(events[2].kind, EventKind::Actuation("Extend".to_string()));
//! assert_eq!(events[2].info, "ArmA");
//! ```

pub mod config;
pub mod core;
pub mod session;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use self::core::{
    extract, format_duration, nearest_sample, windowed_slice, AlignError, DriverMap, DriverSpec,
    Event, EventKind, ExtractError, FilterError, FilterSpec, LogEventExtractor, LowPassFilter,
    TimeSeries, TimeSeriesAligner, Window, WindowFunction, WindowSummary,
};
pub use session::{SessionDir, SessionError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

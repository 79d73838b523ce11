//! Session directory handling.
//!
//! A captured test session lives in one directory:
//!
//! ```text
//! <session>/
//! ├── data-raw/
//! │   ├── raw.csv        sensor samples as recorded, one column per sensor
//! │   └── console.log    controller console output
//! ├── events.csv         extracted events (written by `process_events`)
//! └── data.csv           selected, renamed sensor columns (written by `process_data`)
//! ```

pub mod store;

pub use store::{
    read_events, read_log_lines, read_raw_samples, read_series, select_sensors, write_events,
    write_series, SessionError,
};

use crate::core::{DriverMap, Event, TimeSeries};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Paths and operations for one session directory.
#[derive(Debug, Clone)]
pub struct SessionDir {
    root: PathBuf,
}

impl SessionDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_data_path(&self) -> PathBuf {
        self.root.join("data-raw").join("raw.csv")
    }

    pub fn console_log_path(&self) -> PathBuf {
        self.root.join("data-raw").join("console.log")
    }

    pub fn events_path(&self) -> PathBuf {
        self.root.join("events.csv")
    }

    pub fn data_path(&self) -> PathBuf {
        self.root.join("data.csv")
    }

    /// Extract events from the console log and write `events.csv`.
    pub fn process_events(&self, drivers: &DriverMap) -> Result<Vec<Event>, SessionError> {
        let events = store::events_from_log(&self.console_log_path(), drivers)?;
        write_events(&self.events_path(), &events)?;
        tracing::info!(
            "Wrote {} events to {}",
            events.len(),
            self.events_path().display()
        );
        Ok(events)
    }

    /// Select the configured sensors from `raw.csv` and write `data.csv`.
    pub fn process_data(
        &self,
        sensors: &BTreeMap<String, String>,
    ) -> Result<TimeSeries, SessionError> {
        let (labels, rows) = read_raw_samples(&self.raw_data_path())?;
        let series = select_sensors(&labels, &rows, sensors)?;
        if series.width() < 2 {
            tracing::warn!(
                "No configured sensors found among {} raw columns",
                labels.len()
            );
        }
        write_series(&self.data_path(), &series)?;
        tracing::info!(
            "Wrote {} samples x {} columns to {}",
            series.len(),
            series.width(),
            self.data_path().display()
        );
        Ok(series)
    }

    /// Load previously extracted events.
    pub fn import_events(&self) -> Result<Vec<Event>, SessionError> {
        read_events(&self.events_path())
    }

    /// Load processed data, dropping samples recorded after the last event.
    pub fn import_data(&self, events: &[Event]) -> Result<TimeSeries, SessionError> {
        let series = read_series(&self.data_path())?;
        let Some(last) = events.last() else {
            return Ok(series);
        };

        let truncated = series.truncated_after(last.secs as f64);
        tracing::debug!(
            "Kept {} of {} samples up to t={}s",
            truncated.len(),
            series.len(),
            last.secs
        );
        Ok(truncated)
    }
}

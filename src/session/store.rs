//! Reading and writing session files.

use crate::core::{
    extract, record_header, AlignError, DriverMap, Event, ExtractError, RecordError, TimeSeries,
};
use csv::{ReaderBuilder, Trim};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Delimiter used in the text files written by this crate.
const OUTPUT_DELIMITER: &str = ", ";

/// Errors from session file handling.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("{}: invalid number '{value}' on row {row}", .path.display())]
    InvalidNumber {
        path: PathBuf,
        row: usize,
        value: String,
    },
    #[error("{}: no header row", .path.display())]
    MissingHeader { path: PathBuf },
    #[error("{}:{line}: {source}", .path.display())]
    Record {
        path: PathBuf,
        line: usize,
        #[source]
        source: RecordError,
    },
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Series(#[from] AlignError),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SessionError + '_ {
    move |source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Lines of a console log, up to the first blank line.
pub fn read_log_lines(path: &Path) -> Result<Vec<String>, SessionError> {
    let content = fs::read_to_string(path).map_err(io_error(path))?;
    Ok(content
        .lines()
        .take_while(|line| !line.trim_end_matches('\r').is_empty())
        .map(str::to_string)
        .collect())
}

/// Render events as the contents of an events file.
pub fn render_events(events: &[Event]) -> String {
    let mut text = record_header();
    text.push('\n');
    for event in events {
        text.push_str(&event.to_record());
        text.push('\n');
    }
    text
}

/// Write events (header plus one record per line).
pub fn write_events(path: &Path, events: &[Event]) -> Result<(), SessionError> {
    fs::write(path, render_events(events)).map_err(io_error(path))
}

/// Read an events file written by [`write_events`].
pub fn read_events(path: &Path) -> Result<Vec<Event>, SessionError> {
    let content = fs::read_to_string(path).map_err(io_error(path))?;

    content
        .lines()
        .enumerate()
        .skip(1)
        .take_while(|(_, line)| !line.trim_end_matches('\r').is_empty())
        .map(|(index, line)| {
            Event::from_record(line).map_err(|source| SessionError::Record {
                path: path.to_path_buf(),
                line: index + 1,
                source,
            })
        })
        .collect()
}

/// Extract events from a console log with the given drivers.
pub fn events_from_log(path: &Path, drivers: &DriverMap) -> Result<Vec<Event>, SessionError> {
    let lines = read_log_lines(path)?;
    let events = extract(&lines, drivers)?;
    tracing::debug!(
        "Extracted {} events from {} log lines in {}",
        events.len(),
        lines.len(),
        path.display()
    );
    Ok(events)
}

fn parse_row(path: &Path, row: usize, record: &csv::StringRecord) -> Result<Vec<f64>, SessionError> {
    record
        .iter()
        .map(|field| {
            field.parse::<f64>().map_err(|_| SessionError::InvalidNumber {
                path: path.to_path_buf(),
                row,
                value: field.to_string(),
            })
        })
        .collect()
}

/// Read a raw sample CSV: a header of column labels followed by numeric
/// rows. Reading stops at the first row with fewer fields than the header;
/// a blank line counts as such a row.
pub fn read_raw_samples(path: &Path) -> Result<(Vec<String>, Vec<Vec<f64>>), SessionError> {
    let content = fs::read_to_string(path).map_err(io_error(path))?;
    let end = content
        .split_inclusive('\n')
        .take_while(|line| !line.trim_end_matches(|c: char| c == '\r' || c == '\n').is_empty())
        .map(str::len)
        .sum::<usize>();

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content[..end].as_bytes());

    let labels: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if labels.is_empty() {
        return Err(SessionError::MissingHeader {
            path: path.to_path_buf(),
        });
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() < labels.len() {
            break;
        }
        let mut row = parse_row(path, index + 1, &record)?;
        row.truncate(labels.len());
        rows.push(row);
    }

    Ok((labels, rows))
}

/// Keep the timestamp column plus every column configured in `sensors`,
/// renamed to its display name, in raw column order.
pub fn select_sensors(
    labels: &[String],
    rows: &[Vec<f64>],
    sensors: &BTreeMap<String, String>,
) -> Result<TimeSeries, AlignError> {
    let Some(time_label) = labels.first() else {
        return Ok(TimeSeries::default());
    };

    let mut columns = vec![0];
    let mut selected = vec![time_label.clone()];
    for (index, label) in labels.iter().enumerate().skip(1) {
        if let Some(name) = sensors.get(label) {
            columns.push(index);
            selected.push(name.clone());
        }
    }

    let mut selected_rows = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        if row.len() != labels.len() {
            return Err(AlignError::RaggedRow {
                row: index,
                expected: labels.len(),
                found: row.len(),
            });
        }
        selected_rows.push(columns.iter().map(|&c| row[c]).collect());
    }
    TimeSeries::new(selected, selected_rows)
}

/// Render a series as the contents of a data file.
pub fn render_series(series: &TimeSeries) -> String {
    let mut text = series.labels().join(OUTPUT_DELIMITER);
    text.push('\n');
    for row in series.rows() {
        let fields: Vec<String> = row.iter().map(|v| format!("{v:.6}")).collect();
        text.push_str(&fields.join(OUTPUT_DELIMITER));
        text.push('\n');
    }
    text
}

pub fn write_series(path: &Path, series: &TimeSeries) -> Result<(), SessionError> {
    fs::write(path, render_series(series)).map_err(io_error(path))
}

/// Read a data file written by [`write_series`].
pub fn read_series(path: &Path) -> Result<TimeSeries, SessionError> {
    let (labels, rows) = read_raw_samples(path)?;
    Ok(TimeSeries::new(labels, rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{format_duration, EventKind};

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("slonk-telemetry-store-{name}"));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_events_file_round_trip() {
        let path = scratch("events").join("events.csv");
        let events = vec![
            Event {
                secs: -3,
                delta: None,
                elapsed: format_duration(-3),
                kind: EventKind::Start,
                info: String::new(),
            },
            Event {
                secs: 12,
                delta: Some(format_duration(15)),
                elapsed: format_duration(12),
                kind: EventKind::Actuation("Open".into()),
                info: "Main Valve".into(),
            },
        ];

        write_events(&path, &events).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "secs, delta, elapsed, type, info\n-3, None, -0:03, Start, \n12, 0:15, 0:12, Open, Main Valve\n"
        );
        assert_eq!(read_events(&path).unwrap(), events);
    }

    #[test]
    fn test_bad_record_reports_line() {
        let path = scratch("bad-events").join("events.csv");
        fs::write(&path, "secs, delta, elapsed, type, info\n1, None, 0:01, Start, \noops\n").unwrap();

        match read_events(&path) {
            Err(SessionError::Record { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_log_stops_at_blank_line() {
        let path = scratch("log").join("console.log");
        fs::write(&path, "a [INFO]: one\nb [INFO]: two\n\nc [INFO]: three\n").unwrap();

        let lines = read_log_lines(&path).unwrap();
        assert_eq!(lines, vec!["a [INFO]: one", "b [INFO]: two"]);
    }

    #[test]
    fn test_raw_samples_stop_at_short_row() {
        let path = scratch("raw").join("raw.csv");
        fs::write(&path, "time,pt_1,tc_1\n0.0,1.5,20\n0.1,1.6,21\n0.2,1.7\n0.3,1.8,22\n").unwrap();

        let (labels, rows) = read_raw_samples(&path).unwrap();
        assert_eq!(labels, vec!["time", "pt_1", "tc_1"]);
        assert_eq!(rows, vec![vec![0.0, 1.5, 20.0], vec![0.1, 1.6, 21.0]]);
    }

    #[test]
    fn test_raw_samples_stop_at_blank_line() {
        let path = scratch("raw-blank").join("raw.csv");
        fs::write(&path, "time,pt_1\n0.0,1.0\n0.1,1.1\n\n9.0,99.0\n").unwrap();

        let (_, rows) = read_raw_samples(&path).unwrap();
        assert_eq!(rows, vec![vec![0.0, 1.0], vec![0.1, 1.1]]);

        let crlf = scratch("raw-blank-crlf").join("raw.csv");
        fs::write(&crlf, "time,pt_1\r\n0.0,1.0\r\n\r\n9.0,99.0\r\n").unwrap();
        let (_, rows) = read_raw_samples(&crlf).unwrap();
        assert_eq!(rows, vec![vec![0.0, 1.0]]);
    }

    #[test]
    fn test_raw_samples_reject_text() {
        let path = scratch("raw-text").join("raw.csv");
        fs::write(&path, "time,pt_1\n0.0,abc\n").unwrap();

        assert!(matches!(
            read_raw_samples(&path),
            Err(SessionError::InvalidNumber { row: 1, .. })
        ));
    }

    #[test]
    fn test_select_sensors_renames_in_column_order() {
        let labels: Vec<String> = ["time", "tc_1", "pt_1", "lc_1"].map(String::from).to_vec();
        let rows = vec![vec![0.0, 20.0, 1.5, 100.0], vec![1.0, 21.0, 1.6, 110.0]];
        let sensors: BTreeMap<String, String> = [
            ("pt_1".to_string(), "Chamber".to_string()),
            ("lc_1".to_string(), "Thrust".to_string()),
        ]
        .into_iter()
        .collect();

        let series = select_sensors(&labels, &rows, &sensors).unwrap();
        assert_eq!(series.labels(), &["time", "Chamber", "Thrust"]);
        assert_eq!(series.rows()[1], vec![1.0, 1.6, 110.0]);
    }

    #[test]
    fn test_select_sensors_rejects_short_row() {
        let labels: Vec<String> = ["time", "pt_1"].map(String::from).to_vec();
        let rows = vec![vec![0.0, 1.5], vec![1.0]];
        let sensors: BTreeMap<String, String> =
            [("pt_1".to_string(), "Chamber".to_string())].into_iter().collect();

        assert_eq!(
            select_sensors(&labels, &rows, &sensors),
            Err(AlignError::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_series_file_round_trip() {
        let path = scratch("series").join("data.csv");
        let series = TimeSeries::new(
            vec!["time".into(), "Chamber".into()],
            vec![vec![0.0, 1.25], vec![0.5, -3.5]],
        )
        .unwrap();

        write_series(&path, &series).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("time, Chamber\n0.000000, 1.250000\n"));
        assert_eq!(read_series(&path).unwrap(), series);
    }
}

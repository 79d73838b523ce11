//! Integration tests for the session analysis pipeline

use slonk_telemetry::core::{
    extract, nearest_sample, windowed_slice, DriverMap, DriverSpec, EventKind, FilterSpec,
    LowPassFilter, TimeSeries, WindowFunction,
};
use slonk_telemetry::session::{SessionDir, SessionError};
use slonk_telemetry::ExtractError;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

fn test_session_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("slonk-telemetry-pipeline-{name}"));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(dir.join("data-raw")).expect("Failed to create session dir");
    dir
}

fn drivers() -> DriverMap {
    serde_json::from_str(
        r#"{
            "2": {"name": "ArmA", "1": "Extend", "0": "Retract"},
            "5": {"name": "Main Valve", "1": "Open", "0": "Close"}
        }"#,
    )
    .expect("Failed to parse drivers")
}

const CONSOLE_LOG: &str = "\
2024-03-02T14:00:00.000000 [INFO]: Initializing slonkboard
2024-03-02T14:00:01.500000 [DEBUG]: Opening serial port
2024-03-02T14:00:05.000000 [INFO]: Connection established to controller
2024-03-02T14:00:06.000000 [INFO]: Heartbeat ok
2024-03-02T14:00:10.000000 [INFO]: Sent command {\"type\":\"Actuate\",\"driver_id\":2,\"value\":1}
2024-03-02T14:00:15.000000 [INFO]: Sent command {\"type\":\"Ignition\"}
2024-03-02T14:00:17.400000 [INFO]: Sent command {\"type\":\"Actuate\",\"driver_id\":5,\"value\":0}
2024-03-02T14:01:20.000000 [INFO]: Connection to controller closed
";

/// 10 Hz samples from t=-5 to t=75 with a constant channel and a ramp.
fn raw_csv() -> String {
    let mut text = String::from("time,pt_chamber,tc_nozzle,lc_thrust\n");
    for i in -50..=750 {
        let t = f64::from(i) / 10.0;
        text.push_str(&format!("{t},{},{},{}\n", 250.0, 20.0 + t, 2.0 * t));
    }
    text
}

fn write_session(name: &str) -> SessionDir {
    let dir = test_session_dir(name);
    fs::write(dir.join("data-raw").join("console.log"), CONSOLE_LOG).unwrap();
    fs::write(dir.join("data-raw").join("raw.csv"), raw_csv()).unwrap();
    SessionDir::new(dir)
}

#[test]
fn test_events_are_extracted_and_persisted() {
    let session = write_session("events");

    let events = session.process_events(&drivers()).expect("Failed to process events");
    let kinds: Vec<&str> = events.iter().map(|e| e.kind.label()).collect();
    assert_eq!(
        kinds,
        vec!["Start", "Connect", "Extend", "Ignition", "Close", "Disconnect"]
    );

    let secs: Vec<i64> = events.iter().map(|e| e.secs).collect();
    assert_eq!(secs, vec![-5, 0, 5, 10, 12, 75]);
    assert_eq!(events[4].info, "Main Valve");
    assert_eq!(events[5].elapsed, "1:15");
    assert_eq!(events[5].delta.as_deref(), Some("1:03"));

    let text = fs::read_to_string(session.events_path()).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("secs, delta, elapsed, type, info"));
    assert_eq!(lines.next(), Some("-5, None, -0:05, Start, "));
    assert_eq!(lines.next(), Some("0, 0:05, 0:00, Connect, "));

    let reloaded = session.import_events().expect("Failed to import events");
    assert_eq!(reloaded, events);
}

#[test]
fn test_window_after_ignition_is_smoothed() {
    let session = write_session("window");
    let sensors: BTreeMap<String, String> = [
        ("pt_chamber".to_string(), "Chamber Pressure".to_string()),
        ("lc_thrust".to_string(), "Thrust".to_string()),
    ]
    .into_iter()
    .collect();

    let events = session.process_events(&drivers()).unwrap();
    let processed = session.process_data(&sensors).unwrap();
    assert_eq!(
        processed.labels(),
        &["time", "Chamber Pressure", "Thrust"]
    );

    // Samples after the disconnect at t=75 are dropped.
    let series = session.import_data(&events).unwrap();
    assert_eq!(series.len(), 801);
    assert_eq!(nearest_sample(&series, 75.0).unwrap(), 800);

    let ignition = events
        .iter()
        .find(|e| e.kind == EventKind::Ignition)
        .unwrap();
    let channel = series.channel_index("Chamber Pressure").unwrap();
    let window = windowed_slice(&series, ignition, 8.0, channel).unwrap();

    assert_eq!(window.len(), 80);
    assert!(window.relative_times[0].abs() < 1e-9);
    assert!((window.relative_times[79] - 7.9).abs() < 1e-9);

    let lpf = LowPassFilter::new(FilterSpec {
        sample_rate_hz: 10.0,
        tap_length: 9,
        cutoff_hz: 1.0,
        window: WindowFunction::Hamming,
    })
    .unwrap();
    let smoothed = lpf.apply_window(&window);
    assert_eq!(smoothed.len(), window.len());

    let interior = lpf.trim_boundary(&smoothed);
    assert_eq!(interior.len(), 80 - 2 * 9);
    for value in &interior.values {
        assert!((value - 250.0).abs() < 1e-6);
    }
}

#[test]
fn test_ramp_window_values_are_recorded_samples() {
    let series = TimeSeries::new(
        vec!["time".into(), "ramp".into()],
        (0..20).map(|i| vec![f64::from(i) * 0.5, f64::from(i)]).collect(),
    )
    .unwrap();
    let events = extract(
        &[
            "2024-03-02T14:00:00 [INFO]: Connection established to controller",
            "2024-03-02T14:00:02 [INFO]: Sent command {\"type\":\"Ignition\"}",
        ],
        &DriverMap::new(),
    )
    .unwrap();

    let window = windowed_slice(&series, &events[1], 1.4, 1).unwrap();
    // Start at t=2.0 (index 4); t=3.4 is nearest to 3.5 (index 7).
    assert_eq!(window.values, vec![4.0, 5.0, 6.0]);
    assert_eq!(window.relative_times, vec![0.0, 0.5, 1.0]);
}

#[test]
fn test_unknown_driver_aborts_processing() {
    let session = write_session("unknown-driver");
    let mut drivers = DriverMap::new();
    drivers.insert(2, DriverSpec::new("ArmA").with_state("1", "Extend"));

    let result = session.process_events(&drivers);
    assert!(matches!(
        result,
        Err(SessionError::Extract(ExtractError::UnrecognizedDriverOrState { driver_id: 5, .. }))
    ));
    assert!(!session.events_path().exists());
}

#[test]
fn test_missing_anchor_aborts_processing() {
    let dir = test_session_dir("no-anchor");
    fs::write(
        dir.join("data-raw").join("console.log"),
        "2024-03-02T14:00:00 [INFO]: Initializing slonkboard\n",
    )
    .unwrap();

    let result = SessionDir::new(&dir).process_events(&drivers());
    assert!(matches!(
        result,
        Err(SessionError::Extract(ExtractError::MissingAnchor))
    ));
}

#[test]
fn test_missing_files_are_reported() {
    let session = SessionDir::new(test_session_dir("missing"));
    assert!(matches!(
        session.process_events(&drivers()),
        Err(SessionError::Io { .. })
    ));
    assert!(session.import_events().is_err());
}

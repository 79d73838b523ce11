//! Demonstration of the slonk-telemetry analysis pipeline.
//!
//! This example shows how to:
//! 1. Describe the drivers of a test stand
//! 2. Extract events from a controller console log
//! 3. Align a sensor series against those events
//! 4. Smooth a window with a FIR lowpass filter
//!
//! Run with: cargo run --example analyze_session

use slonk_telemetry::core::{
    extract, windowed_slice, DriverMap, DriverSpec, EventKind, FilterSpec, LowPassFilter,
    TimeSeries, WindowFunction,
};

const SAMPLE_RATE_HZ: f64 = 50.0;

fn main() {
    println!("slonk-telemetry - Analysis Demo");
    println!("===============================");
    println!();

    let mut drivers = DriverMap::new();
    drivers.insert(
        3,
        DriverSpec::new("Fuel Valve")
            .with_state("1", "Open")
            .with_state("0", "Close"),
    );

    let log = [
        "2024-03-02T14:00:00.000 [INFO]: Initializing slonkboard",
        "2024-03-02T14:00:04.000 [INFO]: Connection established to controller",
        r#"2024-03-02T14:00:09.000 [INFO]: Sent command {"type":"Actuate","driver_id":3,"value":1}"#,
        r#"2024-03-02T14:00:10.000 [INFO]: Sent command {"type":"Ignition"}"#,
        r#"2024-03-02T14:00:16.000 [INFO]: Sent command {"type":"Actuate","driver_id":3,"value":0}"#,
        "2024-03-02T14:00:30.000 [INFO]: Connection to controller closed",
    ];

    let events = match extract(&log, &drivers) {
        Ok(events) => events,
        Err(e) => {
            eprintln!("Extraction failed: {e}");
            return;
        }
    };

    println!("Events:");
    for event in &events {
        println!("  {}", event.to_record());
    }
    println!();

    // Synthetic chamber pressure: a 300 psi plateau from t=6s to t=12s,
    // with 20 Hz ripple on top.
    let rows: Vec<Vec<f64>> = (0..(30.0 * SAMPLE_RATE_HZ) as usize)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE_HZ;
            let plateau = if (6.0..12.0).contains(&t) { 300.0 } else { 0.0 };
            let ripple = 15.0 * (2.0 * std::f64::consts::PI * 20.0 * t).sin();
            vec![t, plateau + ripple]
        })
        .collect();
    let series = match TimeSeries::new(vec!["time".into(), "Chamber Pressure".into()], rows) {
        Ok(series) => series,
        Err(e) => {
            eprintln!("Invalid series: {e}");
            return;
        }
    };

    let Some(ignition) = events.iter().find(|e| e.kind == EventKind::Ignition) else {
        eprintln!("No ignition event in log");
        return;
    };

    let window = match windowed_slice(&series, ignition, 6.0, 1) {
        Ok(window) => window,
        Err(e) => {
            eprintln!("Windowing failed: {e}");
            return;
        }
    };

    let lpf = match LowPassFilter::new(FilterSpec {
        sample_rate_hz: SAMPLE_RATE_HZ,
        tap_length: 25,
        cutoff_hz: 4.0,
        window: WindowFunction::Hamming,
    }) {
        Ok(lpf) => lpf,
        Err(e) => {
            eprintln!("Filter design failed: {e}");
            return;
        }
    };
    let smoothed = lpf.trim_boundary(&lpf.apply_window(&window));

    for (name, w) in [("Raw", &window), ("Smoothed", &smoothed)] {
        if let Some(summary) = w.summary() {
            println!(
                "{name:>8}: {} samples, min {:.1}, max {:.1}, std {:.2}",
                summary.samples, summary.min, summary.max, summary.std_dev
            );
        }
    }
}

//! Decode-to-history integration tests
//!
//! Feed raw bodies through the decoder into a bounded history the way the
//! live feed does, and check what a snapshot exposes.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::json;

use roadvision_core::{
    buffer::CircularBuffer, decode_reading, AqiCategory, DecodeError, MeasurementKind,
    SensorReading, Snapshot, Status,
};

fn body(road_state: &str, temperature: f64) -> Vec<u8> {
    json!({
        "road_state": road_state,
        "agent_data": {
            "user_id": 3,
            "accelerometer": {"x": 0.0, "y": 0.0, "z": 16384.0},
            "gps": {"latitude": 50.45, "longitude": 30.52},
            "temperature": {"value": temperature, "unit": "C"},
            "humidity": {"value": 61.0},
            "vibration": {"x": 0.6, "y": 0.8, "z": 0.0, "magnitude": 99.0},
            "light": {"illumination": 4.0},
            "air_quality": {"pm2_5": 12.0, "pm10": 30.0, "aqi": 120},
            "timestamp": "2024-05-01T12:00:00.250Z"
        },
        "temp_status": "poor",
        "air_quality_status": "moderate"
    })
    .to_string()
    .into_bytes()
}

/// Decode each body, keeping what decodes, like the feed's ingest step
fn ingest(history: &mut CircularBuffer<Arc<SensorReading>>, bodies: &[Vec<u8>]) -> usize {
    let mut dropped = 0;
    for raw in bodies {
        match decode_reading(raw) {
            Ok(reading) => {
                history.push(Arc::new(reading));
            }
            Err(_) => dropped += 1,
        }
    }
    dropped
}

#[test]
fn road_conditions_scenario() {
    let mut history = CircularBuffer::new(3).unwrap();
    let bodies: Vec<_> = ["dry", "wet", "icy", "dry"]
        .iter()
        .enumerate()
        .map(|(i, state)| body(state, i as f64))
        .collect();

    assert_eq!(ingest(&mut history, &bodies), 0);
    let snapshot = Snapshot::from_history(&history);

    let seen: Vec<_> = snapshot
        .iter()
        .map(|r| (r.road_state().to_string(), r.temperature().value))
        .collect();
    assert_eq!(
        seen,
        vec![("dry".into(), 3.0), ("icy".into(), 2.0), ("wet".into(), 1.0)]
    );
}

#[test]
fn malformed_bodies_leave_history_alone() {
    let mut history = CircularBuffer::new(5).unwrap();
    ingest(&mut history, &[body("normal", 1.0)]);
    let before = Snapshot::from_history(&history);

    let dropped = ingest(
        &mut history,
        &[
            b"not json".to_vec(),
            vec![0xc3, 0x28],
            b"{\"road_state\": \"normal\"}".to_vec(),
        ],
    );

    let after = Snapshot::from_history(&history);
    assert_eq!(dropped, 3);
    assert_eq!(after.len(), before.len());
    assert_eq!(after.latest(), before.latest());
}

#[test]
fn snapshot_outlives_further_updates() {
    let mut history = CircularBuffer::new(2).unwrap();
    ingest(&mut history, &[body("normal", 1.0)]);
    let held = Snapshot::from_history(&history);

    ingest(&mut history, &[body("bump", 2.0), body("hole", 3.0)]);

    assert_eq!(held.len(), 1);
    assert_eq!(held.latest().unwrap().road_state().as_str(), "normal");
    assert_eq!(Snapshot::from_history(&history).len(), 2);
}

#[test]
fn decoded_reading_exposes_measurements() {
    let reading = decode_reading(&body("normal", -2.5)).unwrap();

    assert_eq!(reading.user_id(), 3);
    assert_eq!(reading.timestamp().timestamp_millis(), 1_714_564_800_250);
    assert_eq!(reading.temperature().status, Status::Poor);
    assert_eq!(reading.humidity().status, Status::Unknown);
    assert!((reading.vibration().magnitude - 1.0).abs() < 1e-9);
    assert!(reading.light().is_dark_default());
    assert_eq!(reading.air_quality().category(), Some(AqiCategory::UnhealthyForSensitiveGroups));

    let temperature = reading.measurement(MeasurementKind::Temperature);
    assert_eq!(temperature.value, Some(-2.5));
    assert_eq!(reading.measurements().len(), 5);
}

#[test]
fn invalid_values_report_the_field() {
    let mut value: serde_json::Value = serde_json::from_slice(&body("normal", 1.0)).unwrap();
    value["agent_data"]["gps"]["longitude"] = json!(181.0);

    match decode_reading(value.to_string().as_bytes()) {
        Err(DecodeError::Invalid(err)) => assert!(err.to_string().contains("longitude")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

proptest! {
    #[test]
    fn decoder_never_panics(raw in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = decode_reading(&raw);
    }

    #[test]
    fn history_keeps_last_capacity_readings(capacity in 1usize..8, count in 0usize..24) {
        let mut history = CircularBuffer::new(capacity).unwrap();
        let bodies: Vec<_> = (0..count).map(|n| body("normal", n as f64)).collect();
        ingest(&mut history, &bodies);

        let snapshot = Snapshot::from_history(&history);
        let temps: Vec<f64> = snapshot.iter().map(|r| r.temperature().value).collect();
        let expected: Vec<f64> = (0..count).rev().take(capacity).map(|n| n as f64).collect();
        prop_assert_eq!(temps, expected);
    }
}

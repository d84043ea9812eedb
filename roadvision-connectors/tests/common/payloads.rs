//! Processed agent data bodies as the hub publishes them

use serde_json::{json, Value};

/// A valid body with the given road state and temperature
pub fn reading(road_state: &str, temperature: f64) -> Value {
    json!({
        "road_state": road_state,
        "agent_data": {
            "user_id": 7,
            "accelerometer": {"x": 12.0, "y": -4.0, "z": 16384.0},
            "gps": {"latitude": 50.4501, "longitude": 30.5234},
            "temperature": {"value": temperature, "unit": "C"},
            "humidity": {"value": 55.0, "unit": "%"},
            "vibration": {"x": 0.3, "y": 0.4, "z": 0.0},
            "light": {"illumination": 420.0},
            "air_quality": {"pm2_5": 8.0, "pm10": 15.0, "aqi": 33},
            "timestamp": "2024-05-01T12:00:00Z"
        },
        "temp_status": "good",
        "humidity_status": "moderate",
        "vibration_status": "good",
        "light_status": "good",
        "air_quality_status": "good"
    })
}

pub fn body(road_state: &str, temperature: f64) -> Vec<u8> {
    reading(road_state, temperature).to_string().into_bytes()
}

/// Valid body tagged by temperature, for ordering checks
pub fn numbered(n: u32) -> Vec<u8> {
    body("normal", f64::from(n))
}

pub fn not_json() -> Vec<u8> {
    b"{ this is not json".to_vec()
}

/// Parses but fails validation
pub fn out_of_range() -> Vec<u8> {
    let mut value = reading("normal", 20.0);
    value["agent_data"]["humidity"]["value"] = json!(140.0);
    value.to_string().into_bytes()
}

/// Missing the required `agent_data` object
pub fn missing_fields() -> Vec<u8> {
    json!({"road_state": "normal"}).to_string().into_bytes()
}

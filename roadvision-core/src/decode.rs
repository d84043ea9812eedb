//! Wire Decoding for Processed Agent Data
//!
//! ## Canonical Schema
//!
//! Messages on the processed-data topic are UTF-8 JSON objects in the shape
//! the edge and hub services produce: measurements nested under `agent_data`,
//! statuses reported as `*_status` siblings of `road_state`.
//!
//! ```json
//! {
//!   "road_state": "normal",
//!   "agent_data": {
//!     "user_id": 1,
//!     "accelerometer": {"x": 0.0, "y": 0.0, "z": 16384.0},
//!     "gps": {"latitude": 50.45, "longitude": 30.52},
//!     "temperature": {"value": 21.5, "unit": "C"},
//!     "humidity": {"value": 40.0, "unit": "%"},
//!     "vibration": {"x": 0.1, "y": 0.2, "z": 0.3},
//!     "light": {"illumination": 300.0},
//!     "air_quality": {"pm2_5": 10.0, "pm10": 20.0, "aqi": 42},
//!     "timestamp": "2024-05-01T12:00:00Z"
//!   },
//!   "temp_status": "good",
//!   "humidity_status": null
//! }
//! ```
//!
//! Optional on the wire: every `*_status` (absent or `null` means unknown),
//! `air_quality.aqi`, `humidity.unit` and `vibration.magnitude`. The magnitude
//! is always recomputed from the axes so it can never disagree with them.
//!
//! The older flat layout with a `status` inside each measurement does not
//! match this schema and is rejected like any other malformed body.
//!
//! ## Validation
//!
//! After parsing, values are range checked the same way the agent checks
//! them before publishing: finite numbers only, humidity within 0-100 %,
//! coordinates on the globe, non-negative particulates, a non-empty road
//! state.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::{
    constants::sensors::{
        HUMIDITY_MAX_PCT, HUMIDITY_MIN_PCT, LATITUDE_MAX_DEG, LATITUDE_MIN_DEG,
        LONGITUDE_MAX_DEG, LONGITUDE_MIN_DEG, PARTICULATE_MIN_UG_M3,
    },
    errors::{DecodeError, ValidationError},
    reading::{
        AirQuality, Axes, GpsPosition, Humidity, Light, RoadState, SensorReading, Status,
        Temperature, TemperatureUnit, Vibration,
    },
    validators::{check_finite, check_min, check_range},
};

#[derive(Debug, Deserialize)]
struct ProcessedPayload {
    agent_data: AgentPayload,
    road_state: String,
    #[serde(default)]
    temp_status: Status,
    #[serde(default)]
    humidity_status: Status,
    #[serde(default)]
    vibration_status: Status,
    #[serde(default)]
    light_status: Status,
    #[serde(default)]
    air_quality_status: Status,
}

#[derive(Debug, Deserialize)]
struct AgentPayload {
    user_id: u32,
    accelerometer: Axes,
    gps: GpsPosition,
    temperature: TemperaturePayload,
    humidity: HumidityPayload,
    vibration: Axes,
    light: LightPayload,
    air_quality: AirQualityPayload,
    #[serde(deserialize_with = "deserialize_timestamp")]
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TemperaturePayload {
    value: f64,
    unit: TemperatureUnit,
}

#[derive(Debug, Deserialize)]
struct HumidityPayload {
    value: f64,
}

#[derive(Debug, Deserialize)]
struct LightPayload {
    illumination: f64,
}

#[derive(Debug, Deserialize)]
struct AirQualityPayload {
    pm2_5: f64,
    pm10: f64,
    #[serde(default)]
    aqi: Option<u16>,
}

/// Decode one message body into a validated reading
pub fn decode_reading(body: &[u8]) -> Result<SensorReading, DecodeError> {
    let text = std::str::from_utf8(body).map_err(|_| DecodeError::Utf8)?;
    decode_str(text)
}

/// Decode a JSON document into a validated reading
pub fn decode_str(text: &str) -> Result<SensorReading, DecodeError> {
    let payload: ProcessedPayload = serde_json::from_str(text)?;
    let reading = payload.into_reading();
    validate(&reading)?;
    Ok(reading)
}

impl ProcessedPayload {
    fn into_reading(self) -> SensorReading {
        let agent = self.agent_data;
        SensorReading {
            road_state: RoadState::new(self.road_state.trim()),
            timestamp: agent.timestamp,
            user_id: agent.user_id,
            temperature: Temperature {
                value: agent.temperature.value,
                unit: agent.temperature.unit,
                status: self.temp_status,
            },
            humidity: Humidity {
                value: agent.humidity.value,
                status: self.humidity_status,
            },
            vibration: Vibration::new(agent.vibration, self.vibration_status),
            light: Light {
                illumination: agent.light.illumination,
                status: self.light_status,
            },
            air_quality: AirQuality {
                pm2_5: agent.air_quality.pm2_5,
                pm10: agent.air_quality.pm10,
                aqi: agent.air_quality.aqi,
                status: self.air_quality_status,
            },
            gps: agent.gps,
            accelerometer: agent.accelerometer,
        }
    }
}

fn validate(reading: &SensorReading) -> Result<(), ValidationError> {
    if reading.road_state.as_str().is_empty() {
        return Err(ValidationError::Empty { field: "road_state" });
    }

    check_finite("temperature.value", reading.temperature.value)?;
    check_range(
        "humidity.value",
        reading.humidity.value,
        HUMIDITY_MIN_PCT,
        HUMIDITY_MAX_PCT,
    )?;

    let axes = reading.vibration.axes;
    check_finite("vibration.x", axes.x)?;
    check_finite("vibration.y", axes.y)?;
    check_finite("vibration.z", axes.z)?;
    check_finite("vibration.magnitude", reading.vibration.magnitude)?;

    let accel = reading.accelerometer;
    check_finite("accelerometer.x", accel.x)?;
    check_finite("accelerometer.y", accel.y)?;
    check_finite("accelerometer.z", accel.z)?;

    check_min("light.illumination", reading.light.illumination, 0.0)?;
    check_min("air_quality.pm2_5", reading.air_quality.pm2_5, PARTICULATE_MIN_UG_M3)?;
    check_min("air_quality.pm10", reading.air_quality.pm10, PARTICULATE_MIN_UG_M3)?;

    check_range("gps.latitude", reading.gps.latitude, LATITUDE_MIN_DEG, LATITUDE_MAX_DEG)?;
    check_range("gps.longitude", reading.gps.longitude, LONGITUDE_MIN_DEG, LONGITUDE_MAX_DEG)?;

    Ok(())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!(
            "invalid timestamp '{raw}', expected ISO 8601 (YYYY-MM-DDTHH:MM:SSZ)"
        ))
    })
}

/// Parse an ISO 8601 timestamp
///
/// Accepts RFC 3339 with an offset, or a naive date-time (`T` or space
/// separated, optional fraction) which is taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

//! Decoded Road Telemetry Readings
//!
//! A `SensorReading` is one message from the processed-data topic: the road
//! state the edge service classified, when the agent sampled it, and the
//! measurements it carried. Readings are built once by [`crate::decode`] and
//! never change afterwards; the feed shares them behind `Arc`.
//!
//! ```text
//! SensorReading
//! ├── road_state        "normal" | "bump" | "hole" | any upstream label
//! ├── timestamp         UTC
//! ├── user_id           reporting agent
//! ├── temperature       value + C/F unit + status
//! ├── humidity          %RH + status
//! ├── vibration         x/y/z + derived magnitude + status
//! ├── light             lux + status
//! ├── air_quality       PM2.5, PM10, optional AQI + status
//! ├── gps               latitude/longitude
//! └── accelerometer     raw x/y/z
//! ```

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::sensors::{
    ACCEL_LSB_PER_G, AQI_BAND_UPPER_BOUNDS, BUMP_THRESHOLD_G, DARK_THRESHOLD_LUX,
    HOLE_THRESHOLD_G,
};

/// Status classification attached to a measurement upstream
///
/// Absent statuses become `Unknown` so views always have a label to show.
/// Labels outside the good/moderate/poor vocabulary (for example the EPA AQI
/// categories) are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Status {
    Good,
    Moderate,
    Poor,
    #[default]
    Unknown,
    Other(String),
}

impl Status {
    /// Label used by views
    pub fn as_str(&self) -> &str {
        match self {
            Status::Good => "good",
            Status::Moderate => "moderate",
            Status::Poor => "poor",
            Status::Unknown => "unknown",
            Status::Other(label) => label,
        }
    }
}

impl From<&str> for Status {
    fn from(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "good" => Status::Good,
            "moderate" => Status::Moderate,
            "poor" => Status::Poor,
            "" | "unknown" => Status::Unknown,
            _ => Status::Other(trimmed.to_string()),
        }
    }
}

impl From<Option<String>> for Status {
    fn from(label: Option<String>) -> Self {
        label.as_deref().map(Status::from).unwrap_or_default()
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Road surface classification
///
/// The edge service emits `normal`, `bump` or `hole`; other deployments use
/// weather-style labels (`dry`, `wet`, `icy`). The label is kept as sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoadState(String);

impl RoadState {
    pub const NORMAL: &'static str = "normal";
    pub const BUMP: &'static str = "bump";
    pub const HOLE: &'static str = "hole";

    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classify the road from a raw vertical accelerometer sample
    ///
    /// Same thresholds as the edge service: below 1.5 g is normal, below 3 g a
    /// bump, anything harder a hole.
    pub fn from_vertical_acceleration(raw_z: f64) -> Self {
        let g = (raw_z / ACCEL_LSB_PER_G).abs();
        let label = if g < BUMP_THRESHOLD_G {
            Self::NORMAL
        } else if g < HOLE_THRESHOLD_G {
            Self::BUMP
        } else {
            Self::HOLE
        };
        Self::new(label)
    }
}

impl fmt::Display for RoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Three-axis vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axes {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Axes {
    /// Euclidean length of the vector
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Temperature scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[serde(rename = "C")]
    Celsius,
    #[serde(rename = "F")]
    Fahrenheit,
}

impl TemperatureUnit {
    pub const fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "C",
            TemperatureUnit::Fahrenheit => "F",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Temperature {
    pub value: f64,
    pub unit: TemperatureUnit,
    pub status: Status,
}

impl Temperature {
    /// Value converted to degrees Celsius
    pub fn celsius(&self) -> f64 {
        match self.unit {
            TemperatureUnit::Celsius => self.value,
            TemperatureUnit::Fahrenheit => (self.value - 32.0) * 5.0 / 9.0,
        }
    }
}

/// Relative humidity in percent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Humidity {
    pub value: f64,
    pub status: Status,
}

/// Vibration vector with its magnitude
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vibration {
    pub axes: Axes,
    /// Always `axes.magnitude()`; computed at decode time
    pub magnitude: f64,
    pub status: Status,
}

impl Vibration {
    pub fn new(axes: Axes, status: Status) -> Self {
        Self {
            axes,
            magnitude: axes.magnitude(),
            status,
        }
    }
}

/// Ambient light in lux
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Light {
    pub illumination: f64,
    pub status: Status,
}

impl Light {
    /// Whether illumination is below `threshold` lux
    pub fn is_dark(&self, threshold: f64) -> bool {
        self.illumination < threshold
    }

    /// `is_dark` with the default 10 lux threshold
    pub fn is_dark_default(&self) -> bool {
        self.is_dark(DARK_THRESHOLD_LUX)
    }
}

/// US EPA air quality index bands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    const BANDS: [AqiCategory; 5] = [
        AqiCategory::Good,
        AqiCategory::Moderate,
        AqiCategory::UnhealthyForSensitiveGroups,
        AqiCategory::Unhealthy,
        AqiCategory::VeryUnhealthy,
    ];

    pub fn from_aqi(aqi: u16) -> Self {
        AQI_BAND_UPPER_BOUNDS
            .iter()
            .zip(Self::BANDS)
            .find(|(upper, _)| aqi <= **upper)
            .map(|(_, category)| category)
            .unwrap_or(AqiCategory::Hazardous)
    }

    pub const fn label(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQuality {
    /// Fine particulate matter (μg/m³)
    pub pm2_5: f64,
    /// Coarse particulate matter (μg/m³)
    pub pm10: f64,
    /// Air quality index, when the agent computed one
    pub aqi: Option<u16>,
    pub status: Status,
}

impl AirQuality {
    /// EPA band for the AQI; `None` when no AQI was reported
    pub fn category(&self) -> Option<AqiCategory> {
        self.aqi.map(AqiCategory::from_aqi)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPosition {
    pub latitude: f64,
    pub longitude: f64,
}

/// Measurements shown as dashboard cards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementKind {
    Temperature,
    Humidity,
    Vibration,
    Light,
    AirQuality,
}

impl MeasurementKind {
    pub const ALL: [MeasurementKind; 5] = [
        MeasurementKind::Temperature,
        MeasurementKind::Humidity,
        MeasurementKind::Vibration,
        MeasurementKind::Light,
        MeasurementKind::AirQuality,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            MeasurementKind::Temperature => "temperature",
            MeasurementKind::Humidity => "humidity",
            MeasurementKind::Vibration => "vibration",
            MeasurementKind::Light => "light",
            MeasurementKind::AirQuality => "air_quality",
        }
    }
}

/// One named measurement flattened for display
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement<'a> {
    pub kind: MeasurementKind,
    /// `None` only for air quality without an AQI
    pub value: Option<f64>,
    pub unit: &'static str,
    pub status: &'a Status,
}

/// One decoded telemetry message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub(crate) road_state: RoadState,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) user_id: u32,
    pub(crate) temperature: Temperature,
    pub(crate) humidity: Humidity,
    pub(crate) vibration: Vibration,
    pub(crate) light: Light,
    pub(crate) air_quality: AirQuality,
    pub(crate) gps: GpsPosition,
    pub(crate) accelerometer: Axes,
}

impl SensorReading {
    pub fn road_state(&self) -> &RoadState {
        &self.road_state
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn user_id(&self) -> u32 {
        self.user_id
    }

    pub fn temperature(&self) -> &Temperature {
        &self.temperature
    }

    pub fn humidity(&self) -> &Humidity {
        &self.humidity
    }

    pub fn vibration(&self) -> &Vibration {
        &self.vibration
    }

    pub fn light(&self) -> &Light {
        &self.light
    }

    pub fn air_quality(&self) -> &AirQuality {
        &self.air_quality
    }

    pub fn gps(&self) -> GpsPosition {
        self.gps
    }

    pub fn accelerometer(&self) -> Axes {
        self.accelerometer
    }

    /// Card measurements in display order
    pub fn measurements(&self) -> [Measurement<'_>; 5] {
        MeasurementKind::ALL.map(|kind| self.measurement(kind))
    }

    pub fn measurement(&self, kind: MeasurementKind) -> Measurement<'_> {
        match kind {
            MeasurementKind::Temperature => Measurement {
                kind,
                value: Some(self.temperature.value),
                unit: self.temperature.unit.symbol(),
                status: &self.temperature.status,
            },
            MeasurementKind::Humidity => Measurement {
                kind,
                value: Some(self.humidity.value),
                unit: "%",
                status: &self.humidity.status,
            },
            MeasurementKind::Vibration => Measurement {
                kind,
                value: Some(self.vibration.magnitude),
                unit: "",
                status: &self.vibration.status,
            },
            MeasurementKind::Light => Measurement {
                kind,
                value: Some(self.light.illumination),
                unit: "lux",
                status: &self.light.status,
            },
            MeasurementKind::AirQuality => Measurement {
                kind,
                value: self.air_quality.aqi.map(f64::from),
                unit: "AQI",
                status: &self.air_quality.status,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels() {
        assert_eq!(Status::from("Good"), Status::Good);
        assert_eq!(Status::from(" moderate "), Status::Moderate);
        assert_eq!(Status::from("POOR"), Status::Poor);
        assert_eq!(Status::from(""), Status::Unknown);
        assert_eq!(Status::from(None), Status::Unknown);
        assert_eq!(
            Status::from("Unhealthy for Sensitive Groups"),
            Status::Other("Unhealthy for Sensitive Groups".into())
        );
        assert_eq!(Status::Unknown.to_string(), "unknown");
    }

    #[test]
    fn road_state_thresholds() {
        assert_eq!(RoadState::from_vertical_acceleration(16384.0).as_str(), "normal");
        assert_eq!(RoadState::from_vertical_acceleration(-16384.0 * 2.0).as_str(), "bump");
        assert_eq!(RoadState::from_vertical_acceleration(16384.0 * 1.5).as_str(), "bump");
        assert_eq!(RoadState::from_vertical_acceleration(16384.0 * 3.0).as_str(), "hole");
    }

    #[test]
    fn aqi_bands() {
        assert_eq!(AqiCategory::from_aqi(0), AqiCategory::Good);
        assert_eq!(AqiCategory::from_aqi(50), AqiCategory::Good);
        assert_eq!(AqiCategory::from_aqi(51), AqiCategory::Moderate);
        assert_eq!(AqiCategory::from_aqi(150), AqiCategory::UnhealthyForSensitiveGroups);
        assert_eq!(AqiCategory::from_aqi(200), AqiCategory::Unhealthy);
        assert_eq!(AqiCategory::from_aqi(300), AqiCategory::VeryUnhealthy);
        assert_eq!(AqiCategory::from_aqi(301), AqiCategory::Hazardous);
    }

    #[test]
    fn vibration_magnitude_from_axes() {
        let vibration = Vibration::new(Axes { x: 3.0, y: 4.0, z: 12.0 }, Status::Unknown);
        assert_eq!(vibration.magnitude, 13.0);
    }

    #[test]
    fn fahrenheit_conversion() {
        let temp = Temperature {
            value: 212.0,
            unit: TemperatureUnit::Fahrenheit,
            status: Status::Unknown,
        };
        assert!((temp.celsius() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn darkness() {
        let light = Light { illumination: 5.0, status: Status::Good };
        assert!(light.is_dark_default());
        assert!(!light.is_dark(1.0));
    }
}

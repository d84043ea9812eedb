//! Sensor Ranges and Classification Thresholds
//!
//! Limits applied when decoding readings, plus the thresholds the upstream
//! agent and edge services use to classify them.

// ===== RANGES =====

/// Minimum relative humidity (%).
///
/// Source: Physics (0% RH = no water vapor)
pub const HUMIDITY_MIN_PCT: f64 = 0.0;

/// Maximum relative humidity (%).
///
/// Source: Physics (100% RH = saturated)
pub const HUMIDITY_MAX_PCT: f64 = 100.0;

/// Latitude bounds (degrees).
pub const LATITUDE_MIN_DEG: f64 = -90.0;
pub const LATITUDE_MAX_DEG: f64 = 90.0;

/// Longitude bounds (degrees).
pub const LONGITUDE_MIN_DEG: f64 = -180.0;
pub const LONGITUDE_MAX_DEG: f64 = 180.0;

/// Particulate concentrations cannot be negative (μg/m³).
pub const PARTICULATE_MIN_UG_M3: f64 = 0.0;

// ===== ROAD STATE =====

/// Raw accelerometer counts per g.
///
/// ±2g full-scale range on a 16-bit MPU-6050 style accelerometer.
pub const ACCEL_LSB_PER_G: f64 = 16384.0;

/// Vertical acceleration at or above which the road is a bump (g).
pub const BUMP_THRESHOLD_G: f64 = 1.5;

/// Vertical acceleration at or above which the road is a hole (g).
pub const HOLE_THRESHOLD_G: f64 = 3.0;

// ===== LIGHT =====

/// Illumination below which it is considered dark (lux).
pub const DARK_THRESHOLD_LUX: f64 = 10.0;

// ===== AIR QUALITY =====

/// Upper bounds of the US EPA AQI bands, in order.
///
/// Good, Moderate, Unhealthy for Sensitive Groups, Unhealthy, Very Unhealthy.
/// Anything above the last bound is Hazardous.
pub const AQI_BAND_UPPER_BOUNDS: [u16; 5] = [50, 100, 150, 200, 300];

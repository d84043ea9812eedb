//! Read-Only History Snapshots
//!
//! A `Snapshot` is what views get: the feed's history at one instant,
//! most-recent-first. It shares the readings with the feed through `Arc`, so
//! taking one is cheap and holding one never blocks or aliases the live
//! buffer.

use std::sync::Arc;

use crate::{buffer::CircularBuffer, reading::SensorReading};

/// Immutable view of the feed history, most recent reading first
#[derive(Debug, Clone)]
pub struct Snapshot {
    readings: Arc<[Arc<SensorReading>]>,
}

impl Snapshot {
    /// Empty snapshot, as seen before the first message
    pub fn empty() -> Self {
        Self {
            readings: Arc::from(Vec::new()),
        }
    }

    /// Capture a history buffer newest first
    pub fn from_history(history: &CircularBuffer<Arc<SensorReading>>) -> Self {
        Self {
            readings: history.iter_recent().cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Most recent reading
    pub fn latest(&self) -> Option<&SensorReading> {
        self.readings.first().map(Arc::as_ref)
    }

    pub fn get(&self, index: usize) -> Option<&SensorReading> {
        self.readings.get(index).map(Arc::as_ref)
    }

    /// Readings newest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &SensorReading> + ExactSizeIterator {
        self.readings.iter().map(Arc::as_ref)
    }

    /// At most `n` newest readings
    ///
    /// The dashboard table and chart show the 50 most recent of the feed's 100.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &SensorReading> {
        self.iter().take(n)
    }

    /// Shared handles to the readings, newest first
    pub fn readings(&self) -> &[Arc<SensorReading>] {
        &self.readings
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_str;

    fn reading(road_state: &str) -> Arc<SensorReading> {
        let body = format!(
            r#"{{
                "road_state": "{road_state}",
                "agent_data": {{
                    "user_id": 1,
                    "accelerometer": {{"x": 0.0, "y": 0.0, "z": 16384.0}},
                    "gps": {{"latitude": 0.0, "longitude": 0.0}},
                    "temperature": {{"value": 20.0, "unit": "C"}},
                    "humidity": {{"value": 50.0}},
                    "vibration": {{"x": 0.0, "y": 0.0, "z": 0.0}},
                    "light": {{"illumination": 100.0}},
                    "air_quality": {{"pm2_5": 1.0, "pm10": 2.0}},
                    "timestamp": "2024-05-01T12:00:00Z"
                }}
            }}"#
        );
        Arc::new(decode_str(&body).unwrap())
    }

    #[test]
    fn empty_snapshot() {
        let snapshot = Snapshot::empty();
        assert!(snapshot.is_empty());
        assert!(snapshot.latest().is_none());
    }

    #[test]
    fn newest_first() {
        let mut history = CircularBuffer::new(3).unwrap();
        for state in ["dry", "wet", "icy", "dry"] {
            history.push(reading(state));
        }

        let snapshot = Snapshot::from_history(&history);
        let states: Vec<&str> = snapshot.iter().map(|r| r.road_state().as_str()).collect();
        assert_eq!(states, vec!["dry", "icy", "wet"]);
        assert_eq!(snapshot.latest().unwrap().road_state().as_str(), "dry");
        assert_eq!(snapshot.recent(2).count(), 2);
    }

    #[test]
    fn snapshot_is_detached_from_history() {
        let mut history = CircularBuffer::new(2).unwrap();
        history.push(reading("dry"));
        let before = Snapshot::from_history(&history);

        history.push(reading("wet"));
        history.clear();

        assert_eq!(before.len(), 1);
        assert_eq!(before.latest().unwrap().road_state().as_str(), "dry");
    }
}

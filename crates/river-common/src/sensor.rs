//! Static sensor stations along the river.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{GridSpec, HeatmapError, HeatmapResult};

/// A monitoring station, positioned in the sample grid's logical extent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: String,
    pub x: f64,
    pub y: f64,
    /// Site name, e.g. "Upstream"
    #[serde(default)]
    pub label: String,
}

impl Sensor {
    pub fn new(id: impl Into<String>, x: f64, y: f64, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            label: label.into(),
        }
    }
}

/// The immutable sensor list for a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorNetwork {
    sensors: Vec<Sensor>,
}

impl SensorNetwork {
    pub fn new(sensors: Vec<Sensor>) -> Self {
        Self { sensors }
    }

    /// The six Mithi river stations.
    pub fn builtin() -> Self {
        Self::new(vec![
            Sensor::new("MR-001", 150.0, 216.0, "Upstream"),
            Sensor::new("MR-002", 250.0, 180.0, "Midstream"),
            Sensor::new("MR-003", 350.0, 144.0, "Downstream"),
            Sensor::new("MR-004", 437.5, 120.0, "Estuary"),
            Sensor::new("MR-005", 200.0, 264.0, "Industrial"),
            Sensor::new("MR-006", 125.0, 192.0, "Residential"),
        ])
    }

    /// Check ids are unique and every station lies inside `spec`'s extent.
    pub fn validate(&self, spec: &GridSpec) -> HeatmapResult<()> {
        let mut seen = HashSet::new();
        for sensor in &self.sensors {
            let invalid = |message: String| HeatmapError::InvalidSensor {
                id: sensor.id.clone(),
                message,
            };
            if !seen.insert(sensor.id.as_str()) {
                return Err(invalid("duplicate id".to_string()));
            }
            let inside = (0.0..=spec.extent_width).contains(&sensor.x)
                && (0.0..=spec.extent_height).contains(&sensor.y);
            if !inside {
                return Err(invalid(format!(
                    "position ({}, {}) outside {}x{} extent",
                    sensor.x, sensor.y, spec.extent_width, spec.extent_height
                )));
            }
        }
        Ok(())
    }

    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}

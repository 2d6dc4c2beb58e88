//! Parameter layer definitions for the monitored water-quality fields.
//!
//! A layer carries everything the renderer needs to draw one parameter:
//! its display range, the gradient used to color it and the shape
//! coefficients the field sampler evaluates.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Color, GridSpec, HeatmapError, HeatmapResult};

/// One sinusoidal term of a field shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    /// Angular frequency per grid cell
    pub frequency: f64,
    /// Amplitude in layer units (may be negative)
    pub amplitude: f64,
}

impl Wave {
    pub const fn new(frequency: f64, amplitude: f64) -> Self {
        Self { frequency, amplitude }
    }
}

/// Coefficients of the synthetic field for one parameter.
///
/// `value(i, j) = base + sin(i * sin_x.frequency) * sin_x.amplitude
///              + cos(j * cos_y.frequency) * cos_y.amplitude
///              + distance((i, j), center) * radial`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldShape {
    pub base: f64,
    pub sin_x: Wave,
    pub cos_y: Wave,
    /// Change per cell of distance from the grid center
    pub radial: f64,
}

impl FieldShape {
    /// Soft bounds of any value this shape can produce on `spec`.
    ///
    /// Individual samples stay inside these bounds but may fall outside the
    /// owning layer's display range.
    pub fn soft_range(&self, spec: &GridSpec) -> (f64, f64) {
        let swing = self.sin_x.amplitude.abs() + self.cos_y.amplitude.abs();
        let radial_span = self.radial * spec.max_center_distance();
        (
            self.base - swing + radial_span.min(0.0),
            self.base + swing + radial_span.max(0.0),
        )
    }

    fn is_finite(&self) -> bool {
        [
            self.base,
            self.sin_x.frequency,
            self.sin_x.amplitude,
            self.cos_y.frequency,
            self.cos_y.amplitude,
            self.radial,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Configuration for one monitored water-quality parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterLayer {
    /// Lookup key (e.g. "pH", "DO")
    pub key: String,

    /// Human-readable name
    pub name: String,

    /// Unit label for display, empty for unitless parameters
    #[serde(default)]
    pub unit: String,

    /// Lower end of the display range
    pub min: f64,

    /// Upper end of the display range
    pub max: f64,

    /// Ordered gradient stops, low to high
    pub gradient: Vec<Color>,

    /// Accent color used for the layer's markers
    #[serde(default = "default_accent")]
    pub accent: Color,

    /// Field shape evaluated by the sampler
    pub shape: FieldShape,
}

fn default_accent() -> Color {
    Color::rgb(0x3b, 0x82, 0xf6)
}

impl ParameterLayer {
    pub fn validate(&self) -> HeatmapResult<()> {
        let invalid = |message: String| HeatmapError::InvalidLayer {
            key: self.key.clone(),
            message,
        };

        if self.key.trim().is_empty() {
            return Err(invalid("key must not be empty".to_string()));
        }
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(invalid(format!(
                "range must be finite, got [{}, {}]",
                self.min, self.max
            )));
        }
        if self.min >= self.max {
            return Err(invalid(format!(
                "min must be below max, got [{}, {}]",
                self.min, self.max
            )));
        }
        if self.gradient.len() < 2 {
            return Err(invalid(format!(
                "gradient needs at least 2 stops, got {}",
                self.gradient.len()
            )));
        }
        if !self.shape.is_finite() {
            return Err(invalid("shape coefficients must be finite".to_string()));
        }
        Ok(())
    }

    /// Width of the display range.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// `count` evenly spaced iso-levels starting at `min`.
    ///
    /// Level `k` is `min + k * (max - min) / count` for `k in 0..count`. This
    /// is exclusive of `max`: an inclusive walk `min, min + step, ..= max`
    /// with the same step would emit `count + 1` levels, the last one at
    /// `max`, where only values at the very top of the range cross.
    pub fn iso_levels(&self, count: usize) -> Vec<f64> {
        if count == 0 {
            return vec![];
        }
        let step = self.span() / count as f64;
        (0..count).map(|k| self.min + k as f64 * step).collect()
    }

    /// Range label, e.g. "6 - 8.5".
    pub fn range_label(&self) -> String {
        format!("{} - {}", self.min, self.max)
    }
}

/// The set of layers available in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterCatalog {
    /// Version of the layer schema
    #[serde(default = "default_version")]
    pub version: String,

    /// Layers in display order
    pub layers: Vec<ParameterLayer>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for ParameterCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ParameterCatalog {
    /// Build a catalog from layers, validating them.
    pub fn new(layers: Vec<ParameterLayer>) -> HeatmapResult<Self> {
        let catalog = Self {
            version: default_version(),
            layers,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The four parameters of the river monitoring program.
    pub fn builtin() -> Self {
        Self {
            version: default_version(),
            layers: builtin::layers(),
        }
    }

    /// Parse a catalog from a JSON string.
    pub fn from_json(json: &str) -> HeatmapResult<Self> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse a catalog from a YAML string.
    pub fn from_yaml(yaml: &str) -> HeatmapResult<Self> {
        let catalog: Self = serde_yaml::from_str(yaml)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog from a `.json`, `.yaml` or `.yml` file.
    pub fn from_file(path: impl AsRef<Path>) -> HeatmapResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            other => Err(HeatmapError::Config(format!(
                "unsupported layer file extension {:?} for {}",
                other,
                path.display()
            ))),
        }
    }

    /// Validate every layer and key uniqueness.
    pub fn validate(&self) -> HeatmapResult<()> {
        if self.layers.is_empty() {
            return Err(HeatmapError::Config("catalog has no layers".to_string()));
        }
        let mut seen = HashSet::new();
        for layer in &self.layers {
            layer.validate()?;
            if !seen.insert(layer.key.as_str()) {
                return Err(HeatmapError::Config(format!(
                    "duplicate layer key: {}",
                    layer.key
                )));
            }
        }
        Ok(())
    }

    /// Look up a layer by key. Unknown keys are an error, never a fallback.
    pub fn get(&self, key: &str) -> HeatmapResult<&ParameterLayer> {
        self.layers
            .iter()
            .find(|layer| layer.key == key)
            .ok_or_else(|| HeatmapError::UnknownParameter(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.layers.iter().any(|layer| layer.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|layer| layer.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterLayer> {
        self.layers.iter()
    }

    /// Key of the first layer, the default selection.
    pub fn first_key(&self) -> Option<&str> {
        self.layers.first().map(|layer| layer.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Built-in layer definitions.
pub mod builtin {
    use super::*;

    const RED: Color = Color::rgb(0xef, 0x44, 0x44);
    const AMBER: Color = Color::rgb(0xf5, 0x9e, 0x0b);
    const GREEN: Color = Color::rgb(0x10, 0xb9, 0x81);
    const BLUE: Color = Color::rgb(0x3b, 0x82, 0xf6);
    const CYAN: Color = Color::rgb(0x06, 0xb6, 0xd4);
    const BROWN: Color = Color::rgb(0x7c, 0x2d, 0x12);
    const VIOLET: Color = Color::rgb(0x8b, 0x5c, 0xf6);

    /// pH, soft range about 5.1 - 8.3 on the default grid.
    pub fn ph() -> ParameterLayer {
        ParameterLayer {
            key: "pH".to_string(),
            name: "pH Levels".to_string(),
            unit: String::new(),
            min: 6.0,
            max: 8.5,
            gradient: vec![RED, AMBER, GREEN, BLUE],
            accent: BLUE,
            shape: FieldShape {
                base: 7.0,
                sin_x: Wave::new(0.2, 0.8),
                cos_y: Wave::new(0.3, 0.5),
                radial: -0.02,
            },
        }
    }

    /// Water temperature in °C, soft range about 23 - 34.5.
    pub fn temperature() -> ParameterLayer {
        ParameterLayer {
            key: "temperature".to_string(),
            name: "Temperature".to_string(),
            unit: "°C".to_string(),
            min: 25.0,
            max: 35.0,
            gradient: vec![BLUE, GREEN, AMBER, RED],
            accent: AMBER,
            shape: FieldShape {
                base: 28.0,
                sin_x: Wave::new(0.1, 3.0),
                cos_y: Wave::new(0.15, 2.0),
                radial: 0.05,
            },
        }
    }

    /// Dissolved oxygen in mg/L, soft range about 1.6 - 9.5.
    pub fn dissolved_oxygen() -> ParameterLayer {
        ParameterLayer {
            key: "DO".to_string(),
            name: "Dissolved Oxygen".to_string(),
            unit: "mg/L".to_string(),
            min: 2.0,
            max: 10.0,
            gradient: vec![RED, AMBER, GREEN, CYAN],
            accent: GREEN,
            shape: FieldShape {
                base: 6.0,
                sin_x: Wave::new(0.15, -2.0),
                cos_y: Wave::new(0.2, -1.5),
                radial: -0.03,
            },
        }
    }

    /// Turbidity in NTU, soft range about -3 - 39.
    pub fn turbidity() -> ParameterLayer {
        ParameterLayer {
            key: "turbidity".to_string(),
            name: "Turbidity".to_string(),
            unit: "NTU".to_string(),
            min: 0.0,
            max: 50.0,
            gradient: vec![GREEN, AMBER, RED, BROWN],
            accent: VIOLET,
            shape: FieldShape {
                base: 15.0,
                sin_x: Wave::new(0.25, 10.0),
                cos_y: Wave::new(0.2, 8.0),
                radial: 0.2,
            },
        }
    }

    pub fn layers() -> Vec<ParameterLayer> {
        vec![ph(), temperature(), dissolved_oxygen(), turbidity()]
    }
}

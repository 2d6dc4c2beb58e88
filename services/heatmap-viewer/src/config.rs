//! Viewer configuration.
//!
//! Loaded from a YAML or JSON file; every section is optional and falls back
//! to the built-in river layers, stations and a 50x30 grid.

use std::path::Path;

use anyhow::{bail, Context, Result};
use renderer::{ContourMethod, GradientMode, ViewOptions};
use river_common::layer::builtin;
use river_common::{GridSpec, ParameterCatalog, ParameterLayer, SensorNetwork};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
pub struct ViewerConfig {
    #[serde(default = "builtin::layers")]
    pub layers: Vec<ParameterLayer>,
    #[serde(default = "SensorNetwork::builtin")]
    pub sensors: SensorNetwork,
    #[serde(default)]
    pub grid: GridSpec,
    #[serde(default)]
    pub render: RenderSettings,
}

/// Initial toggles and output size.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub show_contours: bool,
    pub show_sensors: bool,
    pub speed_factor: f64,
    pub contour_method: ContourMethod,
    pub gradient_mode: GradientMode,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            show_contours: true,
            show_sensors: true,
            speed_factor: 1.0,
            contour_method: ContourMethod::default(),
            gradient_mode: GradientMode::default(),
            width: 800,
            height: 480,
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            layers: builtin::layers(),
            sensors: SensorNetwork::builtin(),
            grid: GridSpec::default(),
            render: RenderSettings::default(),
        }
    }
}

impl ViewerConfig {
    /// Load a configuration file, picking the format by extension.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: ViewerConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            _ => bail!("Unsupported config format: {}", path.display()),
        };

        debug!(
            path = %path.display(),
            layers = config.layers.len(),
            sensors = config.sensors.len(),
            "Loaded viewer config"
        );
        Ok(config)
    }

    /// Validated layer catalog.
    pub fn catalog(&self) -> Result<ParameterCatalog> {
        ParameterCatalog::new(self.layers.clone()).context("Invalid layer configuration")
    }

    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            show_contours: self.render.show_contours,
            show_sensors: self.render.show_sensors,
            speed_factor: self.render.speed_factor,
            contour_method: self.render.contour_method,
            gradient_mode: self.render.gradient_mode,
            grid: self.grid,
        }
    }
}

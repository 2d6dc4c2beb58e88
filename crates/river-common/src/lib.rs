//! Common types shared by the river heatmap renderer and its hosts.

pub mod color;
pub mod error;
pub mod grid;
pub mod layer;
pub mod sensor;

pub use color::Color;
pub use error::{HeatmapError, HeatmapResult};
pub use grid::{GridSpec, SampleGrid, SamplePoint};
pub use layer::{FieldShape, ParameterCatalog, ParameterLayer, Wave};
pub use sensor::{Sensor, SensorNetwork};

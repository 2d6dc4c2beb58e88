//! Synthetic parameter fields over the river extent.
//!
//! Each layer's [`FieldShape`] is evaluated at every grid index to produce a
//! plume-like pattern. Generation is pure: the same layer and grid size
//! always give the same samples.

use river_common::{
    FieldShape, GridSpec, HeatmapError, HeatmapResult, ParameterCatalog, SampleGrid, SamplePoint,
};
use tracing::debug;

/// Generates sample grids for the layers of a catalog.
#[derive(Debug, Clone)]
pub struct FieldSampler {
    catalog: ParameterCatalog,
    extent_width: f64,
    extent_height: f64,
}

impl FieldSampler {
    /// Sampler over the default 500x300 logical extent.
    pub fn new(catalog: ParameterCatalog) -> Self {
        let spec = GridSpec::default();
        Self {
            catalog,
            extent_width: spec.extent_width,
            extent_height: spec.extent_height,
        }
    }

    /// Sampler over a custom logical extent.
    pub fn with_extent(catalog: ParameterCatalog, extent_width: f64, extent_height: f64) -> Self {
        Self {
            catalog,
            extent_width,
            extent_height,
        }
    }

    pub fn catalog(&self) -> &ParameterCatalog {
        &self.catalog
    }

    /// Generate the grid for `parameter` with `grid_width x grid_height` cells.
    ///
    /// Fails with `UnknownParameter` for keys missing from the catalog and
    /// with `InvalidGrid` for zero dimensions or non-finite samples.
    pub fn generate(
        &self,
        parameter: &str,
        grid_width: usize,
        grid_height: usize,
    ) -> HeatmapResult<SampleGrid> {
        let layer = self.catalog.get(parameter)?;
        let spec = GridSpec::with_extent(
            grid_width,
            grid_height,
            self.extent_width,
            self.extent_height,
        )?;

        let grid = sample_shape(&layer.shape, &spec, &layer.key)?;

        if tracing::enabled!(tracing::Level::DEBUG) {
            let (data_min, data_max) = grid.value_range().unwrap_or((0.0, 0.0));
            debug!(
                parameter = %layer.key,
                nx = spec.nx,
                ny = spec.ny,
                data_min,
                data_max,
                "Generated sample grid"
            );
        }

        Ok(grid)
    }

    /// Generate with a grid's own dimensions and extent.
    pub fn generate_spec(&self, parameter: &str, spec: &GridSpec) -> HeatmapResult<SampleGrid> {
        Self::with_extent(self.catalog.clone(), spec.extent_width, spec.extent_height)
            .generate(parameter, spec.nx, spec.ny)
    }
}

/// Evaluate a shape at grid index `(i, j)`.
pub fn shape_value(shape: &FieldShape, i: usize, j: usize, center: (f64, f64)) -> f64 {
    let (fi, fj) = (i as f64, j as f64);
    let distance = ((fi - center.0).powi(2) + (fj - center.1).powi(2)).sqrt();

    shape.base
        + (fi * shape.sin_x.frequency).sin() * shape.sin_x.amplitude
        + (fj * shape.cos_y.frequency).cos() * shape.cos_y.amplitude
        + distance * shape.radial
}

/// Sample `shape` over every cell of `spec`, column by column.
pub fn sample_shape(
    shape: &FieldShape,
    spec: &GridSpec,
    parameter: &str,
) -> HeatmapResult<SampleGrid> {
    spec.validate()?;

    let center = spec.center();
    let mut points = Vec::with_capacity(spec.len());

    for i in 0..spec.nx {
        for j in 0..spec.ny {
            let (x, y) = spec
                .index_to_coord(i, j)
                .ok_or_else(|| HeatmapError::InvalidGrid(format!("cell ({}, {}) out of range", i, j)))?;
            points.push(SamplePoint::new(x, y, shape_value(shape, i, j, center)));
        }
    }

    SampleGrid::new(*spec, parameter, points)
}

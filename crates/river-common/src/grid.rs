//! Sample grid specifications for river parameter fields.

use serde::{Deserialize, Serialize};

use crate::{HeatmapError, HeatmapResult};

/// Default number of cells along the river (x).
pub const DEFAULT_NX: usize = 50;
/// Default number of cells across the river (y).
pub const DEFAULT_NY: usize = 30;
/// Default logical extent, in logical units.
pub const DEFAULT_EXTENT_WIDTH: f64 = 500.0;
pub const DEFAULT_EXTENT_HEIGHT: f64 = 300.0;

/// Specification of a regular sample grid over a logical extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of points in X direction
    #[serde(default = "default_nx")]
    pub nx: usize,
    /// Number of points in Y direction
    #[serde(default = "default_ny")]
    pub ny: usize,
    /// Width of the logical area covered by the grid
    #[serde(default = "default_extent_width")]
    pub extent_width: f64,
    /// Height of the logical area covered by the grid
    #[serde(default = "default_extent_height")]
    pub extent_height: f64,
}

fn default_nx() -> usize {
    DEFAULT_NX
}

fn default_ny() -> usize {
    DEFAULT_NY
}

fn default_extent_width() -> f64 {
    DEFAULT_EXTENT_WIDTH
}

fn default_extent_height() -> f64 {
    DEFAULT_EXTENT_HEIGHT
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            nx: DEFAULT_NX,
            ny: DEFAULT_NY,
            extent_width: DEFAULT_EXTENT_WIDTH,
            extent_height: DEFAULT_EXTENT_HEIGHT,
        }
    }
}

impl GridSpec {
    /// Create a grid over the default 500x300 extent.
    pub fn new(nx: usize, ny: usize) -> HeatmapResult<Self> {
        Self::with_extent(nx, ny, DEFAULT_EXTENT_WIDTH, DEFAULT_EXTENT_HEIGHT)
    }

    /// Create a grid over an explicit logical extent.
    pub fn with_extent(
        nx: usize,
        ny: usize,
        extent_width: f64,
        extent_height: f64,
    ) -> HeatmapResult<Self> {
        let spec = Self {
            nx,
            ny,
            extent_width,
            extent_height,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> HeatmapResult<()> {
        if self.nx == 0 || self.ny == 0 {
            return Err(HeatmapError::InvalidGrid(format!(
                "grid dimensions must be positive, got {}x{}",
                self.nx, self.ny
            )));
        }
        if !(self.extent_width.is_finite() && self.extent_width > 0.0)
            || !(self.extent_height.is_finite() && self.extent_height > 0.0)
        {
            return Err(HeatmapError::InvalidGrid(format!(
                "extent must be positive and finite, got {}x{}",
                self.extent_width, self.extent_height
            )));
        }
        Ok(())
    }

    /// Logical width of one cell.
    pub fn cell_size_x(&self) -> f64 {
        self.extent_width / self.nx as f64
    }

    /// Logical height of one cell.
    pub fn cell_size_y(&self) -> f64 {
        self.extent_height / self.ny as f64
    }

    /// Logical coordinate of cell `(i, j)`.
    pub fn index_to_coord(&self, i: usize, j: usize) -> Option<(f64, f64)> {
        if i >= self.nx || j >= self.ny {
            return None;
        }
        Some((i as f64 * self.cell_size_x(), j as f64 * self.cell_size_y()))
    }

    /// Position of cell `(i, j)` in the flattened point sequence.
    ///
    /// Points are stored column by column: all `j` for `i = 0`, then `i = 1`.
    pub fn flat_index(&self, i: usize, j: usize) -> usize {
        i * self.ny + j
    }

    /// Center of the grid in index space.
    pub fn center(&self) -> (f64, f64) {
        (self.nx as f64 / 2.0, self.ny as f64 / 2.0)
    }

    /// Largest distance (in cells) from any grid index to the center.
    pub fn max_center_distance(&self) -> f64 {
        let (cx, cy) = self.center();
        let dx = cx.max((self.nx - 1) as f64 - cx);
        let dy = cy.max((self.ny - 1) as f64 - cy);
        (dx * dx + dy * dy).sqrt()
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0
    }
}

/// One field sample at a logical coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl SamplePoint {
    pub fn new(x: f64, y: f64, value: f64) -> Self {
        Self { x, y, value }
    }
}

/// A generated field for one parameter.
///
/// Immutable once built: switching parameters produces a new grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleGrid {
    spec: GridSpec,
    parameter: String,
    points: Vec<SamplePoint>,
}

impl SampleGrid {
    /// Wrap generated points, checking count and finiteness.
    pub fn new(
        spec: GridSpec,
        parameter: impl Into<String>,
        points: Vec<SamplePoint>,
    ) -> HeatmapResult<Self> {
        if points.len() != spec.len() {
            return Err(HeatmapError::InvalidGrid(format!(
                "expected {} points for a {}x{} grid, got {}",
                spec.len(),
                spec.nx,
                spec.ny,
                points.len()
            )));
        }
        if let Some(index) = points.iter().position(|p| !p.value.is_finite()) {
            return Err(HeatmapError::InvalidGrid(format!(
                "non-finite sample at index {}",
                index
            )));
        }
        Ok(Self {
            spec,
            parameter: parameter.into(),
            points,
        })
    }

    /// Build a grid from arbitrary points without a regular layout.
    ///
    /// Used for externally supplied samples; the layout is `len x 1` and may be
    /// empty.
    pub fn from_points(
        parameter: impl Into<String>,
        points: Vec<SamplePoint>,
    ) -> HeatmapResult<Self> {
        let spec = GridSpec {
            nx: points.len(),
            ny: 1,
            ..GridSpec::default()
        };
        Self::new(spec, parameter, points)
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    pub fn points(&self) -> &[SamplePoint] {
        &self.points
    }

    /// Sample at grid index `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> Option<&SamplePoint> {
        if i >= self.spec.nx || j >= self.spec.ny {
            return None;
        }
        self.points.get(self.spec.flat_index(i, j))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Min and max sample value, `None` for an empty grid.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        if self.points.is_empty() {
            return None;
        }
        Some(self.points.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(min, max), p| (min.min(p.value), max.max(p.value)),
        ))
    }
}

//! Iso-contour extraction over sample grids.
//!
//! Three methods are available:
//! - [`ContourMethod::Sequential`]: compares consecutive entries of the
//!   flattened point list. Since points are stored column by column, the
//!   last point of one column is compared with the first of the next, so
//!   segments can jump across the field at column boundaries.
//! - [`ContourMethod::GridNeighbors`]: the same crossing test over true
//!   row and column neighbors.
//! - [`ContourMethod::MarchingSquares`]: interpolated iso-lines per cell.
//!
//! All coordinates are logical grid coordinates.

use river_common::{SampleGrid, SamplePoint};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A point in logical coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<&SamplePoint> for Point {
    fn from(p: &SamplePoint) -> Self {
        Self::new(p.x, p.y)
    }
}

/// A line segment approximating part of the contour at `level`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContourSegment {
    pub start: Point,
    pub end: Point,
    pub level: f64,
}

/// Which neighbor relation the extractor scans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContourMethod {
    #[default]
    Sequential,
    GridNeighbors,
    MarchingSquares,
}

/// True when `level` lies between `v1` and `v2`, inclusive.
#[inline]
pub fn crosses(v1: f64, v2: f64, level: f64) -> bool {
    (v1 <= level && v2 >= level) || (v1 >= level && v2 <= level)
}

/// Segments between consecutive points of the flattened grid.
///
/// Total over any grid: fewer than two points yields no segments.
pub fn extract(grid: &SampleGrid, iso_levels: &[f64]) -> Vec<ContourSegment> {
    let points = grid.points();
    let mut segments = Vec::new();

    for &level in iso_levels {
        for pair in points.windows(2) {
            if crosses(pair[0].value, pair[1].value, level) {
                segments.push(ContourSegment {
                    start: Point::from(&pair[0]),
                    end: Point::from(&pair[1]),
                    level,
                });
            }
        }
    }

    segments
}

/// Segments between row and column neighbors of the grid.
pub fn extract_grid_neighbors(grid: &SampleGrid, iso_levels: &[f64]) -> Vec<ContourSegment> {
    let spec = grid.spec();
    let mut segments = Vec::new();

    for &level in iso_levels {
        for i in 0..spec.nx {
            for j in 0..spec.ny {
                let Some(here) = grid.get(i, j) else { continue };
                for neighbor in [grid.get(i + 1, j), grid.get(i, j + 1)].into_iter().flatten() {
                    if crosses(here.value, neighbor.value, level) {
                        segments.push(ContourSegment {
                            start: Point::from(here),
                            end: Point::from(neighbor),
                            level,
                        });
                    }
                }
            }
        }
    }

    segments
}

/// Marching squares iso-lines for every level.
pub fn extract_marching_squares(grid: &SampleGrid, iso_levels: &[f64]) -> Vec<ContourSegment> {
    iso_levels
        .iter()
        .flat_map(|&level| march_squares(grid, level))
        .collect()
}

/// Run the extractor selected by `method`.
pub fn extract_with(
    method: ContourMethod,
    grid: &SampleGrid,
    iso_levels: &[f64],
) -> Vec<ContourSegment> {
    let segments = match method {
        ContourMethod::Sequential => extract(grid, iso_levels),
        ContourMethod::GridNeighbors => extract_grid_neighbors(grid, iso_levels),
        ContourMethod::MarchingSquares => extract_marching_squares(grid, iso_levels),
    };

    debug!(
        ?method,
        points = grid.len(),
        num_levels = iso_levels.len(),
        num_segments = segments.len(),
        "Extracted contours"
    );

    segments
}

/// Marching squares algorithm for one level
///
/// Cells are formed by grid indices `(i, j)..(i + 1, j + 1)`. Grids narrower
/// than 2 in either direction yield no segments.
pub fn march_squares(grid: &SampleGrid, level: f64) -> Vec<ContourSegment> {
    let spec = grid.spec();
    if spec.nx < 2 || spec.ny < 2 || grid.len() != spec.len() {
        return vec![];
    }

    let mut segments = Vec::new();

    for i in 0..(spec.nx - 1) {
        for j in 0..(spec.ny - 1) {
            let (Some(tl), Some(tr), Some(bl), Some(br)) = (
                grid.get(i, j),
                grid.get(i + 1, j),
                grid.get(i, j + 1),
                grid.get(i + 1, j + 1),
            ) else {
                continue;
            };

            // Calculate cell index (0-15) based on which corners are above the threshold
            let mut cell_index = 0u8;
            if tl.value >= level { cell_index |= 1; }
            if tr.value >= level { cell_index |= 2; }
            if br.value >= level { cell_index |= 4; }
            if bl.value >= level { cell_index |= 8; }

            if cell_index == 0 || cell_index == 15 {
                continue;
            }

            let top = interpolate_edge(tl, tr, level);
            let right = interpolate_edge(tr, br, level);
            let bottom = interpolate_edge(bl, br, level);
            let left = interpolate_edge(tl, bl, level);

            let mut push = |start: Point, end: Point| {
                segments.push(ContourSegment { start, end, level });
            };

            match cell_index {
                1 | 14 => push(left, top),
                2 | 13 => push(top, right),
                3 | 12 => push(left, right),
                4 | 11 => push(right, bottom),
                5 => {
                    // Saddle: two separate segments
                    push(left, top);
                    push(right, bottom);
                }
                6 | 9 => push(top, bottom),
                7 | 8 => push(left, bottom),
                10 => {
                    push(top, right);
                    push(left, bottom);
                }
                _ => {}
            }
        }
    }

    segments
}

/// Where `level` crosses the edge between two samples
fn interpolate_edge(a: &SamplePoint, b: &SamplePoint, level: f64) -> Point {
    if (b.value - a.value).abs() < 1e-9 {
        return Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
    }

    let t = ((level - a.value) / (b.value - a.value)).clamp(0.0, 1.0);
    Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crosses_inclusive() {
        assert!(crosses(6.0, 9.0, 7.0));
        assert!(crosses(9.0, 6.0, 7.0));
        assert!(crosses(7.0, 9.0, 7.0));
        assert!(!crosses(6.0, 9.0, 10.0));
    }

    #[test]
    fn test_interpolate_edge() {
        let a = SamplePoint::new(0.0, 0.0, 0.0);
        let b = SamplePoint::new(10.0, 0.0, 10.0);
        let p = interpolate_edge(&a, &b, 5.0);
        assert!((p.x - 5.0).abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
    }
}

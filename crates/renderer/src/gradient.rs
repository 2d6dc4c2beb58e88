//! Gradient color mapping for parameter values.
//!
//! Values are normalized into `[0, 1]` against a layer's display range and
//! mapped onto its gradient stops. The default [`GradientMode::Stepped`]
//! picks the stop at or below the normalized position without blending;
//! [`GradientMode::Linear`] blends the two bounding stops instead.

use river_common::{Color, ParameterLayer, SamplePoint};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// How a normalized value picks its color from the gradient stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientMode {
    /// Nearest stop below, `stops[floor(n * (len - 1))]`
    #[default]
    Stepped,
    /// Linear blend between the two bounding stops
    Linear,
}

/// Time-varying perturbation of sample values.
///
/// `value + sin(t + x * kx + y * ky) * amplitude`, a zero-mean sinusoid in
/// `t`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shimmer {
    /// Amplitude in layer units
    pub amplitude: f64,
    pub kx: f64,
    pub ky: f64,
}

impl Default for Shimmer {
    fn default() -> Self {
        Self {
            amplitude: 0.1,
            kx: 0.01,
            ky: 0.01,
        }
    }
}

/// Opacity oscillation between `floor` and `ceiling`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlphaPulse {
    pub floor: f64,
    pub ceiling: f64,
    /// Multiplier on `t`
    pub rate: f64,
    pub kx: f64,
    pub ky: f64,
}

impl Default for AlphaPulse {
    fn default() -> Self {
        Self {
            floor: 0.6,
            ceiling: 0.8,
            rate: 2.0,
            kx: 0.02,
            ky: 0.0,
        }
    }
}

/// Maps sample values to colors, with optional animation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorMapper {
    #[serde(default)]
    pub mode: GradientMode,
    #[serde(default)]
    pub shimmer: Shimmer,
    #[serde(default)]
    pub pulse: AlphaPulse,
}

impl ColorMapper {
    pub fn new(mode: GradientMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Color for a static value.
    pub fn color_for(&self, value: f64, layer: &ParameterLayer) -> Color {
        let normalized = normalize(value, layer.min, layer.max);
        self.pick(normalized, &layer.gradient)
    }

    /// Value with the shimmer perturbation applied.
    pub fn animated_value(&self, value: f64, x: f64, y: f64, t: f64) -> f64 {
        let s = &self.shimmer;
        value + (t + x * s.kx + y * s.ky).sin() * s.amplitude
    }

    /// Normalized position of a sample's animated value.
    pub fn animated_normalized(&self, point: &SamplePoint, layer: &ParameterLayer, t: f64) -> f64 {
        let value = self.animated_value(point.value, point.x, point.y, t);
        normalize(value, layer.min, layer.max)
    }

    /// Opaque color of a sample at time `t`.
    pub fn color_for_animated(&self, point: &SamplePoint, layer: &ParameterLayer, t: f64) -> Color {
        self.pick(self.animated_normalized(point, layer, t), &layer.gradient)
    }

    /// Opacity at `(x, y)` and time `t`, always within `[0, 1]`.
    pub fn alpha_for(&self, x: f64, y: f64, t: f64) -> f64 {
        let p = &self.pulse;
        let mid = (p.floor + p.ceiling) / 2.0;
        let half = (p.ceiling - p.floor) / 2.0;
        let alpha = mid + (t * p.rate + x * p.kx + y * p.ky).sin() * half;

        if !alpha.is_finite() {
            trace!(x, y, t, "non-finite alpha coerced to floor");
            return p.floor.clamp(0.0, 1.0);
        }
        alpha.clamp(0.0, 1.0)
    }

    /// Fill color of a heatmap point: animated color with pulsing alpha.
    pub fn point_color(&self, point: &SamplePoint, layer: &ParameterLayer, t: f64) -> Color {
        self.color_for_animated(point, layer, t)
            .with_alpha(self.alpha_for(point.x, point.y, t))
    }

    fn pick(&self, normalized: f64, stops: &[Color]) -> Color {
        match self.mode {
            GradientMode::Stepped => stepped_color(normalized, stops),
            GradientMode::Linear => interpolated_color(normalized, stops),
        }
    }
}

/// Stepped color for `value` with the default mapper.
pub fn color_for(value: f64, layer: &ParameterLayer) -> Color {
    ColorMapper::default().color_for(value, layer)
}

/// Default opacity oscillation between 0.6 and 0.8.
pub fn alpha_for(x: f64, y: f64, t: f64) -> f64 {
    ColorMapper::default().alpha_for(x, y, t)
}

/// Normalize `value` into `[0, 1]` against `[min, max]`.
///
/// Non-finite input is coerced rather than propagated: NaN maps to 0,
/// +inf to 1 and -inf to 0. A degenerate range maps everything to 0.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        trace!("NaN sample coerced to range minimum");
        return 0.0;
    }
    let range = max - min;
    if !(range > f64::EPSILON) || !range.is_finite() {
        return 0.0;
    }
    ((value - min) / range).clamp(0.0, 1.0)
}

/// Index of the stop at or below `normalized`, clamped to the stop list.
pub fn stop_index(normalized: f64, stop_count: usize) -> usize {
    if stop_count == 0 {
        return 0;
    }
    let last = stop_count - 1;
    let position = (normalized * last as f64).floor();
    if position.is_nan() || position < 0.0 {
        0
    } else if position >= last as f64 {
        last
    } else {
        position as usize
    }
}

/// Nearest-below stop; transparent for an empty stop list.
pub fn stepped_color(normalized: f64, stops: &[Color]) -> Color {
    stops
        .get(stop_index(normalized, stops.len()))
        .copied()
        .unwrap_or(Color::TRANSPARENT)
}

/// Linear blend of the two stops around `normalized`.
pub fn interpolated_color(normalized: f64, stops: &[Color]) -> Color {
    if stops.is_empty() {
        return Color::TRANSPARENT;
    }
    let index = stop_index(normalized, stops.len());
    if index + 1 >= stops.len() {
        return stops[stops.len() - 1];
    }
    let position = normalized.clamp(0.0, 1.0) * (stops.len() - 1) as f64;
    stops[index].lerp(&stops[index + 1], position - index as f64)
}

/// Stops evenly spread over `[0, 1]`, as drawn in the legend bar.
pub fn legend_stops(stops: &[Color]) -> Vec<(f64, Color)> {
    match stops.len() {
        0 => vec![],
        1 => vec![(0.0, stops[0])],
        n => stops
            .iter()
            .enumerate()
            .map(|(i, c)| (i as f64 / (n - 1) as f64, *c))
            .collect(),
    }
}

//! Per-frame scene composition.
//!
//! [`render_frame`] turns the active layer, its grid, the sensors and the
//! animation clock into an ordered list of [`DrawCommand`]s. Later commands
//! overlay earlier ones. Nothing here touches a pixel buffer; a
//! [`Surface`](crate::raster::Surface) executes the commands.

use river_common::{Color, ParameterLayer, SampleGrid, Sensor};
use serde::Serialize;
use tracing::debug;

use crate::animation::AnimationClock;
use crate::contour::{extract_with, ContourMethod, Point};
use crate::gradient::{legend_stops, ColorMapper};

/// Number of iso-levels drawn for the active layer.
pub const ISO_LEVEL_COUNT: usize = 5;

/// River course as fractions of the viewport, upstream first.
pub const RIVER_PATH: [(f64, f64); 5] = [
    (0.2, 0.7),
    (0.3, 0.6),
    (0.5, 0.5),
    (0.7, 0.4),
    (0.85, 0.35),
];

/// Size of the container the frame is drawn into, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Pixel dimensions, `None` while the container has no area.
    pub fn pixel_size(&self) -> Option<(u32, u32)> {
        if !self.width.is_finite() || !self.height.is_finite() {
            return None;
        }
        let (w, h) = (self.width.floor(), self.height.floor());
        if w < 1.0 || h < 1.0 || w > u32::MAX as f64 || h > u32::MAX as f64 {
            return None;
        }
        Some((w as u32, h as u32))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Paint for filled rectangles
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Fill {
    Solid { color: Color },
    /// Horizontal gradient from `x0` to `x1`, stops at offsets in `[0, 1]`
    HorizontalGradient { x0: f64, x1: f64, stops: Vec<(f64, Color)> },
}

/// One drawing instruction in frame pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    FillRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Fill,
    },
    FillCircle {
        center: Point,
        radius: f64,
        color: Color,
    },
    StrokeCircle {
        center: Point,
        radius: f64,
        color: Color,
        line_width: f64,
    },
    /// Disconnected line segments stroked as one path
    StrokeSegments {
        segments: Vec<(Point, Point)>,
        color: Color,
        line_width: f64,
    },
    StrokePolyline {
        points: Vec<Point>,
        color: Color,
        line_width: f64,
        round_cap: bool,
    },
    FillPolygon {
        points: Vec<Point>,
        color: Color,
    },
    Text {
        position: Point,
        text: String,
        size: f64,
        color: Color,
        align: TextAlign,
    },
}

/// A sized list of drawing commands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub commands: Vec<DrawCommand>,
}

/// Colors and sizes of the scene elements
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneStyle {
    pub background: Color,
    pub point_radius: f64,
    pub contour_color: Color,
    pub contour_width: f64,
    pub river_color: Color,
    pub river_width: f64,
    /// Vertical wobble of river vertices, in pixels
    pub river_wobble: f64,
    pub arrow_color: Color,
    pub sensor_fill: Color,
    pub sensor_stroke: Color,
    pub sensor_ring: Color,
    pub sensor_radius: f64,
    pub label_color: Color,
    pub legend_background: Color,
    pub legend_width: f64,
    pub legend_height: f64,
}

impl Default for SceneStyle {
    fn default() -> Self {
        Self {
            background: Color::rgb(0xf8, 0xfa, 0xfc),
            point_radius: 8.0,
            contour_color: Color::rgba_f(255, 255, 255, 0.5),
            contour_width: 1.0,
            river_color: Color::rgba_f(59, 130, 246, 0.8),
            river_width: 4.0,
            river_wobble: 5.0,
            arrow_color: Color::rgba_f(59, 130, 246, 0.6),
            sensor_fill: Color::WHITE,
            sensor_stroke: Color::rgb(0x3b, 0x82, 0xf6),
            sensor_ring: Color::rgba_f(59, 130, 246, 0.3),
            sensor_radius: 8.0,
            label_color: Color::rgb(0x1f, 0x29, 0x37),
            legend_background: Color::rgba_f(255, 255, 255, 0.9),
            legend_width: 200.0,
            legend_height: 20.0,
        }
    }
}

/// Everything one frame is drawn from.
#[derive(Debug, Clone, Copy)]
pub struct SceneConfig<'a> {
    pub layer: &'a ParameterLayer,
    pub grid: &'a SampleGrid,
    pub sensors: &'a [Sensor],
    pub show_contours: bool,
    pub show_sensors: bool,
    pub contour_method: ContourMethod,
    pub mapper: ColorMapper,
    pub style: &'a SceneStyle,
}

/// Marker pulse factor at time `t`, between 0.8 and 1.2.
pub fn pulse_factor(t: f64) -> f64 {
    1.0 + (t * 3.0).sin() * 0.2
}

/// Compose one frame sized to `viewport`.
///
/// Returns `None` when the viewport has no drawable area; the caller skips
/// the frame and tries again on the next tick.
pub fn render_frame(
    config: &SceneConfig<'_>,
    clock: &AnimationClock,
    viewport: Viewport,
) -> Option<Frame> {
    let (width, height) = viewport.pixel_size()?;
    let (w, h) = (width as f64, height as f64);
    let t = clock.t();
    let spec = config.grid.spec();
    let scale = Scale {
        x: w / spec.extent_width,
        y: h / spec.extent_height,
    };

    let mut commands = Vec::with_capacity(config.grid.len() + 32);

    commands.push(DrawCommand::FillRect {
        x: 0.0,
        y: 0.0,
        width: w,
        height: h,
        fill: Fill::Solid {
            color: config.style.background,
        },
    });

    draw_heatmap(&mut commands, config, &scale, t);

    if config.show_contours {
        draw_contours(&mut commands, config, &scale);
    }

    draw_river(&mut commands, config.style, w, h, t);

    if config.show_sensors {
        draw_sensors(&mut commands, config, &scale, t);
    }

    draw_legend(&mut commands, config, w, h);

    debug!(
        parameter = %config.layer.key,
        width,
        height,
        t,
        num_commands = commands.len(),
        "Composed frame"
    );

    Some(Frame {
        width,
        height,
        commands,
    })
}

/// Logical-to-pixel scale factors
struct Scale {
    x: f64,
    y: f64,
}

impl Scale {
    fn apply(&self, x: f64, y: f64) -> Point {
        Point::new(x * self.x, y * self.y)
    }
}

fn draw_heatmap(commands: &mut Vec<DrawCommand>, config: &SceneConfig<'_>, scale: &Scale, t: f64) {
    for point in config.grid.points() {
        commands.push(DrawCommand::FillCircle {
            center: scale.apply(point.x, point.y),
            radius: config.style.point_radius,
            color: config.mapper.point_color(point, config.layer, t),
        });
    }
}

fn draw_contours(commands: &mut Vec<DrawCommand>, config: &SceneConfig<'_>, scale: &Scale) {
    let levels = config.layer.iso_levels(ISO_LEVEL_COUNT);
    let segments = extract_with(config.contour_method, config.grid, &levels);
    if segments.is_empty() {
        return;
    }

    commands.push(DrawCommand::StrokeSegments {
        segments: segments
            .iter()
            .map(|s| (scale.apply(s.start.x, s.start.y), scale.apply(s.end.x, s.end.y)))
            .collect(),
        color: config.style.contour_color,
        line_width: config.style.contour_width,
    });
}

fn draw_river(commands: &mut Vec<DrawCommand>, style: &SceneStyle, w: f64, h: f64, t: f64) {
    let points = RIVER_PATH
        .iter()
        .enumerate()
        .map(|(i, &(rx, ry))| Point::new(rx * w, ry * h + (t + i as f64).sin() * style.river_wobble))
        .collect();

    commands.push(DrawCommand::StrokePolyline {
        points,
        color: style.river_color,
        line_width: style.river_width,
        round_cap: true,
    });

    // Flow arrows sit on the resting course, pointing downstream.
    for pair in RIVER_PATH.windows(2) {
        let origin = Point::new(pair[0].0 * w, pair[0].1 * h);
        let next = Point::new(pair[1].0 * w, pair[1].1 * h);
        let angle = (next.y - origin.y).atan2(next.x - origin.x);
        commands.push(DrawCommand::FillPolygon {
            points: arrow_head(origin, angle),
            color: style.arrow_color,
        });
    }
}

/// Triangle with its tip at `origin`, rotated by `angle`.
fn arrow_head(origin: Point, angle: f64) -> Vec<Point> {
    let (sin, cos) = angle.sin_cos();
    [(0.0, 0.0), (-10.0, -5.0), (-10.0, 5.0)]
        .iter()
        .map(|&(x, y)| Point::new(origin.x + x * cos - y * sin, origin.y + x * sin + y * cos))
        .collect()
}

fn draw_sensors(commands: &mut Vec<DrawCommand>, config: &SceneConfig<'_>, scale: &Scale, t: f64) {
    let style = config.style;
    let radius = style.sensor_radius * pulse_factor(t);

    for sensor in config.sensors {
        let center = scale.apply(sensor.x, sensor.y);

        commands.push(DrawCommand::FillCircle {
            center,
            radius,
            color: style.sensor_fill,
        });
        commands.push(DrawCommand::StrokeCircle {
            center,
            radius,
            color: style.sensor_stroke,
            line_width: 2.0,
        });
        commands.push(DrawCommand::StrokeCircle {
            center,
            radius: radius * 1.5,
            color: style.sensor_ring,
            line_width: 1.0,
        });
        commands.push(DrawCommand::Text {
            position: Point::new(center.x, center.y - 15.0),
            text: sensor.id.clone(),
            size: 10.0,
            color: style.label_color,
            align: TextAlign::Center,
        });
        if !sensor.label.is_empty() {
            commands.push(DrawCommand::Text {
                position: Point::new(center.x, center.y + style.sensor_radius * 3.0),
                text: sensor.label.clone(),
                size: 9.0,
                color: style.label_color,
                align: TextAlign::Center,
            });
        }
    }
}

fn draw_legend(commands: &mut Vec<DrawCommand>, config: &SceneConfig<'_>, w: f64, h: f64) {
    let style = config.style;
    let layer = config.layer;
    let x = w - style.legend_width - 20.0;
    let y = h - 60.0;

    commands.push(DrawCommand::FillRect {
        x: x - 10.0,
        y: y - 30.0,
        width: style.legend_width + 20.0,
        height: style.legend_height + 30.0,
        fill: Fill::Solid {
            color: style.legend_background,
        },
    });
    commands.push(DrawCommand::FillRect {
        x,
        y,
        width: style.legend_width,
        height: style.legend_height,
        fill: Fill::HorizontalGradient {
            x0: x,
            x1: x + style.legend_width,
            stops: legend_stops(&layer.gradient),
        },
    });

    let label = |position: Point, text: String, align: TextAlign| DrawCommand::Text {
        position,
        text,
        size: 12.0,
        color: style.label_color,
        align,
    };
    commands.push(label(
        Point::new(x, y - 5.0),
        format!("{}{}", layer.min, layer.unit),
        TextAlign::Left,
    ));
    commands.push(label(
        Point::new(x + style.legend_width, y - 5.0),
        format!("{}{}", layer.max, layer.unit),
        TextAlign::Right,
    ));
    commands.push(label(
        Point::new(x + style.legend_width / 2.0, y - 15.0),
        layer.name.clone(),
        TextAlign::Center,
    ));
}

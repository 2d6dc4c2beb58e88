//! Raster backend executing frames with tiny-skia.
//!
//! Shapes are drawn here; label glyphs are blended in by [`crate::text`].

use river_common::{Color, HeatmapResult};
use tiny_skia::{
    FillRule, GradientStop, LineCap, LineJoin, LinearGradient, Paint, PathBuilder, Pixmap, Rect,
    SpreadMode, Stroke, Transform,
};
use tracing::{debug, warn};

use crate::contour::Point;
use crate::png;
use crate::scene::{DrawCommand, Fill, Frame, Viewport};

/// A drawing target the heatmap view presents frames to.
pub trait Surface {
    /// Current bounding box of the hosting container.
    fn viewport(&self) -> Viewport;

    /// Draw a complete frame, replacing the previous contents.
    fn present(&mut self, frame: &Frame);
}

/// In-memory surface backed by a tiny-skia pixmap.
///
/// The pixmap is recreated at each frame's size, so resizing the container
/// takes effect on the next frame.
#[derive(Debug)]
pub struct PixmapSurface {
    viewport: Viewport,
    pixmap: Option<Pixmap>,
    frames_presented: u64,
}

impl PixmapSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            viewport: Viewport::new(width, height),
            pixmap: None,
            frames_presented: 0,
        }
    }

    /// Resize the container.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Contents of the last presented frame.
    pub fn pixmap(&self) -> Option<&Pixmap> {
        self.pixmap.as_ref()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Encode the last presented frame as PNG, `None` before the first frame.
    pub fn encode_png(&self) -> Option<HeatmapResult<Vec<u8>>> {
        self.pixmap.as_ref().map(png::encode_pixmap)
    }
}

impl Surface for PixmapSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn present(&mut self, frame: &Frame) {
        match rasterize(frame) {
            Some(pixmap) => {
                self.pixmap = Some(pixmap);
                self.frames_presented += 1;
            }
            None => warn!(
                width = frame.width,
                height = frame.height,
                "could not allocate pixmap, frame skipped"
            ),
        }
    }
}

/// Execute a frame's commands onto a new pixmap of the frame's size.
pub fn rasterize(frame: &Frame) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(frame.width, frame.height)?;
    pixmap.fill(tiny_skia::Color::TRANSPARENT);

    for command in &frame.commands {
        execute(&mut pixmap, command);
    }

    debug!(
        width = frame.width,
        height = frame.height,
        num_commands = frame.commands.len(),
        "Rasterized frame"
    );

    Some(pixmap)
}

fn to_skia(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn solid_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

fn stroke(width: f64, round_cap: bool) -> Stroke {
    Stroke {
        width: width as f32,
        line_cap: if round_cap { LineCap::Round } else { LineCap::Butt },
        line_join: LineJoin::Round,
        ..Stroke::default()
    }
}

fn execute(pixmap: &mut Pixmap, command: &DrawCommand) {
    match command {
        DrawCommand::FillRect {
            x,
            y,
            width,
            height,
            fill,
        } => {
            let Some(rect) = Rect::from_xywh(*x as f32, *y as f32, *width as f32, *height as f32)
            else {
                return;
            };
            let paint = fill_paint(fill);
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
        DrawCommand::FillCircle {
            center,
            radius,
            color,
        } => {
            if let Some(path) = PathBuilder::from_circle(center.x as f32, center.y as f32, *radius as f32) {
                pixmap.fill_path(&path, &solid_paint(*color), FillRule::Winding, Transform::identity(), None);
            }
        }
        DrawCommand::StrokeCircle {
            center,
            radius,
            color,
            line_width,
        } => {
            if let Some(path) = PathBuilder::from_circle(center.x as f32, center.y as f32, *radius as f32) {
                pixmap.stroke_path(
                    &path,
                    &solid_paint(*color),
                    &stroke(*line_width, false),
                    Transform::identity(),
                    None,
                );
            }
        }
        DrawCommand::StrokeSegments {
            segments,
            color,
            line_width,
        } => {
            let mut pb = PathBuilder::new();
            for (start, end) in segments {
                pb.move_to(start.x as f32, start.y as f32);
                pb.line_to(end.x as f32, end.y as f32);
            }
            if let Some(path) = pb.finish() {
                pixmap.stroke_path(
                    &path,
                    &solid_paint(*color),
                    &stroke(*line_width, false),
                    Transform::identity(),
                    None,
                );
            }
        }
        DrawCommand::StrokePolyline {
            points,
            color,
            line_width,
            round_cap,
        } => {
            if let Some(path) = polyline(points, false) {
                pixmap.stroke_path(
                    &path,
                    &solid_paint(*color),
                    &stroke(*line_width, *round_cap),
                    Transform::identity(),
                    None,
                );
            }
        }
        DrawCommand::FillPolygon { points, color } => {
            if let Some(path) = polyline(points, true) {
                pixmap.fill_path(&path, &solid_paint(*color), FillRule::Winding, Transform::identity(), None);
            }
        }
        DrawCommand::Text {
            position,
            text,
            size,
            color,
            align,
        } => crate::text::draw_text(pixmap, *position, text, *size as f32, *color, *align),
    }
}

fn fill_paint(fill: &Fill) -> Paint<'static> {
    match fill {
        Fill::Solid { color } => solid_paint(*color),
        Fill::HorizontalGradient { x0, x1, stops } => {
            let gradient_stops: Vec<GradientStop> = stops
                .iter()
                .map(|(offset, color)| GradientStop::new(*offset as f32, to_skia(*color)))
                .collect();
            let shader = LinearGradient::new(
                tiny_skia::Point::from_xy(*x0 as f32, 0.0),
                tiny_skia::Point::from_xy(*x1 as f32, 0.0),
                gradient_stops,
                SpreadMode::Pad,
                Transform::identity(),
            );
            match shader {
                Some(shader) => Paint {
                    shader,
                    anti_alias: true,
                    ..Paint::default()
                },
                // Degenerate gradient, e.g. zero width: first stop as solid
                None => solid_paint(stops.first().map(|(_, c)| *c).unwrap_or(Color::TRANSPARENT)),
            }
        }
    }
}

fn polyline(points: &[Point], close: bool) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    if close {
        pb.close();
    }
    pb.finish()
}

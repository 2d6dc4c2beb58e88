//! Animated heatmap rendering for river water-quality fields.
//!
//! Pipeline, leaf first:
//! - Field sampling (synthetic parameter plumes)
//! - Gradient color mapping
//! - Contour extraction
//! - Scene composition into drawing commands
//! - Animation loop and the hosting view
//! - Rasterization (tiny-skia, rusttype labels) and PNG encoding

pub mod animation;
pub mod contour;
pub mod field;
pub mod gradient;
pub mod png;
pub mod raster;
pub mod scene;
pub mod text;
pub mod view;

pub use animation::{AnimationClock, AnimationController, AnimationLoop, FrameHandle, FrameScheduler, HeadlessScheduler};
pub use contour::{ContourMethod, ContourSegment, Point};
pub use field::FieldSampler;
pub use gradient::{ColorMapper, GradientMode};
pub use raster::{PixmapSurface, Surface};
pub use scene::{render_frame, DrawCommand, Frame, SceneConfig, SceneStyle, Viewport};
pub use view::{FrameOutcome, HeatmapView, LayerInfo, ViewOptions};

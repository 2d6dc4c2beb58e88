//! Tests for the animation loop and the heatmap view lifecycle.

use std::cell::RefCell;
use std::rc::Rc;

use renderer::animation::{AnimationLoop, FrameHandle, FrameScheduler, HeadlessScheduler};
use renderer::raster::Surface;
use renderer::scene::{DrawCommand, Frame, SceneStyle, Viewport};
use renderer::view::{FrameOutcome, HeatmapView, ViewOptions};
use river_common::{Color, HeatmapError, ParameterCatalog, SensorNetwork};

// ============================================================================
// Helper functions
// ============================================================================

/// Surface that counts draw calls instead of rasterizing.
#[derive(Debug, Default)]
struct CountingSurface {
    viewport: Option<Viewport>,
    draws: usize,
    last_commands: usize,
    last_frame: Option<Frame>,
}

impl CountingSurface {
    fn sized(width: f64, height: f64) -> Self {
        Self {
            viewport: Some(Viewport::new(width, height)),
            ..Self::default()
        }
    }
}

impl Surface for CountingSurface {
    fn viewport(&self) -> Viewport {
        self.viewport.unwrap_or(Viewport::new(0.0, 0.0))
    }

    fn present(&mut self, frame: &Frame) {
        self.draws += 1;
        self.last_commands = frame.commands.len();
        self.last_frame = Some(frame.clone());
    }
}

/// Scheduler whose request log outlives the loop that owns it.
#[derive(Debug, Default, Clone)]
struct RecordingScheduler {
    log: Rc<RefCell<Vec<String>>>,
    next: u64,
}

impl FrameScheduler for RecordingScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next += 1;
        self.log.borrow_mut().push(format!("request {}", self.next));
        FrameHandle(self.next)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.log.borrow_mut().push(format!("cancel {}", handle.0));
    }
}

type TestView = HeatmapView<HeadlessScheduler, CountingSurface>;

fn view_with(options: ViewOptions) -> TestView {
    let mut view = HeatmapView::new(
        ParameterCatalog::builtin(),
        SensorNetwork::builtin(),
        options,
        HeadlessScheduler::new(),
        "pH",
    )
    .unwrap();
    view.attach_surface(CountingSurface::sized(800.0, 480.0));
    view
}

fn view() -> TestView {
    view_with(ViewOptions::default())
}

fn draws(view: &TestView) -> usize {
    view.surface().map(|s| s.draws).unwrap_or(0)
}

// ============================================================================
// Clock tests
// ============================================================================

#[test]
fn test_ticks_advance_by_step_times_speed() {
    let mut view = view_with(ViewOptions {
        speed_factor: 2.0,
        ..ViewOptions::default()
    });
    view.start();
    for _ in 0..5 {
        assert_eq!(view.pump(), 1);
    }
    assert!((view.t() - 0.1).abs() < 1e-9);
    assert_eq!(draws(&view), 5);
}

#[test]
fn test_zero_speed_freezes_time_but_keeps_drawing() {
    let mut view = view_with(ViewOptions {
        speed_factor: 0.0,
        ..ViewOptions::default()
    });
    view.start();
    for _ in 0..10 {
        view.pump();
    }
    assert_eq!(view.t(), 0.0);
    assert_eq!(draws(&view), 10);
    assert_eq!(view.frames_drawn(), 10);
}

#[test]
fn test_speed_factor_clamped_by_view() {
    let mut view = view();
    assert_eq!(view.set_speed_factor(10.0), 3.0);
    assert_eq!(view.set_speed_factor(-2.0), 0.0);
    assert_eq!(view.set_speed_factor(f64::NAN), 0.0);
}

#[test]
fn test_new_view_starts_at_zero() {
    let mut first = view();
    first.start();
    for _ in 0..3 {
        first.pump();
    }
    assert!(first.t() > 0.0);

    let second = view();
    assert_eq!(second.t(), 0.0);
    assert!(!second.is_running());
}

// ============================================================================
// Lifecycle tests
// ============================================================================

#[test]
fn test_not_started_draws_nothing() {
    let mut view = view();
    assert_eq!(view.pump(), 0);
    assert_eq!(draws(&view), 0);
}

#[test]
fn test_stop_halts_draw_calls() {
    let mut view = view();
    view.start();
    view.pump();
    view.pump();
    assert_eq!(draws(&view), 2);

    view.stop();
    assert!(!view.is_running());
    for _ in 0..5 {
        assert_eq!(view.pump(), 0);
    }
    assert_eq!(draws(&view), 2);
}

#[test]
fn test_stop_is_idempotent() {
    let mut view = view();
    view.start();
    view.stop();
    view.stop();
    assert_eq!(view.animation().scheduler().cancelled(), 1);
    assert_eq!(view.animation().scheduler().pending_count(), 0);
}

#[test]
fn test_start_twice_keeps_single_request() {
    let mut view = view();
    assert!(view.start());
    assert!(!view.start());
    assert_eq!(view.animation().scheduler().pending_count(), 1);
    assert_eq!(view.pump(), 1);
}

#[test]
fn test_restart_resumes_time() {
    let mut view = view();
    view.start();
    for _ in 0..4 {
        view.pump();
    }
    let before = view.t();

    view.stop();
    view.pump();
    assert_eq!(view.t(), before);

    view.start();
    view.pump();
    assert!((view.t() - (before + 0.01)).abs() < 1e-12);
}

#[test]
fn test_stale_handle_ignored() {
    let mut view = view();
    view.start();
    let stale = view.animation().controller().pending().unwrap();
    view.stop();

    assert_eq!(view.on_refresh(stale), FrameOutcome::Ignored);
    assert_eq!(view.on_refresh(FrameHandle(9_999)), FrameOutcome::Ignored);
    assert_eq!(draws(&view), 0);
    assert_eq!(view.t(), 0.0);
}

#[test]
fn test_superseded_handle_ignored() {
    let mut view = view();
    view.start();
    let first = view.animation().controller().pending().unwrap();
    assert_eq!(view.on_refresh(first), FrameOutcome::Drawn);
    // the loop moved on to a new request
    assert_eq!(view.on_refresh(first), FrameOutcome::Ignored);
    assert_eq!(draws(&view), 1);
}

#[test]
fn test_drop_cancels_pending_request() {
    let scheduler = RecordingScheduler::default();
    let log = Rc::clone(&scheduler.log);
    {
        let mut animation = AnimationLoop::new(scheduler);
        animation.start();
        assert!(animation.tick(FrameHandle(1), |_| {}));
    }
    assert_eq!(
        *log.borrow(),
        vec!["request 1".to_string(), "request 2".to_string(), "cancel 2".to_string()]
    );
}

#[test]
fn test_loop_pump_counts_ticks() {
    let mut animation = AnimationLoop::new(HeadlessScheduler::new());
    let mut seen = Vec::new();
    animation.start();
    for _ in 0..3 {
        animation.pump(|clock| seen.push(clock.t()));
    }
    assert_eq!(seen.len(), 3);
    assert!(seen.windows(2).all(|w| w[1] > w[0]));
}

// ============================================================================
// Surface tests
// ============================================================================

#[test]
fn test_detached_surface_skips_frames() {
    let mut view = view();
    let surface = view.detach_surface().unwrap();
    assert_eq!(surface.draws, 0);

    view.start();
    let handle = view.animation().controller().pending().unwrap();
    assert_eq!(view.on_refresh(handle), FrameOutcome::Skipped);
    assert!(view.is_running());
    assert_eq!(view.frames_skipped(), 1);

    view.attach_surface(surface);
    assert_eq!(view.pump(), 1);
    assert_eq!(draws(&view), 1);
}

#[test]
fn test_zero_sized_surface_skips_frames() {
    let mut view = view();
    view.attach_surface(CountingSurface::default());
    view.start();
    assert_eq!(view.pump(), 0);
    assert_eq!(draws(&view), 0);
    assert!(view.t() > 0.0);

    view.surface_mut().unwrap().viewport = Some(Viewport::new(320.0, 200.0));
    assert_eq!(view.pump(), 1);
}

#[test]
fn test_toggles_apply_on_next_frame() {
    let mut view = view();
    view.start();
    view.pump();
    let full = view.surface().unwrap().last_commands;

    view.set_show_contours(false);
    view.set_show_sensors(false);
    view.pump();
    let bare = view.surface().unwrap().last_commands;

    // contour path plus five commands per sensor
    assert_eq!(full - bare, 1 + 5 * 6);
}

#[test]
fn test_style_applies_on_next_frame() {
    let mut view = view();
    view.set_style(SceneStyle {
        background: Color::rgb(0, 0, 0),
        ..SceneStyle::default()
    });
    view.start();
    view.pump();

    let frame = view.surface().unwrap().last_frame.clone().unwrap();
    match &frame.commands[0] {
        DrawCommand::FillRect { fill, .. } => {
            assert_eq!(serde_json::to_value(fill).unwrap()["color"], "#000000");
        }
        other => panic!("unexpected first command {:?}", other),
    }
}

// ============================================================================
// Parameter switching tests
// ============================================================================

#[test]
fn test_select_parameter_keeps_time_and_running() {
    let mut view = view();
    view.start();
    for _ in 0..3 {
        view.pump();
    }
    let t = view.t();

    view.select_parameter("turbidity").unwrap();
    assert_eq!(view.layer().key, "turbidity");
    assert_eq!(view.grid().parameter(), "turbidity");
    assert_eq!(view.t(), t);
    assert!(view.is_running());
    assert_eq!(view.animation().scheduler().pending_count(), 1);

    assert_eq!(view.pump(), 1);
}

#[test]
fn test_select_parameter_while_stopped_stays_stopped() {
    let mut view = view();
    view.select_parameter("DO").unwrap();
    assert!(!view.is_running());
    assert_eq!(view.pump(), 0);
}

#[test]
fn test_unknown_parameter_keeps_previous_layer() {
    let mut view = view();
    view.start();
    let err = view.select_parameter("salinity").unwrap_err();
    assert!(matches!(err, HeatmapError::UnknownParameter(ref key) if key == "salinity"));
    assert_eq!(view.layer().key, "pH");
    assert_eq!(view.grid().parameter(), "pH");
    assert!(view.is_running());
}

#[test]
fn test_unknown_initial_parameter_fails() {
    let result = HeatmapView::<HeadlessScheduler, CountingSurface>::new(
        ParameterCatalog::builtin(),
        SensorNetwork::builtin(),
        ViewOptions::default(),
        HeadlessScheduler::new(),
        "salinity",
    );
    assert!(matches!(result, Err(HeatmapError::UnknownParameter(_))));
}

#[test]
fn test_layer_info() {
    let mut view = view();
    view.select_parameter("temperature").unwrap();
    let info = view.layer_info();
    assert_eq!(info.key, "temperature");
    assert_eq!(info.name, "Temperature");
    assert_eq!(info.unit, "°C");
    assert_eq!((info.min, info.max), (25.0, 35.0));
    assert_eq!(info.data_points, 1500);
    assert_eq!(info.range, view.layer().range_label());
}

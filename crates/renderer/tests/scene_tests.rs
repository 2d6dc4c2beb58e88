//! Tests for frame composition.

use renderer::animation::AnimationClock;
use renderer::contour::{ContourMethod, Point};
use renderer::field::FieldSampler;
use renderer::gradient::ColorMapper;
use renderer::scene::{pulse_factor, render_frame, DrawCommand, Fill, SceneConfig, SceneStyle, TextAlign, Viewport};
use river_common::{ParameterCatalog, ParameterLayer, SampleGrid, Sensor, SensorNetwork};

// ============================================================================
// Helper functions
// ============================================================================

struct Fixture {
    layer: ParameterLayer,
    grid: SampleGrid,
    sensors: SensorNetwork,
    style: SceneStyle,
}

impl Fixture {
    fn new(parameter: &str) -> Self {
        let sampler = FieldSampler::new(ParameterCatalog::builtin());
        Self {
            layer: sampler.catalog().get(parameter).unwrap().clone(),
            grid: sampler.generate(parameter, 50, 30).unwrap(),
            sensors: SensorNetwork::builtin(),
            style: SceneStyle::default(),
        }
    }

    fn config(&self, show_contours: bool, show_sensors: bool) -> SceneConfig<'_> {
        SceneConfig {
            layer: &self.layer,
            grid: &self.grid,
            sensors: self.sensors.sensors(),
            show_contours,
            show_sensors,
            contour_method: ContourMethod::Sequential,
            mapper: ColorMapper::default(),
            style: &self.style,
        }
    }
}

fn op_name(command: &DrawCommand) -> &'static str {
    match command {
        DrawCommand::FillRect { .. } => "fill_rect",
        DrawCommand::FillCircle { .. } => "fill_circle",
        DrawCommand::StrokeCircle { .. } => "stroke_circle",
        DrawCommand::StrokeSegments { .. } => "stroke_segments",
        DrawCommand::StrokePolyline { .. } => "stroke_polyline",
        DrawCommand::FillPolygon { .. } => "fill_polygon",
        DrawCommand::Text { .. } => "text",
    }
}

fn texts(commands: &[DrawCommand]) -> Vec<&str> {
    commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

fn viewport() -> Viewport {
    Viewport::new(800.0, 480.0)
}

// ============================================================================
// Ordering tests
// ============================================================================

#[test]
fn test_layer_order() {
    let fixture = Fixture::new("pH");
    let frame = render_frame(&fixture.config(true, true), &AnimationClock::new(), viewport()).unwrap();
    let ops: Vec<&str> = frame.commands.iter().map(op_name).collect();

    // background first
    assert_eq!(ops[0], "fill_rect");
    match &frame.commands[0] {
        DrawCommand::FillRect { width, height, fill, .. } => {
            assert_eq!((*width, *height), (800.0, 480.0));
            assert_eq!(*fill, Fill::Solid { color: fixture.style.background });
        }
        other => panic!("unexpected first command {:?}", other),
    }

    // one marker per sample
    let heat_end = 1 + fixture.grid.len();
    assert!(ops[1..heat_end].iter().all(|&op| op == "fill_circle"));

    // contours, then river with its four arrows
    assert_eq!(ops[heat_end], "stroke_segments");
    assert_eq!(ops[heat_end + 1], "stroke_polyline");
    assert!(ops[heat_end + 2..heat_end + 6].iter().all(|&op| op == "fill_polygon"));

    // five commands per labelled sensor
    let sensors_start = heat_end + 6;
    let sensors_end = sensors_start + 5 * fixture.sensors.len();
    assert_eq!(
        &ops[sensors_start..sensors_start + 5],
        &["fill_circle", "stroke_circle", "stroke_circle", "text", "text"]
    );

    // legend last
    assert_eq!(
        &ops[sensors_end..],
        &["fill_rect", "fill_rect", "text", "text", "text"]
    );
}

#[test]
fn test_contour_toggle() {
    let fixture = Fixture::new("pH");
    let clock = AnimationClock::new();
    let with = render_frame(&fixture.config(true, true), &clock, viewport()).unwrap();
    let without = render_frame(&fixture.config(false, true), &clock, viewport()).unwrap();

    assert_eq!(with.commands.len(), without.commands.len() + 1);
    assert!(!without.commands.iter().any(|c| op_name(c) == "stroke_segments"));
}

#[test]
fn test_sensor_toggle() {
    let fixture = Fixture::new("temperature");
    let clock = AnimationClock::new();
    let frame = render_frame(&fixture.config(true, false), &clock, viewport()).unwrap();

    assert!(!frame.commands.iter().any(|c| op_name(c) == "stroke_circle"));
    let labels = texts(&frame.commands);
    assert!(!labels.contains(&"MR-001"));
    // legend labels remain
    assert_eq!(labels.len(), 3);
}

#[test]
fn test_zero_viewport_yields_no_frame() {
    let fixture = Fixture::new("pH");
    let clock = AnimationClock::new();
    let config = fixture.config(true, true);
    assert!(render_frame(&config, &clock, Viewport::new(0.0, 480.0)).is_none());
    assert!(render_frame(&config, &clock, Viewport::new(800.0, 0.0)).is_none());
    assert!(render_frame(&config, &clock, Viewport::new(f64::NAN, 10.0)).is_none());
}

#[test]
fn test_frame_sized_to_viewport() {
    let fixture = Fixture::new("DO");
    let frame = render_frame(
        &fixture.config(false, false),
        &AnimationClock::new(),
        Viewport::new(1000.5, 600.9),
    )
    .unwrap();
    assert_eq!((frame.width, frame.height), (1000, 600));

    // the last sample of a 500x300 extent scales by 2
    let last = fixture.grid.points().last().unwrap();
    match &frame.commands[fixture.grid.len()] {
        DrawCommand::FillCircle { center, radius, .. } => {
            assert_eq!(*center, Point::new(last.x * 2.0, last.y * 2.0));
            assert_eq!(*radius, 8.0);
        }
        other => panic!("unexpected command {:?}", other),
    }
}

// ============================================================================
// Animation tests
// ============================================================================

#[test]
fn test_pulse_factor_range() {
    assert_eq!(pulse_factor(0.0), 1.0);
    let peak = std::f64::consts::FRAC_PI_2 / 3.0;
    assert!((pulse_factor(peak) - 1.2).abs() < 1e-12);
    for k in 0..1000 {
        let p = pulse_factor(k as f64 * 0.01);
        assert!((0.8 - 1e-12..=1.2 + 1e-12).contains(&p));
    }
}

#[test]
fn test_sensor_marker_pulses_with_time() {
    let fixture = Fixture::new("pH");
    let t = std::f64::consts::FRAC_PI_2 / 3.0;
    let frame = render_frame(&fixture.config(false, true), &AnimationClock::starting_at(t), viewport()).unwrap();

    let radii: Vec<f64> = frame
        .commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::StrokeCircle { radius, .. } => Some(*radius),
            _ => None,
        })
        .take(2)
        .collect();
    let expected = 8.0 * pulse_factor(t);
    assert!((radii[0] - expected).abs() < 1e-12);
    assert!((radii[1] - expected * 1.5).abs() < 1e-12);
}

#[test]
fn test_river_wobbles_but_arrows_hold_still() {
    let fixture = Fixture::new("pH");
    let config = fixture.config(false, false);
    let a = render_frame(&config, &AnimationClock::new(), viewport()).unwrap();
    let b = render_frame(&config, &AnimationClock::starting_at(1.0), viewport()).unwrap();

    let river = |frame: &renderer::Frame| {
        frame
            .commands
            .iter()
            .find_map(|c| match c {
                DrawCommand::StrokePolyline { points, .. } => Some(points.clone()),
                _ => None,
            })
            .unwrap()
    };
    let arrows = |frame: &renderer::Frame| {
        frame
            .commands
            .iter()
            .filter(|c| op_name(c) == "fill_polygon")
            .cloned()
            .collect::<Vec<_>>()
    };

    let (ra, rb) = (river(&a), river(&b));
    assert_eq!(ra.len(), 5);
    assert_ne!(ra, rb);
    for (p, q) in ra.iter().zip(&rb) {
        assert_eq!(p.x, q.x);
        assert!((p.y - q.y).abs() <= 10.0);
    }
    assert_eq!(arrows(&a), arrows(&b));
}

// ============================================================================
// Labels and legend tests
// ============================================================================

#[test]
fn test_sensor_labels() {
    let fixture = Fixture::new("pH");
    let frame = render_frame(&fixture.config(false, true), &AnimationClock::new(), viewport()).unwrap();
    let labels = texts(&frame.commands);
    for sensor in fixture.sensors.sensors() {
        assert!(labels.contains(&sensor.id.as_str()));
        assert!(labels.contains(&sensor.label.as_str()));
    }
}

#[test]
fn test_unlabelled_sensor_draws_id_only() {
    let fixture = Fixture::new("pH");
    let sensors = [Sensor::new("S-1", 100.0, 100.0, "")];
    let config = SceneConfig {
        sensors: &sensors,
        ..fixture.config(false, true)
    };
    let frame = render_frame(&config, &AnimationClock::new(), viewport()).unwrap();
    // id plus three legend labels
    assert_eq!(texts(&frame.commands), vec!["S-1", "6", "8.5", "pH Levels"]);
}

#[test]
fn test_legend_labels_and_placement() {
    let fixture = Fixture::new("temperature");
    let frame = render_frame(&fixture.config(false, false), &AnimationClock::new(), viewport()).unwrap();

    let legend: Vec<&DrawCommand> = frame.commands.iter().rev().take(5).collect();
    match legend[4] {
        DrawCommand::FillRect { .. } => {}
        other => panic!("expected legend background, got {:?}", other),
    }
    match legend[3] {
        DrawCommand::FillRect { x, y, width, height, fill } => {
            assert_eq!((*x, *y, *width, *height), (580.0, 420.0, 200.0, 20.0));
            match fill {
                Fill::HorizontalGradient { x0, x1, stops } => {
                    assert_eq!((*x0, *x1), (580.0, 780.0));
                    assert_eq!(stops.len(), fixture.layer.gradient.len());
                }
                other => panic!("expected gradient fill, got {:?}", other),
            }
        }
        other => panic!("expected legend bar, got {:?}", other),
    }

    let aligned: Vec<(&str, TextAlign)> = legend[..3]
        .iter()
        .rev()
        .filter_map(|c| match c {
            DrawCommand::Text { text, align, .. } => Some((text.as_str(), *align)),
            _ => None,
        })
        .collect();
    assert_eq!(
        aligned,
        vec![
            ("25°C", TextAlign::Left),
            ("35°C", TextAlign::Right),
            ("Temperature", TextAlign::Center),
        ]
    );
}

#[test]
fn test_commands_serialize_with_op_tag() {
    let fixture = Fixture::new("pH");
    let frame = render_frame(&fixture.config(false, false), &AnimationClock::new(), viewport()).unwrap();
    let json = serde_json::to_value(&frame.commands[0]).unwrap();
    assert_eq!(json["op"], "fill_rect");
    assert_eq!(json["fill"]["type"], "solid");
    assert_eq!(json["fill"]["color"], "#f8fafc");
}

//! The hosting pairing of animation loop, compositor and surface.
//!
//! A [`HeatmapView`] holds the UI-selected state (active parameter, toggles,
//! speed) and turns each refresh callback into at most one presented frame.

use river_common::{
    Color, GridSpec, HeatmapResult, ParameterCatalog, ParameterLayer, SampleGrid, SensorNetwork,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::animation::{AnimationController, AnimationLoop, FrameHandle, FrameScheduler, HeadlessScheduler};
use crate::contour::ContourMethod;
use crate::field::FieldSampler;
use crate::gradient::{ColorMapper, GradientMode};
use crate::raster::Surface;
use crate::scene::{render_frame, SceneConfig, SceneStyle};

/// Initial UI state of a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewOptions {
    pub show_contours: bool,
    pub show_sensors: bool,
    pub speed_factor: f64,
    pub contour_method: ContourMethod,
    pub gradient_mode: GradientMode,
    pub grid: GridSpec,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            show_contours: true,
            show_sensors: true,
            speed_factor: 1.0,
            contour_method: ContourMethod::default(),
            gradient_mode: GradientMode::default(),
            grid: GridSpec::default(),
        }
    }
}

/// Summary of the active layer for an info panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerInfo {
    pub key: String,
    pub name: String,
    pub unit: String,
    pub min: f64,
    pub max: f64,
    pub range: String,
    pub accent: Color,
    pub data_points: usize,
}

/// What happened to one refresh callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A frame was composed and presented
    Drawn,
    /// The tick ran but there was nothing to draw into
    Skipped,
    /// The callback was stale or cancelled
    Ignored,
}

/// Animated heatmap for one selected parameter.
pub struct HeatmapView<S: FrameScheduler, D: Surface> {
    sampler: FieldSampler,
    sensors: SensorNetwork,
    grid_spec: GridSpec,
    layer: ParameterLayer,
    grid: SampleGrid,
    show_contours: bool,
    show_sensors: bool,
    contour_method: ContourMethod,
    mapper: ColorMapper,
    style: SceneStyle,
    animation: AnimationLoop<S>,
    surface: Option<D>,
    frames_drawn: u64,
    frames_skipped: u64,
}

impl<S: FrameScheduler, D: Surface> HeatmapView<S, D> {
    /// Build a view with `parameter` active. The loop is not started.
    ///
    /// Fails for unknown parameters, invalid grids and sensors outside the
    /// grid's extent.
    pub fn new(
        catalog: ParameterCatalog,
        sensors: SensorNetwork,
        options: ViewOptions,
        scheduler: S,
        parameter: &str,
    ) -> HeatmapResult<Self> {
        options.grid.validate()?;
        sensors.validate(&options.grid)?;

        let sampler = FieldSampler::with_extent(
            catalog,
            options.grid.extent_width,
            options.grid.extent_height,
        );
        let layer = sampler.catalog().get(parameter)?.clone();
        let grid = sampler.generate(parameter, options.grid.nx, options.grid.ny)?;

        let controller = AnimationController::with_speed_factor(options.speed_factor);

        info!(
            parameter,
            layers = sampler.catalog().len(),
            sensors = sensors.len(),
            nx = options.grid.nx,
            ny = options.grid.ny,
            "Created heatmap view"
        );

        Ok(Self {
            sampler,
            sensors,
            grid_spec: options.grid,
            layer,
            grid,
            show_contours: options.show_contours,
            show_sensors: options.show_sensors,
            contour_method: options.contour_method,
            mapper: ColorMapper::new(options.gradient_mode),
            style: SceneStyle::default(),
            animation: AnimationLoop::with_controller(scheduler, controller),
            surface: None,
            frames_drawn: 0,
            frames_skipped: 0,
        })
    }

    /// Switch the active parameter.
    ///
    /// The pending tick is cancelled, the grid regenerated and the loop
    /// resumed if it was running; `t` carries over. On error the previous
    /// selection stays active.
    pub fn select_parameter(&mut self, key: &str) -> HeatmapResult<()> {
        let layer = self.sampler.catalog().get(key)?.clone();
        let grid = self.sampler.generate(key, self.grid_spec.nx, self.grid_spec.ny)?;

        let was_running = self.animation.is_running();
        self.animation.stop();
        self.layer = layer;
        self.grid = grid;
        if was_running {
            self.animation.start();
        }

        info!(parameter = key, t = self.t(), "Switched parameter layer");
        Ok(())
    }

    pub fn start(&mut self) -> bool {
        self.animation.start()
    }

    pub fn stop(&mut self) {
        self.animation.stop();
    }

    pub fn is_running(&self) -> bool {
        self.animation.is_running()
    }

    pub fn t(&self) -> f64 {
        self.animation.clock().t()
    }

    pub fn set_show_contours(&mut self, show: bool) {
        self.show_contours = show;
    }

    pub fn set_show_sensors(&mut self, show: bool) {
        self.show_sensors = show;
    }

    /// Returns the effective (clamped) speed factor.
    pub fn set_speed_factor(&mut self, speed_factor: f64) -> f64 {
        self.animation.controller_mut().set_speed_factor(speed_factor)
    }

    pub fn set_gradient_mode(&mut self, mode: GradientMode) {
        self.mapper.mode = mode;
    }

    pub fn set_contour_method(&mut self, method: ContourMethod) {
        self.contour_method = method;
    }

    pub fn set_style(&mut self, style: SceneStyle) {
        self.style = style;
    }

    /// Mount a drawing surface, returning the previous one.
    pub fn attach_surface(&mut self, surface: D) -> Option<D> {
        self.surface.replace(surface)
    }

    /// Unmount the surface. Later ticks are skipped until one is attached.
    pub fn detach_surface(&mut self) -> Option<D> {
        self.surface.take()
    }

    pub fn surface(&self) -> Option<&D> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut D> {
        self.surface.as_mut()
    }

    pub fn layer(&self) -> &ParameterLayer {
        &self.layer
    }

    pub fn grid(&self) -> &SampleGrid {
        &self.grid
    }

    pub fn catalog(&self) -> &ParameterCatalog {
        self.sampler.catalog()
    }

    pub fn animation(&self) -> &AnimationLoop<S> {
        &self.animation
    }

    pub fn animation_mut(&mut self) -> &mut AnimationLoop<S> {
        &mut self.animation
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }

    pub fn layer_info(&self) -> LayerInfo {
        LayerInfo {
            key: self.layer.key.clone(),
            name: self.layer.name.clone(),
            unit: self.layer.unit.clone(),
            min: self.layer.min,
            max: self.layer.max,
            range: self.layer.range_label(),
            accent: self.layer.accent,
            data_points: self.grid.len(),
        }
    }

    /// Handle one refresh callback from the scheduler.
    ///
    /// A missing or zero-sized surface skips the frame without error; the
    /// next tick tries again.
    pub fn on_refresh(&mut self, handle: FrameHandle) -> FrameOutcome {
        let HeatmapView {
            layer,
            grid,
            sensors,
            show_contours,
            show_sensors,
            contour_method,
            mapper,
            style,
            animation,
            surface,
            ..
        } = self;

        let mut outcome = FrameOutcome::Skipped;
        let ran = animation.tick(handle, |clock| {
            let Some(surface) = surface.as_mut() else {
                debug!(t = clock.t(), "no surface attached, frame skipped");
                return;
            };
            let config = SceneConfig {
                layer,
                grid,
                sensors: sensors.sensors(),
                show_contours: *show_contours,
                show_sensors: *show_sensors,
                contour_method: *contour_method,
                mapper: *mapper,
                style,
            };
            match render_frame(&config, clock, surface.viewport()) {
                Some(frame) => {
                    surface.present(&frame);
                    outcome = FrameOutcome::Drawn;
                }
                None => debug!(t = clock.t(), "surface has no area, frame skipped"),
            }
        });

        if !ran {
            return FrameOutcome::Ignored;
        }
        match outcome {
            FrameOutcome::Drawn => self.frames_drawn += 1,
            _ => self.frames_skipped += 1,
        }
        outcome
    }
}

impl<D: Surface> HeatmapView<HeadlessScheduler, D> {
    /// Advance the headless refresh clock once and handle due callbacks.
    ///
    /// Returns how many frames were presented.
    pub fn pump(&mut self) -> usize {
        let due = self.animation.scheduler_mut().advance();
        due.into_iter()
            .filter(|&handle| self.on_refresh(handle) == FrameOutcome::Drawn)
            .count()
    }
}

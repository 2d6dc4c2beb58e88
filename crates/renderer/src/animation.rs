//! Frame-driven animation clock and loop.
//!
//! The loop is single-threaded and cooperative: every tick is requested from
//! a [`FrameScheduler`] (the platform's display-refresh callback) and runs
//! one synchronous frame before the next tick is requested. At most one
//! request is pending at a time.

use tracing::{debug, trace, warn};

/// Clock advance per tick at speed factor 1.
pub const DEFAULT_STEP: f64 = 0.01;
/// Upper bound of the user-facing speed control.
pub const MAX_SPEED_FACTOR: f64 = 3.0;

/// Monotonic time accumulator driving all per-frame modulation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnimationClock {
    t: f64,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock starting at `t`; negative or non-finite starts at 0.
    pub fn starting_at(t: f64) -> Self {
        Self {
            t: if t.is_finite() && t > 0.0 { t } else { 0.0 },
        }
    }

    pub fn t(&self) -> f64 {
        self.t
    }

    /// Move forward by `delta`. Non-positive or non-finite deltas are ignored
    /// so `t` never decreases.
    pub fn advance(&mut self, delta: f64) {
        if delta.is_finite() && delta > 0.0 {
            self.t += delta;
        }
    }
}

/// Identifier of one requested refresh callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Source of display-refresh callbacks.
///
/// `request_frame` asks for one callback on the next refresh; the platform
/// later reports it by calling [`AnimationLoop::tick`] with the handle.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Owned animation state: clock, speed and the pending request.
#[derive(Debug, Clone)]
pub struct AnimationController {
    clock: AnimationClock,
    speed_factor: f64,
    step: f64,
    pending: Option<FrameHandle>,
}

impl Default for AnimationController {
    fn default() -> Self {
        Self {
            clock: AnimationClock::new(),
            speed_factor: 1.0,
            step: DEFAULT_STEP,
            pending: None,
        }
    }
}

impl AnimationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_speed_factor(speed_factor: f64) -> Self {
        let mut controller = Self::default();
        controller.set_speed_factor(speed_factor);
        controller
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    pub fn t(&self) -> f64 {
        self.clock.t()
    }

    pub fn speed_factor(&self) -> f64 {
        self.speed_factor
    }

    /// Set the speed, clamped to `[0, MAX_SPEED_FACTOR]`. NaN is ignored.
    ///
    /// Returns the effective speed factor.
    pub fn set_speed_factor(&mut self, speed_factor: f64) -> f64 {
        if speed_factor.is_nan() {
            warn!("ignoring NaN speed factor");
            return self.speed_factor;
        }
        let clamped = speed_factor.clamp(0.0, MAX_SPEED_FACTOR);
        if clamped != speed_factor {
            warn!(requested = speed_factor, clamped, "speed factor clamped");
        }
        self.speed_factor = clamped;
        clamped
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Advance the clock by one tick's worth of time.
    fn advance(&mut self) -> f64 {
        self.clock.advance(self.step * self.speed_factor);
        self.clock.t()
    }
}

/// Drives frames from a scheduler, one at a time.
#[derive(Debug)]
pub struct AnimationLoop<S: FrameScheduler> {
    scheduler: S,
    controller: AnimationController,
}

impl<S: FrameScheduler> AnimationLoop<S> {
    pub fn new(scheduler: S) -> Self {
        Self::with_controller(scheduler, AnimationController::new())
    }

    pub fn with_controller(scheduler: S, controller: AnimationController) -> Self {
        Self {
            scheduler,
            controller,
        }
    }

    /// Request the first tick. Resumes with the current `t`.
    ///
    /// Returns false when a tick is already pending.
    pub fn start(&mut self) -> bool {
        if self.controller.pending.is_some() {
            return false;
        }
        let handle = self.scheduler.request_frame();
        self.controller.pending = Some(handle);
        debug!(t = self.controller.t(), "Animation started");
        true
    }

    /// Cancel the pending tick, if any. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(handle) = self.controller.pending.take() {
            self.scheduler.cancel_frame(handle);
            debug!(t = self.controller.t(), "Animation stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    /// Handle a fired refresh callback.
    ///
    /// Callbacks for cancelled or superseded handles are ignored. Otherwise
    /// the clock advances, `on_frame` runs once and the next tick is
    /// requested. Returns whether `on_frame` ran.
    pub fn tick<F>(&mut self, fired: FrameHandle, on_frame: F) -> bool
    where
        F: FnOnce(&AnimationClock),
    {
        if self.controller.pending != Some(fired) {
            trace!(handle = fired.0, "ignoring stale frame callback");
            return false;
        }
        self.controller.pending = None;

        self.controller.advance();
        on_frame(&self.controller.clock);

        self.controller.pending = Some(self.scheduler.request_frame());
        true
    }

    pub fn controller(&self) -> &AnimationController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut AnimationController {
        &mut self.controller
    }

    pub fn clock(&self) -> &AnimationClock {
        self.controller.clock()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}

impl<S: FrameScheduler> Drop for AnimationLoop<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Manually advanced refresh clock for headless hosts and tests.
#[derive(Debug, Default)]
pub struct HeadlessScheduler {
    next_id: u64,
    pending: Vec<FrameHandle>,
    refreshes: u64,
    cancelled: u64,
}

impl HeadlessScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// One display refresh: returns every callback due now.
    pub fn advance(&mut self) -> Vec<FrameHandle> {
        self.refreshes += 1;
        std::mem::take(&mut self.pending)
    }

    /// Callbacks waiting for the next refresh.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }
}

impl FrameScheduler for HeadlessScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let before = self.pending.len();
        self.pending.retain(|&h| h != handle);
        if self.pending.len() != before {
            self.cancelled += 1;
        }
    }
}

impl AnimationLoop<HeadlessScheduler> {
    /// Advance the headless refresh clock once and run the due ticks.
    ///
    /// Returns how many frames ran.
    pub fn pump<F>(&mut self, mut on_frame: F) -> usize
    where
        F: FnMut(&AnimationClock),
    {
        let due = self.scheduler.advance();
        let mut ran = 0;
        for handle in due {
            if self.tick(handle, &mut on_frame) {
                ran += 1;
            }
        }
        ran
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_never_decreases() {
        let mut clock = AnimationClock::starting_at(1.0);
        clock.advance(-0.5);
        clock.advance(f64::NAN);
        assert_eq!(clock.t(), 1.0);
        clock.advance(0.25);
        assert_eq!(clock.t(), 1.25);
    }

    #[test]
    fn test_speed_factor_clamped() {
        let mut controller = AnimationController::new();
        assert_eq!(controller.set_speed_factor(5.0), 3.0);
        assert_eq!(controller.set_speed_factor(-1.0), 0.0);
        assert_eq!(controller.set_speed_factor(f64::NAN), 0.0);
        assert_eq!(controller.set_speed_factor(1.5), 1.5);
    }
}

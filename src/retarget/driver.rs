//! Frame driver
//!
//! Sequences one display refresh: pull the feed, run the retarget cycle, size
//! the video backdrop, render.

use serde::Serialize;

use super::cycle::{FrameOutcome, RetargetCycle};
use crate::output::Renderer;
use crate::tracking::{Detector, VideoSource};

/// Callback invoked once per display refresh
pub trait FrameTick {
    fn tick(&mut self, timestamp_ms: f64);
}

/// Backdrop plane size in scene units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VideoPlane {
    pub width: f32,
    pub height: f32,
}

impl VideoPlane {
    pub fn from_dimensions(dimensions: (u32, u32), pixels_per_unit: f32) -> Self {
        Self {
            width: dimensions.0 as f32 / pixels_per_unit,
            height: dimensions.1 as f32 / pixels_per_unit,
        }
    }
}

pub struct FrameDriver<S, R> {
    cycle: RetargetCycle,
    tracker: S,
    renderer: R,
    pixels_per_unit: f32,
    last_outcome: Option<FrameOutcome>,
}

impl<S, R> FrameDriver<S, R>
where
    S: VideoSource + Detector,
    R: Renderer,
{
    pub fn new(cycle: RetargetCycle, tracker: S, renderer: R, pixels_per_unit: f32) -> Self {
        Self {
            cycle,
            tracker,
            renderer,
            pixels_per_unit,
            last_outcome: None,
        }
    }

    pub fn cycle(&self) -> &RetargetCycle {
        &self.cycle
    }

    pub fn tracker(&self) -> &S {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut S {
        &mut self.tracker
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Outcome of the most recent tick
    pub fn last_outcome(&self) -> Option<&FrameOutcome> {
        self.last_outcome.as_ref()
    }

    /// Give back the tracker and renderer
    pub fn into_parts(self) -> (RetargetCycle, S, R) {
        (self.cycle, self.tracker, self.renderer)
    }
}

impl<S, R> FrameTick for FrameDriver<S, R>
where
    S: VideoSource + Detector,
    R: Renderer,
{
    fn tick(&mut self, timestamp_ms: f64) {
        self.tracker.refresh();

        let outcome = self.cycle.run_frame(&mut self.tracker, timestamp_ms);
        let plane = VideoPlane::from_dimensions(self.tracker.dimensions(), self.pixels_per_unit);

        self.renderer.render_frame(self.cycle.rig(), plane);
        self.last_outcome = Some(outcome);
    }
}

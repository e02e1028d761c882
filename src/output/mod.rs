//! Output module
//!
//! Renderers consume the rig after each frame has been applied:
//! - JSON lines snapshots on any writer (stdout in the binary)
//! - Tracing-only output for headless runs

use serde::Serialize;
use std::io::Write;

use crate::retarget::VideoPlane;
use crate::rig::{RigSnapshot, RigState};

/// Consumer of the rig once per frame. Only ever sees a settled rig.
pub trait Renderer {
    fn render_frame(&mut self, rig: &RigState, plane: VideoPlane);
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render_frame(&mut self, rig: &RigState, plane: VideoPlane) {
        (**self).render_frame(rig, plane)
    }
}

/// One output line
#[derive(Debug, Serialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub video_plane: VideoPlane,
    pub rig: RigSnapshot,
}

/// Writes one JSON object per frame, newline separated
pub struct JsonLinesRenderer<W: Write> {
    writer: W,
    frame: u64,
    failed: bool,
}

impl<W: Write> JsonLinesRenderer<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            frame: 0,
            failed: false,
        }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frame
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_snapshot(&mut self, snapshot: &FrameSnapshot) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, snapshot)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

impl<W: Write> Renderer for JsonLinesRenderer<W> {
    fn render_frame(&mut self, rig: &RigState, plane: VideoPlane) {
        let snapshot = FrameSnapshot {
            frame: self.frame,
            video_plane: plane,
            rig: rig.snapshot(),
        };
        self.frame += 1;

        if let Err(e) = self.write_snapshot(&snapshot) {
            // A closed pipe would otherwise log every frame
            if !self.failed {
                tracing::warn!("Failed to write frame snapshot: {}", e);
                self.failed = true;
            }
        }
    }
}

/// Logs head and eye rotations at DEBUG and a heartbeat at INFO
pub struct TraceRenderer {
    frame: u64,
    heartbeat_every: u64,
}

impl TraceRenderer {
    pub fn new(heartbeat_every: u64) -> Self {
        Self {
            frame: 0,
            heartbeat_every: heartbeat_every.max(1),
        }
    }
}

impl Renderer for TraceRenderer {
    fn render_frame(&mut self, rig: &RigState, plane: VideoPlane) {
        self.frame += 1;

        tracing::debug!(
            "head={:?} eyeL={:?} eyeR={:?} plane={}x{}",
            rig.head().rotation(),
            rig.left_eye().rotation(),
            rig.right_eye().rotation(),
            plane.width,
            plane.height
        );

        if self.frame % self.heartbeat_every == 0 {
            tracing::info!("Rendered {} frames", self.frame);
        }
    }
}

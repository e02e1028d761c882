//! MediaPipe face tracking receiver
//!
//! Receives JSON-over-UDP packets from a Face Landmarker helper running in
//! video mode with `numFaces = 1`, blendshapes and facial transformation
//! matrices enabled. The helper owns the camera; this side sees the frame
//! size, the detection and any camera error it reports.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::UdpSocket;
use std::time::{Duration, Instant};

use super::{DetectionResult, Detector, ReadyState, VideoFrame, VideoSource};
use crate::config::MediaPipeConfig;
use crate::error::DetectorError;

/// A single JSON packet from the MediaPipe helper
#[derive(Debug, Clone, Deserialize)]
pub struct MpPacket {
    /// Whether a face was detected this frame
    pub face_detected: bool,
    /// ARKit blendshape name → score (0.0–1.0)
    #[serde(default)]
    pub blendshapes: BTreeMap<String, f32>,
    /// Column-major 4x4 facial transformation matrix
    #[serde(default)]
    pub facial_transformation_matrix: Option<[f32; 16]>,
    /// Camera frame width in pixels
    #[serde(default)]
    pub frame_width: u32,
    /// Camera frame height in pixels
    #[serde(default)]
    pub frame_height: u32,
    /// Set when the helper could not open the camera
    #[serde(default)]
    pub camera_error: Option<String>,
}

impl MpPacket {
    /// Convert to the detector-neutral result type
    pub fn to_detection(&self) -> DetectionResult {
        if !self.face_detected {
            return DetectionResult {
                expression_scores: self.blendshapes.clone(),
                pose_matrix: None,
                present: false,
            };
        }
        DetectionResult::face(self.blendshapes.clone(), self.facial_transformation_matrix)
    }
}

/// MediaPipe JSON-over-UDP receiver. Acts as both the video source and the
/// detector of the retarget cycle.
pub struct MpReceiver {
    config: MediaPipeConfig,
    socket: Option<UdpSocket>,
    latest: Option<MpPacket>,
    packets_received: u64,
    started_at: Option<Instant>,
    camera_error: Option<DetectorError>,
    pending_error: Option<DetectorError>,
}

impl MpReceiver {
    /// Create a new MediaPipe receiver (does not bind yet)
    pub fn new(config: &MediaPipeConfig) -> Self {
        Self {
            config: config.clone(),
            socket: None,
            latest: None,
            packets_received: 0,
            started_at: None,
            camera_error: None,
            pending_error: None,
        }
    }

    /// Bind the UDP socket
    pub fn start(&mut self) -> crate::Result<()> {
        let addr = format!("{}:{}", self.config.listen_address, self.config.port);

        let socket = UdpSocket::bind(&addr).map_err(|e| {
            DetectorError::Unavailable(format!("Failed to bind to {}: {}", addr, e))
        })?;

        socket.set_nonblocking(true).map_err(|e| {
            DetectorError::Unavailable(format!("Failed to set non-blocking: {}", e))
        })?;

        tracing::info!("MediaPipe receiver listening on {}", addr);
        self.socket = Some(socket);
        self.started_at = Some(Instant::now());

        Ok(())
    }

    /// Stop the receiver
    pub fn stop(&mut self) {
        self.socket = None;
        tracing::info!("MediaPipe receiver stopped");
    }

    /// Camera failure reported so far, if any
    pub fn camera_error(&self) -> Option<&DetectorError> {
        self.camera_error.as_ref()
    }

    pub fn packets_received(&self) -> u64 {
        self.packets_received
    }

    /// Parse and store one datagram
    fn ingest(&mut self, bytes: &[u8]) {
        match serde_json::from_slice::<MpPacket>(bytes) {
            Ok(packet) => {
                if let Some(reason) = &packet.camera_error {
                    self.report_camera_error(reason.clone());
                }
                self.packets_received += 1;
                self.latest = Some(packet);
                // A newer good packet supersedes an earlier bad one
                self.pending_error = None;
            }
            Err(e) => {
                self.pending_error = Some(DetectorError::Parse(format!("JSON parse error: {}", e)));
            }
        }
    }

    /// Log a camera failure once; later ones are only kept
    fn report_camera_error(&mut self, reason: String) {
        if self.camera_error.is_none() {
            tracing::error!("Unable to access the camera/webcam: {}", reason);
        }
        self.camera_error = Some(DetectorError::MissingCameraAccess(reason));
    }

    fn check_camera_timeout(&mut self) {
        if self.packets_received > 0 || self.camera_error.is_some() {
            return;
        }
        let timeout = Duration::from_secs(self.config.camera_timeout_secs);
        if self.started_at.is_some_and(|t| t.elapsed() >= timeout) {
            self.report_camera_error(format!(
                "no frames from the tracker after {}s",
                self.config.camera_timeout_secs
            ));
        }
    }
}

impl VideoSource for MpReceiver {
    fn refresh(&mut self) {
        let Some(socket) = self.socket.as_ref() else {
            return;
        };
        // Errors only count against the frame that drained them
        self.pending_error = None;

        let mut buf = [0u8; 65536];
        let mut datagrams = Vec::new();
        loop {
            match socket.recv(&mut buf) {
                Ok(size) if size > 0 => datagrams.push(buf[..size].to_vec()),
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    self.pending_error =
                        Some(DetectorError::Unavailable(format!("Receive error: {}", e)));
                    break;
                }
            }
        }

        for datagram in &datagrams {
            self.ingest(datagram);
        }
        self.check_camera_timeout();
    }

    fn ready_state(&self) -> ReadyState {
        match &self.latest {
            Some(p) if p.camera_error.is_none() && p.frame_width > 0 && p.frame_height > 0 => {
                ReadyState::HaveCurrentData
            }
            _ => ReadyState::HaveNothing,
        }
    }

    fn dimensions(&self) -> (u32, u32) {
        self.latest
            .as_ref()
            .map(|p| (p.frame_width, p.frame_height))
            .unwrap_or((0, 0))
    }

    fn current_frame(&self) -> VideoFrame {
        let (width, height) = self.dimensions();
        VideoFrame {
            width,
            height,
            sequence: self.packets_received,
        }
    }
}

impl Detector for MpReceiver {
    fn detect(&mut self, frame: &VideoFrame, timestamp_ms: f64) -> Result<DetectionResult, DetectorError> {
        if self.socket.is_none() {
            return Err(DetectorError::Unavailable("receiver not started".to_string()));
        }
        if let Some(err) = self.pending_error.take() {
            return Err(err);
        }

        tracing::trace!("detect frame {} at {:.1}ms", frame.sequence, timestamp_ms);
        Ok(self
            .latest
            .as_ref()
            .map(MpPacket::to_detection)
            .unwrap_or_default())
    }
}

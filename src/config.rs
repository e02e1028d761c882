//! Configuration parsing and management for face-retarget

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result, RetargetError};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub retarget: RetargetConfig,
    pub rig: RigConfig,
    pub driver: DriverConfig,
    pub mediapipe: MediaPipeConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self> {
        let paths = [
            PathBuf::from("face-retarget.toml"),
            PathBuf::from("config/face-retarget.toml"),
            dirs_path().join("config.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let limit = self.retarget.eye_rotation_limit_deg;
        if !limit.is_finite() || !(0.0..=90.0).contains(&limit) {
            return Err(invalid(
                "retarget.eye_rotation_limit_deg",
                "Eye rotation limit must be between 0 and 90 degrees",
            ));
        }

        if self.driver.refresh_hz == 0 || self.driver.refresh_hz > 1000 {
            return Err(invalid(
                "driver.refresh_hz",
                "Refresh rate must be between 1 and 1000 Hz",
            ));
        }

        let ppu = self.driver.video_plane_pixels_per_unit;
        if !ppu.is_finite() || ppu <= 0.0 {
            return Err(invalid(
                "driver.video_plane_pixels_per_unit",
                "Pixels per unit must be greater than 0",
            ));
        }

        if self.mediapipe.port == 0 {
            return Err(invalid("mediapipe.port", "Port must be greater than 0"));
        }

        if self.rig.meshes.is_empty() {
            return Err(invalid("rig.meshes", "At least one morph mesh is required"));
        }

        let mut seen = HashSet::new();
        for mesh in &self.rig.meshes {
            if !seen.insert(mesh.name.as_str()) {
                return Err(invalid(
                    "rig.meshes",
                    &format!("Duplicate mesh name: {}", mesh.name),
                ));
            }
            if mesh.morph_targets.is_empty() {
                tracing::warn!("Mesh {} declares no morph targets", mesh.name);
            }
        }

        for (field, value) in [
            ("rig.left_eye", &self.rig.left_eye),
            ("rig.right_eye", &self.rig.right_eye),
            ("rig.head", &self.rig.head),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(field, "Node name must not be empty"));
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> RetargetError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
    .into()
}

/// Retargeting parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetargetConfig {
    /// Eye rotation at full gaze score, in degrees
    pub eye_rotation_limit_deg: f32,
}

impl Default for RetargetConfig {
    fn default() -> Self {
        Self {
            eye_rotation_limit_deg: 30.0,
        }
    }
}

impl RetargetConfig {
    pub fn eye_rotation_limit(&self) -> f32 {
        self.eye_rotation_limit_deg.to_radians()
    }
}

/// Morph target set of the reference avatar's face and teeth meshes
pub const DEFAULT_MORPH_TARGETS: &[&str] = &[
    "AU_1", "AU_2", "AU_4", "AU_5", "AU_7", "AU_9", "AU_12", "AU_15", "AU_18", "AU_20",
    "AU_23", "AU_26",
];

/// Description of the avatar rig: morph meshes and the rotatable nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    pub meshes: Vec<MeshConfig>,
    /// Left eye node name
    pub left_eye: String,
    /// Right eye node name
    pub right_eye: String,
    /// Head transform node name
    pub head: String,
}

impl Default for RigConfig {
    fn default() -> Self {
        let targets: Vec<String> = DEFAULT_MORPH_TARGETS.iter().map(|s| s.to_string()).collect();
        Self {
            meshes: vec![
                MeshConfig {
                    name: "mesh_2".to_string(),
                    morph_targets: targets.clone(),
                },
                MeshConfig {
                    name: "mesh_3".to_string(),
                    morph_targets: targets,
                },
            ],
            left_eye: "eyeLeft".to_string(),
            right_eye: "eyeRight".to_string(),
            head: "grp_transform".to_string(),
        }
    }
}

/// One mesh with morph targets, in influence-array order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshConfig {
    pub name: String,
    #[serde(default)]
    pub morph_targets: Vec<String>,
}

/// Frame driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Display refresh rate the host loop ticks at
    pub refresh_hz: u32,
    /// Video pixels per scene unit for the backdrop plane
    pub video_plane_pixels_per_unit: f32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            refresh_hz: 60,
            video_plane_pixels_per_unit: 100.0,
        }
    }
}

/// MediaPipe face tracking receiver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaPipeConfig {
    /// UDP listen address
    pub listen_address: String,
    /// UDP port the helper sends to
    pub port: u16,
    /// Seconds without any packet before camera access is reported missing
    pub camera_timeout_secs: u64,
}

impl Default for MediaPipeConfig {
    fn default() -> Self {
        Self {
            listen_address: "127.0.0.1".to_string(),
            port: 12346,
            camera_timeout_secs: 10,
        }
    }
}

/// Renderer output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Emit one JSON rig snapshot per frame on stdout
    pub json: bool,
}

/// Get the platform-specific configuration directory
fn dirs_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(config_dir).join("face-retarget");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config/face-retarget");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Application Support/face-retarget");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("face-retarget");
        }
    }

    PathBuf::from(".")
}

//! Error types for face-retarget

use thiserror::Error;

/// Main error type for face-retarget
#[derive(Error, Debug)]
pub enum RetargetError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rig error: {0}")]
    Rig(#[from] RigError),

    #[error("Detector error: {0}")]
    Detector(#[from] DetectorError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Rig construction errors. These are initialisation failures: without a
/// valid rig no frame can be retargeted.
#[derive(Error, Debug)]
pub enum RigError {
    #[error("Rig has no morph meshes")]
    NoMeshes,

    #[error("Duplicate mesh name: {0}")]
    DuplicateMesh(String),

    #[error("Mesh {mesh} declares morph target {target} more than once")]
    DuplicateTarget { mesh: String, target: String },

    #[error("Rig node name for {0} is empty")]
    EmptyNodeName(&'static str),
}

/// Detector and video source errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectorError {
    #[error("Unable to access the camera: {0}")]
    MissingCameraAccess(String),

    #[error("Detector unavailable: {0}")]
    Unavailable(String),

    #[error("Detector output could not be parsed: {0}")]
    Parse(String),
}

/// Pose matrix decomposition errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoseError {
    #[error("Malformed pose matrix: {0}")]
    Malformed(String),
}

/// Result type alias for face-retarget operations
pub type Result<T> = std::result::Result<T, RetargetError>;

//! Rig module
//!
//! The animatable surface of the avatar: morph meshes with their weight
//! arrays, the two eye nodes and the head transform node.

pub mod state;

pub use state::{MorphMesh, RigNode, RigSnapshot, RigState};

//! Mutable animation state of the rig

use glam::Vec3;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::config::RigConfig;
use crate::error::RigError;

/// A mesh with morph targets: name → index dictionary plus the weight array
/// indexed the same way.
#[derive(Debug, Clone, PartialEq)]
pub struct MorphMesh {
    name: String,
    target_names: Vec<String>,
    dictionary: HashMap<String, usize>,
    influences: Vec<f32>,
}

impl MorphMesh {
    /// Create a mesh with all weights at zero.
    pub fn new(name: &str, target_names: &[String]) -> Result<Self, RigError> {
        let mut dictionary = HashMap::with_capacity(target_names.len());
        for (i, target) in target_names.iter().enumerate() {
            if dictionary.insert(target.clone(), i).is_some() {
                return Err(RigError::DuplicateTarget {
                    mesh: name.to_string(),
                    target: target.clone(),
                });
            }
        }

        Ok(Self {
            name: name.to_string(),
            target_names: target_names.to_vec(),
            dictionary,
            influences: vec![0.0; target_names.len()],
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target_names(&self) -> &[String] {
        &self.target_names
    }

    /// Index of a morph target, if this mesh has it
    pub fn index_of(&self, target: &str) -> Option<usize> {
        self.dictionary.get(target).copied()
    }

    /// Current weight of a morph target
    pub fn weight(&self, target: &str) -> Option<f32> {
        self.index_of(target).map(|i| self.influences[i])
    }

    /// Weight array, indexed like `target_names`
    pub fn influences(&self) -> &[f32] {
        &self.influences
    }

    /// Overwrite a target's weight. Returns false when the mesh lacks the
    /// target or the value is not finite.
    pub fn set_weight(&mut self, target: &str, value: f32) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self.dictionary.get(target) {
            Some(&i) => {
                self.influences[i] = value.clamp(0.0, 1.0);
                true
            }
            None => false,
        }
    }
}

/// A named, independently rotatable node (eye or head).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RigNode {
    name: String,
    /// Euler rotation in radians
    rotation: Vec3,
}

impl RigNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rotation: Vec3::ZERO,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
    }

    pub fn set_rotation_x(&mut self, value: f32) {
        self.rotation.x = value;
    }

    pub fn set_rotation_z(&mut self, value: f32) {
        self.rotation.z = value;
    }
}

/// The avatar's animation state.
///
/// Owned by the retarget cycle, which is its only writer; the renderer reads
/// it after each frame has been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct RigState {
    meshes: Vec<MorphMesh>,
    left_eye: RigNode,
    right_eye: RigNode,
    head: RigNode,
}

impl RigState {
    /// Build a neutral rig (all weights and rotations zero) from its description
    pub fn from_config(config: &RigConfig) -> Result<Self, RigError> {
        if config.meshes.is_empty() {
            return Err(RigError::NoMeshes);
        }
        for (field, value) in [
            ("left_eye", &config.left_eye),
            ("right_eye", &config.right_eye),
            ("head", &config.head),
        ] {
            if value.trim().is_empty() {
                return Err(RigError::EmptyNodeName(field));
            }
        }

        let mut meshes: Vec<MorphMesh> = Vec::with_capacity(config.meshes.len());
        for desc in &config.meshes {
            if meshes.iter().any(|m| m.name == desc.name) {
                return Err(RigError::DuplicateMesh(desc.name.clone()));
            }
            meshes.push(MorphMesh::new(&desc.name, &desc.morph_targets)?);
        }

        Ok(Self {
            meshes,
            left_eye: RigNode::new(&config.left_eye),
            right_eye: RigNode::new(&config.right_eye),
            head: RigNode::new(&config.head),
        })
    }

    pub fn meshes(&self) -> &[MorphMesh] {
        &self.meshes
    }

    pub fn mesh(&self, name: &str) -> Option<&MorphMesh> {
        self.meshes.iter().find(|m| m.name == name)
    }

    /// Write `value` to `target` on every mesh that has it.
    /// Returns the number of meshes updated.
    pub fn set_shared_weight(&mut self, target: &str, value: f32) -> usize {
        self.meshes
            .iter_mut()
            .map(|mesh| mesh.set_weight(target, value))
            .filter(|&written| written)
            .count()
    }

    /// Weight of `target` on the first mesh that has it
    pub fn weight(&self, target: &str) -> Option<f32> {
        self.meshes.iter().find_map(|m| m.weight(target))
    }

    pub fn left_eye(&self) -> &RigNode {
        &self.left_eye
    }

    pub fn right_eye(&self) -> &RigNode {
        &self.right_eye
    }

    pub fn head(&self) -> &RigNode {
        &self.head
    }

    pub fn left_eye_mut(&mut self) -> &mut RigNode {
        &mut self.left_eye
    }

    pub fn right_eye_mut(&mut self) -> &mut RigNode {
        &mut self.right_eye
    }

    pub fn head_mut(&mut self) -> &mut RigNode {
        &mut self.head
    }

    /// Serializable view: mesh → target → weight, plus node rotations
    pub fn snapshot(&self) -> RigSnapshot {
        RigSnapshot {
            meshes: self
                .meshes
                .iter()
                .map(|m| {
                    let weights = m
                        .target_names
                        .iter()
                        .cloned()
                        .zip(m.influences.iter().copied())
                        .collect();
                    (m.name.clone(), weights)
                })
                .collect(),
            left_eye: self.left_eye.clone(),
            right_eye: self.right_eye.clone(),
            head: self.head.clone(),
        }
    }
}

/// Point-in-time copy of a rig for output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RigSnapshot {
    pub meshes: BTreeMap<String, BTreeMap<String, f32>>,
    pub left_eye: RigNode,
    pub right_eye: RigNode,
    pub head: RigNode,
}

//! ARKit → FACS action unit vocabulary.
//!
//! MediaPipe reports ARKit-style blendshape names ("jawOpen", "mouthSmileLeft").
//! The reference head rig names its morph targets after FACS action units
//! ("AU_26", "AU_12") and has a single target for symmetric actions, so the
//! left/right detector variants collapse onto one rig target.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Detector blendshape name → rig morph target name.
const ENTRIES: &[(&str, &str)] = &[
    ("browInnerUp", "AU_1"),
    ("browOuterUpLeft", "AU_2"),
    ("browOuterUpRight", "AU_2"),
    ("browDownLeft", "AU_4"),
    ("browDownRight", "AU_4"),
    ("eyeWideLeft", "AU_5"),
    ("eyeWideRight", "AU_5"),
    ("eyeSquintLeft", "AU_7"),
    ("eyeSquintRight", "AU_7"),
    ("mouthSmileLeft", "AU_12"),
    ("mouthSmileRight", "AU_12"),
    ("mouthFrownLeft", "AU_15"),
    ("mouthFrownRight", "AU_15"),
    ("mouthPucker", "AU_18"),
    ("mouthStretchLeft", "AU_20"),
    ("mouthStretchRight", "AU_20"),
    ("mouthPressLeft", "AU_23"),
    ("mouthPressRight", "AU_23"),
    ("jawOpen", "AU_26"),
    ("noseSneerLeft", "AU_9"),
    ("noseSneerRight", "AU_9"),
];

/// Immutable many-to-one lookup from detector names to rig target names.
#[derive(Debug)]
pub struct VocabularyMap {
    entries: &'static [(&'static str, &'static str)],
    forward: HashMap<&'static str, &'static str>,
}

impl VocabularyMap {
    /// The process-wide table, built on first use.
    pub fn shared() -> &'static VocabularyMap {
        static MAP: OnceLock<VocabularyMap> = OnceLock::new();
        MAP.get_or_init(|| VocabularyMap::from_entries(ENTRIES))
    }

    fn from_entries(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            entries,
            forward: entries.iter().copied().collect(),
        }
    }

    /// Rig target for a detector name, or `None` when the rig has no
    /// corresponding control.
    pub fn lookup(&self, detector_name: &str) -> Option<&'static str> {
        self.forward.get(detector_name).copied()
    }

    /// All detector names that drive `rig_target`, in table order.
    pub fn detector_names_for(&self, rig_target: &str) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|(_, target)| *target == rig_target)
            .map(|(name, _)| *name)
            .collect()
    }

    /// Table entries in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &'static str)> {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

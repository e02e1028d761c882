//! Morph weight application.

use std::collections::BTreeMap;

use super::vocabulary::VocabularyMap;
use crate::rig::RigState;

/// Write each mapped expression score onto every mesh that carries the
/// corresponding morph target.
///
/// Scores overwrite the previous weight verbatim. Names without a vocabulary
/// entry are skipped, as are non-finite scores. When two detector names share
/// a target (left/right variants), the later one in key order wins.
///
/// Returns the number of (mesh, target) weights written.
pub fn apply(
    scores: &BTreeMap<String, f32>,
    vocabulary: &VocabularyMap,
    rig: &mut RigState,
) -> usize {
    let mut written = 0;

    for (name, &score) in scores {
        tracing::trace!("{} {}", name, score);

        let Some(target) = vocabulary.lookup(name) else {
            continue;
        };
        if !score.is_finite() {
            tracing::debug!("Skipping non-finite score for {}: {}", name, score);
            continue;
        }

        written += rig.set_shared_weight(target, score);
    }

    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MeshConfig, RigConfig};

    fn rig() -> RigState {
        let targets = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        RigState::from_config(&RigConfig {
            meshes: vec![
                MeshConfig {
                    name: "mesh_2".into(),
                    morph_targets: targets(&["AU_1", "AU_12", "AU_26"]),
                },
                MeshConfig {
                    name: "mesh_3".into(),
                    morph_targets: targets(&["AU_12", "AU_26"]),
                },
            ],
            ..RigConfig::default()
        })
        .unwrap()
    }

    fn scores(pairs: &[(&str, f32)]) -> BTreeMap<String, f32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_jaw_open_reaches_face_and_teeth() {
        let mut rig = rig();
        let written = apply(&scores(&[("jawOpen", 0.9)]), VocabularyMap::shared(), &mut rig);

        assert_eq!(written, 2);
        assert_eq!(rig.mesh("mesh_2").unwrap().weight("AU_26"), Some(0.9));
        assert_eq!(rig.mesh("mesh_3").unwrap().weight("AU_26"), Some(0.9));
        assert_eq!(rig.mesh("mesh_2").unwrap().weight("AU_1"), Some(0.0));
        assert_eq!(rig.mesh("mesh_2").unwrap().weight("AU_12"), Some(0.0));
    }

    #[test]
    fn test_scores_are_written_verbatim() {
        for s in [0.0f32, 0.013, 0.5, 0.999_9, 1.0] {
            let mut rig = rig();
            apply(&scores(&[("browInnerUp", s)]), VocabularyMap::shared(), &mut rig);
            assert_eq!(rig.weight("AU_1"), Some(s));
        }
    }

    #[test]
    fn test_overwrites_previous_weight() {
        let mut rig = rig();
        apply(&scores(&[("jawOpen", 0.9)]), VocabularyMap::shared(), &mut rig);
        apply(&scores(&[("jawOpen", 0.1)]), VocabularyMap::shared(), &mut rig);
        assert_eq!(rig.weight("AU_26"), Some(0.1));
    }

    #[test]
    fn test_unmapped_and_non_finite_are_ignored() {
        let mut rig = rig();
        let written = apply(
            &scores(&[
                ("eyeLookInLeft", 0.7),
                ("_neutral", 1.0),
                ("jawOpen", f32::NAN),
            ]),
            VocabularyMap::shared(),
            &mut rig,
        );
        assert_eq!(written, 0);
        assert_eq!(rig.weight("AU_26"), Some(0.0));
    }

    #[test]
    fn test_symmetric_pair_last_key_wins() {
        let mut rig = rig();
        apply(
            &scores(&[("mouthSmileLeft", 0.2), ("mouthSmileRight", 0.6)]),
            VocabularyMap::shared(),
            &mut rig,
        );
        assert_eq!(rig.mesh("mesh_2").unwrap().weight("AU_12"), Some(0.6));
        assert_eq!(rig.mesh("mesh_3").unwrap().weight("AU_12"), Some(0.6));
    }
}

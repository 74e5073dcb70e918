//! Shape detection and hierarchical nesting of finalized crystals.

use tracing::debug;

use crate::codebook::Codebook;

use super::crystal::{Crystal, CrystalShape};

/// Centers less similar than this stand in contrast.
const CONTRAST_SIMILARITY: f32 = 0.05;
/// Emotional charges further apart than this stand in contrast.
const CONTRAST_EMOTION_GAP: f32 = 0.3;
/// Minimum distinct concepts of a parallel crystal.
const PARALLEL_ELEMENTS: usize = 4;
/// Crystals with at most this many concepts may be nested.
const MAX_CHILD_ELEMENTS: usize = 2;
/// Crystals need at least this many concepts to take children.
const MIN_PARENT_ELEMENTS: usize = 3;

/// Assign a shape to every crystal.
///
/// One concept is a fragment. Otherwise the first other crystal that is
/// dissimilar or emotionally distant makes this one a contrast and becomes
/// its partner. Remaining crystals are parallel with four or more concepts,
/// simple with two or more.
pub fn detect_shapes(crystals: &mut [Crystal]) {
    let decisions: Vec<(CrystalShape, Option<usize>)> = crystals
        .iter()
        .enumerate()
        .map(|(i, crystal)| {
            if crystal.element_count <= 1 {
                return (CrystalShape::Fragment, None);
            }
            let partner = crystals.iter().enumerate().position(|(j, other)| {
                j != i
                    && (Codebook::similarity(crystal.center(), other.center()) < CONTRAST_SIMILARITY
                        || (crystal.emotional_charge - other.emotional_charge).abs()
                            > CONTRAST_EMOTION_GAP)
            });
            match partner {
                Some(j) => (CrystalShape::Contrast, Some(j)),
                None if crystal.element_count >= PARALLEL_ELEMENTS => (CrystalShape::Parallel, None),
                None => (CrystalShape::Simple, None),
            }
        })
        .collect();

    let ids: Vec<_> = crystals.iter().map(|c| c.id).collect();
    for (crystal, (shape, partner)) in crystals.iter_mut().zip(decisions) {
        crystal.shape = shape;
        crystal.contrast_partner = partner.map(|j| ids[j]);
    }
}

/// Move small crystals under the most similar larger crystal.
///
/// A crystal with at most two concepts becomes the child of the crystal
/// with three or more concepts whose center is most similar, provided that
/// similarity exceeds `similarity_threshold`. Children keep their relative
/// order; top-level crystals keep theirs.
pub fn nest(crystals: Vec<Crystal>, similarity_threshold: f32) -> Vec<Crystal> {
    if crystals.len() < 2 {
        return crystals;
    }

    let mut placements: Vec<(usize, usize)> = Vec::new();
    for (i, child) in crystals.iter().enumerate() {
        if child.element_count > MAX_CHILD_ELEMENTS {
            continue;
        }
        let mut best: Option<usize> = None;
        let mut best_sim = similarity_threshold;
        for (j, parent) in crystals.iter().enumerate() {
            if i == j || parent.element_count < MIN_PARENT_ELEMENTS {
                continue;
            }
            let sim = Codebook::similarity(child.center(), parent.center());
            if sim > best_sim {
                best_sim = sim;
                best = Some(j);
            }
        }
        if let Some(parent) = best {
            placements.push((i, parent));
        }
    }

    if placements.is_empty() {
        return crystals;
    }

    let mut slots: Vec<Option<Crystal>> = crystals.into_iter().map(Some).collect();
    for &(child, parent) in &placements {
        if let Some(c) = slots[child].take() {
            if let Some(p) = slots[parent].as_mut() {
                p.children.push(c);
            }
        }
    }
    debug!(nested = placements.len(), "nested small crystals");
    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crystallization::crystal::CrystalId;
    use crate::nucleation::CrystalNucleus;

    fn crystal(id: usize, center: Vec<f32>, element_count: usize, emotional_charge: f32) -> Crystal {
        Crystal {
            id: CrystalId(id),
            nucleus: CrystalNucleus {
                center,
                strength: 1.0,
                emotional_charge: None,
                absorbed: Vec::new(),
                label: format!("c{}", id),
            },
            shape: CrystalShape::Simple,
            element_count,
            emotional_charge,
            residual_temperature: 0.0,
            contrast_partner: None,
            children: Vec::new(),
        }
    }

    #[test]
    fn test_fragment_and_parallel() {
        let mut crystals = vec![
            crystal(0, vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0], 1, 0.0),
            crystal(1, vec![1.0, 1.0, 1.0, 1.0, 1.0, -1.0], 5, 0.0),
            crystal(2, vec![1.0, 1.0, 1.0, 1.0, -1.0, 1.0], 2, 0.0),
        ];
        detect_shapes(&mut crystals);
        assert_eq!(crystals[0].shape, CrystalShape::Fragment);
        assert_eq!(crystals[1].shape, CrystalShape::Parallel);
        assert_eq!(crystals[2].shape, CrystalShape::Simple);
        assert!(crystals.iter().all(|c| c.contrast_partner().is_none()));
    }

    #[test]
    fn test_contrast_by_similarity_and_emotion() {
        let mut crystals = vec![
            crystal(0, vec![1.0, 1.0, 1.0, 1.0], 3, 0.0),
            crystal(1, vec![-1.0, -1.0, 1.0, 1.0], 2, 0.0),
        ];
        detect_shapes(&mut crystals);
        assert_eq!(crystals[0].shape, CrystalShape::Contrast);
        assert_eq!(crystals[0].contrast_partner(), Some(CrystalId(1)));
        assert_eq!(crystals[1].contrast_partner(), Some(CrystalId(0)));

        let mut emotional = vec![
            crystal(7, vec![1.0, 1.0, 1.0, 1.0], 2, 0.5),
            crystal(8, vec![1.0, 1.0, 1.0, -1.0], 2, -0.1),
        ];
        detect_shapes(&mut emotional);
        assert_eq!(emotional[0].shape, CrystalShape::Contrast);
        assert_eq!(emotional[0].contrast_partner(), Some(CrystalId(8)));
        println!("[PASS] test_contrast_by_similarity_and_emotion");
    }

    #[test]
    fn test_nest_moves_small_under_similar_large() {
        let crystals = vec![
            crystal(0, vec![1.0, 1.0, 1.0, 1.0], 4, 0.0),
            crystal(1, vec![1.0, 1.0, 1.0, -1.0], 1, 0.0),
            crystal(2, vec![-1.0, -1.0, -1.0, -1.0], 2, 0.0),
            crystal(3, vec![1.0, 1.0, -1.0, 1.0], 2, 0.0),
        ];
        let top = nest(crystals, 0.25);
        let ids: Vec<CrystalId> = top.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![CrystalId(0), CrystalId(2)]);
        let children: Vec<CrystalId> = top[0].children().iter().map(|c| c.id).collect();
        assert_eq!(children, vec![CrystalId(1), CrystalId(3)]);
    }

    #[test]
    fn test_nest_needs_large_parent() {
        let crystals = vec![
            crystal(0, vec![1.0, 1.0], 2, 0.0),
            crystal(1, vec![1.0, 1.0], 2, 0.0),
        ];
        let top = nest(crystals, 0.25);
        assert_eq!(top.len(), 2);
        assert!(top.iter().all(|c| c.children().is_empty()));
        assert_eq!(nest(Vec::new(), 0.25).len(), 0);
    }
}

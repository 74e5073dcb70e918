//! Finalized crystals.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codebook::Hypervector;
use crate::nucleation::CrystalNucleus;
use crate::particle::{Particle, ParticleField, ParticleId};

/// Identifier of a crystal within one crystallization run.
///
/// Ids are assigned in finalize order, so they stay valid after nesting
/// moves a crystal under a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CrystalId(pub usize);

impl fmt::Display for CrystalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "crystal-{}", self.0)
    }
}

/// Syntactic shape a crystal suggests for realization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrystalShape {
    /// Subject-verb-object like clause.
    Simple,
    /// Stands against another crystal.
    Contrast,
    /// Four or more concepts side by side.
    Parallel,
    /// One concept, punchy.
    Fragment,
}

impl CrystalShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrystalShape::Simple => "simple",
            CrystalShape::Contrast => "contrast",
            CrystalShape::Parallel => "parallel",
            CrystalShape::Fragment => "fragment",
        }
    }
}

impl fmt::Display for CrystalShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully crystallized thought-chunk; one clause or phrase of output.
///
/// Owns its nucleus and its children. `contrast_partner` only names another
/// crystal of the same run and never owns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crystal {
    pub id: CrystalId,
    pub nucleus: CrystalNucleus,
    pub shape: CrystalShape,
    /// Distinct base concepts among the absorbed particles.
    pub element_count: usize,
    /// Mean of the nucleus emotional charge, in `[-1, 1]`.
    pub emotional_charge: f32,
    pub residual_temperature: f32,
    pub(crate) contrast_partner: Option<CrystalId>,
    pub(crate) children: Vec<Crystal>,
}

impl Crystal {
    /// Finalize a nucleus. Shape starts as [`CrystalShape::Simple`].
    pub(crate) fn from_nucleus(id: CrystalId, nucleus: CrystalNucleus, field: &ParticleField) -> Self {
        let concepts: BTreeSet<&str> = nucleus
            .absorbed
            .iter()
            .map(|pid| field[*pid].concept())
            .filter(|c| !c.is_empty())
            .collect();
        let emotional_charge = match &nucleus.emotional_charge {
            Some(v) if !v.is_empty() => {
                let mean = v.iter().map(|x| *x as f64).sum::<f64>() / v.len() as f64;
                (mean as f32).clamp(-1.0, 1.0)
            }
            _ => 0.0,
        };

        Self {
            id,
            element_count: concepts.len(),
            emotional_charge,
            residual_temperature: nucleus.residual_temperature(field),
            nucleus,
            shape: CrystalShape::Simple,
            contrast_partner: None,
            children: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.nucleus.label
    }

    pub fn strength(&self) -> f32 {
        self.nucleus.strength
    }

    pub fn center(&self) -> &Hypervector {
        &self.nucleus.center
    }

    /// Handles of the absorbed particles.
    pub fn particles(&self) -> &[ParticleId] {
        &self.nucleus.absorbed
    }

    /// The absorbed particles resolved against their field.
    pub fn particles_in<'f>(&self, field: &'f ParticleField) -> Vec<&'f Particle> {
        self.nucleus.absorbed.iter().map(|id| &field[*id]).collect()
    }

    /// Sorted distinct concept names of the absorbed particles.
    pub fn unique_concepts(&self, field: &ParticleField) -> Vec<String> {
        self.nucleus
            .absorbed
            .iter()
            .map(|id| field[*id].concept())
            .filter(|c| !c.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn contrast_partner(&self) -> Option<CrystalId> {
        self.contrast_partner
    }

    /// Nested sub-crystals.
    pub fn children(&self) -> &[Crystal] {
        &self.children
    }

    /// Find a crystal by id in this subtree.
    pub fn find(&self, id: CrystalId) -> Option<&Crystal> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }
}

impl fmt::Display for Crystal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Crystal({}, shape={}, elements={}, strength={:.2}, emo={:+.2}",
            self.label(),
            self.shape,
            self.element_count,
            self.strength(),
            self.emotional_charge
        )?;
        if let Some(partner) = self.contrast_partner {
            write!(f, ", contrast={}", partner)?;
        }
        if !self.children.is_empty() {
            write!(f, ", children={}", self.children.len())?;
        }
        write!(f, ")")
    }
}

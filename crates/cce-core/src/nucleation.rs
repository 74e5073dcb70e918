//! Phase 2: nucleation.
//!
//! Density peaks of the plasma become [`CrystalNucleus`] seeds, the
//! strongest first. Every particle a peak collected is frozen into its
//! nucleus right away.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codebook::Hypervector;
use crate::particle::{DensityPeak, ParticleCategory, ParticleField, ParticleId};

/// Number of base labels that make up a nucleus label.
const LABEL_PARTS: usize = 3;

/// A growing cluster of absorbed particles.
///
/// `absorbed` holds handles into the field the nucleus was built from. A
/// handle appears in at most one nucleus; merges move handles, never copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrystalNucleus {
    /// Running weighted mean of absorbed positions. Real-valued.
    pub center: Hypervector,
    pub strength: f32,
    /// Mean position of the emotion particles of the originating peak.
    pub emotional_charge: Option<Hypervector>,
    pub absorbed: Vec<ParticleId>,
    pub label: String,
}

impl CrystalNucleus {
    /// Build a nucleus from a density peak.
    ///
    /// The label joins the three most frequent base labels of the
    /// contributors with `+`; equally frequent labels keep first-seen order.
    pub fn from_peak(peak: &DensityPeak, field: &ParticleField) -> Self {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for id in &peak.contributing {
            let base = field[*id].base_label();
            match counts.iter_mut().find(|(label, _)| *label == base) {
                Some((_, n)) => *n += 1,
                None => counts.push((base, 1)),
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        let label = counts
            .iter()
            .take(LABEL_PARTS)
            .map(|(label, _)| *label)
            .collect::<Vec<_>>()
            .join("+");

        Self {
            center: peak.position.clone(),
            strength: peak.density,
            emotional_charge: peak.dominant_emotion(field),
            absorbed: peak.contributing.clone(),
            label,
        }
    }

    pub fn size(&self) -> usize {
        self.absorbed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.absorbed.is_empty()
    }

    /// Sum of charges of the absorbed particles.
    pub fn total_charge(&self, field: &ParticleField) -> f32 {
        self.absorbed.iter().map(|id| field[*id].charge).sum()
    }

    /// Mean temperature of the absorbed particles, 0.0 when empty.
    pub fn residual_temperature(&self, field: &ParticleField) -> f32 {
        if self.absorbed.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.absorbed.iter().map(|id| field[*id].temperature).sum();
        sum / self.absorbed.len() as f32
    }

    /// Share of emotion particles among the absorbed, in `[0, 1]`.
    pub fn emotional_intensity(&self, field: &ParticleField) -> f32 {
        if self.absorbed.is_empty() {
            return 0.0;
        }
        let emotional = self
            .absorbed
            .iter()
            .filter(|id| field[**id].category == ParticleCategory::Emotion)
            .count();
        emotional as f32 / self.absorbed.len() as f32
    }

    /// Take in one particle and move the center to the new running mean.
    pub fn absorb(&mut self, id: ParticleId, position: &[f32]) {
        self.absorbed.push(id);
        let n = self.absorbed.len() as f32;
        for (c, x) in self.center.iter_mut().zip(position.iter()) {
            *c = (*c * (n - 1.0) + x) / n;
        }
    }

    /// Take in one particle without moving the center.
    pub fn attach(&mut self, id: ParticleId) {
        self.absorbed.push(id);
    }

    /// Merge `other` into `self`.
    ///
    /// Handles move over, `strength_share · other.strength` is added, the
    /// center becomes the size-weighted mean of both centers (this side
    /// weighs at least 1) and the labels are joined with `+`. `self` keeps
    /// its emotional charge and inherits the other one only if it had none.
    pub fn merge(&mut self, other: CrystalNucleus, strength_share: f32) {
        let n_self = self.absorbed.len().max(1) as f32;
        let n_other = other.absorbed.len() as f32;
        for (c, o) in self.center.iter_mut().zip(other.center.iter()) {
            *c = (*c * n_self + o * n_other) / (n_self + n_other);
        }
        self.strength += other.strength * strength_share;
        self.absorbed.extend(other.absorbed);
        self.label.push('+');
        self.label.push_str(&other.label);
        if self.emotional_charge.is_none() {
            self.emotional_charge = other.emotional_charge;
        }
    }
}

/// Find crystallization seeds in the plasma, strongest first.
///
/// Freezes every particle that ends up in a nucleus. Since the density
/// step places every free particle in some peak, the field has no free
/// particles left afterwards.
pub fn nucleate(field: &mut ParticleField, min_density_distance: f32) -> Vec<CrystalNucleus> {
    let peaks = field.compute_density(min_density_distance);
    if peaks.is_empty() {
        return Vec::new();
    }

    let mut nuclei: Vec<CrystalNucleus> = peaks
        .iter()
        .map(|peak| CrystalNucleus::from_peak(peak, field))
        .collect();
    nuclei.sort_by(|a, b| b.strength.total_cmp(&a.strength));

    let mut frozen = 0;
    for nucleus in &nuclei {
        for id in &nucleus.absorbed {
            if field.freeze(*id) {
                frozen += 1;
            }
        }
    }

    debug!(
        peaks = peaks.len(),
        nuclei = nuclei.len(),
        frozen,
        strongest = %nuclei[0].label,
        "nucleation complete"
    );
    nuclei
}

//! Density-peak extraction over the free particles of a field.
//!
//! # Algorithm
//!
//! 1. Normalize every free position once and build the pairwise cosine
//!    similarity matrix (rows computed in parallel with rayon).
//! 2. `density[i] = Σ_j max(sim(i, j), 0) · charge[j]`.
//! 3. Greedily take the highest-density unused particle as a seed; stop once
//!    that density is <= 0. Every unused particle with
//!    `sim(seed, j) >= min_distance` joins the peak and becomes used.
//! 4. A seed that collects nobody is set aside instead of emitting a peak.
//! 5. Every particle still unused afterwards becomes its own singleton peak,
//!    so no particle is ever dropped.
//!
//! O(n²) in the number of free particles, which stays in the tens to low
//! hundreds per pipeline run.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codebook::Hypervector;

use super::{ParticleCategory, ParticleField, ParticleId};

/// Floor for position norms during normalization.
const NORM_EPSILON: f64 = 1e-8;

/// A point of high semantic density in the field.
///
/// `contributing` holds handles into the field the peak was computed from;
/// the peak does not own the particles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DensityPeak {
    /// Position of the seed particle.
    pub position: Hypervector,
    /// Density of the seed particle.
    pub density: f32,
    pub contributing: Vec<ParticleId>,
}

impl DensityPeak {
    /// Mean position of the contributing emotion particles, if any.
    pub fn dominant_emotion(&self, field: &ParticleField) -> Option<Hypervector> {
        let emotional: Vec<&Hypervector> = self
            .contributing
            .iter()
            .map(|id| &field[*id])
            .filter(|p| p.category == ParticleCategory::Emotion)
            .map(|p| &p.position)
            .collect();
        let first = emotional.first()?;

        let mut mean = vec![0.0f32; first.len()];
        for position in &emotional {
            for (acc, x) in mean.iter_mut().zip(position.iter()) {
                *acc += x;
            }
        }
        let n = emotional.len() as f32;
        mean.iter_mut().for_each(|x| *x /= n);
        Some(mean)
    }

    /// Most frequent category among contributors; ties go to the first seen.
    pub fn dominant_category(&self, field: &ParticleField) -> Option<ParticleCategory> {
        let mut counts: Vec<(ParticleCategory, usize)> = Vec::new();
        for id in &self.contributing {
            let category = field[*id].category;
            match counts.iter_mut().find(|(c, _)| *c == category) {
                Some((_, n)) => *n += 1,
                None => counts.push((category, 1)),
            }
        }
        let mut best: Option<(ParticleCategory, usize)> = None;
        for (category, n) in counts {
            if best.map_or(true, |(_, b)| n > b) {
                best = Some((category, n));
            }
        }
        best.map(|(c, _)| c)
    }
}

impl ParticleField {
    /// Cosine similarity matrix over `ids`, normalized once up front.
    pub fn similarity_matrix(&self, ids: &[ParticleId]) -> Vec<Vec<f32>> {
        let normalized: Vec<Vec<f64>> = ids
            .par_iter()
            .map(|id| {
                let position = &self[*id].position;
                let norm = position
                    .iter()
                    .map(|x| (*x as f64) * (*x as f64))
                    .sum::<f64>()
                    .sqrt()
                    .max(NORM_EPSILON);
                position.iter().map(|x| *x as f64 / norm).collect()
            })
            .collect();

        normalized
            .par_iter()
            .map(|row| {
                normalized
                    .iter()
                    .map(|col| row.iter().zip(col.iter()).map(|(a, b)| a * b).sum::<f64>() as f32)
                    .collect()
            })
            .collect()
    }

    /// Find density peaks among the free particles.
    ///
    /// Returns peaks in extraction order: density-seeded peaks first, then
    /// singleton peaks for orphans in field order. Every free particle
    /// contributes to exactly one peak.
    pub fn compute_density(&self, min_distance: f32) -> Vec<DensityPeak> {
        let free = self.free_ids();
        let n = free.len();
        if n == 0 {
            return Vec::new();
        }

        let sim = self.similarity_matrix(&free);
        let charges: Vec<f32> = free.iter().map(|id| self[*id].charge).collect();
        let densities: Vec<f32> = sim
            .par_iter()
            .map(|row| {
                row.iter()
                    .zip(charges.iter())
                    .map(|(s, c)| s.max(0.0) * c)
                    .sum::<f32>()
            })
            .collect();

        let mut peaks = Vec::new();
        let mut used = vec![false; n];
        let mut set_aside = vec![false; n];

        loop {
            let mut seed: Option<usize> = None;
            for i in 0..n {
                if used[i] || set_aside[i] {
                    continue;
                }
                if seed.map_or(true, |s| densities[i] > densities[s]) {
                    seed = Some(i);
                }
            }
            let Some(seed) = seed else { break };
            if densities[seed] <= 0.0 {
                break;
            }

            let contributors: Vec<usize> = (0..n)
                .filter(|&j| !used[j] && sim[seed][j] >= min_distance)
                .collect();

            if contributors.is_empty() {
                set_aside[seed] = true;
                continue;
            }

            for &j in &contributors {
                used[j] = true;
            }
            peaks.push(DensityPeak {
                position: self[free[seed]].position.clone(),
                density: densities[seed],
                contributing: contributors.iter().map(|&j| free[j]).collect(),
            });
        }

        let seeded = peaks.len();
        for j in 0..n {
            if !used[j] {
                used[j] = true;
                peaks.push(DensityPeak {
                    position: self[free[j]].position.clone(),
                    density: densities[j],
                    contributing: vec![free[j]],
                });
            }
        }

        debug!(
            particles = n,
            peaks = peaks.len(),
            orphans = peaks.len() - seeded,
            min_distance,
            "computed density peaks"
        );
        peaks
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::codebook::Codebook;
    use crate::particle::Particle;

    fn codebook() -> Codebook {
        Codebook::new(10_000, 42).unwrap()
    }

    fn add_decomposed(
        field: &mut ParticleField,
        cb: &Codebook,
        word: &str,
        n: usize,
        category: ParticleCategory,
    ) {
        for (i, v) in cb.decompose(word, n).into_iter().enumerate() {
            field.add(Particle::new(v, format!("{}#{}", word, i), category));
        }
    }

    #[test]
    fn test_empty_field_has_no_peaks() {
        let field = ParticleField::new();
        assert!(field.compute_density(0.3).is_empty());
    }

    #[test]
    fn test_two_concepts_yield_two_peaks() {
        let cb = codebook();
        let mut field = ParticleField::new();
        add_decomposed(&mut field, &cb, "Mut", 5, ParticleCategory::Intent);
        add_decomposed(&mut field, &cb, "Angst", 5, ParticleCategory::Intent);

        let peaks = field.compute_density(0.3);
        assert!(peaks.len() >= 2, "expected >= 2 peaks, got {}", peaks.len());

        for peak in &peaks {
            let concepts: HashSet<&str> =
                peak.contributing.iter().map(|id| field[*id].concept()).collect();
            assert_eq!(concepts.len(), 1, "peak mixes concepts: {:?}", concepts);
        }
        println!("[PASS] test_two_concepts_yield_two_peaks - peaks={}", peaks.len());
    }

    #[test]
    fn test_every_free_particle_in_exactly_one_peak() {
        let cb = codebook();
        let mut field = ParticleField::new();
        add_decomposed(&mut field, &cb, "Mut", 4, ParticleCategory::Intent);
        add_decomposed(&mut field, &cb, "froh", 3, ParticleCategory::Emotion);
        field.add(Particle::new(cb.encode("Büro"), "Büro#0", ParticleCategory::Context));
        let frozen = field.add(Particle::new(cb.encode("Eis"), "Eis#0", ParticleCategory::Context));
        field.freeze(frozen);

        let peaks = field.compute_density(0.25);
        let mut seen: Vec<ParticleId> = peaks.iter().flat_map(|p| p.contributing.clone()).collect();
        seen.sort();
        assert_eq!(seen, field.free_ids());
        assert!(!seen.contains(&frozen));
    }

    #[test]
    fn test_zero_charge_particles_become_orphans() {
        let cb = codebook();
        let mut field = ParticleField::new();
        field.add(Particle::new(cb.encode("a"), "a", ParticleCategory::Persona).with_charge(0.0));
        field.add(Particle::new(cb.encode("b"), "b", ParticleCategory::Persona).with_charge(0.0));

        let peaks = field.compute_density(0.3);
        assert_eq!(peaks.len(), 2);
        assert!(peaks.iter().all(|p| p.contributing.len() == 1));
    }

    #[test]
    fn test_unreachable_threshold_still_keeps_particles() {
        let cb = codebook();
        let mut field = ParticleField::new();
        add_decomposed(&mut field, &cb, "Mut", 3, ParticleCategory::Intent);

        // Nothing can reach a similarity above 1, so every seed is set aside.
        let peaks = field.compute_density(1.0 + f32::EPSILON * 4.0);
        assert_eq!(peaks.len(), 3);
    }

    #[test]
    fn test_peaks_ordered_by_extraction_density() {
        let cb = codebook();
        let mut field = ParticleField::new();
        add_decomposed(&mut field, &cb, "Mut", 6, ParticleCategory::Intent);
        add_decomposed(&mut field, &cb, "Angst", 2, ParticleCategory::Intent);

        let peaks = field.compute_density(0.25);
        assert!(peaks[0].density >= peaks[1].density);
        assert_eq!(field[peaks[0].contributing[0]].concept(), "Mut");
    }

    #[test]
    fn test_dominant_emotion_and_category() {
        let cb = codebook();
        let mut field = ParticleField::new();
        let intent = field.add(Particle::new(cb.encode("Mut"), "Mut#0", ParticleCategory::Intent));
        let e1 = field.add(Particle::new(cb.encode("froh"), "froh#0", ParticleCategory::Emotion));
        let e2 = field.add(Particle::new(cb.encode("froh"), "froh#1", ParticleCategory::Emotion));

        let peak = DensityPeak {
            position: cb.encode("Mut"),
            density: 1.0,
            contributing: vec![intent, e1, e2],
        };
        let emotion = peak.dominant_emotion(&field).expect("has emotion particles");
        assert!(Codebook::similarity(&emotion, &cb.encode("froh")) > 0.99);
        assert_eq!(peak.dominant_category(&field), Some(ParticleCategory::Emotion));

        let plain = DensityPeak {
            position: cb.encode("Mut"),
            density: 1.0,
            contributing: vec![intent],
        };
        assert!(plain.dominant_emotion(&field).is_none());
        assert_eq!(plain.dominant_category(&field), Some(ParticleCategory::Intent));
    }
}

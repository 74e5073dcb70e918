//! Annealing: nuclei absorb free particles while the temperature drops.
//!
//! The acceptance test is Metropolis-like: a particle is absorbed when its
//! attraction to a nucleus exceeds `temperature · U(0, 1)`, so absorption
//! gets stricter as the system cools.

use rand::Rng;
use tracing::{debug, warn};

use crate::codebook::Codebook;
use crate::nucleation::CrystalNucleus;
use crate::particle::{Particle, ParticleField};

/// Temperature the cooling loop starts at.
pub const START_TEMPERATURE: f32 = 1.0;

/// Charge-charge interaction scale in the attraction score.
const CHARGE_COUPLING: f32 = 0.01;

/// Share of the absorbed nucleus's strength kept by a force-merge.
const FORCE_MERGE_STRENGTH_SHARE: f32 = 0.5;

/// Weight of target strength when choosing a force-merge target.
const FORCE_MERGE_STRENGTH_BIAS: f32 = 0.1;

/// How strongly `nucleus` pulls `particle`.
///
/// Cosine similarity scaled by `1 + 0.01 · total_charge · charge`, or 0.0
/// when the similarity is not positive.
pub fn attraction(nucleus: &CrystalNucleus, total_charge: f32, particle: &Particle) -> f32 {
    let sim = Codebook::similarity(&nucleus.center, &particle.position);
    if sim <= 0.0 {
        return 0.0;
    }
    sim * (1.0 + CHARGE_COUPLING * total_charge * particle.charge)
}

/// Merge every pair of nuclei whose centers reach `threshold` similarity.
///
/// Scans pairs `(i, j)` with `i < j`; a merged `j` is removed and the scan
/// continues against the grown `i`. Returns the number of merges.
pub fn merge_nearby(nuclei: &mut Vec<CrystalNucleus>, threshold: f32) -> usize {
    let mut merges = 0;
    let mut i = 0;
    while i < nuclei.len() {
        let mut j = i + 1;
        while j < nuclei.len() {
            if Codebook::similarity(&nuclei[i].center, &nuclei[j].center) >= threshold {
                let other = nuclei.remove(j);
                nuclei[i].merge(other, 1.0);
                merges += 1;
            } else {
                j += 1;
            }
        }
        i += 1;
    }
    merges
}

/// Outcome counters of one [`cool`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoolingStats {
    pub passes: usize,
    pub absorbed: usize,
    pub merges: usize,
}

/// The cooling loop.
///
/// While `temperature > min_temperature`, every nucleus in turn offers to
/// absorb every particle that was free at the start of the pass. Absorbed
/// particles are frozen and move the nucleus center. Each pass ends with a
/// merge at `merge_threshold` and a temperature step of `cooling_rate`.
/// Stops early once no particle is free.
pub fn cool<R: Rng>(
    field: &mut ParticleField,
    nuclei: &mut Vec<CrystalNucleus>,
    cooling_rate: f32,
    min_temperature: f32,
    merge_threshold: f32,
    rng: &mut R,
) -> CoolingStats {
    let mut stats = CoolingStats::default();
    let mut temperature = START_TEMPERATURE;

    while temperature > min_temperature {
        let free = field.free_ids();
        if free.is_empty() {
            break;
        }

        for nucleus in nuclei.iter_mut() {
            let mut total_charge = nucleus.total_charge(field);
            for &id in &free {
                if field[id].is_frozen() {
                    continue;
                }
                let pull = attraction(nucleus, total_charge, &field[id]);
                let threshold = temperature * rng.gen::<f32>();
                if pull > threshold {
                    field.freeze(id);
                    nucleus.absorb(id, &field[id].position);
                    total_charge += field[id].charge;
                    stats.absorbed += 1;
                }
            }
        }

        stats.merges += merge_nearby(nuclei, merge_threshold);
        temperature -= cooling_rate;
        stats.passes += 1;
    }

    debug!(
        passes = stats.passes,
        absorbed = stats.absorbed,
        merges = stats.merges,
        nuclei = nuclei.len(),
        "cooling finished"
    );
    stats
}

/// Assign every still-free particle to the nucleus attracting it most.
///
/// Ties go to the earlier nucleus. The center is not moved. Returns the
/// number of particles assigned; 0 when there are no nuclei.
pub fn absorb_residual(field: &mut ParticleField, nuclei: &mut [CrystalNucleus]) -> usize {
    if nuclei.is_empty() {
        return 0;
    }
    let free = field.free_ids();
    for &id in &free {
        let mut best = 0;
        let mut best_pull = f32::NEG_INFINITY;
        for (k, nucleus) in nuclei.iter().enumerate() {
            let pull = attraction(nucleus, nucleus.total_charge(field), &field[id]);
            if pull > best_pull {
                best_pull = pull;
                best = k;
            }
        }
        nuclei[best].attach(id);
        field.freeze(id);
    }
    if !free.is_empty() {
        debug!(particles = free.len(), "absorbed residual particles");
    }
    free.len()
}

/// Merge the weakest nucleus into its best neighbor until at most
/// `max_crystals` remain.
///
/// The target maximizes `similarity + 0.1 · strength`; it gains half of the
/// weakest nucleus's strength. Returns the number of merges.
pub fn force_merge(nuclei: &mut Vec<CrystalNucleus>, max_crystals: usize) -> usize {
    let mut merges = 0;
    while nuclei.len() > max_crystals {
        let mut weakest = 0;
        for (k, n) in nuclei.iter().enumerate() {
            if n.strength < nuclei[weakest].strength {
                weakest = k;
            }
        }

        let mut target: Option<usize> = None;
        let mut best_score = f32::NEG_INFINITY;
        for (k, other) in nuclei.iter().enumerate() {
            if k == weakest {
                continue;
            }
            let score = Codebook::similarity(&nuclei[weakest].center, &other.center)
                + FORCE_MERGE_STRENGTH_BIAS * other.strength;
            if score > best_score {
                best_score = score;
                target = Some(k);
            }
        }

        let Some(target) = target else {
            warn!(
                nuclei = nuclei.len(),
                max_crystals, "no force-merge target, keeping nuclei above the cap"
            );
            break;
        };
        let weak = nuclei.remove(weakest);
        let target = if target > weakest { target - 1 } else { target };
        nuclei[target].merge(weak, FORCE_MERGE_STRENGTH_SHARE);
        merges += 1;
    }
    merges
}

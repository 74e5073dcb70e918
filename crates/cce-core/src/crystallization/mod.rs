//! Phase 3: crystallization.
//!
//! Nuclei grow as the plasma cools, then get capped, finalized into
//! [`Crystal`]s, shaped and nested.
//!
//! # Stages
//!
//! 1. Pre-merge nuclei whose centers are already close.
//! 2. Cooling loop ([`anneal::cool`]) with a merge after every pass.
//! 3. Residual absorption of every particle still free.
//! 4. Force-merge down to `max_crystals`.
//! 5. Finalize non-empty nuclei, detect shapes, nest small crystals.
//! 6. Order top-level crystals by strength, strongest first.
//!
//! Every loop has an explicit bound, so the phase always terminates. Empty
//! input yields empty output.

pub mod anneal;
pub mod crystal;
pub mod shape;

pub use crystal::{Crystal, CrystalId, CrystalShape};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::config::CrystallizationConfig;
use crate::nucleation::CrystalNucleus;
use crate::particle::ParticleField;

/// Run the full crystallization phase.
///
/// Afterwards every particle of `field` is frozen, provided at least one
/// nucleus was given.
pub fn crystallize(
    field: &mut ParticleField,
    mut nuclei: Vec<CrystalNucleus>,
    config: &CrystallizationConfig,
) -> Vec<Crystal> {
    if nuclei.is_empty() {
        return Vec::new();
    }
    let initial = nuclei.len();
    let mut rng = ChaCha8Rng::seed_from_u64(config.anneal_seed);

    let pre_merges = anneal::merge_nearby(&mut nuclei, config.pre_merge_threshold);
    let cooling = anneal::cool(
        field,
        &mut nuclei,
        config.cooling_rate,
        config.min_temperature,
        config.cooling_merge_threshold,
        &mut rng,
    );
    let residual = anneal::absorb_residual(field, &mut nuclei);
    let forced = anneal::force_merge(&mut nuclei, config.max_crystals);

    let mut crystals: Vec<Crystal> = nuclei
        .into_iter()
        .filter(|n| !n.is_empty())
        .enumerate()
        .map(|(i, n)| Crystal::from_nucleus(CrystalId(i), n, field))
        .collect();

    shape::detect_shapes(&mut crystals);
    let mut crystals = shape::nest(crystals, config.nest_similarity_threshold);
    crystals.sort_by(|a, b| b.strength().total_cmp(&a.strength()));

    debug!(
        nuclei = initial,
        pre_merges,
        cooling_merges = cooling.merges,
        absorbed = cooling.absorbed,
        residual,
        forced_merges = forced,
        crystals = crystals.len(),
        "crystallization complete"
    );
    crystals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codebook::Codebook;
    use crate::nucleation::nucleate;
    use crate::particle::{Particle, ParticleCategory};

    fn field_of(cb: &Codebook, words: &[(&str, usize)]) -> ParticleField {
        let mut field = ParticleField::new();
        for (word, n) in words {
            for (i, v) in cb.decompose(word, *n).into_iter().enumerate() {
                field.add(Particle::new(v, format!("{}#{}", word, i), ParticleCategory::Intent));
            }
        }
        field
    }

    #[test]
    fn test_no_nuclei_no_crystals() {
        let mut field = ParticleField::new();
        let crystals = crystallize(&mut field, Vec::new(), &CrystallizationConfig::default());
        assert!(crystals.is_empty());
    }

    #[test]
    fn test_crystallize_freezes_everything_and_sorts() {
        let cb = Codebook::new(10_000, 42).unwrap();
        let mut field = field_of(&cb, &[("Mut", 6), ("Kraft", 4), ("Angst", 2)]);
        let nuclei = nucleate(&mut field, 0.25);
        // Late arrivals that nucleation never saw.
        field.add(Particle::new(cb.encode("Mut"), "Mut#late", ParticleCategory::Intent));
        field.add(Particle::new(cb.encode("Wut"), "Wut#0", ParticleCategory::Emotion));

        let config = CrystallizationConfig::default();
        let crystals = crystallize(&mut field, nuclei, &config);

        assert!(!crystals.is_empty());
        assert!(crystals.len() <= config.max_crystals);
        assert!(crystals.windows(2).all(|w| w[0].strength() >= w[1].strength()));
        assert!(field.all_frozen());

        fn count(c: &Crystal) -> usize {
            c.particles().len() + c.children().iter().map(count).sum::<usize>()
        }
        let total: usize = crystals.iter().map(count).sum();
        assert_eq!(total, field.len());
        println!(
            "[PASS] test_crystallize_freezes_everything_and_sorts - crystals={}",
            crystals.len()
        );
    }

    #[test]
    fn test_max_crystals_caps_output() {
        let cb = Codebook::new(10_000, 42).unwrap();
        let mut field = field_of(&cb, &[("a", 2), ("b", 2), ("c", 2), ("d", 2), ("e", 2)]);
        let nuclei = nucleate(&mut field, 0.25);
        assert_eq!(nuclei.len(), 5);

        let config = CrystallizationConfig {
            max_crystals: 2,
            ..CrystallizationConfig::default()
        };
        let crystals = crystallize(&mut field, nuclei, &config);
        assert!(crystals.len() <= 2);
        let labels: Vec<&str> = crystals.iter().map(|c| c.label()).collect();
        for word in ["a", "b", "c", "d", "e"] {
            assert!(
                labels.iter().any(|l| l.split('+').any(|part| part == word)),
                "{} missing from {:?}",
                word,
                labels
            );
        }
    }

    #[test]
    fn test_crystallize_is_reproducible() {
        let cb = Codebook::new(4_000, 42).unwrap();
        let run = || {
            let mut field = field_of(&cb, &[("Mut", 3), ("Kraft", 3)]);
            let nuclei = nucleate(&mut field, 0.25);
            field.add(Particle::new(cb.encode("Angst"), "Angst#0", ParticleCategory::Intent));
            crystallize(&mut field, nuclei, &CrystallizationConfig::default())
                .iter()
                .map(|c| (c.label().to_string(), c.particles().to_vec()))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}

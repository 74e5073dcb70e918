//! The particle arena: storage, freezing, cooling and force simulation.

use std::fmt;
use std::ops::Index;

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codebook::Codebook;

use super::{Particle, ParticleId};

/// Scale of the thermal jitter added per dimension in [`ParticleField::apply_forces`].
const THERMAL_NOISE_SCALE: f32 = 0.1;

/// Guards the force denominator against zero mass.
const MASS_EPSILON: f32 = 1e-8;

/// An ordered collection of particles - the plasma.
///
/// Particles are never removed. Freezing is one-way: a frozen particle is
/// never moved again and never re-enters the free subset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticleField {
    particles: Vec<Particle>,
}

impl ParticleField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a particle and return its handle.
    pub fn add(&mut self, particle: Particle) -> ParticleId {
        self.particles.push(particle);
        ParticleId(self.particles.len() - 1)
    }

    pub fn add_many(&mut self, particles: impl IntoIterator<Item = Particle>) {
        self.particles.extend(particles);
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id.0)
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn ids(&self) -> impl Iterator<Item = ParticleId> + '_ {
        (0..self.particles.len()).map(ParticleId)
    }

    /// Handles of particles not yet frozen into a nucleus, in field order.
    pub fn free_ids(&self) -> Vec<ParticleId> {
        self.ids().filter(|id| !self[*id].is_frozen()).collect()
    }

    pub fn frozen_ids(&self) -> Vec<ParticleId> {
        self.ids().filter(|id| self[*id].is_frozen()).collect()
    }

    pub fn free_particles(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| !p.is_frozen())
    }

    pub fn frozen_particles(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| p.is_frozen())
    }

    /// Freeze a particle. Freezing an already frozen particle is a no-op.
    ///
    /// Returns `true` if the particle was free before the call.
    pub fn freeze(&mut self, id: ParticleId) -> bool {
        match self.particles.get_mut(id.0) {
            Some(p) if !p.frozen => {
                p.frozen = true;
                true
            }
            _ => false,
        }
    }

    pub fn all_frozen(&self) -> bool {
        self.particles.iter().all(|p| p.is_frozen())
    }

    /// Mean temperature of free particles, 0.0 when none are free.
    pub fn temperature(&self) -> f32 {
        let (sum, count) = self
            .free_particles()
            .fold((0.0f32, 0usize), |(s, c), p| (s + p.temperature, c + 1));
        if count == 0 {
            0.0
        } else {
            sum / count as f32
        }
    }

    /// Lower the temperature of every free particle by `rate`, floored at 0.
    pub fn cool(&mut self, rate: f32) {
        for p in self.particles.iter_mut().filter(|p| !p.frozen) {
            p.temperature = (p.temperature - rate).max(0.0);
        }
    }

    /// Move free particles toward positively correlated neighbors.
    ///
    /// The pull on `p` from `q` is `sim(p, q) · charge(q) · (q - p) / mass(p)`
    /// for every free `q` with positive similarity. Each dimension also gets
    /// `0.1 · temperature(p) · N(0, 1)` of jitter drawn from `rng`. Positions
    /// are integrated with step `dt` and re-binarized, so they stay bipolar.
    ///
    /// Particles are updated in field order, each seeing the already updated
    /// positions of the particles before it.
    pub fn apply_forces<R: Rng>(&mut self, dt: f32, rng: &mut R) {
        let free = self.free_ids();
        if free.len() < 2 {
            return;
        }

        for &id in &free {
            let force = {
                let p = &self.particles[id.0];
                let inv_mass = 1.0 / (p.mass + MASS_EPSILON);
                let mut force = vec![0.0f32; p.position.len()];

                for &other_id in &free {
                    if other_id == id {
                        continue;
                    }
                    let other = &self.particles[other_id.0];
                    let sim = p.similarity_to(other);
                    if sim <= 0.0 {
                        continue;
                    }
                    let scale = sim * other.charge * inv_mass;
                    for ((f, q), x) in force
                        .iter_mut()
                        .zip(other.position.iter())
                        .zip(p.position.iter())
                    {
                        *f += scale * (q - x);
                    }
                }

                for f in force.iter_mut() {
                    let z: f32 = rng.sample(StandardNormal);
                    *f += p.temperature * z * THERMAL_NOISE_SCALE;
                }
                force
            };

            let p = &mut self.particles[id.0];
            for (x, f) in p.position.iter_mut().zip(force.iter()) {
                *x += f * dt;
            }
            Codebook::binarize(&mut p.position, rng);
        }

        debug!(moved = free.len(), dt, "applied particle forces");
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

impl Index<ParticleId> for ParticleField {
    type Output = Particle;

    fn index(&self, id: ParticleId) -> &Particle {
        &self.particles[id.0]
    }
}

impl fmt::Display for ParticleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frozen = self.frozen_particles().count();
        write!(
            f,
            "ParticleField(total={}, free={}, frozen={}, temp={:.3})",
            self.len(),
            self.len() - frozen,
            frozen,
            self.temperature()
        )
    }
}

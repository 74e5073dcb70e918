//! Meaning-particles and the field that holds them.
//!
//! A [`Particle`] is a positioned, charged, temperature-bearing unit in
//! hypervector space. A [`ParticleField`] owns all particles of one pipeline
//! run; everything else refers to them through [`ParticleId`] handles, so
//! nuclei and peaks never alias particle state.
//!
//! # Key Types
//!
//! - [`Particle`]: one unit of meaning
//! - [`ParticleCategory`]: intent, emotion, context or persona
//! - [`ParticleField`]: arena owning the particles, with cooling and forces
//! - [`DensityPeak`]: a density maximum found by [`ParticleField::compute_density`]

pub mod density;
pub mod field;

pub use density::DensityPeak;
pub use field::ParticleField;

use serde::{Deserialize, Serialize};

use crate::codebook::{Codebook, Hypervector};

/// Stable handle of a particle inside its [`ParticleField`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticleId(pub usize);

/// The semantic input channel a particle came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticleCategory {
    Intent,
    Emotion,
    Context,
    Persona,
}

impl ParticleCategory {
    /// All categories in plasma construction order.
    pub const ALL: [ParticleCategory; 4] = [
        ParticleCategory::Intent,
        ParticleCategory::Emotion,
        ParticleCategory::Context,
        ParticleCategory::Persona,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParticleCategory::Intent => "intent",
            ParticleCategory::Emotion => "emotion",
            ParticleCategory::Context => "context",
            ParticleCategory::Persona => "persona",
        }
    }
}

/// A single meaning-particle in the plasma.
///
/// `frozen` is private: once a particle is frozen into a nucleus it stays
/// frozen, and only [`ParticleField::freeze`] can set it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    /// Location in meaning space (bipolar).
    pub position: Hypervector,
    /// Attraction strength, >= 0.
    pub charge: f32,
    /// Volatility, >= 0.
    pub temperature: f32,
    /// Resistance to movement, > 0.
    pub mass: f32,
    /// Human-readable origin, e.g. `Mut#0`, `Mut+Kraft`, `Mut~froh`.
    pub label: String,
    pub category: ParticleCategory,
    frozen: bool,
}

impl Particle {
    /// Create a free particle with unit charge and mass and temperature 0.5.
    pub fn new(position: Hypervector, label: impl Into<String>, category: ParticleCategory) -> Self {
        Self {
            position,
            charge: 1.0,
            temperature: 0.5,
            mass: 1.0,
            label: label.into(),
            category,
            frozen: false,
        }
    }

    #[must_use]
    pub fn with_charge(mut self, charge: f32) -> Self {
        self.charge = charge.max(0.0);
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.max(0.0);
        self
    }

    #[must_use]
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Cosine similarity to another particle.
    pub fn similarity_to(&self, other: &Particle) -> f32 {
        Codebook::similarity(&self.position, &other.position)
    }

    /// Label text before any `#` (drops the decomposition index).
    pub fn base_label(&self) -> &str {
        self.label.split('#').next().unwrap_or("")
    }

    /// Concept name: label text before any `#`, `~` or `+`.
    pub fn concept(&self) -> &str {
        self.label
            .split(&['#', '~', '+'][..])
            .next()
            .unwrap_or("")
    }
}

//! Configuration for the crystallization pipeline.
//!
//! All parameters are plain numbers. Parsing from TOML text is supported, but
//! reading files or the environment is left to the caller (see `cce-cli`).

use serde::{Deserialize, Serialize};

use crate::error::{CceError, CceResult};

/// Default hypervector dimension.
pub const DEFAULT_DIMENSION: usize = 10_000;

/// Default base seed for symbol encoding.
pub const DEFAULT_SEED: u64 = 42;

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub codebook: CodebookConfig,
    pub plasma: PlasmaConfig,
    pub nucleation: NucleationConfig,
    pub crystallization: CrystallizationConfig,
}

impl EngineConfig {
    /// Parse configuration from TOML text and validate it.
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn from_toml_str(content: &str) -> CceResult<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Fails fast on anything that would make the pipeline produce garbage
    /// or loop forever.
    pub fn validate(&self) -> CceResult<()> {
        self.codebook.validate()?;
        self.nucleation.validate()?;
        self.crystallization.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CodebookConfig {
    /// Hypervector dimension D.
    pub dimension: usize,
    /// Base seed XORed into every symbol seed.
    pub seed: u64,
}

impl Default for CodebookConfig {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            seed: DEFAULT_SEED,
        }
    }
}

impl CodebookConfig {
    pub fn validate(&self) -> CceResult<()> {
        if self.dimension == 0 {
            return Err(CceError::validation(
                "codebook.dimension",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlasmaConfig {
    /// Upper bound on knowledge-inference particles.
    pub max_expansions: usize,
}

impl Default for PlasmaConfig {
    fn default() -> Self {
        Self { max_expansions: 6 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NucleationConfig {
    /// Minimum cosine similarity for a particle to join a density peak.
    pub min_density_distance: f32,
}

impl Default for NucleationConfig {
    fn default() -> Self {
        Self {
            min_density_distance: 0.25,
        }
    }
}

impl NucleationConfig {
    pub fn validate(&self) -> CceResult<()> {
        if !(-1.0..=1.0).contains(&self.min_density_distance) {
            return Err(CceError::validation(
                "nucleation.min_density_distance",
                format!(
                    "must lie in [-1, 1] (cosine similarity), got {}",
                    self.min_density_distance
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CrystallizationConfig {
    /// Temperature decrement per annealing pass.
    pub cooling_rate: f32,
    /// Annealing stops once temperature drops to this floor.
    pub min_temperature: f32,
    /// Force-merge target for the number of crystals.
    pub max_crystals: usize,
    /// Center similarity for the aggressive merge before cooling.
    pub pre_merge_threshold: f32,
    /// Center similarity for the merge after each cooling pass.
    pub cooling_merge_threshold: f32,
    /// Minimum similarity for a small crystal to nest under a larger one.
    pub nest_similarity_threshold: f32,
    /// Seed for the Metropolis acceptance draws.
    pub anneal_seed: u64,
}

impl Default for CrystallizationConfig {
    fn default() -> Self {
        Self {
            cooling_rate: 0.05,
            min_temperature: 0.01,
            max_crystals: 4,
            pre_merge_threshold: 0.15,
            cooling_merge_threshold: 0.12,
            nest_similarity_threshold: 0.25,
            anneal_seed: DEFAULT_SEED,
        }
    }
}

impl CrystallizationConfig {
    pub fn validate(&self) -> CceResult<()> {
        if !self.cooling_rate.is_finite() || self.cooling_rate <= 0.0 {
            return Err(CceError::validation(
                "crystallization.cooling_rate",
                format!("must be a finite value > 0, got {}", self.cooling_rate),
            ));
        }
        if !self.min_temperature.is_finite() || self.min_temperature < 0.0 {
            return Err(CceError::validation(
                "crystallization.min_temperature",
                format!("must be a finite value >= 0, got {}", self.min_temperature),
            ));
        }
        if self.max_crystals == 0 {
            return Err(CceError::validation(
                "crystallization.max_crystals",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

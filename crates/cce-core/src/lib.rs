//! Cognitive Crystallization Engine core.
//!
//! Meaning is modelled as particles in a high-dimensional bipolar vector
//! space. A pipeline run takes four keyword inputs through three phases:
//!
//! 1. **Plasma** ([`plasma`]): words become warm, charged particles.
//! 2. **Nucleation** ([`nucleation`]): density peaks become nuclei.
//! 3. **Crystallization** ([`crystallization`]): nuclei absorb particles as
//!    the system cools and end up as shaped, nested [`Crystal`]s.
//!
//! Everything is deterministic for a given configuration: all randomness
//! comes from seeded generators scoped to the operation that needs it.
//!
//! # Example
//!
//! ```
//! use cce_core::{CrystallizationEngine, EngineConfig, SemanticInput};
//!
//! let mut engine = CrystallizationEngine::new(EngineConfig::default(), None).unwrap();
//! let output = engine.run(&SemanticInput::new("Mut Kraft Angst"));
//! assert!(!output.crystals.is_empty());
//! assert!(output.field.all_frozen());
//! ```

pub mod codebook;
pub mod config;
pub mod crystallization;
pub mod engine;
pub mod error;
pub mod knowledge;
pub mod nucleation;
pub mod particle;
pub mod plasma;

pub use codebook::{Codebook, Hypervector};
pub use config::{
    CodebookConfig, CrystallizationConfig, EngineConfig, NucleationConfig, PlasmaConfig,
};
pub use crystallization::{crystallize, Crystal, CrystalId, CrystalShape};
pub use engine::{CrystallizationEngine, Phase, PhaseLog, PipelineOutput};
pub use error::{CceError, CceResult};
pub use knowledge::{ConceptExpander, ConceptExpansion, KnowledgeGraph};
pub use nucleation::{nucleate, CrystalNucleus};
pub use particle::{DensityPeak, Particle, ParticleCategory, ParticleField, ParticleId};
pub use plasma::{create_plasma, SemanticInput};

//! The pipeline: plasma, nucleation, crystallization.
//!
//! [`CrystallizationEngine`] owns the codebook and an optional knowledge
//! source, runs the three phases for one [`SemanticInput`] and keeps a
//! [`PhaseLog`] per phase for introspection.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::codebook::Codebook;
use crate::config::EngineConfig;
use crate::crystallization::{crystallize, Crystal};
use crate::error::CceResult;
use crate::knowledge::ConceptExpander;
use crate::nucleation::{nucleate, CrystalNucleus};
use crate::particle::ParticleField;
use crate::plasma::{create_plasma, SemanticInput};

/// Pipeline phase a log entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    Plasma,
    Nucleation,
    Crystallization,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Plasma => "PLASMA",
            Phase::Nucleation => "NUCLEATION",
            Phase::Crystallization => "CRYSTALLIZATION",
        };
        f.write_str(name)
    }
}

/// Timing and summary of one phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseLog {
    pub phase: Phase,
    pub duration_ms: f64,
    pub details: serde_json::Value,
}

impl fmt::Display for PhaseLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {:.1}ms {}", self.phase, self.duration_ms, self.details)
    }
}

/// Everything one run produced.
///
/// `nuclei` is the snapshot right after nucleation; crystallization works
/// on its own copy. Particle handles in `nuclei` and `crystals` resolve
/// against `field`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub field: ParticleField,
    pub nuclei: Vec<CrystalNucleus>,
    pub crystals: Vec<Crystal>,
}

/// Runs the pipeline for one input at a time.
pub struct CrystallizationEngine {
    config: EngineConfig,
    codebook: Arc<Codebook>,
    knowledge: Option<Box<dyn ConceptExpander>>,
    logs: Vec<PhaseLog>,
}

impl CrystallizationEngine {
    /// Build an engine.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `config` is invalid.
    pub fn new(config: EngineConfig, knowledge: Option<Box<dyn ConceptExpander>>) -> CceResult<Self> {
        config.validate()?;
        let codebook = Arc::new(Codebook::from_config(&config.codebook)?);
        Ok(Self {
            config,
            codebook,
            knowledge,
            logs: Vec::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The shared codebook. Knowledge graphs built on it encode
    /// concepts to the same vectors the pipeline uses.
    pub fn codebook(&self) -> &Arc<Codebook> {
        &self.codebook
    }

    pub fn set_knowledge(&mut self, knowledge: Box<dyn ConceptExpander>) {
        self.knowledge = Some(knowledge);
    }

    pub fn has_knowledge(&self) -> bool {
        self.knowledge.is_some()
    }

    /// Logs of the most recent run.
    pub fn logs(&self) -> &[PhaseLog] {
        &self.logs
    }

    pub fn total_time_ms(&self) -> f64 {
        self.logs.iter().map(|l| l.duration_ms).sum()
    }

    /// Run plasma, nucleation and crystallization for `input`.
    pub fn run(&mut self, input: &SemanticInput) -> PipelineOutput {
        self.logs.clear();

        let start = Instant::now();
        let field = create_plasma(
            input,
            &self.codebook,
            self.knowledge.as_deref(),
            self.config.plasma.max_expansions,
        );
        self.record(
            Phase::Plasma,
            start,
            json!({
                "total_particles": field.len(),
                "temperature": field.temperature(),
            }),
        );

        self.condense(field)
    }

    /// Run nucleation and crystallization on a field built elsewhere, for
    /// example one that went through [`ParticleField::apply_forces`].
    ///
    /// # Errors
    ///
    /// Returns `CceError::DimensionMismatch` if a particle does not match
    /// the codebook dimension.
    pub fn run_field(&mut self, field: ParticleField) -> CceResult<PipelineOutput> {
        for particle in field.particles() {
            self.codebook.check_dim(&particle.position)?;
        }
        self.logs.clear();
        Ok(self.condense(field))
    }

    fn condense(&mut self, mut field: ParticleField) -> PipelineOutput {
        let start = Instant::now();
        let nuclei = nucleate(&mut field, self.config.nucleation.min_density_distance);
        self.record(
            Phase::Nucleation,
            start,
            json!({
                "nuclei_found": nuclei.len(),
                "labels": nuclei.iter().map(|n| n.label.as_str()).collect::<Vec<_>>(),
                "strengths": nuclei.iter().map(|n| n.strength).collect::<Vec<_>>(),
            }),
        );

        let start = Instant::now();
        let crystals = crystallize(&mut field, nuclei.clone(), &self.config.crystallization);
        self.record(
            Phase::Crystallization,
            start,
            json!({
                "crystals": crystals.len(),
                "shapes": crystals.iter().map(|c| c.shape).collect::<Vec<_>>(),
                "labels": crystals.iter().map(|c| c.label()).collect::<Vec<_>>(),
                "emotions": crystals.iter().map(|c| c.emotional_charge).collect::<Vec<_>>(),
                "temperatures": crystals.iter().map(|c| c.residual_temperature).collect::<Vec<_>>(),
            }),
        );

        info!(
            particles = field.len(),
            nuclei = nuclei.len(),
            crystals = crystals.len(),
            total_ms = self.total_time_ms(),
            "pipeline run complete"
        );

        PipelineOutput {
            field,
            nuclei,
            crystals,
        }
    }

    fn record(&mut self, phase: Phase, start: Instant, details: serde_json::Value) {
        self.logs.push(PhaseLog {
            phase,
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
            details,
        });
    }
}

impl fmt::Debug for CrystallizationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrystallizationEngine")
            .field("config", &self.config)
            .field("codebook", &self.codebook)
            .field("knowledge", &self.knowledge.is_some())
            .field("logs", &self.logs.len())
            .finish()
    }
}

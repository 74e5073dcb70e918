//! Printable summaries of a pipeline run.

use std::fmt::Write as _;

use cce_core::{Crystal, ParticleField, PhaseLog, PipelineOutput};
use serde::Serialize;

/// One crystal, resolved against its field.
#[derive(Debug, Clone, Serialize)]
pub struct CrystalReport {
    pub id: usize,
    pub label: String,
    pub shape: String,
    pub strength: f32,
    pub element_count: usize,
    pub emotional_charge: f32,
    pub residual_temperature: f32,
    pub concepts: Vec<String>,
    pub particles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contrast_partner: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CrystalReport>,
}

impl CrystalReport {
    pub fn new(crystal: &Crystal, field: &ParticleField) -> Self {
        Self {
            id: crystal.id.0,
            label: crystal.label().to_string(),
            shape: crystal.shape.to_string(),
            strength: crystal.strength(),
            element_count: crystal.element_count,
            emotional_charge: crystal.emotional_charge,
            residual_temperature: crystal.residual_temperature,
            concepts: crystal.unique_concepts(field),
            particles: crystal
                .particles_in(field)
                .iter()
                .map(|p| p.label.clone())
                .collect(),
            contrast_partner: crystal.contrast_partner().map(|id| id.0),
            children: crystal
                .children()
                .iter()
                .map(|c| CrystalReport::new(c, field))
                .collect(),
        }
    }
}

/// The whole run: phase logs plus crystals.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub particles: usize,
    pub nuclei: usize,
    pub total_ms: f64,
    pub phases: Vec<PhaseLog>,
    pub crystals: Vec<CrystalReport>,
}

impl RunReport {
    pub fn new(output: &PipelineOutput, logs: &[PhaseLog]) -> Self {
        Self {
            particles: output.field.len(),
            nuclei: output.nuclei.len(),
            total_ms: logs.iter().map(|l| l.duration_ms).sum(),
            phases: logs.to_vec(),
            crystals: output
                .crystals
                .iter()
                .map(|c| CrystalReport::new(c, &output.field))
                .collect(),
        }
    }

    /// Indented human-readable rendering.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for phase in &self.phases {
            let _ = writeln!(out, "{}", phase);
        }
        let _ = writeln!(
            out,
            "{} particles -> {} nuclei -> {} crystals in {:.1}ms",
            self.particles,
            self.nuclei,
            self.crystals.len(),
            self.total_ms
        );
        for crystal in &self.crystals {
            render_crystal(&mut out, crystal, 0);
        }
        out
    }
}

fn render_crystal(out: &mut String, crystal: &CrystalReport, depth: usize) {
    let indent = "  ".repeat(depth + 1);
    let _ = write!(
        out,
        "{}#{} [{}] {} strength={:.2} emo={:+.2} temp={:.2} concepts={}",
        indent,
        crystal.id,
        crystal.shape,
        crystal.label,
        crystal.strength,
        crystal.emotional_charge,
        crystal.residual_temperature,
        crystal.concepts.join(",")
    );
    if let Some(partner) = crystal.contrast_partner {
        let _ = write!(out, " vs #{}", partner);
    }
    out.push('\n');
    for child in &crystal.children {
        render_crystal(out, child, depth + 1);
    }
}

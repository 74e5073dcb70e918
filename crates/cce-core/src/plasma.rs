//! Phase 1: plasma construction.
//!
//! Turns the four semantic inputs into a warm field of particles. Four
//! particle classes are created:
//!
//! 1. **Core** particles: every word of every category decomposed into
//!    `n` particles, with charge/temperature/mass from the category profile.
//! 2. **Cross-binding** particles: one per unordered pair of intent words,
//!    bridging them in vector space so they can still merge later.
//! 3. **Emotional coloring**: each emotion word blended into the first three
//!    intent words.
//! 4. **Knowledge inference**: related concepts supplied by a
//!    [`ConceptExpander`], lower charge since they were not stated.
//!
//! Each class draws its noise from its own scoped generator.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codebook::Codebook;
use crate::knowledge::ConceptExpander;
use crate::particle::{Particle, ParticleCategory, ParticleField};

/// Per-category particle profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryProfile {
    pub particles_per_word: usize,
    pub charge: f32,
    pub temperature: f32,
    pub mass: f32,
}

/// Profiles indexed by [`ParticleCategory`]. Persona particles are heavy,
/// cold and weak, so they barely move and rarely dominate clustering.
pub const fn profile(category: ParticleCategory) -> CategoryProfile {
    match category {
        ParticleCategory::Intent => CategoryProfile {
            particles_per_word: 6,
            charge: 1.0,
            temperature: 0.5,
            mass: 1.0,
        },
        ParticleCategory::Emotion => CategoryProfile {
            particles_per_word: 4,
            charge: 0.8,
            temperature: 0.9,
            mass: 0.5,
        },
        ParticleCategory::Context => CategoryProfile {
            particles_per_word: 3,
            charge: 0.5,
            temperature: 0.3,
            mass: 1.5,
        },
        ParticleCategory::Persona => CategoryProfile {
            particles_per_word: 2,
            charge: 0.3,
            temperature: 0.1,
            mass: 2.0,
        },
    }
}

const CROSS_BINDING: CategoryProfile = CategoryProfile {
    particles_per_word: 1,
    charge: 0.6,
    temperature: 0.6,
    mass: 0.8,
};
const CROSS_BINDING_SIGNAL: f32 = 0.6;
const CROSS_BINDING_NOISE: f32 = 0.4;

const EMOTIONAL_COLORING: CategoryProfile = CategoryProfile {
    particles_per_word: 1,
    charge: 0.5,
    temperature: 0.7,
    mass: 0.7,
};
const EMOTIONAL_COLORING_SIGNAL: f32 = 0.65;
const EMOTIONAL_COLORING_NOISE: f32 = 0.35;
/// Only the first intent words take on emotional coloring.
const COLORED_INTENT_WORDS: usize = 3;

const KNOWLEDGE_INFERENCE: CategoryProfile = CategoryProfile {
    particles_per_word: 1,
    charge: 0.4,
    temperature: 0.5,
    mass: 1.2,
};
const KNOWLEDGE_SIGNAL: f32 = 0.7;
const KNOWLEDGE_NOISE: f32 = 0.3;

/// The four semantic inputs: keyword lists, whitespace separated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticInput {
    pub intent: String,
    pub emotion: String,
    pub context: String,
    pub persona: String,
}

impl SemanticInput {
    pub fn new(intent: impl Into<String>) -> Self {
        Self {
            intent: intent.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_emotion(mut self, emotion: impl Into<String>) -> Self {
        self.emotion = emotion.into();
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    #[must_use]
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    pub fn text(&self, category: ParticleCategory) -> &str {
        match category {
            ParticleCategory::Intent => &self.intent,
            ParticleCategory::Emotion => &self.emotion,
            ParticleCategory::Context => &self.context,
            ParticleCategory::Persona => &self.persona,
        }
    }

    pub fn words(&self, category: ParticleCategory) -> Vec<&str> {
        self.text(category).split_whitespace().collect()
    }
}

fn particle_from(
    position: Vec<f32>,
    label: String,
    category: ParticleCategory,
    profile: CategoryProfile,
) -> Particle {
    Particle::new(position, label, category)
        .with_charge(profile.charge)
        .with_temperature(profile.temperature)
        .with_mass(profile.mass)
}

/// Build the plasma field for one pipeline run.
///
/// `knowledge` is optional; without it no inference particles are created.
pub fn create_plasma(
    input: &SemanticInput,
    codebook: &Codebook,
    knowledge: Option<&dyn ConceptExpander>,
    max_expansions: usize,
) -> ParticleField {
    let mut field = ParticleField::new();

    for category in ParticleCategory::ALL {
        let class = profile(category);
        for word in input.words(category) {
            for (i, position) in codebook
                .decompose(word, class.particles_per_word)
                .into_iter()
                .enumerate()
            {
                field.add(particle_from(position, format!("{}#{}", word, i), category, class));
            }
        }
    }
    let core = field.len();

    let intent_words = input.words(ParticleCategory::Intent);

    let mut rng = codebook.scoped_rng("plasma/cross-binding");
    for (i, w1) in intent_words.iter().enumerate() {
        for w2 in &intent_words[i + 1..] {
            let v1 = codebook.encode(w1);
            let v2 = codebook.encode(w2);
            let position = codebook.blend_with_noise(
                &[
                    (CROSS_BINDING_SIGNAL * 0.5, v1.as_slice()),
                    (CROSS_BINDING_SIGNAL * 0.5, v2.as_slice()),
                ],
                CROSS_BINDING_NOISE,
                &mut rng,
            );
            field.add(particle_from(
                position,
                format!("{}+{}", w1, w2),
                ParticleCategory::Intent,
                CROSS_BINDING,
            ));
        }
    }
    let bindings = field.len() - core;

    let emotion_words = input.words(ParticleCategory::Emotion);
    let mut rng = codebook.scoped_rng("plasma/emotional-coloring");
    for ew in &emotion_words {
        let ev = codebook.encode(ew);
        for iw in intent_words.iter().take(COLORED_INTENT_WORDS) {
            let iv = codebook.encode(iw);
            let position = codebook.blend_with_noise(
                &[
                    (EMOTIONAL_COLORING_SIGNAL * 0.4, iv.as_slice()),
                    (EMOTIONAL_COLORING_SIGNAL * 0.6, ev.as_slice()),
                ],
                EMOTIONAL_COLORING_NOISE,
                &mut rng,
            );
            field.add(particle_from(
                position,
                format!("{}~{}", iw, ew),
                ParticleCategory::Emotion,
                EMOTIONAL_COLORING,
            ));
        }
    }
    let colorings = field.len() - core - bindings;

    let mut inferences = 0;
    if let Some(knowledge) = knowledge {
        let stated: Vec<String> = intent_words
            .iter()
            .chain(input.words(ParticleCategory::Context).iter())
            .map(|w| w.to_string())
            .collect();
        let expansions = knowledge.expand_concepts(&stated, max_expansions);
        let mut rng = codebook.scoped_rng("plasma/knowledge-inference");
        for e in expansions.into_iter().take(max_expansions) {
            let src = codebook.encode(&e.source);
            let inferred = codebook.encode(&e.inferred);
            let position = codebook.blend_with_noise(
                &[
                    (KNOWLEDGE_SIGNAL * 0.3, src.as_slice()),
                    (KNOWLEDGE_SIGNAL * 0.7, inferred.as_slice()),
                ],
                KNOWLEDGE_NOISE,
                &mut rng,
            );
            field.add(particle_from(
                position,
                format!("{}[{}:{}]", e.inferred, e.relation, e.source),
                ParticleCategory::Context,
                KNOWLEDGE_INFERENCE,
            ));
            inferences += 1;
        }
    }

    debug!(
        core,
        bindings,
        colorings,
        inferences,
        temperature = field.temperature(),
        "created plasma"
    );
    field
}

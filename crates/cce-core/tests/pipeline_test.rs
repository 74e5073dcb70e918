//! End-to-end pipeline tests: plasma -> nucleation -> crystallization.
//!
//! Each test prints the state it verifies, so a failing run shows what the
//! pipeline actually produced.

use std::sync::Arc;

use cce_core::{
    create_plasma, crystallize, nucleate, CodebookConfig, Crystal, CrystalShape,
    CrystallizationConfig, CrystallizationEngine, EngineConfig, KnowledgeGraph, ParticleField,
    SemanticInput,
};

fn all_particles(crystal: &Crystal) -> usize {
    crystal.particles().len() + crystal.children().iter().map(all_particles).sum::<usize>()
}

#[test]
fn pipeline_mut_kraft_angst_default_parameters() {
    println!("\n=== PIPELINE: intent = \"Mut Kraft Angst\" ===");

    let config = EngineConfig::default();
    let mut engine = CrystallizationEngine::new(config.clone(), None).expect("default config is valid");
    let output = engine.run(&SemanticInput::new("Mut Kraft Angst"));

    println!("STATE: particles={}, nuclei={}, crystals={}", output.field.len(), output.nuclei.len(), output.crystals.len());
    for crystal in &output.crystals {
        println!("  {}", crystal);
    }

    assert!(!output.crystals.is_empty());
    assert!(output.crystals.len() <= config.crystallization.max_crystals);
    assert!(output
        .crystals
        .windows(2)
        .all(|w| w[0].strength() >= w[1].strength()));
    assert!(output.field.all_frozen(), "every particle must end frozen");

    let held: usize = output.crystals.iter().map(all_particles).sum();
    assert_eq!(held, output.field.len(), "each particle belongs to exactly one crystal");

    println!("[EVIDENCE] non-empty, strength-descending, capped, all frozen - SUCCESS");
}

#[test]
fn pipeline_full_input_with_knowledge() {
    println!("\n=== PIPELINE: all four channels + knowledge ===");

    let config = EngineConfig {
        codebook: CodebookConfig {
            dimension: 4_000,
            seed: 42,
        },
        ..EngineConfig::default()
    };
    let mut engine = CrystallizationEngine::new(config, None).unwrap();
    let mut graph = KnowledgeGraph::new(Arc::clone(engine.codebook()));
    graph
        .load_json_str(
            r#"[
                {"subject": "Zahlen", "relation": "PARTOF", "object": "Bilanz"},
                {"subject": "Trend", "relation": "LEADSTO", "object": "Zukunft"},
                {"subject": "Quartalsbericht", "relation": "CONTEXT", "object": "Arbeit"}
            ]"#,
        )
        .unwrap();
    engine.set_knowledge(Box::new(graph));

    let input = SemanticInput::new("Zahlen schlecht Trend positiv")
        .with_emotion("frustriert hoffnungsvoll")
        .with_context("Quartalsbericht")
        .with_persona("direkt ehrlich");
    let output = engine.run(&input);

    let inferred = output
        .field
        .particles()
        .iter()
        .filter(|p| p.label.contains('['))
        .count();
    println!("STATE: particles={}, inferred={}", output.field.len(), inferred);
    for log in engine.logs() {
        println!("  {}", log);
    }

    assert_eq!(inferred, 3);
    assert!(output.crystals.len() <= 4);
    assert!(output.field.all_frozen());
    assert_eq!(engine.logs().len(), 3);

    // Contrast partners name crystals that exist in this run.
    for crystal in &output.crystals {
        if crystal.shape == CrystalShape::Contrast {
            let partner = crystal.contrast_partner().expect("contrast has a partner");
            assert!(output.crystals.iter().any(|c| c.find(partner).is_some()));
        }
    }
    println!("[EVIDENCE] knowledge particles created and absorbed - SUCCESS");
}

#[test]
fn pipeline_is_reproducible_across_engines() {
    println!("\n=== PIPELINE: reproducibility ===");
    let input = SemanticInput::new("Freiheit Verantwortung").with_emotion("ernst");
    let config = EngineConfig {
        codebook: CodebookConfig {
            dimension: 2_000,
            seed: 7,
        },
        ..EngineConfig::default()
    };

    let summarize = |config: &EngineConfig| {
        let mut engine = CrystallizationEngine::new(config.clone(), None).unwrap();
        let output = engine.run(&input);
        output
            .crystals
            .iter()
            .map(|c| (c.label().to_string(), c.shape, c.particles().to_vec()))
            .collect::<Vec<_>>()
    };
    let first = summarize(&config);
    let second = summarize(&config);
    println!("STATE: {:?}", first.iter().map(|(l, s, _)| (l, s)).collect::<Vec<_>>());
    assert_eq!(first, second);
    println!("[EVIDENCE] identical crystals for identical input - SUCCESS");
}

#[test]
fn phases_compose_by_hand() {
    println!("\n=== PIPELINE: phases called directly ===");
    let codebook = cce_core::Codebook::new(4_000, 42).unwrap();
    let input = SemanticInput::new("Mut Kraft").with_emotion("froh");
    let mut field = create_plasma(&input, &codebook, None, 6);
    let total = field.len();

    let nuclei = nucleate(&mut field, 0.25);
    let absorbed: usize = nuclei.iter().map(|n| n.size()).sum();
    println!("STATE AFTER NUCLEATION: nuclei={}, absorbed={}/{}", nuclei.len(), absorbed, total);
    assert_eq!(absorbed, total);
    assert!(field.free_ids().is_empty());

    let config = CrystallizationConfig {
        max_crystals: 1,
        ..CrystallizationConfig::default()
    };
    let crystals = crystallize(&mut field, nuclei, &config);
    assert_eq!(crystals.len(), 1);
    assert_eq!(all_particles(&crystals[0]), total);
    println!("[EVIDENCE] cap of 1 folds everything into one crystal - SUCCESS");
}

#[test]
fn empty_field_propagates_empty() {
    println!("\n=== EDGE CASE: empty field ===");
    let mut field = ParticleField::new();
    let nuclei = nucleate(&mut field, 0.25);
    let crystals = crystallize(&mut field, nuclei, &CrystallizationConfig::default());
    assert!(crystals.is_empty());
    println!("[EVIDENCE] empty -> [] without error - SUCCESS");
}

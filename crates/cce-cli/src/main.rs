//! cce-forge: run one plasma -> nucleation -> crystallization pass.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p cce-cli --bin cce-forge -- "Mut Kraft Angst" --emotion entschlossen
//!
//! # With a knowledge file and JSON output:
//! cargo run -p cce-cli --bin cce-forge -- "Zahlen schlecht Trend positiv" \
//!     --context Quartalsbericht --knowledge data/knowledge.json --json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use cce_cli::{RunReport, Settings};
use cce_core::{CrystallizationEngine, KnowledgeGraph, SemanticInput};

#[derive(Parser, Debug)]
#[command(name = "cce-forge")]
#[command(about = "Crystallize keyword input into shaped meaning clusters")]
struct Args {
    /// Intent keywords (what to say)
    intent: String,

    /// Emotion keywords
    #[arg(long, default_value = "")]
    emotion: String,

    /// Context keywords
    #[arg(long, default_value = "")]
    context: String,

    /// Persona keywords
    #[arg(long, default_value = "")]
    persona: String,

    /// TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON array of {subject, relation, object} triples
    #[arg(long)]
    knowledge: Option<PathBuf>,

    /// Override the hypervector dimension
    #[arg(long)]
    dim: Option<usize>,

    /// Override the codebook seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the crystal cap
    #[arg(long)]
    max_crystals: Option<usize>,

    /// Print the run as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref()).context("loading settings")?;
    if let Some(dim) = args.dim {
        settings.engine.codebook.dimension = dim;
    }
    if let Some(seed) = args.seed {
        settings.engine.codebook.seed = seed;
    }
    if let Some(max_crystals) = args.max_crystals {
        settings.engine.crystallization.max_crystals = max_crystals;
    }
    settings.validate().context("validating settings")?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.logging.tracing_level())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("installing tracing subscriber")?;

    let mut engine = CrystallizationEngine::new(settings.engine.clone(), None)?;

    if let Some(path) = &args.knowledge {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading knowledge file {}", path.display()))?;
        let mut graph = KnowledgeGraph::new(engine.codebook().clone());
        let relations = graph
            .load_json_str(&json)
            .with_context(|| format!("parsing knowledge file {}", path.display()))?;
        info!(relations, nodes = graph.stats().nodes, "knowledge loaded");
        engine.set_knowledge(Box::new(graph));
    }

    let input = SemanticInput::new(args.intent)
        .with_emotion(args.emotion)
        .with_context(args.context)
        .with_persona(args.persona);
    let output = engine.run(&input);
    let report = RunReport::new(&output, engine.logs());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render());
    }
    Ok(())
}

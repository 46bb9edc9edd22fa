use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

mod core;
mod graph;
mod index;

use crate::core::{FactSet, Normalizer};
use crate::index::{IndexedResult, SearchOptions};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "symgraph",
    version = "0.1.0",
    author = "symgraph developers",
    about = "Queryable symbol knowledge graphs from extracted code facts"
)]
struct Cli {
    /// Fact document (JSON) or directory of fact documents
    #[arg(short, long, value_name = "PATH")]
    input: PathBuf,

    /// Output file for the persisted index
    #[arg(short, long, value_name = "FILE", default_value = "symgraph.json")]
    output: PathBuf,

    /// Run a substring search against the built index and print matches
    #[arg(long, value_name = "PATTERN")]
    search: Option<String>,

    /// Run a fuzzy name search against the built index and print matches
    #[arg(long, value_name = "QUERY")]
    fuzzy: Option<String>,

    /// Minimum fuzzy score to report
    #[arg(long, value_name = "SCORE", default_value_t = 0.5)]
    threshold: f64,

    /// Print the top N dependency hotspots
    #[arg(long, value_name = "N")]
    hotspots: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let start_time = Instant::now();

    println!("symgraph - symbol knowledge graph builder");
    println!("Input: {}", cli.input.display());
    println!("Output: {}", cli.output.display());

    println!("Loading facts...");
    let facts = load_facts(&cli.input)?;
    println!(
        "Loaded {} classes, {} modules, {} methods, {} calls, {} mixins",
        facts.classes.len(),
        facts.modules.len(),
        facts.methods.len(),
        facts.method_calls.len(),
        facts.mixins.len()
    );

    println!("Resolving and deduplicating...");
    let normalized = Normalizer::default().normalize(facts);
    if !normalized.errors.is_empty() {
        eprintln!(
            "Warning: {} record-level problems recorded",
            normalized.errors.len()
        );
    }

    println!("Building graphs...");
    let indexed = IndexedResult::from_normalized(&normalized);
    let stats = indexed.stats();
    println!(
        "Indexed {} classes, {} modules, {} methods",
        stats.classes, stats.modules, stats.methods
    );
    println!(
        "Graphs: inheritance {}/{}, dependency {}/{}, calls {}/{}, mixins {}/{} (nodes/edges)",
        stats.inheritance.nodes,
        stats.inheritance.edges,
        stats.dependency.nodes,
        stats.dependency.edges,
        stats.method_call.nodes,
        stats.method_call.edges,
        stats.mixin.nodes,
        stats.mixin.edges
    );
    if stats.cycles > 0 {
        println!("Detected {} dependency cycles", stats.cycles);
    }
    if stats.missing_references > 0 {
        println!("Recorded {} missing references", stats.missing_references);
    }

    indexed.save(&cli.output)?;
    println!("Index written to {}", cli.output.display());

    if let Some(pattern) = &cli.search {
        let matches = indexed.search(pattern, &SearchOptions::default())?;
        println!("Search '{}': {} matches", pattern, matches.len());
        for entity in matches {
            println!("  {} ({})", entity.fqname(), entity.kind());
        }
    }

    if let Some(query) = &cli.fuzzy {
        let matches = indexed.fuzzy_search(query, cli.threshold);
        println!("Fuzzy '{}': {} matches", query, matches.len());
        for m in matches {
            println!("  {:.3}  {}", m.score, m.fqname);
        }
    }

    if let Some(limit) = cli.hotspots {
        println!("Top {} dependency hotspots:", limit);
        for hotspot in indexed.hotspots(limit) {
            println!("  {:>4}  {}", hotspot.fan_in, hotspot.fqname);
        }
    }

    println!(
        "Total execution time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Read one fact document, or merge every `*.json` under a directory in
/// file-name order. Unreadable files are skipped with a warning.
fn load_facts(input: &Path) -> Result<FactSet> {
    if !input.is_dir() {
        return FactSet::from_path(input);
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(input)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().map_or(false, |ext| ext == "json"))
        .collect();
    paths.sort();

    let mut facts = FactSet::default();
    for path in &paths {
        match FactSet::from_path(path) {
            Ok(set) => facts.merge(set),
            Err(err) => eprintln!("Warning: Failed to read {}: {}", path.display(), err),
        }
    }
    Ok(facts)
}

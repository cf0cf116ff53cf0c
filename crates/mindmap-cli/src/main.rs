//! Command-line inspector for `.jtree` mind-map documents.
//!
//! A thin frontend over `mindmap-core` for scripting and debugging:
//! create, validate, flatten and lay out documents without the GUI.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mindmap_core::{codec, export, Forest, LayoutEngine, MonospaceMeasure};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "mindmap",
    about = "Inspect and manipulate .jtree mind-map documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new document with a single root node
    New {
        /// Path of the document to create
        file: PathBuf,
    },
    /// Print the document as a tab-indented outline
    Show {
        /// Document to read
        file: PathBuf,
    },
    /// Validate the document structure and report statistics
    Check {
        /// Document to read
        file: PathBuf,
    },
    /// Print the computed position of every visible node
    Layout {
        /// Document to read
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::New { file } => run_new(&file),
        Command::Show { file } => run_show(&file),
        Command::Check { file } => run_check(&file),
        Command::Layout { file } => run_layout(&file),
    }
}

fn load(path: &Path) -> Result<Forest> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    codec::from_json(&json).with_context(|| format!("failed to decode {}", path.display()))
}

fn run_new(path: &Path) -> Result<()> {
    let forest = Forest::new();
    fs::write(path, codec::to_json(&forest))
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("created {}", path.display());
    Ok(())
}

fn run_show(path: &Path) -> Result<()> {
    let forest = load(path)?;
    for root in forest.roots() {
        if let Some(text) = export::plain_text(&forest, root) {
            println!("{text}");
        }
    }
    Ok(())
}

fn run_check(path: &Path) -> Result<()> {
    let forest = load(path)?;
    forest
        .check_invariants()
        .map_err(|violation| anyhow::anyhow!(violation))
        .with_context(|| format!("{} is structurally invalid", path.display()))?;
    println!(
        "{}: ok ({} nodes, {} roots)",
        path.display(),
        forest.len(),
        forest.roots().len()
    );
    Ok(())
}

fn run_layout(path: &Path) -> Result<()> {
    let forest = load(path)?;
    let layout = LayoutEngine::default().compute(&forest, &MonospaceMeasure::default());
    for id in layout.order() {
        if let (Some(position), Some(node)) = (layout.position(id), forest.get(id)) {
            println!(
                "{:>8.1} {:>8.1} {:>6.1}  {}",
                position.x, position.y, position.height, node.name
            );
        }
    }
    Ok(())
}

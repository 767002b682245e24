//! noet-ptx CLI tool
//!
//! Command-line interface for converting a vault of markdown notes into PreTeXt sections.
//!
//! ## Commands
//!
//! - `convert <source> <dest>`: Convert every note, write one section per note and an include
//!   manifest, optionally with a link-graph JSON file
//! - `graph <sections-dir>`: Rebuild the link-graph JSON from already written sections
//!
//! Logging goes through `tracing`; `RUST_LOG` overrides the level picked by `--verbose`.

use clap::{Parser, Subcommand};
use noet_pretext::{compiler::DocumentCompiler, config::ConvertConfig, scan::scan_sections_dir};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "noet-ptx")]
#[command(author, version, about = "Convert markdown notes to PreTeXt sections", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a directory of notes into PreTeXt section files
    Convert {
        /// Directory holding the notes
        source: PathBuf,

        /// Output directory for the PreTeXt files
        dest: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Also write the link-graph JSON
        #[arg(long)]
        generate_graph: bool,

        /// Where to write the link-graph JSON
        #[arg(long, default_value = "notes-graph.json")]
        graph_output: PathBuf,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Build the link-graph JSON by scanning finished section files
    Graph {
        /// Directory holding the section files
        sections: PathBuf,

        /// Where to write the link-graph JSON
        #[arg(short, long, default_value = "notes-graph.json")]
        output: PathBuf,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<ConvertConfig, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(path) => ConvertConfig::load(path)?,
        None => ConvertConfig::default(),
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            source,
            dest,
            verbose,
            generate_graph,
            graph_output,
            config,
        } => {
            init_tracing(verbose);
            let config = load_config(config)?;
            let compiler = DocumentCompiler::new(&source, &dest, config)?;
            let compilation = compiler.compile()?;

            for failure in &compilation.corpus.failures {
                eprintln!("[ERROR] Failed to parse {:?}: {}", failure.path, failure.error);
            }
            println!(
                "\nConverted {} notes to {}",
                compilation.written.len(),
                dest.display()
            );
            if verbose {
                let stats = compilation.stats();
                println!("Resolved references: {}", stats.resolved_references);
                println!("Unresolved references: {}", stats.unresolved_references);
                println!("Ambiguous title/alias keys: {}", stats.key_collisions);
                println!("Failures: {}", stats.failures);
            }

            if generate_graph {
                compiler.write_graph(&compilation.corpus, &graph_output)?;
                println!("Generated graph data: {}", graph_output.display());
            }
            Ok(())
        }

        Commands::Graph {
            sections,
            output,
            config,
            verbose,
        } => {
            init_tracing(verbose);
            let config = load_config(config)?;
            let payload = scan_sections_dir(&sections, &config)?;
            payload.write(&output)?;
            println!(
                "Generated graph with {} notes and {} links",
                payload.nodes.len(),
                payload.links.len()
            );
            println!("  Output: {}", output.display());
            Ok(())
        }
    }
}

//! # noet-pretext
//!
//! A Rust library for converting a vault of interlinked markdown notes into PreTeXt sections.
//!
//! ## Overview
//!
//! noet-pretext reads notes written in the Obsidian dialect of markdown (YAML front-matter,
//! `[[wikilinks]]`, callouts, math) and writes one PreTeXt `<section>` per note. Cross-note
//! references become `<xref>` elements against stable, reproducible ids, and every note lists
//! the notes that reference it.
//!
//! ### Key Features
//!
//! - **Stable identifiers**: ids are slugs of note titles; collisions get a short hash of the note
//!   path, so reruns on the same vault produce the same ids
//! - **Two-pass resolution**: every note is parsed before any reference is resolved, so forward
//!   references and cycles need no special handling
//! - **Backlinks**: computed from resolved references and appended to each section
//! - **Well-formed output**: a stack-based finalizer nests content under headers and always closes
//!   what it opens
//! - **Error tolerance**: malformed front-matter, unreadable notes and unresolved references are
//!   logged and skipped, never fatal
//! - **Link graph**: an optional JSON payload of nodes and deduplicated links for visualization
//!
//! ## Architecture
//!
//! - **[`note`]**: parsed notes and link edges
//! - **[`ident`]**: slugs and the id assigner
//! - **[`codec`]**: per-note conversion (front-matter, transformer, finalizer)
//! - **[`corpus`]**: the corpus passes (`parse_all`, `CorpusIndex::build`, `resolve_all`)
//! - **[`assemble`]**: sections, include manifest and graph payload
//! - **[`compiler`]**: filesystem orchestration (`DocumentCompiler`)
//! - **[`scan`]**: graph payload from already written sections
//!
//! ## Quick Start
//!
//! Convert a directory of notes:
//!
//! ```rust,no_run
//! use noet_pretext::compiler::DocumentCompiler;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let compiler = DocumentCompiler::simple("./vault", "./source/sections")?;
//!     let compilation = compiler.compile()?;
//!
//!     for failure in &compilation.corpus.failures {
//!         eprintln!("skipped {:?}: {}", failure.path, failure.error);
//!     }
//!     compiler.write_graph(&compilation.corpus, "notes-graph.json")?;
//!     Ok(())
//! }
//! ```
//!
//! Or drive the passes directly over in-memory notes:
//!
//! ```rust
//! use noet_pretext::{assemble::render_section, config::ConvertConfig, corpus::Corpus, note::NoteSource};
//!
//! let corpus = Corpus::load(
//!     vec![
//!         NoteSource::new("alpha.md", "See [[Beta]]."),
//!         NoteSource::new("beta.md", "---\ntitle: Beta\n---\nHello."),
//!     ],
//!     &ConvertConfig::default(),
//! );
//! let beta = corpus.get("sec-beta").unwrap();
//! assert!(beta.backlinks.contains("sec-alpha"));
//! assert!(render_section(beta, &corpus.index).contains("This note is referenced by: <xref ref=\"sec-alpha\"/>"));
//! ```

pub mod assemble;
pub mod codec;
pub mod compiler;
pub mod config;
pub mod corpus;
pub mod error;
pub mod graph;
pub mod ident;
pub mod note;
pub mod paths;
pub mod scan;

pub use error::*;

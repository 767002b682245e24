//! Per-note text conversion: from a note's markdown body to a PreTeXt fragment.
//!
//! ## Key Components
//!
//! - [`frontmatter`] - splits the optional YAML block from the body
//! - [`wikilink`] - finds `[[target]]` references and renders them as `<xref>` elements
//! - [`inline`] - the inline IR ([`inline::InlineText`]) and the math, link and emphasis stages
//! - [`token`] - the block token IR handed from the transformer to the finalizer
//! - [`transform`] - the ordered rewrite cascade producing [`token::Token`]s
//! - [`finalize`] - the stack-based finalizer producing balanced output
//!
//! ## Pipeline
//!
//! The transformer cuts callouts, fenced code and block math out of the body, splits the rest
//! into lines and runs the inline stages (math, cross-references, links) before regrouping lines
//! into headers, lists and block quotes. Emphasis runs last. The finalizer then walks the tokens
//! once, nesting content under headers by level.
//!
//! Cross-references resolve against a [`CorpusIndex`], so every note of the corpus must have been
//! parsed before any body is converted:
//!
//! ```rust
//! use noet_pretext::{
//!     codec::convert_body,
//!     corpus::CorpusIndex,
//!     ident::IdAssigner,
//!     note::{Note, NoteSource},
//! };
//!
//! let mut ids = IdAssigner::new("sec-");
//! let other = Note::parse(&NoteSource::new("Other Note.md", "Hello."), &mut ids)?;
//! let index = CorpusIndex::build(&[other]);
//!
//! let xml = convert_body("# Intro\nSee [[Other Note]].", &index);
//! assert_eq!(
//!     xml,
//!     "<subsection xml:id=\"subsec-intro\">\n<title>Intro</title>\n\
//!      <p>See <xref ref=\"sec-other-note\"/>.</p>\n</subsection>"
//! );
//! # Ok::<(), noet_pretext::ConvertError>(())
//! ```

pub mod finalize;
pub mod frontmatter;
pub mod inline;
pub mod token;
pub mod transform;
pub mod wikilink;

use crate::corpus::CorpusIndex;

pub use finalize::{finalize, Finalizer};
pub use frontmatter::{extract_frontmatter, ExtractedDocument, Metadata, MetadataStatus};
pub use transform::transform;

/// Transform then finalize one note body.
pub fn convert_body(body: &str, index: &CorpusIndex) -> String {
    finalize(transform(body, index))
}

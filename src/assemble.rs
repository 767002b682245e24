//! Document assembly: per-note sections, the include manifest and the graph payload.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use crate::{
    codec::{convert_body, inline::escape_xml},
    config::ConvertConfig,
    corpus::{Corpus, CorpusIndex},
    graph::{GraphNode, GraphPayload, LinkGraph},
    note::Note,
};

static DASH_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-{2,}").expect("dash run pattern is valid"));

const MANIFEST_HEADER: &str =
    "<!-- Auto-generated includes for converted notes -->\n<!-- Copy these into your chapter file -->\n";

/// Convert a note's body and wrap it as a complete `<section>`.
pub fn render_section(note: &Note, index: &CorpusIndex) -> String {
    section_xml(note, &convert_body(&note.body, index))
}

/// Wrap already converted content as a note's `<section>`.
pub fn section_xml(note: &Note, content: &str) -> String {
    let tags = if note.tags.is_empty() {
        String::new()
    } else {
        format!("<!-- tags: {} -->\n", comment_text(&note.tags.join(", ")))
    };
    format!(
        "{tags}<section xml:id=\"{}\">\n<title>{}</title>\n\n{content}\n{}\n</section>\n",
        note.id,
        escape_xml(&note.title),
        backlinks_xml(&note.backlinks)
    )
}

/// `--` may not appear inside an XML comment.
fn comment_text(text: &str) -> String {
    DASH_RUNS.replace_all(text, "-").into_owned()
}

/// The generated backlinks block, empty when nothing references the note.
fn backlinks_xml(backlinks: &BTreeSet<String>) -> String {
    if backlinks.is_empty() {
        return String::new();
    }
    let refs = backlinks
        .iter()
        .map(|id| format!("<xref ref=\"{id}\"/>"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "\n<paragraphs>\n<title>Backlinks</title>\n<p>\nThis note is referenced by: {refs}\n</p>\n</paragraphs>"
    )
}

/// One `xi:include` per note, ordered by title ignoring case.
pub fn render_manifest(notes: &[Note], config: &ConvertConfig) -> String {
    let mut ordered = notes.iter().collect::<Vec<_>>();
    ordered.sort_by_cached_key(|note| note.title.to_lowercase());
    let includes = ordered
        .iter()
        .map(|note| {
            format!(
                "<xi:include href=\"{}\"/>",
                config.output_file_name(&note.id)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("{MANIFEST_HEADER}\n{includes}\n")
}

/// The first `max_chars` characters of `body`, trimmed, with `...` when the body was longer.
pub fn description(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", body[..cut].trim()),
        None => body.trim().to_string(),
    }
}

pub fn graph_node(note: &Note, config: &ConvertConfig) -> GraphNode {
    GraphNode {
        tags: note.tags.clone(),
        aliases: note.aliases.clone(),
        description: description(&note.body, config.description_length),
        created: note.created.clone(),
        modified: note.modified.clone(),
        ..GraphNode::new(&note.id, &note.title)
    }
}

/// Nodes in corpus order and one link per ordered pair, references taking precedence.
#[tracing::instrument(skip_all)]
pub fn graph_payload(corpus: &Corpus, config: &ConvertConfig) -> GraphPayload {
    let nodes = corpus
        .notes
        .iter()
        .map(|note| graph_node(note, config))
        .collect();
    let edges = corpus.edges();
    let mut graph = LinkGraph::new();
    graph.extend_edges(&edges);
    GraphPayload {
        nodes,
        links: graph.links(),
        ..Default::default()
    }
}

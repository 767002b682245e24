//! Rebuild a graph payload from already written section files.
//!
//! Only a fixed set of markers is read: the section id, the first `<title>`, an
//! `<introduction>` paragraph, a `<!-- tags: ... -->` comment and every `<xref ref>`. Files
//! without a section id are not notes (the include manifest, for one) and are skipped.

use once_cell::sync::Lazy;
use regex::Regex;
use std::{
    fs::{read_dir, read_to_string},
    path::{Path, PathBuf},
};

use crate::{
    config::ConvertConfig,
    error::ConvertError,
    graph::{GraphMetadata, GraphNode, GraphPayload, LinkGraph, GRAPH_SCHEMA},
    note::LinkKind,
    paths::{has_extension, os_path_to_string},
};

static SECTION_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<section xml:id="([^"]+)""#).expect("section pattern is valid"));
static TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<title>([^<]+)</title>").expect("title pattern is valid"));
static INTRODUCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<introduction>\s*<p>([^<]+)</p>").expect("introduction pattern is valid")
});
static TAGS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<!--\s*Tags?:\s*(.*?)\s*-->").expect("tags pattern is valid")
});
static XREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<xref\s+ref="([^"]+)""#).expect("xref pattern is valid"));

const GRAPH_DESCRIPTION: &str = "Interactive visualization of note connections";

/// The markers read from one section file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedSection {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    /// Referenced ids in document order, the section itself excluded.
    pub references: Vec<String>,
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

fn first_group(pattern: &Regex, content: &str) -> Option<String> {
    pattern
        .captures(content)
        .and_then(|captures| captures.get(1))
        .map(|m| unescape_xml(m.as_str().trim()))
}

pub fn scan_section(content: &str) -> Option<ScannedSection> {
    let id = first_group(&SECTION_ID, content)?;
    let tags = first_group(&TAGS, content)
        .map(|tags| {
            tags.split(',')
                .map(|tag| tag.trim().to_string())
                .filter(|tag| !tag.is_empty())
                .collect()
        })
        .unwrap_or_default();
    let references = XREF
        .captures_iter(content)
        .filter_map(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|target| *target != id)
        .collect();
    Some(ScannedSection {
        title: first_group(&TITLE, content),
        description: first_group(&INTRODUCTION, content),
        tags,
        references,
        id,
    })
}

/// Section files directly inside `dir`, sorted by name.
fn section_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, ConvertError> {
    let mut files = Vec::new();
    for entry in read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Build a graph payload from every section file in `dir`.
#[tracing::instrument(skip(config))]
pub fn scan_sections_dir(dir: &Path, config: &ConvertConfig) -> Result<GraphPayload, ConvertError> {
    if !dir.is_dir() {
        return Err(ConvertError::NotFound(format!(
            "sections directory {dir:?} does not exist"
        )));
    }
    let base = dir.parent().unwrap_or(dir);

    let mut sections = Vec::new();
    let mut nodes = Vec::new();
    for path in section_files(dir, &config.output_extension)? {
        let content = read_to_string(&path)?;
        let Some(section) = scan_section(&content) else {
            tracing::debug!("No section id in {:?}, skipping", path);
            continue;
        };
        let relative = path.strip_prefix(base).unwrap_or(path.as_path());
        nodes.push(GraphNode {
            tags: section.tags.clone(),
            description: section.description.clone().unwrap_or_default(),
            file: Some(os_path_to_string(relative)),
            ..GraphNode::new(
                &section.id,
                section.title.clone().unwrap_or_else(|| section.id.clone()),
            )
        });
        sections.push(section);
    }

    let mut graph = LinkGraph::new();
    for section in &sections {
        for target in &section.references {
            graph.add(&section.id, target, LinkKind::Reference);
        }
    }
    let links = graph.links();

    Ok(GraphPayload {
        schema: Some(GRAPH_SCHEMA.to_string()),
        metadata: Some(GraphMetadata {
            title: config.graph_title.clone(),
            description: GRAPH_DESCRIPTION.to_string(),
            total_notes: nodes.len(),
            total_links: links.len(),
        }),
        nodes,
        links,
    })
}

//! Link-graph payload shared by the converter and the scan tool.

use petgraph::{graphmap::GraphMap, Directed};
use serde::{Deserialize, Serialize};
use std::{fs::write, path::Path};

use crate::{
    error::ConvertError,
    note::{LinkEdge, LinkKind},
};

pub const GRAPH_SCHEMA: &str = "notes-graph-schema.json";

/// Directed note-id graph; an edge weight records the first kind seen for its pair.
pub type IdGraph<'a> = GraphMap<&'a str, LinkKind, Directed>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    /// Section file the node was scanned from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let id = id.into();
        GraphNode {
            url: format!("{id}.html"),
            id,
            title: title.into(),
            tags: Vec::new(),
            aliases: Vec::new(),
            description: String::new(),
            created: None,
            modified: None,
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: LinkKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub title: String,
    pub description: String,
    pub total_notes: usize,
    pub total_links: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphPayload {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<GraphMetadata>,
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl GraphPayload {
    pub fn to_json_pretty(&self) -> Result<String, ConvertError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), ConvertError> {
        let path = path.as_ref();
        write(path, self.to_json_pretty()?)?;
        tracing::info!(
            "Generated graph data with {} nodes and {} links: {:?}",
            self.nodes.len(),
            self.links.len(),
            path
        );
        Ok(())
    }
}

/// Keeps the first edge for every ordered `(source, target)` pair, in insertion order.
#[derive(Debug, Default)]
pub struct LinkGraph<'a> {
    graph: IdGraph<'a>,
    order: Vec<(&'a str, &'a str)>,
}

impl<'a> LinkGraph<'a> {
    pub fn new() -> Self {
        LinkGraph {
            graph: IdGraph::new(),
            order: Vec::new(),
        }
    }

    /// Returns whether the edge was kept. Self-loops are never kept: a note's link to itself shows
    /// in its own backlinks but not as an edge of the exported graph.
    pub fn add(&mut self, source: &'a str, target: &'a str, kind: LinkKind) -> bool {
        if source == target || self.graph.contains_edge(source, target) {
            return false;
        }
        self.graph.add_edge(source, target, kind);
        self.order.push((source, target));
        true
    }

    pub fn extend_edges<I>(&mut self, edges: I)
    where
        I: IntoIterator<Item = &'a LinkEdge>,
    {
        for edge in edges {
            self.add(&edge.source, &edge.target, edge.kind);
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn links(&self) -> Vec<GraphLink> {
        self.order
            .iter()
            .filter_map(|&(source, target)| {
                self.graph
                    .edge_weight(source, target)
                    .map(|kind| GraphLink {
                        source: source.to_string(),
                        target: target.to_string(),
                        kind: *kind,
                    })
            })
            .collect()
    }
}

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fmt::{Display, Formatter},
    path::PathBuf,
};

use crate::{
    codec::{
        frontmatter::{extract_frontmatter, MetadataStatus},
        wikilink::extract_references,
    },
    error::ConvertError,
    ident::IdAssigner,
    paths::file_stem,
};

/// Raw input for one note: its root-relative path and full text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteSource {
    pub path: PathBuf,
    pub text: String,
}

impl NoteSource {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        NoteSource {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// One parsed note.
///
/// Created by [`Note::parse`]; afterwards only [`crate::corpus::resolve_all`] touches it, and only
/// to fill `backlinks`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub path: PathBuf,
    pub title: String,
    pub id: String,
    pub body: String,
    pub tags: Vec<String>,
    pub aliases: Vec<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
    /// Raw `[[target]]` keys found in the body, case preserved.
    pub links_to: BTreeSet<String>,
    /// Ids of notes whose body references this note.
    pub backlinks: BTreeSet<String>,
    pub metadata_status: MetadataStatus,
}

impl Note {
    /// Split metadata from body, pick the title, claim an id and collect outgoing references.
    pub fn parse(source: &NoteSource, ids: &mut IdAssigner) -> Result<Note, ConvertError> {
        let stem = file_stem(&source.path).ok_or_else(|| {
            ConvertError::Codec(format!("{:?} does not name a note file", source.path))
        })?;
        let extracted = extract_frontmatter(&source.text);
        if let MetadataStatus::Malformed(reason) = &extracted.status {
            tracing::warn!(
                "Malformed front-matter in {:?}, treating note as metadata-less: {}",
                source.path,
                reason
            );
        }
        let metadata = extracted.metadata;
        let title = metadata.title.unwrap_or(stem);
        let id = ids.assign(&title, &source.path);
        let links_to = extract_references(extracted.body);

        Ok(Note {
            path: source.path.clone(),
            title,
            id,
            body: extracted.body.to_string(),
            tags: metadata.tags,
            aliases: metadata.aliases,
            created: metadata.created,
            modified: metadata.modified,
            links_to,
            backlinks: BTreeSet::new(),
            metadata_status: extracted.status,
        })
    }

    /// Lower-cased keys this note answers to as a title: its title and its file stem.
    pub fn title_keys(&self) -> Vec<String> {
        let mut keys = vec![self.title.to_lowercase()];
        if let Some(stem) = file_stem(&self.path) {
            keys.push(stem.to_lowercase());
        }
        keys
    }

    pub fn alias_keys(&self) -> impl Iterator<Item = String> + '_ {
        self.aliases.iter().map(|alias| alias.to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Reference,
    Backlink,
}

impl Display for LinkKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkKind::Reference => write!(f, "reference"),
            LinkKind::Backlink => write!(f, "backlink"),
        }
    }
}

/// A directed edge between two note ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkEdge {
    pub source: String,
    pub target: String,
    pub kind: LinkKind,
}

impl LinkEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: LinkKind) -> Self {
        LinkEdge {
            source: source.into(),
            target: target.into(),
            kind,
        }
    }
}

//! Slugs and stable note identifiers.
//!
//! Note ids are derived from titles, namespaced with a prefix (`sec-` by default), and made
//! unique across a corpus by a short hash of the note's path. Assignment happens in corpus-scan
//! order, which [`crate::corpus::parse_all`] fixes by sorting on path; the same corpus therefore
//! always receives the same ids.

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::{collections::BTreeSet, path::Path};

use crate::paths::{file_stem, os_path_to_string};

static NON_SLUG_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s-]").expect("slug pattern is valid"));
static SEPARATOR_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s_]+").expect("separator pattern is valid"));
static HYPHEN_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("hyphen pattern is valid"));
static NON_STEM_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w-]").expect("stem pattern is valid"));

/// Hex digits of the path hash used for the first disambiguation attempt.
const HASH_SUFFIX_LEN: usize = 6;

/// Turn free text into a lower-case, hyphenated slug.
///
/// Characters other than word characters, whitespace and hyphens are dropped, whitespace and
/// underscore runs become a single hyphen, and leading/trailing hyphens are trimmed. The result
/// may be empty.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    let hyphenated = SEPARATOR_RUNS.replace_all(&stripped, "-");
    let collapsed = HYPHEN_RUNS.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

/// Sanitized file stem, used when a title slugs to nothing.
fn stem_slug(path: &Path) -> String {
    let stem = file_stem(path).unwrap_or_default().to_lowercase();
    NON_STEM_CHARS.replace_all(&stem, "-").to_string()
}

/// Hex sha256 of the separator-normalised path.
pub fn path_hash<P: AsRef<Path>>(path: P) -> String {
    hex::encode(Sha256::digest(os_path_to_string(path).as_bytes()))
}

/// Hands out corpus-unique ids. Feed it notes in scan order.
#[derive(Debug, Clone, Default)]
pub struct IdAssigner {
    prefix: String,
    assigned: BTreeSet<String>,
}

impl IdAssigner {
    pub fn new(prefix: impl Into<String>) -> Self {
        IdAssigner {
            prefix: prefix.into(),
            assigned: BTreeSet::new(),
        }
    }

    /// The id a note would get if nothing else had claimed it yet.
    pub fn base_id(&self, title: &str, path: &Path) -> String {
        let mut slug = slugify(title);
        if slug.is_empty() {
            slug = stem_slug(path);
        }
        format!("{}{slug}", self.prefix)
    }

    pub fn assign(&mut self, title: &str, path: &Path) -> String {
        let base = self.base_id(title, path);
        let id = if self.assigned.contains(&base) {
            let id = self.disambiguate(&base, path);
            tracing::warn!(
                "Id '{}' already taken, assigning '{}' to {:?}",
                base,
                id,
                path
            );
            id
        } else {
            base
        };
        self.assigned.insert(id.clone());
        id
    }

    pub fn assigned(&self) -> &BTreeSet<String> {
        &self.assigned
    }

    fn disambiguate(&self, base: &str, path: &Path) -> String {
        let digest = path_hash(path);
        for len in [HASH_SUFFIX_LEN, 8, 12, 16, digest.len()] {
            let candidate = format!("{base}-{}", &digest[..len]);
            if !self.assigned.contains(&candidate) {
                return candidate;
            }
        }
        let mut counter = 2usize;
        loop {
            let candidate = format!("{base}-{}-{counter}", &digest[..HASH_SUFFIX_LEN]);
            if !self.assigned.contains(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }
}

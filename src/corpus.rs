//! Corpus-wide passes: parse every note, index titles and aliases, resolve references.
//!
//! The passes are explicit stages over owned data. [`parse_all`] assigns ids in sorted path
//! order, [`CorpusIndex::build`] takes a read-only snapshot of every note's keys, and
//! [`resolve_all`] recomputes backlinks from that snapshot. Nothing is resolved while parsing.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    path::PathBuf,
};

use crate::{
    config::ConvertConfig,
    error::ConvertError,
    ident::IdAssigner,
    note::{LinkEdge, LinkKind, Note, NoteSource},
};

/// A note that could not be parsed; the rest of the corpus carries on without it.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteFailure {
    pub path: PathBuf,
    pub error: ConvertError,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedCorpus {
    pub notes: Vec<Note>,
    pub failures: Vec<NoteFailure>,
}

/// Parse every source in path order, assigning ids as it goes.
///
/// Sorting here keeps collision suffixes reproducible whatever order the caller discovered the
/// files in.
#[tracing::instrument(skip_all)]
pub fn parse_all<I>(sources: I, id_prefix: &str) -> ParsedCorpus
where
    I: IntoIterator<Item = NoteSource>,
{
    let mut sources = sources.into_iter().collect::<Vec<_>>();
    sources.sort_by(|a, b| a.path.cmp(&b.path));

    let mut ids = IdAssigner::new(id_prefix);
    let mut parsed = ParsedCorpus::default();
    for source in sources {
        match Note::parse(&source, &mut ids) {
            Ok(note) => {
                tracing::debug!("Parsed: {} -> {}", note.title, note.id);
                parsed.notes.push(note);
            }
            Err(error) => {
                tracing::error!("Failed to parse {:?}: {}", source.path, error);
                parsed.failures.push(NoteFailure {
                    path: source.path,
                    error,
                });
            }
        }
    }
    parsed
}

/// Two notes claimed the same lookup key; the later one in corpus order holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCollision {
    pub key: String,
    pub replaced: String,
    pub holder: String,
}

/// Lower-cased title, stem and alias keys mapped to note ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusIndex {
    titles: BTreeMap<String, String>,
    aliases: BTreeMap<String, String>,
    ids: BTreeSet<String>,
    collisions: Vec<KeyCollision>,
}

impl CorpusIndex {
    pub fn build(notes: &[Note]) -> CorpusIndex {
        let mut index = CorpusIndex::default();
        for note in notes {
            index.ids.insert(note.id.clone());
            for key in note.title_keys() {
                Self::claim(&mut index.titles, &mut index.collisions, key, &note.id);
            }
        }
        for note in notes {
            for key in note.alias_keys() {
                Self::claim(&mut index.aliases, &mut index.collisions, key, &note.id);
            }
        }
        index
    }

    fn claim(
        map: &mut BTreeMap<String, String>,
        collisions: &mut Vec<KeyCollision>,
        key: String,
        id: &str,
    ) {
        if let Some(replaced) = map.insert(key.clone(), id.to_string()) {
            if replaced != id {
                tracing::warn!(
                    "Lookup key '{}' claimed by both {} and {}; {} wins",
                    key,
                    replaced,
                    id,
                    id
                );
                collisions.push(KeyCollision {
                    key,
                    replaced,
                    holder: id.to_string(),
                });
            }
        }
    }

    /// Resolve a reference target, by title or stem first and alias second, ignoring case.
    pub fn lookup(&self, target: &str) -> Option<&str> {
        let key = target.trim().to_lowercase();
        self.titles
            .get(&key)
            .or_else(|| self.aliases.get(&key))
            .map(String::as_str)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Keys that more than one note tried to claim.
    pub fn collisions(&self) -> &[KeyCollision] {
        &self.collisions
    }

    /// Ids of the other notes `note` references. Unresolved targets and the note itself are left
    /// out.
    pub fn resolved_targets(&self, note: &Note) -> BTreeSet<String> {
        note.links_to
            .iter()
            .filter_map(|target| self.lookup(target))
            .filter(|id| *id != note.id && self.contains_id(id))
            .map(str::to_string)
            .collect()
    }
}

/// Recompute every note's backlinks from scratch, so running it twice changes nothing.
///
/// A note that references itself lists itself as a backlink.
#[tracing::instrument(skip_all)]
pub fn resolve_all(notes: &mut [Note], index: &CorpusIndex) {
    let positions = notes
        .iter()
        .enumerate()
        .map(|(position, note)| (note.id.clone(), position))
        .collect::<HashMap<_, _>>();

    let mut found = Vec::new();
    for note in notes.iter() {
        for target in &note.links_to {
            let Some(target_id) = index.lookup(target) else {
                continue;
            };
            if let Some(position) = positions.get(target_id) {
                found.push((*position, note.id.clone()));
            }
        }
    }

    for note in notes.iter_mut() {
        note.backlinks.clear();
    }
    for (position, source) in found {
        notes[position].backlinks.insert(source);
    }
}

/// A parsed, indexed and resolved corpus.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub notes: Vec<Note>,
    pub index: CorpusIndex,
    pub failures: Vec<NoteFailure>,
}

impl Corpus {
    pub fn load<I>(sources: I, config: &ConvertConfig) -> Corpus
    where
        I: IntoIterator<Item = NoteSource>,
    {
        let ParsedCorpus {
            mut notes,
            failures,
        } = parse_all(sources, &config.id_prefix);
        let index = CorpusIndex::build(&notes);
        resolve_all(&mut notes, &index);
        Corpus {
            notes,
            index,
            failures,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    /// Reference edges in note order, then backlink edges. Both kinds may name the same pair.
    pub fn edges(&self) -> Vec<LinkEdge> {
        let references = self.notes.iter().flat_map(|note| {
            self.index
                .resolved_targets(note)
                .into_iter()
                .map(|target| LinkEdge::new(&note.id, target, LinkKind::Reference))
        });
        let backlinks = self.notes.iter().flat_map(|note| {
            note.backlinks
                .iter()
                .map(|source| LinkEdge::new(source, &note.id, LinkKind::Backlink))
        });
        references.chain(backlinks).collect()
    }
}

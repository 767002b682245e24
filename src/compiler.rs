//! Filesystem orchestration of a conversion run.
//!
//! [`DocumentCompiler`] discovers note files below a source directory, feeds them through the
//! corpus passes and writes one section file per note plus the include manifest into the
//! destination directory. Unreadable files are recorded as note failures and skipped.

use std::{
    fs::{create_dir_all, read_to_string, write},
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

use crate::{
    assemble::{graph_payload, render_manifest, render_section},
    config::ConvertConfig,
    corpus::{Corpus, NoteFailure},
    error::ConvertError,
    graph::GraphPayload,
    note::NoteSource,
    paths::{has_extension, is_hidden},
};

#[derive(Debug, Clone)]
pub struct DocumentCompiler {
    source: PathBuf,
    dest: PathBuf,
    config: ConvertConfig,
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub corpus: Corpus,
    /// Section files, in corpus order.
    pub written: Vec<PathBuf>,
    pub manifest: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerStats {
    pub notes_written: usize,
    pub failures: usize,
    pub resolved_references: usize,
    pub unresolved_references: usize,
    pub key_collisions: usize,
}

impl Compilation {
    pub fn stats(&self) -> CompilerStats {
        let (resolved, unresolved) = self
            .corpus
            .notes
            .iter()
            .flat_map(|note| note.links_to.iter())
            .fold((0, 0), |(resolved, unresolved), target| {
                match self.corpus.index.lookup(target) {
                    Some(_) => (resolved + 1, unresolved),
                    None => (resolved, unresolved + 1),
                }
            });
        CompilerStats {
            notes_written: self.written.len(),
            failures: self.corpus.failures.len(),
            resolved_references: resolved,
            unresolved_references: unresolved,
            key_collisions: self.corpus.index.collisions().len(),
        }
    }
}

impl DocumentCompiler {
    /// Fails with [`ConvertError::NotFound`] before doing anything else when `source` is not an
    /// existing directory.
    pub fn new(
        source: impl AsRef<Path>,
        dest: impl AsRef<Path>,
        config: ConvertConfig,
    ) -> Result<Self, ConvertError> {
        let source = source.as_ref();
        if !source.is_dir() {
            return Err(ConvertError::NotFound(format!(
                "source directory {source:?} does not exist"
            )));
        }
        config.validate()?;
        Ok(DocumentCompiler {
            source: source.canonicalize()?,
            dest: dest.as_ref().to_path_buf(),
            config,
        })
    }

    /// A compiler with the default configuration.
    pub fn simple(source: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<Self, ConvertError> {
        DocumentCompiler::new(source, dest, ConvertConfig::default())
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Note files below the source directory, hidden files and directories excluded, sorted.
    pub fn discover(&self) -> Vec<PathBuf> {
        let mut sorted_files = WalkDir::new(&self.source)
            .into_iter()
            .filter_entry(|e| !is_hidden(e) || e.path() == self.source.as_path())
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.into_path()),
                Err(e) => {
                    tracing::warn!("Skipping unreadable directory entry: {}", e);
                    None
                }
            })
            .filter(|p| p.is_file() && has_extension(p, &self.config.note_extension))
            .collect::<Vec<PathBuf>>();
        sorted_files.sort_by(|a, b| a.components().cmp(b.components()));
        sorted_files
    }

    /// Read every discovered note. Paths in the returned sources are relative to the source
    /// directory.
    pub fn load_sources(&self) -> (Vec<NoteSource>, Vec<NoteFailure>) {
        let mut sources = Vec::new();
        let mut failures = Vec::new();
        for path in self.discover() {
            match self.read_source(&path) {
                Ok(source) => sources.push(source),
                Err(error) => {
                    tracing::error!("Failed to read {:?}: {}", path, error);
                    failures.push(NoteFailure { path, error });
                }
            }
        }
        (sources, failures)
    }

    fn read_source(&self, path: &Path) -> Result<NoteSource, ConvertError> {
        let relative = path.strip_prefix(&self.source)?;
        let text = read_to_string(path)?;
        Ok(NoteSource::new(relative, text))
    }

    #[tracing::instrument(skip_all)]
    pub fn load_corpus(&self) -> Corpus {
        tracing::info!("Scanning {:?} for notes...", self.source);
        let (sources, mut failures) = self.load_sources();
        let mut corpus = Corpus::load(sources, &self.config);
        failures.append(&mut corpus.failures);
        corpus.failures = failures;
        corpus
    }

    /// Convert the whole corpus and write the section files and manifest.
    #[tracing::instrument(skip_all)]
    pub fn compile(&self) -> Result<Compilation, ConvertError> {
        let corpus = self.load_corpus();
        create_dir_all(&self.dest)?;

        let mut written = Vec::with_capacity(corpus.notes.len());
        for note in &corpus.notes {
            let path = self.dest.join(self.config.output_file_name(&note.id));
            write(&path, render_section(note, &corpus.index))?;
            tracing::debug!("Written: {:?}", path);
            written.push(path);
        }

        let manifest = self.dest.join(&self.config.manifest_name);
        write(&manifest, render_manifest(&corpus.notes, &self.config))?;
        tracing::debug!("Generated includes file: {:?}", manifest);

        if !corpus.failures.is_empty() {
            tracing::warn!("{} notes could not be converted", corpus.failures.len());
        }
        Ok(Compilation {
            corpus,
            written,
            manifest,
        })
    }

    pub fn write_graph(
        &self,
        corpus: &Corpus,
        path: impl AsRef<Path>,
    ) -> Result<GraphPayload, ConvertError> {
        let payload = graph_payload(corpus, &self.config);
        payload.write(path)?;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use test_log::test;

    #[test]
    fn missing_source_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = DocumentCompiler::simple(dir.path().join("nope"), dir.path().join("out"));
        assert!(matches!(result, Err(ConvertError::NotFound(_))));

        let file = dir.path().join("file.md");
        fs::write(&file, "text").unwrap();
        let result = DocumentCompiler::simple(&file, dir.path().join("out"));
        assert!(matches!(result, Err(ConvertError::NotFound(_))));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConvertConfig {
            note_extension: String::new(),
            ..Default::default()
        };
        let result = DocumentCompiler::new(dir.path(), dir.path().join("out"), config);
        assert!(matches!(result, Err(ConvertError::Config(_))));
    }

    #[test]
    fn discovery_skips_hidden_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::create_dir_all(root.join(".obsidian")).unwrap();
        fs::write(root.join("b.md"), "").unwrap();
        fs::write(root.join("A.MD"), "").unwrap();
        fs::write(root.join("sub/c.md"), "").unwrap();
        fs::write(root.join(".hidden.md"), "").unwrap();
        fs::write(root.join(".obsidian/workspace.md"), "").unwrap();
        fs::write(root.join("image.png"), "").unwrap();

        let compiler = DocumentCompiler::simple(root, root.join("out")).unwrap();
        let found = compiler
            .discover()
            .into_iter()
            .map(|p| p.strip_prefix(compiler.source()).unwrap().to_path_buf())
            .collect::<Vec<_>>();
        assert_eq!(
            found,
            vec![
                PathBuf::from("A.MD"),
                PathBuf::from("b.md"),
                PathBuf::from("sub/c.md")
            ]
        );
    }

    #[test]
    fn unreadable_note_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("vault");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("good.md"), "fine").unwrap();
        fs::write(root.join("bad.md"), [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let compiler = DocumentCompiler::simple(&root, dir.path().join("out")).unwrap();
        let compilation = compiler.compile().unwrap();
        assert_eq!(compilation.written.len(), 1);
        assert_eq!(compilation.corpus.failures.len(), 1);
        assert!(compilation.corpus.failures[0].path.ends_with("bad.md"));
        assert!(compilation.written[0].ends_with("sec-good.ptx"));
        assert!(compilation.manifest.exists());
        assert_eq!(compilation.stats().failures, 1);
    }
}

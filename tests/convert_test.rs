use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};
use test_log::test;

use noet_pretext::{
    codec::MetadataStatus,
    compiler::DocumentCompiler,
    config::ConvertConfig,
    error::ConvertError,
    ident::path_hash,
    note::LinkKind,
};

mod common;
use common::generate_test_root;

fn sections_dir(root: &Path) -> PathBuf {
    root.join("source").join("sections")
}

fn read_section(dir: &Path, id: &str) -> String {
    fs::read_to_string(dir.join(format!("{id}.ptx")))
        .unwrap_or_else(|e| panic!("missing section {id}: {e}"))
}

fn second_draft_id() -> String {
    format!("sec-draft-{}", &path_hash("drafts/b/draft.md")[..6])
}

#[test]
fn converts_fixture_vault() {
    let root = generate_test_root("vault_1").unwrap();
    let dest = sections_dir(root.path());
    let compiler = DocumentCompiler::simple(root.path().join("vault"), &dest).unwrap();
    let compilation = compiler.compile().unwrap();

    let ids = compilation
        .corpus
        .notes
        .iter()
        .map(|note| note.id.clone())
        .collect::<Vec<_>>();
    assert_eq!(
        ids,
        vec![
            "sec-home".to_string(),
            "sec-other-note".to_string(),
            "sec-broken".to_string(),
            "sec-draft".to_string(),
            second_draft_id(),
            "sec-big-ideas".to_string(),
        ]
    );
    assert!(compilation.corpus.failures.is_empty());
    assert_eq!(compilation.written.len(), 6);
    for path in &compilation.written {
        assert!(path.exists(), "{path:?} was not written");
    }

    let broken = compilation.corpus.get("sec-broken").unwrap();
    assert!(matches!(
        broken.metadata_status,
        MetadataStatus::Malformed(_)
    ));
    assert!(broken.body.starts_with("---\ntitle: [oops"));

    let home = compilation.corpus.get("sec-home").unwrap();
    assert_eq!(
        home.backlinks.iter().cloned().collect::<BTreeSet<_>>(),
        BTreeSet::from([
            "sec-broken".to_string(),
            "sec-other-note".to_string(),
            second_draft_id(),
        ])
    );

    let stats = compilation.stats();
    assert_eq!(stats.notes_written, 6);
    assert_eq!(stats.unresolved_references, 1);
    assert_eq!(stats.key_collisions, 1);
}

#[test]
fn home_section_content() {
    let root = generate_test_root("vault_1").unwrap();
    let dest = sections_dir(root.path());
    DocumentCompiler::simple(root.path().join("vault"), &dest)
        .unwrap()
        .compile()
        .unwrap();

    let home = read_section(&dest, "sec-home");
    assert!(home.starts_with("<!-- tags: index, start -->\n<section xml:id=\"sec-home\">\n<title>Home</title>\n"));
    for expected in [
        "<subsection xml:id=\"subsec-welcome\">\n<title>Welcome</title>",
        "<p>This vault links to <xref ref=\"sec-other-note\"/> and \
         <xref ref=\"sec-big-ideas\" text=\"custom\">where it began</xref>.</p>",
        "<p>Missing: <em>Nonexistent Note</em>.</p>",
        "<paragraphs xml:id=\"para-reading-list\">\n<title>Reading list</title>\n<ul>\n\
         <li><p>First <em>item</em></p></li>\n\
         <li><p>Second with <url href=\"https://example.org\">a link</url></p></li>\n</ul>\n\
         <ol>\n<li><p>one</p></li>\n<li><p>two</p></li>\n</ol>\n</paragraphs>\n</subsection>",
        "This note is referenced by: ",
    ] {
        assert!(home.contains(expected), "expected {expected:?} in\n{home}");
    }
    assert!(home.ends_with("</paragraphs>\n</section>\n"));
}

#[test]
fn block_constructs_in_section() {
    let root = generate_test_root("vault_1").unwrap();
    let dest = sections_dir(root.path());
    DocumentCompiler::simple(root.path().join("vault"), &dest)
        .unwrap()
        .compile()
        .unwrap();

    let other = read_section(&dest, "sec-other-note");
    for expected in [
        "<p>Back to <xref ref=\"sec-home\"/>, also known as <xref ref=\"sec-home\"/>.</p>",
        "<insight>\n<title>Remember</title>\n<p>Callouts become insights.</p>\n</insight>",
        "<program language=\"python\">\n<input>\nprint(\"a &lt; b\")\n</input>\n</program>",
        "<me>E = mc^2</me>",
        "<blockquote><p>Quoted <term>wisdom</term>.</p></blockquote>",
        "This note is referenced by: <xref ref=\"sec-big-ideas\"/>, <xref ref=\"sec-home\"/>",
    ] {
        assert!(other.contains(expected), "expected {expected:?} in\n{other}");
    }

    let ideas = read_section(&dest, "sec-big-ideas");
    assert!(ideas.starts_with("<!-- tags: topic -->\n"));
    assert!(ideas.contains("<m>x \\le y</m>"));
    assert!(ideas.contains("<subsection xml:id=\"subsec-origins\">"));
}

#[test]
fn manifest_lists_every_note_by_title() {
    let root = generate_test_root("vault_1").unwrap();
    let dest = sections_dir(root.path());
    DocumentCompiler::simple(root.path().join("vault"), &dest)
        .unwrap()
        .compile()
        .unwrap();

    let manifest = fs::read_to_string(dest.join("_includes.ptx")).unwrap();
    let includes = manifest
        .lines()
        .filter(|line| line.starts_with("<xi:include"))
        .collect::<Vec<_>>();
    let second_draft = format!("<xi:include href=\"{}.ptx\"/>", second_draft_id());
    assert_eq!(
        includes,
        vec![
            "<xi:include href=\"sec-big-ideas.ptx\"/>",
            "<xi:include href=\"sec-broken.ptx\"/>",
            "<xi:include href=\"sec-draft.ptx\"/>",
            second_draft.as_str(),
            "<xi:include href=\"sec-home.ptx\"/>",
            "<xi:include href=\"sec-other-note.ptx\"/>",
        ]
    );
    assert!(manifest.starts_with("<!-- Auto-generated includes for converted notes -->\n"));
}

#[test]
fn reruns_are_reproducible() {
    let root = generate_test_root("vault_1").unwrap();
    let first = root.path().join("first");
    let second = root.path().join("second");
    DocumentCompiler::simple(root.path().join("vault"), &first)
        .unwrap()
        .compile()
        .unwrap();
    DocumentCompiler::simple(root.path().join("vault"), &second)
        .unwrap()
        .compile()
        .unwrap();

    let mut names = fs::read_dir(&first)
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect::<Vec<_>>();
    names.sort();
    assert_eq!(names.len(), 7);
    for name in names {
        assert_eq!(
            fs::read_to_string(first.join(&name)).unwrap(),
            fs::read_to_string(second.join(&name)).unwrap(),
            "{name:?} differs between runs"
        );
    }
}

#[test]
fn graph_payload_from_compilation() {
    let root = generate_test_root("vault_1").unwrap();
    let dest = sections_dir(root.path());
    let compiler = DocumentCompiler::simple(root.path().join("vault"), &dest).unwrap();
    let compilation = compiler.compile().unwrap();
    let graph_path = root.path().join("notes-graph.json");
    let payload = compiler
        .write_graph(&compilation.corpus, &graph_path)
        .unwrap();

    assert_eq!(payload.nodes.len(), 6);
    let mut pairs = BTreeSet::new();
    for link in &payload.links {
        assert_ne!(link.source, link.target);
        assert!(pairs.insert((link.source.clone(), link.target.clone())));
    }
    assert!(payload.links.iter().any(|link| link.source == "sec-home"
        && link.target == "sec-other-note"
        && link.kind == LinkKind::Reference));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&graph_path).unwrap()).unwrap();
    let home = json["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|node| node["id"] == "sec-home")
        .unwrap();
    assert_eq!(home["url"], "sec-home.html");
    assert_eq!(home["created"], "2024-01-05");
    assert_eq!(home["aliases"][0], "Start Here");
    assert_eq!(home["tags"], serde_json::json!(["index", "start"]));
    assert!(home["description"].as_str().unwrap().ends_with("..."));
    assert!(json["links"][0]["type"].is_string());
}

#[test]
fn custom_config_changes_names() {
    let root = generate_test_root("vault_1").unwrap();
    let dest = root.path().join("out");
    let config_path = root.path().join("noet-ptx.toml");
    fs::write(
        &config_path,
        "id_prefix = \"note-\"\noutput_extension = \"xml\"\nmanifest_name = \"includes.xml\"\n",
    )
    .unwrap();
    let config = ConvertConfig::load(&config_path).unwrap();
    let compilation = DocumentCompiler::new(root.path().join("vault"), &dest, config)
        .unwrap()
        .compile()
        .unwrap();

    assert!(dest.join("note-home.xml").exists());
    assert!(compilation.manifest.ends_with("includes.xml"));
    let manifest = fs::read_to_string(&compilation.manifest).unwrap();
    assert!(manifest.contains("<xi:include href=\"note-home.xml\"/>"));
    let home = fs::read_to_string(dest.join("note-home.xml")).unwrap();
    assert!(home.contains("<xref ref=\"note-other-note\"/>"));
}

#[test]
fn missing_source_directory_aborts() {
    let root = generate_test_root("vault_1").unwrap();
    let result = DocumentCompiler::simple(root.path().join("no-such-vault"), root.path().join("out"));
    assert!(matches!(result, Err(ConvertError::NotFound(_))));
    assert!(!root.path().join("out").exists());
}

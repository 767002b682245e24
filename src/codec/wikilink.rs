//! `[[target]]`, `[[target|display]]` and `[[target#heading|display]]` references.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use crate::{
    codec::inline::{escape_attribute, escape_xml, Inline, InlineText},
    corpus::CorpusIndex,
};

static WIKILINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[([^\]|\n]+)(?:\|([^\]\n]+))?\]\]").expect("wikilink pattern is valid")
});

/// A reference target split into the note key and an optional heading fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTarget<'a> {
    pub key: &'a str,
    pub heading: Option<&'a str>,
}

impl<'a> LinkTarget<'a> {
    pub fn parse(raw: &'a str) -> LinkTarget<'a> {
        let raw = raw.trim();
        match raw.split_once('#') {
            Some((key, heading)) => LinkTarget {
                key: key.trim(),
                heading: Some(heading.trim()).filter(|h| !h.is_empty()),
            },
            None => LinkTarget {
                key: raw,
                heading: None,
            },
        }
    }
}

/// Every distinct note key referenced by `body`, case preserved. Fragments are dropped and
/// same-note links (`[[#heading]]`) are skipped.
pub fn extract_references(body: &str) -> BTreeSet<String> {
    WIKILINK
        .captures_iter(body)
        .filter_map(|captures| captures.get(1))
        .map(|target| LinkTarget::parse(target.as_str()).key)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

/// Rewrite references into cross-references against `index`.
///
/// Resolved targets become `<xref ref="ID"/>`, or `<xref ref="ID" text="custom">display</xref>`
/// when a heading fragment is present. Unresolved targets degrade to emphasized display text.
pub fn render_wikilinks(text: &mut InlineText, index: &CorpusIndex) {
    text.rewrite(&WIKILINK, |line, _shadow, captures| {
        let whole = captures.get(0)?;
        let raw_target = captures.get(1)?.as_str();
        if line.has_markup_in(whole.range()) {
            return None;
        }
        let target = LinkTarget::parse(raw_target);
        let display = captures
            .get(2)
            .map(|m| m.as_str().trim())
            .filter(|d| !d.is_empty())
            .unwrap_or(raw_target.trim())
            .to_string();

        let xml = match index.lookup(target.key) {
            Some(id) if target.heading.is_some() => format!(
                "<xref ref=\"{}\" text=\"custom\">{}</xref>",
                escape_attribute(id),
                escape_xml(&display)
            ),
            Some(id) => format!("<xref ref=\"{}\"/>", escape_attribute(id)),
            None => {
                tracing::debug!("Unresolved reference [[{}]]", raw_target);
                format!("<em>{}</em>", escape_xml(&display))
            }
        };
        Some(Inline::Markup {
            xml,
            plain: display,
        })
    });
}

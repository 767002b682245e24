//! Inline intermediate representation.
//!
//! A line of prose is held as an [`InlineText`]: a run of [`Inline`] segments where plain text is
//! still open to rewriting and finished markup is not. Each rewrite stage matches its pattern
//! against a *shadow* of the line in which every finished segment is stood in for by a single
//! object-replacement character, so a pattern may span markup (`**see [[Other]]**`) without ever
//! looking inside it. Matches are mapped back to segments by byte offset, never by searching for
//! the stand-in, so user text containing that character is harmless.
//!
//! Plain text is XML-escaped only when the line is finally rendered with [`InlineText::to_xml`].

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::ops::Range;

const STAND_IN: char = '\u{FFFC}';

static INLINE_MATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([^$\n]+)\$").expect("inline math pattern is valid"));
static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("link pattern is valid"));
static CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").expect("code pattern is valid"));
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold pattern is valid"));
static ITALIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*([^*]+)\*").expect("italic pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    /// Finished markup; `plain` is what a reader sees of it.
    Markup { xml: String, plain: String },
    /// Markup around content that later stages may still rewrite.
    Wrap {
        open: String,
        close: String,
        children: InlineText,
    },
}

impl Inline {
    fn shadow_len(&self) -> usize {
        match self {
            Inline::Text(text) => text.len(),
            _ => STAND_IN.len_utf8(),
        }
    }
}

/// The result of matching a line-leading marker, see [`InlineText::split_marker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedLine {
    pub marker: String,
    pub content: InlineText,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineText(Vec<Inline>);

impl InlineText {
    pub fn raw(text: impl Into<String>) -> Self {
        let mut inline = InlineText(vec![Inline::Text(text.into())]);
        inline.normalize();
        inline
    }

    pub fn segments(&self) -> &[Inline] {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|segment| match segment {
            Inline::Text(text) => text.trim().is_empty(),
            _ => false,
        })
    }

    /// What a reader sees: text, markup display text and wrapped content, without tags.
    pub fn plain_text(&self) -> String {
        self.0
            .iter()
            .map(|segment| match segment {
                Inline::Text(text) => text.clone(),
                Inline::Markup { plain, .. } => plain.clone(),
                Inline::Wrap { children, .. } => children.plain_text(),
            })
            .collect()
    }

    pub fn to_xml(&self) -> String {
        self.0
            .iter()
            .map(|segment| match segment {
                Inline::Text(text) => escape_xml(text),
                Inline::Markup { xml, .. } => xml.clone(),
                Inline::Wrap {
                    open,
                    close,
                    children,
                } => format!("{open}{}{close}", children.to_xml()),
            })
            .collect()
    }

    pub fn trim(mut self) -> Self {
        if let Some(Inline::Text(first)) = self.0.first_mut() {
            *first = first.trim_start().to_string();
        }
        if let Some(Inline::Text(last)) = self.0.last_mut() {
            *last = last.trim_end().to_string();
        }
        self.normalize();
        self
    }

    /// Join lines the way a paragraph does: trimmed and separated by single spaces.
    pub fn join_lines<I>(lines: I) -> InlineText
    where
        I: IntoIterator<Item = InlineText>,
    {
        let mut joined = InlineText::default();
        for line in lines {
            let line = line.trim();
            if line.0.is_empty() {
                continue;
            }
            if !joined.0.is_empty() {
                joined.0.push(Inline::Text(" ".to_string()));
            }
            joined.0.extend(line.0);
        }
        joined.normalize();
        joined
    }

    fn shadow(&self) -> String {
        let mut shadow = String::new();
        for segment in &self.0 {
            match segment {
                Inline::Text(text) => shadow.push_str(text),
                _ => shadow.push(STAND_IN),
            }
        }
        shadow
    }

    /// Segments covering a byte range of the shadow. Text is cut at the range edges, finished
    /// segments are all-or-nothing.
    pub fn slice(&self, range: Range<usize>) -> InlineText {
        let mut out = Vec::new();
        let mut offset = 0;
        for segment in &self.0 {
            let start = offset;
            let end = offset + segment.shadow_len();
            offset = end;
            if end <= range.start || start >= range.end {
                continue;
            }
            match segment {
                Inline::Text(text) => {
                    let from = range.start.saturating_sub(start);
                    let to = (range.end - start).min(text.len());
                    if from < to {
                        out.push(Inline::Text(text[from..to].to_string()));
                    }
                }
                other => out.push(other.clone()),
            }
        }
        let mut sliced = InlineText(out);
        sliced.normalize();
        sliced
    }

    /// Whether any finished segment overlaps the byte range of the shadow.
    pub fn has_markup_in(&self, range: Range<usize>) -> bool {
        let mut offset = 0;
        for segment in &self.0 {
            let start = offset;
            offset += segment.shadow_len();
            if !matches!(segment, Inline::Text(_)) && start < range.end && offset > range.start {
                return true;
            }
        }
        false
    }

    /// Replace every accepted match of `pattern` with the segment returned by `replace`.
    ///
    /// `replace` sees the line, its shadow and the captures; returning `None` rejects the match
    /// and the search resumes one character after its start. Wrapped content is rewritten first.
    pub fn rewrite<F>(&mut self, pattern: &Regex, mut replace: F)
    where
        F: FnMut(&InlineText, &str, &Captures<'_>) -> Option<Inline>,
    {
        self.rewrite_dyn(pattern, &mut replace);
    }

    fn rewrite_dyn(
        &mut self,
        pattern: &Regex,
        replace: &mut dyn FnMut(&InlineText, &str, &Captures<'_>) -> Option<Inline>,
    ) {
        for segment in self.0.iter_mut() {
            if let Inline::Wrap { children, .. } = segment {
                children.rewrite_dyn(pattern, replace);
            }
        }

        let shadow = self.shadow();
        let mut out = Vec::new();
        let mut last = 0;
        let mut pos = 0;
        let mut changed = false;
        while pos <= shadow.len() {
            let Some(captures) = pattern.captures_at(&shadow, pos) else {
                break;
            };
            let Some(whole) = captures.get(0) else {
                break;
            };
            let next_char = whole.start()
                + shadow[whole.start()..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
            match replace(&*self, &shadow, &captures) {
                Some(replacement) => {
                    out.extend(self.slice(last..whole.start()).0);
                    out.push(replacement);
                    last = whole.end();
                    pos = if whole.is_empty() { next_char } else { whole.end() };
                    changed = true;
                }
                None => pos = next_char,
            }
        }
        if changed {
            out.extend(self.slice(last..shadow.len()).0);
            self.0 = out;
            self.normalize();
        }
    }

    /// Match a line-leading marker. `pattern` must capture the marker as group 1 and the rest of
    /// the line as group 2; the content comes back trimmed.
    pub fn split_marker(&self, pattern: &Regex) -> Option<MarkedLine> {
        let shadow = self.shadow();
        let captures = pattern.captures(&shadow)?;
        let marker = captures.get(1)?;
        let content = captures
            .get(2)
            .map(|m| self.slice(m.range()).trim())
            .unwrap_or_default();
        Some(MarkedLine {
            marker: marker.as_str().to_string(),
            content,
        })
    }

    fn normalize(&mut self) {
        let mut merged: Vec<Inline> = Vec::with_capacity(self.0.len());
        for segment in self.0.drain(..) {
            if let Inline::Text(text) = &segment {
                if text.is_empty() {
                    continue;
                }
                if let Some(Inline::Text(previous)) = merged.last_mut() {
                    previous.push_str(text);
                    continue;
                }
            }
            merged.push(segment);
        }
        self.0 = merged;
    }
}

pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn escape_attribute(text: &str) -> String {
    escape_xml(text).replace('"', "&quot;")
}

/// Math renderers read `&lt;` literally, so comparison signs become TeX macros instead.
pub fn escape_math(math: &str) -> String {
    math.replace('&', "&amp;")
        .replace('<', "\\lt ")
        .replace('>', "\\gt ")
}

fn char_before(shadow: &str, index: usize) -> Option<char> {
    shadow[..index].chars().next_back()
}

fn char_after(shadow: &str, index: usize) -> Option<char> {
    shadow[index..].chars().next()
}

/// `$x$` → `<m>x</m>`. A `$` touching another `$` never delimits inline math.
pub fn render_inline_math(text: &mut InlineText) {
    text.rewrite(&INLINE_MATH, |line, shadow, captures| {
        let whole = captures.get(0)?;
        let math = captures.get(1)?;
        if char_before(shadow, whole.start()) == Some('$')
            || char_after(shadow, whole.end()) == Some('$')
            || line.has_markup_in(whole.range())
        {
            return None;
        }
        Some(Inline::Markup {
            xml: format!("<m>{}</m>", escape_math(math.as_str())),
            plain: math.as_str().to_string(),
        })
    });
}

/// `[text](url)` → `<url href="url">text</url>`.
pub fn render_links(text: &mut InlineText) {
    text.rewrite(&LINK, |line, _shadow, captures| {
        let label = captures.get(1)?;
        let url = captures.get(2)?;
        if line.has_markup_in(url.range()) {
            return None;
        }
        Some(Inline::Wrap {
            open: format!("<url href=\"{}\">", escape_attribute(url.as_str())),
            close: "</url>".to_string(),
            children: line.slice(label.range()),
        })
    });
}

/// Inline code, then bold, then italic.
///
/// Code goes first so its content stays literal; bold precedes italic so `***x***` reads as bold.
pub fn render_emphasis(text: &mut InlineText) {
    text.rewrite(&CODE, |line, _shadow, captures| {
        let whole = captures.get(0)?;
        let code = captures.get(1)?;
        if line.has_markup_in(whole.range()) {
            return None;
        }
        Some(Inline::Markup {
            xml: format!("<c>{}</c>", escape_xml(code.as_str())),
            plain: code.as_str().to_string(),
        })
    });
    text.rewrite(&BOLD, |line, _shadow, captures| {
        let inner = captures.get(1)?;
        Some(Inline::Wrap {
            open: "<term>".to_string(),
            close: "</term>".to_string(),
            children: line.slice(inner.range()),
        })
    });
    text.rewrite(&ITALIC, |line, shadow, captures| {
        let whole = captures.get(0)?;
        let inner = captures.get(1)?;
        if char_before(shadow, whole.start()) == Some('*')
            || char_after(shadow, whole.end()) == Some('*')
        {
            return None;
        }
        Some(Inline::Wrap {
            open: "<em>".to_string(),
            close: "</em>".to_string(),
            children: line.slice(inner.range()),
        })
    });
}

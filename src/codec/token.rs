//! Block-level intermediate representation handed from the transformer to the finalizer.

use crate::codec::inline::InlineText;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

/// The structural block a callout type renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalloutKind {
    Note,
    Warning,
    Insight,
    Example,
}

impl CalloutKind {
    /// Unknown callout types render as notes.
    pub fn from_marker(marker: &str) -> CalloutKind {
        match marker.to_lowercase().as_str() {
            "warning" | "important" => CalloutKind::Warning,
            "tip" => CalloutKind::Insight,
            "example" => CalloutKind::Example,
            _ => CalloutKind::Note,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            CalloutKind::Note => "note",
            CalloutKind::Warning => "warning",
            CalloutKind::Insight => "insight",
            CalloutKind::Example => "example",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Blank,
    Text(InlineText),
    Header {
        level: u8,
        id: String,
        title: InlineText,
    },
    ListOpen(ListKind),
    ListItem(InlineText),
    ListClose(ListKind),
    Callout {
        kind: CalloutKind,
        title: Option<InlineText>,
        paragraphs: Vec<InlineText>,
    },
    Blockquote(Vec<InlineText>),
    /// Already escaped math.
    MathBlock(String),
    /// Already escaped code.
    CodeBlock {
        language: String,
        code: String,
    },
}

impl Token {
    /// Every piece of prose the token carries, for the inline rewrite stages.
    pub fn inline_texts_mut(&mut self) -> Vec<&mut InlineText> {
        match self {
            Token::Text(text) | Token::ListItem(text) => vec![text],
            Token::Header { title, .. } => vec![title],
            Token::Callout {
                title, paragraphs, ..
            } => title.iter_mut().chain(paragraphs.iter_mut()).collect(),
            Token::Blockquote(paragraphs) => paragraphs.iter_mut().collect(),
            Token::Blank
            | Token::ListOpen(_)
            | Token::ListClose(_)
            | Token::MathBlock(_)
            | Token::CodeBlock { .. } => Vec::new(),
        }
    }
}

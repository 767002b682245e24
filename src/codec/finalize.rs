//! The structural finalizer.
//!
//! Consumes the token stream in order and keeps an explicit stack of open containers, each
//! tagged with the header level that opened it. Plain lines accumulate into a pending paragraph;
//! every block token flushes it first. Containers left open at the end of the stream are closed
//! innermost first, so the output is balanced for any input.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::codec::{
    inline::{escape_attribute, InlineText},
    token::Token,
};

static BLANK_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("blank run pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    level: u8,
    tag: &'static str,
}

#[derive(Debug, Default)]
pub struct Finalizer {
    stack: Vec<Frame>,
    paragraph: Vec<String>,
    fragments: Vec<String>,
}

impl Finalizer {
    pub fn new() -> Self {
        Finalizer::default()
    }

    /// Number of containers currently open.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn push(&mut self, token: Token) {
        match token {
            Token::Blank => self.flush_paragraph(),
            Token::Text(line) => {
                let line = line.trim();
                if !line.is_blank() {
                    self.paragraph.push(line.to_xml());
                }
            }
            Token::Header { level, id, title } => {
                self.flush_paragraph();
                self.close_to_level(level);
                let (tag, id_prefix) = if level == 1 {
                    ("subsection", "subsec-")
                } else {
                    ("paragraphs", "para-")
                };
                self.emit(format!(
                    "<{tag} xml:id=\"{id_prefix}{}\">",
                    escape_attribute(&id)
                ));
                self.emit(format!("<title>{}</title>", title.to_xml()));
                self.stack.push(Frame { level, tag });
            }
            Token::ListOpen(kind) => {
                self.flush_paragraph();
                self.emit(format!("<{}>", kind.tag()));
            }
            Token::ListItem(item) => {
                self.flush_paragraph();
                self.emit(format!("<li><p>{}</p></li>", item.to_xml()));
            }
            Token::ListClose(kind) => {
                self.flush_paragraph();
                self.emit(format!("</{}>", kind.tag()));
            }
            Token::Callout {
                kind,
                title,
                paragraphs,
            } => {
                self.flush_paragraph();
                self.emit(format!("<{}>", kind.tag()));
                if let Some(title) = title {
                    self.emit(format!("<title>{}</title>", title.to_xml()));
                }
                for paragraph in paragraphs {
                    self.emit(paragraph_xml(&paragraph));
                }
                self.emit(format!("</{}>", kind.tag()));
            }
            Token::Blockquote(paragraphs) => {
                self.flush_paragraph();
                let body: String = paragraphs.iter().map(paragraph_xml).collect();
                self.emit(format!("<blockquote>{body}</blockquote>"));
            }
            Token::MathBlock(math) => {
                self.flush_paragraph();
                self.emit(format!("<me>{math}</me>"));
            }
            Token::CodeBlock { language, code } => {
                self.flush_paragraph();
                self.emit(format!(
                    "<program language=\"{}\">\n<input>\n{code}</input>\n</program>",
                    escape_attribute(&language)
                ));
            }
        }
    }

    pub fn finish(mut self) -> String {
        self.flush_paragraph();
        self.close_to_level(0);
        cleanup(self.fragments)
    }

    fn emit(&mut self, fragment: String) {
        self.fragments.push(fragment);
    }

    fn flush_paragraph(&mut self) {
        if self.paragraph.is_empty() {
            return;
        }
        let text = self.paragraph.join(" ");
        self.paragraph.clear();
        let text = text.trim();
        if !text.is_empty() {
            self.fragments.push(format!("<p>{text}</p>"));
        }
    }

    /// Close every open container whose level is at least `level`, innermost first.
    fn close_to_level(&mut self, level: u8) {
        while let Some(frame) = self.stack.last().copied() {
            if frame.level < level {
                break;
            }
            self.stack.pop();
            self.emit(format!("</{}>", frame.tag));
        }
    }
}

fn paragraph_xml(paragraph: &InlineText) -> String {
    format!("<p>{}</p>", paragraph.to_xml())
}

/// Drop empty paragraphs and empty fragments, join, then collapse runs of blank lines to one.
fn cleanup(fragments: Vec<String>) -> String {
    let joined = fragments
        .into_iter()
        .filter(|fragment| {
            let trimmed = fragment.trim();
            !trimmed.is_empty() && !is_empty_paragraph(trimmed)
        })
        .collect::<Vec<_>>()
        .join("\n");
    BLANK_RUNS.replace_all(joined.trim(), "\n\n").into_owned()
}

fn is_empty_paragraph(fragment: &str) -> bool {
    fragment
        .strip_prefix("<p>")
        .and_then(|rest| rest.strip_suffix("</p>"))
        .is_some_and(|inner| inner.trim().is_empty())
}

pub fn finalize<I>(tokens: I) -> String
where
    I: IntoIterator<Item = Token>,
{
    let mut finalizer = Finalizer::new();
    for token in tokens {
        finalizer.push(token);
    }
    finalizer.finish()
}

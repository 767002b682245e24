//! The markup transformer: an ordered cascade of rewrite stages from a note body to [`Token`]s.
//!
//! Multi-line constructs (callouts, fenced code, block math) are cut out of the raw text first
//! and become opaque tokens. What remains is split into lines, the inline stages run over every
//! piece of prose, and the line-structure stages (headers, lists, block quotes) regroup the
//! lines. Emphasis runs last. Stage order matters: each stage only sees what earlier stages left
//! as text.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::{
    codec::{
        inline::{
            escape_math, escape_xml, render_emphasis, render_inline_math, render_links,
            InlineText, MarkedLine,
        },
        token::{CalloutKind, ListKind, Token},
        wikilink::render_wikilinks,
    },
    corpus::CorpusIndex,
    ident::slugify,
};

static CALLOUT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^>[ \t]*\[!(\w+)\][-+]?[ \t]*([^\n]*)\n?((?:>[^\n]*\n?)*)")
        .expect("callout pattern is valid")
});
static CALLOUT_LINE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^>[ \t]*").expect("callout prefix pattern is valid"));
static FENCED_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(\w*)\n(.*?)```").expect("fenced code pattern is valid"));
static BLOCK_MATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\$\$(.*?)\$\$").expect("block math pattern is valid"));
static HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})[ \t]+(.+)$").expect("header pattern is valid"));
static UNORDERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([-*+])\s+(.+)$").expect("unordered item pattern is valid"));
static ORDERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+\.)\s+(.+)$").expect("ordered item pattern is valid"));
static QUOTE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(>)[ \t]*(.*)$").expect("quote pattern is valid"));

/// Raw text still waiting for later stages, or a block already cut out of it.
#[derive(Debug)]
enum Segment {
    Text(String),
    Block(Token),
}

#[tracing::instrument(skip_all)]
pub fn transform(body: &str, index: &CorpusIndex) -> Vec<Token> {
    let segments = vec![Segment::Text(body.to_string())];
    let segments = cut_blocks(segments, &CALLOUT, callout_token);
    let segments = cut_blocks(segments, &FENCED_CODE, code_token);
    let segments = cut_blocks(segments, &BLOCK_MATH, math_token);

    let mut tokens = into_lines(segments);
    for token in tokens.iter_mut() {
        for text in token.inline_texts_mut() {
            render_inline_math(text);
            render_wikilinks(text, index);
            render_links(text);
        }
    }

    let tokens = mark_headers(tokens);
    let tokens = group_lists(tokens);
    let mut tokens = group_blockquotes(tokens);

    for token in tokens.iter_mut() {
        for text in token.inline_texts_mut() {
            render_emphasis(text);
        }
    }
    tokens
}

fn cut_blocks<F>(segments: Vec<Segment>, pattern: &Regex, make_token: F) -> Vec<Segment>
where
    F: Fn(&Captures<'_>) -> Token,
{
    let mut out = Vec::with_capacity(segments.len());
    for segment in segments {
        let Segment::Text(text) = segment else {
            out.push(segment);
            continue;
        };
        let mut last = 0;
        for captures in pattern.captures_iter(&text) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            if whole.start() > last {
                out.push(Segment::Text(text[last..whole.start()].to_string()));
            }
            out.push(Segment::Block(make_token(&captures)));
            last = whole.end();
        }
        if last < text.len() {
            out.push(Segment::Text(text[last..].to_string()));
        }
    }
    out
}

fn callout_token(captures: &Captures<'_>) -> Token {
    let marker = captures.get(1).map_or("", |m| m.as_str());
    let title = captures
        .get(2)
        .map(|m| m.as_str().trim())
        .filter(|title| !title.is_empty())
        .map(InlineText::raw);

    let mut paragraphs = Vec::new();
    let mut current: Vec<InlineText> = Vec::new();
    for line in captures.get(3).map_or("", |m| m.as_str()).lines() {
        let line = CALLOUT_LINE_PREFIX.replace(line, "");
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(InlineText::join_lines(current.drain(..)));
            }
        } else {
            current.push(InlineText::raw(line.into_owned()));
        }
    }
    if !current.is_empty() {
        paragraphs.push(InlineText::join_lines(current));
    }

    Token::Callout {
        kind: CalloutKind::from_marker(marker),
        title,
        paragraphs,
    }
}

fn code_token(captures: &Captures<'_>) -> Token {
    let language = captures
        .get(1)
        .map(|m| m.as_str())
        .filter(|language| !language.is_empty())
        .unwrap_or("text");
    Token::CodeBlock {
        language: language.to_string(),
        code: escape_xml(captures.get(2).map_or("", |m| m.as_str())),
    }
}

fn math_token(captures: &Captures<'_>) -> Token {
    Token::MathBlock(escape_math(captures.get(1).map_or("", |m| m.as_str().trim())))
}

fn into_lines(segments: Vec<Segment>) -> Vec<Token> {
    let mut tokens = Vec::new();
    for segment in segments {
        match segment {
            Segment::Block(token) => tokens.push(token),
            Segment::Text(text) => tokens.extend(text.lines().map(|line| {
                if line.trim().is_empty() {
                    Token::Blank
                } else {
                    Token::Text(InlineText::raw(line))
                }
            })),
        }
    }
    tokens
}

/// Header ids use the plain slug: no namespace prefix, no collision suffix. A header whose text
/// has nothing to slug stays a plain line.
fn mark_headers(tokens: Vec<Token>) -> Vec<Token> {
    tokens
        .into_iter()
        .map(|token| match token {
            Token::Text(line) => match line.split_marker(&HEADER) {
                Some(MarkedLine { marker, content }) => {
                    let id = slugify(&content.plain_text());
                    if id.is_empty() {
                        Token::Text(line)
                    } else {
                        Token::Header {
                            level: marker.len() as u8,
                            id,
                            title: content,
                        }
                    }
                }
                None => Token::Text(line),
            },
            other => other,
        })
        .collect()
}

fn list_item(line: &InlineText) -> Option<(ListKind, InlineText)> {
    let (kind, marked) = match line.split_marker(&UNORDERED_ITEM) {
        Some(marked) => (ListKind::Unordered, marked),
        None => (ListKind::Ordered, line.split_marker(&ORDERED_ITEM)?),
    };
    (!marked.content.is_blank()).then_some((kind, marked.content))
}

/// A change of marker style closes the open list and opens a new one; any other line closes it.
fn group_lists(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut open: Option<ListKind> = None;
    for token in tokens {
        let item = match &token {
            Token::Text(line) => list_item(line),
            _ => None,
        };
        match item {
            Some((kind, content)) => {
                if open != Some(kind) {
                    if let Some(previous) = open {
                        out.push(Token::ListClose(previous));
                    }
                    out.push(Token::ListOpen(kind));
                    open = Some(kind);
                }
                out.push(Token::ListItem(content));
            }
            None => {
                if let Some(previous) = open.take() {
                    out.push(Token::ListClose(previous));
                }
                out.push(token);
            }
        }
    }
    if let Some(previous) = open {
        out.push(Token::ListClose(previous));
    }
    out
}

/// Consecutive quoted lines form one quote; an empty `>` line starts a new paragraph inside it.
fn group_blockquotes(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut quote: Option<Vec<Vec<InlineText>>> = None;
    for token in tokens {
        let quoted = match &token {
            Token::Text(line) => line.split_marker(&QUOTE_LINE).map(|marked| marked.content),
            _ => None,
        };
        match quoted {
            Some(content) => {
                let paragraphs = quote.get_or_insert_with(|| vec![Vec::new()]);
                if content.is_blank() {
                    paragraphs.push(Vec::new());
                } else if let Some(current) = paragraphs.last_mut() {
                    current.push(content);
                }
            }
            None => {
                if let Some(paragraphs) = quote.take() {
                    push_blockquote(&mut out, paragraphs);
                }
                out.push(token);
            }
        }
    }
    if let Some(paragraphs) = quote {
        push_blockquote(&mut out, paragraphs);
    }
    out
}

fn push_blockquote(out: &mut Vec<Token>, paragraphs: Vec<Vec<InlineText>>) {
    let paragraphs = paragraphs
        .into_iter()
        .filter(|lines| !lines.is_empty())
        .map(InlineText::join_lines)
        .collect::<Vec<_>>();
    if !paragraphs.is_empty() {
        out.push(Token::Blockquote(paragraphs));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ident::IdAssigner,
        note::{Note, NoteSource},
    };
    use test_log::test;

    fn other_note_index() -> CorpusIndex {
        let mut ids = IdAssigner::new("sec-");
        let note = Note::parse(&NoteSource::new("Other Note.md", "body"), &mut ids).unwrap();
        CorpusIndex::build(&[note])
    }

    fn xml(text: &InlineText) -> String {
        text.to_xml()
    }

    #[test]
    fn headers_and_paragraph_lines() {
        let tokens = transform(
            "# Intro\nSee [[Other Note]].\n## Details\nSome *emphasis* and **bold**.",
            &other_note_index(),
        );
        assert_eq!(tokens.len(), 4);
        match &tokens[0] {
            Token::Header { level, id, title } => {
                assert_eq!(*level, 1);
                assert_eq!(id, "intro");
                assert_eq!(xml(title), "Intro");
            }
            other => panic!("expected header, got {other:?}"),
        }
        let Token::Text(line) = &tokens[1] else {
            panic!("expected text");
        };
        assert_eq!(xml(line), "See <xref ref=\"sec-other-note\"/>.");
        assert!(matches!(&tokens[2], Token::Header { level: 2, id, .. } if id == "details"));
        let Token::Text(line) = &tokens[3] else {
            panic!("expected text");
        };
        assert_eq!(xml(line), "Some <em>emphasis</em> and <term>bold</term>.");
    }

    #[test]
    fn header_needs_space_and_content() {
        let tokens = transform("#tag\n#   \n####### seven", &CorpusIndex::default());
        assert!(tokens.iter().all(|t| matches!(t, Token::Text(_))));

        let tokens = transform("# !!!\n## ...", &CorpusIndex::default());
        assert!(tokens.iter().all(|t| matches!(t, Token::Text(_))));
        assert_eq!(
            crate::codec::finalize(tokens),
            "<p># !!! ## ...</p>"
        );

        let tokens = transform("### The *Big* Idea: [[Other Note]]!", &other_note_index());
        let Token::Header { level, id, title } = &tokens[0] else {
            panic!("expected header");
        };
        assert_eq!(*level, 3);
        assert_eq!(id, "the-big-idea-other-note");
        assert_eq!(
            xml(title),
            "The <em>Big</em> Idea: <xref ref=\"sec-other-note\"/>!"
        );
    }

    #[test]
    fn lists_open_switch_and_close() {
        let tokens = transform("- a\n* b\n1. one\n2. two\nafter\n+ c", &CorpusIndex::default());
        let shape = tokens
            .iter()
            .map(|token| match token {
                Token::ListOpen(kind) => format!("open {}", kind.tag()),
                Token::ListClose(kind) => format!("close {}", kind.tag()),
                Token::ListItem(text) => format!("item {}", text.to_xml()),
                Token::Text(text) => format!("text {}", text.to_xml()),
                other => format!("{other:?}"),
            })
            .collect::<Vec<_>>();
        assert_eq!(
            shape,
            vec![
                "open ul", "item a", "item b", "close ul", "open ol", "item one", "item two",
                "close ol", "text after", "open ul", "item c", "close ul",
            ]
        );
    }

    #[test]
    fn list_items_keep_their_emphasis() {
        let tokens = transform("* **bold** item\n*not a list*", &CorpusIndex::default());
        assert_eq!(tokens[0], Token::ListOpen(ListKind::Unordered));
        let Token::ListItem(item) = &tokens[1] else {
            panic!("expected item");
        };
        assert_eq!(xml(item), "<term>bold</term> item");
        assert_eq!(tokens[2], Token::ListClose(ListKind::Unordered));
        let Token::Text(line) = &tokens[3] else {
            panic!("expected text");
        };
        assert_eq!(xml(line), "<em>not a list</em>");
    }

    #[test]
    fn callouts() {
        let tokens = transform(
            "> [!tip] Remember this\n> First line\n> continues.\n>\n> Second *para*.\nAfter.",
            &CorpusIndex::default(),
        );
        let Token::Callout {
            kind,
            title,
            paragraphs,
        } = &tokens[0]
        else {
            panic!("expected callout, got {:?}", tokens[0]);
        };
        assert_eq!(*kind, CalloutKind::Insight);
        assert_eq!(title.as_ref().map(xml).as_deref(), Some("Remember this"));
        assert_eq!(
            paragraphs.iter().map(xml).collect::<Vec<_>>(),
            vec!["First line continues.", "Second <em>para</em>."]
        );
        assert!(matches!(&tokens[1], Token::Text(line) if xml(line) == "After."));

        let tokens = transform("> [!question]\n> Why?", &CorpusIndex::default());
        assert!(matches!(
            &tokens[0],
            Token::Callout { kind: CalloutKind::Note, title: None, paragraphs } if paragraphs.len() == 1
        ));
    }

    #[test]
    fn blockquotes_merge_consecutive_lines() {
        let tokens = transform(
            "> quoted [[Missing]]\n> more\n>\n> second\n\n> separate",
            &CorpusIndex::default(),
        );
        let Token::Blockquote(paragraphs) = &tokens[0] else {
            panic!("expected quote");
        };
        assert_eq!(
            paragraphs.iter().map(xml).collect::<Vec<_>>(),
            vec!["quoted <em>Missing</em> more", "second"]
        );
        assert_eq!(tokens[1], Token::Blank);
        assert!(matches!(&tokens[2], Token::Blockquote(p) if p.len() == 1));
    }

    #[test]
    fn code_blocks_are_opaque() {
        let tokens = transform(
            "Before\n```rust\nlet a = *b* < [[c]];\n```\n```\nplain\n```",
            &CorpusIndex::default(),
        );
        assert!(matches!(&tokens[0], Token::Text(_)));
        assert_eq!(
            tokens[1],
            Token::CodeBlock {
                language: "rust".to_string(),
                code: "let a = *b* &lt; [[c]];\n".to_string(),
            }
        );
        assert_eq!(
            tokens.last(),
            Some(&Token::CodeBlock {
                language: "text".to_string(),
                code: "plain\n".to_string(),
            })
        );
    }

    #[test]
    fn block_and_inline_math() {
        let tokens = transform(
            "Inline $a<b$ here.\n$$\n\\sum x_i > 0\n$$\nDone.",
            &CorpusIndex::default(),
        );
        let Token::Text(line) = &tokens[0] else {
            panic!("expected text");
        };
        assert_eq!(xml(line), "Inline <m>a\\lt b</m> here.");
        assert_eq!(tokens[1], Token::MathBlock("\\sum x_i \\gt  0".to_string()));
        assert!(matches!(&tokens[2], Token::Blank));
        assert!(matches!(&tokens[3], Token::Text(line) if xml(line) == "Done."));
    }

    #[test]
    fn links_and_escaping() {
        let tokens = transform("[site](https://a.b/?x=1&y=2) & <tag>", &CorpusIndex::default());
        let Token::Text(line) = &tokens[0] else {
            panic!("expected text");
        };
        assert_eq!(
            xml(line),
            "<url href=\"https://a.b/?x=1&amp;y=2\">site</url> &amp; &lt;tag&gt;"
        );
    }
}

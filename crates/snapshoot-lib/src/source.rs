//! Parsed view of one source file.
//!
//! A [`ParsedSource`] bundles the text, its syntax tree, the comments and the
//! leaf token stream. It is never mutated: observing new text means parsing
//! again.

use std::path::{Path, PathBuf};

use arborium_tree_sitter::{Node, Tree};
use rowan::{TextRange, TextSize};
use snapshoot_langs::Lang;

use crate::{Error, Result};

/// A leaf of the syntax tree other than a comment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: &'static str,
    pub range: TextRange,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Comment {
    pub range: TextRange,
}

pub struct ParsedSource {
    lang: Lang,
    path: Option<PathBuf>,
    text: String,
    tree: Tree,
    comments: Vec<Comment>,
    tokens: Vec<Token>,
    line_starts: Vec<TextSize>,
}

impl std::fmt::Debug for ParsedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedSource")
            .field("lang", &self.lang.name())
            .field("path", &self.path)
            .field("len", &self.text.len())
            .finish_non_exhaustive()
    }
}

impl ParsedSource {
    pub fn parse(lang: &Lang, text: impl Into<String>) -> Result<Self> {
        Self::build(lang, None, text.into())
    }

    pub fn parse_with_path(lang: &Lang, path: impl Into<PathBuf>, text: impl Into<String>) -> Result<Self> {
        Self::build(lang, Some(path.into()), text.into())
    }

    /// Parse new text for the same file.
    pub fn reparse(&self, text: impl Into<String>) -> Result<Self> {
        Self::build(&self.lang, self.path.clone(), text.into())
    }

    fn build(lang: &Lang, path: Option<PathBuf>, text: String) -> Result<Self> {
        let tree = lang.parse(&text);
        let line_starts = line_starts(&text);

        if let Some(bad) = first_syntax_error(tree.root_node()) {
            let range = node_range(bad);
            let line = line_index(&line_starts, range.start());
            return Err(Error::SyntaxError { path, range, line });
        }

        let (tokens, comments) = collect_leaves(&tree);
        Ok(Self {
            lang: lang.clone(),
            path,
            text,
            tree,
            comments,
            tokens,
            line_starts,
        })
    }

    pub fn lang(&self) -> &Lang {
        &self.lang
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Leaf tokens ordered by start offset.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token_text(&self, token: &Token) -> &str {
        &self.text[token.range]
    }

    pub fn node_text(&self, node: Node<'_>) -> &str {
        &self.text[node.byte_range()]
    }

    pub fn node_range(&self, node: Node<'_>) -> TextRange {
        node_range(node)
    }

    /// 1-based line containing `offset`.
    pub fn line_of(&self, offset: TextSize) -> usize {
        line_index(&self.line_starts, offset)
    }

    /// Range of a 1-based line, without its line terminator.
    pub fn line_range(&self, line: usize) -> Option<TextRange> {
        line_range_in(&self.text, &self.line_starts, line)
    }

    /// Leading whitespace of the line containing `offset`.
    pub fn line_indent(&self, offset: TextSize) -> &str {
        let start = usize::from(self.line_starts[self.line_of(offset) - 1]);
        let line = &self.text[start..];
        let len = line
            .find(|c: char| c != ' ' && c != '\t')
            .unwrap_or(line.len());
        &line[..len]
    }

    /// The gap strictly after `a` and strictly before `b`.
    ///
    /// Empty when the ranges touch or `b` does not follow `a`.
    pub fn range_between(&self, a: TextRange, b: TextRange) -> TextRange {
        TextRange::new(a.end(), b.start().max(a.end()))
    }

    /// Tokens fully contained in `range`.
    pub fn tokens_in(&self, range: TextRange) -> &[Token] {
        let from = self.tokens.partition_point(|t| t.range.start() < range.start());
        let len = self.tokens[from..]
            .iter()
            .take_while(|t| range.contains_range(t.range))
            .count();
        &self.tokens[from..from + len]
    }

    /// Comments fully contained in `range`.
    pub fn comments_in(&self, range: TextRange) -> impl Iterator<Item = &Comment> {
        let from = self
            .comments
            .partition_point(|c| c.range.start() < range.start());
        self.comments[from..]
            .iter()
            .take_while(move |c| range.contains_range(c.range))
    }
}

pub(crate) fn text_size(offset: usize) -> TextSize {
    TextSize::from(offset as u32)
}

pub(crate) fn node_range(node: Node<'_>) -> TextRange {
    TextRange::new(text_size(node.start_byte()), text_size(node.end_byte()))
}

fn line_starts(text: &str) -> Vec<TextSize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .map(text_size)
        .collect()
}

/// Range of a 1-based line of unparsed `text`, without its line terminator.
pub(crate) fn line_range(text: &str, line: usize) -> Option<TextRange> {
    line_range_in(text, &line_starts(text), line)
}

fn line_range_in(text: &str, line_starts: &[TextSize], line: usize) -> Option<TextRange> {
    let start = *line_starts.get(line.checked_sub(1)?)?;
    let rest = &text[usize::from(start)..];
    let len = rest.find('\n').unwrap_or(rest.len());
    Some(TextRange::at(start, text_size(len)))
}

fn line_index(line_starts: &[TextSize], offset: TextSize) -> usize {
    line_starts.partition_point(|&start| start <= offset)
}

fn first_syntax_error(root: Node<'_>) -> Option<Node<'_>> {
    if !root.has_error() {
        return None;
    }
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        // Descend only into subtrees that contain the error.
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return Some(root);
            }
        }
    }
}

fn collect_leaves(tree: &Tree) -> (Vec<Token>, Vec<Comment>) {
    let mut tokens = Vec::new();
    let mut comments = Vec::new();
    let mut cursor = tree.walk();
    loop {
        let node = cursor.node();
        if node.kind() == "comment" {
            comments.push(Comment {
                range: node_range(node),
            });
        } else if node.child_count() == 0 {
            if node.start_byte() < node.end_byte() {
                tokens.push(Token {
                    kind: node.kind(),
                    range: node_range(node),
                });
            }
        } else if cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return (tokens, comments);
            }
        }
    }
}

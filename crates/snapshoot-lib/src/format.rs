//! Layout of injected mapping literals.
//!
//! Mapping literals are `{ ... }` hashes and parenthesised argument lists made
//! only of `key: value` pairs. The formatter rewrites the whitespace between
//! their parts:
//! - a hash that is the sole argument of a call loses its braces
//! - more than one entry puts each entry on its own line, values aligned
//! - a single entry stays inline
//!
//! Every edit replaces a whole gap with its canonical contents and no-op
//! edits are dropped, so formatting formatted text yields no edits.

use arborium_tree_sitter::Node;
use rowan::TextRange;
use snapshoot_langs::Lang;

use crate::Result;
use crate::rewrite::{Edit, apply_edits, sort_edits};
use crate::source::{ParsedSource, node_range};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Formatter {
    indent_unit: String,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new("  ")
    }
}

/// A mapping literal split into its parts.
struct Mapping<'t> {
    node: Node<'t>,
    open: Node<'t>,
    close: Node<'t>,
    entries: Vec<Entry<'t>>,
    /// Braces to drop when a hash is a call's only argument.
    unwrap: Option<Node<'t>>,
}

struct Entry<'t> {
    pair: Node<'t>,
    key: Node<'t>,
    /// `:` or `=>`.
    operator: Node<'t>,
    value: Node<'t>,
}

impl Formatter {
    pub fn new(indent_unit: impl Into<String>) -> Self {
        Self {
            indent_unit: indent_unit.into(),
        }
    }

    pub fn indent_unit(&self) -> &str {
        &self.indent_unit
    }

    /// Format every mapping literal in the file.
    pub fn format(&self, source: &ParsedSource) -> Vec<Edit> {
        self.format_regions(source, &[source.node_range(source.root())])
    }

    /// Format mapping literals lying inside one of `regions`.
    ///
    /// Edits are sorted and measured against `source`.
    pub fn format_regions(&self, source: &ParsedSource, regions: &[TextRange]) -> Vec<Edit> {
        let mut edits = Vec::new();
        let mut cursor = source.root().walk();
        loop {
            let node = cursor.node();
            let range = node_range(node);
            let touched = regions.iter().any(|r| overlaps(*r, range));
            let inside = regions.iter().any(|r| r.contains_range(range));

            let mapping = if touched && inside {
                classify(node)
            } else {
                None
            };
            if let Some(mapping) = mapping {
                let indent = source.line_indent(range.start()).to_owned();
                self.layout(source, &mapping, &indent, &mut edits);
            } else if touched && cursor.goto_first_child() {
                continue;
            }

            while !cursor.goto_next_sibling() {
                if !cursor.goto_parent() {
                    edits.retain(|edit| source.text()[edit.range] != edit.replacement);
                    sort_edits(&mut edits);
                    return edits;
                }
            }
        }
    }

    fn visit(&self, source: &ParsedSource, node: Node<'_>, indent: &str, edits: &mut Vec<Edit>) {
        if let Some(mapping) = classify(node) {
            self.layout(source, &mapping, indent, edits);
            return;
        }
        for child in named_children(node) {
            self.visit(source, child, indent, edits);
        }
    }

    fn layout(&self, source: &ParsedSource, mapping: &Mapping<'_>, indent: &str, edits: &mut Vec<Edit>) {
        if source
            .comments_in(node_range(mapping.node))
            .next()
            .is_some()
        {
            return;
        }
        match mapping.entries.as_slice() {
            [] => {}
            [entry] => {
                if let Some(hash) = mapping.unwrap {
                    edits.push(Edit::delete(span(hash, entry.pair, Gap::StartToStart)));
                    edits.push(Edit::delete(span(entry.pair, hash, Gap::EndToEnd)));
                }
                self.visit(source, entry.value, indent, edits);
            }
            entries => {
                if let Some(expanded) = self.expand(source, mapping, indent) {
                    edits.extend(expanded);
                    let inner = format!("{indent}{}", self.indent_unit);
                    for entry in entries {
                        self.visit(source, entry.value, &inner, edits);
                    }
                } else {
                    for entry in entries {
                        self.visit(source, entry.value, indent, edits);
                    }
                }
            }
        }
    }

    /// One entry per line, values aligned. `None` if a separator is missing.
    fn expand(&self, source: &ParsedSource, mapping: &Mapping<'_>, indent: &str) -> Option<Vec<Edit>> {
        let inner = format!("\n{indent}{}", self.indent_unit);
        let first = mapping.entries.first()?;
        let last = mapping.entries.last()?;

        let mut edits = vec![Edit::replace(
            span(mapping.open, first.pair, Gap::EndToStart),
            inner.clone(),
        )];
        for pair in mapping.entries.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let gap = source.range_between(node_range(a.pair), node_range(b.pair));
            let comma = source.tokens_in(gap).iter().find(|t| t.kind == ",")?;
            edits.push(Edit::replace(
                TextRange::new(comma.range.end(), node_range(b.pair).start()),
                inner.clone(),
            ));
        }
        edits.push(Edit::replace(
            span(last.pair, mapping.close, Gap::EndToStart),
            format!("\n{indent}"),
        ));

        let widths: Vec<usize> = mapping
            .entries
            .iter()
            .map(|entry| {
                let prefix = TextRange::new(
                    node_range(entry.key).start(),
                    node_range(entry.operator).end(),
                );
                source.text()[prefix].chars().count()
            })
            .collect();
        let widest = widths.iter().copied().max()?;
        for (entry, width) in mapping.entries.iter().zip(widths) {
            edits.push(Edit::replace(
                span(entry.operator, entry.value, Gap::EndToStart),
                " ".repeat(1 + widest - width),
            ));
        }
        Some(edits)
    }
}

/// Parse, format the whole buffer, and return the formatted text.
pub fn format_text(lang: &Lang, text: &str) -> Result<String> {
    let source = ParsedSource::parse(lang, text)?;
    let edits = Formatter::default().format(&source);
    Ok(apply_edits(source.text(), &edits)?.text)
}

enum Gap {
    EndToStart,
    StartToStart,
    EndToEnd,
}

fn span(a: Node<'_>, b: Node<'_>, gap: Gap) -> TextRange {
    let (a, b) = (node_range(a), node_range(b));
    match gap {
        Gap::EndToStart => TextRange::new(a.end(), b.start()),
        Gap::StartToStart => TextRange::new(a.start(), b.start()),
        Gap::EndToEnd => TextRange::new(a.end(), b.end()),
    }
}

fn overlaps(a: TextRange, b: TextRange) -> bool {
    a.start() < b.end() && b.start() < a.end()
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| !child.is_extra())
        .collect()
}

/// Delimiter tokens of a node, if it starts with `open` and ends with `close`.
fn delimiters<'t>(node: Node<'t>, open: &str, close: &str) -> Option<(Node<'t>, Node<'t>)> {
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    let (first, last) = (*children.first()?, *children.last()?);
    (children.len() >= 2 && first.kind() == open && last.kind() == close).then_some((first, last))
}

fn entries<'t>(nodes: &[Node<'t>]) -> Option<Vec<Entry<'t>>> {
    nodes.iter().map(|&pair| entry(pair)).collect()
}

fn entry(pair: Node<'_>) -> Option<Entry<'_>> {
    if pair.kind() != "pair" {
        return None;
    }
    let key = pair.child_by_field_name("key")?;
    let value = pair.child_by_field_name("value")?;
    let mut cursor = pair.walk();
    let operator = pair
        .children(&mut cursor)
        .find(|child| !child.is_named() && matches!(child.kind(), ":" | "=>"))?;
    Some(Entry {
        pair,
        key,
        operator,
        value,
    })
}

fn classify(node: Node<'_>) -> Option<Mapping<'_>> {
    match node.kind() {
        "hash" => {
            let (open, close) = delimiters(node, "{", "}")?;
            Some(Mapping {
                node,
                open,
                close,
                entries: entries(&named_children(node))?,
                unwrap: None,
            })
        }
        "argument_list" => {
            let (open, close) = delimiters(node, "(", ")")?;
            let args = named_children(node);
            if let [hash] = args.as_slice()
                && hash.kind() == "hash"
            {
                delimiters(*hash, "{", "}")?;
                return Some(Mapping {
                    node,
                    open,
                    close,
                    entries: entries(&named_children(*hash))?,
                    unwrap: Some(*hash),
                });
            }
            if args.is_empty() {
                return None;
            }
            Some(Mapping {
                node,
                open,
                close,
                entries: entries(&args)?,
                unwrap: None,
            })
        }
        _ => None,
    }
}

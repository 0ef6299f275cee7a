//! Finding bare matcher calls.
//!
//! Candidates are matched with a small tree pattern, written the way
//! tree-sitter queries are:
//!
//! ```text
//! [(identifier "match_snapshot")
//!  (call !receiver method: (identifier "match_snapshot") arguments: (argument_list .) !block)]
//! ```
//!
//! `!field` requires the field to be absent, `(kind .)` requires the node to
//! have no named children, and a quoted string constrains the node's text.

use std::fmt;

use arborium_tree_sitter::Node;
use rowan::TextRange;
use snapshoot_langs::Lang;

use crate::source::{ParsedSource, node_range};
use crate::{Error, Result};

/// Fields of a parent under which an identifier is a name, not a call.
const NAME_FIELDS: &[&str] = &["method", "name", "left"];

/// Parameter lists whose bare identifiers declare parameters.
const PARAMETER_LISTS: &[&str] = &["method_parameters", "block_parameters", "lambda_parameters"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pattern {
    /// Matches any node.
    Any,
    Node(NodePattern),
    /// Matches if any alternative does.
    Alt(Vec<Pattern>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodePattern {
    kind: String,
    text: Option<String>,
    fields: Vec<FieldPattern>,
    /// `Some` constrains the named children exactly. Comments are ignored.
    children: Option<Vec<Pattern>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldPattern {
    Present(String, Pattern),
    Absent(String),
}

impl Pattern {
    pub fn node(kind: impl Into<String>) -> NodePattern {
        NodePattern {
            kind: kind.into(),
            text: None,
            fields: Vec::new(),
            children: None,
        }
    }

    pub fn matches(&self, node: Node<'_>, source: &str) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Alt(alternatives) => alternatives.iter().any(|p| p.matches(node, source)),
            Pattern::Node(pattern) => pattern.matches(node, source),
        }
    }

    /// Check every node kind and field against the grammar.
    pub fn validate(&self, lang: &Lang) -> Result<()> {
        match self {
            Pattern::Any => Ok(()),
            Pattern::Alt(alternatives) => alternatives.iter().try_for_each(|p| p.validate(lang)),
            Pattern::Node(pattern) => pattern.validate(lang),
        }
    }
}

impl NodePattern {
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, pattern: impl Into<Pattern>) -> Self {
        self.fields
            .push(FieldPattern::Present(name.into(), pattern.into()));
        self
    }

    pub fn without(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldPattern::Absent(name.into()));
        self
    }

    pub fn children(mut self, children: Vec<Pattern>) -> Self {
        self.children = Some(children);
        self
    }

    fn matches(&self, node: Node<'_>, source: &str) -> bool {
        if !node.is_named() || node.kind() != self.kind {
            return false;
        }
        if let Some(text) = &self.text
            && source.get(node.byte_range()) != Some(text.as_str())
        {
            return false;
        }
        let fields_match = self.fields.iter().all(|field| match field {
            FieldPattern::Present(name, pattern) => node
                .child_by_field_name(name)
                .is_some_and(|child| pattern.matches(child, source)),
            FieldPattern::Absent(name) => node.child_by_field_name(name).is_none(),
        });
        if !fields_match {
            return false;
        }
        let Some(children) = &self.children else {
            return true;
        };
        let mut cursor = node.walk();
        let named: Vec<_> = node
            .named_children(&mut cursor)
            .filter(|child| !child.is_extra())
            .collect();
        named.len() == children.len()
            && named
                .iter()
                .zip(children)
                .all(|(child, pattern)| pattern.matches(*child, source))
    }

    fn validate(&self, lang: &Lang) -> Result<()> {
        if lang.resolve_named_node(&self.kind).is_none() {
            return Err(Error::UnknownNodeKind(self.kind.clone()));
        }
        for field in &self.fields {
            let (FieldPattern::Present(name, _) | FieldPattern::Absent(name)) = field;
            if lang.resolve_field(name).is_none() {
                return Err(Error::UnknownField(name.clone()));
            }
            if let FieldPattern::Present(_, pattern) = field {
                pattern.validate(lang)?;
            }
        }
        self.children
            .iter()
            .flatten()
            .try_for_each(|child| child.validate(lang))
    }
}

impl From<NodePattern> for Pattern {
    fn from(pattern: NodePattern) -> Self {
        Pattern::Node(pattern)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Any => f.write_str("_"),
            Pattern::Node(node) => write!(f, "{node}"),
            Pattern::Alt(alternatives) => {
                f.write_str("[")?;
                for (i, alternative) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{alternative}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl fmt::Display for NodePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.kind)?;
        if let Some(text) = &self.text {
            write!(f, " {text:?}")?;
        }
        for field in &self.fields {
            match field {
                FieldPattern::Present(name, pattern) => write!(f, " {name}: {pattern}")?,
                FieldPattern::Absent(name) => write!(f, " !{name}")?,
            }
        }
        match &self.children {
            Some(children) if children.is_empty() => f.write_str(" .")?,
            Some(children) => {
                for child in children {
                    write!(f, " {child}")?;
                }
            }
            None => {}
        }
        f.write_str(")")
    }
}

/// A bare matcher call and the line it starts on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallSite {
    pub range: TextRange,
    /// 1-based.
    pub line: usize,
}

#[derive(Clone, Debug)]
pub struct Locator {
    matcher: String,
    pattern: Pattern,
}

impl Locator {
    pub fn new(lang: &Lang, matcher: impl Into<String>) -> Result<Self> {
        let matcher = matcher.into();
        let name = || Pattern::node("identifier").text(matcher.clone());
        let pattern = Pattern::Alt(vec![
            name().into(),
            Pattern::node("call")
                .without("receiver")
                .field("method", name())
                .field("arguments", Pattern::node("argument_list").children(vec![]))
                .without("block")
                .into(),
        ]);
        pattern.validate(lang)?;
        Ok(Self { matcher, pattern })
    }

    pub fn matcher(&self) -> &str {
        &self.matcher
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Every bare matcher call in the file, in document order.
    pub fn find_bare_calls(&self, source: &ParsedSource) -> Vec<CallSite> {
        let mut sites = Vec::new();
        let mut cursor = source.root().walk();
        loop {
            let node = cursor.node();
            if self.is_bare_call(node, cursor.field_name(), source.text()) {
                let range = node_range(node);
                sites.push(CallSite {
                    range,
                    line: source.line_of(range.start()),
                });
            } else if cursor.goto_first_child() {
                continue;
            }
            while !cursor.goto_next_sibling() {
                if !cursor.goto_parent() {
                    return sites;
                }
            }
        }
    }

    /// The single bare call starting on `line`.
    pub fn find_injection_target(&self, source: &ParsedSource, line: usize) -> Result<CallSite> {
        let candidates: Vec<_> = self
            .find_bare_calls(source)
            .into_iter()
            .filter(|site| site.line == line)
            .collect();
        match candidates.as_slice() {
            [site] => Ok(*site),
            [] => Err(Error::CallSiteNotFound {
                path: source.path().map(Into::into),
                matcher: self.matcher.clone(),
                line,
            }),
            _ => Err(Error::AmbiguousCallSite {
                path: source.path().map(Into::into),
                matcher: self.matcher.clone(),
                line,
                ranges: candidates.iter().map(|site| site.range).collect(),
            }),
        }
    }

    fn is_bare_call(&self, node: Node<'_>, field: Option<&str>, text: &str) -> bool {
        if node.kind() == "identifier"
            && (field.is_some_and(|f| NAME_FIELDS.contains(&f))
                || node
                    .parent()
                    .is_some_and(|parent| PARAMETER_LISTS.contains(&parent.kind())))
        {
            return false;
        }
        self.pattern.matches(node, text)
    }
}

//! Literal expression trees.
//!
//! A [`Literal`] is the subset of Ruby syntax a snapshot may contain: scalar
//! literals, arrays, hashes, constant paths and method sends on them (for
//! `Date.new(...)` and friends). `Display` prints valid Ruby and
//! [`Literal::parse`] reads it back.

use std::fmt::{self, Write};

use arborium_tree_sitter::Node;
use snapshoot_langs::Lang;

use crate::source::{ParsedSource, node_range};
use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    Symbol(String),
    True,
    False,
    Nil,
    Array(Vec<Literal>),
    Hash(Vec<Pair>),
    /// Constant path, `Billing::Invoice`.
    Const(Vec<String>),
    /// Unary minus on a non-numeric operand, `-Float::INFINITY`.
    Neg(Box<Literal>),
    Send {
        receiver: Box<Literal>,
        method: String,
        args: Vec<Literal>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pair {
    pub key: Literal,
    pub value: Literal,
}

impl Pair {
    pub fn new(key: Literal, value: Literal) -> Self {
        Self { key, value }
    }
}

impl Literal {
    pub fn constant(path: &str) -> Self {
        Literal::Const(path.split("::").map(str::to_owned).collect())
    }

    /// `receiver.method(args)`.
    pub fn send(receiver: Literal, method: impl Into<String>, args: Vec<Literal>) -> Self {
        Literal::Send {
            receiver: Box::new(receiver),
            method: method.into(),
            args,
        }
    }

    /// Read literal syntax back into a tree.
    pub fn parse(lang: &Lang, text: &str) -> Result<Self> {
        let source = ParsedSource::parse(lang, text)?;
        let root = source.root();
        let mut cursor = root.walk();
        let statements: Vec<_> = root
            .named_children(&mut cursor)
            .filter(|node| !node.is_extra())
            .collect();
        match statements.as_slice() {
            [node] => Reader { source: &source }.read(*node),
            _ => Err(Error::NotALiteral {
                kind: root.kind().to_owned(),
                range: node_range(root),
            }),
        }
    }
}

// Printing

const KEYWORDS: &[&str] = &[
    "BEGIN", "END", "alias", "and", "begin", "break", "case", "class", "def", "defined?", "do",
    "else", "elsif", "end", "ensure", "false", "for", "if", "in", "module", "next", "nil", "not",
    "or", "redo", "rescue", "retry", "return", "self", "super", "then", "true", "undef", "unless",
    "until", "when", "while", "yield",
];

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Writable as `:name` without quotes.
fn is_plain_symbol(name: &str) -> bool {
    let base = name
        .strip_suffix('?')
        .or_else(|| name.strip_suffix('!'))
        .unwrap_or(name);
    is_identifier(base)
}

/// Writable as a `name:` hash key.
fn is_label(name: &str) -> bool {
    is_identifier(name) && !KEYWORDS.contains(&name)
}

fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_char('"')?;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            '\x1b' => f.write_str("\\e")?,
            '#' if matches!(chars.peek(), Some('{' | '$' | '@')) => f.write_str("\\#")?,
            c if c.is_control() => write!(f, "\\u{{{:x}}}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Literal]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(i) => write!(f, "{i}"),
            Literal::Float(x) if x.is_nan() => f.write_str("Float::NAN"),
            Literal::Float(x) if x.is_infinite() && *x > 0.0 => f.write_str("Float::INFINITY"),
            Literal::Float(x) if x.is_infinite() => f.write_str("-Float::INFINITY"),
            Literal::Float(x) => write!(f, "{x:?}"),
            Literal::String(s) => write_quoted(f, s),
            Literal::Symbol(s) if is_plain_symbol(s) => write!(f, ":{s}"),
            Literal::Symbol(s) => {
                f.write_char(':')?;
                write_quoted(f, s)
            }
            Literal::True => f.write_str("true"),
            Literal::False => f.write_str("false"),
            Literal::Nil => f.write_str("nil"),
            Literal::Array(items) => {
                f.write_char('[')?;
                write_list(f, items)?;
                f.write_char(']')
            }
            Literal::Hash(pairs) if pairs.is_empty() => f.write_str("{}"),
            Literal::Hash(pairs) => {
                f.write_str("{ ")?;
                for (i, pair) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{pair}")?;
                }
                f.write_str(" }")
            }
            Literal::Const(path) => f.write_str(&path.join("::")),
            Literal::Neg(inner) => write!(f, "-{inner}"),
            Literal::Send {
                receiver,
                method,
                args,
            } => {
                write!(f, "{receiver}.{method}")?;
                if !args.is_empty() {
                    f.write_char('(')?;
                    write_list(f, args)?;
                    f.write_char(')')?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Literal::Symbol(name) if is_label(name) => write!(f, "{name}: {}", self.value),
            key => write!(f, "{key} => {}", self.value),
        }
    }
}

// Reading

struct Reader<'s> {
    source: &'s ParsedSource,
}

impl Reader<'_> {
    fn reject(&self, node: Node<'_>) -> Error {
        Error::NotALiteral {
            kind: node.kind().to_owned(),
            range: node_range(node),
        }
    }

    fn text(&self, node: Node<'_>) -> &str {
        self.source.node_text(node)
    }

    fn named_children<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .filter(|child| !child.is_extra())
            .collect()
    }

    fn read(&self, node: Node<'_>) -> Result<Literal> {
        match node.kind() {
            "integer" => self.integer(node, false).map(Literal::Integer),
            "float" => self.float(node, false).map(Literal::Float),
            "unary" => self.unary(node),
            "string" => self.string_contents(node).map(Literal::String),
            "simple_symbol" => Ok(Literal::Symbol(self.text(node)[1..].to_owned())),
            "delimited_symbol" => self.string_contents(node).map(Literal::Symbol),
            "true" => Ok(Literal::True),
            "false" => Ok(Literal::False),
            "nil" => Ok(Literal::Nil),
            "array" => self
                .named_children(node)
                .into_iter()
                .map(|item| self.read(item))
                .collect::<Result<_>>()
                .map(Literal::Array),
            "hash" => self
                .named_children(node)
                .into_iter()
                .map(|pair| self.pair(pair))
                .collect::<Result<_>>()
                .map(Literal::Hash),
            "constant" => Ok(Literal::Const(vec![self.text(node).to_owned()])),
            "scope_resolution" => self.scope(node).map(Literal::Const),
            "call" => self.call(node),
            "parenthesized_statements" => match self.named_children(node).as_slice() {
                [inner] => self.read(*inner),
                _ => Err(self.reject(node)),
            },
            _ => Err(self.reject(node)),
        }
    }

    fn integer(&self, node: Node<'_>, negative: bool) -> Result<i64> {
        let digits = self.text(node).replace('_', "");
        let (radix, digits) = match digits.get(..2) {
            Some("0x" | "0X") => (16, &digits[2..]),
            Some("0b" | "0B") => (2, &digits[2..]),
            Some("0o" | "0O") => (8, &digits[2..]),
            Some("0d" | "0D") => (10, &digits[2..]),
            _ if digits.len() > 1 && digits.starts_with('0') => (8, &digits[1..]),
            _ => (10, digits.as_str()),
        };
        let magnitude =
            i128::from_str_radix(digits, radix).map_err(|_| self.reject(node))?;
        let value = if negative { -magnitude } else { magnitude };
        i64::try_from(value).map_err(|_| self.reject(node))
    }

    fn float(&self, node: Node<'_>, negative: bool) -> Result<f64> {
        let value: f64 = self
            .text(node)
            .replace('_', "")
            .parse()
            .map_err(|_| self.reject(node))?;
        Ok(if negative { -value } else { value })
    }

    fn unary(&self, node: Node<'_>) -> Result<Literal> {
        let (Some(operator), Some(operand)) = (
            node.child_by_field_name("operator"),
            node.child_by_field_name("operand"),
        ) else {
            return Err(self.reject(node));
        };
        let negative = match operator.kind() {
            "-" => true,
            "+" => false,
            _ => return Err(self.reject(node)),
        };
        match operand.kind() {
            "integer" => self.integer(operand, negative).map(Literal::Integer),
            "float" => self.float(operand, negative).map(Literal::Float),
            _ if negative => Ok(Literal::Neg(Box::new(self.read(operand)?))),
            _ => self.read(operand),
        }
    }

    fn string_contents(&self, node: Node<'_>) -> Result<String> {
        let single_quoted = self.text(node).starts_with('\'');
        let mut out = String::new();
        for child in self.named_children(node) {
            let text = self.text(child);
            match child.kind() {
                "string_content" if single_quoted => {
                    out.push_str(&text.replace("\\\\", "\\").replace("\\'", "'"))
                }
                "string_content" => out.push_str(text),
                "escape_sequence" => {
                    out.push_str(&unescape(text).ok_or_else(|| self.reject(child))?)
                }
                _ => return Err(self.reject(child)),
            }
        }
        Ok(out)
    }

    fn scope(&self, node: Node<'_>) -> Result<Vec<String>> {
        let name = node
            .child_by_field_name("name")
            .ok_or_else(|| self.reject(node))?;
        let mut path = match node.child_by_field_name("scope") {
            Some(scope) => match self.read(scope)? {
                Literal::Const(path) => path,
                _ => return Err(self.reject(scope)),
            },
            None => Vec::new(),
        };
        path.push(self.text(name).to_owned());
        Ok(path)
    }

    fn pair(&self, node: Node<'_>) -> Result<Pair> {
        if node.kind() != "pair" {
            return Err(self.reject(node));
        }
        let (Some(key), Some(value)) = (
            node.child_by_field_name("key"),
            node.child_by_field_name("value"),
        ) else {
            return Err(self.reject(node));
        };
        let mut cursor = node.walk();
        let arrow = node.children(&mut cursor).any(|child| child.kind() == "=>");
        let key = match key.kind() {
            "hash_key_symbol" => Literal::Symbol(self.text(key).to_owned()),
            "string" if !arrow => Literal::Symbol(self.string_contents(key)?),
            _ => self.read(key)?,
        };
        Ok(Pair::new(key, self.read(value)?))
    }

    fn call(&self, node: Node<'_>) -> Result<Literal> {
        let (Some(receiver), Some(method)) = (
            node.child_by_field_name("receiver"),
            node.child_by_field_name("method"),
        ) else {
            return Err(self.reject(node));
        };
        let plain_dot = node
            .child_by_field_name("operator")
            .is_some_and(|op| op.kind() == ".");
        if !plain_dot || node.child_by_field_name("block").is_some() {
            return Err(self.reject(node));
        }

        let mut args = Vec::new();
        let mut trailing = Vec::new();
        if let Some(list) = node.child_by_field_name("arguments") {
            for arg in self.named_children(list) {
                if arg.kind() == "pair" {
                    trailing.push(self.pair(arg)?);
                } else if trailing.is_empty() {
                    args.push(self.read(arg)?);
                } else {
                    return Err(self.reject(arg));
                }
            }
        }
        if !trailing.is_empty() {
            args.push(Literal::Hash(trailing));
        }

        Ok(Literal::Send {
            receiver: Box::new(self.read(receiver)?),
            method: self.text(method).to_owned(),
            args,
        })
    }
}

/// Decode one double-quoted escape sequence.
fn unescape(seq: &str) -> Option<String> {
    let body = seq.strip_prefix('\\')?;
    let simple = match body {
        "n" => Some('\n'),
        "t" => Some('\t'),
        "r" => Some('\r'),
        "e" => Some('\x1b'),
        "s" => Some(' '),
        "0" => Some('\0'),
        "a" => Some('\x07'),
        "b" => Some('\x08'),
        "v" => Some('\x0b'),
        "f" => Some('\x0c'),
        _ => None,
    };
    if let Some(c) = simple {
        return Some(c.to_string());
    }
    if let Some(hex) = body.strip_prefix("u{") {
        return hex
            .strip_suffix('}')?
            .split_whitespace()
            .map(|cp| u32::from_str_radix(cp, 16).ok().and_then(char::from_u32))
            .collect();
    }
    if let Some(hex) = body.strip_prefix('u') {
        return char::from_u32(u32::from_str_radix(hex, 16).ok()?).map(String::from);
    }
    if let Some(hex) = body.strip_prefix('x') {
        return char::from_u32(u32::from_str_radix(hex, 16).ok()?).map(String::from);
    }
    // Any other escaped character stands for itself (`\"`, `\\`, `\#`).
    let mut chars = body.chars();
    let c = chars.next()?;
    chars.next().is_none().then(|| c.to_string())
}

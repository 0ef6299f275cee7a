#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Tree-sitter grammars for the languages snapshoot rewrites.

use std::num::NonZeroU16;

use arborium_tree_sitter as tree_sitter;
use tree_sitter::Language;

pub mod builtin;

pub use builtin::*;

/// Node kind id as assigned by the grammar.
pub type NodeTypeId = u16;

/// Field id as assigned by the grammar. Zero is reserved for "no field".
pub type NodeFieldId = NonZeroU16;

/// User-facing language type.
pub type Lang = std::sync::Arc<dyn LangImpl>;

/// Facade over tree-sitter's Language API.
pub trait LangImpl: Send + Sync {
    fn name(&self) -> &str;

    /// Parse source code into a tree-sitter tree.
    fn parse(&self, source: &str) -> tree_sitter::Tree;

    fn resolve_named_node(&self, kind: &str) -> Option<NodeTypeId>;
    fn resolve_field(&self, name: &str) -> Option<NodeFieldId>;
}

#[derive(Debug)]
pub struct LangInner {
    name: String,
    ts_lang: Language,
}

impl LangInner {
    pub fn new(name: &str, ts_lang: Language) -> Self {
        Self {
            name: name.to_owned(),
            ts_lang,
        }
    }
}

impl LangImpl for LangInner {
    fn name(&self) -> &str {
        &self.name
    }

    fn parse(&self, source: &str) -> tree_sitter::Tree {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&self.ts_lang)
            .expect("failed to set language");
        parser.parse(source, None).expect("failed to parse source")
    }

    fn resolve_named_node(&self, kind: &str) -> Option<NodeTypeId> {
        let id = self.ts_lang.id_for_node_kind(kind, true);
        // For named nodes, 0 always means "not found"
        (id != 0).then_some(id)
    }

    fn resolve_field(&self, name: &str) -> Option<NodeFieldId> {
        self.ts_lang.field_id_for_name(name)
    }
}

//! Snapshoot: inline snapshot rewriting for test sources.
//!
//! A test calls its snapshot matcher without an expected value. The first run
//! captures the actual value and this crate writes it back into the test file
//! as a literal argument of that matcher call.
//!
//! # Example
//!
//! ```
//! use snapshoot_core::Value;
//! use snapshoot_lib::{Injector, Registry, source::ParsedSource};
//!
//! let lang = snapshoot_langs::ruby();
//! let source = ParsedSource::parse(&lang, "expect(2 + 2).to match_snapshot\n").unwrap();
//! let injector = Injector::new(lang, "match_snapshot", Registry::builtin()).unwrap();
//!
//! let output = injector.rewrite(&source, &[(1, Value::from(4))]).unwrap();
//! assert_eq!(output, "expect(2 + 2).to match_snapshot(4)\n");
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use std::path::PathBuf;

use rowan::TextRange;

pub mod config;
pub mod diagnostics;
pub mod format;
pub mod inject;
pub mod literal;
pub mod locate;
pub mod rewrite;
pub mod schedule;
pub mod serialize;
pub mod session;
pub mod source;

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod serialize_tests;
#[cfg(test)]
mod session_tests;

pub use config::{Config, UpdateMode};
pub use diagnostics::ErrorPrinter;
pub use format::{Formatter, format_text};
pub use inject::{InjectionRequest, Injector};
pub use literal::{Literal, Pair};
pub use locate::{CallSite, Locator, Pattern};
pub use rewrite::{Edit, Rewrite, apply_edits};
pub use schedule::{FileEditBatch, FlushError, Scheduler};
pub use serialize::{Context, FnHandler, Handler, Registry, Serializer};
pub use session::{Flushed, Outcome, Session};
pub use source::ParsedSource;

/// Errors produced while locating, serializing and rewriting snapshots.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Source text does not parse under the target grammar.
    #[error("syntax error on line {line}")]
    SyntaxError {
        path: Option<PathBuf>,
        range: TextRange,
        line: usize,
    },

    #[error("no bare `{matcher}` call on line {line}")]
    CallSiteNotFound {
        path: Option<PathBuf>,
        matcher: String,
        line: usize,
    },

    #[error("{} bare `{matcher}` calls on line {line}", .ranges.len())]
    AmbiguousCallSite {
        path: Option<PathBuf>,
        matcher: String,
        line: usize,
        ranges: Vec<TextRange>,
    },

    /// No registered handler accepts the value.
    #[error("cannot serialize {type_name}: no handler among [{}]", .handlers.join(", "))]
    UnsupportedValue {
        type_name: String,
        handlers: Vec<String>,
    },

    #[error("cannot serialize {type_name}: it refers back to itself")]
    CyclicValue { type_name: String },

    /// Value nested deeper than the configured limit.
    #[error("recursion limit of {limit} exceeded")]
    RecursionLimitExceeded { limit: usize },

    #[error("edits at {first:?} and {second:?} overlap")]
    ConflictingEdits { first: TextRange, second: TextRange },

    #[error("edit at {range:?} does not fit a {len}-byte buffer")]
    EditOutOfBounds { range: TextRange, len: usize },

    /// Syntax read back as a literal is not literal-shaped.
    #[error("`{kind}` is not a literal")]
    NotALiteral { kind: String, range: TextRange },

    #[error("printed literal `{printed}` does not read back as the same value")]
    UnstableLiteral { printed: String },

    #[error("unknown node kind `{0}`")]
    UnknownNodeKind(String),

    #[error("unknown field `{0}`")]
    UnknownField(String),

    #[error("failed to read {}", .path.display())]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}", .path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Capture(#[from] snapshoot_core::CaptureError),
}

/// Result type for snapshot operations.
pub type Result<T> = std::result::Result<T, Error>;

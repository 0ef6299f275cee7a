//! Single-pass text rewriting.
//!
//! All edits of a batch are measured against the same original buffer and
//! applied in one walk over it, so no edit shifts the offsets of another.

use rowan::{TextRange, TextSize};
use tracing::trace;

use crate::source::text_size;
use crate::{Error, Result};

/// Replace `range` of the original text with `replacement`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Edit {
    pub range: TextRange,
    pub replacement: String,
}

impl Edit {
    pub fn replace(range: TextRange, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    pub fn insert(offset: TextSize, text: impl Into<String>) -> Self {
        Self::replace(TextRange::empty(offset), text)
    }

    pub fn delete(range: TextRange) -> Self {
        Self::replace(range, String::new())
    }

    pub fn is_insertion(&self) -> bool {
        self.range.is_empty()
    }
}

/// Output of [`apply_edits`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    /// Where each replacement landed in `text`, in edit order.
    pub replaced: Vec<TextRange>,
}

/// Order edits by `(start, end)` and drop exact duplicates.
pub fn sort_edits(edits: &mut Vec<Edit>) {
    edits.sort_by_key(|edit| (edit.range.start(), edit.range.end()));
    edits.dedup();
}

/// Apply sorted, non-overlapping edits to `text`.
///
/// Two insertions at the same offset conflict, since their relative order
/// would be arbitrary. An insertion at the boundary of a replacement does not.
pub fn apply_edits(text: &str, edits: &[Edit]) -> Result<Rewrite> {
    check_edits(text, edits)?;

    let added: usize = edits.iter().map(|e| e.replacement.len()).sum();
    let mut out = String::with_capacity(text.len() + added);
    let mut replaced = Vec::with_capacity(edits.len());
    let mut pos = 0;

    for edit in edits {
        let start = usize::from(edit.range.start());
        trace!(range = ?edit.range, replacement = %edit.replacement, "applying edit");
        out.push_str(&text[pos..start]);
        let landed = text_size(out.len());
        out.push_str(&edit.replacement);
        replaced.push(TextRange::new(landed, text_size(out.len())));
        pos = usize::from(edit.range.end());
    }
    out.push_str(&text[pos..]);

    Ok(Rewrite {
        text: out,
        replaced,
    })
}

fn check_edits(text: &str, edits: &[Edit]) -> Result<()> {
    for edit in edits {
        let start = usize::from(edit.range.start());
        let end = usize::from(edit.range.end());
        if end > text.len() || !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            return Err(Error::EditOutOfBounds {
                range: edit.range,
                len: text.len(),
            });
        }
    }
    for pair in edits.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        if cur.range.start() < prev.range.end() || cur.range == prev.range {
            return Err(Error::ConflictingEdits {
                first: prev.range,
                second: cur.range,
            });
        }
    }
    Ok(())
}

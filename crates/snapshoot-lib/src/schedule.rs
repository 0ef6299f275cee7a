//! Per-file edit batches flushed once per run.
//!
//! Several snapshots in one test file are recorded against the same parse and
//! written in a single rewrite, so no edit invalidates another's offsets.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use indexmap::map::Entry;
use rowan::TextRange;
use snapshoot_langs::Lang;
use tracing::{debug, trace, warn};

use crate::diagnostics::render_patch;
use crate::format::Formatter;
use crate::rewrite::{Edit, apply_edits, sort_edits};
use crate::source::ParsedSource;
use crate::{Error, Result};

/// Edits destined for one file, measured against `source`.
#[derive(Debug)]
pub struct FileEditBatch {
    source: ParsedSource,
    edits: Vec<Edit>,
}

impl FileEditBatch {
    pub fn new(source: ParsedSource) -> Self {
        Self {
            source,
            edits: Vec::new(),
        }
    }

    pub fn source(&self) -> &ParsedSource {
        &self.source
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn push(&mut self, edit: Edit) {
        trace!(range = ?edit.range, "edit scheduled");
        self.edits.push(edit);
    }

    /// The file's text after all edits and formatting.
    pub fn render(&self, formatter: &Formatter) -> Result<String> {
        let mut edits = self.edits.clone();
        sort_edits(&mut edits);
        let rewrite = apply_edits(self.source.text(), &edits)?;

        let rewritten = self.source.reparse(rewrite.text)?;
        let layout = formatter.format_regions(&rewritten, &rewrite.replaced);
        Ok(apply_edits(rewritten.text(), &layout)?.text)
    }
}

/// Files that failed to flush, with the reason for each.
#[derive(Debug, thiserror::Error)]
#[error("failed to flush {} file(s)", .failures.len())]
pub struct FlushError {
    /// Files written successfully before and after the failures.
    pub written: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, Error)>,
}

/// Canonical form of `path`, used as the batch key.
fn batch_key(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|source| Error::ReadFailure {
        path: path.to_owned(),
        source,
    })
}

pub struct Scheduler {
    lang: Lang,
    formatter: Formatter,
    batches: IndexMap<PathBuf, FileEditBatch>,
}

impl Scheduler {
    pub fn new(lang: Lang) -> Self {
        Self {
            lang,
            formatter: Formatter::default(),
            batches: IndexMap::new(),
        }
    }

    pub fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Current parse of `path`, read on first touch in this run.
    ///
    /// Later calls return the same parse even if the file changed on disk.
    /// Different spellings of one file (`./a_spec.rb`, a symlink) share a batch.
    pub fn parsed(&mut self, path: &Path) -> Result<&ParsedSource> {
        let key = batch_key(path)?;
        let batch = match self.batches.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let path = entry.key();
                let text = fs::read_to_string(path).map_err(|source| Error::ReadFailure {
                    path: path.clone(),
                    source,
                })?;
                let source = ParsedSource::parse_with_path(&self.lang, path, text)?;
                debug!(path = %path.display(), "batch opened");
                entry.insert(FileEditBatch::new(source))
            }
        };
        Ok(batch.source())
    }

    pub fn schedule(&mut self, path: &Path, range: TextRange, replacement: impl Into<String>) -> Result<()> {
        let key = batch_key(path)?;
        self.parsed(&key)?;
        if let Some(batch) = self.batches.get_mut(&key) {
            batch.push(Edit::replace(range, replacement));
            debug!(path = %key.display(), edits = batch.edits.len(), "edit queued");
        }
        Ok(())
    }

    /// Number of queued edits across all files.
    pub fn pending(&self) -> usize {
        self.batches.values().map(|b| b.edits.len()).sum()
    }

    pub fn batches(&self) -> impl Iterator<Item = (&Path, &FileEditBatch)> {
        self.batches.iter().map(|(path, batch)| (path.as_path(), batch))
    }

    /// Drop all batches without writing.
    pub fn clear(&mut self) {
        self.batches.clear();
    }

    /// Render every pending change as an annotated patch. Writes nothing.
    pub fn preview(&self) -> std::result::Result<String, FlushError> {
        let mut reports = Vec::new();
        let mut failures = Vec::new();
        for (path, batch) in &self.batches {
            if batch.edits.is_empty() {
                continue;
            }
            match batch.render(&self.formatter) {
                Ok(text) => reports.push(render_patch(path, batch.source.text(), &text)),
                Err(err) => failures.push((path.clone(), err)),
            }
        }
        if !failures.is_empty() {
            return Err(FlushError {
                written: Vec::new(),
                failures,
            });
        }
        Ok(reports.join("\n"))
    }

    /// Rewrite and write every file with pending edits.
    ///
    /// A batch that fails to render is discarded. A batch that fails to write
    /// stays queued so a later flush can retry it.
    pub fn flush(&mut self) -> std::result::Result<Vec<PathBuf>, FlushError> {
        let mut written = Vec::new();
        let mut failures = Vec::new();

        for (path, batch) in std::mem::take(&mut self.batches) {
            if batch.edits.is_empty() {
                continue;
            }
            let text = match batch.render(&self.formatter) {
                Ok(text) => text,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "batch discarded");
                    failures.push((path, err));
                    continue;
                }
            };
            match fs::write(&path, text) {
                Ok(()) => {
                    debug!(path = %path.display(), edits = batch.edits.len(), "file flushed");
                    written.push(path);
                }
                Err(source) => {
                    warn!(path = %path.display(), error = %source, "write failed, batch kept");
                    failures.push((
                        path.clone(),
                        Error::WriteFailure {
                            path: path.clone(),
                            source,
                        },
                    ));
                    self.batches.insert(path, batch);
                }
            }
        }

        if failures.is_empty() {
            Ok(written)
        } else {
            Err(FlushError { written, failures })
        }
    }
}

//! One test run's worth of snapshot bookkeeping.
//!
//! A [`Session`] is created once per run. Every matcher call reports its
//! outcome through [`Session::check`]; missing snapshots are queued, and
//! [`Session::flush`] rewrites the affected files after the run.

use std::path::{Path, PathBuf};

use serde::Serialize;
use snapshoot_core::{Value, to_value};
use tracing::{debug, info};

use crate::config::{Config, UpdateMode};
use crate::format::Formatter;
use crate::inject::{InjectionRequest, Injector};
use crate::schedule::{FlushError, Scheduler};
use crate::serialize::Registry;
use crate::Result;

/// Result of one matcher call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Matched,
    Mismatched,
    /// No expected value; the actual value was queued for injection.
    Recorded,
    /// No expected value and updates are disabled.
    Skipped,
}

/// What [`Session::flush`] did.
#[derive(Debug, PartialEq, Eq)]
pub enum Flushed {
    Written(Vec<PathBuf>),
    /// Annotated patch of the changes that would have been written.
    Previewed(String),
}

pub struct Session {
    config: Config,
    injector: Injector,
    scheduler: Scheduler,
}

impl Session {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_registry(config, Registry::builtin())
    }

    pub fn with_registry(config: Config, registry: Registry) -> Result<Self> {
        let formatter = Formatter::new(config.indent.clone());
        let injector = Injector::new(config.lang.clone(), config.matcher.clone(), registry)?
            .with_recursion_limit(config.recursion_limit)
            .with_formatter(formatter.clone());
        let scheduler = Scheduler::new(config.lang.clone()).with_formatter(formatter);
        debug!(?config, "session started");
        Ok(Self {
            config,
            injector,
            scheduler,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn injector(&self) -> &Injector {
        &self.injector
    }

    /// Queue an injection regardless of update mode.
    pub fn inject(&mut self, request: &InjectionRequest) -> Result<()> {
        self.injector.inject(&mut self.scheduler, request)
    }

    /// Compare against `expected`, or record `actual` when there is none.
    pub fn check(
        &mut self,
        path: impl AsRef<Path>,
        line: usize,
        expected: Option<&Value>,
        actual: Value,
    ) -> Result<Outcome> {
        if let Some(expected) = expected {
            return Ok(if *expected == actual {
                Outcome::Matched
            } else {
                Outcome::Mismatched
            });
        }
        if self.config.update_mode == UpdateMode::Never {
            debug!(path = %path.as_ref().display(), line, "snapshot missing, updates disabled");
            return Ok(Outcome::Skipped);
        }
        let request = InjectionRequest::new(path.as_ref(), line, actual);
        self.inject(&request)?;
        Ok(Outcome::Recorded)
    }

    /// [`Session::check`] for any `Serialize` value, captured with [`to_value`].
    pub fn check_serialized<T: ?Sized + Serialize>(
        &mut self,
        path: impl AsRef<Path>,
        line: usize,
        expected: Option<&Value>,
        actual: &T,
    ) -> Result<Outcome> {
        let actual = to_value(actual)?;
        self.check(path, line, expected, actual)
    }

    /// Edits queued and not yet flushed.
    pub fn pending(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn preview(&self) -> std::result::Result<String, FlushError> {
        self.scheduler.preview()
    }

    /// Write queued snapshots, or only render them in preview mode.
    ///
    /// Preview mode drops the queue after rendering.
    pub fn flush(&mut self) -> std::result::Result<Flushed, FlushError> {
        match self.config.update_mode {
            UpdateMode::Preview => {
                let patch = self.scheduler.preview();
                self.scheduler.clear();
                patch.map(Flushed::Previewed)
            }
            UpdateMode::Write | UpdateMode::Never => {
                let written = self.scheduler.flush()?;
                if !written.is_empty() {
                    info!(files = written.len(), "snapshots written");
                }
                Ok(Flushed::Written(written))
            }
        }
    }
}

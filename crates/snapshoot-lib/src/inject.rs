//! Injecting captured values into matcher calls.

use std::path::PathBuf;

use snapshoot_core::Value;
use snapshoot_langs::Lang;
use tracing::debug;

use crate::format::Formatter;
use crate::literal::Literal;
use crate::locate::Locator;
use crate::rewrite::{Edit, apply_edits, sort_edits};
use crate::schedule::Scheduler;
use crate::serialize::{Registry, Serializer};
use crate::source::ParsedSource;
use crate::{Error, Result};

/// One captured value and the matcher call it belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct InjectionRequest {
    pub path: PathBuf,
    /// 1-based line of the matcher call.
    pub line: usize,
    pub actual: Value,
}

impl InjectionRequest {
    pub fn new(path: impl Into<PathBuf>, line: usize, actual: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            line,
            actual: actual.into(),
        }
    }
}

pub struct Injector {
    lang: Lang,
    locator: Locator,
    serializer: Serializer,
    formatter: Formatter,
}

impl Injector {
    pub fn new(lang: Lang, matcher: impl Into<String>, registry: Registry) -> Result<Self> {
        let locator = Locator::new(&lang, matcher)?;
        Ok(Self {
            lang,
            locator,
            serializer: Serializer::new(registry),
            formatter: Formatter::default(),
        })
    }

    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.serializer = self.serializer.with_recursion_limit(limit);
        self
    }

    pub fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn lang(&self) -> &Lang {
        &self.lang
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    /// Printed literal for `value`, guaranteed to read back unchanged.
    pub fn literal_for(&self, value: &Value) -> Result<String> {
        let literal = self.serializer.serialize(value)?;
        let printed = literal.to_string();
        match Literal::parse(&self.lang, &printed) {
            Ok(read) if read == literal => Ok(printed),
            _ => Err(Error::UnstableLiteral { printed }),
        }
    }

    /// Edit that fills the bare matcher call on `line` with `value`.
    pub fn edit_for(&self, source: &ParsedSource, line: usize, value: &Value) -> Result<Edit> {
        let site = self.locator.find_injection_target(source, line)?;
        let literal = self.literal_for(value)?;
        debug!(line, range = ?site.range, "call site located");
        Ok(Edit::replace(
            site.range,
            format!("{}({literal})", self.locator.matcher()),
        ))
    }

    /// Fill several calls of one in-memory source and return the new text.
    ///
    /// Nothing is returned unless every injection succeeds.
    pub fn rewrite(&self, source: &ParsedSource, injections: &[(usize, Value)]) -> Result<String> {
        let mut edits = injections
            .iter()
            .map(|(line, value)| self.edit_for(source, *line, value))
            .collect::<Result<Vec<_>>>()?;
        sort_edits(&mut edits);
        let rewrite = apply_edits(source.text(), &edits)?;

        let rewritten = source.reparse(rewrite.text)?;
        let layout = self.formatter.format_regions(&rewritten, &rewrite.replaced);
        Ok(apply_edits(rewritten.text(), &layout)?.text)
    }

    /// Queue the edit for `request` on the scheduler. The file is untouched
    /// until the scheduler flushes.
    pub fn inject(&self, scheduler: &mut Scheduler, request: &InjectionRequest) -> Result<()> {
        let source = scheduler.parsed(&request.path)?;
        let edit = self.edit_for(source, request.line, &request.actual)?;
        scheduler.schedule(&request.path, edit.range, edit.replacement)
    }
}

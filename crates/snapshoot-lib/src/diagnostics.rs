//! Builder-pattern printer for rendering errors against their source.

use std::fmt::Write;
use std::path::Path;

use annotate_snippets::{AnnotationKind, Group, Level, Patch, Renderer, Snippet};
use rowan::TextRange;

use crate::Error;
use crate::source::line_range;

/// Builder for rendering an [`Error`] with a source excerpt.
pub struct ErrorPrinter<'e, 's> {
    error: &'e Error,
    source: Option<&'s str>,
    path: Option<&'s str>,
    colored: bool,
}

impl<'e, 's> ErrorPrinter<'e, 's> {
    pub fn new(error: &'e Error) -> Self {
        Self {
            error,
            source: None,
            path: None,
            colored: false,
        }
    }

    pub fn source(mut self, source: &'s str) -> Self {
        self.source = Some(source);
        self
    }

    pub fn path(mut self, path: &'s str) -> Self {
        self.path = Some(path);
        self
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        let message = self.error.to_string();
        let Some(source) = self.source else {
            return w.write_str(&message);
        };
        let Some((primary, related)) = self.error.spans(source) else {
            return w.write_str(&message);
        };

        let mut snippet = Snippet::source(source).line_start(1).annotation(
            AnnotationKind::Primary
                .span(adjust_range(primary, source.len()))
                .label(&message),
        );
        if let Some(p) = self.path {
            snippet = snippet.path(p);
        }
        for range in related {
            snippet = snippet.annotation(
                AnnotationKind::Context
                    .span(adjust_range(range, source.len()))
                    .label("also here"),
            );
        }

        let report: Vec<Group> = vec![Level::ERROR.primary_title(&message).element(snippet)];
        write!(w, "{}", renderer(self.colored).render(&report))
    }
}

impl Error {
    pub fn printer(&self) -> ErrorPrinter<'_, '_> {
        ErrorPrinter::new(self)
    }

    /// Plain rendering with a source excerpt where the error has a location.
    pub fn render(&self, source: &str) -> String {
        self.printer().source(source).render()
    }

    /// Primary and related ranges in `source`.
    fn spans(&self, source: &str) -> Option<(TextRange, Vec<TextRange>)> {
        match self {
            Error::SyntaxError { range, .. } | Error::NotALiteral { range, .. } => {
                Some((*range, Vec::new()))
            }
            Error::CallSiteNotFound { line, .. } => Some((line_range(source, *line)?, Vec::new())),
            Error::AmbiguousCallSite { ranges, .. } => {
                let (first, rest) = ranges.split_first()?;
                Some((*first, rest.to_vec()))
            }
            Error::ConflictingEdits { first, second } => Some((*second, vec![*first])),
            _ => None,
        }
    }
}

/// Render the change from `old` to `new` as a patch suggestion on `path`.
pub fn render_patch(path: &Path, old: &str, new: &str) -> String {
    let (range, replacement) = changed_region(old, new);
    let title = format!("update snapshots in {}", path.display());
    let path = path.display().to_string();
    let report: Vec<Group> = vec![
        Level::HELP.secondary_title(&title).element(
            Snippet::source(old)
                .line_start(1)
                .path(&path)
                .patch(Patch::new(range, replacement)),
        ),
    ];
    renderer(false).render(&report)
}

/// Smallest byte range of `old` that, replaced, yields `new`.
fn changed_region<'n>(old: &str, new: &'n str) -> (std::ops::Range<usize>, &'n str) {
    let prefix: usize = old
        .chars()
        .zip(new.chars())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| a.len_utf8())
        .sum();
    let suffix: usize = old[prefix..]
        .chars()
        .rev()
        .zip(new[prefix..].chars().rev())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| a.len_utf8())
        .sum();
    (
        prefix..old.len() - suffix,
        &new[prefix..new.len() - suffix],
    )
}

fn renderer(colored: bool) -> Renderer {
    if colored {
        Renderer::styled()
    } else {
        Renderer::plain()
    }
}

fn adjust_range(range: TextRange, limit: usize) -> std::ops::Range<usize> {
    let start: usize = range.start().into();
    let end: usize = range.end().into();

    if start == end {
        return start..(start + 1).min(limit);
    }

    start..end
}

//! Session configuration.

use std::fmt;
use std::str::FromStr;

use snapshoot_langs::Lang;

use crate::serialize::DEFAULT_RECURSION_LIMIT;
use crate::{Error, Result};

/// Matcher method recognised when none is configured.
pub const DEFAULT_MATCHER: &str = "match_snapshot";

/// What to do with a snapshot that has no expected value yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UpdateMode {
    /// Rewrite the test file.
    #[default]
    Write,
    /// Render the rewrite as a patch and leave files untouched.
    Preview,
    /// Record nothing; a missing snapshot is reported as such.
    Never,
}

impl FromStr for UpdateMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "1" | "yes" | "true" | "write" => Ok(UpdateMode::Write),
            "preview" | "dry-run" => Ok(UpdateMode::Preview),
            "0" | "no" | "false" | "never" => Ok(UpdateMode::Never),
            other => Err(Error::InvalidConfig(format!(
                "SNAPSHOOT_UPDATE must be write, preview or no, got `{other}`"
            ))),
        }
    }
}

/// Configuration for a [`Session`](crate::Session).
#[derive(Clone)]
pub struct Config {
    pub(crate) matcher: String,
    pub(crate) lang: Lang,
    pub(crate) indent: String,
    pub(crate) update_mode: UpdateMode,
    pub(crate) recursion_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            matcher: DEFAULT_MATCHER.to_owned(),
            lang: snapshoot_langs::ruby(),
            indent: "  ".to_owned(),
            update_mode: UpdateMode::default(),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("matcher", &self.matcher)
            .field("lang", &self.lang.name())
            .field("indent", &self.indent)
            .field("update_mode", &self.update_mode)
            .field("recursion_limit", &self.recursion_limit)
            .finish()
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `SNAPSHOOT_UPDATE` and `SNAPSHOOT_MATCHER`.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(mode) = var("SNAPSHOOT_UPDATE") {
            config.update_mode = mode.parse()?;
        }
        if let Some(matcher) = var("SNAPSHOOT_MATCHER")
            && !matcher.trim().is_empty()
        {
            config.matcher = matcher.trim().to_owned();
        }
        Ok(config)
    }

    pub fn matcher(mut self, matcher: impl Into<String>) -> Self {
        self.matcher = matcher.into();
        self
    }

    pub fn lang(mut self, lang: Lang) -> Self {
        self.lang = lang;
        self
    }

    /// Indentation unit for expanded literals.
    pub fn indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    pub fn update_mode(mut self, mode: UpdateMode) -> Self {
        self.update_mode = mode;
        self
    }

    pub fn recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn get_matcher(&self) -> &str {
        &self.matcher
    }

    pub fn get_update_mode(&self) -> UpdateMode {
        self.update_mode
    }
}

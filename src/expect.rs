//! Expected content types.
//!
//! A completed response is only accepted when its declared content type satisfies the
//! request's [`ExpectedType`], if one was configured.
//!
//! A plain string is a regular expression searched anywhere in the declared content
//! type, so `"png"` accepts `image/png`. Strict MIME comparison is opt-in through
//! [`ExpectedType::mime`].

use crate::errors::ConfigError;
use crate::net::mime_essence;
use regex::Regex;
use std::fmt::{Display, Formatter};

/// Caller-declared MIME type or pattern a response must satisfy.
#[derive(Debug, Clone)]
pub enum ExpectedType {
    /// A MIME essence such as `image/png`. Compared case-insensitively and ignoring
    /// parameters. `type/*` and `*/*` act as wildcards.
    Mime(String),
    /// A regular expression searched (unanchored) in the full declared content type.
    Pattern(Regex),
}

impl ExpectedType {
    pub fn mime<S: AsRef<str>>(mime: S) -> Self {
        ExpectedType::Mime(mime_essence(mime.as_ref()))
    }

    pub fn pattern(pattern: &str) -> Result<Self, ConfigError> {
        Ok(ExpectedType::Pattern(Regex::new(pattern)?))
    }

    /// An empty expectation accepts everything and is treated as absent.
    pub(crate) fn is_empty(&self) -> bool {
        match self {
            ExpectedType::Mime(m) => m.is_empty(),
            ExpectedType::Pattern(re) => re.as_str().is_empty(),
        }
    }

    /// Returns true if `content_type` satisfies this expectation.
    pub fn matches(&self, content_type: &str) -> bool {
        match self {
            ExpectedType::Pattern(re) => re.is_match(content_type),
            ExpectedType::Mime(expected) => {
                let actual = mime_essence(content_type);
                if actual.is_empty() {
                    return false;
                }
                if expected == "*" || expected == "*/*" {
                    return true;
                }
                match expected.split_once('/') {
                    Some((ty, "*")) => actual.split_once('/').is_some_and(|(aty, _)| aty == ty),
                    _ => actual == *expected,
                }
            }
        }
    }
}

impl Display for ExpectedType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpectedType::Mime(m) => write!(f, "{m}"),
            ExpectedType::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

impl TryFrom<&str> for ExpectedType {
    type Error = ConfigError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        ExpectedType::pattern(s)
    }
}

impl TryFrom<String> for ExpectedType {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        ExpectedType::pattern(&s)
    }
}

impl From<Regex> for ExpectedType {
    fn from(re: Regex) -> Self {
        ExpectedType::Pattern(re)
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// A re-resolvable reference to at most one element of a live document.
///
/// A Locator is only a description. Every query made through it re-resolves
/// the selector against current document state, and nothing a Locator does
/// mutates the page; mutation happens through driver actions alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator {
    selector: String,
}

impl Locator {
    /// A locator backed by a CSS selector.
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.selector
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.selector)
    }
}

impl From<&str> for Locator {
    fn from(selector: &str) -> Self {
        Self::css(selector)
    }
}

impl From<String> for Locator {
    fn from(selector: String) -> Self {
        Self::css(selector)
    }
}

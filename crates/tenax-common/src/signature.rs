use serde::{Deserialize, Serialize};

/// Classes of page obstruction the suppressor knows how to neutralize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstructionKind {
    /// An embedded frame whose identifying attributes follow an ad-network
    /// naming convention. Always detached.
    Frame,
    /// A container stacked above page content. Detached when its stacking
    /// order exceeds the effective threshold and it is still shown.
    Overlay,
    /// A well-known interstitial wrapper. Detached or force-hidden
    /// depending on sweep severity.
    InterstitialContainer,
}

/// A recognizer for one family of obstructive elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstructionSignature {
    pub kind: ObstructionKind,
    /// CSS selector handed to the backend for resolution.
    pub matcher: String,
    /// Per-signature stacking-order cutoff. Falls back to the sweep
    /// severity's configured threshold when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index_threshold: Option<i64>,
}

impl ObstructionSignature {
    pub fn frame(matcher: impl Into<String>) -> Self {
        Self {
            kind: ObstructionKind::Frame,
            matcher: matcher.into(),
            z_index_threshold: None,
        }
    }

    pub fn overlay(matcher: impl Into<String>) -> Self {
        Self {
            kind: ObstructionKind::Overlay,
            matcher: matcher.into(),
            z_index_threshold: None,
        }
    }

    pub fn interstitial(matcher: impl Into<String>) -> Self {
        Self {
            kind: ObstructionKind::InterstitialContainer,
            matcher: matcher.into(),
            z_index_threshold: None,
        }
    }

    pub fn with_threshold(mut self, threshold: i64) -> Self {
        self.z_index_threshold = Some(threshold);
        self
    }
}

/// How disruptive a suppression sweep is allowed to be.
///
/// Callers pick per page. The aggressive cutoff is lower (removes more) and
/// consults computed stacking order; the conservative cutoff only trusts
/// inline stacking values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Aggressive,
    #[default]
    Conservative,
}

use serde::{Deserialize, Serialize};
use tenax_common::signature::{ObstructionSignature, Severity};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenaxConfig {
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub suppressor: SuppressorConfig,
    #[serde(default)]
    pub interstitial: InterstitialConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Total wall-clock budget for one resilient interaction.
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
    /// Delay between unsuccessful attempts. Constant, no backoff.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            deadline_ms: default_deadline_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_deadline_ms() -> u64 {
    15000
}

fn default_poll_interval_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuppressorConfig {
    #[serde(default = "default_signatures")]
    pub signatures: Vec<ObstructionSignature>,
    /// Stacking-order cutoff used by aggressive sweeps.
    #[serde(default = "default_aggressive_z_threshold")]
    pub aggressive_z_threshold: i64,
    /// Stacking-order cutoff used by conservative sweeps.
    #[serde(default = "default_conservative_z_threshold")]
    pub conservative_z_threshold: i64,
}

impl SuppressorConfig {
    pub fn threshold_for(&self, severity: Severity) -> i64 {
        match severity {
            Severity::Aggressive => self.aggressive_z_threshold,
            Severity::Conservative => self.conservative_z_threshold,
        }
    }
}

impl Default for SuppressorConfig {
    fn default() -> Self {
        Self {
            signatures: default_signatures(),
            aggressive_z_threshold: default_aggressive_z_threshold(),
            conservative_z_threshold: default_conservative_z_threshold(),
        }
    }
}

fn default_aggressive_z_threshold() -> i64 {
    500
}

fn default_conservative_z_threshold() -> i64 {
    1000
}

/// The ad-network signatures observed on the supported sites. Overridable
/// per deployment via the YAML config.
fn default_signatures() -> Vec<ObstructionSignature> {
    vec![
        ObstructionSignature::frame(r#"iframe[id^="aswift_"]"#),
        ObstructionSignature::frame(r#"iframe[src*="doubleclick"]"#),
        ObstructionSignature::frame(r#"iframe[src*="googleads"]"#),
        ObstructionSignature::overlay("div, section"),
        ObstructionSignature::interstitial("#google_vignette"),
        ObstructionSignature::interstitial(".adsbygoogle"),
        ObstructionSignature::interstitial(".ad-container"),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterstitialConfig {
    /// URL substrings that indicate the document was swallowed by an
    /// interstitial redirect wrapper.
    #[serde(default = "default_markers")]
    pub markers: Vec<String>,
    /// Where to force-navigate when a marker matches, and the origin the
    /// guard keeps the session on. None disables both behaviors.
    #[serde(default)]
    pub canonical_root: Option<String>,
}

impl Default for InterstitialConfig {
    fn default() -> Self {
        Self {
            markers: default_markers(),
            canonical_root: None,
        }
    }
}

fn default_markers() -> Vec<String> {
    vec!["google_vignette".to_string()]
}

//! Interfering-element suppression.
//!
//! Ad frames, high-z-index overlay panels and interstitial wrappers can
//! intercept pointer events meant for real page content. The suppressor
//! neutralizes them before each interaction attempt: frames are detached,
//! overlays above a stacking-order cutoff are detached, interstitial
//! containers are detached or force-hidden depending on sweep severity.
//!
//! Suppression is best-effort by contract. A sweep that matches nothing is
//! a silent no-op, and a backend hiccup during a sweep is logged and
//! skipped rather than surfaced.

use tracing::debug;
use url::Url;

use crate::backend::{Backend, BackendError};
use crate::config::schema::{InterstitialConfig, SuppressorConfig, TenaxConfig};
use tenax_common::signature::{ObstructionKind, Severity};

/// Outcome of one suppression sweep. Purely informational; a sweep that
/// touched nothing is still a successful sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuppressionReport {
    pub detached: usize,
    pub hidden: usize,
}

impl SuppressionReport {
    pub fn is_noop(&self) -> bool {
        self.detached == 0 && self.hidden == 0
    }
}

pub struct Suppressor {
    config: SuppressorConfig,
    interstitial: InterstitialConfig,
}

impl Default for Suppressor {
    fn default() -> Self {
        Self::new(SuppressorConfig::default(), InterstitialConfig::default())
    }
}

impl Suppressor {
    pub fn new(config: SuppressorConfig, interstitial: InterstitialConfig) -> Self {
        Self {
            config,
            interstitial,
        }
    }

    pub fn from_config(config: &TenaxConfig) -> Self {
        Self::new(config.suppressor.clone(), config.interstitial.clone())
    }

    /// Sweep the document for obstructions and neutralize whatever matches.
    ///
    /// Idempotent: a second sweep over an already-cleared document reports
    /// zero mutations.
    pub async fn suppress<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        severity: Severity,
    ) -> SuppressionReport {
        let mut report = SuppressionReport::default();

        for signature in &self.config.signatures {
            match signature.kind {
                ObstructionKind::Frame => match backend.detach_all(&signature.matcher).await {
                    Ok(n) => report.detached += n,
                    Err(e) => debug!(matcher = %signature.matcher, "frame sweep skipped: {e}"),
                },
                ObstructionKind::Overlay => {
                    let threshold = signature
                        .z_index_threshold
                        .unwrap_or_else(|| self.config.threshold_for(severity));
                    report.detached += self
                        .clear_overlays(backend, &signature.matcher, threshold, severity)
                        .await;
                }
                ObstructionKind::InterstitialContainer => match severity {
                    Severity::Aggressive => match backend.detach_all(&signature.matcher).await {
                        Ok(n) => report.detached += n,
                        Err(e) => {
                            debug!(matcher = %signature.matcher, "interstitial sweep skipped: {e}")
                        }
                    },
                    Severity::Conservative => {
                        match backend.force_hide_all(&signature.matcher).await {
                            Ok(n) => report.hidden += n,
                            Err(e) => {
                                debug!(matcher = %signature.matcher, "interstitial sweep skipped: {e}")
                            }
                        }
                    }
                },
            }
        }

        if !report.is_noop() {
            debug!(
                detached = report.detached,
                hidden = report.hidden,
                "cleared obstructions"
            );
        }
        report
    }

    async fn clear_overlays<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        matcher: &str,
        threshold: i64,
        severity: Severity,
    ) -> usize {
        let overlays = match backend.query_overlays(matcher).await {
            Ok(overlays) => overlays,
            Err(e) => {
                debug!(matcher = %matcher, "overlay census skipped: {e}");
                return 0;
            }
        };

        let mut detached = 0;
        for overlay in overlays {
            if !overlay.visible {
                continue;
            }
            // Conservative sweeps only trust inline stacking values;
            // aggressive ones fall back to computed style.
            let z = match severity {
                Severity::Aggressive => overlay.computed_z.or(overlay.inline_z),
                Severity::Conservative => overlay.inline_z,
            };
            let Some(z) = z else { continue };
            if z <= threshold {
                continue;
            }
            match backend.detach(overlay.handle).await {
                Ok(true) => detached += 1,
                Ok(false) => {}
                Err(e) => debug!(handle = overlay.handle, "overlay detach skipped: {e}"),
            }
        }
        detached
    }

    /// If the current address indicates the document has been swallowed by
    /// an interstitial redirect wrapper, force-navigate back to the
    /// canonical application root. Returns whether a redirect happened.
    pub async fn redirect_away_from_interstitial<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
    ) -> Result<bool, BackendError> {
        let Some(root) = self.interstitial.canonical_root.as_deref() else {
            return Ok(false);
        };

        let current = backend.current_url().await?;
        if self
            .interstitial
            .markers
            .iter()
            .any(|marker| current.contains(marker.as_str()))
        {
            debug!(url = %current, "interstitial wrapper detected, returning to canonical root");
            backend.navigate(root).await?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Bring the session back to the canonical origin when the document has
    /// wandered off it via interstitial redirects, malformed ad URLs, or
    /// third-party landing pages.
    pub async fn ensure_on_origin<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
    ) -> Result<(), BackendError> {
        if self.redirect_away_from_interstitial(backend).await? {
            return Ok(());
        }

        let Some(root) = self.interstitial.canonical_root.as_deref() else {
            return Ok(());
        };
        let Ok(expected) = Url::parse(root) else {
            debug!(root = %root, "canonical root is not a parsable URL, origin guard disabled");
            return Ok(());
        };

        let current = backend.current_url().await?;
        let on_origin = Url::parse(&current)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
            .is_some_and(|host| Some(host.as_str()) == expected.host_str());
        if !on_origin {
            debug!(url = %current, "document left the canonical origin, navigating back");
            backend.navigate(root).await?;
        }
        Ok(())
    }

    /// Drop a `#fragment` an interstitial left on the address, without a
    /// reload.
    pub async fn strip_url_fragment<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
    ) -> Result<(), BackendError> {
        backend
            .execute_script(
                "(function() { \
                    if (window.location.hash) { \
                        history.replaceState(null, '', window.location.pathname + window.location.search); \
                        return true; \
                    } \
                    return false; \
                })()",
            )
            .await
            .map(|_| ())
    }
}

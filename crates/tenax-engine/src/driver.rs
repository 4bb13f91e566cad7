//! The resilient interaction driver.
//!
//! Performs a UI action against a target that may not exist yet, retrying
//! on a fixed interval until the target is ready or a deadline expires.
//! Every iteration first runs a suppression sweep, then re-evaluates the
//! readiness predicate from scratch against the live document. Per-attempt
//! failures are recoverable and never surfaced; the only error this layer
//! raises is deadline exhaustion.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep};
use tracing::{debug, trace};

use crate::backend::{Backend, BackendError};
use crate::config::schema::{DriverConfig, TenaxConfig};
use crate::locator::Locator;
use crate::suppressor::Suppressor;
use tenax_common::signature::Severity;

/// UI actions the driver knows how to attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Click,
    ScrollIntoView,
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interaction::Click => f.write_str("click"),
            Interaction::ScrollIntoView => f.write_str("scroll into view"),
        }
    }
}

/// Constant-interval retry policy.
///
/// No backoff: the dominant latency source is overlay removal settling, not
/// load, so a fixed interval keeps the worst case at a predictable
/// `deadline / poll_interval` attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub deadline: Duration,
    pub poll_interval: Duration,
    pub severity: Severity,
}

impl RetryPolicy {
    pub fn new(deadline: Duration, poll_interval: Duration) -> Self {
        Self {
            deadline,
            poll_interval,
            severity: Severity::Conservative,
        }
    }

    /// Preset for pages known to be heavily ad-laden: longer budget, faster
    /// polls, aggressive suppression.
    pub fn aggressive() -> Self {
        Self {
            deadline: Duration::from_secs(20),
            poll_interval: Duration::from_millis(300),
            severity: Severity::Aggressive,
        }
    }

    pub fn from_config(config: &DriverConfig) -> Self {
        Self::new(
            Duration::from_millis(config.deadline_ms),
            Duration::from_millis(config.poll_interval_ms),
        )
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(15), Duration::from_millis(500))
    }
}

/// Why the readiness predicate rejected the target on one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotReadyReason {
    /// The locator resolved to no element.
    Missing,
    /// The locator resolved to more than one element.
    Ambiguous(usize),
    /// Resolved, but computed style hides it.
    Hidden,
    /// Shown, but with a zero-area bounding box; a click cannot land.
    ZeroSize,
    /// Marked disabled.
    Disabled,
}

impl fmt::Display for NotReadyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotReadyReason::Missing => f.write_str("target not found"),
            NotReadyReason::Ambiguous(n) => write!(f, "target matched {n} elements"),
            NotReadyReason::Hidden => f.write_str("target not visible"),
            NotReadyReason::ZeroSize => f.write_str("target has a zero-size bounding box"),
            NotReadyReason::Disabled => f.write_str("target is disabled"),
        }
    }
}

/// Result of a single poll iteration, made explicit so the retry state
/// machine has no hidden control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The action landed.
    Success,
    /// The readiness predicate rejected the target.
    NotReady(NotReadyReason),
    /// The target looked ready but the action itself was rebuffed,
    /// e.g. another element intercepted the pointer or the node went
    /// stale mid-action.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttemptState {
    Pending,
    Retrying,
    Succeeded,
    TimedOut,
}

/// Per-call scratch record: created when the retry loop starts, discarded
/// when it returns. Nothing outlives the call.
#[derive(Debug)]
struct InteractionAttempt {
    started: Instant,
    deadline: Duration,
    state: AttemptState,
    last_reason: Option<NotReadyReason>,
    last_error: Option<String>,
}

impl InteractionAttempt {
    fn new(deadline: Duration) -> Self {
        Self {
            started: Instant::now(),
            deadline,
            state: AttemptState::Pending,
            last_reason: None,
            last_error: None,
        }
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn expired(&self) -> bool {
        self.elapsed() >= self.deadline
    }

    fn describe_blocker(&self) -> String {
        match (&self.last_error, &self.last_reason) {
            (Some(err), _) => format!("last attempt failed: {err}"),
            (None, Some(reason)) => reason.to_string(),
            (None, None) => "never polled".to_string(),
        }
    }
}

/// The only error this layer raises: no attempt succeeded before the
/// deadline. Every per-attempt failure stays internal.
#[derive(Debug, Error)]
pub enum DriveError {
    #[error("target `{target}` not interactable after {elapsed_ms}ms ({blocker})")]
    DeadlineExceeded {
        target: String,
        elapsed_ms: u64,
        blocker: String,
    },
}

pub struct Driver {
    suppressor: Suppressor,
    policy: RetryPolicy,
}

impl Default for Driver {
    fn default() -> Self {
        Self::new(Suppressor::default(), RetryPolicy::default())
    }
}

impl Driver {
    pub fn new(suppressor: Suppressor, policy: RetryPolicy) -> Self {
        Self { suppressor, policy }
    }

    pub fn from_config(config: &TenaxConfig) -> Self {
        Self::new(
            Suppressor::from_config(config),
            RetryPolicy::from_config(&config.driver),
        )
    }

    pub fn suppressor(&self) -> &Suppressor {
        &self.suppressor
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub async fn click<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        target: &Locator,
    ) -> Result<(), DriveError> {
        self.perform(backend, Interaction::Click, target).await
    }

    pub async fn scroll_into_view<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        target: &Locator,
    ) -> Result<(), DriveError> {
        self.perform(backend, Interaction::ScrollIntoView, target)
            .await
    }

    /// Perform `interaction` on `target` under the driver's default policy.
    pub async fn perform<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        interaction: Interaction,
        target: &Locator,
    ) -> Result<(), DriveError> {
        self.perform_with(backend, interaction, target, self.policy)
            .await
    }

    /// Perform `interaction` on `target`, retrying until success or until
    /// `policy.deadline` expires.
    ///
    /// The first successful action returns immediately; at most one action
    /// invocation succeeds per call. The action itself is not guaranteed
    /// idempotent by this layer: earlier attempts may have failed without
    /// side effects, but making the action safe to land once is the
    /// caller's business.
    pub async fn perform_with<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        interaction: Interaction,
        target: &Locator,
        policy: RetryPolicy,
    ) -> Result<(), DriveError> {
        let mut attempt = InteractionAttempt::new(policy.deadline);

        loop {
            attempt.state = AttemptState::Retrying;
            self.suppressor.suppress(backend, policy.severity).await;

            match self.poll_once(backend, interaction, target).await {
                AttemptOutcome::Success => {
                    attempt.state = AttemptState::Succeeded;
                    debug!(
                        target = %target,
                        state = ?attempt.state,
                        elapsed_ms = attempt.elapsed().as_millis() as u64,
                        "{interaction} landed"
                    );
                    return Ok(());
                }
                AttemptOutcome::NotReady(reason) => {
                    trace!(target = %target, %reason, "target not ready");
                    attempt.last_reason = Some(reason);
                }
                AttemptOutcome::Failed(err) => {
                    trace!(target = %target, error = %err, "attempt rebuffed, will retry");
                    attempt.last_error = Some(err);
                }
            }

            if attempt.expired() {
                attempt.state = AttemptState::TimedOut;
                debug!(target = %target, state = ?attempt.state, "giving up");
                return Err(DriveError::DeadlineExceeded {
                    target: target.to_string(),
                    elapsed_ms: attempt.elapsed().as_millis() as u64,
                    blocker: attempt.describe_blocker(),
                });
            }

            sleep(policy.poll_interval).await;
        }
    }

    /// One-shot variant: no retry loop, no suppression sweep. Checks the
    /// readiness predicate once and, when it holds, scrolls and acts.
    /// Returns whether the action was attempted; action errors propagate.
    pub async fn perform_if_ready<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        interaction: Interaction,
        target: &Locator,
    ) -> Result<bool, BackendError> {
        if self.check_ready(backend, interaction, target).await.is_err() {
            return Ok(false);
        }
        backend.scroll_into_view(target).await?;
        if interaction == Interaction::Click {
            backend.click(target).await?;
        }
        Ok(true)
    }

    async fn poll_once<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        interaction: Interaction,
        target: &Locator,
    ) -> AttemptOutcome {
        if let Err(reason) = self.check_ready(backend, interaction, target).await {
            return AttemptOutcome::NotReady(reason);
        }

        // A ready target can still sit below the fold.
        if let Err(e) = backend.scroll_into_view(target).await {
            return AttemptOutcome::Failed(e.to_string());
        }

        let result = match interaction {
            Interaction::Click => backend.click(target).await,
            Interaction::ScrollIntoView => Ok(()),
        };

        match result {
            Ok(()) => AttemptOutcome::Success,
            Err(e) => AttemptOutcome::Failed(e.to_string()),
        }
    }

    /// Readiness predicate, re-evaluated from scratch on every poll:
    /// exactly one resolved element, visible, with a positive-area box for
    /// clicks, and not disabled. Backend hiccups during a query count as
    /// not-ready rather than aborting the loop.
    async fn check_ready<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        interaction: Interaction,
        target: &Locator,
    ) -> Result<(), NotReadyReason> {
        match backend.count(target).await {
            Ok(1) => {}
            Ok(0) | Err(_) => return Err(NotReadyReason::Missing),
            Ok(n) => return Err(NotReadyReason::Ambiguous(n)),
        }

        match backend.is_visible(target).await {
            Ok(true) => {}
            _ => return Err(NotReadyReason::Hidden),
        }

        if interaction == Interaction::Click {
            match backend.bounding_box(target).await {
                Ok(Some(rect)) if rect.has_area() => {}
                _ => return Err(NotReadyReason::ZeroSize),
            }
        }

        match backend.is_disabled(target).await {
            Ok(false) => Ok(()),
            _ => Err(NotReadyReason::Disabled),
        }
    }
}

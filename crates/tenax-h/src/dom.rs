//! DOM capability scripts for the CDP backend.
//!
//! Everything the engine needs from a live document is phrased as a small
//! JavaScript expression evaluated against the page. Evaluations are
//! bounded by a timeout (a pending dialog blocks the JS thread) and retried
//! when the execution context disappears mid-navigation.

use chromiumoxide::Page;
use std::error::Error;
use std::time::Duration;

/// Default timeout for JavaScript evaluation.
const EVAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum retries when the execution context vanishes mid-navigation.
const MAX_CONTEXT_RETRIES: u32 = 10;

/// Delay between retries when the context is not found (page navigating).
const CONTEXT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Check if an error indicates the page context is unavailable.
fn is_context_error(err: &str) -> bool {
    err.contains("Cannot find context")
        || err.contains("Execution context was destroyed")
        || err.contains("-32000")
}

enum EvalError {
    Timeout,
    Context(String),
    Other(String),
}

/// Evaluate `expression` with a bounded timeout, retrying context errors.
pub async fn eval(
    page: &Page,
    expression: &str,
) -> Result<serde_json::Value, Box<dyn Error + Send + Sync>> {
    let mut last_error = None;

    for attempt in 0..MAX_CONTEXT_RETRIES {
        match eval_once(page, expression).await {
            Ok(value) => return Ok(value),
            Err(EvalError::Timeout) => {
                return Err(
                    "Evaluation timed out - possibly blocked by a dialog (alert/confirm/prompt)"
                        .into(),
                );
            }
            Err(EvalError::Context(err_str)) => {
                tracing::debug!(
                    "Context error during evaluation (attempt {}/{}), retrying...",
                    attempt + 1,
                    MAX_CONTEXT_RETRIES
                );
                last_error = Some(err_str);
                tokio::time::sleep(CONTEXT_RETRY_DELAY).await;
            }
            Err(EvalError::Other(err_str)) => {
                return Err(format!("Evaluation failed: {}", err_str).into());
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| "Evaluation failed after retries".to_string())
        .into())
}

async fn eval_once(page: &Page, expression: &str) -> Result<serde_json::Value, EvalError> {
    let eval_result = tokio::time::timeout(EVAL_TIMEOUT, page.evaluate(expression)).await;

    match eval_result {
        Err(_) => Err(EvalError::Timeout),
        Ok(Err(e)) => {
            let err_str = e.to_string();
            if is_context_error(&err_str) {
                Err(EvalError::Context(err_str))
            } else {
                Err(EvalError::Other(err_str))
            }
        }
        // Scripts without a value (undefined) evaluate to null.
        Ok(Ok(remote_object)) => Ok(remote_object
            .into_value::<serde_json::Value>()
            .unwrap_or(serde_json::Value::Null)),
    }
}

/// Quote a selector for embedding in a script.
fn quote(selector: &str) -> String {
    serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".to_string())
}

pub fn count_script(selector: &str) -> String {
    format!("document.querySelectorAll({}).length", quote(selector))
}

pub fn visible_script(selector: &str) -> String {
    format!(
        "(function() {{ \
            var el = document.querySelector({}); \
            if (!el) return false; \
            var cs = window.getComputedStyle(el); \
            return cs.display !== 'none' && cs.visibility !== 'hidden'; \
        }})()",
        quote(selector)
    )
}

pub fn bounding_box_script(selector: &str) -> String {
    format!(
        "(function() {{ \
            var el = document.querySelector({}); \
            if (!el) return null; \
            var r = el.getBoundingClientRect(); \
            return {{ x: r.x, y: r.y, width: r.width, height: r.height }}; \
        }})()",
        quote(selector)
    )
}

pub fn disabled_script(selector: &str) -> String {
    format!(
        "(function() {{ \
            var el = document.querySelector({}); \
            if (!el) return false; \
            return el.disabled === true \
                || el.hasAttribute('disabled') \
                || el.getAttribute('aria-disabled') === 'true'; \
        }})()",
        quote(selector)
    )
}

pub fn scroll_into_view_script(selector: &str) -> String {
    format!(
        "(function() {{ \
            var el = document.querySelector({}); \
            if (!el) return false; \
            el.scrollIntoView({{ block: 'center', inline: 'nearest' }}); \
            return true; \
        }})()",
        quote(selector)
    )
}

pub fn detach_all_script(selector: &str) -> String {
    format!(
        "(function() {{ \
            var n = 0; \
            document.querySelectorAll({}).forEach(function(el) {{ el.remove(); n++; }}); \
            return n; \
        }})()",
        quote(selector)
    )
}

/// Hides with `!important` so later, unrelated style rules cannot re-show
/// the element. Counts only elements not already hidden this way, which is
/// what makes repeated sweeps report as no-ops.
pub fn force_hide_all_script(selector: &str) -> String {
    format!(
        "(function() {{ \
            var n = 0; \
            document.querySelectorAll({}).forEach(function(el) {{ \
                if (el.style.getPropertyValue('display') === 'none' \
                    && el.style.getPropertyPriority('display') === 'important') return; \
                el.style.setProperty('display', 'none', 'important'); \
                el.style.setProperty('visibility', 'hidden', 'important'); \
                n++; \
            }}); \
            return n; \
        }})()",
        quote(selector)
    )
}

/// Registers each matched element under a numeric handle in a window-side
/// map, so a follow-up detach/hide can address it without re-matching.
pub fn overlay_census_script(selector: &str) -> String {
    format!(
        "(function() {{ \
            var reg = window.__tenaxHandles = window.__tenaxHandles || {{ seq: 1, map: new Map() }}; \
            var out = []; \
            document.querySelectorAll({}).forEach(function(el) {{ \
                var cs = window.getComputedStyle(el); \
                var inline = parseInt(el.style.zIndex, 10); \
                var computed = parseInt(cs.zIndex, 10); \
                var handle = reg.seq++; \
                reg.map.set(handle, el); \
                out.push({{ \
                    handle: handle, \
                    inline_z: isNaN(inline) ? null : inline, \
                    computed_z: isNaN(computed) ? null : computed, \
                    visible: cs.display !== 'none' && cs.visibility !== 'hidden' \
                }}); \
            }}); \
            return out; \
        }})()",
        quote(selector)
    )
}

pub fn detach_handle_script(handle: u64) -> String {
    format!(
        "(function() {{ \
            var reg = window.__tenaxHandles; \
            if (!reg) return false; \
            var el = reg.map.get({handle}); \
            if (!el) return false; \
            el.remove(); \
            reg.map.delete({handle}); \
            return true; \
        }})()"
    )
}

pub fn force_hide_handle_script(handle: u64) -> String {
    format!(
        "(function() {{ \
            var reg = window.__tenaxHandles; \
            if (!reg) return false; \
            var el = reg.map.get({handle}); \
            if (!el) return false; \
            el.style.setProperty('display', 'none', 'important'); \
            el.style.setProperty('visibility', 'hidden', 'important'); \
            return true; \
        }})()"
    )
}

pub const SCROLL_TO_BOTTOM: &str =
    "(function() { window.scrollTo(0, document.body.scrollHeight); return true; })()";

use async_trait::async_trait;
pub use tenax_common::error::BackendError;
use tenax_common::protocol::{OverlayInfo, Rect};

use crate::locator::Locator;

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub url: String,
    pub title: String,
    pub status: u16, // generic status code (e.g. 200)
}

/// The Backend trait is the host capability set every automation engine must
/// supply: locator resolution, style/geometry queries, pointer actions,
/// document surgery and navigation.
///
/// The engine never touches a document except through one of these methods,
/// and every locator-keyed method re-resolves the selector against current
/// document state; nothing here caches element handles across calls.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Launch the backend (start browser, connect to remote, etc.)
    async fn launch(&mut self) -> Result<(), BackendError>;

    /// Close the backend and cleanup resources.
    async fn close(&mut self) -> Result<(), BackendError>;

    /// Check if the backend is ready to accept commands.
    async fn is_ready(&self) -> bool;

    /// Navigate to a specific URL.
    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError>;

    /// Current address of the document, as the browser reports it.
    async fn current_url(&mut self) -> Result<String, BackendError>;

    /// Number of elements the locator currently resolves to.
    async fn count(&mut self, target: &Locator) -> Result<usize, BackendError>;

    /// Whether the first resolved element is shown per computed style.
    async fn is_visible(&mut self, target: &Locator) -> Result<bool, BackendError>;

    /// Rendered bounding box of the first resolved element, if any.
    async fn bounding_box(&mut self, target: &Locator) -> Result<Option<Rect>, BackendError>;

    /// Whether the first resolved element is marked disabled.
    async fn is_disabled(&mut self, target: &Locator) -> Result<bool, BackendError>;

    /// Click the first resolved element.
    async fn click(&mut self, target: &Locator) -> Result<(), BackendError>;

    /// Scroll the first resolved element into the viewport.
    async fn scroll_into_view(&mut self, target: &Locator) -> Result<(), BackendError>;

    /// Detach every element matching `selector` from the document.
    /// Returns how many were removed.
    async fn detach_all(&mut self, selector: &str) -> Result<usize, BackendError>;

    /// Hide every element matching `selector` with the highest-priority
    /// style override available, so later style rules cannot re-show it.
    /// Returns how many were not already hidden this way.
    async fn force_hide_all(&mut self, selector: &str) -> Result<usize, BackendError>;

    /// Census of the elements matching `selector`, with stacking-order and
    /// visibility data. Returned handles stay valid until the element is
    /// detached or the document navigates.
    async fn query_overlays(&mut self, selector: &str) -> Result<Vec<OverlayInfo>, BackendError>;

    /// Detach a single element by census handle. Returns whether the handle
    /// still referred to an attached element.
    async fn detach(&mut self, handle: u64) -> Result<bool, BackendError>;

    /// Force-hide a single element by census handle.
    async fn force_hide(&mut self, handle: u64) -> Result<bool, BackendError>;

    /// Execute a script in the browser context.
    async fn execute_script(&mut self, _script: &str) -> Result<serde_json::Value, BackendError> {
        Err(BackendError::NotSupported("execute_script".into()))
    }

    /// Scroll the window to the bottom of the document.
    async fn scroll_to_bottom(&mut self) -> Result<(), BackendError> {
        Err(BackendError::NotSupported("scroll_to_bottom".into()))
    }
}

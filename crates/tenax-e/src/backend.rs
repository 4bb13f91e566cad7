use crate::webdriver::WebDriverClient;
use async_trait::async_trait;
use serde_json::json;
use tenax_engine::backend::{Backend, BackendError, NavigationResult};
use tenax_engine::locator::Locator;
use tenax_engine::protocol::{OverlayInfo, Rect};
use tracing::info;

// WebDriver's ExecuteScript wraps scripts as a function body; matched
// elements reach them through `arguments`.
const DETACH_ALL: &str = "\
    var n = 0; \
    document.querySelectorAll(arguments[0]).forEach(function(el) { el.remove(); n++; }); \
    return n;";

const FORCE_HIDE_ALL: &str = "\
    var n = 0; \
    document.querySelectorAll(arguments[0]).forEach(function(el) { \
        if (el.style.getPropertyValue('display') === 'none' \
            && el.style.getPropertyPriority('display') === 'important') return; \
        el.style.setProperty('display', 'none', 'important'); \
        el.style.setProperty('visibility', 'hidden', 'important'); \
        n++; \
    }); \
    return n;";

const OVERLAY_CENSUS: &str = "\
    var reg = window.__tenaxHandles = window.__tenaxHandles || { seq: 1, map: new Map() }; \
    var out = []; \
    document.querySelectorAll(arguments[0]).forEach(function(el) { \
        var cs = window.getComputedStyle(el); \
        var inline = parseInt(el.style.zIndex, 10); \
        var computed = parseInt(cs.zIndex, 10); \
        var handle = reg.seq++; \
        reg.map.set(handle, el); \
        out.push({ \
            handle: handle, \
            inline_z: isNaN(inline) ? null : inline, \
            computed_z: isNaN(computed) ? null : computed, \
            visible: cs.display !== 'none' && cs.visibility !== 'hidden' \
        }); \
    }); \
    return out;";

const DETACH_HANDLE: &str = "\
    var reg = window.__tenaxHandles; \
    if (!reg) return false; \
    var el = reg.map.get(arguments[0]); \
    if (!el) return false; \
    el.remove(); \
    reg.map.delete(arguments[0]); \
    return true;";

const FORCE_HIDE_HANDLE: &str = "\
    var reg = window.__tenaxHandles; \
    if (!reg) return false; \
    var el = reg.map.get(arguments[0]); \
    if (!el) return false; \
    el.style.setProperty('display', 'none', 'important'); \
    el.style.setProperty('visibility', 'hidden', 'important'); \
    return true;";

const SCROLL_INTO_VIEW: &str = "\
    var el = document.querySelector(arguments[0]); \
    if (!el) return false; \
    el.scrollIntoView({ block: 'center', inline: 'nearest' }); \
    return true;";

const SCROLL_TO_BOTTOM: &str =
    "window.scrollTo(0, document.body.scrollHeight); return true;";

/// Backend speaking the W3C WebDriver protocol through fantoccini.
pub struct WebDriverBackend {
    client: Option<WebDriverClient>,
    webdriver_url: String,
}

impl WebDriverBackend {
    pub fn new(webdriver_url: impl Into<String>) -> Self {
        Self {
            client: None,
            webdriver_url: webdriver_url.into(),
        }
    }

    fn client_mut(&mut self) -> Result<&mut WebDriverClient, BackendError> {
        self.client.as_mut().ok_or(BackendError::NotReady)
    }

    async fn execute(
        &mut self,
        script: &str,
        args: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, BackendError> {
        let client = self.client_mut()?;
        client
            .client
            .execute(script, args)
            .await
            .map_err(|e| BackendError::Script(e.to_string()))
    }

    async fn execute_count(
        &mut self,
        script: &str,
        args: Vec<serde_json::Value>,
    ) -> Result<usize, BackendError> {
        let value = self.execute(script, args).await?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| BackendError::Script(format!("expected a count, got {value}")))
    }

    async fn get_navigation_result(
        client: &mut WebDriverClient,
    ) -> Result<NavigationResult, BackendError> {
        let title = client.client.title().await.unwrap_or_default();
        let url = client
            .client
            .current_url()
            .await
            .map(|u| u.to_string())
            .unwrap_or_default();

        Ok(NavigationResult {
            url,
            title,
            status: 200,
        })
    }
}

#[async_trait]
impl Backend for WebDriverBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        let client = WebDriverClient::connect(&self.webdriver_url)
            .await
            .map_err(|e| BackendError::Other(e.to_string()))?;
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| BackendError::Other(e.to_string()))?;
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError> {
        let client = self.client_mut()?;

        info!("Navigating to: {}", url);
        client
            .client
            .goto(url)
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?;

        Self::get_navigation_result(client).await
    }

    async fn current_url(&mut self) -> Result<String, BackendError> {
        let client = self.client_mut()?;
        client
            .client
            .current_url()
            .await
            .map(|u| u.to_string())
            .map_err(|e| BackendError::Navigation(e.to_string()))
    }

    async fn count(&mut self, target: &Locator) -> Result<usize, BackendError> {
        let client = self.client_mut()?;
        let elements = client
            .client
            .find_all(fantoccini::Locator::Css(target.as_str()))
            .await
            .map_err(|e| BackendError::Script(e.to_string()))?;
        Ok(elements.len())
    }

    async fn is_visible(&mut self, target: &Locator) -> Result<bool, BackendError> {
        let client = self.client_mut()?;
        match client
            .client
            .find(fantoccini::Locator::Css(target.as_str()))
            .await
        {
            Ok(element) => element
                .is_displayed()
                .await
                .map_err(|e| BackendError::Script(e.to_string())),
            // A vanished element is simply not visible; the caller polls.
            Err(_) => Ok(false),
        }
    }

    async fn bounding_box(&mut self, target: &Locator) -> Result<Option<Rect>, BackendError> {
        let client = self.client_mut()?;
        let element = match client
            .client
            .find(fantoccini::Locator::Css(target.as_str()))
            .await
        {
            Ok(element) => element,
            Err(_) => return Ok(None),
        };
        let (x, y, width, height) = element
            .rectangle()
            .await
            .map_err(|e| BackendError::Script(e.to_string()))?;
        Ok(Some(Rect {
            x: x as f32,
            y: y as f32,
            width: width as f32,
            height: height as f32,
        }))
    }

    async fn is_disabled(&mut self, target: &Locator) -> Result<bool, BackendError> {
        let client = self.client_mut()?;
        match client
            .client
            .find(fantoccini::Locator::Css(target.as_str()))
            .await
        {
            Ok(element) => element
                .is_enabled()
                .await
                .map(|enabled| !enabled)
                .map_err(|e| BackendError::Script(e.to_string())),
            Err(_) => Ok(false),
        }
    }

    async fn click(&mut self, target: &Locator) -> Result<(), BackendError> {
        let client = self.client_mut()?;
        let element = client
            .client
            .find(fantoccini::Locator::Css(target.as_str()))
            .await
            .map_err(|e| BackendError::Script(format!("click failed: {}", e)))?;
        element
            .click()
            .await
            .map_err(|e| BackendError::Script(format!("click failed: {}", e)))
    }

    async fn scroll_into_view(&mut self, target: &Locator) -> Result<(), BackendError> {
        let value = self
            .execute(SCROLL_INTO_VIEW, vec![json!(target.as_str())])
            .await?;
        if value.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(BackendError::Script(format!(
                "scroll target `{}` resolved to nothing",
                target
            )))
        }
    }

    async fn detach_all(&mut self, selector: &str) -> Result<usize, BackendError> {
        self.execute_count(DETACH_ALL, vec![json!(selector)]).await
    }

    async fn force_hide_all(&mut self, selector: &str) -> Result<usize, BackendError> {
        self.execute_count(FORCE_HIDE_ALL, vec![json!(selector)])
            .await
    }

    async fn query_overlays(&mut self, selector: &str) -> Result<Vec<OverlayInfo>, BackendError> {
        let value = self.execute(OVERLAY_CENSUS, vec![json!(selector)]).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn detach(&mut self, handle: u64) -> Result<bool, BackendError> {
        let value = self.execute(DETACH_HANDLE, vec![json!(handle)]).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn force_hide(&mut self, handle: u64) -> Result<bool, BackendError> {
        let value = self.execute(FORCE_HIDE_HANDLE, vec![json!(handle)]).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn execute_script(&mut self, script: &str) -> Result<serde_json::Value, BackendError> {
        self.execute(script, vec![]).await
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), BackendError> {
        self.execute(SCROLL_TO_BOTTOM, vec![]).await.map(|_| ())
    }
}

use crate::cdp::CdpClient;
use crate::dom;
use async_trait::async_trait;
use tenax_engine::backend::{Backend, BackendError, NavigationResult};
use tenax_engine::locator::Locator;
use tenax_engine::protocol::{OverlayInfo, Rect};
use tracing::info;

pub struct HeadlessBackend {
    client: Option<CdpClient>,
    visible: bool,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            client: None,
            visible: false,
        }
    }

    pub fn new_with_visibility(visible: bool) -> Self {
        Self {
            client: None,
            visible,
        }
    }

    pub fn get_client(&self) -> Option<&CdpClient> {
        self.client.as_ref()
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    fn client(&self) -> Result<&CdpClient, BackendError> {
        self.client.as_ref().ok_or(BackendError::NotReady)
    }

    async fn eval(&self, expression: &str) -> Result<serde_json::Value, BackendError> {
        let client = self.client()?;
        dom::eval(&client.page, expression)
            .await
            .map_err(|e| BackendError::Script(e.to_string()))
    }

    async fn eval_count(&self, expression: &str) -> Result<usize, BackendError> {
        let value = self.eval(expression).await?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| BackendError::Script(format!("expected a count, got {value}")))
    }

    async fn get_navigation_result(
        page: &chromiumoxide::Page,
    ) -> Result<NavigationResult, BackendError> {
        let title = page
            .get_title()
            .await
            .unwrap_or_default()
            .unwrap_or_default();
        let url = page
            .url()
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?
            .unwrap_or_default();
        Ok(NavigationResult {
            url,
            title,
            status: 200,
        })
    }
}

#[async_trait]
impl Backend for HeadlessBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        info!("Launching Headless Backend (Chromium)...");
        let client = CdpClient::launch(self.visible)
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
        let client = self.client.as_mut().ok_or(BackendError::NotReady)?;

        info!("Navigating to: {}", url);
        client
            .page
            .goto(url)
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?;

        Self::get_navigation_result(&client.page).await
    }

    async fn current_url(&mut self) -> Result<String, BackendError> {
        let client = self.client()?;
        Ok(client
            .page
            .url()
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?
            .unwrap_or_default())
    }

    async fn count(&mut self, target: &Locator) -> Result<usize, BackendError> {
        self.eval_count(&dom::count_script(target.as_str())).await
    }

    async fn is_visible(&mut self, target: &Locator) -> Result<bool, BackendError> {
        let value = self.eval(&dom::visible_script(target.as_str())).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn bounding_box(&mut self, target: &Locator) -> Result<Option<Rect>, BackendError> {
        let value = self.eval(&dom::bounding_box_script(target.as_str())).await?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    async fn is_disabled(&mut self, target: &Locator) -> Result<bool, BackendError> {
        let value = self.eval(&dom::disabled_script(target.as_str())).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn click(&mut self, target: &Locator) -> Result<(), BackendError> {
        let client = self.client()?;
        // Native CDP click: dispatches trusted pointer events, which pages
        // cannot distinguish from a user.
        let element = client
            .page
            .find_element(target.as_str())
            .await
            .map_err(|e| BackendError::Script(format!("click failed: {}", e)))?;
        element
            .click()
            .await
            .map_err(|e| BackendError::Script(format!("click failed: {}", e)))?;
        Ok(())
    }

    async fn scroll_into_view(&mut self, target: &Locator) -> Result<(), BackendError> {
        let value = self
            .eval(&dom::scroll_into_view_script(target.as_str()))
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
        self.eval_count(&dom::detach_all_script(selector)).await
    }

    async fn force_hide_all(&mut self, selector: &str) -> Result<usize, BackendError> {
        self.eval_count(&dom::force_hide_all_script(selector)).await
    }

    async fn query_overlays(&mut self, selector: &str) -> Result<Vec<OverlayInfo>, BackendError> {
        let value = self.eval(&dom::overlay_census_script(selector)).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn detach(&mut self, handle: u64) -> Result<bool, BackendError> {
        let value = self.eval(&dom::detach_handle_script(handle)).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn force_hide(&mut self, handle: u64) -> Result<bool, BackendError> {
        let value = self.eval(&dom::force_hide_handle_script(handle)).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn execute_script(&mut self, script: &str) -> Result<serde_json::Value, BackendError> {
        self.eval(script).await
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), BackendError> {
        self.eval(dom::SCROLL_TO_BOTTOM).await.map(|_| ())
    }
}

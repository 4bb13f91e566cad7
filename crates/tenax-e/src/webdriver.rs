use fantoccini::{Client, ClientBuilder};
use tracing::info;

/// Thin wrapper around a fantoccini session.
pub struct WebDriverClient {
    pub client: Client,
}

impl WebDriverClient {
    /// Connect to a running WebDriver endpoint (chromedriver, geckodriver,
    /// selenium).
    pub async fn connect(
        webdriver_url: &str,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        info!("Connecting to WebDriver at {}...", webdriver_url);
        let client = ClientBuilder::native()
            .connect(webdriver_url)
            .await
            .map_err(|e| format!("Failed to connect to WebDriver: {}", e))?;
        Ok(Self { client })
    }

    pub async fn close(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.client
            .close()
            .await
            .map_err(|e| format!("Error closing WebDriver session: {}", e))?;
        Ok(())
    }
}

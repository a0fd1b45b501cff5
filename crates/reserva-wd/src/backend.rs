use crate::chromedriver::{self, ChromeDriverProcess};
use crate::webdriver::{WebDriverClient, chrome_capabilities};
use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::wd::TimeoutConfiguration;
use reserva_engine::config::schema::BrowserConfig;
use reserva_engine::driver::{DriverError, NavigationResult, PageDriver};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// `PageDriver` over a Chrome WebDriver session.
pub struct WebDriverPage {
    client: Option<WebDriverClient>,
    config: BrowserConfig,
    chromedriver: Option<ChromeDriverProcess>,
}

impl WebDriverPage {
    /// Launches chromedriver on `config.port` unless `config.webdriver_url` is set.
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            client: None,
            config,
            chromedriver: None,
        }
    }

    /// A detached browser outlives this handle: dropping it must not end the session.
    fn keeps_session(&self) -> bool {
        self.config.detach
    }

    async fn get_navigation_result(
        client: &WebDriverClient,
    ) -> Result<NavigationResult, DriverError> {
        let title = client.client.title().await.unwrap_or_default();
        let url = client
            .client
            .current_url()
            .await
            .map(|u| u.to_string())
            .unwrap_or_default();

        Ok(NavigationResult { url, title })
    }

    /// Best-effort window and timeout setup; a failure here never aborts launch.
    async fn configure_session(&self, client: &WebDriverClient) {
        if let Err(e) = client
            .client
            .set_window_size(self.config.window_width, self.config.window_height)
            .await
        {
            warn!("Failed to set window size: {}", e);
        }

        let page_load = Duration::from_millis(self.config.page_load_timeout_ms);
        let timeouts = TimeoutConfiguration::new(None, Some(page_load), None);
        if let Err(e) = client.client.update_timeouts(timeouts).await {
            warn!("Failed to set page load timeout: {}", e);
        }
    }
}

fn is_unexpected_alert(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("unexpected alert") || lower.contains("unexpectedalertopen")
}

fn is_no_such_alert(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("no such alert") || lower.contains("nosuchalert")
}

fn is_timeout(message: &str) -> bool {
    message.to_lowercase().contains("timeout")
}

/// chromedriver embeds the dialog text as `{Alert text : ...}`.
fn alert_text_from_message(message: &str) -> Option<String> {
    let start = message.find("Alert text :")? + "Alert text :".len();
    let rest = &message[start..];
    let end = rest.find('}').unwrap_or(rest.len());
    Some(rest[..end].trim().to_string())
}

/// Map a command failure, reading the blocking dialog's text when there is one.
async fn command_error(client: &WebDriverClient, err: CmdError) -> DriverError {
    let message = err.to_string();
    if !is_unexpected_alert(&message) {
        return DriverError::Script(message);
    }
    let text = match client.client.get_alert_text().await {
        Ok(text) => text,
        Err(_) => alert_text_from_message(&message).unwrap_or_default(),
    };
    DriverError::UnexpectedAlert(text)
}

impl Default for WebDriverPage {
    fn default() -> Self {
        Self::new(BrowserConfig::default())
    }
}

#[async_trait]
impl PageDriver for WebDriverPage {
    async fn launch(&mut self) -> Result<(), DriverError> {
        let webdriver_url = if let Some(url) = &self.config.webdriver_url {
            info!("Connecting to external WebDriver at {}...", url);
            url.clone()
        } else {
            let process = chromedriver::launch_chromedriver(
                self.config.chromedriver_path.as_deref(),
                self.config.port,
                self.config.detach,
            )
            .await
            .map_err(DriverError::Other)?;
            let url = process.webdriver_url();
            self.chromedriver = Some(process);
            info!("chromedriver launched at {}", url);
            url
        };

        let capabilities = chrome_capabilities(&self.config);
        let client = WebDriverClient::connect(&webdriver_url, Some(capabilities))
            .await
            .map_err(|e| DriverError::ConnectionLost(e.to_string()))?;
        self.configure_session(&client).await;
        if self.keeps_session() {
            match client.client.persist().await {
                Ok(()) => debug!("Browser session kept open after exit"),
                Err(e) => warn!("Failed to keep browser session alive: {}", e),
            }
        }
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| DriverError::Other(e.to_string()))?;
        }
        self.chromedriver = None;
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, DriverError> {
        let client = self.client.as_mut().ok_or(DriverError::NotReady)?;

        info!("Navigating to: {}", url);
        if let Err(e) = client.client.goto(url).await {
            let message = e.to_string();
            if is_unexpected_alert(&message) {
                return Err(command_error(client, e).await);
            }
            if is_timeout(&message) {
                return Err(DriverError::Timeout(format!("page load of {}", url)));
            }
            return Err(DriverError::Navigation(message));
        }

        Self::get_navigation_result(client).await
    }

    async fn execute_script(
        &mut self,
        script: &str,
        args: Vec<Value>,
    ) -> Result<Value, DriverError> {
        let client = self.client.as_mut().ok_or(DriverError::NotReady)?;
        match client.client.execute(script, args).await {
            Ok(value) => Ok(value),
            Err(e) => Err(command_error(client, e).await),
        }
    }

    async fn dialog_text(&mut self) -> Result<Option<String>, DriverError> {
        let client = self.client.as_mut().ok_or(DriverError::NotReady)?;
        match client.client.get_alert_text().await {
            Ok(text) => Ok(Some(text)),
            Err(e) => {
                let message = e.to_string();
                if is_no_such_alert(&message) {
                    Ok(None)
                } else {
                    debug!("Alert text lookup failed: {}", message);
                    Err(DriverError::Other(message))
                }
            }
        }
    }

    async fn accept_dialog(&mut self) -> Result<(), DriverError> {
        let client = self.client.as_mut().ok_or(DriverError::NotReady)?;
        client
            .client
            .accept_alert()
            .await
            .map_err(|e| DriverError::Other(format!("Accept alert failed: {}", e)))
    }
}

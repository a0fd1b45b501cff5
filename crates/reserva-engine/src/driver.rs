use crate::dom;
use async_trait::async_trait;
pub use reserva_common::error::DriverError;
use reserva_common::locator::{DomOp, DomReply, Locator};
use serde_json::{Value, json};

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub url: String,
    pub title: String,
}

/// The page-driver capability the engine runs against.
///
/// Implementations own exactly one browser session. Besides navigation and dialog
/// handling they must expose `execute_script`, the escape hatch every DOM-level
/// primitive is built on.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Launch the driver (start or connect to a browser session).
    async fn launch(&mut self) -> Result<(), DriverError>;

    /// Close the session and release resources.
    async fn close(&mut self) -> Result<(), DriverError>;

    /// Check if the driver is ready to accept commands.
    async fn is_ready(&self) -> bool;

    /// Navigate to a URL and wait for the transport's own load signal.
    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, DriverError>;

    /// Run arbitrary script in the page. `arguments[i]` maps to `args[i]`.
    ///
    /// Must fail with `DriverError::UnexpectedAlert` while a native dialog is open.
    async fn execute_script(&mut self, script: &str, args: Vec<Value>)
    -> Result<Value, DriverError>;

    /// Text of the currently open native dialog, or `None` when there is none.
    async fn dialog_text(&mut self) -> Result<Option<String>, DriverError>;

    /// Accept (press OK on) the currently open native dialog.
    async fn accept_dialog(&mut self) -> Result<(), DriverError>;

    /// Apply `op` to the first element matched by `locator`.
    async fn dom(&mut self, locator: &Locator, op: &DomOp) -> Result<DomReply, DriverError> {
        let value = self
            .execute_script(dom::DOM_SCRIPT, vec![json!(locator), json!(op)])
            .await?;
        if value.is_null() {
            return Ok(DomReply::MISSING);
        }
        Ok(serde_json::from_value(value)?)
    }

    /// `document.readyState` of the current page.
    async fn ready_state(&mut self) -> Result<String, DriverError> {
        let value = self.execute_script(dom::READY_STATE_SCRIPT, vec![]).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }
}

use fantoccini::{Client, ClientBuilder};
use reserva_engine::config::schema::BrowserConfig;
use serde_json::{Map, Value, json};

pub struct WebDriverClient {
    pub client: Client,
}

impl WebDriverClient {
    pub async fn connect(
        url: &str,
        capabilities: Option<Map<String, Value>>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let mut caps = Map::new();

        if let Some(user_caps) = capabilities {
            for (k, v) in user_caps {
                caps.insert(k, v);
            }
        }

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(url)
            .await
            .map_err(|e| format!("Failed to connect to WebDriver at {}: {}", url, e))?;

        Ok(Self { client })
    }

    pub async fn close(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.client
            .close()
            .await
            .map_err(|e| format!("Failed to close session: {}", e))?;
        Ok(())
    }
}

/// Chrome session capabilities for the reservation flow.
///
/// Dialogs are left open (`unhandledPromptBehavior: ignore`) so the engine can read
/// and accept them itself; the driver's default would dismiss them silently.
pub fn chrome_capabilities(config: &BrowserConfig) -> Map<String, Value> {
    let mut args = vec![
        "--disable-gpu".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-blink-features=AutomationControlled".to_string(),
        format!(
            "--window-size={},{}",
            config.window_width, config.window_height
        ),
    ];
    if config.headless {
        args.push("--headless=new".to_string());
    }
    if let Some(dir) = &config.user_data_dir {
        args.push(format!("--user-data-dir={}", dir));
    }

    let mut chrome = Map::new();
    chrome.insert("args".into(), json!(args));
    chrome.insert("excludeSwitches".into(), json!(["enable-automation"]));
    chrome.insert("useAutomationExtension".into(), json!(false));
    chrome.insert("detach".into(), json!(config.detach));
    if config.block_images {
        chrome.insert(
            "prefs".into(),
            json!({ "profile.managed_default_content_settings.images": 2 }),
        );
    }

    let mut caps = Map::new();
    caps.insert("browserName".into(), json!("chrome"));
    caps.insert("pageLoadStrategy".into(), json!("eager"));
    caps.insert("unhandledPromptBehavior".into(), json!("ignore"));
    caps.insert("goog:chromeOptions".into(), Value::Object(chrome));
    caps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capabilities() {
        let caps = chrome_capabilities(&BrowserConfig::default());
        assert_eq!(caps["pageLoadStrategy"], "eager");
        assert_eq!(caps["unhandledPromptBehavior"], "ignore");

        let chrome = &caps["goog:chromeOptions"];
        let args: Vec<&str> = chrome["args"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(args.contains(&"--window-size=1400,950"));
        assert!(!args.iter().any(|a| a.starts_with("--headless")));
        assert_eq!(chrome["excludeSwitches"][0], "enable-automation");
        assert_eq!(
            chrome["prefs"]["profile.managed_default_content_settings.images"],
            2
        );
        assert_eq!(chrome["detach"], true);
    }

    #[test]
    fn test_headless_and_profile() {
        let config = BrowserConfig {
            headless: true,
            block_images: false,
            user_data_dir: Some("/tmp/reserva-profile".into()),
            ..Default::default()
        };
        let caps = chrome_capabilities(&config);
        let chrome = &caps["goog:chromeOptions"];
        let args = chrome["args"].as_array().unwrap();
        assert!(args.contains(&json!("--headless=new")));
        assert!(args.contains(&json!("--user-data-dir=/tmp/reserva-profile")));
        assert!(chrome.get("prefs").is_none());
    }
}

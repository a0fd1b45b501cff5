use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Common paths where chromedriver might be installed
const CHROMEDRIVER_PATHS: &[&str] = &[
    "/usr/bin/chromedriver",
    "/usr/local/bin/chromedriver",
    "/usr/lib/chromium/chromedriver",
    "/usr/lib/chromium-browser/chromedriver",
    "/snap/bin/chromium.chromedriver",
    "/opt/homebrew/bin/chromedriver",
];

/// Find chromedriver on the system
pub fn find_chromedriver_binary() -> Option<String> {
    if let Ok(output) = Command::new("which").arg("chromedriver").output()
        && output.status.success()
        && let Ok(path) = String::from_utf8(output.stdout)
    {
        let path = path.trim();
        if !path.is_empty() {
            return Some(path.to_string());
        }
    }

    for path in CHROMEDRIVER_PATHS {
        if std::path::Path::new(path).exists() {
            return Some(path.to_string());
        }
    }

    None
}

/// Handle to a chromedriver process we started.
pub struct ChromeDriverProcess {
    child: Child,
    port: u16,
    detach: bool,
}

impl ChromeDriverProcess {
    pub fn webdriver_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}

impl Drop for ChromeDriverProcess {
    fn drop(&mut self) {
        if self.detach {
            info!(
                "Leaving chromedriver (PID {}) running for the detached browser",
                self.child.id()
            );
            return;
        }
        info!("Shutting down chromedriver process...");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Launch chromedriver on `port` and wait until `/status` answers.
pub async fn launch_chromedriver(
    binary: Option<&str>,
    port: u16,
    detach: bool,
) -> Result<ChromeDriverProcess, String> {
    let path = match binary {
        Some(path) => path.to_string(),
        None => find_chromedriver_binary().ok_or_else(|| {
            "chromedriver not found. Install it or set browser.webdriver_url".to_string()
        })?,
    };

    info!("Launching chromedriver from: {}", path);
    let child = Command::new(&path)
        .arg(format!("--port={}", port))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| format!("Failed to launch chromedriver: {}", e))?;
    info!("chromedriver launched with PID: {}", child.id());

    // Constructed before the readiness loop so a failed start is cleaned up on drop
    let mut process = ChromeDriverProcess {
        child,
        port,
        detach: false,
    };

    let url = format!("http://localhost:{}/status", port);
    let client = reqwest::Client::new();

    for attempt in 1..=30 {
        sleep(Duration::from_millis(200)).await;

        match client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("chromedriver ready after {} attempts", attempt);
                process.detach = detach;
                return Ok(process);
            }
            Ok(_) => {
                warn!(
                    "chromedriver responded but not ready yet (attempt {})",
                    attempt
                );
            }
            Err(_) => {
                if attempt % 5 == 0 {
                    info!("Waiting for chromedriver... (attempt {})", attempt);
                }
            }
        }
    }

    Err("chromedriver did not become ready within timeout".to_string())
}

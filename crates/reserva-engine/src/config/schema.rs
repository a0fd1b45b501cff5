use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservaConfig {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

/// Every wait and retry budget the engine uses, in milliseconds.
///
/// Defaults are deliberately short: the flow usually races other users the moment a
/// reservation window opens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub drain_rounds: usize,
    pub drain_probe_ms: u64,
    pub drain_pause_ms: u64,

    pub login_field_wait_ms: u64,
    pub login_alert_ms: u64,

    pub ready_wait_ms: u64,
    pub marker_wait_ms: u64,

    pub day_click_rounds: u32,
    pub day_click_interval_ms: u64,
    pub day_fallback_wait_ms: u64,

    pub slot_settle_ms: u64,
    pub timetable_poll_rounds: u32,
    pub timetable_poll_interval_ms: u64,
    pub slot_attempt_ms: u64,

    pub advance_click_rounds: u32,
    pub advance_click_interval_ms: u64,
    pub advance_fallback_wait_ms: u64,

    pub form_poll_rounds: u32,
    pub form_poll_interval_ms: u64,
    pub field_attempt_ms: u64,
    pub submit_alert_ms: u64,

    pub open_poll_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            drain_rounds: 6,
            drain_probe_ms: 800,
            drain_pause_ms: 100,
            login_field_wait_ms: 10_000,
            login_alert_ms: 800,
            ready_wait_ms: 2_000,
            marker_wait_ms: 2_000,
            day_click_rounds: 4,
            day_click_interval_ms: 150,
            day_fallback_wait_ms: 1_500,
            slot_settle_ms: 1_000,
            timetable_poll_rounds: 20,
            timetable_poll_interval_ms: 80,
            slot_attempt_ms: 0,
            advance_click_rounds: 3,
            advance_click_interval_ms: 100,
            advance_fallback_wait_ms: 1_200,
            form_poll_rounds: 30,
            form_poll_interval_ms: 80,
            field_attempt_ms: 0,
            submit_alert_ms: 1_200,
            open_poll_ms: 500,
        }
    }
}

pub(crate) fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// External WebDriver endpoint. When absent, chromedriver is launched locally.
    pub webdriver_url: Option<String>,
    pub chromedriver_path: Option<String>,
    pub port: u16,
    pub headless: bool,
    /// Leave the browser running when the process exits.
    pub detach: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub page_load_timeout_ms: u64,
    pub block_images: bool,
    pub user_data_dir: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: None,
            chromedriver_path: None,
            port: 9515,
            headless: false,
            detach: true,
            window_width: 1400,
            window_height: 950,
            page_load_timeout_ms: 15_000,
            block_images: true,
            user_data_dir: None,
        }
    }
}

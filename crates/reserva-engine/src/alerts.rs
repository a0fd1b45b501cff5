//! Native dialog (alert/confirm) draining.
//!
//! The target site fires save/validation dialogs asynchronously, sometimes several in
//! a row. Any script call made while one is open fails the whole command, so the
//! pipeline drains proactively around every stage transition.

use crate::config::schema::{TimingConfig, ms};
use crate::driver::PageDriver;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

const DIALOG_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainPolicy {
    /// Upper bound on dialogs handled per call.
    pub max_rounds: usize,
    /// How long each round waits for a dialog to show up.
    pub probe: Duration,
    /// Pause after accepting, so a chained dialog can materialize.
    pub pause: Duration,
}

impl DrainPolicy {
    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self {
            max_rounds: timing.drain_rounds,
            probe: ms(timing.drain_probe_ms),
            pause: ms(timing.drain_pause_ms),
        }
    }

    /// One round only, with a custom probe window.
    pub fn single(probe: Duration) -> Self {
        Self {
            max_rounds: 1,
            probe,
            pause: Duration::ZERO,
        }
    }
}

impl Default for DrainPolicy {
    fn default() -> Self {
        Self::from_timing(&TimingConfig::default())
    }
}

/// Wait up to `probe` for a dialog; accept it if one appears.
///
/// Returns the dialog text when one was accepted. Driver errors are logged and
/// treated as "no dialog".
pub async fn accept_alert_if_present<D: PageDriver + ?Sized>(
    driver: &mut D,
    probe: Duration,
) -> Option<String> {
    let deadline = Instant::now() + probe;
    loop {
        match driver.dialog_text().await {
            Ok(Some(text)) => {
                let text = text.trim().to_string();
                match driver.accept_dialog().await {
                    Ok(()) => {
                        info!("Accepted dialog: {}", text);
                        return Some(text);
                    }
                    Err(e) => {
                        warn!("Failed to accept dialog '{}': {}", text, e);
                        return None;
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                debug!("Dialog check failed: {}", e);
                return None;
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        sleep(DIALOG_POLL.min(deadline - now)).await;
    }
}

/// Accept dialogs until a round finds none, or `max_rounds` were handled.
///
/// Returns how many dialogs were accepted. With nothing pending this costs one
/// probe window and touches nothing.
pub async fn drain_alerts<D: PageDriver + ?Sized>(driver: &mut D, policy: DrainPolicy) -> usize {
    let mut accepted = 0;
    for _ in 0..policy.max_rounds {
        if accept_alert_if_present(driver, policy.probe).await.is_none() {
            break;
        }
        accepted += 1;
        sleep(policy.pause).await;
    }
    if accepted > 0 {
        debug!("Drained {} dialog(s)", accepted);
    }
    accepted
}

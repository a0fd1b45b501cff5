//! Resilient action primitives.
//!
//! Every primitive walks a `SelectorSpec` in rounds: each round tries the primary
//! locator and then every fallback in order, and the first strategy whose DOM reply
//! is `found && done` wins. Rounds repeat every `poll` until the budget is spent.
//! Nothing here returns `Err`; callers get an `ActionOutcome` and decide.

use crate::driver::{DriverError, PageDriver};
use crate::selectors::SelectorSpec;
use reserva_common::locator::{DomOp, Locator};
use reserva_common::outcome::ActionOutcome;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

/// Time allowed for one primitive call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    pub timeout: Duration,
    pub poll: Duration,
}

impl Budget {
    pub fn new(timeout: Duration, poll: Duration) -> Self {
        Self { timeout, poll }
    }

    /// A single round, no waiting.
    pub fn once() -> Self {
        Self {
            timeout: Duration::ZERO,
            poll: Duration::ZERO,
        }
    }

    /// `rounds` rounds spaced `interval` apart.
    pub fn rounds(rounds: u32, interval: Duration) -> Self {
        Self {
            timeout: interval * rounds.saturating_sub(1),
            poll: interval,
        }
    }

    /// Wait up to `timeout`, polling every 100ms (or less for tiny timeouts).
    pub fn within(timeout: Duration) -> Self {
        Self {
            timeout,
            poll: timeout.min(Duration::from_millis(100)),
        }
    }
}

enum RoundResult {
    Hit(usize),
    Miss,
    Popup(String),
}

async fn attempt_round<D: PageDriver + ?Sized>(
    driver: &mut D,
    spec: &SelectorSpec,
    strategies: &[Locator],
    op: &DomOp,
) -> RoundResult {
    for (index, locator) in strategies.iter().enumerate() {
        match driver.dom(locator, op).await {
            Ok(reply) if reply.succeeded() => {
                debug!("{} '{}' satisfied by {}", op.name(), spec.key, locator);
                return RoundResult::Hit(index);
            }
            Ok(reply) => {
                debug!(
                    "{} '{}' via {}: found={} done={}",
                    op.name(),
                    spec.key,
                    locator,
                    reply.found,
                    reply.done
                );
            }
            Err(DriverError::UnexpectedAlert(text)) => {
                warn!("{} '{}' interrupted by dialog: {}", op.name(), spec.key, text);
                return RoundResult::Popup(text);
            }
            Err(e) => {
                debug!("{} '{}' via {} failed: {}", op.name(), spec.key, locator, e);
            }
        }
    }
    RoundResult::Miss
}

/// Run `op` against `spec` until a strategy succeeds or the budget runs out.
///
/// Exhaustion yields `exhausted` (`NotFound` for actions, `Timeout` for waits).
pub async fn perform<D: PageDriver + ?Sized>(
    driver: &mut D,
    spec: &SelectorSpec,
    op: DomOp,
    budget: Budget,
    exhausted: ActionOutcome,
) -> ActionOutcome {
    let strategies = spec.strategies();
    let deadline = Instant::now() + budget.timeout;
    let mut round = 0u32;

    loop {
        round += 1;
        match attempt_round(driver, spec, &strategies, &op).await {
            RoundResult::Hit(strategy) => return ActionOutcome::Success { strategy },
            RoundResult::Popup(text) => return ActionOutcome::UnexpectedPopup { text },
            RoundResult::Miss => {}
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }
        sleep(budget.poll.min(deadline - now)).await;
    }

    debug!(
        "{} '{}' exhausted {} strategies after {} round(s)",
        op.name(),
        spec.key,
        strategies.len(),
        round
    );
    exhausted
}

pub async fn click<D: PageDriver + ?Sized>(
    driver: &mut D,
    spec: &SelectorSpec,
    budget: Budget,
) -> ActionOutcome {
    perform(driver, spec, DomOp::Click, budget, ActionOutcome::NotFound).await
}

pub async fn set_checked<D: PageDriver + ?Sized>(
    driver: &mut D,
    spec: &SelectorSpec,
    budget: Budget,
) -> ActionOutcome {
    perform(driver, spec, DomOp::Check, budget, ActionOutcome::NotFound).await
}

pub async fn set_value<D: PageDriver + ?Sized>(
    driver: &mut D,
    spec: &SelectorSpec,
    value: &str,
    budget: Budget,
) -> ActionOutcome {
    perform(
        driver,
        spec,
        DomOp::SetValue(value.to_string()),
        budget,
        ActionOutcome::NotFound,
    )
    .await
}

/// Presence check, no visibility requirement.
pub async fn probe<D: PageDriver + ?Sized>(
    driver: &mut D,
    spec: &SelectorSpec,
    budget: Budget,
) -> ActionOutcome {
    perform(driver, spec, DomOp::Probe, budget, ActionOutcome::NotFound).await
}

pub async fn wait_visible<D: PageDriver + ?Sized>(
    driver: &mut D,
    spec: &SelectorSpec,
    budget: Budget,
) -> ActionOutcome {
    perform(driver, spec, DomOp::Visible, budget, ActionOutcome::Timeout).await
}

/// Wait until `document.readyState` is `interactive` or `complete`.
pub async fn wait_ready<D: PageDriver + ?Sized>(driver: &mut D, budget: Budget) -> ActionOutcome {
    let deadline = Instant::now() + budget.timeout;
    loop {
        match driver.ready_state().await {
            Ok(state) if state == "interactive" || state == "complete" => {
                return ActionOutcome::Success { strategy: 0 };
            }
            Ok(state) => debug!("readyState={}", state),
            Err(DriverError::UnexpectedAlert(text)) => {
                return ActionOutcome::UnexpectedPopup { text };
            }
            Err(e) => debug!("readyState check failed: {}", e),
        }

        let now = Instant::now();
        if now >= deadline {
            return ActionOutcome::Timeout;
        }
        sleep(budget.poll.min(deadline - now)).await;
    }
}

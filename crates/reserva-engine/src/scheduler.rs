//! Wake-at-open-time scheduling.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Local, NaiveDateTime, NaiveTime, Timelike};
use reserva_common::request::OpenAt;
use std::time::Duration;
use tracing::{debug, info};

/// Source of local wall-clock time and of sleeping.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    async fn sleep(&self, duration: Duration);
}

/// Local time and tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Next instant at `time` of day, relative to `now`.
///
/// Today if that instant is not already in the past, otherwise tomorrow.
pub fn resolve_target(now: NaiveDateTime, time: NaiveTime) -> NaiveDateTime {
    let time = time.with_nanosecond(0).unwrap_or(time);
    let today = now.date().and_time(time);
    if today < now {
        today + ChronoDuration::days(1)
    } else {
        today
    }
}

pub struct OpenScheduler<C: Clock> {
    clock: C,
    poll: Duration,
}

impl<C: Clock> OpenScheduler<C> {
    pub fn new(clock: C, poll: Duration) -> Self {
        Self { clock, poll }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Block until `open_at` is reached. Returns the target, or `None` for
    /// `Immediate`.
    pub async fn wait(&self, open_at: OpenAt) -> Option<NaiveDateTime> {
        match open_at {
            OpenAt::Immediate => None,
            OpenAt::At(time) => {
                let target = resolve_target(self.clock.now(), time);
                info!("Waiting for reservation open at {}", target);
                self.wait_until(target).await;
                Some(target)
            }
        }
    }

    /// Short-interval polling: the deadline is re-checked on every wake-up, and no
    /// sleep overshoots it.
    pub async fn wait_until(&self, target: NaiveDateTime) {
        loop {
            let now = self.clock.now();
            if now >= target {
                debug!("Open time reached at {}", now);
                return;
            }
            let remaining = (target - now).to_std().unwrap_or(Duration::ZERO);
            self.clock.sleep(self.poll.min(remaining)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, d)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_target_later_today() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(resolve_target(at(8, 8, 59, 59), nine), at(8, 9, 0, 0));
    }

    #[test]
    fn test_target_rolls_to_tomorrow() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(resolve_target(at(8, 9, 0, 1), nine), at(9, 9, 0, 0));
    }

    #[test]
    fn test_target_exactly_now_is_today() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(resolve_target(at(8, 9, 0, 0), nine), at(8, 9, 0, 0));
    }
}

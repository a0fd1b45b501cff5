#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reserva_engine::config::schema::TimingConfig;
use reserva_engine::driver::{DriverError, NavigationResult, PageDriver};
use reserva_engine::dom::READY_STATE_SCRIPT;
use reserva_engine::locator::{DomOp, DomReply, Locator};
use reserva_engine::request::{Credentials, OpenAt, RequestDraft, ReservationRequest};
use reserva_engine::scheduler::Clock;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MockElement {
    pub visible: bool,
    pub disabled: bool,
    pub checked: bool,
    pub value: String,
}

impl Default for MockElement {
    fn default() -> Self {
        Self {
            visible: true,
            disabled: false,
            checked: false,
            value: String::new(),
        }
    }
}

/// In-memory page: elements keyed by the exact locator that finds them.
///
/// While a dialog is queued every DOM call fails with `UnexpectedAlert`, like a real
/// WebDriver session does.
#[derive(Debug)]
pub struct MockPage {
    pub elements: HashMap<Locator, MockElement>,
    pub dialogs: VecDeque<String>,
    /// Dialogs raised after a successful click/check/set_value on a locator.
    pub raises: HashMap<Locator, Vec<String>>,
    pub dom_log: Vec<(Locator, DomOp)>,
    pub blocked_calls: usize,
    pub navigations: Vec<String>,
    pub accepted: Vec<String>,
    pub ready_state: String,
    pub closed: bool,
}

impl Default for MockPage {
    fn default() -> Self {
        Self {
            elements: HashMap::new(),
            dialogs: VecDeque::new(),
            raises: HashMap::new(),
            dom_log: Vec::new(),
            blocked_calls: 0,
            navigations: Vec::new(),
            accepted: Vec::new(),
            ready_state: "complete".into(),
            closed: false,
        }
    }
}

impl MockPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every element the built-in selectors need for `test_request()`.
    pub fn site() -> Self {
        let mut page = Self::new();
        for css in [
            "#userId",
            "#userPw",
            "button[type='submit']",
            "#day1",
            "ul.timetable_list",
            "#erntTime_09",
            "#erntTime_10",
            r#"input.p-button.write[type="submit"][value="다음단계"]"#,
            "#checkAgress",
            "#expectNmpr",
            "#usePurps",
        ] {
            page.add(Locator::css(css));
        }
        page
    }

    pub fn add(&mut self, locator: Locator) -> &mut MockElement {
        self.elements.entry(locator).or_default()
    }

    pub fn remove(&mut self, locator: &Locator) {
        self.elements.remove(locator);
    }

    pub fn raise_after(&mut self, locator: Locator, text: &str) {
        self.raises.entry(locator).or_default().push(text.to_string());
    }

    pub fn element(&self, css: &str) -> Option<&MockElement> {
        self.elements.get(&Locator::css(css))
    }

    /// DOM calls made against `locator`, in order.
    pub fn calls_to(&self, locator: &Locator) -> Vec<&DomOp> {
        self.dom_log
            .iter()
            .filter(|(l, _)| l == locator)
            .map(|(_, op)| op)
            .collect()
    }

    fn fire_raises(&mut self, locator: &Locator) {
        if let Some(texts) = self.raises.get(locator) {
            self.dialogs.extend(texts.iter().cloned());
        }
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn launch(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.closed = true;
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        !self.closed
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, DriverError> {
        if let Some(text) = self.dialogs.front() {
            return Err(DriverError::UnexpectedAlert(text.clone()));
        }
        self.navigations.push(url.to_string());
        Ok(NavigationResult {
            url: url.to_string(),
            title: "mock".into(),
        })
    }

    async fn execute_script(
        &mut self,
        script: &str,
        _args: Vec<Value>,
    ) -> Result<Value, DriverError> {
        if let Some(text) = self.dialogs.front() {
            return Err(DriverError::UnexpectedAlert(text.clone()));
        }
        if script == READY_STATE_SCRIPT {
            return Ok(json!(self.ready_state));
        }
        Err(DriverError::NotSupported("script".into()))
    }

    async fn dialog_text(&mut self) -> Result<Option<String>, DriverError> {
        Ok(self.dialogs.front().cloned())
    }

    async fn accept_dialog(&mut self) -> Result<(), DriverError> {
        match self.dialogs.pop_front() {
            Some(text) => {
                self.accepted.push(text);
                Ok(())
            }
            None => Err(DriverError::Other("no such alert".into())),
        }
    }

    async fn dom(&mut self, locator: &Locator, op: &DomOp) -> Result<DomReply, DriverError> {
        if let Some(text) = self.dialogs.front() {
            self.blocked_calls += 1;
            return Err(DriverError::UnexpectedAlert(text.clone()));
        }
        self.dom_log.push((locator.clone(), op.clone()));

        let Some(element) = self.elements.get_mut(locator) else {
            return Ok(DomReply::MISSING);
        };
        let reply = match op {
            DomOp::Probe => DomReply::done(),
            DomOp::Visible if element.visible => DomReply::done(),
            DomOp::Visible => DomReply::found_only(),
            _ if element.disabled => DomReply::found_only(),
            DomOp::Click => DomReply::done(),
            DomOp::Check => {
                element.checked = true;
                DomReply::done()
            }
            DomOp::SetValue(value) => {
                element.value = value.clone();
                DomReply::done()
            }
        };
        if matches!(op, DomOp::Click | DomOp::Check | DomOp::SetValue(_)) && reply.succeeded() {
            self.fire_raises(locator);
        }
        Ok(reply)
    }
}

/// Clock that only moves when slept on.
#[derive(Debug)]
pub struct FakeClock {
    now: Mutex<NaiveDateTime>,
    pub sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::from_std(duration).unwrap();
    }
}

pub fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, s)
        .unwrap()
}

/// Budgets small enough to keep the suite fast.
pub fn fast_timing() -> TimingConfig {
    TimingConfig {
        drain_rounds: 6,
        drain_probe_ms: 10,
        drain_pause_ms: 0,
        login_field_wait_ms: 50,
        login_alert_ms: 10,
        ready_wait_ms: 20,
        marker_wait_ms: 20,
        day_click_rounds: 2,
        day_click_interval_ms: 5,
        day_fallback_wait_ms: 20,
        slot_settle_ms: 0,
        timetable_poll_rounds: 2,
        timetable_poll_interval_ms: 5,
        slot_attempt_ms: 0,
        advance_click_rounds: 2,
        advance_click_interval_ms: 5,
        advance_fallback_wait_ms: 20,
        form_poll_rounds: 2,
        form_poll_interval_ms: 5,
        field_attempt_ms: 0,
        submit_alert_ms: 10,
        open_poll_ms: 500,
    }
}

pub fn draft() -> RequestDraft {
    RequestDraft {
        date: "2025-12-01".into(),
        open_at: OpenAt::Immediate,
        start_hour: 9,
        duration_hours: 2,
        attendee_count: 2,
        purpose: "테니스".into(),
        credentials: Credentials {
            id: "tester".into(),
            password: "secret".into(),
        },
        login_url: "https://rent.example.org/login".into(),
        reservation_base_url: "https://rent.example.org/rent/view.do?facilityId=7".into(),
    }
}

/// 2025-12-01, 09:00 for two hours, starting immediately.
pub fn test_request() -> ReservationRequest {
    draft().validate().unwrap()
}

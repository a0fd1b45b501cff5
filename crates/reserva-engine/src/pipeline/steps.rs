use super::url::build_reservation_url;
use super::{Pipeline, SlotSelection};
use crate::alerts::{DrainPolicy, accept_alert_if_present, drain_alerts};
use crate::config::schema::ms;
use crate::driver::{DriverError, PageDriver};
use crate::error::StepError;
use crate::primitives::{self, Budget};
use crate::selectors::{SelectorSpec, TemplateVars, keys};
use chrono::{Datelike, NaiveDate};
use reserva_common::outcome::ActionOutcome;
use reserva_common::request::ReservationRequest;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

/// Strict postcondition: anything but `Success` is fatal.
fn require_success(
    outcome: ActionOutcome,
    key: &str,
    step: &'static str,
) -> Result<usize, StepError> {
    match outcome {
        ActionOutcome::Success { strategy } => Ok(strategy),
        ActionOutcome::NotFound => Err(StepError::exhausted(key, "no strategy matched")),
        ActionOutcome::Timeout => Err(StepError::Timeout(key.to_string())),
        ActionOutcome::UnexpectedPopup { text } => Err(StepError::UnexpectedPopup { step, text }),
    }
}

fn navigation_error(err: DriverError) -> StepError {
    match err {
        DriverError::Timeout(what) => StepError::Timeout(what),
        other => StepError::Driver(other),
    }
}

impl<D: PageDriver + ?Sized> Pipeline<'_, D> {
    fn drain_policy(&self) -> DrainPolicy {
        DrainPolicy::from_timing(self.timing)
    }

    fn spec(&self, key: &str) -> Result<SelectorSpec, StepError> {
        self.registry.require(key, &TemplateVars::none())
    }

    pub(super) async fn login(&mut self, request: &ReservationRequest) -> Result<(), StepError> {
        let credentials = request.credentials();
        let wait = Budget::within(ms(self.timing.login_field_wait_ms));
        let field = Budget::within(ms(self.timing.field_attempt_ms));

        self.driver
            .navigate(request.login_url().as_str())
            .await
            .map_err(navigation_error)?;
        info!("Opened login page");

        let id = self.spec(keys::LOGIN_ID)?;
        let password = self.spec(keys::LOGIN_PASSWORD)?;
        let submit = self.spec(keys::LOGIN_SUBMIT)?;

        let outcome = primitives::wait_visible(self.driver, &id, wait).await;
        require_success(outcome, &id.key, "login")?;

        let outcome = primitives::set_value(self.driver, &id, &credentials.id, field).await;
        require_success(outcome, &id.key, "login")?;
        let outcome =
            primitives::set_value(self.driver, &password, &credentials.password, field).await;
        require_success(outcome, &password.key, "login")?;

        let outcome = primitives::click(self.driver, &submit, wait).await;
        require_success(outcome, &submit.key, "login")?;
        info!("Submitted login form");

        accept_alert_if_present(self.driver, ms(self.timing.login_alert_ms)).await;
        Ok(())
    }

    pub(super) async fn navigate(&mut self, request: &ReservationRequest) -> Result<Url, StepError> {
        let url = build_reservation_url(
            request.reservation_base_url(),
            request.date(),
            self.registry.url_params(),
        );
        info!("Reservation page URL: {}", url);

        self.driver
            .navigate(url.as_str())
            .await
            .map_err(navigation_error)?;

        let ready = primitives::wait_ready(self.driver, Budget::within(ms(self.timing.ready_wait_ms)))
            .await;
        if !ready.is_success() {
            warn!("Document not ready ({:?}), continuing", ready);
        }

        if let Some(marker) = self.registry.spec(keys::PAGE_READY_MARKER) {
            let budget = Budget::within(ms(self.timing.marker_wait_ms));
            let seen = primitives::wait_visible(self.driver, &marker, budget).await;
            if !seen.is_success() {
                warn!("Page-ready marker '{}' not visible ({:?}), continuing", marker.primary, seen);
            }
        }
        Ok(url)
    }

    pub(super) async fn select_day(&mut self, date: NaiveDate) -> Result<(), StepError> {
        let day = date.day();
        let spec = self
            .registry
            .require(keys::DAY_CELL, &TemplateVars::for_day(date))?;

        let fast = Budget::rounds(
            self.timing.day_click_rounds,
            ms(self.timing.day_click_interval_ms),
        );
        match primitives::click(self.driver, &spec, fast).await {
            ActionOutcome::Success { strategy } => {
                info!("Clicked day {} (strategy {})", day, strategy);
                return Ok(());
            }
            ActionOutcome::UnexpectedPopup { text } => {
                warn!("Dialog while clicking day {}: {}", day, text);
                let policy = self.drain_policy();
                drain_alerts(self.driver, policy).await;
            }
            other => debug!("Fast day click missed: {:?}", other),
        }

        let patient = Budget::within(ms(self.timing.day_fallback_wait_ms));
        let outcome = match primitives::wait_visible(self.driver, &spec, patient).await {
            ActionOutcome::Success { .. } => primitives::click(self.driver, &spec, Budget::once()).await,
            other => other,
        };
        match outcome {
            ActionOutcome::Success { strategy } => {
                info!("Clicked day {} after explicit wait (strategy {})", day, strategy);
                Ok(())
            }
            ActionOutcome::UnexpectedPopup { text } => Err(StepError::UnexpectedPopup {
                step: "select_day",
                text,
            }),
            _ => Err(StepError::exhausted(
                keys::DAY_CELL,
                format!("day {} could not be located or clicked", day),
            )),
        }
    }

    pub(super) async fn select_time(
        &mut self,
        request: &ReservationRequest,
    ) -> Result<SlotSelection, StepError> {
        let date = request.date();

        if self.timing.slot_settle_ms > 0 {
            sleep(ms(self.timing.slot_settle_ms)).await;
        }

        if let Some(timetable) = self.registry.spec(keys::TIMETABLE) {
            let budget = Budget::rounds(
                self.timing.timetable_poll_rounds,
                ms(self.timing.timetable_poll_interval_ms),
            );
            if !primitives::probe(self.driver, &timetable, budget)
                .await
                .is_success()
            {
                warn!("Timetable container '{}' not seen", timetable.primary);
            }
        }

        let attempt = Budget::within(ms(self.timing.slot_attempt_ms));
        let mut selection = SlotSelection {
            requested: request.duration_hours(),
            picked: 0,
            tried_hours: Vec::new(),
            picked_hours: Vec::new(),
        };

        for hour in request.hours() {
            let spec = self
                .registry
                .require(keys::TIME_SLOT, &TemplateVars::for_slot(date, hour))?;
            selection.tried_hours.push(hour);

            match primitives::set_checked(self.driver, &spec, attempt).await {
                ActionOutcome::Success { strategy } => {
                    debug!("Checked {:02}:00 slot (strategy {})", hour, strategy);
                    selection.picked += 1;
                    selection.picked_hours.push(hour);
                }
                ActionOutcome::UnexpectedPopup { text } => {
                    warn!("Dialog while checking {:02}:00 slot: {}", hour, text);
                    let policy = self.drain_policy();
                    drain_alerts(self.driver, policy).await;
                }
                _ => warn!("Slot {:02}:00 not available", hour),
            }
        }

        if selection.picked == 0 {
            return Err(StepError::exhausted(
                keys::TIME_SLOT,
                format!(
                    "no selectable time slot (tried={})",
                    selection.tried_hours.len()
                ),
            ));
        }

        if selection.is_partial() {
            info!(
                "Partial selection: {}/{} slots secured ({:?})",
                selection.picked, selection.requested, selection.picked_hours
            );
        }
        info!(
            "Selected time {:02}:00-{:02}:00 (picked={}, tried={})",
            request.start_hour(),
            request.start_hour() + request.duration_hours(),
            selection.picked,
            selection.tried_hours.len()
        );
        Ok(selection)
    }

    /// Click the stage-advance control with alert draining on both sides.
    async fn click_advance(&mut self, step: &'static str) -> Result<usize, StepError> {
        let spec = self.spec(keys::NEXT_BUTTON)?;
        let policy = self.drain_policy();
        let fast = Budget::rounds(
            self.timing.advance_click_rounds,
            ms(self.timing.advance_click_interval_ms),
        );
        let patient = Budget::within(ms(self.timing.advance_fallback_wait_ms));

        drain_alerts(self.driver, policy).await;

        let mut outcome = primitives::click(self.driver, &spec, fast).await;
        if outcome == ActionOutcome::NotFound {
            debug!("Fast advance click missed, retrying with longer budget");
            outcome = primitives::click(self.driver, &spec, patient).await;
        }
        if let ActionOutcome::UnexpectedPopup { text } = &outcome {
            warn!("Dialog blocked advance click: {}", text);
            drain_alerts(self.driver, policy).await;
            outcome = primitives::click(self.driver, &spec, patient).await;
        }

        drain_alerts(self.driver, policy).await;

        let strategy = require_success(outcome, &spec.key, step)?;
        info!("Clicked stage-advance control (strategy {})", strategy);
        Ok(strategy)
    }

    pub(super) async fn advance_stage(&mut self) -> Result<(), StepError> {
        self.click_advance("advance_stage").await?;
        Ok(())
    }

    pub(super) async fn fill_form(&mut self, request: &ReservationRequest) -> Result<(), StepError> {
        let agree = self.spec(keys::AGREE_CHECKBOX)?;
        let attendees = self.spec(keys::ATTENDEE_COUNT)?;
        let purpose = self.spec(keys::PURPOSE)?;

        // Any of the three fields showing up means the form rendered.
        let mut any_field = SelectorSpec {
            key: "agree.*".to_string(),
            primary: agree.primary.clone(),
            fallbacks: agree.fallbacks.clone(),
        };
        any_field.fallbacks.extend(attendees.strategies());
        any_field.fallbacks.extend(purpose.strategies());

        let poll = Budget::rounds(
            self.timing.form_poll_rounds,
            ms(self.timing.form_poll_interval_ms),
        );
        if !primitives::probe(self.driver, &any_field, poll)
            .await
            .is_success()
        {
            warn!("Agreement form not detected, continuing");
        }

        let field = Budget::within(ms(self.timing.field_attempt_ms));
        let count = request.attendee_count().to_string();

        let results = [
            (
                &agree.key,
                primitives::set_checked(self.driver, &agree, field).await,
            ),
            (
                &attendees.key,
                primitives::set_value(self.driver, &attendees, &count, field).await,
            ),
            (
                &purpose.key,
                primitives::set_value(self.driver, &purpose, request.purpose(), field).await,
            ),
        ];
        for (key, outcome) in &results {
            match outcome {
                ActionOutcome::Success { .. } => debug!("Filled '{}'", key),
                ActionOutcome::UnexpectedPopup { text } => {
                    warn!("Dialog while filling '{}': {}", key, text);
                }
                _ => warn!("Field '{}' not found (ignored)", key),
            }
        }
        if results
            .iter()
            .any(|(_, o)| matches!(o, ActionOutcome::UnexpectedPopup { .. }))
        {
            let policy = self.drain_policy();
            drain_alerts(self.driver, policy).await;
        }

        self.click_advance("fill_form").await?;
        accept_alert_if_present(self.driver, ms(self.timing.submit_alert_ms)).await;
        info!("Agreement form submitted");
        Ok(())
    }
}

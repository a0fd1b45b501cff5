//! The ordered reservation steps.
//!
//! `Login → Navigate → SelectDay → SelectTime → AdvanceStage → FillForm → Submitted`.
//! Steps run strictly one after another on the single driver the pipeline borrows;
//! a step only returns `Ok` once its strict postcondition was observed.

pub mod state;
mod steps;
pub mod url;

use crate::config::schema::TimingConfig;
use crate::driver::PageDriver;
use crate::error::StepError;
use crate::selectors::SelectorRegistry;
use reserva_common::request::ReservationRequest;
use serde::Serialize;
use state::{PipelineState, StateMachine};
use tracing::info;

/// Outcome of the time-slot step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSelection {
    pub requested: u32,
    pub picked: u32,
    /// Hours attempted, ascending.
    pub tried_hours: Vec<u32>,
    pub picked_hours: Vec<u32>,
}

impl SlotSelection {
    /// Fewer slots than requested were secured. Informational, not an error.
    pub fn is_partial(&self) -> bool {
        self.picked > 0 && self.picked < self.requested
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub reservation_url: ::url::Url,
    pub selection: SlotSelection,
}

pub struct Pipeline<'a, D: PageDriver + ?Sized> {
    driver: &'a mut D,
    registry: &'a SelectorRegistry,
    timing: &'a TimingConfig,
    machine: StateMachine,
    selection: Option<SlotSelection>,
}

impl<'a, D: PageDriver + ?Sized> Pipeline<'a, D> {
    pub fn new(driver: &'a mut D, registry: &'a SelectorRegistry, timing: &'a TimingConfig) -> Self {
        Self {
            driver,
            registry,
            timing,
            machine: StateMachine::new(),
            selection: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.machine.current()
    }

    pub fn history(&self) -> &[PipelineState] {
        self.machine.history()
    }

    /// Slot selection, once `SelectingTime` completed.
    pub fn selection(&self) -> Option<&SlotSelection> {
        self.selection.as_ref()
    }

    /// Mark the run failed. Only the orchestrator calls this.
    pub fn fail(&mut self) {
        self.machine.fail();
    }

    fn enter(&mut self, next: PipelineState) -> Result<(), StepError> {
        self.machine.transition(next)?;
        info!("== {:?}", next);
        Ok(())
    }

    /// Drive every step in order. Stops at the first fatal step, leaving the state
    /// on that step; the caller decides how to record the failure.
    pub async fn run(&mut self, request: &ReservationRequest) -> Result<PipelineOutput, StepError> {
        self.enter(PipelineState::LoggingIn)?;
        self.login(request).await?;

        self.enter(PipelineState::Navigating)?;
        let reservation_url = self.navigate(request).await?;

        self.enter(PipelineState::SelectingDay)?;
        self.select_day(request.date()).await?;

        self.enter(PipelineState::SelectingTime)?;
        let selection = self.select_time(request).await?;
        self.selection = Some(selection.clone());

        self.enter(PipelineState::AdvancingStage)?;
        self.advance_stage().await?;

        self.enter(PipelineState::FillingForm)?;
        self.fill_form(request).await?;

        self.enter(PipelineState::Submitted)?;
        Ok(PipelineOutput {
            reservation_url,
            selection,
        })
    }
}

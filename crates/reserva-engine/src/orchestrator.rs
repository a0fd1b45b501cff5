//! Run orchestration: open-time wait, pipeline, outcome reporting.
//!
//! A failed run leaves the browser session open for inspection. Closing the driver
//! is the caller's decision.

use crate::config::schema::{TimingConfig, ms};
use crate::driver::PageDriver;
use crate::error::StepError;
use crate::pipeline::state::PipelineState;
use crate::pipeline::{Pipeline, SlotSelection};
use crate::scheduler::{Clock, OpenScheduler};
use crate::selectors::SelectorRegistry;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use reserva_common::request::ReservationRequest;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

/// Serializable summary of a failure.
#[derive(Debug, Clone, Serialize)]
pub struct FailureSummary {
    pub kind: &'static str,
    pub message: String,
    /// Step that was running when the failure happened.
    pub step: PipelineState,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub final_state: PipelineState,
    pub transitions: Vec<PipelineState>,
    pub selection: Option<SlotSelection>,
    pub reservation_url: Option<String>,
    pub failure: Option<FailureSummary>,
    #[serde(skip)]
    pub error: Option<StepError>,
    pub target_open: Option<NaiveDateTime>,
    pub started_at: NaiveDateTime,
    pub finished_at: NaiveDateTime,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.final_state == PipelineState::Submitted
    }
}

/// Where a failed run gets reported.
#[async_trait]
pub trait FailureSink: Send + Sync {
    async fn report(&self, report: &RunReport);
}

/// Print the failure and block until the operator presses Enter.
#[derive(Debug, Default)]
pub struct ConsoleFailureSink;

#[async_trait]
impl FailureSink for ConsoleFailureSink {
    async fn report(&self, report: &RunReport) {
        if let Some(failure) = &report.failure {
            eprintln!(
                "Reservation failed during {:?}: {}",
                failure.step, failure.message
            );
        }
        eprintln!("Browser left open for inspection. Press Enter to exit...");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        if let Err(e) = lines.next_line().await {
            warn!("Failed to read acknowledgement: {}", e);
        }
    }
}

/// Non-blocking sink for headless runs.
#[derive(Debug, Default)]
pub struct LogFailureSink;

#[async_trait]
impl FailureSink for LogFailureSink {
    async fn report(&self, report: &RunReport) {
        match serde_json::to_string(report) {
            Ok(json) => error!("Run report: {}", json),
            Err(e) => error!("Run failed (report not serializable: {})", e),
        }
    }
}

pub struct Orchestrator<C: Clock> {
    registry: SelectorRegistry,
    timing: TimingConfig,
    scheduler: OpenScheduler<C>,
    sink: Box<dyn FailureSink>,
}

impl<C: Clock> Orchestrator<C> {
    pub fn new(
        registry: SelectorRegistry,
        timing: TimingConfig,
        clock: C,
        sink: Box<dyn FailureSink>,
    ) -> Self {
        let scheduler = OpenScheduler::new(clock, ms(timing.open_poll_ms));
        Self {
            registry,
            timing,
            scheduler,
            sink,
        }
    }

    pub fn registry(&self) -> &SelectorRegistry {
        &self.registry
    }

    /// Wait for the open time, run the pipeline, report.
    pub async fn run<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
        request: &ReservationRequest,
    ) -> RunReport {
        let target_open = self.scheduler.wait(request.open_at()).await;
        let started_at = self.scheduler.clock().now();
        info!(
            "Starting reservation for {} {:02}:00 (+{}h)",
            request.date(),
            request.start_hour(),
            request.duration_hours()
        );

        let mut pipeline = Pipeline::new(driver, &self.registry, &self.timing);
        let result = pipeline.run(request).await;

        let (reservation_url, failure, error) = match result {
            Ok(output) => (Some(output.reservation_url.to_string()), None, None),
            Err(err) => {
                let failure = FailureSummary {
                    kind: err.kind(),
                    message: err.to_string(),
                    step: pipeline.state(),
                };
                error!("Step {:?} failed: {}", failure.step, err);
                pipeline.fail();
                (None, Some(failure), Some(err))
            }
        };

        let report = RunReport {
            final_state: pipeline.state(),
            transitions: pipeline.history().to_vec(),
            selection: pipeline.selection().cloned(),
            reservation_url,
            failure,
            error,
            target_open,
            started_at,
            finished_at: self.scheduler.clock().now(),
        };

        if report.succeeded() {
            if let Some(selection) = &report.selection {
                info!(
                    "Reservation flow completed: {} {:?} (picked {}/{}), attendees {}, purpose '{}'",
                    request.date(),
                    selection.picked_hours,
                    selection.picked,
                    selection.requested,
                    request.attendee_count(),
                    request.purpose()
                );
            }
        } else {
            self.sink.report(&report).await;
        }
        report
    }
}

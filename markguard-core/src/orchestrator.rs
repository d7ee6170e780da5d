//! Scan submission lifecycle.
//!
//! [`ScanOrchestrator`] owns the submission form, the busy flag and the last
//! [`ScanResult`]. It drives one submission at a time through
//! `Idle -> Validating -> Submitting -> {Succeeded, Failed} -> Idle` and
//! publishes a [`SessionView`] after every transition.
//!
//! Both terminal paths clear the form. After a failed submission the
//! operator has to pick the image and type the part number again.

use std::sync::Arc;

use chrono::Utc;
use markguard_model::{ImageUpload, PendingSubmission, ScanResult};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::error::{ScanRejection, SubmitError};
use crate::service::ScanService;
use crate::synchronizer::StatsSynchronizer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrchestratorPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

/// How the most recent submission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Succeeded,
    Failed,
}

/// Everything the display layer needs to draw the form and result panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionView {
    pub phase: OrchestratorPhase,
    /// True strictly while a submission is in flight.
    pub busy: bool,
    pub image_name: Option<String>,
    pub part_number: String,
    pub result: Option<ScanResult>,
    /// Outcome of the last completed submission, kept after the phase
    /// returns to `Idle`. Reset when the next submission starts.
    pub last_outcome: Option<ScanOutcome>,
}

/// User-visible messages raised by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Rejected(ScanRejection),
    SubmissionFailed { message: String },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::Rejected(reason) => write!(f, "{reason}"),
            Notice::SubmissionFailed { .. } => {
                f.write_str("Error submitting scan")
            }
        }
    }
}

#[derive(Debug, Default)]
struct State {
    phase: OrchestratorPhase,
    busy: bool,
    image: Option<ImageUpload>,
    part_number: String,
    result: Option<ScanResult>,
    last_outcome: Option<ScanOutcome>,
}

impl State {
    fn transition(&mut self, next: OrchestratorPhase) {
        debug!(from = ?self.phase, to = ?next, "scan phase");
        self.phase = next;
    }

    fn clear_form(&mut self) {
        self.image = None;
        self.part_number.clear();
    }

    fn validate(&self) -> Result<PendingSubmission, ScanRejection> {
        if self.image.is_none() {
            return Err(ScanRejection::MissingImage);
        }
        PendingSubmission::from_form(self.image.as_ref(), &self.part_number)
            .ok_or(ScanRejection::MissingPartNumber)
    }

    fn view(&self) -> SessionView {
        SessionView {
            phase: self.phase,
            busy: self.busy,
            image_name: self.image.as_ref().map(|i| i.file_name.clone()),
            part_number: self.part_number.clone(),
            result: self.result.clone(),
            last_outcome: self.last_outcome,
        }
    }
}

type SharedState = Arc<Mutex<State>>;
type ViewSender = Arc<watch::Sender<SessionView>>;

fn publish(view: &watch::Sender<SessionView>, state: &State) {
    view.send_replace(state.view());
}

/// A validated submission holding the busy flag.
///
/// Produced by [`ScanOrchestrator::begin`] and consumed by
/// [`ScanOrchestrator::complete`]. Dropping it before completion (a
/// cancelled task, a caller-side timeout) releases the busy flag and
/// returns the session to `Idle` with the form untouched.
#[derive(Debug)]
pub struct Submission {
    pending: PendingSubmission,
    guard: BusyGuard,
}

#[derive(Debug)]
struct BusyGuard {
    state: SharedState,
    view: ViewSender,
    armed: bool,
}

impl BusyGuard {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock();
        warn!("submission abandoned before completion");
        state.busy = false;
        state.transition(OrchestratorPhase::Idle);
        publish(&self.view, &state);
    }
}

#[derive(Debug, Clone)]
pub struct ScanOrchestrator {
    service: Arc<dyn ScanService>,
    synchronizer: StatsSynchronizer,
    state: SharedState,
    view: ViewSender,
    notices: mpsc::UnboundedSender<Notice>,
}

impl ScanOrchestrator {
    pub fn new(
        service: Arc<dyn ScanService>,
        synchronizer: StatsSynchronizer,
        notices: mpsc::UnboundedSender<Notice>,
    ) -> Self {
        let (view, _) = watch::channel(SessionView::default());
        Self {
            service,
            synchronizer,
            state: Arc::new(Mutex::new(State::default())),
            view: Arc::new(view),
            notices,
        }
    }

    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.state.lock().busy
    }

    pub fn select_image(&self, image: ImageUpload) {
        self.update(|state| state.image = Some(image));
    }

    pub fn set_part_number(&self, part_number: impl Into<String>) {
        let part_number = part_number.into();
        self.update(|state| state.part_number = part_number);
    }

    fn update(&self, edit: impl FnOnce(&mut State)) {
        let mut state = self.state.lock();
        edit(&mut state);
        publish(&self.view, &state);
    }

    fn notify(&self, notice: Notice) {
        // The display layer may have gone away during shutdown.
        let _ = self.notices.send(notice);
    }

    /// Runs one submission to completion.
    ///
    /// Equivalent to [`begin`](Self::begin) followed by
    /// [`complete`](Self::complete). There is no timeout: a hung request
    /// keeps the session busy until the future is dropped.
    pub async fn submit(&self) -> Result<ScanResult, SubmitError> {
        let submission = self.begin()?;
        self.complete(submission).await
    }

    /// Validates the form and claims the busy flag, without any I/O.
    ///
    /// While another submission is in flight this returns
    /// [`ScanRejection::Busy`] without touching any state. A missing image
    /// or part number sends a notice before returning, and keeps the input.
    pub fn begin(&self) -> Result<Submission, ScanRejection> {
        let mut state = self.state.lock();
        if state.busy {
            debug!("submission already in flight, rejecting");
            return Err(ScanRejection::Busy);
        }

        state.transition(OrchestratorPhase::Validating);
        match state.validate() {
            Ok(pending) => {
                state.busy = true;
                state.last_outcome = None;
                state.transition(OrchestratorPhase::Submitting);
                publish(&self.view, &state);
                Ok(Submission {
                    pending,
                    guard: BusyGuard {
                        state: self.state.clone(),
                        view: self.view.clone(),
                        armed: true,
                    },
                })
            }
            Err(reason) => {
                state.transition(OrchestratorPhase::Idle);
                publish(&self.view, &state);
                drop(state);
                info!(%reason, "scan rejected before submission");
                self.notify(Notice::Rejected(reason));
                Err(reason)
            }
        }
    }

    /// Sends a validated submission and records its outcome.
    pub async fn complete(
        &self,
        submission: Submission,
    ) -> Result<ScanResult, SubmitError> {
        let Submission { pending, guard } = submission;
        info!(
            part_number = %pending.part_number,
            file_name = %pending.image.file_name,
            "submitting scan"
        );

        let response = self.service.submit_scan(&pending).await;
        guard.disarm();
        match response {
            Ok(response) => {
                let result = ScanResult::from_response(response, Utc::now());
                info!(
                    scan_id = %result.scan_id,
                    verdict = %result.verdict,
                    confidence = result.confidence,
                    "scan completed"
                );
                self.finish(ScanOutcome::Succeeded, Some(result.clone()));
                self.synchronizer.burst();
                self.settle();
                Ok(result)
            }
            Err(e) => {
                error!(error = %e, "scan submission failed");
                self.finish(ScanOutcome::Failed, None);
                self.notify(Notice::SubmissionFailed {
                    message: e.to_string(),
                });
                self.settle();
                Err(SubmitError::Failed(e))
            }
        }
    }

    fn finish(&self, outcome: ScanOutcome, result: Option<ScanResult>) {
        let mut state = self.state.lock();
        if let Some(result) = result {
            state.result = Some(result);
        }
        state.clear_form();
        state.busy = false;
        state.last_outcome = Some(outcome);
        state.transition(match outcome {
            ScanOutcome::Succeeded => OrchestratorPhase::Succeeded,
            ScanOutcome::Failed => OrchestratorPhase::Failed,
        });
        publish(&self.view, &state);
    }

    fn settle(&self) {
        let mut state = self.state.lock();
        if matches!(
            state.phase,
            OrchestratorPhase::Succeeded | OrchestratorPhase::Failed
        ) {
            state.transition(OrchestratorPhase::Idle);
            publish(&self.view, &state);
        }
    }
}

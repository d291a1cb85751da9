//! Collection state machine for one page visit at a time.
//!
//! A [`Collector`] takes a [`CollectionSchedule`], fires each interaction at
//! its scheduled time, routes captured responses into data slots and emits
//! the final [`PageData`] exactly once: when every slot has resolved, or when
//! the schedule's stop time passes and the remaining slots are failed.
//!
//! Each collection runs as one task that owns the slot state. Timers,
//! interaction outcomes and pushed responses all arrive at that task, so
//! updates never interleave.

mod error;
mod interaction;
mod scheduler;
mod state;


pub use error::*;
pub use interaction::*;
pub use scheduler::*;
pub use state::{CollectionState, Resolution, DEADLINE_EXCEEDED};

use crate::model::{DataSlotKind, FetchSlot, InstrumentId, InteractionStepKind, PageData};
use crate::routing::{self, EndpointPattern};
use crate::schedule::{CollectionSchedule, ScheduledStep};
use chrono::{DateTime, Utc};
use state::CollectionMachine;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Status published by the collection task after every transition.
#[derive(Debug, Clone)]
struct CollectionStatus {
    state: CollectionState,
    page: Arc<PageData>,
    steps_fired: usize,
}

impl From<&CollectionMachine> for CollectionStatus {
    fn from(machine: &CollectionMachine) -> Self {
        Self {
            state: machine.state(),
            page: Arc::clone(machine.page()),
            steps_fired: machine.steps_fired(),
        }
    }
}

/// Point-in-time view of a running (or finished) collection.
#[derive(Debug, Clone)]
pub struct CollectionProgress {
    pub collection_id: Uuid,
    pub instrument: InstrumentId,
    pub state: CollectionState,
    /// Slot snapshot; never changes after being handed out
    pub page: Arc<PageData>,
    pub steps_fired: usize,
    pub total_steps: usize,
    pub started_at: DateTime<Utc>,
    pub stop_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub remaining: Duration,
}

impl CollectionProgress {
    fn new(
        collection_id: Uuid,
        schedule: &CollectionSchedule,
        status: &CollectionStatus,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            collection_id,
            instrument: schedule.instrument().clone(),
            state: status.state,
            page: Arc::clone(&status.page),
            steps_fired: status.steps_fired,
            total_steps: schedule.steps().len(),
            started_at: schedule.start_time(),
            stop_at: schedule.stop_time(),
            elapsed: (now - schedule.start_time())
                .to_std()
                .unwrap_or(Duration::ZERO),
            remaining: (schedule.stop_time() - now)
                .to_std()
                .unwrap_or(Duration::ZERO),
        }
    }
}

/// Returned by [`Collector::begin_collection`].
#[derive(Debug)]
pub struct CollectionHandle {
    pub collection_id: Uuid,
    /// Progress at the moment the collection started
    pub progress: CollectionProgress,
    instrument: InstrumentId,
    completion: oneshot::Receiver<PageData>,
}

impl CollectionHandle {
    /// Wait for the terminal event carrying the final page data.
    ///
    /// # Errors
    ///
    /// Returns `CollectorError::Abandoned` if the collector was dropped first.
    pub async fn completed(self) -> Result<PageData, CollectorError> {
        let CollectionHandle {
            instrument,
            completion,
            ..
        } = self;
        completion
            .await
            .map_err(|_| CollectorError::Abandoned { instrument })
    }
}

/// Bookkeeping for the collection most recently started.
struct ActiveCollection {
    id: Uuid,
    schedule: Arc<CollectionSchedule>,
    inbox: mpsc::UnboundedSender<CapturedResponse>,
    status: watch::Receiver<CollectionStatus>,
    cancel: CancellationToken,
}

impl ActiveCollection {
    fn in_progress(&self) -> bool {
        !self.inbox.is_closed() && self.status.borrow().state != CollectionState::Completed
    }
}

/// Drives page visits, one collection in flight at a time.
///
/// Dropping the collector cancels any pending timers and interactions.
pub struct Collector {
    interactor: Arc<dyn Interactor>,
    scheduler: Arc<dyn Scheduler>,
    patterns: Arc<[EndpointPattern]>,
    current: Mutex<Option<ActiveCollection>>,
}

impl Collector {
    pub fn new(
        interactor: Arc<dyn Interactor>,
        scheduler: Arc<dyn Scheduler>,
        patterns: Vec<EndpointPattern>,
    ) -> Self {
        Self {
            interactor,
            scheduler,
            patterns: patterns.into(),
            current: Mutex::new(None),
        }
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<ActiveCollection>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start collecting according to `schedule`.
    ///
    /// Must be called within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `CollectorError::CollectionInProgress` if the previous
    /// collection on this collector has not completed.
    pub fn begin_collection(
        &self,
        schedule: CollectionSchedule,
    ) -> Result<CollectionHandle, CollectorError> {
        let mut current = self.lock_current();
        if let Some(active) = current.as_ref() {
            if active.in_progress() {
                return Err(CollectorError::CollectionInProgress {
                    instrument: active.schedule.instrument().clone(),
                });
            }
        }

        let id = Uuid::new_v4();
        let schedule = Arc::new(schedule);
        let instrument = schedule.instrument().clone();
        let machine = CollectionMachine::new(instrument.clone(), schedule.steps().len());
        let initial = CollectionStatus::from(&machine);

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(initial.clone());
        let (completion_tx, completion_rx) = oneshot::channel();
        let cancel = CancellationToken::new();

        let task = CollectionTask {
            machine,
            schedule: Arc::clone(&schedule),
            interactor: Arc::clone(&self.interactor),
            scheduler: Arc::clone(&self.scheduler),
            patterns: Arc::clone(&self.patterns),
            inbox: inbox_rx,
            status: status_tx,
            completion: Some(completion_tx),
            cancel: cancel.clone(),
        };
        let span = tracing::info_span!(
            "collection",
            collection_id = %id,
            instrument = %instrument
        );
        tokio::spawn(tracing::Instrument::instrument(task.run(), span));

        tracing::info!(
            collection_id = %id,
            instrument = %instrument,
            steps = schedule.steps().len(),
            stop_time = %schedule.stop_time(),
            "Collection started"
        );

        let progress = CollectionProgress::new(id, &schedule, &initial, self.scheduler.now());

        if let Some(previous) = current.replace(ActiveCollection {
            id,
            schedule,
            inbox: inbox_tx,
            status: status_rx,
            cancel,
        }) {
            previous.cancel.cancel();
        }

        Ok(CollectionHandle {
            collection_id: id,
            progress,
            instrument,
            completion: completion_rx,
        })
    }

    /// Push a response observed on the page.
    ///
    /// A no-op when no collection is running; late responses are dropped.
    pub fn notify_response_captured(&self, response: CapturedResponse) {
        let current = self.lock_current();
        match current.as_ref() {
            Some(active) if active.in_progress() => {
                if let Err(rejected) = active.inbox.send(response) {
                    tracing::trace!(url = %rejected.0.url, "Collection finished, response dropped");
                }
            }
            _ => {
                tracing::trace!(url = %response.url, "No collection in progress, response ignored");
            }
        }
    }

    /// State of the most recent collection.
    pub fn state(&self) -> CollectionState {
        self.lock_current()
            .as_ref()
            .map(|active| active.status.borrow().state)
            .unwrap_or(CollectionState::Idle)
    }

    /// Progress of the most recent collection, if one was started.
    pub fn progress(&self) -> Option<CollectionProgress> {
        let current = self.lock_current();
        current.as_ref().map(|active| {
            let status = active.status.borrow().clone();
            CollectionProgress::new(active.id, &active.schedule, &status, self.scheduler.now())
        })
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        let current = self.current.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(active) = current.take() {
            active.cancel.cancel();
        }
    }
}

type InteractionOutcome = (InteractionStepKind, Result<(), InteractionError>);

/// The single writer for one collection.
struct CollectionTask {
    machine: CollectionMachine,
    schedule: Arc<CollectionSchedule>,
    interactor: Arc<dyn Interactor>,
    scheduler: Arc<dyn Scheduler>,
    patterns: Arc<[EndpointPattern]>,
    inbox: mpsc::UnboundedReceiver<CapturedResponse>,
    status: watch::Sender<CollectionStatus>,
    completion: Option<oneshot::Sender<PageData>>,
    cancel: CancellationToken,
}

impl CollectionTask {
    async fn run(mut self) {
        let steps: Vec<ScheduledStep> = self.schedule.steps().to_vec();
        let stop_time = self.schedule.stop_time();
        let mut interactions: JoinSet<InteractionOutcome> = JoinSet::new();
        let mut next = 0usize;

        loop {
            let scheduler = Arc::clone(&self.scheduler);
            let next_fire = steps.get(next).map(|s| s.fire_at);
            let step_timer = async move {
                match next_fire {
                    Some(at) => scheduler.sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };

            // Order matters: responses already queued win over a deadline
            // that is due in the same tick.
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    tracing::debug!("Collection cancelled");
                    return;
                }
                Some(response) = self.inbox.recv() => self.on_response(response),
                Some(joined) = interactions.join_next() => self.on_interaction_finished(joined),
                _ = step_timer => {
                    let step = steps[next].step;
                    next += 1;
                    self.fire_step(step, &mut interactions);
                }
                _ = self.scheduler.sleep_until(stop_time) => self.on_deadline(),
            }

            self.status.send_replace(CollectionStatus::from(&self.machine));

            if self.machine.is_completed() {
                self.complete();
                return;
            }
        }
    }

    fn fire_step(&mut self, step: InteractionStepKind, interactions: &mut JoinSet<InteractionOutcome>) {
        self.machine.step_fired();
        tracing::debug!(
            step = %step,
            fired = self.machine.steps_fired(),
            "Firing interaction"
        );

        let interactor = Arc::clone(&self.interactor);
        interactions.spawn(tracing::Instrument::in_current_span(async move {
            let result = interactor.perform_interaction(step).await;
            (step, result)
        }));

        if self.machine.state() == CollectionState::Draining {
            tracing::debug!("All interactions fired, draining");
        }
    }

    fn on_interaction_finished(&mut self, joined: Result<InteractionOutcome, JoinError>) {
        match joined {
            Ok((_, Ok(()))) => {}
            Ok((step, Err(error))) => match step.slot() {
                Some(slot) => {
                    tracing::warn!(step = %step, error = %error, "Interaction failed, slot will not resolve by data");
                    self.resolve(slot, FetchSlot::failed(error.to_string()));
                }
                None => {
                    tracing::warn!(step = %step, error = %error, "Interaction failed");
                }
            },
            Err(error) => {
                tracing::warn!(error = %error, "Interaction task did not finish");
            }
        }
    }

    fn on_response(&mut self, response: CapturedResponse) {
        let Some(slot) = routing::route(&response.url, &self.patterns) else {
            tracing::trace!(url = %response.url, "Response does not match a chart endpoint");
            return;
        };
        if !(200..300).contains(&response.status_code) {
            tracing::debug!(
                slot = %slot,
                status_code = response.status_code,
                "Chart response with non-success status"
            );
        }
        self.resolve(slot, FetchSlot::succeeded(response.body));
    }

    fn resolve(&mut self, slot: DataSlotKind, value: FetchSlot) {
        let outcome = if value.is_succeeded() { "succeeded" } else { "failed" };
        match self.machine.resolve(slot, value) {
            Resolution::Ignored => {
                tracing::debug!(slot = %slot, "Slot already resolved, ignoring");
            }
            Resolution::Applied | Resolution::Completed => {
                metrics::counter!("harvest_slots_resolved_total", "outcome" => outcome)
                    .increment(1);
                tracing::debug!(
                    slot = %slot,
                    outcome,
                    resolved = self.machine.page().resolved_count(),
                    total = self.machine.page().total_slots(),
                    "Slot resolved"
                );
            }
        }
    }

    fn on_deadline(&mut self) {
        if let Some(failed) = self.machine.expire() {
            metrics::counter!("harvest_slots_resolved_total", "outcome" => "failed")
                .increment(failed as u64);
            tracing::warn!(failed_slots = failed, "Collection deadline reached");
        }
    }

    fn complete(&mut self) {
        let page = self.machine.page().as_ref().clone();
        let outcome = if page.is_fully_successful() {
            "complete"
        } else if page.succeeded_count() > 0 {
            "partial"
        } else {
            "failed"
        };
        metrics::counter!("harvest_collections_completed_total", "outcome" => outcome)
            .increment(1);
        tracing::info!(
            succeeded = page.succeeded_count(),
            total = page.total_slots(),
            outcome,
            "Collection completed"
        );

        if let Some(tx) = self.completion.take() {
            let _ = tx.send(page);
        }
    }
}

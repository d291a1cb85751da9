//! Per-visit collection state.

use crate::model::{DataSlotKind, FetchSlot, InstrumentId, PageData};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Reason recorded on slots still pending at the deadline.
pub const DEADLINE_EXCEEDED: &str = "deadline exceeded";

/// Lifecycle of one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionState {
    /// No collection started
    Idle,
    /// Steps still firing
    Active,
    /// All steps fired, waiting for remaining responses
    Draining,
    /// Terminal; final page data emitted
    Completed,
}

/// Effect of feeding a slot resolution into the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Slot was already resolved, or the collection is over
    Ignored,
    /// Slot resolved; other slots still pending
    Applied,
    /// Slot resolved and the page is now complete
    Completed,
}

/// Single-writer state for one collection.
///
/// Owned by the collection task; every transition goes through here.
#[derive(Debug, Clone)]
pub(crate) struct CollectionMachine {
    state: CollectionState,
    page: Arc<PageData>,
    steps_fired: usize,
    total_steps: usize,
}

impl CollectionMachine {
    pub(crate) fn new(instrument: InstrumentId, total_steps: usize) -> Self {
        Self {
            state: CollectionState::Active,
            page: Arc::new(PageData::new(instrument)),
            steps_fired: 0,
            total_steps,
        }
    }

    pub(crate) fn state(&self) -> CollectionState {
        self.state
    }

    pub(crate) fn page(&self) -> &Arc<PageData> {
        &self.page
    }

    pub(crate) fn steps_fired(&self) -> usize {
        self.steps_fired
    }

    pub(crate) fn is_completed(&self) -> bool {
        self.state == CollectionState::Completed
    }

    /// Record that a step timer fired. The last step moves `Active` to
    /// `Draining`.
    pub(crate) fn step_fired(&mut self) {
        if self.is_completed() {
            return;
        }
        self.steps_fired += 1;
        if self.steps_fired >= self.total_steps && self.state == CollectionState::Active {
            self.state = CollectionState::Draining;
        }
    }

    /// Resolve `slot` if it is still pending.
    pub(crate) fn resolve(&mut self, slot: DataSlotKind, value: FetchSlot) -> Resolution {
        if self.is_completed() || self.page.slot(slot).is_resolved() || value.is_pending() {
            return Resolution::Ignored;
        }

        self.page = Arc::new(self.page.with_slot(slot, value));
        if self.page.is_complete() {
            self.state = CollectionState::Completed;
            Resolution::Completed
        } else {
            Resolution::Applied
        }
    }

    /// Fail every pending slot and complete. Returns the number of slots
    /// that were failed, or `None` if already completed.
    pub(crate) fn expire(&mut self) -> Option<usize> {
        if self.is_completed() {
            return None;
        }
        let pending = self.page.total_slots() - self.page.resolved_count();
        self.page = Arc::new(self.page.with_pending_failed(DEADLINE_EXCEEDED));
        self.state = CollectionState::Completed;
        Some(pending)
    }
}

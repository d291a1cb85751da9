//! Per-visit slot state.

use super::{DataSlotKind, InstrumentId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resolution status of one data slot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchSlot {
    /// No response captured yet
    #[default]
    Pending,
    /// Response body captured for this slot
    Succeeded { payload: String },
    /// Slot gave up (control missing, interaction failed, deadline)
    Failed { reason: String },
}

impl FetchSlot {
    pub fn succeeded(payload: impl Into<String>) -> Self {
        FetchSlot::Succeeded {
            payload: payload.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        FetchSlot::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, FetchSlot::Pending)
    }

    pub fn is_resolved(&self) -> bool {
        !self.is_pending()
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, FetchSlot::Succeeded { .. })
    }

    /// Captured payload, if the slot succeeded.
    pub fn payload(&self) -> Option<&str> {
        match self {
            FetchSlot::Succeeded { payload } => Some(payload),
            _ => None,
        }
    }
}

/// Immutable snapshot of every slot for one page visit.
///
/// Resolving a slot produces a new `PageData`; existing snapshots never
/// change, so readers may hold one without coordination.
///
/// # Examples
///
/// ```
/// use chart_harvest::model::{DataSlotKind, FetchSlot, InstrumentId, PageData};
///
/// let page = PageData::new(InstrumentId::new("42").unwrap());
/// let next = page.with_slot(DataSlotKind::Max, FetchSlot::succeeded("{}"));
///
/// assert_eq!(page.resolved_count(), 0);
/// assert_eq!(next.resolved_count(), 1);
///
/// // A resolved slot never changes again
/// let again = next.with_slot(DataSlotKind::Max, FetchSlot::failed("late"));
/// assert!(again.slot(DataSlotKind::Max).is_succeeded());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PageDataRepr", into = "PageDataRepr")]
pub struct PageData {
    instrument: InstrumentId,
    slots: [FetchSlot; 7],
}

impl PageData {
    /// Empty aggregate with every slot pending.
    pub fn new(instrument: InstrumentId) -> Self {
        Self {
            instrument,
            slots: Default::default(),
        }
    }

    pub fn instrument(&self) -> &InstrumentId {
        &self.instrument
    }

    pub fn slot(&self, kind: DataSlotKind) -> &FetchSlot {
        &self.slots[kind.index()]
    }

    /// Slots paired with their kind, in fixed slot order.
    pub fn slots(&self) -> impl Iterator<Item = (DataSlotKind, &FetchSlot)> {
        DataSlotKind::ALL
            .into_iter()
            .map(move |kind| (kind, &self.slots[kind.index()]))
    }

    /// Copy of this aggregate with `kind` set to `slot`.
    ///
    /// Returns an unchanged copy when `kind` is already resolved or when
    /// `slot` is `Pending`.
    pub fn with_slot(&self, kind: DataSlotKind, slot: FetchSlot) -> Self {
        let mut next = self.clone();
        if self.slot(kind).is_pending() && slot.is_resolved() {
            next.slots[kind.index()] = slot;
        }
        next
    }

    /// Copy with every pending slot failed with `reason`.
    pub fn with_pending_failed(&self, reason: &str) -> Self {
        let mut next = self.clone();
        for slot in next.slots.iter_mut().filter(|s| s.is_pending()) {
            *slot = FetchSlot::failed(reason);
        }
        next
    }

    pub fn total_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn resolved_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_resolved()).count()
    }

    pub fn succeeded_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_succeeded()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(FetchSlot::is_resolved)
    }

    pub fn is_fully_successful(&self) -> bool {
        self.slots.iter().all(FetchSlot::is_succeeded)
    }
}

/// Wire form: slots keyed by name, missing slots read back as pending.
#[derive(Serialize, Deserialize)]
struct PageDataRepr {
    instrument: InstrumentId,
    #[serde(default)]
    slots: BTreeMap<DataSlotKind, FetchSlot>,
}

impl From<PageDataRepr> for PageData {
    fn from(repr: PageDataRepr) -> Self {
        let mut page = PageData::new(repr.instrument);
        for (kind, slot) in repr.slots {
            page.slots[kind.index()] = slot;
        }
        page
    }
}

impl From<PageData> for PageDataRepr {
    fn from(page: PageData) -> Self {
        let slots = DataSlotKind::ALL
            .into_iter()
            .zip(page.slots)
            .collect::<BTreeMap<_, _>>();
        Self {
            instrument: page.instrument,
            slots,
        }
    }
}

//! Mark lifecycle ledger
//!
//! Tracks every highlight mark the host currently knows about, keyed by
//! span. Entries step through an explicit lifecycle: `PendingCreate` until
//! the host hands back an identifier, `Active` while the span keeps being
//! observed, `PendingDelete` once it disappears. The ledger holds state for
//! one buffer session and is discarded wholesale when that session ends.

use std::collections::{btree_map, BTreeMap};

use crate::span::SourceSpan;

/// Opaque identifier the host returns for a created mark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkId(pub u64);

/// Lifecycle state of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkState {
    /// Inserted this cycle (or create failed on transport); no host mark yet
    PendingCreate,
    /// Host mark exists and matched a fact in the most recent cycle
    Active,
    /// Span disappeared; delete call is in flight this cycle
    PendingDelete,
}

/// Per-span mark bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkRecord {
    pub state: MarkState,
    /// Unset until the create call succeeds. May go stale if a delete fails
    /// on transport and the span is then re-observed; that is safe because
    /// an observed entry is never re-created.
    pub external_id: Option<MarkId>,
    pub(crate) observed: bool,
}

impl MarkRecord {
    fn fresh() -> Self {
        Self {
            state: MarkState::PendingCreate,
            external_id: None,
            observed: true,
        }
    }
}

/// Span-keyed mark map for one buffer session.
///
/// The ledger is the only mutable state shared between cycles. All
/// transitions happen inside the reconcile/drive passes; callers outside the
/// cycle get read access only.
#[derive(Debug, Default)]
pub struct MarkLedger {
    records: BTreeMap<SourceSpan, MarkRecord>,
}

impl MarkLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, span: &SourceSpan) -> Option<&MarkRecord> {
        self.records.get(span)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, SourceSpan, MarkRecord> {
        self.records.iter()
    }

    /// Drop all entries without issuing host calls. The host clears its own
    /// marks when the buffer session ends.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Start the Observe pass: reset per-cycle observation flags
    pub(crate) fn begin_cycle(&mut self) {
        for record in self.records.values_mut() {
            record.observed = false;
        }
    }

    /// Record that `span` was produced by the current classification pass.
    /// Unknown spans enter the ledger as `PendingCreate`; known spans are
    /// flagged observed whatever their state.
    pub(crate) fn observe(&mut self, span: SourceSpan) {
        self.records
            .entry(span)
            .and_modify(|r| r.observed = true)
            .or_insert_with(MarkRecord::fresh);
    }

    /// Spans still awaiting their first successful create call, in span order
    pub(crate) fn pending_creates(&self) -> Vec<SourceSpan> {
        self.records
            .iter()
            .filter(|(_, r)| r.observed && r.state == MarkState::PendingCreate)
            .map(|(span, _)| *span)
            .collect()
    }

    /// Close the Retire pass over everything not observed this cycle.
    ///
    /// Entries with a host identifier transition to `PendingDelete` and are
    /// returned for deletion. Entries whose create never succeeded have
    /// nothing host-side and are dropped here directly.
    pub(crate) fn retire_unobserved(&mut self) -> Vec<(SourceSpan, MarkId)> {
        let mut deletions = Vec::new();
        self.records.retain(|span, record| {
            if record.observed {
                return true;
            }
            match record.external_id {
                Some(id) => {
                    record.state = MarkState::PendingDelete;
                    deletions.push((*span, id));
                    true
                }
                None => {
                    tracing::debug!("retiring {:?} before it ever reached the host", span);
                    false
                }
            }
        });
        deletions
    }

    /// Settle a successful create: store the host identifier, go `Active`
    pub(crate) fn settle_created(&mut self, span: &SourceSpan, id: MarkId) {
        if let Some(record) = self.records.get_mut(span) {
            record.external_id = Some(id);
            record.state = MarkState::Active;
        }
    }

    /// Settle a successful delete: the entry leaves the ledger
    pub(crate) fn settle_deleted(&mut self, span: &SourceSpan) {
        self.records.remove(span);
    }

    /// A delete failed on transport: revert to the pre-operation state so the
    /// Retire rule picks the entry up again next cycle
    pub(crate) fn settle_delete_failed(&mut self, span: &SourceSpan) {
        if let Some(record) = self.records.get_mut(span) {
            record.state = MarkState::Active;
        }
    }

    /// The host refused this entry outright; drop it
    pub(crate) fn drop_entry(&mut self, span: &SourceSpan) {
        self.records.remove(span);
    }
}

//! Host-facing mark driver
//!
//! Translates reconciler output into synchronous calls against the
//! highlighting surface and settles each outcome into the ledger. One call
//! per operation, in plan order, no batching or reordering: cycle-level
//! batching is already expressed in the operation list itself.

use thiserror::Error;

use crate::ledger::{MarkId, MarkLedger};
use crate::reconcile::MarkOp;
use crate::span::Category;

/// Failures surfaced by the highlighting host
#[derive(Debug, Error)]
pub enum HostError {
    /// Transport-level failure; the same operation may succeed if retried
    #[error("highlight host unavailable: {0}")]
    Unavailable(String),
    /// The host refused the request; retrying the same request cannot succeed
    #[error("highlight host rejected request: {0}")]
    Rejected(String),
}

/// The external highlighting surface.
///
/// Both calls are synchronous round-trips bounded by the host's own timeout
/// behavior. `delete_mark` only fails with [`HostError::Unavailable`];
/// `create_mark` may also be rejected outright (for example, a category the
/// host has no group for).
pub trait HighlightSurface {
    /// Create a mark and return the host's identifier for it
    fn create_mark(
        &mut self,
        category: Category,
        line: u32,
        column: u32,
        length: u32,
    ) -> Result<MarkId, HostError>;

    /// Delete a previously created mark
    fn delete_mark(&mut self, id: MarkId) -> Result<(), HostError>;
}

/// Per-cycle driver outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveOutcome {
    /// Marks created at the host this cycle
    pub created: usize,
    /// Marks deleted at the host this cycle
    pub deleted: usize,
    /// Operations that hit a transport failure and stay queued for retry
    pub unavailable: usize,
    /// Creates the host rejected; their entries are gone and not retried
    pub rejected: usize,
}

/// Executes mark operations against a [`HighlightSurface`]
pub struct HighlightDriver<S> {
    surface: S,
}

impl<S: HighlightSurface> HighlightDriver<S> {
    pub fn new(surface: S) -> Self {
        Self { surface }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_inner(self) -> S {
        self.surface
    }

    /// Execute `ops` in order and settle each result into the ledger.
    ///
    /// Failures are absorbed here, never propagated: a transport failure
    /// leaves the entry in its pre-operation state so the next cycle retries
    /// it, a rejection drops the entry. The cycle always runs to completion.
    pub fn apply(&mut self, ledger: &mut MarkLedger, ops: &[MarkOp]) -> DriveOutcome {
        let mut outcome = DriveOutcome::default();

        for op in ops {
            match *op {
                MarkOp::Create(span) => {
                    match self
                        .surface
                        .create_mark(span.category, span.line, span.column, span.length)
                    {
                        Ok(id) => {
                            tracing::debug!(
                                "created {} mark {:?} at {}:{} len {}",
                                span.category,
                                id,
                                span.line,
                                span.column,
                                span.length
                            );
                            ledger.settle_created(&span, id);
                            outcome.created += 1;
                        }
                        Err(HostError::Unavailable(reason)) => {
                            // entry stays PendingCreate; retried next cycle
                            tracing::warn!("create failed for {:?}: {}", span, reason);
                            outcome.unavailable += 1;
                        }
                        Err(HostError::Rejected(reason)) => {
                            tracing::warn!("host rejected {:?}: {}", span, reason);
                            ledger.drop_entry(&span);
                            outcome.rejected += 1;
                        }
                    }
                }
                MarkOp::Delete { span, id } => match self.surface.delete_mark(id) {
                    Ok(()) => {
                        tracing::debug!("deleted mark {:?} for {:?}", id, span);
                        ledger.settle_deleted(&span);
                        outcome.deleted += 1;
                    }
                    Err(HostError::Unavailable(reason)) => {
                        tracing::warn!("delete failed for mark {:?}: {}", id, reason);
                        ledger.settle_delete_failed(&span);
                        outcome.unavailable += 1;
                    }
                    Err(HostError::Rejected(reason)) => {
                        // the delete contract only admits transport failures;
                        // a rejection means the mark is already gone host-side
                        tracing::warn!("host rejected delete of mark {:?}: {}", id, reason);
                        ledger.settle_deleted(&span);
                        outcome.rejected += 1;
                    }
                },
            }
        }

        outcome
    }
}

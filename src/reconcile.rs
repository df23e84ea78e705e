//! Fact-set reconciliation
//!
//! The three-phase Observe / Create / Retire sweep: diff the freshly
//! computed fact set against the mark ledger and emit the host operations
//! that close the gap. Reconciliation never touches the host itself; the
//! driver executes the plan, which keeps the diff testable in isolation.

use crate::ledger::{MarkId, MarkLedger};
use crate::span::{FactSet, SourceSpan};

/// A host operation planned by one reconciliation cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOp {
    /// Create a mark for a span first observed (or still unrealized) this cycle
    Create(SourceSpan),
    /// Delete the mark for a span that is no longer present in the buffer
    Delete { span: SourceSpan, id: MarkId },
}

/// Diff `facts` against the ledger and plan the cycle's host operations.
///
/// - **Observe**: every fact is flagged in the ledger; unknown spans enter
///   as `PendingCreate`.
/// - **Create**: every observed `PendingCreate` entry yields a create
///   operation. Entries that are already `Active` yield nothing, so call
///   volume tracks the edit delta rather than buffer size.
/// - **Retire**: every entry the classifier no longer produces yields a
///   delete operation in this same cycle; no entry may persist unobserved
///   into the next cycle.
///
/// Creates are emitted before deletes. The contract permits any order; a
/// fixed one keeps cycles reproducible.
pub fn reconcile(ledger: &mut MarkLedger, facts: &FactSet) -> Vec<MarkOp> {
    ledger.begin_cycle();
    for &span in facts {
        ledger.observe(span);
    }

    let mut ops = Vec::new();

    for span in ledger.pending_creates() {
        ops.push(MarkOp::Create(span));
    }

    for (span, id) in ledger.retire_unobserved() {
        ops.push(MarkOp::Delete { span, id });
    }

    ops
}

//! Reconciliation engine
//!
//! One buffer-change notification = one cycle: fetch the buffer text, parse,
//! classify, reconcile, drive. The engine is single-threaded and processes
//! each notification to completion; taking `&mut self` keeps at most one
//! cycle in flight. Queuing of notifications that arrive mid-cycle is the
//! caller's concern.

use tree_sitter::Tree;

use crate::classify::classify;
use crate::driver::{HighlightDriver, HighlightSurface};
use crate::ledger::MarkLedger;
use crate::reconcile::reconcile;

/// Supplies the current buffer contents, one entry per line.
/// Invoked exactly once per cycle, before parsing.
pub trait SourceProvider {
    fn current_text(&mut self) -> Vec<String>;
}

/// Produces a syntax tree from buffer text.
///
/// `None` means no usable tree was produced; the cycle then leaves the
/// existing highlight state untouched rather than clearing it, so transient
/// syntax errors while typing do not flicker.
pub trait SourceParser {
    fn parse(&mut self, source: &str) -> Option<Tree>;
}

/// Outcome of one reconciliation cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Whether the parse step produced a tree this cycle
    pub parsed: bool,
    /// Facts computed by classification
    pub facts: usize,
    /// Marks created at the host
    pub created: usize,
    /// Marks deleted at the host
    pub deleted: usize,
    /// Operations that hit a transport failure and will be retried
    pub unavailable: usize,
    /// Creates the host rejected (dropped, not retried)
    pub rejected: usize,
}

/// Drives the parse → classify → reconcile → apply cycle for one buffer
pub struct Engine<Src, P, S> {
    provider: Src,
    parser: P,
    ledger: MarkLedger,
    driver: HighlightDriver<S>,
}

impl<Src, P, S> Engine<Src, P, S>
where
    Src: SourceProvider,
    P: SourceParser,
    S: HighlightSurface,
{
    pub fn new(provider: Src, parser: P, surface: S) -> Self {
        Self {
            provider,
            parser,
            ledger: MarkLedger::new(),
            driver: HighlightDriver::new(surface),
        }
    }

    /// Run exactly one reconciliation cycle.
    ///
    /// Failures never propagate out of a cycle: a failed parse degrades to a
    /// no-op, host failures are absorbed into ledger state and retried on
    /// the next call.
    pub fn buffer_changed(&mut self) -> CycleReport {
        let lines = self.provider.current_text();
        let source = lines.join("\n");

        let Some(tree) = self.parser.parse(&source) else {
            tracing::warn!("parse produced no tree; keeping previous highlight state");
            return CycleReport::default();
        };

        let facts = classify(&tree, &source);
        let ops = reconcile(&mut self.ledger, &facts);
        let outcome = self.driver.apply(&mut self.ledger, &ops);

        tracing::debug!(
            "cycle complete: {} facts, {} created, {} deleted, {} pending retry",
            facts.len(),
            outcome.created,
            outcome.deleted,
            outcome.unavailable
        );

        CycleReport {
            parsed: true,
            facts: facts.len(),
            created: outcome.created,
            deleted: outcome.deleted,
            unavailable: outcome.unavailable,
            rejected: outcome.rejected,
        }
    }

    /// End the buffer session: discard all mark state without host calls.
    /// The host drops its own marks along with the buffer.
    pub fn end_session(&mut self) {
        tracing::debug!("session ended; discarding {} ledger entries", self.ledger.len());
        self.ledger.clear();
    }

    /// Current mark ledger, for inspection
    pub fn ledger(&self) -> &MarkLedger {
        &self.ledger
    }

    pub fn surface(&self) -> &S {
        self.driver.surface()
    }

    pub fn surface_mut(&mut self) -> &mut S {
        self.driver.surface_mut()
    }
}

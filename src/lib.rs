//! gomark - incremental highlight reconciliation for Go buffers
//!
//! This crate keeps a remote highlighting surface (an editor host that
//! understands "create mark" / "delete mark" calls) in sync with the syntax
//! of a Go buffer that is being edited. There is no incremental tree diffing:
//! every buffer-change notification re-parses the buffer from scratch, and
//! the interesting work is making that cheap on the host side.
//!
//! ## Architecture
//!
//! ```text
//! buffer changed → SourceProvider::current_text
//!               → SourceParser::parse            (tree-sitter-go)
//!               → classify                       (tree → FactSet)
//!               → reconcile                      (FactSet × MarkLedger → ops)
//!               → HighlightDriver::apply         (ops → host calls)
//! ```
//!
//! The reconciler guarantees that host call volume is proportional to the
//! edit delta, not to buffer size: a span that keeps being observed is never
//! re-sent, a span that disappears is deleted in the same cycle, and a span
//! that appears is created exactly once.

pub mod classify;
pub mod driver;
pub mod engine;
pub mod ledger;
pub mod parse;
pub mod reconcile;
pub mod span;

// Re-export commonly used types
pub use classify::classify;
pub use driver::{DriveOutcome, HighlightDriver, HighlightSurface, HostError};
pub use engine::{CycleReport, Engine, SourceParser, SourceProvider};
pub use ledger::{MarkId, MarkLedger, MarkRecord, MarkState};
pub use parse::GoParser;
pub use reconcile::{reconcile, MarkOp};
pub use span::{Category, FactSet, SourceSpan};

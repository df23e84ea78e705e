//! End-to-end reconciliation cycle tests
//!
//! Exercises the engine against real Go parses, a scripted buffer, and a
//! fake host surface, covering the reconciliation contract: idempotence,
//! completeness, no leaks, span stability, and failure absorption.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use gomark::{
    Category, Engine, GoParser, HighlightSurface, HostError, MarkId, MarkState, SourceParser,
    SourceProvider,
};
use tree_sitter::Tree;

// ============================================================================
// Test collaborators
// ============================================================================

/// Buffer whose contents tests mutate between cycles
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<String>>>);

impl SharedBuffer {
    fn set(&self, text: &str) {
        *self.0.borrow_mut() = text.lines().map(String::from).collect();
    }
}

impl SourceProvider for SharedBuffer {
    fn current_text(&mut self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

/// Go parser that can be forced to fail for a cycle
struct FlakyParser {
    inner: GoParser,
    fail: Rc<Cell<bool>>,
}

impl FlakyParser {
    fn new(fail: Rc<Cell<bool>>) -> Self {
        Self {
            inner: GoParser::new().expect("go grammar should load"),
            fail,
        }
    }
}

impl SourceParser for FlakyParser {
    fn parse(&mut self, source: &str) -> Option<Tree> {
        if self.fail.get() {
            return None;
        }
        self.inner.parse(source)
    }
}

#[derive(Default)]
struct HostState {
    next_id: u64,
    creates: usize,
    deletes: usize,
    live: HashSet<MarkId>,
    offline: bool,
    reject_creates: bool,
}

/// Fake highlighting host: hands out sequential mark ids and tracks which
/// marks are currently live on its side
#[derive(Clone, Default)]
struct FakeHost(Rc<RefCell<HostState>>);

impl FakeHost {
    fn set_offline(&self, offline: bool) {
        self.0.borrow_mut().offline = offline;
    }

    fn set_reject_creates(&self, reject: bool) {
        self.0.borrow_mut().reject_creates = reject;
    }

    fn creates(&self) -> usize {
        self.0.borrow().creates
    }

    fn deletes(&self) -> usize {
        self.0.borrow().deletes
    }

    fn live_marks(&self) -> usize {
        self.0.borrow().live.len()
    }
}

impl HighlightSurface for FakeHost {
    fn create_mark(
        &mut self,
        _category: Category,
        _line: u32,
        _column: u32,
        _length: u32,
    ) -> Result<MarkId, HostError> {
        let mut host = self.0.borrow_mut();
        if host.offline {
            return Err(HostError::Unavailable("host offline".into()));
        }
        if host.reject_creates {
            return Err(HostError::Rejected("unknown highlight group".into()));
        }
        host.creates += 1;
        host.next_id += 1;
        let id = MarkId(host.next_id);
        host.live.insert(id);
        Ok(id)
    }

    fn delete_mark(&mut self, id: MarkId) -> Result<(), HostError> {
        let mut host = self.0.borrow_mut();
        if host.offline {
            return Err(HostError::Unavailable("host offline".into()));
        }
        host.deletes += 1;
        host.live.remove(&id);
        Ok(())
    }
}

type TestEngine = Engine<SharedBuffer, FlakyParser, FakeHost>;

struct Fixture {
    engine: TestEngine,
    buffer: SharedBuffer,
    host: FakeHost,
    parse_fail: Rc<Cell<bool>>,
}

fn fixture(text: &str) -> Fixture {
    let buffer = SharedBuffer::default();
    buffer.set(text);
    let host = FakeHost::default();
    let parse_fail = Rc::new(Cell::new(false));
    let engine = Engine::new(
        buffer.clone(),
        FlakyParser::new(parse_fail.clone()),
        host.clone(),
    );
    Fixture {
        engine,
        buffer,
        host,
        parse_fail,
    }
}

fn active_count(engine: &TestEngine) -> usize {
    engine
        .ledger()
        .iter()
        .filter(|(_, r)| r.state == MarkState::Active)
        .count()
}

const HELLO_WORLD: &str = "\
package main

import \"fmt\"

func main() {
	for i := 0; i < 3; i++ {
		fmt.Println(\"tick\")
	}
}
";

// ============================================================================
// Completeness and idempotence
// ============================================================================

#[test]
fn test_first_cycle_creates_one_mark_per_fact() {
    let mut f = fixture(HELLO_WORLD);

    let report = f.engine.buffer_changed();

    assert!(report.parsed);
    assert!(report.facts > 0, "fixture should produce facts");
    assert_eq!(report.created, report.facts);
    assert_eq!(report.deleted, 0);
    assert_eq!(f.host.creates(), report.facts);
    assert_eq!(f.engine.ledger().len(), report.facts);
    assert_eq!(active_count(&f.engine), report.facts, "all records Active");
}

#[test]
fn test_unchanged_buffer_issues_zero_host_calls() {
    let mut f = fixture(HELLO_WORLD);
    f.engine.buffer_changed();
    let creates_before = f.host.creates();

    let report = f.engine.buffer_changed();

    assert_eq!(report.created, 0);
    assert_eq!(report.deleted, 0);
    assert_eq!(f.host.creates(), creates_before, "no re-sends in steady state");
    assert_eq!(f.host.deletes(), 0);
}

#[test]
fn test_persisting_facts_keep_their_external_ids() {
    let mut f = fixture(HELLO_WORLD);
    f.engine.buffer_changed();
    let ids_before: Vec<(gomark::SourceSpan, Option<MarkId>)> = f
        .engine
        .ledger()
        .iter()
        .map(|(span, r)| (*span, r.external_id))
        .collect();

    f.engine.buffer_changed();
    let ids_after: Vec<(gomark::SourceSpan, Option<MarkId>)> = f
        .engine
        .ledger()
        .iter()
        .map(|(span, r)| (*span, r.external_id))
        .collect();

    assert_eq!(ids_before, ids_after, "no spurious delete+recreate");
}

// ============================================================================
// Edit deltas
// ============================================================================

#[test]
fn test_edit_delta_drives_proportional_host_calls() {
    let mut f = fixture("package main\n\nvar a = \"hello\"\n");
    let report = f.engine.buffer_changed();
    assert_eq!(report.created, 3, "package, var, string literal");

    // the string literal becomes a number, a second declaration appears
    f.buffer.set("package main\n\nvar a = 1\nvar b = 2\n");
    let report = f.engine.buffer_changed();

    assert_eq!(report.created, 1, "only the new var keyword is created");
    assert_eq!(report.deleted, 1, "only the string literal is deleted");
    assert_eq!(f.engine.ledger().len(), 3);
    assert_eq!(active_count(&f.engine), 3);
    assert_eq!(f.host.live_marks(), 3, "host state tracks the ledger");
}

#[test]
fn test_cleared_buffer_deletes_everything() {
    let mut f = fixture(HELLO_WORLD);
    let report = f.engine.buffer_changed();
    let total = report.created;

    f.buffer.set("");
    let report = f.engine.buffer_changed();

    assert_eq!(report.created, 0);
    assert_eq!(report.deleted, total);
    assert!(f.engine.ledger().is_empty(), "no leaked ledger entries");
    assert_eq!(f.host.live_marks(), 0, "no leaked host marks");
}

// ============================================================================
// Parse failure
// ============================================================================

#[test]
fn test_parse_failure_is_a_no_op_cycle() {
    let mut f = fixture(HELLO_WORLD);
    f.engine.buffer_changed();
    let snapshot: Vec<(gomark::SourceSpan, Option<MarkId>)> = f
        .engine
        .ledger()
        .iter()
        .map(|(span, r)| (*span, r.external_id))
        .collect();
    let creates_before = f.host.creates();

    // mid-edit the parse produces nothing; highlights must be retained
    f.parse_fail.set(true);
    f.buffer.set("package main\n\nfunc broken(((\n");
    let report = f.engine.buffer_changed();

    assert!(!report.parsed);
    assert_eq!(report.created + report.deleted, 0);
    assert_eq!(f.host.creates(), creates_before);
    assert_eq!(f.host.deletes(), 0);
    let after: Vec<(gomark::SourceSpan, Option<MarkId>)> = f
        .engine
        .ledger()
        .iter()
        .map(|(span, r)| (*span, r.external_id))
        .collect();
    assert_eq!(snapshot, after, "ledger unchanged by the failed cycle");
}

// ============================================================================
// Host failure absorption
// ============================================================================

#[test]
fn test_creates_are_retried_once_the_host_recovers() {
    let mut f = fixture("package main\n");
    f.host.set_offline(true);

    let report = f.engine.buffer_changed();
    assert_eq!(report.created, 0);
    assert_eq!(report.unavailable, 1);
    assert!(f
        .engine
        .ledger()
        .iter()
        .all(|(_, r)| r.state == MarkState::PendingCreate));

    f.host.set_offline(false);
    let report = f.engine.buffer_changed();
    assert_eq!(report.created, 1, "exactly one retry, no duplicates");
    assert_eq!(active_count(&f.engine), 1);
}

#[test]
fn test_deletes_are_retried_once_the_host_recovers() {
    let mut f = fixture("package main\n\nvar a = \"hello\"\n");
    f.engine.buffer_changed();

    f.host.set_offline(true);
    f.buffer.set("package main\n");
    let report = f.engine.buffer_changed();
    assert_eq!(report.deleted, 0);
    assert_eq!(report.unavailable, 2, "var and string deletes both failed");
    assert_eq!(
        f.engine.ledger().len(),
        3,
        "failed deletes stay in the ledger with stale ids"
    );

    f.host.set_offline(false);
    let report = f.engine.buffer_changed();
    assert_eq!(report.deleted, 2);
    assert_eq!(f.engine.ledger().len(), 1, "only the package clause remains");
    assert_eq!(f.host.live_marks(), 1);
}

#[test]
fn test_rejected_creates_are_dropped_not_retried_within_the_cycle() {
    let mut f = fixture("package main\n");
    f.host.set_reject_creates(true);

    let report = f.engine.buffer_changed();

    assert_eq!(report.rejected, 1);
    assert_eq!(report.created, 0);
    assert!(
        f.engine.ledger().is_empty(),
        "a rejected record leaves the ledger"
    );

    // once the host accepts the category again, the fact re-enters cleanly
    f.host.set_reject_creates(false);
    let report = f.engine.buffer_changed();
    assert_eq!(report.created, 1);
}

// ============================================================================
// Session lifecycle
// ============================================================================

#[test]
fn test_end_session_discards_state_without_host_calls() {
    let mut f = fixture(HELLO_WORLD);
    f.engine.buffer_changed();
    let deletes_before = f.host.deletes();

    f.engine.end_session();

    assert!(f.engine.ledger().is_empty());
    assert_eq!(f.host.deletes(), deletes_before);
}

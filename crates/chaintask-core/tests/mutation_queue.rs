use std::cell::Cell;
use std::rc::Rc;

use chaintask_core::session::SessionManager;
use chaintask_core::sim::{SimLedger, SimWallet};
use chaintask_core::sync::{MutationOutcome, RefreshOutcome, TaskSynchronizer};
use chaintask_core::{ContractAddress, Identity};

fn alice() -> Identity {
    Identity::new("0xa11ce00000000000000000000000000000000001")
}

fn setup() -> (SimLedger, Rc<SessionManager>, TaskSynchronizer) {
    let ledger = SimLedger::new();
    let wallet = Rc::new(SimWallet::new(ledger.clone(), vec![alice()]));
    let session = Rc::new(SessionManager::new(wallet));
    let sync = TaskSynchronizer::new(session.clone(), ContractAddress::default());
    (ledger, session, sync)
}

#[tokio::test]
async fn queued_mutation_is_dropped_when_session_ends() {
    let (ledger, session, sync) = setup();
    session.connect().await.expect("connect");
    let gate = ledger.hold_confirmations();

    let (first, second, ()) = tokio::join!(sync.add_task("A", "1"), sync.add_task("B", "2"), async {
        session.disconnect();
        gate.notify_one();
    });

    assert_eq!(
        first,
        Ok(MutationOutcome::Confirmed {
            refresh: Ok(RefreshOutcome::Discarded)
        })
    );
    assert_eq!(second, Ok(MutationOutcome::Skipped));
    assert_eq!(ledger.submission_count(), 1);
    assert!(sync.visible_tasks().is_empty());
}

#[tokio::test]
async fn duplicate_delete_while_in_flight_is_coalesced() {
    let (ledger, session, sync) = setup();
    let id = ledger.seed(&alice(), "t", "b");
    session.connect().await.expect("connect");
    let gate = ledger.hold_confirmations();

    let (first, second, ()) = tokio::join!(sync.delete_task(id), sync.delete_task(id), async {
        gate.notify_one();
    });

    assert!(matches!(first, Ok(MutationOutcome::Confirmed { .. })));
    assert_eq!(second, Ok(MutationOutcome::Coalesced));
    assert_eq!(ledger.submission_count(), 1);
    assert!(ledger.records(&alice())[0].is_deleted);
}

#[tokio::test]
async fn same_payload_after_completion_is_submitted_again() {
    let (ledger, session, sync) = setup();
    session.connect().await.expect("connect");

    sync.add_task("T", "B").await.expect("first");
    sync.add_task("T", "B").await.expect("second");

    assert_eq!(ledger.submission_count(), 2);
    assert_eq!(sync.visible_tasks().len(), 2);
    assert_eq!(sync.pending_mutations(), 0);
}

#[tokio::test]
async fn mirror_is_scoped_to_reading_identity() {
    let (ledger, session, sync) = setup();
    ledger.seed(&alice(), "mine", "only");
    session.connect().await.expect("connect");
    sync.refresh().await.expect("refresh");
    assert_eq!(sync.mirror().owner(), Some(&alice()));

    session.disconnect();
    assert!(sync.visible_tasks().is_empty());
    assert_eq!(sync.refresh().await, Ok(RefreshOutcome::NoSession));
}

#[tokio::test]
async fn queue_hook_sees_enter_and_leave() {
    let (_ledger, session, sync) = setup();
    session.connect().await.expect("connect");
    let seen = Rc::new(Cell::new(0usize));
    let counter = seen.clone();
    sync.set_queue_hook(Some(Rc::new(move || counter.set(counter.get() + 1))));

    sync.add_task("T", "B").await.expect("add");
    assert_eq!(seen.get(), 2);

    sync.refresh().await.expect("refresh");
    assert_eq!(seen.get(), 2);
}

//! Reconciliation engine tests against the scripted fake module.

use std::time::Duration;

use relayd_core::reconcile::Reconciler;
use relayd_core::session::slot::SessionSlot;
use relayd_core::RelayStates;
use relayd_test_utils::fake_module::{FailureMode, FakeConnector};

const LONG_DRIFT: Duration = Duration::from_secs(3600);

fn request(pairs: &[(usize, bool)]) -> RelayStates {
    let mut states = RelayStates::new();
    for &(index, on) in pairs {
        states.set(index, on);
    }
    states
}

fn slot() -> SessionSlot<FakeConnector> {
    SessionSlot::new(FakeConnector::new("admin", "admin"))
}

#[tokio::test]
async fn unknown_belief_forces_write() {
    let mut reconciler = Reconciler::new(LONG_DRIFT);
    let mut slot = slot();

    let wrote = reconciler
        .handle_request(request(&[(3, true)]), &mut slot)
        .await
        .unwrap();
    assert!(wrote);

    let belief = reconciler.belief().current().unwrap();
    assert_eq!(belief.get(3), Some(true));
    assert_eq!(belief.get(2), None);
    assert_eq!(slot.connector().written(), vec![0x08]);
}

#[tokio::test]
async fn repeated_request_within_drift_interval_skips_write() {
    let mut reconciler = Reconciler::new(LONG_DRIFT);
    let mut slot = slot();

    assert!(reconciler
        .handle_request(request(&[(3, true)]), &mut slot)
        .await
        .unwrap());
    assert!(!reconciler
        .handle_request(request(&[(3, true)]), &mut slot)
        .await
        .unwrap());
    assert_eq!(slot.connector().written(), vec![0x08]);
}

#[tokio::test]
async fn stale_nonzero_state_is_reasserted() {
    let mut reconciler = Reconciler::new(Duration::ZERO);
    let mut slot = slot();

    assert!(reconciler
        .handle_request(request(&[(3, true)]), &mut slot)
        .await
        .unwrap());
    // nothing changed, but the belief is already stale
    assert!(reconciler
        .handle_request(request(&[(3, true)]), &mut slot)
        .await
        .unwrap());
    assert_eq!(slot.connector().written(), vec![0x08, 0x08]);
}

#[tokio::test]
async fn all_off_state_is_never_reasserted() {
    let mut reconciler = Reconciler::new(Duration::ZERO);
    let mut slot = slot();

    assert!(reconciler
        .handle_request(request(&[(3, false)]), &mut slot)
        .await
        .unwrap());
    // target bitmask is zero, so staleness alone does not rewrite
    assert!(!reconciler
        .handle_request(request(&[(3, false)]), &mut slot)
        .await
        .unwrap());
    assert_eq!(slot.connector().written(), vec![0x00]);
}

#[tokio::test]
async fn merge_preserves_unrelated_relays() {
    let mut reconciler = Reconciler::new(LONG_DRIFT);
    let mut slot = slot();

    reconciler
        .handle_request(request(&[(3, true)]), &mut slot)
        .await
        .unwrap();
    reconciler
        .handle_request(request(&[(1, true)]), &mut slot)
        .await
        .unwrap();

    assert_eq!(slot.connector().written(), vec![0x08, 0x0a]);
    let belief = reconciler.belief().current().unwrap();
    assert_eq!(belief.get(3), Some(true));
    assert_eq!(belief.get(1), Some(true));
}

#[tokio::test]
async fn write_failure_keeps_belief_and_reconnects() {
    let connector = FakeConnector::new("admin", "admin");
    let mut slot = SessionSlot::new(connector);
    let mut reconciler = Reconciler::new(LONG_DRIFT);

    reconciler
        .handle_request(request(&[(3, true)]), &mut slot)
        .await
        .unwrap();

    slot.connector()
        .push_failure(FailureMode::DropOnWrite { after: 0 });
    slot.drop_session().await;

    let err = reconciler
        .handle_request(request(&[(1, true)]), &mut slot)
        .await
        .unwrap_err();
    assert!(err.drops_session());
    assert!(!slot.is_connected());

    // belief retains the last confirmed state, not the attempted one
    let belief = reconciler.belief().current().unwrap();
    assert_eq!(belief.get(3), Some(true));
    assert_eq!(belief.get(1), None);

    // retry goes through a fresh connect + login and succeeds
    let connects_before = slot.connector().connects();
    assert!(reconciler
        .handle_request(request(&[(1, true)]), &mut slot)
        .await
        .unwrap());
    assert!(slot.connector().connects() > connects_before);
    let belief = reconciler.belief().current().unwrap();
    assert_eq!(belief.get(1), Some(true));
    assert_eq!(belief.get(3), Some(true));
}

#[tokio::test]
async fn empty_request_with_known_belief_is_a_no_op() {
    let mut reconciler = Reconciler::new(LONG_DRIFT);
    let mut slot = slot();

    reconciler
        .handle_request(request(&[(0, true)]), &mut slot)
        .await
        .unwrap();
    assert!(!reconciler
        .handle_request(RelayStates::new(), &mut slot)
        .await
        .unwrap());
    assert_eq!(slot.connector().written(), vec![0x01]);
}

// Path: crates/validator/tests/block_event_loop.rs

use baker_api::signer::SigningDomain;
use baker_api::storage::{DelegateStore, NonceStore, RightsCache, WatermarkStore};
use baker_storage::RedbBakerStore;
use baker_test_utils::assertions::eventually;
use baker_test_utils::fakes::{FakeChainRpc, RecordingNotifier, RecordingSigner};
use baker_test_utils::fixtures::{self, block, store_with_delegate};
use baker_test_utils::randomness::TestRng;
use baker_types::status::Readiness;
use baker_types::{Nonce, OperationKind, RightEntry, SealRecord};
use baker_validator::{BakerServices, BakerSettings, BlockEventLoop, NotificationService};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{mpsc, watch};

struct Harness {
    _dir: TempDir,
    store: Arc<RedbBakerStore>,
    rpc: Arc<FakeChainRpc>,
    signer: Arc<RecordingSigner>,
    notifier: Arc<RecordingNotifier>,
    event_loop: BlockEventLoop,
}

fn settings() -> BakerSettings {
    BakerSettings {
        constants: fixtures::constants(),
        dry_run_bake: false,
        dry_run_endorse: false,
        prefetch_cycles_ahead: 1,
        max_baking_priority: 8,
        shutdown_grace: Duration::from_secs(2),
    }
}

fn harness_with(rpc: FakeChainRpc, settings: BakerSettings) -> Harness {
    let (dir, store) = store_with_delegate().unwrap();
    let rpc = Arc::new(rpc);
    let signer = Arc::new(RecordingSigner::new());
    let notifier = Arc::new(RecordingNotifier::new("recorder"));
    let notifications =
        Arc::new(NotificationService::new(store.clone()).with_notifier(notifier.clone()));
    let services = BakerServices {
        store: store.clone(),
        rpc: rpc.clone(),
        signer: signer.clone(),
        notifications,
        payouts: None,
    };
    Harness {
        _dir: dir,
        store,
        rpc,
        signer,
        notifier,
        event_loop: BlockEventLoop::new(services, settings),
    }
}

fn harness(rpc: FakeChainRpc) -> Harness {
    harness_with(rpc, settings())
}

#[tokio::test]
async fn bakes_once_and_refuses_the_repeat() {
    let mut h = harness(FakeChainRpc::new());
    h.store
        .save_rights_for_cycle(OperationKind::Bake, 6, &[RightEntry::baking(50, 0)])
        .unwrap();

    h.event_loop.on_block(block(49)).await;
    h.event_loop.wait_for_tasks().await;

    assert_eq!(h.rpc.injected_blocks(), vec!["B-block:50:0:false".to_string()]);
    assert_eq!(h.store.watermark(OperationKind::Bake).unwrap(), 50);
    let requests = h.signer.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].domain, SigningDomain::Block);
    assert_eq!(requests[0].payload[0], 0x01);

    h.event_loop.on_block(block(50)).await;
    h.event_loop.wait_for_tasks().await;

    // Same head again: the watermark refuses level 50.
    h.event_loop.on_block(block(49)).await;
    h.event_loop.wait_for_tasks().await;

    assert_eq!(h.rpc.injected_blocks().len(), 1);
    assert_eq!(h.signer.requests().len(), 1);
    assert!(h.store.pending_intents(OperationKind::Bake).unwrap().is_empty());
    assert!(h
        .notifier
        .messages()
        .iter()
        .any(|m| m.contains("Baked block") && m.contains("level 50")));
}

#[tokio::test]
async fn status_board_reflects_the_last_head() {
    let mut h = harness(FakeChainRpc::new());
    h.store
        .save_rights_for_cycle(OperationKind::Bake, 6, &[RightEntry::baking(50, 0), RightEntry::baking(55, 2)])
        .unwrap();
    let status = h.event_loop.status();

    h.event_loop.on_block(block(49)).await;
    h.event_loop.wait_for_tasks().await;
    h.event_loop.on_block(block(50)).await;
    h.event_loop.wait_for_tasks().await;

    let snapshot = status.borrow().clone();
    assert_eq!(snapshot.head_level, 50);
    assert_eq!(snapshot.head_cycle, 6);
    assert_eq!(snapshot.readiness, Readiness::Ready);
    assert_eq!(snapshot.next_baking, Some(RightEntry::baking(55, 2)));
    assert_eq!(
        snapshot.last_bake,
        Some(SealRecord {
            level: 50,
            hash: "B-block:50:0:false".into()
        })
    );
    assert_eq!(snapshot.last_endorsement, None);
}

#[tokio::test]
async fn endorses_the_head_level() {
    let mut h = harness(FakeChainRpc::new());
    h.store
        .save_rights_for_cycle(OperationKind::Endorse, 6, &[RightEntry::endorsing(49)])
        .unwrap();

    h.event_loop.on_block(block(49)).await;
    h.event_loop.wait_for_tasks().await;

    assert_eq!(h.rpc.injected_operations(), vec!["o-endorsement:49".to_string()]);
    assert_eq!(h.store.watermark(OperationKind::Endorse).unwrap(), 49);
    let requests = h.signer.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].domain, SigningDomain::Endorsement);
    // Magic byte, then the four chain id bytes, then the forged bytes.
    assert_eq!(&requests[0].payload[..5], &[0x02, 122, 6, 167, 112]);
    assert!(requests[0].payload.ends_with(b"endorsement:49"));
}

#[tokio::test]
async fn cancellation_before_submission_leaves_no_trace() {
    let mut h = harness(FakeChainRpc::new());
    h.store
        .save_rights_for_cycle(OperationKind::Bake, 6, &[RightEntry::baking(50, 0)])
        .unwrap();
    h.signer.set_delay(Duration::from_millis(300));

    h.event_loop.on_block(block(49)).await;
    let signer = h.signer.clone();
    assert!(eventually(Duration::from_secs(2), || signer.requests().len() == 1).await);

    h.event_loop.on_block(block(50)).await;
    h.event_loop.wait_for_tasks().await;

    assert_eq!(h.rpc.inject_calls(), 0);
    assert_eq!(h.store.watermark(OperationKind::Bake).unwrap(), 0);
    assert!(h.store.pending_intents(OperationKind::Bake).unwrap().is_empty());
    assert!(h.notifier.messages().is_empty());
}

#[tokio::test]
async fn cancellation_after_submission_still_seals() {
    let rpc = FakeChainRpc::new();
    rpc.update(|s| s.inject_delay = Some(Duration::from_millis(300)));
    let mut h = harness(rpc);
    h.store
        .save_rights_for_cycle(OperationKind::Bake, 6, &[RightEntry::baking(50, 0)])
        .unwrap();

    h.event_loop.on_block(block(49)).await;
    let rpc = h.rpc.clone();
    assert!(eventually(Duration::from_secs(2), || rpc.inject_calls() == 1).await);

    h.event_loop.on_block(block(50)).await;
    h.event_loop.wait_for_tasks().await;

    assert_eq!(h.rpc.injected_blocks().len(), 1);
    assert_eq!(h.store.watermark(OperationKind::Bake).unwrap(), 50);
    assert!(h.store.pending_intents(OperationKind::Bake).unwrap().is_empty());
}

#[tokio::test]
async fn dry_run_signs_but_never_seals() {
    let mut h = harness_with(
        FakeChainRpc::new(),
        BakerSettings {
            dry_run_bake: true,
            dry_run_endorse: true,
            ..settings()
        },
    );
    h.store
        .save_rights_for_cycle(OperationKind::Bake, 6, &[RightEntry::baking(50, 0)])
        .unwrap();
    h.store
        .save_rights_for_cycle(OperationKind::Endorse, 6, &[RightEntry::endorsing(49)])
        .unwrap();

    h.event_loop.on_block(block(49)).await;
    h.event_loop.wait_for_tasks().await;

    assert_eq!(h.signer.requests().len(), 2);
    assert_eq!(h.rpc.inject_calls(), 0);
    for kind in OperationKind::ALL {
        assert_eq!(h.store.watermark(kind).unwrap(), 0);
        assert!(h.store.pending_intents(kind).unwrap().is_empty());
    }
}

#[tokio::test]
async fn paused_daemon_dispatches_nothing() {
    let mut h = harness(FakeChainRpc::new());
    h.store
        .save_rights_for_cycle(OperationKind::Bake, 6, &[RightEntry::baking(50, 0)])
        .unwrap();
    h.store.set_paused(true).unwrap();
    let status = h.event_loop.status();

    h.event_loop.on_block(block(49)).await;
    h.event_loop.wait_for_tasks().await;

    assert!(h.signer.requests().is_empty());
    assert_eq!(status.borrow().readiness, Readiness::Paused);

    h.store.set_paused(false).unwrap();
    h.event_loop.on_block(block(49)).await;
    h.event_loop.wait_for_tasks().await;
    assert_eq!(h.rpc.injected_blocks().len(), 1);
}

#[tokio::test]
async fn outstanding_intent_blocks_the_level() {
    let mut h = harness(FakeChainRpc::new());
    h.store
        .save_rights_for_cycle(OperationKind::Bake, 6, &[RightEntry::baking(50, 0)])
        .unwrap();
    h.store.record_intent(OperationKind::Bake, 50).unwrap();

    h.event_loop.on_block(block(49)).await;
    h.event_loop.wait_for_tasks().await;
    assert!(h.signer.requests().is_empty());

    h.store.clear_intent(OperationKind::Bake, 50).unwrap();
    h.event_loop.on_block(block(49)).await;
    h.event_loop.wait_for_tasks().await;
    assert_eq!(h.rpc.injected_blocks().len(), 1);
}

#[tokio::test]
async fn failed_injection_keeps_the_intent_and_notifies() {
    let rpc = FakeChainRpc::new();
    rpc.update(|s| s.fail_injections = true);
    let mut h = harness(rpc);
    h.store
        .save_rights_for_cycle(OperationKind::Bake, 6, &[RightEntry::baking(50, 0)])
        .unwrap();

    h.event_loop.on_block(block(49)).await;
    h.event_loop.wait_for_tasks().await;

    assert_eq!(h.store.watermark(OperationKind::Bake).unwrap(), 0);
    let intents = h.store.pending_intents(OperationKind::Bake).unwrap();
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].level, 50);
    assert!(h
        .notifier
        .messages()
        .iter()
        .any(|m| m.starts_with("Task bake failed at level 49")));
}

#[tokio::test]
async fn commitment_levels_store_a_seed_nonce() {
    let mut h = harness(FakeChainRpc::new());
    // Head 51 sits at position 2 of cycle 6, so level 52 closes a commitment window.
    h.store
        .save_rights_for_cycle(OperationKind::Bake, 6, &[RightEntry::baking(52, 0)])
        .unwrap();

    h.event_loop.on_block(block(51)).await;
    h.event_loop.wait_for_tasks().await;

    let templates = h.rpc.block_templates();
    assert_eq!(templates.len(), 1);
    let committed = templates[0].seed_nonce_hash.clone().unwrap();
    assert!(committed.starts_with("nce"));

    let nonces = h.store.nonces_for_cycle(6).unwrap();
    assert_eq!(nonces.len(), 1);
    assert_eq!(nonces[0].level, 52);
    assert_eq!(nonces[0].seed_hash, committed);
    assert!(!nonces[0].is_revealed());
}

#[tokio::test]
async fn committed_nonce_survives_a_refused_seal() {
    let rpc = FakeChainRpc::new();
    rpc.update(|s| s.inject_delay = Some(Duration::from_millis(300)));
    let mut h = harness(rpc);
    h.store
        .save_rights_for_cycle(OperationKind::Bake, 6, &[RightEntry::baking(52, 0)])
        .unwrap();

    h.event_loop.on_block(block(51)).await;
    let rpc = h.rpc.clone();
    assert!(eventually(Duration::from_secs(2), || rpc.inject_calls() == 1).await);
    // A different block gets sealed at 52 while ours is in flight.
    h.store.record_seal(OperationKind::Bake, 52, "BLother").unwrap();
    h.event_loop.wait_for_tasks().await;

    assert_eq!(h.rpc.injected_blocks().len(), 1);
    let committed = h.rpc.block_templates()[0].seed_nonce_hash.clone().unwrap();
    let nonces = h.store.nonces_for_cycle(6).unwrap();
    assert_eq!(nonces.len(), 1);
    assert_eq!(nonces[0].seed_hash, committed);
    assert!(h
        .notifier
        .messages()
        .iter()
        .any(|m| m.starts_with("Task bake failed at level 51")));
}

#[tokio::test]
async fn refused_claim_skips_injection() {
    let mut h = harness(FakeChainRpc::new());
    h.signer.set_delay(Duration::from_millis(300));
    h.store
        .save_rights_for_cycle(OperationKind::Bake, 6, &[RightEntry::baking(52, 0)])
        .unwrap();

    h.event_loop.on_block(block(51)).await;
    let signer = h.signer.clone();
    assert!(eventually(Duration::from_secs(2), || signer.requests().len() == 1).await);
    // Another claimant takes the level between the gate and submission.
    assert!(h.store.record_intent(OperationKind::Bake, 52).unwrap().is_proceed());
    h.event_loop.wait_for_tasks().await;

    assert_eq!(h.rpc.inject_calls(), 0);
    assert!(h.store.nonces_for_cycle(6).unwrap().is_empty());
    assert_eq!(h.store.pending_intents(OperationKind::Bake).unwrap().len(), 1);
    assert!(h.notifier.messages().is_empty());
}

#[tokio::test]
async fn reveal_attempts_every_nonce_despite_failures() {
    let rpc = FakeChainRpc::new();
    rpc.update(|s| s.fail_injections = true);
    let mut h = harness(rpc);
    let mut rng = TestRng::default();
    h.store
        .save_nonce(5, &Nonce::new(44, rng.seed32(), "nceNeverLanded"))
        .unwrap();
    h.store
        .save_nonce(5, &Nonce::new(48, rng.seed32(), "nceCommitted"))
        .unwrap();

    h.event_loop.on_block(block(49)).await;
    h.event_loop.wait_for_tasks().await;

    assert_eq!(h.rpc.inject_calls(), 2);
    assert!(h
        .store
        .nonces_for_cycle(5)
        .unwrap()
        .iter()
        .all(|n| !n.is_revealed()));
    assert!(h
        .notifier
        .messages()
        .iter()
        .any(|m| m.starts_with("Task reveal failed at level 49") && m.contains("[44, 48]")));
}

#[tokio::test]
async fn reveal_skips_nonces_already_revealed() {
    let mut h = harness(FakeChainRpc::new());
    let mut rng = TestRng::default();
    h.store
        .save_nonce(5, &Nonce::new(44, rng.seed32(), "nceAlready"))
        .unwrap();
    h.store
        .save_nonce(5, &Nonce::new(48, rng.seed32(), "ncePending"))
        .unwrap();
    h.store.mark_nonce_revealed(5, 44, "oEarlier").unwrap();

    h.event_loop.on_block(block(49)).await;
    h.event_loop.wait_for_tasks().await;
    h.event_loop.on_block(block(50)).await;
    h.event_loop.wait_for_tasks().await;

    assert_eq!(h.rpc.injected_operations(), vec!["o-reveal:48".to_string()]);
    let nonces = h.store.nonces_for_cycle(5).unwrap();
    assert!(nonces.iter().all(Nonce::is_revealed));
    assert_eq!(nonces[1].reveal_operation.as_deref(), Some("o-reveal:48"));
    assert!(h
        .signer
        .requests()
        .iter()
        .all(|r| r.domain == SigningDomain::Generic));
}

#[tokio::test]
async fn prefetch_fills_the_cache_ahead_of_the_head() {
    let rpc = FakeChainRpc::new()
        .with_baking_rights(7, vec![RightEntry::baking(60, 1), RightEntry::baking(61, 9)])
        .with_endorsing_rights(6, vec![RightEntry::endorsing(53)]);
    let mut h = harness(rpc);

    h.event_loop.on_block(block(49)).await;
    h.event_loop.wait_for_tasks().await;

    let requests = h.rpc.rights_requests();
    assert!(requests.contains(&("baking", 6)));
    assert!(requests.contains(&("baking", 7)));
    assert!(requests.contains(&("endorsing", 7)));
    assert_eq!(h.store.highest_cycle_fetched(OperationKind::Bake).unwrap(), 7);

    let next = h.store.next_right(OperationKind::Bake, 49).unwrap();
    assert_eq!(next.right, Some(RightEntry::baking(60, 1)));
    // Priority 9 is above max_baking_priority and never requested.
    assert_eq!(h.store.next_right(OperationKind::Bake, 60).unwrap().right, None);
    assert_eq!(h.store.next_right(OperationKind::Endorse, 49).unwrap().level(), 53);

    // A second head in the same cycle has nothing left to fetch.
    h.event_loop.on_block(block(50)).await;
    h.event_loop.wait_for_tasks().await;
    assert_eq!(h.rpc.rights_requests().len(), requests.len());
}

#[tokio::test]
async fn run_consumes_heads_until_shutdown() {
    let h = harness(FakeChainRpc::new());
    h.store
        .save_rights_for_cycle(OperationKind::Bake, 6, &[RightEntry::baking(50, 0)])
        .unwrap();
    let status = h.event_loop.status();
    let (block_tx, block_rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(h.event_loop.run(block_rx, shutdown_rx));

    block_tx.send(block(49)).await.unwrap();
    let store = h.store.clone();
    assert!(
        eventually(Duration::from_secs(2), || store.watermark(OperationKind::Bake).unwrap() == 50)
            .await
    );

    block_tx.send(block(50)).await.unwrap();
    let board = status.clone();
    assert!(eventually(Duration::from_secs(2), || board.borrow().head_level == 50).await);

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(h.rpc.injected_blocks().len(), 1);
}

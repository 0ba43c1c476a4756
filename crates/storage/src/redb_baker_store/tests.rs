// Path: crates/storage/src/redb_baker_store/tests.rs
use super::*;
use baker_api::storage::{
    DelegateStore, EndpointRegistry, NonceStore, NotifierConfigStore, PayoutStore, RightsCache,
    WatermarkStore,
};
use baker_types::config::Network;
use baker_types::{GateDecision, Nonce, RightEntry, SealOutcome, SealRecord, SignerType};
use tempfile::{tempdir, TempDir};

fn open_temp() -> (TempDir, RedbBakerStore) {
    let dir = tempdir().unwrap();
    let store = RedbBakerStore::open(dir.path().join("bakerd.db")).unwrap();
    (dir, store)
}

#[test]
fn fresh_store_has_zero_watermarks() {
    let (_dir, store) = open_temp();
    for kind in OperationKind::ALL {
        assert_eq!(store.watermark(kind).unwrap(), 0);
        assert_eq!(store.most_recent_seal(kind).unwrap(), None);
        assert_eq!(store.check_gate(kind, 1).unwrap(), GateDecision::Proceed);
    }
}

#[test]
fn seal_advances_watermark_and_is_readable() {
    let (_dir, store) = open_temp();
    let outcome = store.record_seal(OperationKind::Bake, 5, "h").unwrap();
    assert_eq!(outcome, SealOutcome::Recorded);
    assert_eq!(store.watermark(OperationKind::Bake).unwrap(), 5);
    assert_eq!(
        store.most_recent_seal(OperationKind::Bake).unwrap(),
        Some(SealRecord {
            level: 5,
            hash: "h".into()
        })
    );
    // Kinds are independent.
    assert_eq!(store.watermark(OperationKind::Endorse).unwrap(), 0);
    assert_eq!(
        store.check_gate(OperationKind::Bake, 5).unwrap(),
        GateDecision::AtOrBelowWatermark { watermark: 5 }
    );
}

#[test]
fn watermark_never_moves_backward() {
    let (_dir, store) = open_temp();
    store.record_seal(OperationKind::Endorse, 20, "a").unwrap();
    let outcome = store.record_seal(OperationKind::Endorse, 12, "b").unwrap();
    assert_eq!(outcome, SealOutcome::IgnoredBackward { watermark: 20 });
    assert_eq!(store.watermark(OperationKind::Endorse).unwrap(), 20);
    assert_eq!(
        store.most_recent_seal(OperationKind::Endorse).unwrap().unwrap().level,
        20
    );
}

#[test]
fn conflicting_seal_is_an_error_and_writes_nothing() {
    let (_dir, store) = open_temp();
    store.record_seal(OperationKind::Bake, 7, "hashA").unwrap();
    let err = store.record_seal(OperationKind::Bake, 7, "hashB").unwrap_err();
    match err {
        StorageError::ConflictingSeal {
            kind,
            level,
            existing,
            attempted,
        } => {
            assert_eq!(kind, OperationKind::Bake);
            assert_eq!(level, 7);
            assert_eq!(existing, "hashA");
            assert_eq!(attempted, "hashB");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        store.most_recent_seal(OperationKind::Bake).unwrap().unwrap().hash,
        "hashA"
    );
}

#[test]
fn identical_seal_is_a_replay() {
    let (_dir, store) = open_temp();
    store.record_seal(OperationKind::Bake, 7, "hashA").unwrap();
    store.record_seal(OperationKind::Bake, 9, "hashC").unwrap();
    assert_eq!(
        store.record_seal(OperationKind::Bake, 7, "hashA").unwrap(),
        SealOutcome::Replayed
    );
    assert_eq!(store.watermark(OperationKind::Bake).unwrap(), 9);
}

#[test]
fn intent_blocks_gate_until_sealed_or_cleared() {
    let (_dir, store) = open_temp();
    store.record_intent(OperationKind::Endorse, 30).unwrap();
    assert_eq!(
        store.check_gate(OperationKind::Endorse, 30).unwrap(),
        GateDecision::IntentOutstanding
    );
    // Other levels and kinds are unaffected.
    assert!(store.check_gate(OperationKind::Endorse, 31).unwrap().is_proceed());
    assert!(store.check_gate(OperationKind::Bake, 30).unwrap().is_proceed());

    let pending = store.pending_intents(OperationKind::Endorse).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].level, 30);

    store.clear_intent(OperationKind::Endorse, 30).unwrap();
    assert!(store.check_gate(OperationKind::Endorse, 30).unwrap().is_proceed());

    store.record_intent(OperationKind::Endorse, 31).unwrap();
    store.record_seal(OperationKind::Endorse, 31, "op").unwrap();
    assert!(store.pending_intents(OperationKind::Endorse).unwrap().is_empty());
}

#[test]
fn intent_is_an_exclusive_claim() {
    let (_dir, store) = open_temp();
    assert_eq!(
        store.record_intent(OperationKind::Bake, 51).unwrap(),
        GateDecision::Proceed
    );
    assert_eq!(
        store.record_intent(OperationKind::Bake, 51).unwrap(),
        GateDecision::IntentOutstanding
    );
    // The other kind keeps its own claims.
    assert!(store.record_intent(OperationKind::Endorse, 51).unwrap().is_proceed());
    assert_eq!(store.pending_intents(OperationKind::Bake).unwrap().len(), 1);
}

#[test]
fn claims_at_sealed_levels_are_refused() {
    let (_dir, store) = open_temp();
    store.record_seal(OperationKind::Bake, 50, "h").unwrap();
    assert_eq!(
        store.record_intent(OperationKind::Bake, 50).unwrap(),
        GateDecision::AtOrBelowWatermark { watermark: 50 }
    );
    assert_eq!(
        store.record_intent(OperationKind::Bake, 49).unwrap(),
        GateDecision::AtOrBelowWatermark { watermark: 50 }
    );
    assert!(store.pending_intents(OperationKind::Bake).unwrap().is_empty());
}

#[test]
fn replayed_seal_clears_a_leftover_intent() {
    let (_dir, store) = open_temp();
    store.record_intent(OperationKind::Endorse, 40).unwrap();
    store.record_seal(OperationKind::Endorse, 40, "op").unwrap();
    // An intent written by an older daemon next to an existing seal.
    let w = store.write_txn().unwrap();
    {
        let mut intents = w.open_table(INTENTS).unwrap();
        intents
            .insert(nested_key("endorses", &be64(40)).as_slice(), 1u64)
            .unwrap();
    }
    w.commit().unwrap();
    assert_eq!(store.pending_intents(OperationKind::Endorse).unwrap().len(), 1);

    assert_eq!(
        store.record_seal(OperationKind::Endorse, 40, "op").unwrap(),
        SealOutcome::Replayed
    );
    assert!(store.pending_intents(OperationKind::Endorse).unwrap().is_empty());
}

#[test]
fn granted_claim_persists_the_committed_nonce() {
    let (_dir, store) = open_temp();
    let nonce = Nonce::new(52, vec![5; 32], "nceCommitted");
    assert!(store
        .record_intent_with_nonce(OperationKind::Bake, 52, Some((6, &nonce)))
        .unwrap()
        .is_proceed());
    assert_eq!(store.nonces_for_cycle(6).unwrap(), vec![nonce.clone()]);

    // A refused claim writes neither intent nor nonce.
    let other = Nonce::new(52, vec![6; 32], "nceRefused");
    assert_eq!(
        store
            .record_intent_with_nonce(OperationKind::Bake, 52, Some((6, &other)))
            .unwrap(),
        GateDecision::IntentOutstanding
    );
    assert_eq!(store.nonces_for_cycle(6).unwrap(), vec![nonce]);
}

#[test]
fn prefix_scan_stops_at_the_prefix_boundary() {
    let (_dir, store) = open_temp();
    let w = store.write_txn().unwrap();
    {
        let mut config = w.open_table(CONFIG).unwrap();
        for key in [&b"endpoints/1"[..], &b"endpoints/2"[..], &b"endpointz"[..], &b"notifs/x"[..]] {
            config.insert(key, b"v".as_slice()).unwrap();
        }
    }
    w.commit().unwrap();

    let r = store.read_txn().unwrap();
    let config = r.open_table(CONFIG).unwrap();
    let keys = keys_with_prefix(&config, b"endpoints/").unwrap();
    assert_eq!(keys, vec![b"endpoints/1".to_vec(), b"endpoints/2".to_vec()]);
}

#[test]
fn seals_and_intents_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bakerd.db");
    {
        let store = RedbBakerStore::open(&path).unwrap();
        store.record_seal(OperationKind::Bake, 50, "BLock50").unwrap();
        store.record_intent(OperationKind::Bake, 51).unwrap();
        store.close();
    }
    let store = RedbBakerStore::open(&path).unwrap();
    assert_eq!(store.watermark(OperationKind::Bake).unwrap(), 50);
    assert_eq!(
        store.check_gate(OperationKind::Bake, 51).unwrap(),
        GateDecision::IntentOutstanding
    );
}

#[test]
fn next_right_scans_in_level_order() {
    let (_dir, store) = open_temp();
    let entries = [
        RightEntry::baking(10, 0),
        RightEntry::baking(20, 2),
        RightEntry::baking(30, 1),
    ];
    store
        .save_rights_for_cycle(OperationKind::Bake, 3, &entries)
        .unwrap();

    let next = store.next_right(OperationKind::Bake, 15).unwrap();
    assert_eq!(next.right, Some(RightEntry::baking(20, 2)));
    assert_eq!(next.highest_cycle_fetched, 3);

    assert_eq!(
        store.next_right(OperationKind::Bake, 5).unwrap().right,
        Some(RightEntry::baking(10, 0))
    );

    let none = store.next_right(OperationKind::Bake, 30).unwrap();
    assert_eq!(none.right, None);
    assert_eq!(none.level(), 0);

    // Endorsing rights live in their own collection.
    assert_eq!(store.next_right(OperationKind::Endorse, 0).unwrap().right, None);
}

#[test]
fn endorsing_rights_are_presence_only() {
    let (_dir, store) = open_temp();
    store
        .save_rights_for_cycle(
            OperationKind::Endorse,
            4,
            &[RightEntry::endorsing(100), RightEntry::endorsing(101)],
        )
        .unwrap();
    let next = store.next_right(OperationKind::Endorse, 100).unwrap();
    assert_eq!(next.right, Some(RightEntry::endorsing(101)));
    assert_eq!(next.highest_cycle_fetched, 4);
}

#[test]
fn rights_cursor_is_overwritten_unconditionally() {
    let (_dir, store) = open_temp();
    store
        .save_rights_for_cycle(OperationKind::Bake, 9, &[])
        .unwrap();
    store
        .save_rights_for_cycle(OperationKind::Bake, 7, &[RightEntry::baking(1, 0)])
        .unwrap();
    assert_eq!(store.highest_cycle_fetched(OperationKind::Bake).unwrap(), 7);
    assert_eq!(store.highest_cycle_fetched(OperationKind::Endorse).unwrap(), 0);
}

#[test]
fn prune_drops_only_older_rights_of_the_kind() {
    let (_dir, store) = open_temp();
    store
        .save_rights_for_cycle(
            OperationKind::Bake,
            1,
            &[
                RightEntry::baking(10, 0),
                RightEntry::baking(20, 0),
                RightEntry::baking(30, 0),
            ],
        )
        .unwrap();
    store
        .save_rights_for_cycle(OperationKind::Endorse, 1, &[RightEntry::endorsing(5)])
        .unwrap();

    assert_eq!(store.prune_rights_before(OperationKind::Bake, 20).unwrap(), 1);
    assert_eq!(
        store.next_right(OperationKind::Bake, 0).unwrap().right,
        Some(RightEntry::baking(20, 0))
    );
    assert_eq!(
        store.next_right(OperationKind::Endorse, 0).unwrap().right,
        Some(RightEntry::endorsing(5))
    );
}

#[test]
fn nonces_round_trip_in_level_order() {
    let (_dir, store) = open_temp();
    let later = Nonce::new(164, b"def".to_vec(), "nceLater");
    let first = Nonce::new(100, b"abc".to_vec(), "nceFirst");
    store.save_nonce(12, &later).unwrap();
    store.save_nonce(12, &first).unwrap();
    store
        .save_nonce(13, &Nonce::new(4200, vec![1, 2, 3], "nceOther"))
        .unwrap();

    assert_eq!(store.nonces_for_cycle(12).unwrap(), vec![first, later]);
    assert_eq!(store.nonces_for_cycle(13).unwrap().len(), 1);
    assert!(store.nonces_for_cycle(14).unwrap().is_empty());
}

#[test]
fn undecodable_nonces_are_skipped() {
    let (_dir, store) = open_temp();
    store
        .save_nonce(2, &Nonce::new(5, vec![9], "nce5"))
        .unwrap();
    {
        let w = store.write_txn().unwrap();
        {
            let mut t = w.open_table(NONCES).unwrap();
            let key = [be64(2).as_slice(), be64(6).as_slice()].concat();
            t.insert(key.as_slice(), b"not json".as_slice()).unwrap();
        }
        w.commit().unwrap();
    }
    let nonces = store.nonces_for_cycle(2).unwrap();
    assert_eq!(nonces.len(), 1);
    assert_eq!(nonces[0].level, 5);
}

#[test]
fn marking_a_nonce_revealed_persists_the_operation() {
    let (_dir, store) = open_temp();
    store.save_nonce(3, &Nonce::new(64, vec![7; 32], "nce")).unwrap();
    store.mark_nonce_revealed(3, 64, "opReveal").unwrap();
    let nonces = store.nonces_for_cycle(3).unwrap();
    assert!(nonces[0].is_revealed());
    assert_eq!(nonces[0].reveal_operation.as_deref(), Some("opReveal"));
    assert!(matches!(
        store.mark_nonce_revealed(3, 65, "op"),
        Err(StorageError::NotFound)
    ));
}

#[test]
fn delegate_and_signer_selection() {
    let (_dir, store) = open_temp();
    assert_eq!(store.delegate().unwrap(), (String::new(), String::new()));
    assert_eq!(store.signer_type().unwrap(), None);

    store.set_delegate("edsk...", "tz1abc").unwrap();
    store.set_signer_type(SignerType::Remote).unwrap();
    assert_eq!(
        store.delegate().unwrap(),
        ("edsk...".to_string(), "tz1abc".to_string())
    );
    assert_eq!(store.signer_type().unwrap(), Some(SignerType::Remote));

    let identity = store.identity().unwrap();
    assert!(identity.is_registered());
    assert_eq!(identity.bip_path, None);
}

#[test]
fn ledger_config_sets_signer_type_with_it() {
    let (_dir, store) = open_temp();
    store
        .save_ledger_config("tz1ledger", "/44'/1729'/0'/0'")
        .unwrap();
    assert_eq!(store.signer_type().unwrap(), Some(SignerType::Ledger));
    assert_eq!(
        store.ledger_config().unwrap(),
        ("tz1ledger".to_string(), "/44'/1729'/0'/0'".to_string())
    );
}

#[test]
fn pause_flag_round_trips() {
    let (_dir, store) = open_temp();
    assert!(!store.is_paused().unwrap());
    store.set_paused(true).unwrap();
    assert!(store.is_paused().unwrap());
    store.set_paused(false).unwrap();
    assert!(!store.is_paused().unwrap());
}

#[test]
fn duplicate_endpoints_are_no_ops() {
    let (_dir, store) = open_temp();
    assert_eq!(store.add_endpoint("http://a:8732").unwrap(), Some(1));
    assert_eq!(store.add_endpoint("http://a:8732").unwrap(), None);
    assert_eq!(store.add_endpoint("http://b:8732").unwrap(), Some(2));

    store.delete_endpoint(1).unwrap();
    let endpoints = store.list_endpoints().unwrap();
    assert_eq!(endpoints.len(), 1);
    assert_eq!(endpoints.get(&2).map(String::as_str), Some("http://b:8732"));
    assert!(matches!(store.delete_endpoint(1), Err(StorageError::NotFound)));
}

#[test]
fn default_endpoints_are_seeded_once() {
    let (_dir, store) = open_temp();
    let added = store.add_default_endpoints(Network::Mainnet).unwrap();
    assert_eq!(added, Network::Mainnet.default_endpoints().len());

    // Deleting everything must not trigger a re-seed.
    for id in store.list_endpoints().unwrap().into_keys() {
        store.delete_endpoint(id).unwrap();
    }
    assert_eq!(store.add_default_endpoints(Network::Mainnet).unwrap(), 0);
    assert!(store.list_endpoints().unwrap().is_empty());
}

#[test]
fn notifier_configs_are_keyed_by_name() {
    let (_dir, store) = open_temp();
    assert_eq!(store.notifier_config("webhook").unwrap(), None);
    store
        .save_notifier_config("webhook", br#"{"url":"http://hook"}"#)
        .unwrap();
    assert_eq!(
        store.notifier_config("webhook").unwrap().as_deref(),
        Some(br#"{"url":"http://hook"}"#.as_slice())
    );
    assert_eq!(store.notifier_config("email").unwrap(), None);
}

#[test]
fn payout_metadata_is_excluded_from_delegator_listing() {
    let (_dir, store) = open_temp();
    assert!(matches!(
        store.save_delegator_reward(40, "tz1d", "{}"),
        Err(StorageError::MissingBucket(_))
    ));

    store
        .save_cycle_reward_metadata(40, r#"{"rewards":"100"}"#)
        .unwrap();
    store
        .save_delegator_reward(40, "tz1d", r#"{"amount":"5"}"#)
        .unwrap();
    store
        .save_cycle_reward_metadata(41, r#"{"rewards":"90"}"#)
        .unwrap();

    let payouts = store.cycle_payouts(40).unwrap();
    assert_eq!(payouts.len(), 1);
    assert_eq!(payouts["tz1d"], r#"{"amount":"5"}"#);

    let metadata = store.payouts_metadata().unwrap();
    assert_eq!(metadata.keys().copied().collect::<Vec<_>>(), vec![40, 41]);
    assert_eq!(metadata[&41], r#"{"rewards":"90"}"#);
}

// Path: crates/storage/src/redb_baker_store/watermark.rs
use super::nonces::{encode, nonce_key};
use super::{
    backend, decode_u64, nested_key, seal_table, sequence_in, set_sequence_in, RedbBakerStore,
    INTENTS, NONCES, SEQUENCES,
};
use crate::metrics::metrics;
use baker_api::storage::{be64, StorageError, WatermarkStore};
use baker_types::{GateDecision, Nonce, OperationKind, SealOutcome, SealRecord, SubmissionIntent};
use redb::ReadableTable;
use std::time::{SystemTime, UNIX_EPOCH};

fn intent_key(kind: OperationKind, level: u64) -> Vec<u8> {
    nested_key(kind.watermark_bucket(), &be64(level))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl WatermarkStore for RedbBakerStore {
    fn watermark(&self, kind: OperationKind) -> Result<u64, StorageError> {
        self.sequence(kind.watermark_bucket())
    }

    fn record_seal(
        &self,
        kind: OperationKind,
        level: u64,
        hash: &str,
    ) -> Result<SealOutcome, StorageError> {
        let bucket = kind.watermark_bucket();
        let w = self.write_txn()?;

        let existing = {
            let seals = w.open_table(seal_table(kind)).map_err(backend)?;
            let value = seals
                .get(&be64(level))
                .map_err(backend)?
                .map(|g| g.value().to_string());
            value
        };

        if let Some(existing) = existing {
            if existing == hash {
                {
                    let mut intents = w.open_table(INTENTS).map_err(backend)?;
                    intents
                        .remove(intent_key(kind, level).as_slice())
                        .map_err(backend)?;
                }
                w.commit().map_err(backend)?;
                tracing::debug!(target: "storage", %kind, level, hash, "seal replayed");
                return Ok(SealOutcome::Replayed);
            }
            w.abort().map_err(backend)?;
            metrics().inc_seal_conflicts(bucket);
            tracing::error!(
                target: "storage",
                %kind,
                level,
                existing = %existing,
                attempted = %hash,
                "refusing conflicting seal"
            );
            return Err(StorageError::ConflictingSeal {
                kind,
                level,
                existing,
                attempted: hash.to_string(),
            });
        }

        let watermark = sequence_in(&w, bucket)?;
        if level <= watermark {
            w.abort().map_err(backend)?;
            metrics().inc_backward_seals(bucket);
            tracing::warn!(
                target: "storage",
                %kind,
                level,
                watermark,
                "ignoring seal at or below the watermark"
            );
            return Ok(SealOutcome::IgnoredBackward { watermark });
        }

        {
            let mut seals = w.open_table(seal_table(kind)).map_err(backend)?;
            seals.insert(&be64(level), hash).map_err(backend)?;
        }
        set_sequence_in(&w, bucket, level)?;
        {
            let mut intents = w.open_table(INTENTS).map_err(backend)?;
            intents
                .remove(intent_key(kind, level).as_slice())
                .map_err(backend)?;
        }
        w.commit().map_err(backend)?;

        metrics().inc_seals_recorded(bucket);
        metrics().set_watermark(bucket, level);
        tracing::info!(target: "storage", %kind, level, hash, "seal recorded");
        Ok(SealOutcome::Recorded)
    }

    fn most_recent_seal(&self, kind: OperationKind) -> Result<Option<SealRecord>, StorageError> {
        let r = self.read_txn()?;
        let seals = r.open_table(seal_table(kind)).map_err(backend)?;
        let mut iter = seals.iter().map_err(backend)?;
        let latest = match iter.next_back() {
            None => None,
            Some(entry) => {
                let (k, v) = entry.map_err(backend)?;
                Some(SealRecord {
                    level: decode_u64(k.value())?,
                    hash: v.value().to_string(),
                })
            }
        };
        Ok(latest)
    }

    fn record_intent_with_nonce(
        &self,
        kind: OperationKind,
        level: u64,
        commitment: Option<(u64, &Nonce)>,
    ) -> Result<GateDecision, StorageError> {
        let key = intent_key(kind, level);
        let w = self.write_txn()?;

        let watermark = sequence_in(&w, kind.watermark_bucket())?;
        let outstanding = {
            let intents = w.open_table(INTENTS).map_err(backend)?;
            let found = intents.get(key.as_slice()).map_err(backend)?.is_some();
            found
        };
        let refusal = if level <= watermark {
            Some(GateDecision::AtOrBelowWatermark { watermark })
        } else if outstanding {
            Some(GateDecision::IntentOutstanding)
        } else {
            None
        };
        if let Some(decision) = refusal {
            w.abort().map_err(backend)?;
            tracing::warn!(target: "storage", %kind, level, ?decision, "submission claim refused");
            return Ok(decision);
        }

        {
            let mut intents = w.open_table(INTENTS).map_err(backend)?;
            intents.insert(key.as_slice(), unix_now()).map_err(backend)?;
        }
        if let Some((cycle, nonce)) = commitment {
            let bytes = encode(nonce)?;
            let mut nonces = w.open_table(NONCES).map_err(backend)?;
            nonces
                .insert(nonce_key(cycle, nonce.level).as_slice(), bytes.as_slice())
                .map_err(backend)?;
        }
        w.commit().map_err(backend)?;

        if let Some((cycle, nonce)) = commitment {
            metrics().inc_nonces_saved();
            tracing::info!(target: "storage", cycle, level = nonce.level, "seed nonce saved with intent");
        }
        tracing::debug!(target: "storage", %kind, level, "submission intent recorded");
        Ok(GateDecision::Proceed)
    }

    fn clear_intent(&self, kind: OperationKind, level: u64) -> Result<(), StorageError> {
        let w = self.write_txn()?;
        {
            let mut intents = w.open_table(INTENTS).map_err(backend)?;
            intents
                .remove(intent_key(kind, level).as_slice())
                .map_err(backend)?;
        }
        w.commit().map_err(backend)
    }

    fn pending_intents(&self, kind: OperationKind) -> Result<Vec<SubmissionIntent>, StorageError> {
        let prefix = nested_key(kind.watermark_bucket(), &[]);
        let r = self.read_txn()?;
        let intents = r.open_table(INTENTS).map_err(backend)?;
        let mut out = Vec::new();
        for entry in intents.range(prefix.as_slice()..).map_err(backend)? {
            let (k, v) = entry.map_err(backend)?;
            let key = k.value();
            let Some(level_bytes) = key.strip_prefix(prefix.as_slice()) else {
                break;
            };
            out.push(SubmissionIntent {
                kind,
                level: decode_u64(level_bytes)?,
                recorded_at: v.value(),
            });
        }
        Ok(out)
    }

    fn check_gate(&self, kind: OperationKind, level: u64) -> Result<GateDecision, StorageError> {
        // One read transaction so the watermark and intent are a consistent snapshot.
        let r = self.read_txn()?;
        let watermark = {
            let seq = r.open_table(SEQUENCES).map_err(backend)?;
            let value = seq
                .get(kind.watermark_bucket())
                .map_err(backend)?
                .map(|g| g.value())
                .unwrap_or(0);
            value
        };
        if level <= watermark {
            return Ok(GateDecision::AtOrBelowWatermark { watermark });
        }
        let intents = r.open_table(INTENTS).map_err(backend)?;
        if intents
            .get(intent_key(kind, level).as_slice())
            .map_err(backend)?
            .is_some()
        {
            return Ok(GateDecision::IntentOutstanding);
        }
        Ok(GateDecision::Proceed)
    }
}

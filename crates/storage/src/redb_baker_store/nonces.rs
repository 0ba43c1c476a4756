// Path: crates/storage/src/redb_baker_store/nonces.rs
use super::{backend, decode_u64, RedbBakerStore, NONCES};
use crate::metrics::metrics;
use baker_api::storage::{be64, NonceStore, StorageError};
use baker_types::Nonce;
use redb::ReadableTable;

pub(super) fn nonce_key(cycle: u64, level: u64) -> Vec<u8> {
    [be64(cycle).as_slice(), be64(level).as_slice()].concat()
}

pub(super) fn encode(nonce: &Nonce) -> Result<Vec<u8>, StorageError> {
    serde_json::to_vec(nonce).map_err(|e| StorageError::Encode(e.to_string()))
}

impl NonceStore for RedbBakerStore {
    fn save_nonce(&self, cycle: u64, nonce: &Nonce) -> Result<(), StorageError> {
        let bytes = encode(nonce)?;
        let w = self.write_txn()?;
        {
            let mut nonces = w.open_table(NONCES).map_err(backend)?;
            nonces
                .insert(nonce_key(cycle, nonce.level).as_slice(), bytes.as_slice())
                .map_err(backend)?;
        }
        w.commit().map_err(backend)?;
        metrics().inc_nonces_saved();
        tracing::info!(target: "storage", cycle, level = nonce.level, "seed nonce saved");
        Ok(())
    }

    fn nonces_for_cycle(&self, cycle: u64) -> Result<Vec<Nonce>, StorageError> {
        let prefix = be64(cycle);
        let r = self.read_txn()?;
        let nonces = r.open_table(NONCES).map_err(backend)?;
        let mut out = Vec::new();
        for entry in nonces.range(prefix.as_slice()..).map_err(backend)? {
            let (k, v) = entry.map_err(backend)?;
            let Some(level_bytes) = k.value().strip_prefix(prefix.as_slice()) else {
                break;
            };
            match serde_json::from_slice::<Nonce>(v.value()) {
                Ok(nonce) => out.push(nonce),
                Err(e) => {
                    let level = decode_u64(level_bytes).unwrap_or_default();
                    tracing::warn!(target: "storage", cycle, level, error = %e, "skipping undecodable nonce");
                }
            }
        }
        Ok(out)
    }

    fn mark_nonce_revealed(
        &self,
        cycle: u64,
        level: u64,
        operation_hash: &str,
    ) -> Result<(), StorageError> {
        let key = nonce_key(cycle, level);
        let w = self.write_txn()?;
        {
            let mut nonces = w.open_table(NONCES).map_err(backend)?;
            let stored = nonces
                .get(key.as_slice())
                .map_err(backend)?
                .map(|g| g.value().to_vec())
                .ok_or(StorageError::NotFound)?;
            let mut nonce: Nonce = serde_json::from_slice(&stored)
                .map_err(|e| StorageError::Decode(e.to_string()))?;
            nonce.reveal_operation = Some(operation_hash.to_string());
            let bytes = encode(&nonce)?;
            nonces
                .insert(key.as_slice(), bytes.as_slice())
                .map_err(backend)?;
        }
        w.commit().map_err(backend)?;
        tracing::info!(target: "storage", cycle, level, operation = operation_hash, "nonce marked revealed");
        Ok(())
    }
}

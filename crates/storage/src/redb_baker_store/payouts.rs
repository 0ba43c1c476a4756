// Path: crates/storage/src/redb_baker_store/payouts.rs
use super::{backend, decode_u64, RedbBakerStore, PAYOUTS};
use baker_api::storage::{be64, PayoutStore, StorageError};
use redb::ReadableTable;
use std::collections::BTreeMap;

/// Reserved key inside each cycle collection.
const METADATA: &[u8] = b"metadata";

fn cycle_prefix(cycle: u64) -> Vec<u8> {
    [be64(cycle).as_slice(), b"/"].concat()
}

fn payout_key(cycle: u64, name: &[u8]) -> Vec<u8> {
    [cycle_prefix(cycle).as_slice(), name].concat()
}

fn utf8(bytes: &[u8]) -> Result<String, StorageError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| StorageError::Decode(e.to_string()))
}

impl PayoutStore for RedbBakerStore {
    fn save_cycle_reward_metadata(&self, cycle: u64, metadata: &str) -> Result<(), StorageError> {
        let w = self.write_txn()?;
        {
            let mut payouts = w.open_table(PAYOUTS).map_err(backend)?;
            payouts
                .insert(payout_key(cycle, METADATA).as_slice(), metadata.as_bytes())
                .map_err(backend)?;
        }
        w.commit().map_err(backend)
    }

    fn save_delegator_reward(
        &self,
        cycle: u64,
        delegator: &str,
        record: &str,
    ) -> Result<(), StorageError> {
        if delegator.as_bytes() == METADATA {
            return Err(StorageError::Encode(
                "'metadata' is reserved and cannot name a delegator".into(),
            ));
        }
        let w = self.write_txn()?;
        {
            let mut payouts = w.open_table(PAYOUTS).map_err(backend)?;
            let exists = payouts
                .get(payout_key(cycle, METADATA).as_slice())
                .map_err(backend)?
                .is_some();
            if !exists {
                return Err(StorageError::MissingBucket(format!("payouts/{cycle}")));
            }
            payouts
                .insert(
                    payout_key(cycle, delegator.as_bytes()).as_slice(),
                    record.as_bytes(),
                )
                .map_err(backend)?;
        }
        w.commit().map_err(backend)
    }

    fn cycle_payouts(&self, cycle: u64) -> Result<BTreeMap<String, String>, StorageError> {
        let prefix = cycle_prefix(cycle);
        let r = self.read_txn()?;
        let payouts = r.open_table(PAYOUTS).map_err(backend)?;
        let mut out = BTreeMap::new();
        for entry in payouts.range(prefix.as_slice()..).map_err(backend)? {
            let (k, v) = entry.map_err(backend)?;
            let Some(name) = k.value().strip_prefix(prefix.as_slice()) else {
                break;
            };
            if name == METADATA {
                continue;
            }
            out.insert(utf8(name)?, utf8(v.value())?);
        }
        Ok(out)
    }

    fn payouts_metadata(&self) -> Result<BTreeMap<u64, String>, StorageError> {
        let r = self.read_txn()?;
        let payouts = r.open_table(PAYOUTS).map_err(backend)?;
        let mut out = BTreeMap::new();
        for entry in payouts.iter().map_err(backend)? {
            let (k, v) = entry.map_err(backend)?;
            let key = k.value();
            let (cycle_bytes, rest) = key.split_at(key.len().min(8));
            if rest.strip_prefix(b"/".as_slice()) == Some(METADATA) {
                out.insert(decode_u64(cycle_bytes)?, utf8(v.value())?);
            }
        }
        Ok(out)
    }
}

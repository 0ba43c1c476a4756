// Path: crates/storage/src/redb_baker_store/rights.rs
use super::{
    backend, decode_u64, keys_with_prefix, nested_key, rights_sequence, sequence_in,
    set_sequence_in, RedbBakerStore, RIGHTS,
};
use crate::metrics::metrics;
use baker_api::storage::{be64, RightsCache, StorageError};
use baker_types::{NextRight, OperationKind, RightEntry};
use redb::ReadableTable;

fn rights_prefix(kind: OperationKind) -> Vec<u8> {
    nested_key(kind.rights_bucket(), &[])
}

fn rights_key(kind: OperationKind, level: u64) -> Vec<u8> {
    nested_key(kind.rights_bucket(), &be64(level))
}

impl RightsCache for RedbBakerStore {
    fn save_rights_for_cycle(
        &self,
        kind: OperationKind,
        cycle: u64,
        entries: &[RightEntry],
    ) -> Result<(), StorageError> {
        let w = self.write_txn()?;
        {
            let mut rights = w.open_table(RIGHTS).map_err(backend)?;
            for entry in entries {
                // Baking keeps the priority; endorsing only needs presence, and
                // records the cycle it was fetched for.
                let value = match kind {
                    OperationKind::Bake => be64(u64::from(entry.priority.unwrap_or(0))),
                    OperationKind::Endorse => be64(cycle),
                };
                rights
                    .insert(rights_key(kind, entry.level).as_slice(), &value)
                    .map_err(backend)?;
            }
        }

        let seq = rights_sequence(kind);
        let previous = sequence_in(&w, seq)?;
        if cycle < previous {
            tracing::warn!(
                target: "storage",
                %kind,
                cycle,
                previous,
                "rights cursor moving backward; fetches are assumed monotonic"
            );
        }
        set_sequence_in(&w, seq, cycle)?;
        w.commit().map_err(backend)?;

        metrics().inc_rights_saved(kind.rights_bucket(), entries.len() as u64);
        tracing::debug!(target: "storage", %kind, cycle, count = entries.len(), "rights saved");
        Ok(())
    }

    fn next_right(
        &self,
        kind: OperationKind,
        current_level: u64,
    ) -> Result<NextRight, StorageError> {
        let highest_cycle_fetched = self.highest_cycle_fetched(kind)?;
        let prefix = rights_prefix(kind);
        let start = rights_key(kind, current_level.saturating_add(1));

        let r = self.read_txn()?;
        let rights = r.open_table(RIGHTS).map_err(backend)?;
        let mut range = rights.range(start.as_slice()..).map_err(backend)?;
        let right = match range.next() {
            None => None,
            Some(entry) => {
                let (k, v) = entry.map_err(backend)?;
                match k.value().strip_prefix(prefix.as_slice()) {
                    None => None,
                    Some(level_bytes) => {
                        let level = decode_u64(level_bytes)?;
                        Some(match kind {
                            OperationKind::Bake => {
                                let priority = u32::try_from(decode_u64(v.value())?)
                                    .map_err(|e| StorageError::Decode(e.to_string()))?;
                                RightEntry::baking(level, priority)
                            }
                            OperationKind::Endorse => RightEntry::endorsing(level),
                        })
                    }
                }
            }
        };

        Ok(NextRight {
            right,
            highest_cycle_fetched,
        })
    }

    fn highest_cycle_fetched(&self, kind: OperationKind) -> Result<u64, StorageError> {
        self.sequence(rights_sequence(kind))
    }

    fn prune_rights_before(&self, kind: OperationKind, level: u64) -> Result<usize, StorageError> {
        let end = rights_key(kind, level);
        let w = self.write_txn()?;
        let removed = {
            let mut rights = w.open_table(RIGHTS).map_err(backend)?;
            let stale: Vec<Vec<u8>> = keys_with_prefix(&rights, &rights_prefix(kind))?
                .into_iter()
                .take_while(|k| k.as_slice() < end.as_slice())
                .collect();
            for key in &stale {
                rights.remove(key.as_slice()).map_err(backend)?;
            }
            stale.len()
        };
        w.commit().map_err(backend)?;
        if removed > 0 {
            tracing::debug!(target: "storage", %kind, below = level, removed, "pruned rights");
        }
        Ok(removed)
    }
}

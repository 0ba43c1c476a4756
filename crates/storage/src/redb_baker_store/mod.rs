// Path: crates/storage/src/redb_baker_store/mod.rs
use baker_api::storage::{be64, from_be64, StorageError};
use baker_types::OperationKind;
use redb::{Database, ReadTransaction, ReadableTable, TableDefinition, WriteTransaction};
use std::path::Path;
use std::sync::Arc;

mod identity;
mod nonces;
mod payouts;
mod rights;
mod watermark;

#[cfg(test)]
mod tests;

/// ---- Table definitions (single DB, prefix-encoded keys) ----
/// `config`: pkh, signersk, signertype, bippath, paused, plus nested
/// `endpoints/<id>` and `notifs/<name>`.
const CONFIG: TableDefinition<&[u8], &[u8]> = TableDefinition::new("config");
/// Watermark records: level -> sealed artifact hash.
const BAKES: TableDefinition<&[u8; 8], &str> = TableDefinition::new("bakes");
const ENDORSES: TableDefinition<&[u8; 8], &str> = TableDefinition::new("endorses");
/// `<cycle><level>` -> nonce JSON.
const NONCES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("nonces");
/// `baking/<level>` -> priority, `endorsing/<level>` -> cycle.
const RIGHTS: TableDefinition<&[u8], &[u8; 8]> = TableDefinition::new("rights");
/// `<cycle>/metadata` and `<cycle>/<delegator>` -> JSON.
const PAYOUTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("payouts");
/// `<bakes|endorses>/<level>` -> unix seconds.
const INTENTS: TableDefinition<&[u8], u64> = TableDefinition::new("intents");
/// Bucket path -> sequence counter.
const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

const SEQ_ENDPOINTS: &str = "config/endpoints";

fn seal_table(kind: OperationKind) -> TableDefinition<'static, &'static [u8; 8], &'static str> {
    match kind {
        OperationKind::Bake => BAKES,
        OperationKind::Endorse => ENDORSES,
    }
}

fn rights_sequence(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Bake => "rights/baking",
        OperationKind::Endorse => "rights/endorsing",
    }
}

/// `parent/` followed by `child`.
fn nested_key(parent: &str, child: &[u8]) -> Vec<u8> {
    [parent.as_bytes(), b"/", child].concat()
}

fn backend(e: impl std::fmt::Display) -> StorageError {
    StorageError::Backend(e.to_string())
}

fn decode_u64(bytes: &[u8]) -> Result<u64, StorageError> {
    from_be64(bytes).ok_or_else(|| StorageError::Decode(format!("expected 8 bytes, got {}", bytes.len())))
}

/// Keys of `table` starting with `prefix`, in order. The scan stops at the
/// first key outside the prefix.
fn keys_with_prefix<V: redb::RedbValue + 'static>(
    table: &impl ReadableTable<&'static [u8], V>,
    prefix: &[u8],
) -> Result<Vec<Vec<u8>>, StorageError> {
    let mut keys = Vec::new();
    for entry in table.range(prefix..).map_err(backend)? {
        let (k, _) = entry.map_err(backend)?;
        let key = k.value();
        if !key.starts_with(prefix) {
            break;
        }
        keys.push(key.to_vec());
    }
    Ok(keys)
}

fn sequence_in(w: &WriteTransaction<'_>, bucket: &str) -> Result<u64, StorageError> {
    let t = w.open_table(SEQUENCES).map_err(backend)?;
    let value = t.get(bucket).map_err(backend)?.map(|g| g.value()).unwrap_or(0);
    Ok(value)
}

fn set_sequence_in(w: &WriteTransaction<'_>, bucket: &str, value: u64) -> Result<(), StorageError> {
    let mut t = w.open_table(SEQUENCES).map_err(backend)?;
    t.insert(bucket, value).map_err(backend)?;
    Ok(())
}

/// The daemon's durable state in one redb file.
#[derive(Clone)]
pub struct RedbBakerStore {
    db: Arc<Database>,
}

impl std::fmt::Debug for RedbBakerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBakerStore").finish_non_exhaustive()
    }
}

impl RedbBakerStore {
    /// Opens (or creates) the database at `path` and makes sure every table
    /// exists. Failing here is an initialisation failure.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(backend)?;

        // Ensure tables exist
        {
            let w = db.begin_write().map_err(backend)?;
            {
                w.open_table(CONFIG).map_err(backend)?;
                w.open_table(BAKES).map_err(backend)?;
                w.open_table(ENDORSES).map_err(backend)?;
                w.open_table(NONCES).map_err(backend)?;
                w.open_table(RIGHTS).map_err(backend)?;
                w.open_table(PAYOUTS).map_err(backend)?;
                w.open_table(INTENTS).map_err(backend)?;
                w.open_table(SEQUENCES).map_err(backend)?;
            }
            w.commit().map_err(backend)?;
        }

        tracing::info!(target: "storage", path = %path.as_ref().display(), "opened baker database");
        Ok(Self { db: Arc::new(db) })
    }

    /// Releases this handle. The file is closed once the last clone is gone.
    pub fn close(self) {
        let remaining = Arc::strong_count(&self.db).saturating_sub(1);
        drop(self);
        tracing::info!(target: "storage", remaining_handles = remaining, "closed baker database handle");
    }

    fn read_txn(&self) -> Result<ReadTransaction<'_>, StorageError> {
        self.db.begin_read().map_err(backend)
    }

    fn write_txn(&self) -> Result<WriteTransaction<'_>, StorageError> {
        self.db.begin_write().map_err(backend)
    }

    fn sequence(&self, bucket: &str) -> Result<u64, StorageError> {
        let r = self.read_txn()?;
        let t = r.open_table(SEQUENCES).map_err(backend)?;
        let value = t.get(bucket).map_err(backend)?.map(|g| g.value()).unwrap_or(0);
        Ok(value)
    }
}

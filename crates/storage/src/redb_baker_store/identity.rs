// Path: crates/storage/src/redb_baker_store/identity.rs
use super::{
    backend, decode_u64, keys_with_prefix, nested_key, sequence_in, set_sequence_in,
    RedbBakerStore, CONFIG, SEQ_ENDPOINTS,
};
use baker_api::storage::{
    be64, DelegateStore, EndpointRegistry, NotifierConfigStore, StorageError,
};
use baker_types::config::Network;
use baker_types::SignerType;
use redb::{ReadableTable, WriteTransaction};
use std::collections::BTreeMap;

const KEY_PKH: &[u8] = b"pkh";
const KEY_SIGNER_SK: &[u8] = b"signersk";
const KEY_SIGNER_TYPE: &[u8] = b"signertype";
const KEY_BIP_PATH: &[u8] = b"bippath";
const KEY_PAUSED: &[u8] = b"paused";

const ENDPOINTS: &str = "endpoints";
const NOTIFS: &str = "notifs";

fn put(w: &WriteTransaction<'_>, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
    let mut config = w.open_table(CONFIG).map_err(backend)?;
    config.insert(key, value).map_err(backend)?;
    Ok(())
}

/// Adds `url` under the next endpoint id unless it is already present.
fn add_endpoint_in(w: &WriteTransaction<'_>, url: &str) -> Result<Option<u64>, StorageError> {
    {
        let config = w.open_table(CONFIG).map_err(backend)?;
        let prefix = nested_key(ENDPOINTS, &[]);
        for key in keys_with_prefix(&config, &prefix)? {
            let duplicate = config
                .get(key.as_slice())
                .map_err(backend)?
                .is_some_and(|v| v.value() == url.as_bytes());
            if duplicate {
                return Ok(None);
            }
        }
    }
    let id = sequence_in(w, SEQ_ENDPOINTS)? + 1;
    set_sequence_in(w, SEQ_ENDPOINTS, id)?;
    put(w, &nested_key(ENDPOINTS, &be64(id)), url.as_bytes())?;
    Ok(Some(id))
}

impl RedbBakerStore {
    fn get_config(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let r = self.read_txn()?;
        let config = r.open_table(CONFIG).map_err(backend)?;
        let value = config
            .get(key)
            .map_err(backend)?
            .map(|g| g.value().to_vec());
        Ok(value)
    }

    fn get_config_string(&self, key: &[u8]) -> Result<String, StorageError> {
        match self.get_config(key)? {
            None => Ok(String::new()),
            Some(bytes) => {
                String::from_utf8(bytes).map_err(|e| StorageError::Decode(e.to_string()))
            }
        }
    }

    fn put_config(&self, entries: &[(&[u8], &[u8])]) -> Result<(), StorageError> {
        let w = self.write_txn()?;
        for (key, value) in entries {
            put(&w, key, value)?;
        }
        w.commit().map_err(backend)
    }
}

impl DelegateStore for RedbBakerStore {
    fn delegate(&self) -> Result<(String, String), StorageError> {
        Ok((
            self.get_config_string(KEY_SIGNER_SK)?,
            self.get_config_string(KEY_PKH)?,
        ))
    }

    fn set_delegate(&self, secret_key_ref: &str, pkh: &str) -> Result<(), StorageError> {
        self.put_config(&[
            (KEY_SIGNER_SK, secret_key_ref.as_bytes()),
            (KEY_PKH, pkh.as_bytes()),
        ])?;
        tracing::info!(target: "storage", pkh, "delegate saved");
        Ok(())
    }

    fn signer_type(&self) -> Result<Option<SignerType>, StorageError> {
        let Some(bytes) = self.get_config(KEY_SIGNER_TYPE)? else {
            return Ok(None);
        };
        match decode_u64(&bytes)? {
            0 => Ok(None),
            raw => SignerType::try_from(raw)
                .map(Some)
                .map_err(|e| StorageError::Decode(e.to_string())),
        }
    }

    fn set_signer_type(&self, signer_type: SignerType) -> Result<(), StorageError> {
        self.put_config(&[(KEY_SIGNER_TYPE, be64(signer_type.as_u64()).as_slice())])?;
        tracing::info!(target: "storage", %signer_type, "signer type saved");
        Ok(())
    }

    fn save_ledger_config(&self, pkh: &str, bip_path: &str) -> Result<(), StorageError> {
        self.put_config(&[
            (KEY_SIGNER_TYPE, be64(SignerType::Ledger.as_u64()).as_slice()),
            (KEY_PKH, pkh.as_bytes()),
            (KEY_BIP_PATH, bip_path.as_bytes()),
        ])?;
        tracing::info!(target: "storage", pkh, bip_path, "ledger configuration saved");
        Ok(())
    }

    fn ledger_config(&self) -> Result<(String, String), StorageError> {
        Ok((
            self.get_config_string(KEY_PKH)?,
            self.get_config_string(KEY_BIP_PATH)?,
        ))
    }

    fn set_paused(&self, paused: bool) -> Result<(), StorageError> {
        self.put_config(&[(KEY_PAUSED, [u8::from(paused)].as_slice())])?;
        tracing::info!(target: "storage", paused, "pause flag updated");
        Ok(())
    }

    fn is_paused(&self) -> Result<bool, StorageError> {
        Ok(self
            .get_config(KEY_PAUSED)?
            .is_some_and(|v| v.first() == Some(&1)))
    }
}

impl EndpointRegistry for RedbBakerStore {
    fn add_endpoint(&self, url: &str) -> Result<Option<u64>, StorageError> {
        let w = self.write_txn()?;
        let id = add_endpoint_in(&w, url)?;
        match id {
            Some(id) => {
                w.commit().map_err(backend)?;
                tracing::info!(target: "storage", id, url, "endpoint added");
            }
            None => {
                w.abort().map_err(backend)?;
                tracing::debug!(target: "storage", url, "endpoint already registered");
            }
        }
        Ok(id)
    }

    fn list_endpoints(&self) -> Result<BTreeMap<u64, String>, StorageError> {
        let prefix = nested_key(ENDPOINTS, &[]);
        let r = self.read_txn()?;
        let config = r.open_table(CONFIG).map_err(backend)?;
        let mut out = BTreeMap::new();
        for entry in config.range(prefix.as_slice()..).map_err(backend)? {
            let (k, v) = entry.map_err(backend)?;
            let Some(id_bytes) = k.value().strip_prefix(prefix.as_slice()) else {
                break;
            };
            let url = String::from_utf8(v.value().to_vec())
                .map_err(|e| StorageError::Decode(e.to_string()))?;
            out.insert(decode_u64(id_bytes)?, url);
        }
        Ok(out)
    }

    fn delete_endpoint(&self, id: u64) -> Result<(), StorageError> {
        let w = self.write_txn()?;
        let removed = {
            let mut config = w.open_table(CONFIG).map_err(backend)?;
            let value = config
                .remove(nested_key(ENDPOINTS, &be64(id)).as_slice())
                .map_err(backend)?
                .is_some();
            value
        };
        if !removed {
            w.abort().map_err(backend)?;
            return Err(StorageError::NotFound);
        }
        w.commit().map_err(backend)?;
        tracing::info!(target: "storage", id, "endpoint deleted");
        Ok(())
    }

    fn add_default_endpoints(&self, network: Network) -> Result<usize, StorageError> {
        let w = self.write_txn()?;
        if sequence_in(&w, SEQ_ENDPOINTS)? != 0 {
            w.abort().map_err(backend)?;
            return Ok(0);
        }
        let mut added = 0;
        for url in network.default_endpoints() {
            if add_endpoint_in(&w, url)?.is_some() {
                added += 1;
            }
        }
        w.commit().map_err(backend)?;
        tracing::info!(target: "storage", %network, added, "seeded default endpoints");
        Ok(added)
    }
}

impl NotifierConfigStore for RedbBakerStore {
    fn notifier_config(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.get_config(&nested_key(NOTIFS, name.as_bytes()))
    }

    fn save_notifier_config(&self, name: &str, config: &[u8]) -> Result<(), StorageError> {
        self.put_config(&[(nested_key(NOTIFS, name.as_bytes()).as_slice(), config)])
    }
}

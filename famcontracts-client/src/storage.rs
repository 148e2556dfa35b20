//! Persistent [`KeyValueStore`] backends: OS keyring and a YAML file.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use famcontracts_shared::storage::{KeyValueStore, MemoryStore, StorageError};
use tracing::debug;

use crate::AppError;
use crate::config::{ClientConfig, StorageKind, default_storage_path, normalize_server_url};

const KEYRING_SERVICE: &str = "famcontracts-client";

/// Keyring entries are scoped by the normalized server URL so that two
/// backends never share a token.
pub struct KeyringStore {
    scope: String,
}

impl KeyringStore {
    pub fn new(server_url: &str) -> Self {
        Self {
            scope: normalize_server_url(server_url),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry, StorageError> {
        keyring::Entry::new(KEYRING_SERVICE, &format!("{}@{}", key, self.scope))
            .map_err(|e| StorageError::Backend(e.to_string()))
    }
}

impl KeyValueStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.entry(key)?.get_password() {
            Ok(v) => Ok(Some(v)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StorageError::Backend(e.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| StorageError::Backend(e.to_string()))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StorageError::Backend(e.to_string())),
        }
    }
}

/// Flat YAML map on disk. Writes go through a temp file and rename.
pub struct FileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if data.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_yaml::from_str(&data).map_err(|e| StorageError::Encoding(e.to_string()))
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;
        let data = serde_yaml::to_string(map).map_err(|e| StorageError::Encoding(e.to_string()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(data.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| StorageError::Io(e.error))?;
        debug!(path=%self.path.display(), entries = map.len(), "storage file written");
        Ok(())
    }

    fn modify<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _lock = self
            .guard
            .lock()
            .map_err(|_| StorageError::Backend("file store lock poisoned".into()))?;
        let mut map = self.read_map()?;
        f(&mut map);
        self.write_map(&map)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.modify(|m| {
            m.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if !self.path.exists() {
            return Ok(());
        }
        self.modify(|m| {
            m.remove(key);
        })
    }
}

pub fn open_store(cfg: &ClientConfig) -> Result<Arc<dyn KeyValueStore>, AppError> {
    let store: Arc<dyn KeyValueStore> = match cfg.storage {
        StorageKind::Keyring => Arc::new(KeyringStore::new(&cfg.server_url)),
        StorageKind::File => {
            let path = match &cfg.storage_path {
                Some(p) => p.clone(),
                None => default_storage_path()
                    .ok_or_else(|| AppError::Config("could not determine data dir".into()))?,
            };
            Arc::new(FileStore::new(path))
        }
        StorageKind::Memory => Arc::new(MemoryStore::new()),
    };
    debug!(kind=?cfg.storage, "storage backend selected");
    Ok(store)
}

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use tempfile::NamedTempFile;

use crate::error::ClientError;

/// Durable string key/value medium backing the session record.
///
/// Keys are independent, but batch writes (`set_many` / `remove_many`) must
/// land as one unit so readers never see half of a batch.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.set_many(&[(key, value)])
    }
    fn remove(&self, key: &str) -> Result<(), ClientError> {
        self.remove_many(&[key])
    }
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), ClientError>;
    fn remove_many(&self, keys: &[&str]) -> Result<(), ClientError>;
}

/// In-process storage, lost when the process exits.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, ClientError> {
        self.entries
            .lock()
            .map_err(|_| ClientError::storage("memory storage lock poisoned"))
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), ClientError> {
        let mut map = self.lock()?;
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), ClientError> {
        let mut map = self.lock()?;
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

/// JSON object on disk. Every write replaces the file atomically through a
/// temp file in the same directory.
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, ClientError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents).map_err(|e| {
            ClientError::storage(format!(
                "{} is not a valid storage file: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Reads the current map for a write. A corrupt file is discarded.
    fn read_map_for_write(&self) -> Result<BTreeMap<String, String>, ClientError> {
        match self.read_map() {
            Ok(map) => Ok(map),
            Err(ClientError::Storage(msg)) => {
                tracing::warn!(path = %self.path.display(), error = %msg, "discarding corrupt storage file");
                Ok(BTreeMap::new())
            }
            Err(e) => Err(e),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), ClientError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, map)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| ClientError::Io(e.error))?;
        Ok(())
    }

    fn update<F>(&self, apply: F) -> Result<(), ClientError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| ClientError::storage("file storage lock poisoned"))?;
        let mut map = self.read_map_for_write()?;
        apply(&mut map);
        self.write_map(&map)
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        Ok(self.read_map()?.remove(key))
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), ClientError> {
        self.update(|map| {
            for (key, value) in entries {
                map.insert((*key).to_string(), (*value).to_string());
            }
        })
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), ClientError> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|map| {
            for key in keys {
                map.remove(*key);
            }
        })
    }
}

//! Durable client storage
//!
//! A small string key-value store that survives restarts. The session keeps the
//! bearer token under `token` and the JSON-serialized user under `user`.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use crate::errors::{ClientError, ClientResult};

/// Storage key holding the bearer token
pub const TOKEN_KEY: &str = "token";
/// Storage key holding the JSON-serialized user
pub const USER_KEY: &str = "user";

const STORAGE_FILE: &str = "session.json";

/// Synchronous key-value storage
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> ClientResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> ClientResult<()>;
    fn remove(&self, key: &str) -> ClientResult<()>;
}

/// In-memory storage for tests and sessions that should not persist
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> ClientResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| ClientError::Storage("memory storage lock poisoned".to_string()))
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Storage backed by a JSON object in a file
///
/// Every write rewrites the whole file; the store only ever holds a handful of keys.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// `session.json` under the platform data directory
    pub fn in_data_dir(app_name: &str) -> ClientResult<Self> {
        let dir = dirs::data_dir()
            .ok_or_else(|| ClientError::Storage("no platform data directory".to_string()))?;
        Ok(Self::new(dir.join(app_name).join(STORAGE_FILE)))
    }

    /// Uses `path` when given, the platform data directory otherwise
    pub fn from_config(path: Option<&Path>) -> ClientResult<Self> {
        match path {
            Some(path) => Ok(Self::new(path)),
            None => Self::in_data_dir("marketplace"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> ClientResult<HashMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| ClientError::Storage(format!("corrupt storage file: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, values: &HashMap<String, String>) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(values)
            .map_err(|e| ClientError::Storage(e.to_string()))?;
        fs::write(&self.path, raw)?;
        Ok(())
    }

    fn update(&self, op: impl FnOnce(&mut HashMap<String, String>)) -> ClientResult<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| ClientError::Storage("file storage lock poisoned".to_string()))?;
        let mut values = self.read_all()?;
        op(&mut values);
        self.write_all(&values)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        self.update(|values| {
            values.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        storage.set(TOKEN_KEY, "abc").unwrap();
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("abc"));
        storage.remove(TOKEN_KEY).unwrap();
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn configured_path_wins_over_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let config = crate::config::ClientConfig::default().with_storage_path(&path);

        let storage = FileStorage::from_config(config.storage_path.as_deref()).unwrap();
        assert_eq!(storage.path(), path.as_path());

        storage.set(TOKEN_KEY, "t-2").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let first = FileStorage::new(&path);
        assert_eq!(first.get(USER_KEY).unwrap(), None);
        first.set(TOKEN_KEY, "t-1").unwrap();
        first.set(USER_KEY, r#"{"id":1}"#).unwrap();

        let second = FileStorage::new(&path);
        assert_eq!(second.get(TOKEN_KEY).unwrap().as_deref(), Some("t-1"));
        assert_eq!(second.get(USER_KEY).unwrap().as_deref(), Some(r#"{"id":1}"#));

        second.remove(TOKEN_KEY).unwrap();
        assert_eq!(first.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            FileStorage::new(&path).get(TOKEN_KEY),
            Err(ClientError::Storage(_))
        ));
    }
}

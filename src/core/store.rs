use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::models::User;

pub const TOKEN_KEY: &str = "jwt_token";
pub const USER_KEY: &str = "currentUser";

/// String key-value storage that outlives the process, in the spirit of a
/// browser's local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn delete(&self, key: &str) -> anyhow::Result<()>;

    /// Remove every key in `keys` as a single write.
    fn delete_all(&self, keys: &[&str]) -> anyhow::Result<()>;
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn delete_all(&self, keys: &[&str]) -> anyhow::Result<()> {
        let mut entries = self.entries.lock();
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

/// A JSON object on disk. Every mutation rewrites the whole file through a
/// temp file and a rename, so readers see either the old or the new state.
/// The in-memory view only changes once the write has landed.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`; a missing file starts empty.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("session file {} is not a JSON object", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()))
            }
        };

        debug!(path = %path.display(), keys = entries.len(), "opened file store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }

        let tmp = self
            .path
            .with_extension(format!("tmp-{}", Uuid::new_v4().simple()));
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e).with_context(|| format!("failed to replace {}", self.path.display()));
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut entries = self.entries.lock();
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.delete_all(&[key])
    }

    fn delete_all(&self, keys: &[&str]) -> anyhow::Result<()> {
        let mut entries = self.entries.lock();
        if !keys.iter().any(|key| entries.contains_key(*key)) {
            return Ok(());
        }
        let mut next = entries.clone();
        for key in keys {
            next.remove(*key);
        }
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}

/// Typed access to the persisted bearer token and user snapshot.
#[derive(Clone)]
pub struct TokenStore {
    inner: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn token(&self) -> anyhow::Result<Option<String>> {
        Ok(self.inner.get(TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    pub fn set_token(&self, token: &str) -> anyhow::Result<()> {
        self.inner.set(TOKEN_KEY, token)
    }

    pub fn has_token(&self) -> bool {
        matches!(self.token(), Ok(Some(_)))
    }

    /// The cached user snapshot. A snapshot that no longer decodes is
    /// treated as absent.
    pub fn user(&self) -> anyhow::Result<Option<User>> {
        let Some(raw) = self.inner.get(USER_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(error = %e, "discarding unreadable cached user");
                Ok(None)
            }
        }
    }

    pub fn set_user(&self, user: &User) -> anyhow::Result<()> {
        self.inner.set(USER_KEY, &serde_json::to_string(user)?)
    }

    pub fn clear_user(&self) -> anyhow::Result<()> {
        self.inner.delete(USER_KEY)
    }

    /// Drop token and user together.
    pub fn clear(&self) -> anyhow::Result<()> {
        self.inner.delete_all(&[TOKEN_KEY, USER_KEY])
    }
}

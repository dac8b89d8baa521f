//! Persistent token storage, the client-side counterpart of browser local storage.

use std::io;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde_json::{Map, Value};

pub const TOKEN_KEY: &str = "auth_token";

pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, token: &str) -> io::Result<()>;
    fn remove(&self) -> io::Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: &str) -> Self {
        Self { slot: RwLock::new(Some(token.to_string())) }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.slot.read().clone()
    }
    fn set(&self, token: &str) -> io::Result<()> {
        *self.slot.write() = Some(token.to_string());
        Ok(())
    }
    fn remove(&self) -> io::Result<()> {
        *self.slot.write() = None;
        Ok(())
    }
}

/// Key/value JSON file, e.g. `~/.memberportal/storage.json` holding `{"auth_token": "..."}`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Map<String, Value> {
        std::fs::read(&self.path)
            .ok()
            .and_then(|b| serde_json::from_slice::<Map<String, Value>>(&b).ok())
            .unwrap_or_default()
    }

    fn save(&self, map: &Map<String, Value>) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(map).map_err(io::Error::other)?;
        std::fs::write(&self.path, bytes)
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        self.load().get(TOKEN_KEY).and_then(Value::as_str).map(str::to_string)
    }
    fn set(&self, token: &str) -> io::Result<()> {
        let mut map = self.load();
        map.insert(TOKEN_KEY.to_string(), Value::String(token.to_string()));
        self.save(&map)
    }
    fn remove(&self) -> io::Result<()> {
        let mut map = self.load();
        if map.remove(TOKEN_KEY).is_none() {
            return Ok(());
        }
        self.save(&map)
    }
}

// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use crate::config::Config;
use crate::models::{Item, StreamKind};
use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const FAVOURITES_KEY: &str = "favourites";
const RECENT_KEY: &str = "recent";
const MAX_RECENT: usize = 10;

/// Storage for opaque JSON values by key
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// Short stable directory name for a portal's data
pub fn portal_hash(server_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(server_url.as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}

/// One JSON file per key in a directory
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
        }
        Ok(Self { dir })
    }

    /// Store under the config directory, separate per portal URL.
    pub fn for_portal(server_url: &str) -> Result<Self> {
        let dir = Config::ensure_config_dir()?
            .join("data")
            .join(portal_hash(server_url));
        Self::new(dir)
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read data file: {}", path.display()))?;
        let value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse data file: {}", path.display()))?;
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let path = self.path(key);
        let content =
            serde_json::to_string_pretty(&value).with_context(|| "Failed to serialize data")?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write data file: {}", path.display()))?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, Value>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }
}

/// Favourite or recently watched entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: String,
    pub cmd: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Epoch milliseconds
    pub timestamp: i64,
}

impl HistoryRecord {
    pub fn from_item(item: &Item) -> Self {
        Self {
            id: item.id().to_string(),
            cmd: item.cmd().to_string(),
            name: item.name().to_string(),
            kind: item.type_tag().to_string(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    fn is(&self, id: &str, kind: &str) -> bool {
        self.id == id && self.kind == kind
    }

    pub fn touched_now(mut self) -> Self {
        self.timestamp = Utc::now().timestamp_millis();
        self
    }

    /// "5m ago" style age relative to `now_millis`.
    pub fn age(&self, now_millis: i64) -> String {
        let secs = (now_millis - self.timestamp).max(0) / 1000;
        match secs {
            0..60 => "just now".to_string(),
            60..3600 => format!("{}m ago", secs / 60),
            3600..86_400 => format!("{}h ago", secs / 3600),
            _ => format!("{}d ago", secs / 86_400),
        }
    }

    /// `None` for series, which are browsed rather than played.
    pub fn stream_kind(&self) -> Option<StreamKind> {
        match self.kind.as_str() {
            "series" => None,
            other => other.parse().ok(),
        }
    }
}

pub struct History<S> {
    store: S,
}

impl<S: KeyValueStore> History<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn load(&self, key: &str) -> Result<Vec<HistoryRecord>> {
        match self.store.get(key)? {
            Some(value) => serde_json::from_value(value)
                .with_context(|| format!("Failed to parse stored {}", key)),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, key: &str, records: &[HistoryRecord]) -> Result<()> {
        let value = serde_json::to_value(records)
            .with_context(|| format!("Failed to serialize {}", key))?;
        self.store.set(key, value)
    }

    pub fn favourites(&self) -> Result<Vec<HistoryRecord>> {
        self.load(FAVOURITES_KEY)
    }

    pub fn is_favourite(&self, item: &Item) -> Result<bool> {
        Ok(self
            .favourites()?
            .iter()
            .any(|f| f.is(item.id(), item.type_tag())))
    }

    /// Add or remove `item`. Returns whether it is now a favourite.
    pub fn toggle_favourite(&self, item: &Item) -> Result<bool> {
        let mut favourites = self.favourites()?;
        let before = favourites.len();
        favourites.retain(|f| !f.is(item.id(), item.type_tag()));

        let added = favourites.len() == before;
        if added {
            favourites.push(HistoryRecord::from_item(item));
        }
        self.save(FAVOURITES_KEY, &favourites)?;

        debug!(
            "{} favourite {} ({})",
            if added { "Added" } else { "Removed" },
            item.name(),
            item.type_tag()
        );
        Ok(added)
    }

    pub fn recent(&self) -> Result<Vec<HistoryRecord>> {
        self.load(RECENT_KEY)
    }

    /// Most recent first, one entry per item, capped.
    pub fn add_recent(&self, item: &Item) -> Result<()> {
        self.push_recent(HistoryRecord::from_item(item))
    }

    pub fn push_recent(&self, record: HistoryRecord) -> Result<()> {
        let mut recent = self.recent()?;
        recent.retain(|r| !r.is(&record.id, &record.kind));
        recent.insert(0, record);
        recent.truncate(MAX_RECENT);
        self.save(RECENT_KEY, &recent)
    }
}

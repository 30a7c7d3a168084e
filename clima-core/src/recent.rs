//! Recently viewed cities, most recent first, persisted as one JSON blob in a
//! key-value store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt::Debug,
    fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};
use tracing::warn;

pub const STORAGE_KEY: &str = "weather-recent-cities";
pub const MAX_RECENT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentCityRecord {
    pub name: String,
    pub country: String,
    /// Unix milliseconds.
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
}

/// Opaque string blobs addressed by key.
pub trait KeyValueStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> io::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// One `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        write_atomic(&self.path_for(key), value.as_bytes())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "store path must have a parent directory",
        )
    })?;
    fs::create_dir_all(parent)?;

    let tmp_path = path.with_extension(format!("{}.tmp", std::process::id()));
    fs::write(&tmp_path, bytes)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Process-local store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

#[derive(Debug)]
pub struct RecentCities {
    store: Box<dyn KeyValueStore>,
    cities: Vec<RecentCityRecord>,
}

impl RecentCities {
    /// Read the persisted list. Missing or unreadable data yields an empty list.
    pub fn load(store: Box<dyn KeyValueStore>) -> Self {
        let cities = match store.get(STORAGE_KEY) {
            Ok(Some(payload)) => match serde_json::from_str::<Vec<RecentCityRecord>>(&payload) {
                Ok(mut cities) => {
                    cities.truncate(MAX_RECENT);
                    cities
                }
                Err(err) => {
                    warn!(error = %err, "ignoring corrupt recent cities");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "could not read recent cities");
                Vec::new()
            }
        };

        Self { store, cities }
    }

    pub fn cities(&self) -> &[RecentCityRecord] {
        &self.cities
    }

    /// Move `name` to the head of the list, dropping any older entry with the
    /// same name (ignoring case) and evicting past [`MAX_RECENT`].
    pub fn add(&mut self, name: &str, country: &str, at: DateTime<Utc>) {
        let needle = name.to_lowercase();
        self.cities.retain(|city| city.name.to_lowercase() != needle);
        self.cities.insert(
            0,
            RecentCityRecord {
                name: name.to_string(),
                country: country.to_string(),
                timestamp_ms: at.timestamp_millis(),
            },
        );
        self.cities.truncate(MAX_RECENT);
        self.persist();
    }

    pub fn clear(&mut self) {
        self.cities.clear();
        if let Err(err) = self.store.remove(STORAGE_KEY) {
            warn!(error = %err, "could not clear recent cities");
        }
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.cities)
            .map_err(io::Error::other)
            .and_then(|payload| self.store.set(STORAGE_KEY, &payload));

        if let Err(err) = result {
            warn!(error = %err, "could not save recent cities");
        }
    }
}

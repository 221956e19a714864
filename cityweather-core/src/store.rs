//! Pinned cities and the key-value storage they persist to.

use anyhow::{Context, Result};
use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    fmt::Debug,
    fs,
    path::PathBuf,
    rc::Rc,
};

use crate::model::WeatherRecord;

/// Storage key holding the JSON array of pinned records.
pub const PINNED_CITIES_KEY: &str = "pinnedCities";

/// Durable string key-value storage.
pub trait Storage: Debug {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        fs::read_to_string(&path)
            .map(Some)
            .with_context(|| format!("Failed to read storage file: {}", path.display()))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create storage directory: {}", self.dir.display())
        })?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, value)
            .with_context(|| format!("Failed to write storage file: {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace storage file: {}", path.display()))?;

        Ok(())
    }
}

/// In-memory storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let storage = Self::default();
        storage.entries.borrow_mut().insert(key.to_string(), value.to_string());
        storage
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.raw(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

pub fn serialize_records(records: &[WeatherRecord]) -> Result<String> {
    serde_json::to_string(records).context("Failed to serialize pinned cities")
}

/// Parses a persisted array, dropping later duplicates by location name.
pub fn deserialize_records(raw: &str) -> Result<Vec<WeatherRecord>> {
    let records: Vec<WeatherRecord> =
        serde_json::from_str(raw).context("Failed to parse pinned cities")?;

    let mut seen = HashSet::new();
    Ok(records
        .into_iter()
        .filter(|r| seen.insert(r.location_name.clone()))
        .collect())
}

/// Ordered set of pinned records, unique by location name.
///
/// Every mutation rewrites the whole set under [`PINNED_CITIES_KEY`]. When a
/// write fails the in-memory set keeps the change and the error is returned;
/// the next successful write brings storage back in line.
#[derive(Debug)]
pub struct PinnedCities {
    records: Vec<WeatherRecord>,
    storage: Box<dyn Storage>,
}

impl PinnedCities {
    /// Loads the persisted set. Missing or unreadable data yields an empty set.
    pub fn load(storage: Box<dyn Storage>) -> Self {
        let records = match storage.get(PINNED_CITIES_KEY) {
            Ok(Some(raw)) => deserialize_records(&raw).unwrap_or_else(|e| {
                tracing::warn!("Ignoring corrupt pinned cities: {e:#}");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Could not read pinned cities: {e:#}");
                Vec::new()
            }
        };

        tracing::debug!(count = records.len(), "Loaded pinned cities");
        Self { records, storage }
    }

    pub fn list(&self) -> &[WeatherRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, location_name: &str) -> bool {
        self.records.iter().any(|r| r.is_same_city(location_name))
    }

    /// Appends `record`. Returns `false` (and writes nothing) if already pinned.
    pub fn pin(&mut self, record: WeatherRecord) -> Result<bool> {
        if self.contains(&record.location_name) {
            return Ok(false);
        }

        tracing::info!("Pinned {}", record.location_name);
        self.records.push(record);
        self.persist()?;
        Ok(true)
    }

    /// Removes the named record. Returns `false` if it was not pinned.
    pub fn unpin(&mut self, location_name: &str) -> Result<bool> {
        let before = self.records.len();
        self.records.retain(|r| !r.is_same_city(location_name));
        if self.records.len() == before {
            return Ok(false);
        }

        tracing::info!("Unpinned {location_name}");
        self.persist()?;
        Ok(true)
    }

    /// Swaps in a fresher record for an already pinned city, keeping its position.
    pub fn replace(&mut self, record: WeatherRecord) -> Result<bool> {
        let Some(slot) = self.records.iter_mut().find(|r| r.is_same_city(&record.location_name))
        else {
            return Ok(false);
        };

        *slot = record;
        self.persist()?;
        Ok(true)
    }

    fn persist(&mut self) -> Result<()> {
        let raw = serialize_records(&self.records)?;
        self.storage.set(PINNED_CITIES_KEY, &raw)
    }
}

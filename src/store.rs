//! Local persistence
//!
//! `KeyValueStore` is the storage port: string keys, JSON string values.
//! `FileStore` keeps one JSON file per key under the data directory,
//! `MemoryStore` is for tests and ephemeral runs. `LocalBackend` builds the
//! facility tables on top of either.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::activity::{ActivityLog, ActivityOverride, CustomActivityType};
use crate::backend::FacilityBackend;
use crate::error::{Result, StoreError};

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&self, key: &str, value: &str) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
}

/// One `<key>.json` file per key
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path).map_err(|e| StoreError::ReadFailed {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(data))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::WriteFailed {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        // Write then rename so a crash never leaves half a file behind
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| StoreError::WriteFailed {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| StoreError::WriteFailed {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| StoreError::ReadFailed {
                key: "*".to_string(),
                reason: "memory store lock poisoned".to_string(),
            }
            .into())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Read a JSON value, or `T::default()` if the key is absent
pub fn load_json<T>(store: &dyn KeyValueStore, key: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match store.get(key)? {
        Some(data) => Ok(serde_json::from_str(&data)?),
        None => Ok(T::default()),
    }
}

pub fn save_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let data = serde_json::to_string_pretty(value)?;
    store.put(key, &data)
}

const OVERRIDES: &str = "overrides";
const CUSTOM_TYPES: &str = "custom_types";
const ACTIVITY_LOGS: &str = "activity_logs";

/// Facility tables kept in a key-value store, one key per table and facility
pub struct LocalBackend {
    store: Arc<dyn KeyValueStore>,
    // Serializes read-modify-write cycles on the tables
    write_lock: Mutex<()>,
}

impl LocalBackend {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        LocalBackend {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    fn key(facility_id: &str, table: &str) -> String {
        format!("{}__{}", facility_id, table)
    }

    fn load<T>(&self, facility_id: &str, table: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        load_json::<Vec<T>>(self.store.as_ref(), &Self::key(facility_id, table))
    }

    fn save<T: Serialize>(&self, facility_id: &str, table: &str, rows: &[T]) -> Result<()> {
        save_json(self.store.as_ref(), &Self::key(facility_id, table), &rows)
    }

    /// Load a table, let `f` modify it, save it back
    fn update<T, R, F>(&self, facility_id: &str, table: &str, f: F) -> Result<R>
    where
        T: DeserializeOwned + Serialize,
        F: FnOnce(&mut Vec<T>) -> Result<R>,
    {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::WriteFailed {
            key: Self::key(facility_id, table),
            reason: "write lock poisoned".to_string(),
        })?;
        let mut rows: Vec<T> = self.load(facility_id, table)?;
        let result = f(&mut rows)?;
        self.save(facility_id, table, &rows)?;
        Ok(result)
    }
}

#[async_trait]
impl FacilityBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn fetch_overrides(&self, facility_id: &str) -> Result<Vec<ActivityOverride>> {
        self.load(facility_id, OVERRIDES)
    }

    async fn upsert_override(&self, ov: &ActivityOverride) -> Result<ActivityOverride> {
        self.update(&ov.facility_id, OVERRIDES, |rows: &mut Vec<ActivityOverride>| {
            match rows
                .iter_mut()
                .find(|r| r.activity_type_code == ov.activity_type_code)
            {
                Some(existing) => *existing = ov.clone(),
                None => rows.push(ov.clone()),
            }
            Ok(ov.clone())
        })
    }

    async fn delete_override(&self, facility_id: &str, code: &str) -> Result<bool> {
        self.update(facility_id, OVERRIDES, |rows: &mut Vec<ActivityOverride>| {
            let before = rows.len();
            rows.retain(|r| r.activity_type_code != code);
            Ok(rows.len() != before)
        })
    }

    async fn fetch_custom_types(&self, facility_id: &str) -> Result<Vec<CustomActivityType>> {
        self.load(facility_id, CUSTOM_TYPES)
    }

    async fn insert_custom_type(&self, custom: &CustomActivityType) -> Result<CustomActivityType> {
        self.update(
            &custom.facility_id,
            CUSTOM_TYPES,
            |rows: &mut Vec<CustomActivityType>| {
                rows.push(custom.clone());
                Ok(custom.clone())
            },
        )
    }

    async fn set_custom_type_active(
        &self,
        facility_id: &str,
        id: Uuid,
        active: bool,
    ) -> Result<()> {
        self.update(facility_id, CUSTOM_TYPES, |rows: &mut Vec<CustomActivityType>| {
            let row = rows
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("custom activity type {}", id)))?;
            row.is_active = active;
            Ok(())
        })
    }

    async fn delete_custom_type(&self, facility_id: &str, id: Uuid) -> Result<()> {
        self.update(facility_id, CUSTOM_TYPES, |rows: &mut Vec<CustomActivityType>| {
            let before = rows.len();
            rows.retain(|r| r.id != id);
            if rows.len() == before {
                return Err(StoreError::NotFound(format!("custom activity type {}", id)).into());
            }
            Ok(())
        })
    }

    async fn count_logs_referencing(
        &self,
        facility_id: &str,
        custom: &CustomActivityType,
    ) -> Result<usize> {
        let logs: Vec<ActivityLog> = self.load(facility_id, ACTIVITY_LOGS)?;
        Ok(logs
            .iter()
            .filter(|log| log.references_custom_type(custom))
            .count())
    }

    async fn fetch_active_logs(&self, facility_id: &str) -> Result<Vec<ActivityLog>> {
        let logs: Vec<ActivityLog> = self.load(facility_id, ACTIVITY_LOGS)?;
        Ok(logs.into_iter().filter(ActivityLog::is_active).collect())
    }

    async fn insert_log(&self, log: &ActivityLog) -> Result<ActivityLog> {
        debug!(id = %log.id, dog_id = %log.dog_id, "storing activity log");
        self.update(&log.facility_id, ACTIVITY_LOGS, |rows: &mut Vec<ActivityLog>| {
            rows.push(log.clone());
            Ok(log.clone())
        })
    }

    async fn end_log(
        &self,
        facility_id: &str,
        id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> Result<ActivityLog> {
        self.update(facility_id, ACTIVITY_LOGS, |rows: &mut Vec<ActivityLog>| {
            let row = rows
                .iter_mut()
                .find(|r| r.id == id && r.is_active())
                .ok_or_else(|| StoreError::NotFound(format!("active activity {}", id)))?;
            row.ended_at = Some(ended_at);
            Ok(row.clone())
        })
    }
}

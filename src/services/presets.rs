//! Preset storage for named threshold configurations
//!
//! Presets are a flat list of [`ThresholdConfig`] records keyed by id. Read
//! failures never reach the timer: a missing or corrupt file reads as an
//! empty list. Write failures are returned to the caller.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};
use tracing::{debug, info, warn};

use crate::{
    error::StoreError,
    state::{SpeechPreset, ThresholdConfig},
};

/// Collection of named configurations
pub trait PresetStore: Send + Sync {
    fn list_configs(&self) -> Vec<ThresholdConfig>;

    /// Insert, or replace the record with the same id
    fn save_config(&self, config: ThresholdConfig) -> Result<(), StoreError>;

    /// Replace the record with the same id, never inserting.
    /// Returns whether a record was replaced.
    fn update_config(&self, config: ThresholdConfig) -> Result<bool, StoreError>;

    /// Returns whether a record was removed
    fn delete_config(&self, id: &str) -> Result<bool, StoreError>;

    fn get_config(&self, id: &str) -> Option<ThresholdConfig> {
        self.list_configs().into_iter().find(|c| c.id == id)
    }

    /// Seed the standard speech presets when the store is empty
    fn ensure_defaults(&self) -> Result<(), StoreError> {
        if !self.list_configs().is_empty() {
            debug!("Presets already present, skipping defaults");
            return Ok(());
        }

        info!("No presets found, creating defaults");
        for kind in SpeechPreset::DEFAULTS {
            self.save_config(ThresholdConfig::preset(kind))?;
        }
        Ok(())
    }
}

fn upsert(presets: &mut Vec<ThresholdConfig>, config: ThresholdConfig) {
    if let Err(config) = replace(presets, config) {
        presets.push(config);
    }
}

/// Hands the config back when no record has its id
fn replace(presets: &mut [ThresholdConfig], config: ThresholdConfig) -> Result<(), ThresholdConfig> {
    match presets.iter_mut().find(|p| p.id == config.id) {
        Some(existing) => {
            *existing = config;
            Ok(())
        }
        None => Err(config),
    }
}

/// Presets held in memory only
#[derive(Debug, Default)]
pub struct MemoryPresetStore {
    presets: Mutex<Vec<ThresholdConfig>>,
}

impl MemoryPresetStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<ThresholdConfig>>, StoreError> {
        self.presets.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl PresetStore for MemoryPresetStore {
    fn list_configs(&self) -> Vec<ThresholdConfig> {
        self.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn save_config(&self, config: ThresholdConfig) -> Result<(), StoreError> {
        upsert(&mut *self.lock()?, config);
        Ok(())
    }

    fn update_config(&self, config: ThresholdConfig) -> Result<bool, StoreError> {
        Ok(replace(&mut *self.lock()?, config).is_ok())
    }

    fn delete_config(&self, id: &str) -> Result<bool, StoreError> {
        let mut presets = self.lock()?;
        let before = presets.len();
        presets.retain(|p| p.id != id);
        Ok(presets.len() != before)
    }
}

/// Presets persisted as a JSON array in a single file
#[derive(Debug)]
pub struct JsonFilePresetStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles on the file
    write_lock: Mutex<()>,
}

impl JsonFilePresetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Vec<ThresholdConfig> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Failed to read presets from {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        if contents.trim().is_empty() {
            return Vec::new();
        }

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!("Ignoring malformed preset file {}: {}", self.path.display(), e);
            Vec::new()
        })
    }

    fn write(&self, presets: &[ThresholdConfig]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        // Staged beside the target and renamed over it; readers never see a
        // half-written file
        let json = serde_json::to_string_pretty(presets)?;
        let staging = self.staging_path();
        fs::write(&staging, json).map_err(|source| StoreError::WriteFile {
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &self.path).map_err(|source| {
            let _ = fs::remove_file(&staging);
            StoreError::WriteFile {
                path: self.path.clone(),
                source,
            }
        })?;
        debug!("Wrote {} presets to {}", presets.len(), self.path.display());
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "presets".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn modify<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Vec<ThresholdConfig>) -> Option<T>,
        T: Default,
    {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut presets = self.read();
        match f(&mut presets) {
            Some(result) => {
                self.write(&presets)?;
                Ok(result)
            }
            None => Ok(T::default()),
        }
    }
}

impl PresetStore for JsonFilePresetStore {
    fn list_configs(&self) -> Vec<ThresholdConfig> {
        self.read()
    }

    fn save_config(&self, config: ThresholdConfig) -> Result<(), StoreError> {
        self.modify(|presets| {
            upsert(presets, config);
            Some(())
        })
    }

    fn update_config(&self, config: ThresholdConfig) -> Result<bool, StoreError> {
        self.modify(|presets| replace(presets, config).is_ok().then_some(true))
    }

    fn delete_config(&self, id: &str) -> Result<bool, StoreError> {
        self.modify(|presets| {
            let before = presets.len();
            presets.retain(|p| p.id != id);
            (presets.len() != before).then_some(true)
        })
    }
}

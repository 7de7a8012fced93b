// Storage adapters for the persisted dashboard state
use crate::application::ports::StateStorage;
use crate::error::DashboardError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::NamedTempFile;

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStateStorage {
    dir: PathBuf,
}

impl FileStateStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StateStorage for FileStateStorage {
    fn read(&self, key: &str) -> Result<Option<String>, DashboardError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                Err(DashboardError::CorruptState(e.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, payload: &str) -> Result<(), DashboardError> {
        std::fs::create_dir_all(&self.dir)?;

        // Write beside the target, then rename over it
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(payload.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_for(key)).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DashboardError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local storage for ephemeral runs (`storage.backend = "memory"`).
#[derive(Debug, Default)]
pub struct MemoryStateStorage {
    entries: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryStateStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent writes fail like a full disk would.
    #[cfg(test)]
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl StateStorage for MemoryStateStorage {
    fn read(&self, key: &str) -> Result<Option<String>, DashboardError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn write(&self, key: &str, payload: &str) -> Result<(), DashboardError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DashboardError::Io(std::io::Error::new(
                ErrorKind::StorageFull,
                "storage quota exceeded",
            )));
        }
        self.entries.lock().insert(key.to_string(), payload.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DashboardError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::widget_registry::{RegistrySettings, WidgetRegistry};
    use crate::domain::widget::default_widgets;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_file_storage_read_write_remove() {
        let temp = TempDir::new().unwrap();
        let storage = FileStateStorage::new(temp.path().join("nested"));

        assert!(storage.read("dashboard_state").unwrap().is_none());
        storage.write("dashboard_state", "{\"a\":1}").unwrap();
        assert_eq!(
            storage.read("dashboard_state").unwrap().as_deref(),
            Some("{\"a\":1}")
        );

        storage.write("dashboard_state", "{\"a\":2}").unwrap();
        assert_eq!(
            storage.read("dashboard_state").unwrap().as_deref(),
            Some("{\"a\":2}")
        );

        storage.remove("dashboard_state").unwrap();
        assert!(storage.read("dashboard_state").unwrap().is_none());
        storage.remove("dashboard_state").unwrap();
    }

    #[test]
    fn test_registry_over_file_storage() {
        let temp = TempDir::new().unwrap();
        let settings = RegistrySettings {
            key: "dashboard_state".to_string(),
            version: 1,
        };

        let storage = Arc::new(FileStateStorage::new(temp.path()));
        let registry = WidgetRegistry::initialize(storage.clone(), settings.clone());
        registry.set_visibility("widget-5", false);
        assert!(temp.path().join("dashboard_state.json").exists());

        let restored = WidgetRegistry::initialize(storage, settings);
        assert!(!restored.widget("widget-5").unwrap().visible);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("dashboard_state.json"), [0xff, 0xfe, 0x00]).unwrap();

        let storage = Arc::new(FileStateStorage::new(temp.path()));
        let registry = WidgetRegistry::initialize(
            storage.clone(),
            RegistrySettings {
                key: "dashboard_state".to_string(),
                version: 1,
            },
        );
        assert_eq!(*registry.all_widgets(), default_widgets());
        // healed on disk too
        assert!(storage.read("dashboard_state").unwrap().is_some());
    }

    #[test]
    fn test_memory_storage_write_failure() {
        let storage = MemoryStateStorage::new();
        storage.fail_writes(true);
        assert!(matches!(
            storage.write("k", "v"),
            Err(DashboardError::Io(_))
        ));
        storage.fail_writes(false);
        storage.write("k", "v").unwrap();
        assert_eq!(storage.read("k").unwrap().as_deref(), Some("v"));
    }
}

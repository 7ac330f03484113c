use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Durable string records addressed by a fixed key.
pub trait KeyValueStore {
    /// Read the record under `key`, or `None` if it was never written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the record under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// One `<key>.json` file per record inside a data directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    /// Create the data directory if needed.
    pub fn initialize(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create data directory {}", self.dir.display()))?;
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.record_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(content))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.record_path(key);
        // Write beside the record and rename so a crash never leaves half a file
        let tmp_path = self.dir.join(format!(".{}.json.tmp", key));
        std::fs::write(&tmp_path, value)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
pub use memory::MemoryStore;

#[cfg(test)]
mod memory {
    use super::KeyValueStore;
    use anyhow::Result;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// In-memory records. Clones share the same map, so a test can keep a
    /// handle and inspect what the store wrote.
    #[derive(Clone, Default)]
    pub struct MemoryStore {
        records: Rc<RefCell<HashMap<String, String>>>,
        writes: Rc<RefCell<usize>>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_record(self, key: &str, value: &str) -> Self {
            self.records
                .borrow_mut()
                .insert(key.to_string(), value.to_string());
            self
        }

        pub fn record(&self, key: &str) -> Option<String> {
            self.records.borrow().get(key).cloned()
        }

        pub fn write_count(&self) -> usize {
            *self.writes.borrow()
        }
    }

    impl KeyValueStore for MemoryStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.records.borrow().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            *self.writes.borrow_mut() += 1;
            self.records
                .borrow_mut()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }
}

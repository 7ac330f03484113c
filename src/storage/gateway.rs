use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::storage::channel::Channel;
use crate::storage::kv::KeyValueStore;

pub const CHANNELS_KEY: &str = "youtube-channels";
pub const STANDALONE_TAGS_KEY: &str = "youtube-standalone-tags";

/// Reads and writes the channel and standalone-tag records as JSON.
pub struct PersistenceGateway {
    store: Box<dyn KeyValueStore>,
}

impl PersistenceGateway {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        PersistenceGateway {
            store: Box::new(store),
        }
    }

    /// Decode the record under `key`. Missing, unreadable and malformed
    /// records all come back as `None`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "record absent");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "failed to read record, treating as absent");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "failed to decode record, treating as absent");
                None
            }
        }
    }

    /// Serialize `value` and overwrite the record under `key`.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)
            .with_context(|| format!("Failed to encode record {}", key))?;
        self.store.set(key, &json)?;
        debug!(key, bytes = json.len(), "record written");
        Ok(())
    }

    pub fn load_channels(&self) -> Option<Vec<Channel>> {
        self.load(CHANNELS_KEY)
    }

    pub fn load_standalone_tags(&self) -> Option<Vec<String>> {
        self.load(STANDALONE_TAGS_KEY)
    }

    /// Write the channel record, skipping an empty collection so a saved
    /// non-empty record is never clobbered. Returns whether a write happened.
    pub fn save_channels(&self, channels: &[Channel]) -> Result<bool> {
        if channels.is_empty() {
            debug!("channel collection empty, record left untouched");
            return Ok(false);
        }
        self.save(CHANNELS_KEY, channels)?;
        Ok(true)
    }

    /// Write the standalone-tag record, empty or not.
    pub fn save_standalone_tags(&self, tags: &[String]) -> Result<()> {
        self.save(STANDALONE_TAGS_KEY, tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv::MemoryStore;

    fn channel(id: &str) -> Channel {
        Channel {
            id: id.to_string(),
            link: format!("https://www.youtube.com/@{}", id),
            name: None,
            tags: vec!["tech".to_string()],
            note: None,
            favourite: false,
        }
    }

    #[test]
    fn absent_records_load_as_none() {
        let gateway = PersistenceGateway::new(MemoryStore::new());
        assert_eq!(gateway.load_channels(), None);
        assert_eq!(gateway.load_standalone_tags(), None);
    }

    #[test]
    fn malformed_records_load_as_none() {
        let memory = MemoryStore::new()
            .with_record(CHANNELS_KEY, "{not json")
            .with_record(STANDALONE_TAGS_KEY, r#"{"tags":1}"#);
        let gateway = PersistenceGateway::new(memory);
        assert_eq!(gateway.load_channels(), None);
        assert_eq!(gateway.load_standalone_tags(), None);
    }

    #[test]
    fn empty_channel_collection_is_not_written() {
        let memory = MemoryStore::new().with_record(CHANNELS_KEY, "[]");
        let gateway = PersistenceGateway::new(memory.clone());

        assert!(!gateway.save_channels(&[]).unwrap());
        assert_eq!(memory.write_count(), 0);

        assert!(gateway.save_channels(&[channel("a")]).unwrap());
        assert_eq!(gateway.load_channels(), Some(vec![channel("a")]));
    }

    #[test]
    fn empty_standalone_tags_are_written() {
        let memory = MemoryStore::new();
        let gateway = PersistenceGateway::new(memory.clone());

        gateway.save_standalone_tags(&[]).unwrap();
        assert_eq!(memory.record(STANDALONE_TAGS_KEY).as_deref(), Some("[]"));

        gateway.save_standalone_tags(&["gaming".to_string()]).unwrap();
        assert_eq!(
            gateway.load_standalone_tags(),
            Some(vec!["gaming".to_string()])
        );
    }
}

use anyhow::Result;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::service::tag_index::TagIndex;
use crate::storage::channel::{self, Channel, ChannelInput};
use crate::storage::gateway::PersistenceGateway;
use crate::storage::sample;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Channel link is required")]
    EmptyLink,
}

/// Reasons a proposed tag name is refused before rename or creation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TagNameError {
    #[error("Tag name is empty")]
    Empty,
    #[error("Tag name is unchanged")]
    Unchanged,
    #[error("Tag already exists: {0}")]
    AlreadyExists(String),
}

/// Read-only view handed to the UI after every operation.
#[derive(Debug)]
pub struct StoreSnapshot<'a> {
    pub channels: &'a [Channel],
    pub all_tags: Vec<String>,
    pub tag_counts: BTreeMap<String, usize>,
    pub selected_tag: Option<&'a str>,
}

/// Owns channels and standalone tags, keeps them consistent, and writes
/// through to storage after each committed change.
pub struct ChannelStore {
    gateway: PersistenceGateway,
    channels: Vec<Channel>,
    standalone_tags: Vec<String>,
    selected_tag: Option<String>,
    persist_error: Option<String>,
}

impl ChannelStore {
    /// Load both records, seeding channels from the bundled sample set when
    /// storage has none. Nothing is written here.
    pub fn open(gateway: PersistenceGateway) -> Result<Self> {
        let channels = match gateway.load_channels() {
            Some(channels) => channels,
            None => {
                let channels = sample::sample_channels()?;
                info!(count = channels.len(), "no saved channels, seeding sample data");
                channels
            }
        };
        let standalone_tags = gateway.load_standalone_tags().unwrap_or_default();

        info!(
            channels = channels.len(),
            standalone_tags = standalone_tags.len(),
            "channel store loaded"
        );

        Ok(ChannelStore {
            gateway,
            channels,
            standalone_tags,
            selected_tag: None,
            persist_error: None,
        })
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn standalone_tags(&self) -> &[String] {
        &self.standalone_tags
    }

    pub fn selected_tag(&self) -> Option<&str> {
        self.selected_tag.as_deref()
    }

    pub fn get_channel(&self, id: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }

    /// Recomputed from current state on every call.
    pub fn tag_index(&self) -> TagIndex {
        TagIndex::build(&self.channels, &self.standalone_tags)
    }

    pub fn snapshot(&self) -> StoreSnapshot<'_> {
        let TagIndex { tags, counts } = self.tag_index();
        StoreSnapshot {
            channels: &self.channels,
            all_tags: tags,
            tag_counts: counts,
            selected_tag: self.selected_tag.as_deref(),
        }
    }

    /// The last write failure, if any, cleared on read.
    pub fn take_persist_error(&mut self) -> Option<String> {
        self.persist_error.take()
    }

    /// Replace the channel matching `target_id` in place, or append a new one
    /// when there is no target or it matches nothing. Returns the channel id.
    pub fn save_channel(
        &mut self,
        input: ChannelInput,
        target_id: Option<&str>,
    ) -> Result<String, StoreError> {
        let input = input.normalized().ok_or(StoreError::EmptyLink)?;

        let position = target_id.and_then(|id| self.channels.iter().position(|c| c.id == id));
        let id = match position {
            Some(index) => {
                let id = self.channels[index].id.clone();
                self.channels[index] = Channel::from_input(id.clone(), input);
                debug!(id = %id, "channel updated");
                id
            }
            None => {
                let id = self.fresh_id(&input.link);
                self.channels.push(Channel::from_input(id.clone(), input));
                debug!(id = %id, "channel created");
                id
            }
        };

        self.drop_used_standalone_tags();
        self.persist_channels();
        self.persist_standalone_tags();
        Ok(id)
    }

    /// Remove a channel. Returns false when no channel had that id.
    pub fn delete_channel(&mut self, id: &str) -> bool {
        let before = self.channels.len();
        self.channels.retain(|c| c.id != id);
        if self.channels.len() == before {
            return false;
        }

        debug!(id, "channel deleted");
        self.persist_channels();
        true
    }

    /// Add a tag with no channels. Blank names and names already known
    /// (exact match) are ignored; returns whether the tag was added.
    pub fn create_standalone_tag(&mut self, name: &str) -> bool {
        if name.trim().is_empty() || self.tag_index().contains(name) {
            return false;
        }

        self.standalone_tags.push(name.to_string());
        debug!(tag = name, "standalone tag created");
        self.persist_standalone_tags();
        true
    }

    /// Rename `old_name` everywhere it appears, keeping each position.
    /// Callers check `validate_new_tag_name` first; an unchecked rename onto
    /// an existing tag merges the two.
    pub fn rename_tag(&mut self, old_name: &str, new_name: &str) {
        if old_name == new_name {
            return;
        }

        let mut changed = false;
        for channel in &mut self.channels {
            if rename_in(&mut channel.tags, old_name, new_name) {
                changed = true;
            }
        }
        if rename_in(&mut self.standalone_tags, old_name, new_name) {
            changed = true;
        }
        if self.selected_tag.as_deref() == Some(old_name) {
            self.selected_tag = Some(new_name.to_string());
        }
        if !changed {
            return;
        }

        debug!(from = old_name, to = new_name, "tag renamed");
        self.drop_used_standalone_tags();
        self.persist_channels();
        self.persist_standalone_tags();
    }

    /// Remove a tag from every channel and from the standalone set.
    pub fn delete_tag(&mut self, name: &str) {
        let mut changed = false;
        for channel in &mut self.channels {
            let before = channel.tags.len();
            channel.tags.retain(|t| t != name);
            changed |= channel.tags.len() != before;
        }
        let before = self.standalone_tags.len();
        self.standalone_tags.retain(|t| t != name);
        changed |= self.standalone_tags.len() != before;

        if self.selected_tag.as_deref() == Some(name) {
            self.selected_tag = None;
        }
        if !changed {
            return;
        }

        debug!(tag = name, "tag deleted");
        self.persist_channels();
        self.persist_standalone_tags();
    }

    pub fn select_tag(&mut self, tag: Option<String>) {
        self.selected_tag = tag;
    }

    /// Trim and check a proposed tag name. `current` is the tag being
    /// renamed, if any.
    pub fn validate_new_tag_name(
        &self,
        name: &str,
        current: Option<&str>,
    ) -> Result<String, TagNameError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TagNameError::Empty);
        }
        if current == Some(name) {
            return Err(TagNameError::Unchanged);
        }
        if self.tag_index().contains(name) {
            return Err(TagNameError::AlreadyExists(name.to_string()));
        }
        Ok(name.to_string())
    }

    /// Channels under the current tag selection that match `query`.
    ///
    /// The query is a case-insensitive substring match against name, tags
    /// and note. A leading `#` matches tag names only.
    pub fn visible_channels(&self, query: &str) -> Vec<&Channel> {
        self.channels
            .iter()
            .filter(|c| match self.selected_tag.as_deref() {
                Some(tag) => c.has_tag(tag),
                None => true,
            })
            .filter(|c| matches_query(c, query))
            .collect()
    }

    fn fresh_id(&self, link: &str) -> String {
        let mut attempt = 0;
        loop {
            let id = channel::generate_id(link, attempt);
            if self.get_channel(&id).is_none() {
                return id;
            }
            attempt += 1;
        }
    }

    fn drop_used_standalone_tags(&mut self) {
        let used: HashSet<&str> = self
            .channels
            .iter()
            .flat_map(|c| c.tags.iter().map(String::as_str))
            .collect();
        self.standalone_tags.retain(|t| !used.contains(t.as_str()));
    }

    fn persist_channels(&mut self) {
        if let Err(e) = self.gateway.save_channels(&self.channels) {
            error!(error = %e, "failed to persist channels");
            self.persist_error = Some(format!("Failed to save channels: {}", e));
        }
    }

    fn persist_standalone_tags(&mut self) {
        if let Err(e) = self.gateway.save_standalone_tags(&self.standalone_tags) {
            error!(error = %e, "failed to persist standalone tags");
            self.persist_error = Some(format!("Failed to save tags: {}", e));
        }
    }
}

/// Replace `old_name` with `new_name` in place, collapsing a repeat if the
/// list already held `new_name`. Returns whether anything changed.
fn rename_in(tags: &mut Vec<String>, old_name: &str, new_name: &str) -> bool {
    let Some(index) = tags.iter().position(|t| t == old_name) else {
        return false;
    };
    tags[index] = new_name.to_string();

    let mut seen = HashSet::new();
    tags.retain(|t| seen.insert(t.clone()));
    true
}

fn matches_query(channel: &Channel, query: &str) -> bool {
    let query = query.trim();
    if query.is_empty() {
        return true;
    }

    if let Some(tag) = query.strip_prefix('#') {
        let tag = tag.trim().to_lowercase();
        return tag.is_empty() || channel.tags.iter().any(|t| t.to_lowercase() == tag);
    }

    let query = query.to_lowercase();
    let contains = |text: &str| text.to_lowercase().contains(&query);
    channel.name.as_deref().is_some_and(contains)
        || channel.tags.iter().any(|t| contains(t.as_str()))
        || channel.note.as_deref().is_some_and(contains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::gateway::{CHANNELS_KEY, STANDALONE_TAGS_KEY};
    use crate::storage::kv::MemoryStore;

    fn input(link: &str, tags: &[&str]) -> ChannelInput {
        ChannelInput {
            link: link.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    /// A store whose storage already holds the given channels and tags.
    fn store_with(channels: &[Channel], standalone: &[&str]) -> (ChannelStore, MemoryStore) {
        let memory = MemoryStore::new()
            .with_record(CHANNELS_KEY, &serde_json::to_string(channels).unwrap())
            .with_record(STANDALONE_TAGS_KEY, &serde_json::to_string(standalone).unwrap());
        let store = ChannelStore::open(PersistenceGateway::new(memory.clone())).unwrap();
        (store, memory)
    }

    fn empty_store() -> (ChannelStore, MemoryStore) {
        store_with(&[], &[])
    }

    fn channel(id: &str, tags: &[&str]) -> Channel {
        Channel {
            id: id.to_string(),
            link: format!("https://www.youtube.com/@{}", id),
            name: Some(format!("Channel {}", id)),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            note: None,
            favourite: false,
        }
    }

    fn saved_channels(memory: &MemoryStore) -> Vec<Channel> {
        serde_json::from_str(&memory.record(CHANNELS_KEY).unwrap()).unwrap()
    }

    fn saved_standalone(memory: &MemoryStore) -> Vec<String> {
        serde_json::from_str(&memory.record(STANDALONE_TAGS_KEY).unwrap()).unwrap()
    }

    fn assert_tags_are_backed(store: &ChannelStore) {
        for tag in store.snapshot().all_tags {
            let on_channel = store.channels().iter().any(|c| c.has_tag(&tag));
            let standalone = store.standalone_tags().contains(&tag);
            assert!(on_channel || standalone, "orphan tag {}", tag);
        }
    }

    #[test]
    fn open_seeds_sample_data_without_writing() {
        let memory = MemoryStore::new();
        let store = ChannelStore::open(PersistenceGateway::new(memory.clone())).unwrap();

        assert_eq!(store.channels(), sample::sample_channels().unwrap().as_slice());
        assert!(store.standalone_tags().is_empty());
        assert_eq!(memory.write_count(), 0);
    }

    #[test]
    fn open_treats_corrupt_channels_as_absent() {
        let memory = MemoryStore::new()
            .with_record(CHANNELS_KEY, "garbage")
            .with_record(STANDALONE_TAGS_KEY, r#"["gaming"]"#);
        let store = ChannelStore::open(PersistenceGateway::new(memory)).unwrap();

        assert_eq!(store.channels(), sample::sample_channels().unwrap().as_slice());
        assert_eq!(store.standalone_tags(), ["gaming"]);
    }

    #[test]
    fn open_keeps_saved_empty_collection() {
        let (store, _) = empty_store();
        assert!(store.channels().is_empty());
    }

    #[test]
    fn standalone_tag_on_empty_store() {
        let (mut store, memory) = empty_store();
        assert!(store.create_standalone_tag("gaming"));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.all_tags, vec!["gaming"]);
        assert_eq!(snapshot.tag_counts["gaming"], 0);
        assert_eq!(saved_standalone(&memory), vec!["gaming"]);
    }

    #[test]
    fn create_standalone_tag_ignores_known_names() {
        let (mut store, memory) = store_with(&[channel("1", &["tech"])], &["art"]);

        assert!(!store.create_standalone_tag("tech"));
        assert!(!store.create_standalone_tag("art"));
        assert!(!store.create_standalone_tag("  "));
        assert_eq!(memory.write_count(), 0);

        assert!(store.create_standalone_tag("Tech"));
        assert_eq!(store.standalone_tags(), ["art", "Tech"]);
    }

    #[test]
    fn save_creates_then_updates_in_place() {
        let (mut store, memory) = empty_store();

        let id = store.save_channel(input("https://x", &["a"]), None).unwrap();
        let again = store
            .save_channel(input("https://x", &["a"]), Some(&id))
            .unwrap();

        assert_eq!(id, again);
        assert_eq!(store.channels().len(), 1);
        assert_eq!(store.channels()[0].id, id);
        assert_eq!(saved_channels(&memory), store.channels());
    }

    #[test]
    fn save_update_keeps_position() {
        let (mut store, _) = store_with(&[channel("1", &[]), channel("2", &[]), channel("3", &[])], &[]);

        let mut edited = input("https://edited", &["new"]);
        edited.name = Some("Edited".to_string());
        edited.favourite = true;
        store.save_channel(edited, Some("2")).unwrap();

        let ids: Vec<&str> = store.channels().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        let updated = store.get_channel("2").unwrap();
        assert_eq!(updated.link, "https://edited");
        assert_eq!(updated.name.as_deref(), Some("Edited"));
        assert_eq!(updated.note, None);
        assert!(updated.favourite);
    }

    #[test]
    fn save_with_unknown_target_creates() {
        let (mut store, _) = store_with(&[channel("1", &[])], &[]);

        let id = store
            .save_channel(input("https://y", &[]), Some("missing"))
            .unwrap();

        assert_ne!(id, "missing");
        assert_eq!(store.channels().len(), 2);
        assert_eq!(store.channels()[1].id, id);
    }

    #[test]
    fn save_rejects_empty_link_without_side_effects() {
        let (mut store, memory) = store_with(&[channel("1", &["tech"])], &["art"]);
        let before = store.channels().to_vec();

        let result = store.save_channel(input("   ", &["art"]), None);
        assert_eq!(result, Err(StoreError::EmptyLink));

        let result = store.save_channel(input("", &["art"]), Some("1"));
        assert_eq!(result, Err(StoreError::EmptyLink));

        assert_eq!(store.channels(), before.as_slice());
        assert_eq!(store.standalone_tags(), ["art"]);
        assert_eq!(memory.write_count(), 0);
    }

    #[test]
    fn save_removes_now_used_standalone_tags() {
        let (mut store, memory) = store_with(&[], &["gaming", "music"]);

        store
            .save_channel(input("https://x", &["gaming", "tech"]), None)
            .unwrap();

        assert_eq!(store.standalone_tags(), ["music"]);
        assert_eq!(saved_standalone(&memory), vec!["music"]);
        assert_eq!(store.tag_index().counts["gaming"], 1);
        assert_tags_are_backed(&store);
    }

    #[test]
    fn new_ids_never_collide() {
        let (mut store, _) = empty_store();
        let mut ids = HashSet::new();
        for _ in 0..50 {
            let id = store.save_channel(input("https://same", &[]), None).unwrap();
            assert!(ids.insert(id));
        }
        assert_eq!(store.channels().len(), 50);
    }

    #[test]
    fn delete_channel_is_idempotent() {
        let (mut store, memory) = store_with(&[channel("1", &["tech"]), channel("2", &["art"])], &[]);

        assert!(store.delete_channel("1"));
        let after_first = store.channels().to_vec();
        let writes = memory.write_count();

        assert!(!store.delete_channel("1"));
        assert_eq!(store.channels(), after_first.as_slice());
        assert_eq!(memory.write_count(), writes);
        assert_eq!(store.snapshot().all_tags, vec!["art"]);
    }

    #[test]
    fn deleting_last_channel_leaves_record_untouched() {
        let (mut store, memory) = store_with(&[channel("1", &[])], &[]);

        assert!(store.delete_channel("1"));
        assert!(store.channels().is_empty());
        assert_eq!(saved_channels(&memory).len(), 1);
    }

    #[test]
    fn delete_tag_from_channel() {
        let (mut store, memory) = store_with(&[channel("1", &["gaming", "tech"])], &[]);

        store.delete_tag("tech");

        assert_eq!(store.channels()[0].tags, vec!["gaming"]);
        assert_eq!(store.snapshot().all_tags, vec!["gaming"]);
        assert_eq!(saved_channels(&memory)[0].tags, vec!["gaming"]);
    }

    #[test]
    fn delete_tag_propagates_everywhere() {
        let (mut store, _) = store_with(
            &[channel("1", &["tech", "art"]), channel("2", &["tech"])],
            &["music"],
        );
        store.select_tag(Some("tech".to_string()));

        store.delete_tag("tech");
        store.delete_tag("music");

        assert!(store.channels().iter().all(|c| !c.has_tag("tech")));
        assert!(store.standalone_tags().is_empty());
        assert_eq!(store.selected_tag(), None);
        assert_eq!(store.snapshot().all_tags, vec!["art"]);
    }

    #[test]
    fn delete_unknown_tag_keeps_other_selection() {
        let (mut store, memory) = store_with(&[channel("1", &["tech"])], &[]);
        store.select_tag(Some("tech".to_string()));

        store.delete_tag("nope");

        assert_eq!(store.selected_tag(), Some("tech"));
        assert_eq!(memory.write_count(), 0);
    }

    #[test]
    fn rename_tag_keeps_positions_and_selection() {
        let (mut store, memory) = store_with(
            &[channel("1", &["a", "old", "b"]), channel("2", &["c"]), channel("3", &["old"])],
            &[],
        );
        store.select_tag(Some("old".to_string()));

        store.rename_tag("old", "new");

        assert_eq!(store.channels()[0].tags, vec!["a", "new", "b"]);
        assert_eq!(store.channels()[1].tags, vec!["c"]);
        assert_eq!(store.channels()[2].tags, vec!["new"]);
        assert!(store.channels().iter().all(|c| !c.has_tag("old")));
        assert_eq!(store.selected_tag(), Some("new"));
        assert_eq!(saved_channels(&memory)[0].tags, vec!["a", "new", "b"]);
    }

    #[test]
    fn rename_standalone_tag() {
        let (mut store, memory) = store_with(&[], &["draft", "other"]);

        store.rename_tag("draft", "final");

        assert_eq!(store.standalone_tags(), ["final", "other"]);
        assert_eq!(saved_standalone(&memory), vec!["final", "other"]);
        assert_eq!(store.snapshot().tag_counts["final"], 0);
    }

    #[test]
    fn rename_onto_used_tag_merges_and_dedups() {
        let (mut store, _) = store_with(&[channel("1", &["old", "x", "new"])], &["old"]);

        store.rename_tag("old", "new");

        assert_eq!(store.channels()[0].tags, vec!["new", "x"]);
        assert!(store.standalone_tags().is_empty());
        assert_tags_are_backed(&store);
    }

    #[test]
    fn select_tag_does_not_write() {
        let (mut store, memory) = store_with(&[channel("1", &["tech"])], &[]);

        store.select_tag(Some("tech".to_string()));
        assert_eq!(store.snapshot().selected_tag, Some("tech"));
        store.select_tag(None);
        assert_eq!(store.snapshot().selected_tag, None);
        assert_eq!(memory.write_count(), 0);
    }

    #[test]
    fn validate_new_tag_name_checks_existing_tags() {
        let (store, _) = store_with(&[channel("1", &["tech"])], &["art"]);

        assert_eq!(store.validate_new_tag_name("  ", None), Err(TagNameError::Empty));
        assert_eq!(
            store.validate_new_tag_name("tech ", Some("tech")),
            Err(TagNameError::Unchanged)
        );
        assert_eq!(
            store.validate_new_tag_name("art", Some("tech")),
            Err(TagNameError::AlreadyExists("art".to_string()))
        );
        assert_eq!(store.validate_new_tag_name(" rust ", None), Ok("rust".to_string()));
    }

    #[test]
    fn visible_channels_filter_by_selection_and_query() {
        let mut gaming = channel("1", &["gaming"]);
        gaming.note = Some("Speedruns every Friday".to_string());
        let mut tech = channel("2", &["tech", "gaming"]);
        tech.name = Some("Hardware Unboxed".to_string());
        let plain = channel("3", &["cooking"]);
        let (mut store, _) = store_with(&[gaming, tech, plain], &[]);

        let ids = |channels: Vec<&Channel>| channels.iter().map(|c| c.id.clone()).collect::<Vec<_>>();

        assert_eq!(ids(store.visible_channels("")), vec!["1", "2", "3"]);
        assert_eq!(ids(store.visible_channels("speedRUN")), vec!["1"]);
        assert_eq!(ids(store.visible_channels("hardware")), vec!["2"]);
        assert_eq!(ids(store.visible_channels("cook")), vec!["3"]);
        assert_eq!(ids(store.visible_channels("#Gaming")), vec!["1", "2"]);
        assert_eq!(ids(store.visible_channels("#gam")), Vec::<String>::new());
        assert_eq!(ids(store.visible_channels("#")), vec!["1", "2", "3"]);

        store.select_tag(Some("gaming".to_string()));
        assert_eq!(ids(store.visible_channels("")), vec!["1", "2"]);
        assert_eq!(ids(store.visible_channels("tech")), vec!["2"]);
    }

    #[test]
    fn operation_sequence_never_leaves_orphan_tags() {
        let (mut store, _) = empty_store();

        store.create_standalone_tag("gaming");
        store.create_standalone_tag("music");
        let id = store.save_channel(input("https://a", &["gaming", "tech"]), None).unwrap();
        assert_tags_are_backed(&store);

        store.rename_tag("tech", "hardware");
        assert_tags_are_backed(&store);

        store.save_channel(input("https://a", &["music"]), Some(&id)).unwrap();
        assert_tags_are_backed(&store);
        assert_eq!(store.snapshot().all_tags, vec!["music"]);

        store.delete_tag("music");
        store.delete_channel(&id);
        assert_tags_are_backed(&store);
        assert!(store.snapshot().all_tags.is_empty());
    }
}

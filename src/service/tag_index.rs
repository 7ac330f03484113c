use std::collections::BTreeMap;

use crate::storage::channel::Channel;

/// Tag names in use plus how many channels carry each one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagIndex {
    /// Every known tag, deduplicated and sorted by code point.
    pub tags: Vec<String>,
    /// Channel count per tag; standalone-only tags map to 0.
    pub counts: BTreeMap<String, usize>,
}

impl TagIndex {
    pub fn build(channels: &[Channel], standalone_tags: &[String]) -> Self {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();

        for channel in channels {
            for tag in &channel.tags {
                *counts.entry(tag.clone()).or_insert(0) += 1;
            }
        }

        for tag in standalone_tags {
            counts.entry(tag.clone()).or_insert(0);
        }

        // BTreeMap keys come out unique, in Unicode code point order (the
        // byte order of UTF-8), not UTF-16 code unit order
        let tags = counts.keys().cloned().collect();
        TagIndex { tags, counts }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.counts.contains_key(tag)
    }
}

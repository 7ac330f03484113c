use anyhow::{Context, Result};

use crate::storage::channel::Channel;

const SAMPLE_CHANNELS: &str = include_str!("sample_channels.json");

/// The channels a fresh install starts with.
pub fn sample_channels() -> Result<Vec<Channel>> {
    serde_json::from_str(SAMPLE_CHANNELS).context("Bundled sample channels are malformed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn sample_dataset_decodes_with_unique_ids() {
        let channels = sample_channels().unwrap();
        assert!(!channels.is_empty());

        let ids: HashSet<&str> = channels.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), channels.len());
        assert!(channels.iter().all(|c| !c.link.trim().is_empty()));
    }
}

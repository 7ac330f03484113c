use serde::{Deserialize, Serialize};

pub const UNNAMED_CHANNEL: &str = "Unnamed Channel";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub favourite: bool,
}

/// Channel fields as submitted by an editor, before an id is attached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelInput {
    pub link: String,
    pub name: Option<String>,
    pub tags: Vec<String>,
    pub note: Option<String>,
    pub favourite: bool,
}

impl Channel {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNNAMED_CHANNEL)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Build a channel from normalized input under the given id.
    pub fn from_input(id: String, input: ChannelInput) -> Self {
        Channel {
            id,
            link: input.link,
            name: input.name,
            tags: input.tags,
            note: input.note,
            favourite: input.favourite,
        }
    }
}

impl ChannelInput {
    /// Trim every text field, turning blank optionals into `None` and
    /// dropping blank or repeated tags. Returns `None` when the link is blank.
    pub fn normalized(self) -> Option<Self> {
        let link = self.link.trim().to_string();
        if link.is_empty() {
            return None;
        }

        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags {
            let tag = tag.trim();
            if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }

        Some(ChannelInput {
            link,
            name: non_blank(self.name),
            tags,
            note: non_blank(self.note),
            favourite: self.favourite,
        })
    }
}

impl From<&Channel> for ChannelInput {
    fn from(channel: &Channel) -> Self {
        ChannelInput {
            link: channel.link.clone(),
            name: channel.name.clone(),
            tags: channel.tags.clone(),
            note: channel.note.clone(),
            favourite: channel.favourite,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Generate a channel id from the link and a nanosecond timestamp.
/// `attempt` salts the hash so callers can retry on collision.
pub fn generate_id(link: &str, attempt: u32) -> String {
    format!(
        "{:x}",
        md5::compute(format!(
            "{}{}{}",
            link,
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0),
            attempt
        ))
    )
}

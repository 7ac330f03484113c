use std::path::PathBuf;

const DATA_DIR_VAR: &str = "CHANTAGS_DATA_DIR";
const LOG_FILTER_VAR: &str = "CHANTAGS_LOG";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the channel and tag records.
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    /// `EnvFilter` directive for the log file.
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup(DATA_DIR_VAR)
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                let home = lookup("HOME")
                    .or_else(|| lookup("USERPROFILE"))
                    .unwrap_or_else(|| ".".to_string());
                PathBuf::from(home).join(".chantags")
            });
        let log_filter = lookup(LOG_FILTER_VAR)
            .filter(|filter| !filter.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Config {
            log_dir: data_dir.join("logs"),
            data_dir,
            log_filter,
        }
    }
}

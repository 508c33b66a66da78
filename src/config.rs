//! Shared config utilities for loading/saving JSON files
//! and resolving API keys from fields or environment variables.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Application folder under the user's data directory.
pub const APP_DIR_NAME: &str = "viet-tts";

/// Per-user data directory (`~/.local/share/viet-tts` on Linux).
/// Falls back to the working directory when the platform has none.
pub fn app_data_dir() -> PathBuf {
    dirs_next::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Generic load for any Serde config type with a `Default` implementation.
/// Falls back to `T::default()` if the file is missing or unparsable.
pub fn load_json_config<T: DeserializeOwned + Default>(path: &Path, label: &str) -> T {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<T>(&content) {
            Ok(config) => {
                tracing::info!("[{}] Loaded config from {}", label, path.display());
                config
            }
            Err(e) => {
                tracing::warn!(
                    "[{}] Failed to parse config {}: {} - using defaults",
                    label,
                    path.display(),
                    e
                );
                T::default()
            }
        },
        Err(_) => {
            tracing::debug!(
                "[{}] No config file at {} - using defaults",
                label,
                path.display()
            );
            T::default()
        }
    }
}

/// Generic save for any Serde value. Creates the parent directory if needed.
pub fn save_json_config<T: Serialize + ?Sized>(
    path: &Path,
    config: &T,
    label: &str,
) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, json)?;
    tracing::info!("[{}] Saved config to {}", label, path.display());
    Ok(())
}

/// Resolve an API key: check the direct `api_key` field first,
/// then fall back to reading the environment variable named in `api_key_env`.
pub fn resolve_api_key(api_key: &Option<String>, api_key_env: &Option<String>) -> Option<String> {
    if let Some(ref key) = api_key {
        let key = key.trim();
        if !key.is_empty() {
            return Some(key.to_string());
        }
    }
    if let Some(ref env_var) = api_key_env {
        if let Ok(key) = std::env::var(env_var) {
            let key = key.trim();
            if !key.is_empty() {
                return Some(key.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct Sample {
        #[serde(default)]
        name: String,
        #[serde(default)]
        count: u32,
    }

    #[test]
    fn missing_file_yields_default() {
        let tmp = tempfile::TempDir::new().unwrap();
        let loaded: Sample = load_json_config(&tmp.path().join("nope.json"), "Test");
        assert_eq!(loaded, Sample::default());
    }

    #[test]
    fn malformed_file_yields_default() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let loaded: Sample = load_json_config(&path, "Test");
        assert_eq!(loaded, Sample::default());
    }

    #[test]
    fn save_creates_parent_and_round_trips() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("dir").join("cfg.json");
        let value = Sample {
            name: "giọng".to_string(),
            count: 3,
        };
        save_json_config(&path, &value, "Test").unwrap();
        let loaded: Sample = load_json_config(&path, "Test");
        assert_eq!(loaded, value);
    }

    #[test]
    fn direct_key_wins_over_env() {
        let key = resolve_api_key(
            &Some("  sk_direct  ".to_string()),
            &Some("VIET_TTS_TEST_UNSET_VAR".to_string()),
        );
        assert_eq!(key.as_deref(), Some("sk_direct"));
    }

    #[test]
    fn blank_key_and_unset_env_resolve_to_none() {
        let key = resolve_api_key(
            &Some("   ".to_string()),
            &Some("VIET_TTS_TEST_DEFINITELY_UNSET".to_string()),
        );
        assert!(key.is_none());
    }
}

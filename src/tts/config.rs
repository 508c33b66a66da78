use super::controller::ControllerTimings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const CATALOG_FILE_NAME: &str = "voices.json";
pub const DEFAULT_API_KEY_ENV: &str = "ELEVENLABS_API_KEY";

// ── App Config ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsAppConfig {
    /// Voice catalog location. Defaults to `voices.json` in the data dir.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub model_id: Option<String>,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_rate")]
    pub default_rate: f32,

    #[serde(default = "default_local_clear_ms")]
    pub local_status_clear_ms: u64,
    #[serde(default = "default_remote_clear_ms")]
    pub remote_status_clear_ms: u64,
}

fn default_api_key_env() -> Option<String> {
    Some(DEFAULT_API_KEY_ENV.to_string())
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_rate() -> f32 {
    1.0
}
fn default_local_clear_ms() -> u64 {
    3000
}
fn default_remote_clear_ms() -> u64 {
    5000
}

impl Default for TtsAppConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            api_key: None,
            api_key_env: default_api_key_env(),
            base_url: None,
            model_id: None,
            output_dir: default_output_dir(),
            default_rate: default_rate(),
            local_status_clear_ms: default_local_clear_ms(),
            remote_status_clear_ms: default_remote_clear_ms(),
        }
    }
}

impl TtsAppConfig {
    /// Resolve the API key: check `api_key` field first, then `api_key_env` environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        crate::config::resolve_api_key(&self.api_key, &self.api_key_env)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.catalog_path
            .clone()
            .unwrap_or_else(|| crate::config::app_data_dir().join(CATALOG_FILE_NAME))
    }

    pub fn timings(&self) -> ControllerTimings {
        ControllerTimings {
            local_status_clear: Duration::from_millis(self.local_status_clear_ms),
            remote_status_clear: Duration::from_millis(self.remote_status_clear_ms),
            ..ControllerTimings::default()
        }
    }
}

pub fn default_config_path() -> PathBuf {
    crate::config::app_data_dir().join(CONFIG_FILE_NAME)
}

/// Load TTS config from a JSON file. Falls back to defaults if file is missing or invalid.
pub fn load_config(path: &Path) -> TtsAppConfig {
    crate::config::load_json_config(path, "TTS")
}

/// Save TTS config to a JSON file.
pub fn save_config(path: &Path, config: &TtsAppConfig) -> std::io::Result<()> {
    crate::config::save_json_config(path, config, "TTS")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_in_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{ "api_key": "sk_test", "default_rate": 1.5 }"#).unwrap();

        let config = load_config(&path);
        assert_eq!(config.api_key.as_deref(), Some("sk_test"));
        assert_eq!(config.default_rate, 1.5);
        assert_eq!(config.api_key_env.as_deref(), Some(DEFAULT_API_KEY_ENV));
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.remote_status_clear_ms, 5000);
    }

    #[test]
    fn timings_follow_config() {
        let config = TtsAppConfig {
            local_status_clear_ms: 10,
            remote_status_clear_ms: 20,
            ..TtsAppConfig::default()
        };
        let timings = config.timings();
        assert_eq!(timings.local_status_clear, Duration::from_millis(10));
        assert_eq!(timings.remote_status_clear, Duration::from_millis(20));
        assert_eq!(timings.download_status_clear, Duration::from_secs(3));
    }

    #[test]
    fn explicit_catalog_path_wins() {
        let config = TtsAppConfig {
            catalog_path: Some(PathBuf::from("/tmp/custom.json")),
            ..TtsAppConfig::default()
        };
        assert_eq!(config.catalog_path(), PathBuf::from("/tmp/custom.json"));
        assert!(TtsAppConfig::default()
            .catalog_path()
            .ends_with(CATALOG_FILE_NAME));
    }

    #[test]
    fn save_then_load_keeps_values() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("cfg").join("config.json");
        let config = TtsAppConfig {
            base_url: Some("http://localhost:1234/v1".into()),
            ..TtsAppConfig::default()
        };
        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path), config);
    }
}

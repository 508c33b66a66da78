//! Cloud voice catalog (`voices.json`).
//!
//! A flat JSON object mapping display names to ElevenLabs voice ids and
//! settings:
//!
//! ```json
//! { "Ngọc Huyền": { "voice_id": "abc123", "settings": { "stability": 0.5 } } }
//! ```
//!
//! Loading never fails: a missing or broken file is an empty catalog.

use super::interface::{TtsError, VoiceDescriptor, VoiceOrigin, VoiceSettings};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogVoice {
    pub name: String,
    pub voice_id: String,
    pub settings: VoiceSettings,
}

impl CatalogVoice {
    pub fn descriptor(&self) -> VoiceDescriptor {
        VoiceDescriptor {
            display_name: self.name.clone(),
            key: self.name.clone(),
            origin: VoiceOrigin::Remote,
            provider_voice_id: Some(self.voice_id.clone()),
            settings: Some(self.settings.clone()),
        }
    }
}

/// On-disk shape of one entry.
#[derive(Debug, Serialize, Deserialize)]
struct CatalogEntry {
    voice_id: String,
    #[serde(default)]
    settings: VoiceSettings,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceCatalog {
    voices: Vec<CatalogVoice>,
}

impl VoiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the catalog at `path`. Any failure yields an empty catalog.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(
                    "[Catalog] Cannot read {}: {} - no cloud voices",
                    path.display(),
                    e
                );
                return Self::new();
            }
        };
        match Self::from_json(&content) {
            Ok(catalog) => {
                tracing::info!(
                    "[Catalog] Loaded {} cloud voices from {}",
                    catalog.len(),
                    path.display()
                );
                catalog
            }
            Err(e) => {
                tracing::warn!(
                    "[Catalog] Invalid catalog {}: {} - no cloud voices",
                    path.display(),
                    e
                );
                Self::new()
            }
        }
    }

    /// Parse catalog JSON. Entries that are not `{ voice_id, settings }` are
    /// skipped; a repeated name replaces the earlier entry.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)?;
        let mut catalog = Self::new();
        for (name, value) in raw {
            match serde_json::from_value::<CatalogEntry>(value) {
                Ok(entry) => catalog.insert(CatalogVoice {
                    name,
                    voice_id: entry.voice_id,
                    settings: entry.settings,
                }),
                Err(e) => tracing::warn!("[Catalog] Skipping voice '{}': {}", name, e),
            }
        }
        Ok(catalog)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for voice in &self.voices {
            let entry = CatalogEntry {
                voice_id: voice.voice_id.clone(),
                settings: voice.settings.clone(),
            };
            map.insert(
                voice.name.clone(),
                serde_json::to_value(entry).unwrap_or(serde_json::Value::Null),
            );
        }
        serde_json::Value::Object(map)
    }

    pub fn save(&self, path: &Path) -> Result<(), TtsError> {
        crate::config::save_json_config(path, &self.to_json(), "Catalog")?;
        Ok(())
    }

    fn insert(&mut self, voice: CatalogVoice) {
        match self.voices.iter_mut().find(|v| v.name == voice.name) {
            Some(existing) => *existing = voice,
            None => self.voices.push(voice),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CatalogVoice> {
        self.voices.iter().find(|v| v.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.voices.iter().map(|v| v.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogVoice> {
        self.voices.iter()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    // ── Voice manager ──────────────────────────────────

    /// Add a voice with recommended settings, or re-point an existing one to a
    /// new voice id while keeping its settings.
    pub fn upsert(&mut self, name: &str, voice_id: &str) -> Result<(), TtsError> {
        let name = name.trim();
        let voice_id = voice_id.trim();
        if name.is_empty() || voice_id.is_empty() {
            return Err(TtsError::Config(
                "voice name and voice id must not be empty".into(),
            ));
        }
        match self.voices.iter_mut().find(|v| v.name == name) {
            Some(existing) => existing.voice_id = voice_id.to_string(),
            None => self.voices.push(CatalogVoice {
                name: name.to_string(),
                voice_id: voice_id.to_string(),
                settings: VoiceSettings::recommended(),
            }),
        }
        Ok(())
    }

    pub fn update_settings(&mut self, name: &str, settings: VoiceSettings) -> Result<(), TtsError> {
        let voice = self
            .voices
            .iter_mut()
            .find(|v| v.name == name)
            .ok_or_else(|| TtsError::VoiceNotFound(name.to_string()))?;
        voice.settings = settings;
        Ok(())
    }

    pub fn reset_settings(&mut self, name: &str) -> Result<(), TtsError> {
        self.update_settings(name, VoiceSettings::recommended())
    }

    pub fn remove(&mut self, name: &str) -> Result<CatalogVoice, TtsError> {
        let idx = self
            .voices
            .iter()
            .position(|v| v.name == name)
            .ok_or_else(|| TtsError::VoiceNotFound(name.to_string()))?;
        Ok(self.voices.remove(idx))
    }
}

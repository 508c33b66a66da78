use super::interface::{TtsError, VoiceDescriptor, VoiceSettings};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io/v1";
pub const DEFAULT_MODEL_ID: &str = "eleven_multilingual_v2";

/// Header carrying the ElevenLabs key.
const API_KEY_HEADER: &str = "xi-api-key";

// ── Backend Trait ───────────────────────────────────────

/// Cloud synthesis: text in, MP3 bytes out. One attempt per call.
#[async_trait]
pub trait RemoteSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceDescriptor,
        api_key: &str,
    ) -> Result<Vec<u8>, TtsError>;
}

#[derive(Serialize)]
struct SynthRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: &'a VoiceSettings,
}

/// Character quota of the account behind a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionUsage {
    #[serde(default)]
    pub tier: String,
    #[serde(default)]
    pub character_count: u64,
    #[serde(default)]
    pub character_limit: u64,
}

impl SubscriptionUsage {
    pub fn remaining(&self) -> u64 {
        self.character_limit.saturating_sub(self.character_count)
    }
}

/// `abcd...wxyz`; short keys are hidden entirely.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

// ── Client ──────────────────────────────────────────────

pub struct ElevenLabsClient {
    client: Client,
    base_url: String,
    model_id: String,
}

impl ElevenLabsClient {
    pub fn new(base_url: Option<String>, model_id: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model_id: model_id.unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn error_from(response: reqwest::Response) -> TtsError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        TtsError::Api { status, body }
    }

    /// Character usage for the account owning `api_key`.
    pub async fn subscription(&self, api_key: &str) -> Result<SubscriptionUsage, TtsError> {
        let url = format!("{}/user/subscription", self.base_url);
        tracing::debug!("[ElevenLabs] GET {} with key {}", url, mask_api_key(api_key));

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(response.json::<SubscriptionUsage>().await?)
    }
}

impl Default for ElevenLabsClient {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[async_trait]
impl RemoteSynthesizer for ElevenLabsClient {
    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceDescriptor,
        api_key: &str,
    ) -> Result<Vec<u8>, TtsError> {
        let voice_id = voice
            .provider_voice_id
            .as_deref()
            .ok_or_else(|| TtsError::VoiceNotFound(voice.key.clone()))?;
        let default_settings = VoiceSettings::default();
        let body = SynthRequest {
            text,
            model_id: &self.model_id,
            voice_settings: voice.settings.as_ref().unwrap_or(&default_settings),
        };
        let url = format!("{}/text-to-speech/{}", self.base_url, voice_id);

        tracing::info!(
            "[ElevenLabs] Synthesizing {} chars with '{}' (key {})",
            text.chars().count(),
            voice.key,
            mask_api_key(api_key)
        );

        let response = self
            .client
            .post(&url)
            .header("Accept", "audio/mpeg")
            .header("Content-Type", "application/json")
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = Self::error_from(response).await;
            tracing::warn!("[ElevenLabs] {}", err);
            return Err(err);
        }

        let bytes = response.bytes().await?;
        tracing::debug!("[ElevenLabs] Received {} bytes of audio", bytes.len());
        Ok(bytes.to_vec())
    }
}

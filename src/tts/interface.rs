use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest input accepted for one generation, in characters after trimming.
pub const MAX_TEXT_CHARS: usize = 5000;

// ── Error Types ────────────────────────────────────────

/// Input problems caught before any backend is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("text is empty")]
    EmptyText,
    #[error("text is {len} characters, limit is {MAX_TEXT_CHARS}")]
    TextTooLong { len: usize },
    #[error("an API key is required for cloud voices")]
    MissingApiKey,
}

impl ValidationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::EmptyText => {
                "Vui lòng nhập văn bản tiếng Việt trước khi chuyển thành giọng nói."
            }
            ValidationError::TextTooLong { .. } => {
                "Văn bản quá dài. Vui lòng nhập tối đa 5000 ký tự."
            }
            ValidationError::MissingApiKey => {
                "Vui lòng nhập API Key ElevenLabs để sử dụng giọng nói chất lượng cao."
            }
        }
    }
}

/// Error codes reported by a platform speech engine.
///
/// Mirrors the Web Speech `SpeechSynthesisErrorEvent.error` values that
/// matter to users; everything else lands in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalErrorKind {
    Network,
    SynthesisFailed,
    SynthesisUnavailable,
    TextTooLong,
    RateNotSupported,
    Other(String),
}

impl LocalErrorKind {
    pub fn from_code(code: &str) -> Self {
        match code {
            "network" => LocalErrorKind::Network,
            "synthesis-failed" => LocalErrorKind::SynthesisFailed,
            "synthesis-unavailable" => LocalErrorKind::SynthesisUnavailable,
            "text-too-long" => LocalErrorKind::TextTooLong,
            "rate-not-supported" => LocalErrorKind::RateNotSupported,
            other => LocalErrorKind::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            LocalErrorKind::Network => "network",
            LocalErrorKind::SynthesisFailed => "synthesis-failed",
            LocalErrorKind::SynthesisUnavailable => "synthesis-unavailable",
            LocalErrorKind::TextTooLong => "text-too-long",
            LocalErrorKind::RateNotSupported => "rate-not-supported",
            LocalErrorKind::Other(code) => code.as_str(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            LocalErrorKind::Network => "Lỗi kết nối mạng. Vui lòng kiểm tra kết nối internet.",
            LocalErrorKind::SynthesisFailed => {
                "Không thể tổng hợp giọng nói. Vui lòng thử lại với giọng khác."
            }
            LocalErrorKind::SynthesisUnavailable => {
                "Dịch vụ tổng hợp giọng nói không khả dụng. Vui lòng thử lại sau."
            }
            LocalErrorKind::TextTooLong => "Văn bản quá dài để xử lý. Vui lòng rút ngắn nội dung.",
            LocalErrorKind::RateNotSupported => {
                "Tốc độ phát không được hỗ trợ. Vui lòng điều chỉnh tốc độ."
            }
            LocalErrorKind::Other(_) => {
                "Đã có lỗi xảy ra trong quá trình chuyển văn bản thành giọng nói."
            }
        }
    }
}

impl fmt::Display for LocalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Không tìm thấy thông tin giọng nói: {0}")]
    VoiceNotFound(String),
    #[error("API Error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("playback failed: {0}")]
    Playback(String),
    #[error("speech engine error: {0}")]
    Local(LocalErrorKind),
    #[error("no generated audio to save")]
    NoAudio,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for TtsError {
    fn from(e: reqwest::Error) -> Self {
        TtsError::Network(e.to_string())
    }
}

// ── Voices ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceOrigin {
    /// Platform speech engine, free, no network.
    Local,
    /// ElevenLabs, needs an API key, produces downloadable MP3.
    Remote,
}

/// ElevenLabs `voice_settings`. Sent verbatim with each request, so unknown
/// keys from the catalog file are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_boost: Option<f32>,
    #[serde(
        default,
        alias = "style_exaggeration",
        skip_serializing_if = "Option::is_none"
    )]
    pub style: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_speaker_boost: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl VoiceSettings {
    /// Settings given to voices added without explicit tuning.
    pub fn recommended() -> Self {
        Self {
            stability: Some(0.5),
            similarity_boost: Some(0.75),
            style: Some(0.0),
            use_speaker_boost: Some(true),
            speed: Some(1.0),
            extra: serde_json::Map::new(),
        }
    }
}

/// One selectable entry of the voice list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceDescriptor {
    pub display_name: String,
    /// Lookup value: platform voice name, `"default"`, or catalog name.
    pub key: String,
    pub origin: VoiceOrigin,
    #[serde(default)]
    pub provider_voice_id: Option<String>,
    #[serde(default)]
    pub settings: Option<VoiceSettings>,
}

impl VoiceDescriptor {
    pub fn is_remote(&self) -> bool {
        self.origin == VoiceOrigin::Remote
    }
}

// ── Generation ─────────────────────────────────────────

/// Built fresh for every start; never stored.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub text: String,
    pub voice: VoiceDescriptor,
    pub rate: f32,
    pub api_key: Option<String>,
}

impl GenerationRequest {
    /// Trim the text and check the guards in order: empty, too long, missing key.
    pub fn validated(
        text: &str,
        voice: VoiceDescriptor,
        rate: f32,
        api_key: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyText);
        }
        let len = text.chars().count();
        if len > MAX_TEXT_CHARS {
            return Err(ValidationError::TextTooLong { len });
        }
        let api_key = api_key.map(str::trim).filter(|k| !k.is_empty());
        if voice.is_remote() && api_key.is_none() {
            return Err(ValidationError::MissingApiKey);
        }
        Ok(Self {
            text: text.to_string(),
            voice,
            rate,
            api_key: api_key.map(str::to_string),
        })
    }
}

/// Last remote clip, kept for download.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub audio: Vec<u8>,
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_voice() -> VoiceDescriptor {
        VoiceDescriptor {
            display_name: "Giọng mặc định tiếng Việt".to_string(),
            key: "default".to_string(),
            origin: VoiceOrigin::Local,
            provider_voice_id: None,
            settings: None,
        }
    }

    fn remote_voice() -> VoiceDescriptor {
        VoiceDescriptor {
            display_name: "Voice A".to_string(),
            key: "Voice A".to_string(),
            origin: VoiceOrigin::Remote,
            provider_voice_id: Some("v1".to_string()),
            settings: Some(VoiceSettings::default()),
        }
    }

    #[test]
    fn blank_text_is_rejected() {
        let err = GenerationRequest::validated("  \n\t ", local_voice(), 1.0, None).unwrap_err();
        assert_eq!(err, ValidationError::EmptyText);
    }

    #[test]
    fn limit_counts_characters_not_bytes() {
        let at_limit = "ạ".repeat(MAX_TEXT_CHARS);
        assert!(GenerationRequest::validated(&at_limit, local_voice(), 1.0, None).is_ok());

        let over = "a".repeat(MAX_TEXT_CHARS + 1);
        let err = GenerationRequest::validated(&over, local_voice(), 1.0, None).unwrap_err();
        assert_eq!(err, ValidationError::TextTooLong { len: MAX_TEXT_CHARS + 1 });
    }

    #[test]
    fn remote_voice_needs_non_blank_key() {
        let err = GenerationRequest::validated("Xin chào", remote_voice(), 1.0, Some("  "))
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingApiKey);

        let req =
            GenerationRequest::validated(" Xin chào ", remote_voice(), 1.0, Some(" sk_1 ")).unwrap();
        assert_eq!(req.text, "Xin chào");
        assert_eq!(req.api_key.as_deref(), Some("sk_1"));
    }

    #[test]
    fn local_voice_ignores_missing_key() {
        assert!(GenerationRequest::validated("Xin chào", local_voice(), 1.0, None).is_ok());
    }

    #[test]
    fn error_codes_round_trip_and_messages_are_distinct() {
        let kinds = [
            LocalErrorKind::Network,
            LocalErrorKind::SynthesisFailed,
            LocalErrorKind::SynthesisUnavailable,
            LocalErrorKind::TextTooLong,
            LocalErrorKind::RateNotSupported,
            LocalErrorKind::Other("interrupted".to_string()),
        ];
        for kind in &kinds {
            assert_eq!(&LocalErrorKind::from_code(kind.code()), kind);
        }
        let mut messages: Vec<&str> = kinds.iter().map(|k| k.user_message()).collect();
        messages.sort();
        messages.dedup();
        assert_eq!(messages.len(), kinds.len());
    }

    #[test]
    fn empty_settings_serialize_to_empty_object() {
        let json = serde_json::to_value(VoiceSettings::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn settings_keep_unknown_keys_and_accept_legacy_style() {
        let settings: VoiceSettings = serde_json::from_value(serde_json::json!({
            "stability": 0.4,
            "style_exaggeration": 0.2,
            "optimize_streaming_latency": 2
        }))
        .unwrap();
        assert_eq!(settings.stability, Some(0.4));
        assert_eq!(settings.style, Some(0.2));
        let back = serde_json::to_value(&settings).unwrap();
        assert_eq!(back["style"], serde_json::json!(0.2f32));
        assert_eq!(back["optimize_streaming_latency"], serde_json::json!(2));
    }
}

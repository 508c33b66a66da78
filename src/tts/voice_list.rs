use super::catalog::VoiceCatalog;
use super::interface::{VoiceDescriptor, VoiceOrigin};
use super::system::PlatformVoice;

/// Key of the synthetic entry meaning "let the engine pick".
pub const DEFAULT_VOICE_KEY: &str = "default";
pub const DEFAULT_VOICE_LABEL: &str = "Giọng mặc định tiếng Việt";
pub const LOCAL_GROUP_LABEL: &str = "🔊 Giọng nói hệ thống tiếng Việt";
pub const REMOTE_GROUP_LABEL: &str = "🇻🇳 Giọng nói tiếng Việt chất lượng cao (Cần API Key)";

/// Voices shown when the platform has no Vietnamese voice at all.
const ENGLISH_FALLBACK_LIMIT: usize = 5;

/// Everything the user can pick from, in display order: the local group
/// (default entry first) followed by the cloud catalog.
///
/// Rebuilt from scratch each time the platform reports voices; building is
/// pure, so doing it twice with the same inputs gives the same list.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceList {
    local: Vec<VoiceDescriptor>,
    remote: Vec<VoiceDescriptor>,
    /// How many real Vietnamese platform voices were found.
    vietnamese_found: usize,
}

fn is_vietnamese(voice: &PlatformVoice) -> bool {
    let lang = voice.language.to_lowercase();
    let name = voice.name.to_lowercase();
    lang.contains("vi") || lang.contains("vn") || name.contains("vietnam")
}

fn is_english(voice: &PlatformVoice) -> bool {
    let lang = voice.language.to_lowercase();
    lang.contains("en") || lang.contains("us") || lang.contains("gb")
}

pub fn default_descriptor() -> VoiceDescriptor {
    VoiceDescriptor {
        display_name: DEFAULT_VOICE_LABEL.to_string(),
        key: DEFAULT_VOICE_KEY.to_string(),
        origin: VoiceOrigin::Local,
        provider_voice_id: None,
        settings: None,
    }
}

impl VoiceList {
    pub fn build(platform: &[PlatformVoice], catalog: &VoiceCatalog) -> Self {
        let mut local = vec![default_descriptor()];

        let vietnamese: Vec<&PlatformVoice> = platform.iter().filter(|v| is_vietnamese(v)).collect();
        let vietnamese_found = vietnamese.len();

        if vietnamese.is_empty() {
            local.extend(
                platform
                    .iter()
                    .filter(|v| is_english(v))
                    .take(ENGLISH_FALLBACK_LIMIT)
                    .map(|v| VoiceDescriptor {
                        display_name: format!("{} (Đọc tiếng Việt)", v.name),
                        key: v.name.clone(),
                        origin: VoiceOrigin::Local,
                        provider_voice_id: None,
                        settings: None,
                    }),
            );
        } else {
            local.extend(vietnamese.into_iter().map(|v| VoiceDescriptor {
                display_name: format!("{} ({})", v.name, v.language),
                key: v.name.clone(),
                origin: VoiceOrigin::Local,
                provider_voice_id: None,
                settings: None,
            }));
        }

        let remote = catalog.iter().map(|v| v.descriptor()).collect();

        Self {
            local,
            remote,
            vietnamese_found,
        }
    }

    /// Local group, default entry first.
    pub fn local(&self) -> &[VoiceDescriptor] {
        &self.local
    }

    /// Cloud group, in catalog order.
    pub fn remote(&self) -> &[VoiceDescriptor] {
        &self.remote
    }

    pub fn iter(&self) -> impl Iterator<Item = &VoiceDescriptor> {
        self.local.iter().chain(self.remote.iter())
    }

    pub fn len(&self) -> usize {
        self.local.len() + self.remote.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn default_voice(&self) -> &VoiceDescriptor {
        &self.local[0]
    }

    /// First entry whose key matches, local group first.
    pub fn find(&self, key: &str) -> Option<&VoiceDescriptor> {
        self.iter().find(|v| v.key == key)
    }

    pub fn find_in(&self, origin: VoiceOrigin, key: &str) -> Option<&VoiceDescriptor> {
        let group = match origin {
            VoiceOrigin::Local => &self.local,
            VoiceOrigin::Remote => &self.remote,
        };
        group.iter().find(|v| v.key == key)
    }

    pub fn vietnamese_found(&self) -> usize {
        self.vietnamese_found
    }

    /// Status line shown after each rebuild.
    pub fn summary(&self) -> String {
        format!(
            "Đã tìm thấy {} giọng hệ thống và {} giọng tiếng Việt chất lượng cao.",
            self.local.len() - 1,
            self.remote.len()
        )
    }
}

pub mod catalog;
pub mod config;
pub mod controller;
pub mod download;
pub mod elevenlabs;
pub mod events;
pub mod interface;
pub mod player;
pub mod system;
pub mod voice_list;

#[cfg(test)]
mod tests;

pub use catalog::{CatalogVoice, VoiceCatalog};
pub use config::{load_config, save_config, TtsAppConfig};
pub use controller::{Banner, ControlsView, ControllerTimings, PlaybackController, PlaybackState};
pub use elevenlabs::{ElevenLabsClient, RemoteSynthesizer, SubscriptionUsage};
pub use events::{ControllerEvent, EventQueue};
pub use interface::{
    GenerationResult, LocalErrorKind, TtsError, ValidationError, VoiceDescriptor, VoiceOrigin,
    VoiceSettings,
};
pub use player::{AudioSink, HeadlessSink};
pub use system::{LocalSynthesizer, NoSpeechPlatform, PlatformVoice, SpeechPlatform};
pub use voice_list::VoiceList;

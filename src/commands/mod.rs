//! Command handlers. Each subcommand gets its own file; the wiring shared by
//! all of them lives here.

pub mod catalog;
pub mod tts;
pub mod usage;
pub mod voices;

use crate::cli::KeyArgs;
use crate::tts::config::{default_config_path, load_config, TtsAppConfig};
use crate::tts::controller::{Banner, PlaybackController};
use crate::tts::elevenlabs::ElevenLabsClient;
use crate::tts::events::{ControllerEvent, EventQueue};
use crate::tts::player::{AudioSink, HeadlessSink};
use crate::tts::system::{LocalSynthesizer, NoSpeechPlatform, SpeechPlatform};
use crate::tts::VoiceCatalog;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Config and resolved paths for one invocation.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: TtsAppConfig,
    pub config_path: PathBuf,
    pub catalog_path: PathBuf,
}

impl AppContext {
    pub fn load(config: Option<PathBuf>, catalog: Option<PathBuf>) -> Self {
        let config_path = config.unwrap_or_else(default_config_path);
        let config = load_config(&config_path);
        let catalog_path = catalog.unwrap_or_else(|| config.catalog_path());
        Self {
            config,
            config_path,
            catalog_path,
        }
    }

    /// Command line first, then the config file, then its env var.
    pub fn api_key(&self, args: &KeyArgs) -> Option<String> {
        args.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .or_else(|| self.config.resolve_api_key())
    }

    pub fn load_catalog(&self) -> VoiceCatalog {
        VoiceCatalog::load(&self.catalog_path)
    }

    pub fn remote_client(&self) -> ElevenLabsClient {
        ElevenLabsClient::new(self.config.base_url.clone(), self.config.model_id.clone())
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }
}

/// Host speech engine, or the stand-in when none can be opened.
pub fn speech_platform() -> Box<dyn SpeechPlatform> {
    #[cfg(feature = "system-tts")]
    {
        match crate::tts::system::NativeSpeech::new() {
            Ok(native) => return Box::new(native),
            Err(kind) => tracing::warn!("[TTS] System speech unavailable ({}), local voices disabled", kind),
        }
    }
    Box::new(NoSpeechPlatform)
}

pub fn audio_sink(no_play: bool) -> Box<dyn AudioSink> {
    #[cfg(feature = "playback")]
    {
        if !no_play {
            return Box::new(crate::tts::player::RodioSink::new());
        }
    }
    if !no_play {
        tracing::debug!("[Audio] Built without playback support, audio will not be heard");
    }
    Box::new(HeadlessSink)
}

pub fn build_controller(ctx: &AppContext, no_play: bool) -> (PlaybackController, EventQueue) {
    let (mut controller, queue) = PlaybackController::new(
        LocalSynthesizer::new(speech_platform()),
        Arc::new(ctx.remote_client()),
        audio_sink(no_play),
        ctx.load_catalog(),
        ctx.config.timings(),
    );
    if let Err(e) = controller.set_rate(ctx.config.default_rate) {
        tracing::warn!("[Config] Ignoring default_rate: {}", e);
    }
    // Engines may finish enumerating voices after startup; rebuild the list once it settles.
    let _ = controller.events_sender().send(ControllerEvent::VoicesChanged);
    (controller, queue)
}

/// Prints the banner whenever it changes.
#[derive(Debug)]
pub struct Screen {
    last: Banner,
}

impl Default for Screen {
    fn default() -> Self {
        Self { last: Banner::None }
    }
}

impl Screen {
    pub fn refresh(&mut self, controller: &PlaybackController) {
        let banner = controller.banner();
        if *banner == self.last {
            return;
        }
        match banner {
            Banner::Status(message) => println!("{}", message),
            Banner::Error(message) => eprintln!("❌ {}", message),
            Banner::None => {}
        }
        self.last = banner.clone();
    }
}

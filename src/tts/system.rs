use super::events::{LocalSpeechEvent, SessionEvents};
use super::interface::{LocalErrorKind, VoiceDescriptor};
use super::voice_list::DEFAULT_VOICE_KEY;

/// Language requested for every local utterance.
pub const VIETNAMESE_LANG: &str = "vi-VN";

/// Rate range accepted by speech engines (1.0 = normal speed).
pub const MIN_RATE: f32 = 0.1;
pub const MAX_RATE: f32 = 10.0;

pub fn clamp_rate(rate: f32) -> f32 {
    rate.clamp(MIN_RATE, MAX_RATE)
}

/// Map a rate multiplier onto an engine's `[min, normal, max]` scale.
///
/// Engines disagree on units: speech-dispatcher is `-100..100` around `0`,
/// WinRT is `0.5..6` around `1`. The multiplier is interpolated linearly on
/// each side of `normal`, so `1.0` always lands on the engine's normal rate
/// and the ends of `[MIN_RATE, MAX_RATE]` land on its ends.
pub fn native_rate(rate: f32, min: f32, normal: f32, max: f32) -> f32 {
    let rate = clamp_rate(rate);
    let native = if rate >= 1.0 {
        normal + (max - normal) * (rate - 1.0) / (MAX_RATE - 1.0)
    } else {
        normal - (normal - min) * (1.0 - rate) / (1.0 - MIN_RATE)
    };
    native.clamp(min, max)
}

/// What an engine reports when an utterance is cut off by someone else.
pub fn interrupted_event() -> LocalSpeechEvent {
    LocalSpeechEvent::Error(LocalErrorKind::Other("interrupted".to_string()))
}

/// A voice as enumerated by the platform engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformVoice {
    pub name: String,
    /// BCP-47 tag such as `vi-VN`.
    pub language: String,
}

/// What gets handed to the engine. Volume and pitch are fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub lang: String,
    pub rate: f32,
    pub volume: f32,
    pub pitch: f32,
    /// Platform voice name; `None` lets the engine choose.
    pub voice: Option<String>,
}

/// Built-in speech engine of the host.
///
/// Only one utterance is active at a time. `speak` returns once the
/// utterance is queued; progress arrives through `events`.
pub trait SpeechPlatform: Send {
    /// Voices installed right now. May grow after startup.
    fn voices(&self) -> Vec<PlatformVoice>;

    fn speak(&mut self, utterance: &Utterance, events: SessionEvents) -> Result<(), LocalErrorKind>;

    /// Drop the active utterance and anything queued. Safe when idle.
    fn cancel(&mut self);

    fn is_speaking(&self) -> bool;
}

/// Local synthesis backend: builds the utterance and resolves the voice
/// against what the platform offers at speak time.
pub struct LocalSynthesizer {
    platform: Box<dyn SpeechPlatform>,
}

impl LocalSynthesizer {
    pub fn new(platform: Box<dyn SpeechPlatform>) -> Self {
        Self { platform }
    }

    pub fn voices(&self) -> Vec<PlatformVoice> {
        self.platform.voices()
    }

    pub fn speak(
        &mut self,
        text: &str,
        voice: &VoiceDescriptor,
        rate: f32,
        events: SessionEvents,
    ) -> Result<(), LocalErrorKind> {
        if self.platform.is_speaking() {
            self.platform.cancel();
        }

        let voice_name = if voice.key == DEFAULT_VOICE_KEY {
            None
        } else {
            let found = self
                .platform
                .voices()
                .into_iter()
                .find(|v| v.name == voice.key)
                .map(|v| v.name);
            if found.is_none() {
                tracing::debug!(
                    "[TTS] Voice '{}' no longer installed, using platform default",
                    voice.key
                );
            }
            found
        };

        let utterance = Utterance {
            text: text.to_string(),
            lang: VIETNAMESE_LANG.to_string(),
            rate: clamp_rate(rate),
            volume: 1.0,
            pitch: 1.0,
            voice: voice_name,
        };
        self.platform.speak(&utterance, events)
    }

    pub fn cancel(&mut self) {
        self.platform.cancel();
    }

    pub fn is_speaking(&self) -> bool {
        self.platform.is_speaking()
    }
}

// ── No engine ──────────────────────────────────────────

/// Stand-in when the host has no usable speech engine.
pub struct NoSpeechPlatform;

impl SpeechPlatform for NoSpeechPlatform {
    fn voices(&self) -> Vec<PlatformVoice> {
        Vec::new()
    }

    fn speak(&mut self, _utterance: &Utterance, _events: SessionEvents) -> Result<(), LocalErrorKind> {
        Err(LocalErrorKind::SynthesisUnavailable)
    }

    fn cancel(&mut self) {}

    fn is_speaking(&self) -> bool {
        false
    }
}

// ── Native engine (tts crate) ──────────────────────────

#[cfg(feature = "system-tts")]
pub use native::NativeSpeech;

#[cfg(feature = "system-tts")]
mod native {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Session receiving callbacks, and the utterance it owns once known.
    struct Active {
        events: SessionEvents,
        utterance: Option<String>,
    }

    /// `UtteranceId` is only comparable off Apple platforms; its `Debug` form is everywhere.
    fn utterance_key(id: &tts::UtteranceId) -> String {
        format!("{:?}", id)
    }

    type Listener = Arc<Mutex<Option<Active>>>;

    /// Host speech engine via speech-dispatcher, SAPI/WinRT or AVFoundation.
    pub struct NativeSpeech {
        tts: tts::Tts,
        features: tts::Features,
        listener: Listener,
    }

    fn map_engine_error(e: tts::Error) -> LocalErrorKind {
        match e {
            tts::Error::OutOfRange => LocalErrorKind::RateNotSupported,
            tts::Error::UnsupportedFeature => LocalErrorKind::SynthesisUnavailable,
            other => {
                tracing::warn!("[TTS] Engine error: {}", other);
                LocalErrorKind::SynthesisFailed
            }
        }
    }

    fn notify(listener: &Listener, id: tts::UtteranceId, event: LocalSpeechEvent) {
        if let Ok(guard) = listener.lock() {
            if let Some(active) = guard.as_ref() {
                // Late callbacks of a cancelled utterance carry its old id.
                let key = utterance_key(&id);
                if active.utterance.as_ref().map_or(true, |current| *current == key) {
                    active.events.local(event);
                }
            }
        }
    }

    impl NativeSpeech {
        pub fn new() -> Result<Self, LocalErrorKind> {
            let mut tts = tts::Tts::default().map_err(|e| {
                tracing::warn!("[TTS] Failed to initialise speech engine: {}", e);
                LocalErrorKind::SynthesisUnavailable
            })?;
            let features = tts.supported_features();
            let listener: Listener = Arc::new(Mutex::new(None));

            if features.utterance_callbacks {
                let on_begin = listener.clone();
                tts.on_utterance_begin(Some(Box::new(move |id| {
                    notify(&on_begin, id, LocalSpeechEvent::Start);
                })))
                .map_err(map_engine_error)?;

                let on_end = listener.clone();
                tts.on_utterance_end(Some(Box::new(move |id| {
                    notify(&on_end, id, LocalSpeechEvent::End);
                })))
                .map_err(map_engine_error)?;

                let on_stop = listener.clone();
                tts.on_utterance_stop(Some(Box::new(move |id| {
                    notify(&on_stop, id, interrupted_event());
                })))
                .map_err(map_engine_error)?;
            }

            tracing::debug!(
                "[TTS] Native speech engine ready (callbacks: {})",
                features.utterance_callbacks
            );
            Ok(Self {
                tts,
                features,
                listener,
            })
        }

        fn apply(&mut self, utterance: &Utterance) -> Result<(), tts::Error> {
            if self.features.rate {
                let native = native_rate(
                    utterance.rate,
                    self.tts.min_rate(),
                    self.tts.normal_rate(),
                    self.tts.max_rate(),
                );
                self.tts.set_rate(native)?;
            }
            if self.features.volume {
                let max = self.tts.max_volume();
                self.tts.set_volume(max * utterance.volume)?;
            }
            if self.features.pitch {
                let normal = self.tts.normal_pitch();
                self.tts.set_pitch(normal * utterance.pitch)?;
            }
            if self.features.voice {
                let voices = self.tts.voices()?;
                let chosen = match &utterance.voice {
                    Some(name) => voices.iter().find(|v| &v.name() == name),
                    None => {
                        let prefix = utterance.lang.split('-').next().unwrap_or("vi");
                        voices
                            .iter()
                            .find(|v| v.language().to_string().starts_with(prefix))
                    }
                };
                if let Some(voice) = chosen {
                    self.tts.set_voice(voice)?;
                }
            }
            Ok(())
        }

        /// Engines without callbacks: report the end by polling.
        fn watch_until_silent(&self, events: SessionEvents) {
            let tts = self.tts.clone();
            let can_poll = self.features.is_speaking;
            std::thread::spawn(move || {
                if can_poll {
                    std::thread::sleep(Duration::from_millis(150));
                    while tts.is_speaking().unwrap_or(false) {
                        std::thread::sleep(Duration::from_millis(100));
                    }
                }
                events.local(LocalSpeechEvent::End);
            });
        }
    }

    impl SpeechPlatform for NativeSpeech {
        fn voices(&self) -> Vec<PlatformVoice> {
            match self.tts.voices() {
                Ok(voices) => voices
                    .into_iter()
                    .map(|v| PlatformVoice {
                        name: v.name(),
                        language: v.language().to_string(),
                    })
                    .collect(),
                Err(e) => {
                    tracing::debug!("[TTS] Voice enumeration unavailable: {}", e);
                    Vec::new()
                }
            }
        }

        fn speak(
            &mut self,
            utterance: &Utterance,
            events: SessionEvents,
        ) -> Result<(), LocalErrorKind> {
            // Detach the previous session first so its stop callback goes nowhere.
            self.cancel();
            self.apply(utterance).map_err(map_engine_error)?;

            if let Ok(mut guard) = self.listener.lock() {
                *guard = Some(Active {
                    events: events.clone(),
                    utterance: None,
                });
            }
            let id = self
                .tts
                .speak(utterance.text.as_str(), true)
                .map_err(map_engine_error)?;
            if let Ok(mut guard) = self.listener.lock() {
                if let Some(active) = guard.as_mut() {
                    active.utterance = id.as_ref().map(utterance_key);
                }
            }

            if !self.features.utterance_callbacks {
                events.local(LocalSpeechEvent::Start);
                self.watch_until_silent(events);
            }
            Ok(())
        }

        fn cancel(&mut self) {
            if let Ok(mut guard) = self.listener.lock() {
                *guard = None;
            }
            if self.features.stop {
                if let Err(e) = self.tts.stop() {
                    tracing::debug!("[TTS] Stop failed: {}", e);
                }
            }
        }

        fn is_speaking(&self) -> bool {
            self.features.is_speaking && self.tts.is_speaking().unwrap_or(false)
        }
    }
}

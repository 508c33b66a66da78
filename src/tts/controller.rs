use super::catalog::VoiceCatalog;
use super::download::{generate_file_name, save_audio};
use super::elevenlabs::RemoteSynthesizer;
use super::events::{
    AudioEvent, ControllerEvent, EventQueue, LocalSpeechEvent, SessionEvents, SessionId,
};
use super::interface::{
    GenerationRequest, GenerationResult, LocalErrorKind, TtsError, VoiceDescriptor, VoiceOrigin,
};
use super::player::AudioSink;
use super::system::{clamp_rate, LocalSynthesizer};
use super::voice_list::VoiceList;

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

// ── User-facing text ───────────────────────────────────

pub const LABEL_IDLE: &str = "▶ Tạo Giọng Nói";
pub const LABEL_GENERATING: &str = "🔊 Đang tạo...";
pub const LABEL_PLAYING: &str = "🔊 Đang phát...";

const MSG_LOCAL_PLAYING: &str = "Đang chuyển văn bản thành giọng nói...";
const MSG_LOCAL_DONE: &str = "Hoàn thành chuyển văn bản thành giọng nói.";
const MSG_LOCAL_PAUSED: &str = "Đã tạm dừng phát giọng nói.";
const MSG_LOCAL_RESUMED: &str = "Tiếp tục phát giọng nói.";
const MSG_LOCAL_START_FAILED: &str = "Không thể bắt đầu phát giọng nói. Vui lòng thử lại.";
const MSG_REMOTE_GENERATING: &str = "Đang tạo giọng nói chất lượng cao với ElevenLabs...";
const MSG_REMOTE_PLAYING: &str = "Đang phát giọng nói ElevenLabs...";
const MSG_REMOTE_DONE: &str =
    "Hoàn thành phát giọng nói ElevenLabs. Bạn có thể tải xuống file MP3.";
const MSG_PLAYBACK_FAILED: &str = "Lỗi khi phát audio. Nhưng bạn vẫn có thể tải xuống file.";
const MSG_NO_AUDIO: &str = "Không có file audio để tải xuống. Vui lòng tạo giọng nói trước.";
const MSG_INVALID_KEY: &str = "API Key không hợp lệ. Vui lòng kiểm tra lại API Key ElevenLabs.";
const MSG_RATE_LIMITED: &str = "Đã vượt quá giới hạn sử dụng API. Vui lòng thử lại sau.";
const MSG_NETWORK: &str = "Lỗi kết nối mạng. Vui lòng kiểm tra kết nối internet.";

/// Turn a cloud failure into the text shown after "Lỗi ElevenLabs: ".
pub fn remote_error_message(err: &TtsError) -> String {
    match err {
        TtsError::Api { status: 401, .. } => MSG_INVALID_KEY.to_string(),
        TtsError::Api { status: 429, .. } => MSG_RATE_LIMITED.to_string(),
        TtsError::Network(_) => MSG_NETWORK.to_string(),
        other => {
            let raw = other.to_string();
            if raw.to_lowercase().contains("network") {
                MSG_NETWORK.to_string()
            } else {
                raw
            }
        }
    }
}

// ── State ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Generating,
    Playing,
}

/// Status and error share one slot; showing one hides the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    None,
    Status(String),
    Error(String),
}

/// Enablement of the three controls plus the generate label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlsView {
    pub generate_enabled: bool,
    pub stop_enabled: bool,
    pub download_enabled: bool,
    pub generate_label: &'static str,
    /// The selected voice is a cloud voice, so a key must be supplied.
    pub api_key_required: bool,
}

impl ControlsView {
    pub fn derive(state: PlaybackState, has_result: bool, origin: VoiceOrigin) -> Self {
        let idle = state == PlaybackState::Idle;
        Self {
            generate_enabled: idle,
            stop_enabled: !idle,
            download_enabled: idle && has_result,
            generate_label: match state {
                PlaybackState::Idle => LABEL_IDLE,
                PlaybackState::Generating => LABEL_GENERATING,
                PlaybackState::Playing => LABEL_PLAYING,
            },
            api_key_required: origin == VoiceOrigin::Remote,
        }
    }
}

/// How long completion messages stay up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerTimings {
    pub local_status_clear: Duration,
    pub remote_status_clear: Duration,
    pub download_status_clear: Duration,
}

impl Default for ControllerTimings {
    fn default() -> Self {
        Self {
            local_status_clear: Duration::from_secs(3),
            remote_status_clear: Duration::from_secs(5),
            download_status_clear: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionKind {
    Local,
    Remote,
}

#[derive(Debug)]
struct ActiveSession {
    id: SessionId,
    kind: SessionKind,
    text: String,
    voice_key: String,
}

// ── Controller ─────────────────────────────────────────

/// Owns all page-level state: the selected voice, the single playback
/// session and the single retained cloud clip.
///
/// Driven from one task: user actions call methods directly, backend
/// callbacks come back as `ControllerEvent`s passed to `handle_event`.
pub struct PlaybackController {
    state: PlaybackState,
    banner: Banner,
    banner_seq: u64,

    catalog: VoiceCatalog,
    voices: VoiceList,
    selected: VoiceDescriptor,
    rate: f32,

    result: Option<GenerationResult>,
    session: Option<ActiveSession>,
    next_session: u64,

    local: LocalSynthesizer,
    remote: Arc<dyn RemoteSynthesizer>,
    sink: Box<dyn AudioSink>,
    timings: ControllerTimings,
    tx: mpsc::UnboundedSender<ControllerEvent>,
}

impl PlaybackController {
    pub fn new(
        local: LocalSynthesizer,
        remote: Arc<dyn RemoteSynthesizer>,
        sink: Box<dyn AudioSink>,
        catalog: VoiceCatalog,
        timings: ControllerTimings,
    ) -> (Self, EventQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        let voices = VoiceList::build(&local.voices(), &catalog);
        let selected = voices.default_voice().clone();
        let mut controller = Self {
            state: PlaybackState::Idle,
            banner: Banner::None,
            banner_seq: 0,
            catalog,
            voices,
            selected,
            rate: 1.0,
            result: None,
            session: None,
            next_session: 0,
            local,
            remote,
            sink,
            timings,
            tx,
        };
        let summary = controller.voices.summary();
        controller.show_status(summary);
        (controller, EventQueue::new(rx))
    }

    // ── Queries ────────────────────────────────────────

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn banner(&self) -> &Banner {
        &self.banner
    }

    pub fn view(&self) -> ControlsView {
        ControlsView::derive(self.state, self.result.is_some(), self.selected.origin)
    }

    pub fn voices(&self) -> &VoiceList {
        &self.voices
    }

    pub fn catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    pub fn selected_voice(&self) -> &VoiceDescriptor {
        &self.selected
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        self.result.as_ref()
    }

    /// Sender for events produced outside a session (e.g. `VoicesChanged`).
    pub fn events_sender(&self) -> mpsc::UnboundedSender<ControllerEvent> {
        self.tx.clone()
    }

    // ── Voices ─────────────────────────────────────────

    /// Rebuild the voice list from what the platform reports now.
    /// Keeps the current selection if it still exists.
    pub fn refresh_voices(&mut self) {
        self.voices = VoiceList::build(&self.local.voices(), &self.catalog);
        tracing::debug!("[TTS] Voice list rebuilt: {} entries", self.voices.len());

        let still_there = self
            .voices
            .find_in(self.selected.origin, &self.selected.key)
            .cloned();
        match still_there {
            Some(voice) => self.selected = voice,
            None => {
                let fallback = self.voices.default_voice().clone();
                self.select(fallback);
            }
        }

        if self.state == PlaybackState::Idle {
            let summary = self.voices.summary();
            self.show_status(summary);
        }
    }

    pub fn reload_catalog(&mut self, catalog: VoiceCatalog) {
        self.catalog = catalog;
        self.refresh_voices();
    }

    /// Select by key, local group first.
    pub fn select_voice(&mut self, key: &str) -> Result<(), TtsError> {
        let voice = self
            .voices
            .find(key)
            .cloned()
            .ok_or_else(|| TtsError::VoiceNotFound(key.to_string()))?;
        self.select(voice);
        Ok(())
    }

    pub fn select_in(&mut self, origin: VoiceOrigin, key: &str) -> Result<(), TtsError> {
        let voice = self
            .voices
            .find_in(origin, key)
            .cloned()
            .ok_or_else(|| TtsError::VoiceNotFound(key.to_string()))?;
        self.select(voice);
        Ok(())
    }

    pub fn select(&mut self, voice: VoiceDescriptor) {
        if voice.origin == VoiceOrigin::Local && self.result.take().is_some() {
            tracing::debug!("[TTS] Local voice selected, dropping retained clip");
        }
        tracing::info!("[TTS] Voice selected: {} ({:?})", voice.key, voice.origin);
        self.selected = voice;
    }

    pub fn set_rate(&mut self, rate: f32) -> Result<f32, TtsError> {
        if !rate.is_finite() {
            return Err(TtsError::Config(format!("invalid speech rate: {}", rate)));
        }
        self.rate = clamp_rate(rate);
        Ok(self.rate)
    }

    // ── Actions ────────────────────────────────────────

    /// Idle --start--> Generating.
    ///
    /// Validation failures are shown in the banner and returned; the state
    /// stays Idle and no backend is called.
    pub fn start(&mut self, text: &str, api_key: Option<&str>) -> Result<(), TtsError> {
        if self.state != PlaybackState::Idle {
            tracing::debug!("[TTS] Start ignored while {:?}", self.state);
            return Ok(());
        }

        let request =
            match GenerationRequest::validated(text, self.selected.clone(), self.rate, api_key) {
                Ok(request) => request,
                Err(e) => {
                    self.show_error(e.user_message().to_string());
                    return Err(e.into());
                }
            };

        self.result = None;
        match request.voice.origin {
            VoiceOrigin::Local => self.start_local(request),
            VoiceOrigin::Remote => self.start_remote(request),
        }
        Ok(())
    }

    fn open_session(&mut self, kind: SessionKind, request: &GenerationRequest) -> SessionEvents {
        self.next_session += 1;
        let id = SessionId(self.next_session);
        self.session = Some(ActiveSession {
            id,
            kind,
            text: request.text.clone(),
            voice_key: request.voice.key.clone(),
        });
        self.transition(PlaybackState::Generating);
        SessionEvents::new(id, self.tx.clone())
    }

    fn start_local(&mut self, request: GenerationRequest) {
        let events = self.open_session(SessionKind::Local, &request);
        self.hide_banner();

        if let Err(kind) = self
            .local
            .speak(&request.text, &request.voice, request.rate, events)
        {
            tracing::warn!("[TTS] Local speak failed to start: {}", kind);
            self.finish();
            let message = match kind {
                LocalErrorKind::Other(_) => MSG_LOCAL_START_FAILED,
                known => known.user_message(),
            };
            self.show_error(message.to_string());
        }
    }

    fn start_remote(&mut self, request: GenerationRequest) {
        let events = self.open_session(SessionKind::Remote, &request);
        self.show_status(MSG_REMOTE_GENERATING.to_string());

        // Resolve against the catalog as it is now, not as it was at list time.
        let voice = match self.catalog.get(&request.voice.key) {
            Some(entry) => entry.descriptor(),
            None => VoiceDescriptor {
                provider_voice_id: None,
                ..request.voice.clone()
            },
        };
        let remote = self.remote.clone();
        let text = request.text;
        let api_key = request.api_key.unwrap_or_default();

        tokio::spawn(async move {
            let outcome = remote.synthesize(&text, &voice, &api_key).await;
            events.remote(outcome);
        });
    }

    /// Playing|Generating --stop--> Idle. No-op when Idle.
    ///
    /// Both backends are told to stop regardless of which one is active.
    pub fn stop(&mut self) {
        if self.state == PlaybackState::Idle {
            return;
        }
        self.local.cancel();
        self.sink.stop();
        tracing::info!("[TTS] Stopped by user");
        self.finish();
        self.hide_banner();
    }

    /// Save the retained cloud clip into `dir`.
    pub fn download(&mut self, dir: &Path) -> Result<PathBuf, TtsError> {
        if self.state != PlaybackState::Idle || self.result.is_none() {
            self.show_error(MSG_NO_AUDIO.to_string());
            return Err(TtsError::NoAudio);
        }
        let saved = match &self.result {
            Some(result) => save_audio(&result.audio, &result.file_name, dir)
                .map(|path| (path, result.file_name.clone())),
            None => Err(TtsError::NoAudio),
        };

        match saved {
            Ok((path, file_name)) => {
                self.show_status(format!("✅ Đã tải xuống: {}", file_name));
                self.schedule_hide(self.timings.download_status_clear);
                Ok(path)
            }
            Err(e) => {
                self.show_error(format!("Không thể lưu file: {}", e));
                Err(e)
            }
        }
    }

    // ── Events ─────────────────────────────────────────

    pub fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::Local { session, event } => {
                if self.is_current(session, SessionKind::Local) {
                    self.on_local(event);
                } else {
                    tracing::trace!("[TTS] Dropping stale local event {:?}", event);
                }
            }
            ControllerEvent::Audio { session, event } => {
                if self.is_current(session, SessionKind::Remote) {
                    self.on_audio(event);
                } else {
                    tracing::trace!("[TTS] Dropping stale audio event {:?}", event);
                }
            }
            ControllerEvent::Remote { session, outcome } => {
                if self.is_current(session, SessionKind::Remote) {
                    self.on_remote(outcome);
                } else {
                    tracing::debug!("[TTS] Discarding cloud result of cancelled session");
                }
            }
            ControllerEvent::VoicesChanged => self.refresh_voices(),
            ControllerEvent::ClearBanner { seq } => {
                if seq == self.banner_seq {
                    self.banner = Banner::None;
                }
            }
        }
    }

    /// Pump the queue until the current session ends.
    pub async fn run_until_idle(&mut self, queue: &mut EventQueue) {
        while self.state != PlaybackState::Idle {
            match queue.next().await {
                Some(event) => self.handle_event(event),
                None => break,
            }
        }
    }

    fn is_current(&self, session: SessionId, kind: SessionKind) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.id == session && s.kind == kind)
    }

    fn on_local(&mut self, event: LocalSpeechEvent) {
        match event {
            LocalSpeechEvent::Start => {
                if self.state == PlaybackState::Generating {
                    self.transition(PlaybackState::Playing);
                    self.show_status(MSG_LOCAL_PLAYING.to_string());
                }
            }
            LocalSpeechEvent::End => {
                self.finish();
                self.show_status(MSG_LOCAL_DONE.to_string());
                self.schedule_hide(self.timings.local_status_clear);
            }
            LocalSpeechEvent::Error(kind) => {
                tracing::warn!("[TTS] Speech engine error: {}", kind);
                self.finish();
                self.show_error(kind.user_message().to_string());
            }
            LocalSpeechEvent::Pause => self.show_status(MSG_LOCAL_PAUSED.to_string()),
            LocalSpeechEvent::Resume => self.show_status(MSG_LOCAL_RESUMED.to_string()),
        }
    }

    fn on_remote(&mut self, outcome: Result<Vec<u8>, TtsError>) {
        if self.state != PlaybackState::Generating {
            return;
        }
        let Some(session) = self.session.as_ref() else {
            return;
        };

        match outcome {
            Ok(audio) => {
                let file_name = generate_file_name(&session.text, &session.voice_key, Utc::now());
                let events = SessionEvents::new(session.id, self.tx.clone());
                tracing::info!("[TTS] Cloud audio ready ({} bytes): {}", audio.len(), file_name);
                self.result = Some(GenerationResult {
                    audio: audio.clone(),
                    file_name,
                });
                if let Err(e) = self.sink.play(audio, events) {
                    self.playback_failed(&e.to_string());
                }
            }
            Err(e) => {
                tracing::warn!("[TTS] Cloud synthesis failed: {}", e);
                self.finish();
                self.show_error(format!("Lỗi ElevenLabs: {}", remote_error_message(&e)));
            }
        }
    }

    fn on_audio(&mut self, event: AudioEvent) {
        match event {
            AudioEvent::Play => {
                self.transition(PlaybackState::Playing);
                self.show_status(MSG_REMOTE_PLAYING.to_string());
            }
            AudioEvent::Ended => {
                self.finish();
                self.show_status(MSG_REMOTE_DONE.to_string());
                self.schedule_hide(self.timings.remote_status_clear);
            }
            AudioEvent::Error(reason) => self.playback_failed(&reason),
        }
    }

    /// The clip was fetched but could not be played; it stays downloadable.
    fn playback_failed(&mut self, reason: &str) {
        tracing::warn!("[TTS] Playback failed: {}", reason);
        self.finish();
        self.show_error(MSG_PLAYBACK_FAILED.to_string());
    }

    // ── Helpers ────────────────────────────────────────

    fn transition(&mut self, to: PlaybackState) {
        if self.state != to {
            tracing::debug!("[TTS] {:?} -> {:?}", self.state, to);
            self.state = to;
        }
    }

    fn finish(&mut self) {
        self.session = None;
        self.transition(PlaybackState::Idle);
    }

    fn show_status(&mut self, message: String) {
        self.banner_seq += 1;
        self.banner = Banner::Status(message);
    }

    fn show_error(&mut self, message: String) {
        self.banner_seq += 1;
        self.banner = Banner::Error(message);
    }

    fn hide_banner(&mut self) {
        self.banner_seq += 1;
        self.banner = Banner::None;
    }

    /// Hide the current banner after `delay` unless something newer replaced it.
    fn schedule_hide(&self, delay: Duration) {
        let seq = self.banner_seq;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(ControllerEvent::ClearBanner { seq });
        });
    }
}

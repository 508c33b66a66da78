use crate::tts::catalog::VoiceCatalog;
use crate::tts::controller::{ControllerTimings, PlaybackController};
use crate::tts::elevenlabs::{ElevenLabsClient, RemoteSynthesizer};
use crate::tts::events::{AudioEvent, EventQueue, LocalSpeechEvent, SessionEvents};
use crate::tts::interface::{LocalErrorKind, TtsError, VoiceDescriptor};
use crate::tts::player::AudioSink;
use crate::tts::system::{LocalSynthesizer, PlatformVoice, SpeechPlatform, Utterance};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CATALOG_JSON: &str = r#"{
    "Voice A": { "voice_id": "voiceA123", "settings": { "stability": 0.5, "similarity_boost": 0.75 } },
    "Voice B": { "voice_id": "voiceB456" }
}"#;

pub const FAKE_MP3: &[u8] = b"ID3\x03\x00\x00\x00fake-mpeg-frames";

pub fn sample_catalog() -> VoiceCatalog {
    VoiceCatalog::from_json(CATALOG_JSON).expect("fixture catalog must parse")
}

pub fn vi_voice(name: &str) -> PlatformVoice {
    PlatformVoice {
        name: name.to_string(),
        language: "vi-VN".to_string(),
    }
}

/// Short clears so timer tests stay fast.
pub fn fast_timings() -> ControllerTimings {
    ControllerTimings {
        local_status_clear: Duration::from_millis(30),
        remote_status_clear: Duration::from_millis(30),
        download_status_clear: Duration::from_millis(30),
    }
}

// ── Mock speech platform ────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechScript {
    /// Emit Start then End right away.
    Complete,
    /// Keep the session handle; the test drives Start/End by hand.
    Hold,
    /// Refuse synchronously with `refuse_with`, or unavailable if unset.
    Refuse,
}

#[derive(Default)]
pub struct PlatformLog {
    pub voices: Vec<PlatformVoice>,
    pub spoken: Vec<Utterance>,
    pub cancels: usize,
    pub held: Option<SessionEvents>,
    pub refuse_with: Option<LocalErrorKind>,
}

pub struct MockPlatform {
    pub script: SpeechScript,
    pub log: Arc<Mutex<PlatformLog>>,
}

impl MockPlatform {
    pub fn new(script: SpeechScript, voices: Vec<PlatformVoice>) -> (Self, Arc<Mutex<PlatformLog>>) {
        let log = Arc::new(Mutex::new(PlatformLog {
            voices,
            ..PlatformLog::default()
        }));
        (
            Self {
                script,
                log: log.clone(),
            },
            log,
        )
    }
}

impl SpeechPlatform for MockPlatform {
    fn voices(&self) -> Vec<PlatformVoice> {
        self.log.lock().unwrap().voices.clone()
    }

    fn speak(&mut self, utterance: &Utterance, events: SessionEvents) -> Result<(), LocalErrorKind> {
        let mut log = self.log.lock().unwrap();
        log.spoken.push(utterance.clone());
        match self.script {
            SpeechScript::Complete => {
                events.local(LocalSpeechEvent::Start);
                events.local(LocalSpeechEvent::End);
                Ok(())
            }
            SpeechScript::Hold => {
                log.held = Some(events);
                Ok(())
            }
            SpeechScript::Refuse => Err(log
                .refuse_with
                .clone()
                .unwrap_or(LocalErrorKind::SynthesisUnavailable)),
        }
    }

    fn cancel(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.cancels += 1;
        log.held = None;
    }

    fn is_speaking(&self) -> bool {
        self.log.lock().unwrap().held.is_some()
    }
}

/// Session handle of the utterance the platform is holding.
pub fn held_session(log: &Arc<Mutex<PlatformLog>>) -> SessionEvents {
    log.lock()
        .unwrap()
        .held
        .clone()
        .expect("no utterance is being held")
}

/// Fire a lifecycle event on the session the platform is holding.
pub fn emit_local(log: &Arc<Mutex<PlatformLog>>, event: LocalSpeechEvent) {
    held_session(log).local(event);
}

// ── Mock audio sink ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkScript {
    PlayThrough,
    FailToStart,
    FailWhilePlaying,
}

#[derive(Default)]
pub struct SinkLog {
    pub played: Vec<Vec<u8>>,
    pub stops: usize,
}

pub struct MockSink {
    pub script: SinkScript,
    pub log: Arc<Mutex<SinkLog>>,
}

impl MockSink {
    pub fn new(script: SinkScript) -> (Self, Arc<Mutex<SinkLog>>) {
        let log = Arc::new(Mutex::new(SinkLog::default()));
        (
            Self {
                script,
                log: log.clone(),
            },
            log,
        )
    }
}

impl AudioSink for MockSink {
    fn play(&mut self, audio: Vec<u8>, events: SessionEvents) -> Result<(), TtsError> {
        self.log.lock().unwrap().played.push(audio);
        match self.script {
            SinkScript::PlayThrough => {
                events.audio(AudioEvent::Play);
                events.audio(AudioEvent::Ended);
                Ok(())
            }
            SinkScript::FailToStart => Err(TtsError::Playback("device busy".into())),
            SinkScript::FailWhilePlaying => {
                events.audio(AudioEvent::Play);
                events.audio(AudioEvent::Error("decoder gave up".into()));
                Ok(())
            }
        }
    }

    fn stop(&mut self) {
        self.log.lock().unwrap().stops += 1;
    }
}

// ── Stub cloud backend ──────────────────────────────────────

/// Counts calls; used where the HTTP layer is irrelevant.
#[derive(Default)]
pub struct CountingRemote {
    pub calls: AtomicUsize,
}

#[async_trait]
impl RemoteSynthesizer for CountingRemote {
    async fn synthesize(
        &self,
        _text: &str,
        _voice: &VoiceDescriptor,
        _api_key: &str,
    ) -> Result<Vec<u8>, TtsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(FAKE_MP3.to_vec())
    }
}

impl CountingRemote {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn client_for(server: &wiremock::MockServer) -> Arc<ElevenLabsClient> {
    Arc::new(ElevenLabsClient::new(
        Some(format!("{}/v1", server.uri())),
        None,
    ))
}

// ── Controller setup ────────────────────────────────────────

pub struct Harness {
    pub controller: PlaybackController,
    pub queue: EventQueue,
    pub platform: Arc<Mutex<PlatformLog>>,
    pub sink: Arc<Mutex<SinkLog>>,
}

pub fn harness(
    speech: SpeechScript,
    sink: SinkScript,
    remote: Arc<dyn RemoteSynthesizer>,
) -> Harness {
    let (platform, platform_log) = MockPlatform::new(speech, vec![vi_voice("Linh")]);
    let (sink, sink_log) = MockSink::new(sink);
    let (controller, queue) = PlaybackController::new(
        LocalSynthesizer::new(Box::new(platform)),
        remote,
        Box::new(sink),
        sample_catalog(),
        fast_timings(),
    );
    Harness {
        controller,
        queue,
        platform: platform_log,
        sink: sink_log,
    }
}

impl Harness {
    /// Handle exactly one queued event, failing if none shows up in time.
    pub async fn step(&mut self) {
        let event = tokio::time::timeout(Duration::from_secs(2), self.queue.next())
            .await
            .expect("timed out waiting for a controller event")
            .expect("event queue closed");
        self.controller.handle_event(event);
    }

    pub async fn settle(&mut self) {
        tokio::time::timeout(
            Duration::from_secs(5),
            self.controller.run_until_idle(&mut self.queue),
        )
        .await
        .expect("controller never returned to Idle");
    }

    /// Handle whatever is already queued without waiting.
    pub fn drain(&mut self) {
        while let Some(event) = self.queue.try_next() {
            self.controller.handle_event(event);
        }
    }
}

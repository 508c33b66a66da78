//! Audio output for cloud-generated MP3.

use super::events::{AudioEvent, SessionEvents};
use super::interface::TtsError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Plays one clip at a time and reports progress through `events`.
pub trait AudioSink: Send {
    fn play(&mut self, audio: Vec<u8>, events: SessionEvents) -> Result<(), TtsError>;

    /// Pause and rewind. Safe when nothing is playing.
    fn stop(&mut self);
}

/// Reports playback as finished without producing sound.
/// Used for `--no-play` and on hosts without an output device.
#[derive(Debug, Default)]
pub struct HeadlessSink;

impl AudioSink for HeadlessSink {
    fn play(&mut self, audio: Vec<u8>, events: SessionEvents) -> Result<(), TtsError> {
        tracing::debug!("[Audio] Headless playback of {} bytes", audio.len());
        events.audio(AudioEvent::Play);
        events.audio(AudioEvent::Ended);
        Ok(())
    }

    fn stop(&mut self) {}
}

// ── Clip bookkeeping ───────────────────────────────────

/// Cancellation flag shared by a clip's playback thread and its sink.
#[derive(Debug, Clone, Default)]
pub struct ClipToken(Arc<AtomicBool>);

impl ClipToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn same(&self, other: &ClipToken) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Device-side handle that can silence a clip already handed to the device.
pub trait ClipHandle: Send {
    fn halt(&self);
}

struct Clip<H> {
    token: ClipToken,
    handle: Option<H>,
}

impl<H: ClipHandle> Clip<H> {
    fn retire(self) {
        self.token.cancel();
        if let Some(handle) = self.handle {
            handle.halt();
        }
    }
}

/// The one clip a sink may be playing.
///
/// A clip is registered before its thread starts, so a `stop` that lands
/// while the device is still opening cancels it instead of missing it.
pub struct ClipSlot<H> {
    inner: Arc<Mutex<Option<Clip<H>>>>,
}

impl<H> Clone for ClipSlot<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H> Default for ClipSlot<H> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
        }
    }
}

impl<H: ClipHandle> ClipSlot<H> {
    /// Retire whatever is playing and register a new clip.
    pub fn begin(&self) -> ClipToken {
        let token = ClipToken::default();
        if let Ok(mut guard) = self.inner.lock() {
            let previous = guard.replace(Clip {
                token: token.clone(),
                handle: None,
            });
            if let Some(previous) = previous {
                previous.retire();
            }
        }
        token
    }

    /// Store `handle` and run `start` on it, both under the lock.
    ///
    /// Returns false without calling `start` when the clip was stopped or
    /// replaced in the meantime.
    pub fn attach(&self, token: &ClipToken, handle: H, start: impl FnOnce(&H)) -> bool {
        let Ok(mut guard) = self.inner.lock() else {
            return false;
        };
        if token.is_cancelled() {
            return false;
        }
        match guard.as_mut() {
            Some(clip) if clip.token.same(token) => {
                start(&handle);
                clip.handle = Some(handle);
                true
            }
            _ => false,
        }
    }

    /// Cancel and silence the current clip. Idempotent.
    pub fn stop(&self) {
        let taken = match self.inner.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if let Some(clip) = taken {
            clip.retire();
        }
    }

    /// Forget the clip once it has played out, unless a newer one took its place.
    pub fn finish(&self, token: &ClipToken) {
        if let Ok(mut guard) = self.inner.lock() {
            if guard.as_ref().is_some_and(|clip| clip.token.same(token)) {
                *guard = None;
            }
        }
    }
}

#[cfg(feature = "playback")]
pub use device::RodioSink;

#[cfg(feature = "playback")]
mod device {
    use super::*;
    use rodio::{Decoder, OutputStream, Sink};
    use std::io::Cursor;

    impl ClipHandle for Arc<Sink> {
        fn halt(&self) {
            self.pause();
            self.stop();
        }
    }

    /// Plays on the default output device.
    ///
    /// `OutputStream` is not `Send`, so each clip gets its own thread that owns
    /// the stream for the clip's lifetime; only the `Sink` is shared for stop.
    #[derive(Default)]
    pub struct RodioSink {
        slot: ClipSlot<Arc<Sink>>,
    }

    impl RodioSink {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl AudioSink for RodioSink {
        fn play(&mut self, audio: Vec<u8>, events: SessionEvents) -> Result<(), TtsError> {
            let token = self.slot.begin();
            let slot = self.slot.clone();

            std::thread::Builder::new()
                .name("viet-tts-audio".into())
                .spawn(move || {
                    let (_stream, handle) = match OutputStream::try_default() {
                        Ok(pair) => pair,
                        Err(e) => {
                            events.audio(AudioEvent::Error(format!("no output device: {}", e)));
                            return;
                        }
                    };
                    let sink = match Sink::try_new(&handle) {
                        Ok(sink) => Arc::new(sink),
                        Err(e) => {
                            events.audio(AudioEvent::Error(format!("cannot open sink: {}", e)));
                            return;
                        }
                    };
                    let source = match Decoder::new(Cursor::new(audio)) {
                        Ok(source) => source,
                        Err(e) => {
                            events.audio(AudioEvent::Error(format!("cannot decode MP3: {}", e)));
                            return;
                        }
                    };

                    if !slot.attach(&token, sink.clone(), |sink| sink.append(source)) {
                        tracing::debug!("[Audio] Clip stopped before it reached the device");
                        return;
                    }
                    events.audio(AudioEvent::Play);
                    sink.sleep_until_end();

                    slot.finish(&token);
                    if !token.is_cancelled() {
                        events.audio(AudioEvent::Ended);
                    }
                })
                .map_err(|e| TtsError::Playback(e.to_string()))?;
            Ok(())
        }

        fn stop(&mut self) {
            self.slot.stop();
        }
    }
}

//! Playback session lifecycle
//!
//! One channel's playback from selection to teardown:
//!
//!   Idle -> Acquiring -> Playing -> (Error | Idle)
//!
//! At most one session exists at a time; selecting a new channel tears down
//! the previous one (backend destroyed, sinks cleared) before acquisition
//! begins. Every session is issued a monotonic token, and every
//! asynchronous completion is checked against the current token so a
//! torn-down session can never apply its resolution to a newer one.
//!
//! Backends are reached through narrow traits: a video sink, a frame sink
//! and an adaptive-stream capability produced by a factory. A factory that
//! returns `None` selects the native direct-playback path instead.

use std::time::{Duration, Instant};

use crate::error::PlayerError;
use crate::models::{Channel, MediaKind};

/// Acquisition deadline for embedded-frame channels.
pub const FRAME_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(12);
/// Acquisition deadline for segmented streams on the adaptive backend.
pub const STREAM_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(20);

/// Monotonic identity of one playback session.
pub type SessionToken = u64;

/// Tunables handed to the adaptive-stream backend.
#[derive(Debug, Clone)]
pub struct AdaptiveConfig {
    pub enable_worker: bool,
    pub low_latency_mode: bool,
    pub back_buffer_length: u32,
    pub max_buffer_length: u32,
    pub max_max_buffer_length: u32,
    pub max_buffer_size: u64,
    pub max_buffer_hole: f32,
    pub live_sync_duration_count: u32,
    pub live_max_latency_duration_count: u32,
    pub manifest_loading_timeout_ms: u32,
    pub manifest_loading_max_retry: u32,
    pub level_loading_timeout_ms: u32,
    pub level_loading_max_retry: u32,
    pub frag_loading_timeout_ms: u32,
    pub frag_loading_max_retry: u32,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            enable_worker: true,
            low_latency_mode: true,
            back_buffer_length: 60,
            max_buffer_length: 20,
            max_max_buffer_length: 300,
            max_buffer_size: 40_000_000,
            max_buffer_hole: 0.3,
            live_sync_duration_count: 2,
            live_max_latency_duration_count: 5,
            manifest_loading_timeout_ms: 8000,
            manifest_loading_max_retry: 3,
            level_loading_timeout_ms: 8000,
            level_loading_max_retry: 3,
            frag_loading_timeout_ms: 15000,
            frag_loading_max_retry: 4,
        }
    }
}

/// The single video surface. Exclusively owned by the active session.
pub trait VideoSink {
    fn set_source(&mut self, url: &str);
    fn clear_source(&mut self);
    /// Start playback of the current source. Playback driven by an attached
    /// adaptive backend treats this as a no-op confirmation.
    fn play(&mut self) -> Result<(), PlayerError>;
    fn pause(&mut self);
    fn set_volume(&mut self, volume: f32);
    fn set_muted(&mut self, muted: bool);
    fn source(&self) -> &str;
}

/// The single embedded-frame surface.
pub trait FrameSink {
    fn set_source(&mut self, url: &str);
    fn blank(&mut self);
}

/// Adaptive-stream capability, consumed as an opaque surface. Events come
/// back asynchronously as [`StreamEvent`] values tagged with the session
/// token they were issued under.
pub trait AdaptiveStream {
    fn load_source(&mut self, url: &str);
    fn attach(&mut self, sink: &mut dyn VideoSink);
    /// Reload from the network (network-class fatal error recovery).
    fn start_load(&mut self);
    /// Media-class fatal error recovery.
    fn recover_media_error(&mut self);
    fn destroy(&mut self);
}

/// Produces adaptive backends. `None` means the capability is unavailable
/// and the session falls back to native direct playback.
pub trait AdaptiveFactory {
    fn create(&mut self, config: &AdaptiveConfig, token: SessionToken) -> Option<Box<dyn AdaptiveStream>>;
}

/// Fatal-error categories reported by the adaptive backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamErrorCategory {
    Network,
    Media,
    Other,
}

/// Asynchronous event from the adaptive backend.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    ManifestParsed,
    Error {
        fatal: bool,
        category: StreamErrorCategory,
        details: String,
    },
}

/// Asynchronous event from the frame sink.
#[derive(Debug, Clone)]
pub enum FrameEvent {
    Loaded,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Acquiring,
    Playing,
    Error,
}

/// Observable outcome of a session step, applied by the UI layer
/// (indicator, overlay, immersive entry, error modal).
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Acquisition is in flight; nothing to apply yet.
    Pending,
    /// The session reached Playing.
    Started,
    /// The session failed; the error is surfaced to the user.
    Failed(PlayerError),
}

#[derive(Debug)]
pub struct PlaybackSession {
    pub channel: Channel,
    pub token: SessionToken,
    pub state: SessionState,
    deadline: Option<Instant>,
    frame_loaded: bool,
}

/// Owns the one active session, the adaptive backend handle, and the
/// volume/mute state that outlives individual sessions.
pub struct SessionController<F: AdaptiveFactory> {
    factory: F,
    config: AdaptiveConfig,
    next_token: SessionToken,
    session: Option<PlaybackSession>,
    backend: Option<Box<dyn AdaptiveStream>>,
    volume: f32,
    muted: bool,
    playing: bool,
}

impl<F: AdaptiveFactory> SessionController<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            config: AdaptiveConfig::default(),
            next_token: 1,
            session: None,
            backend: None,
            volume: 1.0,
            muted: false,
            playing: false,
        }
    }

    pub fn current(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn current_channel(&self) -> Option<&Channel> {
        self.session.as_ref().map(|s| &s.channel)
    }

    pub fn current_token(&self) -> Option<SessionToken> {
        self.session.as_ref().map(|s| s.token)
    }

    pub fn state(&self) -> Option<SessionState> {
        self.session.as_ref().map(|s| s.state)
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Select a channel and begin acquisition. Any prior session is torn
    /// down first; a channel without a URL never starts a session.
    pub fn select(
        &mut self,
        channel: Channel,
        video: &mut dyn VideoSink,
        frame: &mut dyn FrameSink,
        now: Instant,
    ) -> Transition {
        self.teardown(video, frame);

        if channel.url.is_empty() {
            return Transition::Failed(PlayerError::ChannelInvalid);
        }

        let token = self.next_token;
        self.next_token += 1;

        log::info!("Acquiring '{}' ({}) [session {}]", channel.name, channel.kind, token);

        let mut session = PlaybackSession {
            channel,
            token,
            state: SessionState::Acquiring,
            deadline: None,
            frame_loaded: false,
        };

        match session.channel.kind {
            MediaKind::EmbeddedFrame => {
                frame.set_source(&session.channel.url);
                session.deadline = Some(now + FRAME_ACQUIRE_TIMEOUT);
                self.session = Some(session);
                Transition::Pending
            }
            MediaKind::SegmentedStream => {
                if let Some(mut backend) = self.factory.create(&self.config, token) {
                    backend.load_source(&session.channel.url);
                    backend.attach(video);
                    self.backend = Some(backend);
                    session.deadline = Some(now + STREAM_ACQUIRE_TIMEOUT);
                    self.session = Some(session);
                    Transition::Pending
                } else {
                    // No adaptive capability: native playback fallback.
                    self.start_native(session, video)
                }
            }
            MediaKind::DirectFile => self.start_native(session, video),
        }
    }

    fn start_native(&mut self, mut session: PlaybackSession, video: &mut dyn VideoSink) -> Transition {
        video.set_source(&session.channel.url);
        video.set_volume(self.volume);
        video.set_muted(self.muted);

        match video.play() {
            Ok(()) => {
                session.state = SessionState::Playing;
                self.session = Some(session);
                self.playing = true;
                Transition::Started
            }
            Err(e) => {
                session.state = SessionState::Error;
                self.session = Some(session);
                Transition::Failed(e)
            }
        }
    }

    /// Apply an adaptive-backend event. Events carrying a stale token are
    /// discarded.
    pub fn handle_stream_event(
        &mut self,
        token: SessionToken,
        event: StreamEvent,
        video: &mut dyn VideoSink,
    ) -> Option<Transition> {
        if self.current_token() != Some(token) {
            log::debug!("Discarding stream event for stale session {}", token);
            return None;
        }

        match event {
            StreamEvent::ManifestParsed => {
                let session = self.session.as_mut()?;
                if session.state != SessionState::Acquiring {
                    return None;
                }
                match video.play() {
                    Ok(()) => {
                        session.state = SessionState::Playing;
                        session.deadline = None;
                        self.playing = true;
                        Some(Transition::Started)
                    }
                    Err(e) => self.fail(e),
                }
            }
            StreamEvent::Error { fatal: false, details, .. } => {
                log::warn!("Non-fatal stream error: {}", details);
                None
            }
            StreamEvent::Error { fatal: true, category, details } => match category {
                StreamErrorCategory::Network => {
                    log::warn!("Fatal network error, reloading: {}", details);
                    if let Some(backend) = self.backend.as_mut() {
                        backend.start_load();
                    }
                    None
                }
                StreamErrorCategory::Media => {
                    log::warn!("Fatal media error, recovering: {}", details);
                    if let Some(backend) = self.backend.as_mut() {
                        backend.recover_media_error();
                    }
                    None
                }
                StreamErrorCategory::Other => self.fail(PlayerError::BackendFatal { details }),
            },
        }
    }

    /// Apply a frame-sink event. Stale tokens are discarded.
    pub fn handle_frame_event(&mut self, token: SessionToken, event: FrameEvent) -> Option<Transition> {
        if self.current_token() != Some(token) {
            log::debug!("Discarding frame event for stale session {}", token);
            return None;
        }

        match event {
            FrameEvent::Loaded => {
                let session = self.session.as_mut()?;
                session.frame_loaded = true;
                if session.state != SessionState::Acquiring {
                    return None;
                }
                session.state = SessionState::Playing;
                session.deadline = None;
                self.playing = true;
                Some(Transition::Started)
            }
            FrameEvent::Error(details) => self.fail(PlayerError::BackendFatal { details }),
        }
    }

    /// Poll the acquisition deadline. A session still acquiring past its
    /// deadline fails with a timeout; a frame that reported loaded has
    /// already transitioned and is left alone.
    pub fn tick(&mut self, now: Instant) -> Option<Transition> {
        let session = self.session.as_ref()?;
        if session.state != SessionState::Acquiring {
            return None;
        }
        let deadline = session.deadline?;
        if now < deadline {
            return None;
        }

        let kind = session.channel.kind;
        if kind == MediaKind::EmbeddedFrame && session.frame_loaded {
            // Load completed right at the wire; count it as started.
            let session = self.session.as_mut()?;
            session.state = SessionState::Playing;
            session.deadline = None;
            self.playing = true;
            return Some(Transition::Started);
        }

        self.fail(PlayerError::AcquisitionTimeout { kind })
    }

    fn fail(&mut self, error: PlayerError) -> Option<Transition> {
        if let Some(session) = self.session.as_mut() {
            session.state = SessionState::Error;
            session.deadline = None;
        }
        self.playing = false;
        Some(Transition::Failed(error))
    }

    /// Return to the grid: release everything and go Idle.
    pub fn return_to_grid(&mut self, video: &mut dyn VideoSink, frame: &mut dyn FrameSink) {
        self.teardown(video, frame);
    }

    fn teardown(&mut self, video: &mut dyn VideoSink, frame: &mut dyn FrameSink) {
        if let Some(mut backend) = self.backend.take() {
            backend.destroy();
        }
        video.pause();
        video.clear_source();
        frame.blank();
        self.session = None;
        self.playing = false;
    }

    /// Toggle play/pause on the active session.
    pub fn toggle_play_pause(&mut self, video: &mut dyn VideoSink) -> Result<(), PlayerError> {
        if self.session.is_none() {
            return Ok(());
        }
        if self.playing {
            video.pause();
            self.playing = false;
            Ok(())
        } else {
            video.play()?;
            self.playing = true;
            Ok(())
        }
    }

    pub fn toggle_mute(&mut self, video: &mut dyn VideoSink) {
        self.muted = !self.muted;
        video.set_muted(self.muted);
    }

    /// Volume zero implies muted; raising it unmutes.
    pub fn set_volume(&mut self, video: &mut dyn VideoSink, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.muted = self.volume == 0.0;
        video.set_volume(self.volume);
        video.set_muted(self.muted);
    }

    /// Window went to the background: pause active playback.
    pub fn pause_for_background(&mut self, video: &mut dyn VideoSink) {
        if self.playing {
            video.pause();
            self.playing = false;
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;

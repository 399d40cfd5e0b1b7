//! External player process backends
//!
//! Playback is delegated to an external player (ffplay by default, mpv and
//! VLC recognized) spawned as a child process with stderr captured. The
//! adaptive backend wraps the same player with stream-tuned arguments and a
//! watcher thread that reports process exit as a categorized stream error.
//! Embedded-frame channels are handed to the system URL opener.

use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::error::PlayerError;
use crate::session::{
    AdaptiveConfig, AdaptiveFactory, AdaptiveStream, FrameEvent, FrameSink, SessionToken,
    StreamErrorCategory, StreamEvent, VideoSink,
};

/// Messages from backend threads back to the UI loop.
#[derive(Debug)]
pub enum BackendMessage {
    Stream { token: SessionToken, event: StreamEvent },
    Frame { generation: u64, event: FrameEvent },
    PlayerLog(String),
    PlayerExited { generation: u64, code: Option<i32> },
}

fn stream_title(url: &str) -> String {
    url.split('/').next_back().unwrap_or("stream").to_string()
}

/// Build the player command line for a plain source URL.
fn player_command(player: &str, url: &str, volume: f32, muted: bool, user_agent: Option<&str>) -> Command {
    let player_lower = player.to_lowercase();
    let mut cmd = Command::new(player);
    let title = stream_title(url);

    if player_lower.contains("ffplay") {
        // ffplay takes the input directly, not with -i
        cmd.arg(url);
        cmd.args(["-autoexit", "-sync", "audio", "-framedrop"]);
        cmd.args(["-window_title", &title]);
        let vol = if muted { 0 } else { (volume * 100.0) as u32 };
        cmd.args(["-volume", &vol.to_string()]);
        if url.starts_with("http") {
            cmd.args(["-reconnect", "1", "-reconnect_streamed", "1"]);
        }
        if let Some(agent) = user_agent {
            cmd.args(["-user_agent", agent]);
        }
    } else if player_lower.contains("mpv") {
        cmd.arg(url);
        cmd.arg(format!("--title={}", title));
        cmd.arg(format!("--volume={}", (volume * 100.0) as u32));
        cmd.arg(format!("--mute={}", if muted { "yes" } else { "no" }));
        cmd.arg("--cache=yes");
        cmd.arg("--ytdl=no");
        if let Some(agent) = user_agent {
            cmd.arg(format!("--user-agent={}", agent));
        }
    } else if player_lower.contains("vlc") {
        cmd.arg(url);
        cmd.arg(format!("--meta-title={}", title));
        cmd.arg("--http-reconnect");
        if let Some(agent) = user_agent {
            cmd.arg(format!("--http-user-agent={}", agent));
        }
    } else {
        // Generic player - just pass the URL
        cmd.arg(url);
    }

    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::piped());
    cmd
}

/// Pipe a child's stderr into the task channel, line by line.
fn spawn_stderr_reader(child: &mut Child, sender: Sender<BackendMessage>, tail: Option<Arc<Mutex<String>>>) {
    if let Some(stderr) = child.stderr.take() {
        thread::spawn(move || {
            let reader = BufReader::new(stderr);
            for line in reader.lines().map_while(Result::ok) {
                if line.trim().is_empty() {
                    continue;
                }
                if let Some(ref tail) = tail {
                    if let Ok(mut t) = tail.lock() {
                        *t = line.clone();
                    }
                }
                let _ = sender.send(BackendMessage::PlayerLog(format!("[PLAYER] {}", line)));
            }
        });
    }
}

/// Video sink backed by an external player process.
pub struct ProcessVideoSink {
    source: String,
    child: Option<Child>,
    generation: u64,
    player: String,
    user_agent: String,
    pass_user_agent: bool,
    volume: f32,
    muted: bool,
    sender: Sender<BackendMessage>,
}

impl ProcessVideoSink {
    pub fn new(player: &str, user_agent: &str, pass_user_agent: bool, sender: Sender<BackendMessage>) -> Self {
        let player = if player.is_empty() { "ffplay".to_string() } else { player.to_string() };
        Self {
            source: String::new(),
            child: None,
            generation: 0,
            player,
            user_agent: user_agent.to_string(),
            pass_user_agent,
            volume: 1.0,
            muted: false,
            sender,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn kill_child(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait(); // Reap the process
        }
    }

    /// Non-blocking exit check, polled once per frame.
    pub fn poll_exit(&mut self) -> Option<(u64, Option<i32>)> {
        let child = self.child.as_mut()?;
        match child.try_wait() {
            Ok(Some(status)) => {
                self.child = None;
                Some((self.generation, status.code()))
            }
            _ => None,
        }
    }
}

impl VideoSink for ProcessVideoSink {
    fn set_source(&mut self, url: &str) {
        self.source = url.to_string();
    }

    fn clear_source(&mut self) {
        self.kill_child();
        self.source.clear();
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        if self.child.is_some() {
            return Ok(());
        }
        // An attached adaptive backend owns the process; nothing to start.
        if self.source.is_empty() {
            return Ok(());
        }

        let agent = self.pass_user_agent.then_some(self.user_agent.as_str());
        let mut cmd = player_command(&self.player, &self.source, self.volume, self.muted, agent);

        match cmd.spawn() {
            Ok(mut child) => {
                self.generation += 1;
                log::info!("Player launched (PID {})", child.id());
                spawn_stderr_reader(&mut child, self.sender.clone(), None);
                self.child = Some(child);
                Ok(())
            }
            Err(e) => Err(PlayerError::PlaybackRejected {
                reason: format!("failed to launch player '{}': {}", self.player, e),
            }),
        }
    }

    fn pause(&mut self) {
        // External players cannot be paused from outside; stop the process.
        self.kill_child();
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn source(&self) -> &str {
        &self.source
    }
}

/// Embedded-frame sink: hands the URL to the system opener (the external
/// browser is the frame surface).
pub struct ProcessFrameSink {
    source: String,
    generation: u64,
    sender: Sender<BackendMessage>,
}

impl ProcessFrameSink {
    pub fn new(sender: Sender<BackendMessage>) -> Self {
        Self {
            source: "about:blank".to_string(),
            generation: 0,
            sender,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[cfg(target_os = "linux")]
    fn opener() -> &'static str {
        "xdg-open"
    }

    #[cfg(target_os = "macos")]
    fn opener() -> &'static str {
        "open"
    }

    #[cfg(target_os = "windows")]
    fn opener() -> &'static str {
        "explorer"
    }
}

impl FrameSink for ProcessFrameSink {
    fn set_source(&mut self, url: &str) {
        self.source = url.to_string();
        self.generation += 1;
        let generation = self.generation;

        let result = Command::new(Self::opener())
            .arg(url)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let event = match result {
            Ok(_) => FrameEvent::Loaded,
            Err(e) => FrameEvent::Error(format!("failed to open embedded player: {}", e)),
        };
        let _ = self.sender.send(BackendMessage::Frame { generation, event });
    }

    fn blank(&mut self) {
        // The opener process is fire-and-forget; just drop the source.
        self.source = "about:blank".to_string();
    }
}

/// Rough categorization of a failed stream process from its last stderr
/// line, mirroring the network/media split of the adaptive engine.
fn categorize_exit(last_line: &str) -> StreamErrorCategory {
    let lower = last_line.to_lowercase();
    let network = ["connection", "timed out", "timeout", "network", "resolve", "404", "403", "refused"];
    let media = ["invalid data", "decode", "codec", "demux", "corrupt"];

    if network.iter().any(|n| lower.contains(n)) {
        StreamErrorCategory::Network
    } else if media.iter().any(|m| lower.contains(m)) {
        StreamErrorCategory::Media
    } else {
        StreamErrorCategory::Other
    }
}

/// Adaptive backend wrapping the external player with stream-tuned flags.
pub struct ProcessAdaptiveStream {
    url: String,
    token: SessionToken,
    config: AdaptiveConfig,
    player: String,
    user_agent: Option<String>,
    child: Arc<Mutex<Option<Child>>>,
    stderr_tail: Arc<Mutex<String>>,
    sender: Sender<BackendMessage>,
}

impl ProcessAdaptiveStream {
    fn spawn_player(&mut self) {
        let mut cmd = player_command(&self.player, &self.url, 1.0, false, self.user_agent.as_deref());

        // Stream-specific buffering derived from the adaptive tunables.
        let player_lower = self.player.to_lowercase();
        if player_lower.contains("mpv") {
            cmd.arg(format!("--cache-secs={}", self.config.max_buffer_length));
            cmd.arg(format!("--network-timeout={}", self.config.manifest_loading_timeout_ms / 1000));
        } else if player_lower.contains("vlc") {
            cmd.arg(format!("--network-caching={}", self.config.max_buffer_length * 1000));
        }

        match cmd.spawn() {
            Ok(mut child) => {
                log::info!("Stream backend launched (PID {})", child.id());
                spawn_stderr_reader(&mut child, self.sender.clone(), Some(self.stderr_tail.clone()));
                *self.child.lock().unwrap() = Some(child);

                // Process start stands in for manifest availability.
                let _ = self.sender.send(BackendMessage::Stream {
                    token: self.token,
                    event: StreamEvent::ManifestParsed,
                });

                self.watch_exit();
            }
            Err(e) => {
                let _ = self.sender.send(BackendMessage::Stream {
                    token: self.token,
                    event: StreamEvent::Error {
                        fatal: true,
                        category: StreamErrorCategory::Other,
                        details: format!("failed to launch player '{}': {}", self.player, e),
                    },
                });
            }
        }
    }

    /// Watch for the player exiting on its own. A destroy() empties the
    /// slot and the watcher stops quietly.
    fn watch_exit(&self) {
        let child = self.child.clone();
        let tail = self.stderr_tail.clone();
        let sender = self.sender.clone();
        let token = self.token;

        thread::spawn(move || loop {
            thread::sleep(Duration::from_millis(500));
            let mut guard = match child.lock() {
                Ok(g) => g,
                Err(_) => return,
            };
            let Some(proc) = guard.as_mut() else { return };
            match proc.try_wait() {
                Ok(Some(status)) => {
                    *guard = None;
                    drop(guard);
                    if !status.success() {
                        let last = tail.lock().map(|t| t.clone()).unwrap_or_default();
                        let _ = sender.send(BackendMessage::Stream {
                            token,
                            event: StreamEvent::Error {
                                fatal: true,
                                category: categorize_exit(&last),
                                details: if last.is_empty() {
                                    format!("player exited with code {:?}", status.code())
                                } else {
                                    last
                                },
                            },
                        });
                    }
                    return;
                }
                Ok(None) => {}
                Err(_) => return,
            }
        });
    }

    fn kill(&mut self) {
        if let Ok(mut guard) = self.child.lock() {
            if let Some(mut child) = guard.take() {
                let _ = child.kill();
                let _ = child.wait();
            }
        }
    }
}

impl AdaptiveStream for ProcessAdaptiveStream {
    fn load_source(&mut self, url: &str) {
        self.url = url.to_string();
    }

    fn attach(&mut self, _sink: &mut dyn VideoSink) {
        self.spawn_player();
    }

    fn start_load(&mut self) {
        // Network recovery: restart the stream from the source.
        self.kill();
        self.spawn_player();
    }

    fn recover_media_error(&mut self) {
        self.kill();
        self.spawn_player();
    }

    fn destroy(&mut self) {
        self.kill();
    }
}

/// Produces process-backed adaptive streams.
pub struct ProcessAdaptiveFactory {
    pub player: String,
    pub user_agent: String,
    pub pass_user_agent: bool,
    sender: Sender<BackendMessage>,
}

impl ProcessAdaptiveFactory {
    pub fn new(player: &str, user_agent: &str, pass_user_agent: bool, sender: Sender<BackendMessage>) -> Self {
        let player = if player.is_empty() { "ffplay".to_string() } else { player.to_string() };
        Self {
            player,
            user_agent: user_agent.to_string(),
            pass_user_agent,
            sender,
        }
    }
}

impl AdaptiveFactory for ProcessAdaptiveFactory {
    fn create(&mut self, config: &AdaptiveConfig, token: SessionToken) -> Option<Box<dyn AdaptiveStream>> {
        Some(Box::new(ProcessAdaptiveStream {
            url: String::new(),
            token,
            config: config.clone(),
            player: self.player.clone(),
            user_agent: self.pass_user_agent.then(|| self.user_agent.clone()),
            child: Arc::new(Mutex::new(None)),
            stderr_tail: Arc::new(Mutex::new(String::new())),
            sender: self.sender.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_title_from_url() {
        assert_eq!(stream_title("https://example.com/live/stream.m3u8"), "stream.m3u8");
        assert_eq!(stream_title("plain"), "plain");
    }

    #[test]
    fn test_categorize_exit() {
        assert_eq!(categorize_exit("Connection refused"), StreamErrorCategory::Network);
        assert_eq!(categorize_exit("HTTP error 404 Not Found"), StreamErrorCategory::Network);
        assert_eq!(categorize_exit("Invalid data found when processing input"), StreamErrorCategory::Media);
        assert_eq!(categorize_exit("something else"), StreamErrorCategory::Other);
    }
}

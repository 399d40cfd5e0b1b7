//! Plan B TV - Rust Edition
//! A TV-mode IPTV channel browser with remote-control navigation

// Hide console window on Windows release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use eframe::egui;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

mod catalog;
mod config;
mod dispatcher;
mod error;
mod immersive;
mod models;
mod navigation;
mod overlay;
mod player_process;
mod session;

use catalog::{CatalogOutcome, MAX_RETRIES, RETRY_BACKOFF};
use config::AppConfig;
use dispatcher::{map_key, Intent};
use error::PlayerError;
use immersive::ImmersiveController;
use models::{Channel, ConnectionIndicator, MediaKind, View};
use navigation::{ControlId, Direction, FocusEntry, FocusIndex, Layout};
use overlay::OverlayTimer;
use player_process::{BackendMessage, ProcessAdaptiveFactory, ProcessFrameSink, ProcessVideoSink};
use session::{SessionController, SessionState, Transition};

/// Case-insensitive substring check without allocation
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() { return true; }
    if needle.len() > haystack.len() { return false; }

    haystack.as_bytes()
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

/// Search input debounce.
const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
/// Success toast lifetime.
const TOAST_LIFETIME: Duration = Duration::from_millis(4000);
/// Minimum channel-card footprint used to derive the column count.
const CARD_WIDTH: f32 = 240.0;

/// Background task messages
enum TaskResult {
    ChannelsLoaded {
        channels: Vec<Channel>,
        demo_fallback: bool,
    },
}

struct ErrorModal {
    title: String,
    message: String,
    details: Option<String>,
}

fn main() -> Result<(), eframe::Error> {
    env_logger::init();

    // Force X11 backend on Linux before any windowing code runs
    #[cfg(target_os = "linux")]
    {
        std::env::set_var("WINIT_UNIX_BACKEND", "x11");
        std::env::remove_var("WAYLAND_DISPLAY");
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1250.0, 700.0])
            .with_min_inner_size([1000.0, 550.0]),
        vsync: true,
        hardware_acceleration: eframe::HardwareAcceleration::Preferred,
        ..Default::default()
    };

    eframe::run_native(
        "Plan B TV - Rust Edition",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Ok(Box::new(PlanBApp::new()))
        }),
    )
}

struct PlanBApp {
    // Catalog
    channels: Vec<Channel>,
    filtered: Vec<usize>,
    categories: Vec<String>,
    loading_channels: bool,
    refreshing: bool,
    last_update: Option<chrono::DateTime<chrono::Local>>,

    // Search and filter
    search_query: String,
    applied_search: String,
    search_deadline: Option<Instant>,
    category_filter: Option<String>,

    // Navigation
    view: View,
    focused: Option<FocusEntry>,
    focus_search_requested: bool,
    grid_columns: usize,

    // Player
    sessions: SessionController<ProcessAdaptiveFactory>,
    video: ProcessVideoSink,
    frame: ProcessFrameSink,
    overlay: OverlayTimer,
    immersive: ImmersiveController,
    indicator: ConnectionIndicator,
    loading_overlay: bool,
    fullscreen: bool,

    // Notifications
    error_modal: Option<ErrorModal>,
    toast: Option<(String, Instant)>,

    // Background task channels
    task_receiver: Receiver<TaskResult>,
    task_sender: Sender<TaskResult>,
    backend_receiver: Receiver<BackendMessage>,

    // Console log
    console_log: Vec<String>,

    // Config
    config: AppConfig,
    was_minimized: bool,
}

impl PlanBApp {
    fn new() -> Self {
        let config = AppConfig::load();
        let (task_sender, task_receiver) = channel();
        let (backend_sender, backend_receiver) = channel();

        let user_agent = config.user_agent();
        let video = ProcessVideoSink::new(
            &config.external_player,
            &user_agent,
            config.pass_user_agent_to_player,
            backend_sender.clone(),
        );
        let frame = ProcessFrameSink::new(backend_sender.clone());
        let factory = ProcessAdaptiveFactory::new(
            &config.external_player,
            &user_agent,
            config.pass_user_agent_to_player,
            backend_sender,
        );

        let mut sessions = SessionController::new(factory);
        let mut dummy_video = NullVideo;
        restore_audio(&mut sessions, &mut dummy_video, config.volume, config.muted);

        let mut app = Self {
            channels: Vec::new(),
            filtered: Vec::new(),
            categories: Vec::new(),
            loading_channels: false,
            refreshing: false,
            last_update: None,
            search_query: String::new(),
            applied_search: String::new(),
            search_deadline: None,
            category_filter: None,
            view: View::Grid,
            focused: None,
            focus_search_requested: false,
            grid_columns: 4,
            sessions,
            video,
            frame,
            overlay: OverlayTimer::new(),
            immersive: ImmersiveController::new(),
            indicator: ConnectionIndicator::Connected,
            loading_overlay: false,
            fullscreen: false,
            error_modal: None,
            toast: None,
            task_receiver,
            task_sender,
            backend_receiver,
            console_log: vec!["[INFO] Plan B TV started".to_string()],
            config,
            was_minimized: false,
        };
        app.start_catalog_load();
        app
    }

    fn log(&mut self, msg: &str) {
        log::info!("{}", msg);
        self.console_log.push(msg.to_string());
        if self.console_log.len() > 500 {
            self.console_log.remove(0);
        }
    }

    fn start_catalog_load(&mut self) {
        self.loading_channels = true;
        self.indicator = ConnectionIndicator::Loading;
        let source = self.config.catalog_url.clone();
        let user_agent = self.config.user_agent();
        let sender = self.task_sender.clone();

        thread::spawn(move || {
            let CatalogOutcome { channels, demo_fallback } =
                catalog::load_with_retry(&source, &user_agent, MAX_RETRIES, RETRY_BACKOFF);
            let _ = sender.send(TaskResult::ChannelsLoaded { channels, demo_fallback });
        });
    }

    fn refresh_channels(&mut self) {
        if self.loading_channels {
            return;
        }
        self.log("[INFO] Refreshing channels");
        self.refreshing = true;
        self.start_catalog_load();
    }

    fn on_channels_loaded(&mut self, channels: Vec<Channel>, demo_fallback: bool) {
        self.loading_channels = false;
        self.channels = channels;
        self.last_update = Some(chrono::Local::now());

        // A demo fallback means the real catalog is unreachable.
        self.indicator = if demo_fallback {
            ConnectionIndicator::Error
        } else {
            ConnectionIndicator::Connected
        };

        let mut categories: Vec<String> = self.channels.iter().map(|c| c.category.clone()).collect();
        categories.sort();
        categories.dedup();
        self.categories = categories;

        if let Some(filter) = &self.category_filter {
            if !self.categories.contains(filter) {
                self.category_filter = None;
            }
        }
        self.apply_filter();

        self.log(&format!("[INFO] {} channels loaded", self.channels.len()));

        if demo_fallback {
            self.show_error(PlayerError::Catalog("demo channels were loaded instead".to_string()), None);
        } else if self.refreshing {
            self.toast = Some((format!("{} channels updated", self.channels.len()), Instant::now()));
        } else {
            self.toast = Some(("Plan B TV loaded".to_string(), Instant::now()));
        }
        self.refreshing = false;

        // Initial focus lands on the first channel card.
        if self.focused.is_none() && !self.filtered.is_empty() {
            self.focused = Some(FocusEntry::ChannelCard(0));
        }
    }

    fn apply_filter(&mut self) {
        let term = self.applied_search.trim().to_string();
        self.filtered = self
            .channels
            .iter()
            .enumerate()
            .filter(|(_, ch)| {
                let matches_search = term.is_empty()
                    || contains_ignore_case(&ch.name, &term)
                    || ch.description.as_deref().map(|d| contains_ignore_case(d, &term)).unwrap_or(false)
                    || contains_ignore_case(&ch.category, &term);
                let matches_category = self
                    .category_filter
                    .as_ref()
                    .map(|f| &ch.category == f)
                    .unwrap_or(true);
                matches_search && matches_category
            })
            .map(|(i, _)| i)
            .collect();

        // Focused card may no longer exist after filtering.
        if let Some(FocusEntry::ChannelCard(i)) = self.focused {
            if i >= self.filtered.len() {
                self.focused = if self.filtered.is_empty() {
                    Some(FocusEntry::SearchInput)
                } else {
                    Some(FocusEntry::ChannelCard(0))
                };
            }
        }
    }

    fn channel_count_text(&self) -> String {
        let count = self.filtered.len();
        let total = self.channels.len();
        if count == total {
            format!("{} channel{}", count, if count != 1 { "s" } else { "" })
        } else {
            format!("{} of {} channel{}", count, total, if total != 1 { "s" } else { "" })
        }
    }

    /// Snapshot of the focusable surface, rebuilt per key event because
    /// visibility changes between events.
    fn focus_index(&self) -> FocusIndex {
        match self.view {
            View::Grid => {
                let mut entries = vec![
                    FocusEntry::SearchInput,
                    FocusEntry::Control(ControlId::CategoryFilter),
                    FocusEntry::Control(ControlId::Refresh),
                    FocusEntry::Control(ControlId::Fullscreen),
                ];
                if self.filtered.is_empty() && !self.loading_channels {
                    entries.push(FocusEntry::Control(ControlId::RetryLoad));
                }
                for i in 0..self.filtered.len() {
                    entries.push(FocusEntry::ChannelCard(i));
                }
                FocusIndex::new(entries, Layout::Grid { columns: self.grid_columns.max(1) })
            }
            View::Player => {
                let mut entries = vec![FocusEntry::Control(ControlId::BackToGrid)];
                // Player controls are hidden for embedded-frame content.
                let embedded = matches!(
                    self.sessions.current_channel().map(|c| c.kind),
                    Some(MediaKind::EmbeddedFrame)
                );
                if !embedded {
                    entries.push(FocusEntry::Control(ControlId::PlayPause));
                    entries.push(FocusEntry::Control(ControlId::Mute));
                    entries.push(FocusEntry::Control(ControlId::PlayerFullscreen));
                }
                FocusIndex::new(entries, Layout::Linear)
            }
        }
    }

    fn navigate(&mut self, direction: Direction) {
        let index = self.focus_index();
        if index.is_empty() {
            return;
        }
        let current = self.focused.and_then(|f| index.position_of(f));
        self.focused = match current {
            // Unresolvable focus: land on the first element.
            None => index.entries.first().copied(),
            Some(pos) => index.next_from(pos, direction),
        };
    }

    fn activate_focused(&mut self, ctx: &egui::Context) {
        let Some(entry) = self.focused else { return };
        match entry {
            FocusEntry::ChannelCard(i) => {
                if let Some(&channel_idx) = self.filtered.get(i) {
                    let channel = self.channels[channel_idx].clone();
                    self.play_channel(channel);
                }
            }
            FocusEntry::SearchInput => self.focus_search_requested = true,
            FocusEntry::Control(ControlId::Refresh) | FocusEntry::Control(ControlId::RetryLoad) => {
                self.refresh_channels()
            }
            FocusEntry::Control(ControlId::Fullscreen)
            | FocusEntry::Control(ControlId::PlayerFullscreen) => self.toggle_fullscreen(ctx),
            FocusEntry::Control(ControlId::CategoryFilter) => self.cycle_category(),
            FocusEntry::Control(ControlId::BackToGrid) => self.show_grid(),
            FocusEntry::Control(ControlId::PlayPause) => self.toggle_play_pause(),
            FocusEntry::Control(ControlId::Mute) => {
                self.sessions.toggle_mute(&mut self.video);
            }
        }
    }

    /// Step the category filter through all known categories.
    fn cycle_category(&mut self) {
        if self.categories.is_empty() {
            return;
        }
        self.category_filter = match &self.category_filter {
            None => Some(self.categories[0].clone()),
            Some(current) => {
                let pos = self.categories.iter().position(|c| c == current);
                match pos {
                    Some(i) if i + 1 < self.categories.len() => Some(self.categories[i + 1].clone()),
                    _ => None,
                }
            }
        };
        self.apply_filter();
    }

    fn play_channel(&mut self, channel: Channel) {
        self.log(&format!("[PLAY] {} ({})", channel.name, channel.kind));

        self.view = View::Player;
        self.loading_overlay = true;
        self.indicator = ConnectionIndicator::Loading;
        self.overlay.reset();
        self.focused = Some(FocusEntry::Control(ControlId::BackToGrid));

        let transition = self
            .sessions
            .select(channel, &mut self.video, &mut self.frame, Instant::now());
        self.apply_transition(transition);
    }

    fn apply_transition(&mut self, transition: Transition) {
        let now = Instant::now();
        match transition {
            Transition::Pending => {}
            Transition::Started => {
                self.loading_overlay = false;
                self.indicator = ConnectionIndicator::Connected;
                if let Some(kind) = self.sessions.current_channel().map(|c| c.kind) {
                    // Show the overlay once, then let it auto-hide.
                    self.overlay.on_interaction(kind, now);
                }
                self.immersive.schedule_enter(now);
                self.log("[INFO] Playback started");
            }
            Transition::Failed(e) => {
                self.loading_overlay = false;
                self.indicator = ConnectionIndicator::Error;
                self.immersive.cancel_pending();
                let channel_name = self
                    .sessions
                    .current_channel()
                    .map(|c| c.name.clone());
                self.show_error(e, channel_name.as_deref());
            }
        }
    }

    fn show_error(&mut self, error: PlayerError, channel_name: Option<&str>) {
        let title = match channel_name {
            Some(name) => format!("{}: {}", error.title(), name),
            None => error.title().to_string(),
        };
        self.log(&format!("[ERROR] {}: {}", title, error));
        self.error_modal = Some(ErrorModal {
            title,
            message: error.to_string(),
            details: None,
        });
    }

    fn show_grid(&mut self) {
        self.immersive.exit();
        self.overlay.reset();
        self.view = View::Grid;
        self.loading_overlay = false;
        self.sessions.return_to_grid(&mut self.video, &mut self.frame);
        self.focused = if self.filtered.is_empty() {
            Some(FocusEntry::SearchInput)
        } else {
            Some(FocusEntry::ChannelCard(0))
        };
    }

    fn toggle_play_pause(&mut self) {
        if let Err(e) = self.sessions.toggle_play_pause(&mut self.video) {
            self.show_error(e, None);
        }
    }

    fn toggle_fullscreen(&mut self, ctx: &egui::Context) {
        self.fullscreen = !self.fullscreen;
        ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(self.fullscreen));
    }

    fn back_action(&mut self, ctx: &egui::Context) {
        if self.fullscreen {
            self.toggle_fullscreen(ctx);
        } else if self.immersive.is_active() || self.view == View::Player {
            self.show_grid();
        }
        // Already on the grid: nothing to leave.
    }

    fn apply_intent(&mut self, intent: Intent, ctx: &egui::Context) {
        match intent {
            Intent::Navigate(direction) => self.navigate(direction),
            Intent::Activate => self.activate_focused(ctx),
            Intent::Back => self.back_action(ctx),
            Intent::ToggleFullscreen => self.toggle_fullscreen(ctx),
            Intent::TogglePlayPause => self.toggle_play_pause(),
            Intent::ToggleMute => self.sessions.toggle_mute(&mut self.video),
            Intent::FocusSearch => {
                self.focused = Some(FocusEntry::SearchInput);
                self.focus_search_requested = true;
            }
            Intent::Refresh => self.refresh_channels(),
        }
    }

    fn process_tasks(&mut self) {
        while let Ok(result) = self.task_receiver.try_recv() {
            match result {
                TaskResult::ChannelsLoaded { channels, demo_fallback } => {
                    self.on_channels_loaded(channels, demo_fallback);
                }
            }
        }

        while let Ok(message) = self.backend_receiver.try_recv() {
            match message {
                BackendMessage::Stream { token, event } => {
                    let transition = self.sessions.handle_stream_event(token, event, &mut self.video);
                    if let Some(t) = transition {
                        self.apply_transition(t);
                    }
                }
                BackendMessage::Frame { generation, event } => {
                    if generation != self.frame.generation() {
                        continue;
                    }
                    let Some(token) = self.sessions.current_token() else { continue };
                    if let Some(t) = self.sessions.handle_frame_event(token, event) {
                        self.apply_transition(t);
                    }
                }
                BackendMessage::PlayerLog(line) => self.log(&line),
                BackendMessage::PlayerExited { generation, code } => {
                    self.handle_player_exit(generation, code);
                }
            }
        }

        if let Some((generation, code)) = self.video.poll_exit() {
            self.handle_player_exit(generation, code);
        }
    }

    fn handle_player_exit(&mut self, generation: u64, code: Option<i32>) {
        if generation != self.video.generation() {
            return;
        }
        match code {
            Some(0) => {
                // Stream ended or player closed; back to paused state.
                self.sessions.pause_for_background(&mut self.video);
            }
            _ => {
                if let Some(token) = self.sessions.current_token() {
                    let event = session::StreamEvent::Error {
                        fatal: true,
                        category: session::StreamErrorCategory::Other,
                        details: format!("player exited with code {:?}", code),
                    };
                    if let Some(t) = self.sessions.handle_stream_event(token, event, &mut self.video) {
                        self.apply_transition(t);
                    }
                }
            }
        }
    }

    fn process_timers(&mut self) {
        let now = Instant::now();

        if let Some(deadline) = self.search_deadline {
            if now >= deadline {
                self.search_deadline = None;
                self.applied_search = self.search_query.clone();
                self.apply_filter();
            }
        }

        self.overlay.tick(now, self.immersive.is_active());
        if self.immersive.tick(now) {
            // Entering immersive dismisses the overlay right away.
            self.overlay.hide();
        }

        if let Some(transition) = self.sessions.tick(now) {
            self.apply_transition(transition);
        }

        if let Some((_, shown_at)) = self.toast {
            if now.duration_since(shown_at) >= TOAST_LIFETIME {
                self.toast = None;
            }
        }
    }

    fn process_keys(&mut self, ctx: &egui::Context) {
        let search_focused = self.focus_search_requested
            || ctx.memory(|m| m.has_focus(egui::Id::new("search_input")));

        let keys: Vec<(egui::Key, egui::Modifiers)> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|e| match e {
                    egui::Event::Key { key, pressed: true, modifiers, .. } => Some((*key, *modifiers)),
                    _ => None,
                })
                .collect()
        });

        let player_visible = self.view == View::Player;
        let now = Instant::now();

        for (key, modifiers) in keys {
            // Any key press while the player shows counts as interaction.
            if player_visible {
                if let Some(kind) = self.sessions.current_channel().map(|c| c.kind) {
                    self.overlay.on_interaction(kind, now);
                }
            }

            // While typing in the search box, only Escape leaves it; letters
            // must not trigger mnemonics.
            if search_focused {
                if key == egui::Key::Escape {
                    self.focus_search_requested = false;
                    ctx.memory_mut(|m| m.surrender_focus(egui::Id::new("search_input")));
                }
                continue;
            }

            if let Some(intent) = map_key(key, modifiers, player_visible) {
                self.apply_intent(intent, ctx);
            }
        }

        // Mouse movement over the player also resets the overlay timers.
        if player_visible {
            let pointer_moved = ctx.input(|i| i.pointer.delta() != egui::Vec2::ZERO || i.pointer.any_click());
            if pointer_moved {
                if let Some(kind) = self.sessions.current_channel().map(|c| c.kind) {
                    self.overlay.on_interaction(kind, Instant::now());
                }
            }
        }
    }

    fn check_minimized(&mut self, ctx: &egui::Context) {
        let minimized = ctx.input(|i| i.viewport().minimized.unwrap_or(false));
        if minimized && !self.was_minimized {
            // Window went to the background: pause the active stream.
            self.sessions.pause_for_background(&mut self.video);
        }
        self.was_minimized = minimized;
    }

    // ----- UI ---------------------------------------------------------

    fn draw_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("📺 Plan B TV");
                ui.separator();

                let search_id = egui::Id::new("search_input");
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.search_query)
                        .id(search_id)
                        .hint_text("Search channels...")
                        .desired_width(220.0),
                );
                if response.changed() {
                    self.search_deadline = Some(Instant::now() + SEARCH_DEBOUNCE);
                }
                if self.focus_search_requested {
                    response.request_focus();
                    self.focus_search_requested = false;
                }
                if !self.search_query.is_empty() && ui.button("✖").clicked() {
                    self.search_query.clear();
                    self.applied_search.clear();
                    self.search_deadline = None;
                    self.apply_filter();
                }

                let selected = self.category_filter.clone().unwrap_or_else(|| "All categories".to_string());
                let mut changed = false;
                egui::ComboBox::from_id_salt("category_filter")
                    .selected_text(selected)
                    .show_ui(ui, |ui| {
                        if ui.selectable_label(self.category_filter.is_none(), "All categories").clicked() {
                            self.category_filter = None;
                            changed = true;
                        }
                        let categories = self.categories.clone();
                        for category in categories {
                            let active = self.category_filter.as_deref() == Some(category.as_str());
                            if ui.selectable_label(active, &category).clicked() {
                                self.category_filter = Some(category.clone());
                                changed = true;
                            }
                        }
                    });
                if changed {
                    self.apply_filter();
                }

                let refresh_focused = self.focused == Some(FocusEntry::Control(ControlId::Refresh));
                if focusable_button(ui, "🔄 Refresh", refresh_focused).clicked() {
                    self.refresh_channels();
                }
                let fs_focused = self.focused == Some(FocusEntry::Control(ControlId::Fullscreen));
                if focusable_button(ui, "⛶ Fullscreen", fs_focused).clicked() {
                    self.toggle_fullscreen(ctx);
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(self.channel_count_text());
                    if self.loading_channels {
                        ui.spinner();
                    }
                });
            });
        });
    }

    fn draw_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let (icon, color) = match self.indicator {
                    ConnectionIndicator::Connected => ("● Connected", egui::Color32::GREEN),
                    ConnectionIndicator::Loading => ("● Connecting...", egui::Color32::YELLOW),
                    ConnectionIndicator::Error => ("● Error", egui::Color32::RED),
                };
                ui.colored_label(color, icon);
                ui.separator();

                if let Some(last) = self.last_update {
                    ui.label(format!("Last update: {}", last.format("%H:%M")));
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(chrono::Local::now().format("%H:%M").to_string());
                });
            });
        });
    }

    fn draw_grid(&mut self, ui: &mut egui::Ui) {
        self.grid_columns = navigation::grid_columns(ui.available_width(), CARD_WIDTH);

        if self.loading_channels && self.channels.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.spinner();
            });
            return;
        }

        if self.filtered.is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.label("No channels found");
                let retry_focused = self.focused == Some(FocusEntry::Control(ControlId::RetryLoad));
                if focusable_button(ui, "Retry load", retry_focused).clicked() {
                    self.refresh_channels();
                }
            });
            return;
        }

        let mut clicked: Option<usize> = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            egui::Grid::new("channel_grid")
                .num_columns(self.grid_columns)
                .spacing([12.0, 12.0])
                .show(ui, |ui| {
                    for (pos, &channel_idx) in self.filtered.iter().enumerate() {
                        let channel = &self.channels[channel_idx];
                        let focused = self.focused == Some(FocusEntry::ChannelCard(pos));
                        if channel_card(ui, channel, focused).clicked() {
                            clicked = Some(channel_idx);
                        }
                        if (pos + 1) % self.grid_columns == 0 {
                            ui.end_row();
                        }
                    }
                });
        });

        if let Some(channel_idx) = clicked {
            let channel = self.channels[channel_idx].clone();
            self.play_channel(channel);
        }
    }

    fn draw_player(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let Some(channel) = self.sessions.current_channel().cloned() else {
            self.show_grid();
            return;
        };

        if self.overlay.is_cursor_hidden() {
            ctx.set_cursor_icon(egui::CursorIcon::None);
        }

        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.25);
            ui.heading(&channel.name);
            ui.label(&channel.category);
            ui.add_space(8.0);

            match self.sessions.state() {
                Some(SessionState::Acquiring) => {
                    ui.spinner();
                    ui.label("Acquiring stream...");
                }
                Some(SessionState::Playing) => {
                    let surface = match channel.kind {
                        MediaKind::EmbeddedFrame => "Playing in the embedded player",
                        _ => {
                            if self.sessions.is_playing() {
                                "Playing in the external player"
                            } else {
                                "Paused"
                            }
                        }
                    };
                    ui.label(surface);
                }
                Some(SessionState::Error) => {
                    ui.colored_label(egui::Color32::RED, "Playback failed");
                }
                None => {}
            }
        });

        if self.loading_overlay {
            ui.vertical_centered(|ui| {
                ui.spinner();
            });
        }

        if self.overlay.is_visible() {
            self.draw_player_overlay(ui, ctx, &channel);
        }
    }

    fn draw_player_overlay(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, channel: &Channel) {
        egui::TopBottomPanel::bottom("player_overlay").show_inside(ui, |ui| {
            ui.horizontal(|ui| {
                let back_focused = self.focused == Some(FocusEntry::Control(ControlId::BackToGrid));
                if focusable_button(ui, "⬅ Channels", back_focused).clicked() {
                    self.show_grid();
                    return;
                }

                // Player controls are not shown for embedded-frame content.
                if channel.kind != MediaKind::EmbeddedFrame {
                    let pp_focused = self.focused == Some(FocusEntry::Control(ControlId::PlayPause));
                    let pp_label = if self.sessions.is_playing() { "⏸" } else { "▶" };
                    if focusable_button(ui, pp_label, pp_focused).clicked() {
                        self.toggle_play_pause();
                    }

                    let mute_focused = self.focused == Some(FocusEntry::Control(ControlId::Mute));
                    let mute_label = if self.sessions.is_muted() { "🔇" } else { "🔊" };
                    if focusable_button(ui, mute_label, mute_focused).clicked() {
                        self.sessions.toggle_mute(&mut self.video);
                    }

                    let mut volume = self.sessions.volume();
                    if ui
                        .add(egui::Slider::new(&mut volume, 0.0..=1.0).show_value(false))
                        .changed()
                    {
                        self.sessions.set_volume(&mut self.video, volume);
                    }

                    let fs_focused = self.focused == Some(FocusEntry::Control(ControlId::PlayerFullscreen));
                    if focusable_button(ui, "⛶", fs_focused).clicked() {
                        self.toggle_fullscreen(ctx);
                    }
                }
            });
        });
    }

    fn draw_error_modal(&mut self, ctx: &egui::Context) {
        let Some(modal) = self.error_modal.take() else { return };
        let mut keep = true;
        let mut retry = false;
        let mut choose_other = false;

        egui::Window::new(&modal.title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(&modal.message);
                if let Some(details) = &modal.details {
                    ui.collapsing("Details", |ui| {
                        ui.monospace(details);
                    });
                }
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Retry").clicked() {
                        retry = true;
                        keep = false;
                    }
                    if ui.button("Choose another channel").clicked() {
                        choose_other = true;
                        keep = false;
                    }
                    if ui.button("Close").clicked() {
                        keep = false;
                    }
                });
            });

        if keep {
            self.error_modal = Some(modal);
        } else if retry {
            if let Some(channel) = self.sessions.current_channel().cloned() {
                self.play_channel(channel);
            } else {
                self.refresh_channels();
            }
        } else if choose_other {
            self.show_grid();
        }
    }

    fn draw_toast(&mut self, ctx: &egui::Context) {
        if let Some((message, _)) = &self.toast {
            let message = message.clone();
            egui::Area::new(egui::Id::new("success_toast"))
                .anchor(egui::Align2::CENTER_BOTTOM, egui::Vec2::new(0.0, -40.0))
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.label(format!("✔ {}", message));
                    });
                });
        }
    }
}

/// Button that renders a focus ring when the remote-control focus is on it.
fn focusable_button(ui: &mut egui::Ui, label: &str, focused: bool) -> egui::Response {
    let button = if focused {
        egui::Button::new(label).stroke(egui::Stroke::new(2.0, egui::Color32::LIGHT_BLUE))
    } else {
        egui::Button::new(label)
    };
    ui.add(button)
}

/// One channel card in the grid.
fn channel_card(ui: &mut egui::Ui, channel: &Channel, focused: bool) -> egui::Response {
    let subtitle = channel.description.as_deref().unwrap_or(&channel.category);
    let text = format!("{}\n{}", channel.name, subtitle);
    let button = egui::Button::new(text).min_size(egui::Vec2::new(CARD_WIDTH - 16.0, 72.0));
    let button = if focused {
        button.stroke(egui::Stroke::new(2.0, egui::Color32::LIGHT_BLUE))
    } else {
        button
    };
    ui.add(button)
}

/// Restore persisted audio state. Volume zero always ends up muted; a saved
/// mute applies on top of any audible volume.
fn restore_audio<F: session::AdaptiveFactory>(
    sessions: &mut SessionController<F>,
    video: &mut dyn session::VideoSink,
    volume: f32,
    muted: bool,
) {
    sessions.set_volume(video, volume);
    if muted && !sessions.is_muted() {
        sessions.toggle_mute(video);
    }
}

/// Sink stand-in used before any real playback starts (volume restore at
/// startup).
struct NullVideo;

impl session::VideoSink for NullVideo {
    fn set_source(&mut self, _url: &str) {}
    fn clear_source(&mut self) {}
    fn play(&mut self) -> Result<(), PlayerError> {
        Ok(())
    }
    fn pause(&mut self) {}
    fn set_volume(&mut self, _volume: f32) {}
    fn set_muted(&mut self, _muted: bool) {}
    fn source(&self) -> &str {
        ""
    }
}

impl eframe::App for PlanBApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Process background task results (non-blocking)
        self.process_tasks();
        self.process_keys(ctx);
        self.process_timers();
        self.check_minimized(ctx);

        if !self.immersive.chrome_hidden() {
            self.draw_header(ctx);
            self.draw_status_bar(ctx);
        }

        egui::CentralPanel::default().show(ctx, |ui| match self.view {
            View::Grid => self.draw_grid(ui),
            View::Player => self.draw_player(ui, ctx),
        });

        self.draw_error_modal(ctx);
        self.draw_toast(ctx);

        // Keep deadline-based timers moving even without input.
        ctx.request_repaint_after(Duration::from_millis(100));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.config.volume = self.sessions.volume();
        self.config.muted = self.sessions.is_muted();
        self.config.save();
        self.sessions.return_to_grid(&mut self.video, &mut self.frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_outcome_drives_indicator() {
        let mut app = PlanBApp::new();
        assert_eq!(app.indicator, ConnectionIndicator::Loading);

        app.on_channels_loaded(catalog::demo_channels(), true);
        assert_eq!(app.indicator, ConnectionIndicator::Error);
        assert!(app.error_modal.is_some());

        app.error_modal = None;
        app.on_channels_loaded(catalog::demo_channels(), false);
        assert_eq!(app.indicator, ConnectionIndicator::Connected);
        assert!(app.error_modal.is_none());

        app.refresh_channels();
        assert_eq!(app.indicator, ConnectionIndicator::Loading);
    }

    #[test]
    fn test_audio_restore_keeps_volume_zero_muted() {
        let (sender, _receiver) = channel();
        let factory = ProcessAdaptiveFactory::new("", "agent", false, sender);
        let mut sessions = SessionController::new(factory);
        let mut video = NullVideo;

        // Saved volume 0 with an unmuted flag still comes back muted.
        restore_audio(&mut sessions, &mut video, 0.0, false);
        assert!(sessions.is_muted());
        assert_eq!(sessions.volume(), 0.0);

        restore_audio(&mut sessions, &mut video, 0.5, true);
        assert!(sessions.is_muted());
        assert_eq!(sessions.volume(), 0.5);

        restore_audio(&mut sessions, &mut video, 0.5, false);
        assert!(!sessions.is_muted());
    }

    #[test]
    fn test_immersive_entry_hides_overlay() {
        let mut app = PlanBApp::new();
        app.overlay.on_interaction(MediaKind::DirectFile, Instant::now());
        assert!(app.overlay.is_visible());

        // Backdate the entry deadline so the next timer poll fires it.
        app.immersive.schedule_enter(Instant::now() - Duration::from_secs(1));
        app.process_timers();

        assert!(app.immersive.is_active());
        assert!(!app.overlay.is_visible());
    }
}

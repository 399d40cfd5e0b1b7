//! Player overlay auto-hide timing
//!
//! Deadlines are stored as `Option<Instant>` and polled once per frame from
//! the UI loop. Rescheduling always replaces the previous deadline, so at
//! most one hide timer per class is ever live.

use std::time::{Duration, Instant};

use crate::models::MediaKind;

/// Overlay auto-hide delay for native video playback.
pub const OVERLAY_HIDE_DELAY: Duration = Duration::from_millis(3000);
/// Embedded-frame content needs its controls less often, so it gets longer.
pub const FRAME_OVERLAY_HIDE_DELAY: Duration = Duration::from_millis(4000);
/// Cursor hides sooner than the overlay.
pub const CURSOR_HIDE_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug)]
pub struct OverlayTimer {
    visible: bool,
    auto_hidden: bool,
    cursor_hidden: bool,
    hide_deadline: Option<Instant>,
    cursor_deadline: Option<Instant>,
}

impl Default for OverlayTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayTimer {
    pub fn new() -> Self {
        Self {
            visible: false,
            auto_hidden: false,
            cursor_hidden: false,
            hide_deadline: None,
            cursor_deadline: None,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_auto_hidden(&self) -> bool {
        self.auto_hidden
    }

    pub fn is_cursor_hidden(&self) -> bool {
        self.cursor_hidden
    }

    /// Any interaction while the player is showing: reveal the overlay and
    /// cursor, then restart both hide timers from `now`. The hide delay
    /// depends on the channel kind.
    pub fn on_interaction(&mut self, kind: MediaKind, now: Instant) {
        self.visible = true;
        self.auto_hidden = false;
        self.cursor_hidden = false;

        let hide_delay = match kind {
            MediaKind::EmbeddedFrame => FRAME_OVERLAY_HIDE_DELAY,
            _ => OVERLAY_HIDE_DELAY,
        };

        // Replacing the deadlines supersedes any pending timers.
        self.hide_deadline = Some(now + hide_delay);
        self.cursor_deadline = Some(now + CURSOR_HIDE_DELAY);
    }

    /// Hide the overlay immediately. Leaves the cursor timer alone.
    pub fn hide(&mut self) {
        self.visible = false;
        self.hide_deadline = None;
    }

    /// Clear all state when the player closes.
    pub fn reset(&mut self) {
        self.visible = false;
        self.auto_hidden = false;
        self.cursor_hidden = false;
        self.hide_deadline = None;
        self.cursor_deadline = None;
    }

    /// Fire any expired deadlines. The cursor only hides while immersive
    /// presentation is active.
    pub fn tick(&mut self, now: Instant, immersive_active: bool) {
        if let Some(deadline) = self.hide_deadline {
            if now >= deadline {
                self.visible = false;
                self.auto_hidden = true;
                self.hide_deadline = None;
            }
        }

        if let Some(deadline) = self.cursor_deadline {
            if now >= deadline {
                if immersive_active {
                    self.cursor_hidden = true;
                }
                self.cursor_deadline = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> Instant {
        Instant::now()
    }

    #[test]
    fn test_interaction_shows_overlay() {
        let mut overlay = OverlayTimer::new();
        overlay.on_interaction(MediaKind::DirectFile, t0());
        assert!(overlay.is_visible());
        assert!(!overlay.is_auto_hidden());
    }

    #[test]
    fn test_overlay_hides_after_delay() {
        let mut overlay = OverlayTimer::new();
        let start = t0();
        overlay.on_interaction(MediaKind::DirectFile, start);
        overlay.tick(start + OVERLAY_HIDE_DELAY, false);
        assert!(!overlay.is_visible());
        assert!(overlay.is_auto_hidden());
    }

    #[test]
    fn test_repeat_interaction_supersedes_hide_timer() {
        let mut overlay = OverlayTimer::new();
        let start = t0();
        overlay.on_interaction(MediaKind::DirectFile, start);

        // Second interaction before the first delay elapses.
        let second = start + Duration::from_millis(2000);
        overlay.on_interaction(MediaKind::DirectFile, second);

        // Just past the original deadline the overlay must still be visible:
        // only the rescheduled timer is live.
        overlay.tick(start + OVERLAY_HIDE_DELAY + Duration::from_millis(1), false);
        assert!(overlay.is_visible());

        // It hides once the second deadline passes.
        overlay.tick(second + OVERLAY_HIDE_DELAY, false);
        assert!(!overlay.is_visible());
    }

    #[test]
    fn test_frame_content_uses_longer_delay() {
        let mut overlay = OverlayTimer::new();
        let start = t0();
        overlay.on_interaction(MediaKind::EmbeddedFrame, start);

        overlay.tick(start + OVERLAY_HIDE_DELAY, false);
        assert!(overlay.is_visible());

        overlay.tick(start + FRAME_OVERLAY_HIDE_DELAY, false);
        assert!(!overlay.is_visible());
    }

    #[test]
    fn test_cursor_hides_only_in_immersive() {
        let mut overlay = OverlayTimer::new();
        let start = t0();

        overlay.on_interaction(MediaKind::DirectFile, start);
        overlay.tick(start + CURSOR_HIDE_DELAY, false);
        assert!(!overlay.is_cursor_hidden());

        overlay.on_interaction(MediaKind::DirectFile, start);
        overlay.tick(start + CURSOR_HIDE_DELAY, true);
        assert!(overlay.is_cursor_hidden());
    }

    #[test]
    fn test_interaction_reveals_cursor() {
        let mut overlay = OverlayTimer::new();
        let start = t0();
        overlay.on_interaction(MediaKind::DirectFile, start);
        overlay.tick(start + CURSOR_HIDE_DELAY, true);
        assert!(overlay.is_cursor_hidden());

        overlay.on_interaction(MediaKind::DirectFile, start + CURSOR_HIDE_DELAY);
        assert!(!overlay.is_cursor_hidden());
    }

    #[test]
    fn test_manual_hide_keeps_cursor_timer() {
        let mut overlay = OverlayTimer::new();
        let start = t0();
        overlay.on_interaction(MediaKind::DirectFile, start);
        overlay.hide();
        assert!(!overlay.is_visible());

        // Cursor deadline still fires.
        overlay.tick(start + CURSOR_HIDE_DELAY, true);
        assert!(overlay.is_cursor_hidden());
    }
}

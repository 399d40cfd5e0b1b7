//! Immersive (chrome-hidden) presentation state
//!
//! Exactly one instance lives on the app. Entry is deferred half a second
//! after playback starts; exit is synchronous on return-to-grid or back.

use std::time::{Duration, Instant};

/// Delay between playback starting and chrome disappearing.
pub const IMMERSIVE_ENTER_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Default)]
pub struct ImmersiveController {
    active: bool,
    enter_deadline: Option<Instant>,
}

impl ImmersiveController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Header and status bar are hidden while immersive.
    pub fn chrome_hidden(&self) -> bool {
        self.active
    }

    /// Arm the deferred entry timer. Replaces any pending entry.
    pub fn schedule_enter(&mut self, now: Instant) {
        self.enter_deadline = Some(now + IMMERSIVE_ENTER_DELAY);
    }

    pub fn cancel_pending(&mut self) {
        self.enter_deadline = None;
    }

    /// Returns true on the frame immersive mode is entered.
    pub fn tick(&mut self, now: Instant) -> bool {
        if let Some(deadline) = self.enter_deadline {
            if now >= deadline {
                self.enter_deadline = None;
                self.active = true;
                log::info!("Entered immersive mode");
                return true;
            }
        }
        false
    }

    /// Leave immersive mode and drop any pending entry.
    pub fn exit(&mut self) {
        if self.active {
            log::info!("Exited immersive mode");
        }
        self.active = false;
        self.enter_deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_is_deferred() {
        let mut immersive = ImmersiveController::new();
        let start = Instant::now();
        immersive.schedule_enter(start);
        assert!(!immersive.tick(start + Duration::from_millis(499)));
        assert!(!immersive.is_active());
        assert!(immersive.tick(start + IMMERSIVE_ENTER_DELAY));
        assert!(immersive.is_active());
        assert!(immersive.chrome_hidden());
    }

    #[test]
    fn test_exit_cancels_pending_entry() {
        let mut immersive = ImmersiveController::new();
        let start = Instant::now();
        immersive.schedule_enter(start);
        immersive.exit();
        assert!(!immersive.tick(start + IMMERSIVE_ENTER_DELAY));
        assert!(!immersive.is_active());
    }

    #[test]
    fn test_reschedule_replaces_deadline() {
        let mut immersive = ImmersiveController::new();
        let start = Instant::now();
        immersive.schedule_enter(start);
        immersive.schedule_enter(start + Duration::from_millis(400));
        assert!(!immersive.tick(start + IMMERSIVE_ENTER_DELAY));
        assert!(immersive.tick(start + Duration::from_millis(900)));
    }
}

//! Remote-control key routing
//!
//! Maps raw key identity to a navigation or player intent. Letter mnemonics
//! carry modifier guards so platform shortcuts (Ctrl+F, Cmd+R, ...) are not
//! clobbered; play/pause and mute only mean anything while the player is
//! showing.

use egui::{Key, Modifiers};

use crate::navigation::Direction;

/// What a key press asks the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Navigate(Direction),
    Activate,
    Back,
    ToggleFullscreen,
    TogglePlayPause,
    ToggleMute,
    FocusSearch,
    Refresh,
}

/// Translate one key press into an intent, if it has one.
pub fn map_key(key: Key, modifiers: Modifiers, player_visible: bool) -> Option<Intent> {
    let plain = !modifiers.ctrl && !modifiers.command;

    match key {
        Key::ArrowUp => Some(Intent::Navigate(Direction::Up)),
        Key::ArrowDown => Some(Intent::Navigate(Direction::Down)),
        Key::ArrowLeft => Some(Intent::Navigate(Direction::Left)),
        Key::ArrowRight => Some(Intent::Navigate(Direction::Right)),

        Key::Enter | Key::Space => Some(Intent::Activate),
        Key::Escape | Key::Backspace => Some(Intent::Back),

        Key::F if plain => Some(Intent::ToggleFullscreen),
        Key::P if plain && player_visible => Some(Intent::TogglePlayPause),
        Key::M if plain && player_visible => Some(Intent::ToggleMute),
        Key::Slash => Some(Intent::FocusSearch),
        Key::R if plain => Some(Intent::Refresh),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: Modifiers = Modifiers::NONE;

    #[test]
    fn test_arrow_keys_navigate() {
        assert_eq!(
            map_key(Key::ArrowUp, NONE, false),
            Some(Intent::Navigate(Direction::Up))
        );
        assert_eq!(
            map_key(Key::ArrowRight, NONE, true),
            Some(Intent::Navigate(Direction::Right))
        );
    }

    #[test]
    fn test_activation_and_back() {
        assert_eq!(map_key(Key::Enter, NONE, false), Some(Intent::Activate));
        assert_eq!(map_key(Key::Space, NONE, false), Some(Intent::Activate));
        assert_eq!(map_key(Key::Escape, NONE, false), Some(Intent::Back));
        assert_eq!(map_key(Key::Backspace, NONE, true), Some(Intent::Back));
    }

    #[test]
    fn test_modifier_guard_preserves_platform_shortcuts() {
        assert_eq!(map_key(Key::F, NONE, false), Some(Intent::ToggleFullscreen));
        assert_eq!(map_key(Key::F, Modifiers::CTRL, false), None);
        assert_eq!(map_key(Key::R, Modifiers::COMMAND, false), None);
        assert_eq!(map_key(Key::R, NONE, false), Some(Intent::Refresh));
    }

    #[test]
    fn test_player_only_mnemonics() {
        assert_eq!(map_key(Key::P, NONE, false), None);
        assert_eq!(map_key(Key::P, NONE, true), Some(Intent::TogglePlayPause));
        assert_eq!(map_key(Key::M, NONE, false), None);
        assert_eq!(map_key(Key::M, NONE, true), Some(Intent::ToggleMute));
    }

    #[test]
    fn test_search_focus() {
        assert_eq!(map_key(Key::Slash, NONE, false), Some(Intent::FocusSearch));
    }

    #[test]
    fn test_unmapped_keys() {
        assert_eq!(map_key(Key::A, NONE, true), None);
        assert_eq!(map_key(Key::Tab, NONE, true), None);
    }
}

//! Remote-control focus navigation: focus enumeration and spatial movement
//!
//! The focus index is rebuilt on every directional key press because widget
//! visibility can change between events. Grid navigation deliberately does
//! not wrap (edges should not teleport on a TV remote); linear navigation
//! wraps for continuous cyclic access through toolbar controls.

/// Directional navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Topology of the currently focusable surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Channel grid with a known column-track count (minimum 1).
    Grid { columns: usize },
    /// Single row/column of controls.
    Linear,
}

/// Identifies a non-card focusable control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlId {
    CategoryFilter,
    Refresh,
    Fullscreen,
    BackToGrid,
    PlayPause,
    Mute,
    PlayerFullscreen,
    RetryLoad,
}

/// One focusable UI entry, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusEntry {
    SearchInput,
    Control(ControlId),
    ChannelCard(usize),
}

/// Ordered snapshot of the focusable surface for one key event.
#[derive(Debug, Clone)]
pub struct FocusIndex {
    pub entries: Vec<FocusEntry>,
    pub layout: Layout,
}

impl FocusIndex {
    pub fn new(entries: Vec<FocusEntry>, layout: Layout) -> Self {
        Self { entries, layout }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of the currently focused entry, if it is still focusable.
    pub fn position_of(&self, focused: FocusEntry) -> Option<usize> {
        self.entries.iter().position(|e| *e == focused)
    }

    /// Entry reached by moving from `current` in `direction`.
    pub fn next_from(&self, current: usize, direction: Direction) -> Option<FocusEntry> {
        let next = next_index(current, direction, self.layout, self.entries.len());
        self.entries.get(next).copied()
    }
}

/// Compute the next focus position under the given topology.
///
/// `current` must be in `[0, total)`; out-of-range positions are returned
/// unchanged.
pub fn next_index(current: usize, direction: Direction, layout: Layout, total: usize) -> usize {
    if total == 0 || current >= total {
        return current;
    }

    match layout {
        Layout::Grid { columns } => grid_next(current, direction, columns.max(1), total),
        Layout::Linear => linear_next(current, direction, total),
    }
}

fn grid_next(current: usize, direction: Direction, columns: usize, total: usize) -> usize {
    let row = current / columns;
    let col = current % columns;
    let last_row = (total - 1) / columns;

    match direction {
        Direction::Up => {
            if row > 0 {
                current - columns
            } else {
                current
            }
        }
        Direction::Down => {
            if row < last_row {
                (current + columns).min(total - 1)
            } else {
                current
            }
        }
        Direction::Left => {
            if col > 0 {
                current - 1
            } else {
                current
            }
        }
        Direction::Right => {
            if col < columns - 1 && current < total - 1 {
                current + 1
            } else {
                current
            }
        }
    }
}

fn linear_next(current: usize, direction: Direction, total: usize) -> usize {
    match direction {
        Direction::Up | Direction::Left => {
            if current > 0 {
                current - 1
            } else {
                total - 1
            }
        }
        Direction::Down | Direction::Right => {
            if current < total - 1 {
                current + 1
            } else {
                0
            }
        }
    }
}

/// Column-track count for the channel grid, derived from the available
/// width and the card footprint. Never less than 1.
pub fn grid_columns(available_width: f32, card_width: f32) -> usize {
    if card_width <= 0.0 {
        return 1;
    }
    ((available_width / card_width).floor() as usize).max(1)
}

#[cfg(test)]
#[path = "navigation_tests.rs"]
mod tests;

//! Tests for grid and linear focus navigation

#[cfg(test)]
mod tests {
    use crate::navigation::*;

    const GRID_4: Layout = Layout::Grid { columns: 4 };

    #[test]
    fn test_grid_interior_moves_one_step() {
        // 4 columns, 12 elements, position 5 = row 1 col 1
        assert_eq!(next_index(5, Direction::Up, GRID_4, 12), 1);
        assert_eq!(next_index(5, Direction::Down, GRID_4, 12), 9);
        assert_eq!(next_index(5, Direction::Left, GRID_4, 12), 4);
        assert_eq!(next_index(5, Direction::Right, GRID_4, 12), 6);
    }

    #[test]
    fn test_grid_top_row_does_not_wrap_up() {
        for col in 0..4 {
            assert_eq!(next_index(col, Direction::Up, GRID_4, 12), col);
        }
    }

    #[test]
    fn test_grid_bottom_row_does_not_wrap_down() {
        for idx in 8..12 {
            assert_eq!(next_index(idx, Direction::Down, GRID_4, 12), idx);
        }
    }

    #[test]
    fn test_grid_left_edge_does_not_wrap() {
        assert_eq!(next_index(0, Direction::Left, GRID_4, 12), 0);
        assert_eq!(next_index(4, Direction::Left, GRID_4, 12), 4);
        assert_eq!(next_index(8, Direction::Left, GRID_4, 12), 8);
    }

    #[test]
    fn test_grid_right_edge_does_not_wrap() {
        assert_eq!(next_index(3, Direction::Right, GRID_4, 12), 3);
        assert_eq!(next_index(7, Direction::Right, GRID_4, 12), 7);
        assert_eq!(next_index(11, Direction::Right, GRID_4, 12), 11);
    }

    #[test]
    fn test_grid_down_into_short_last_row_clamps() {
        // 10 elements over 4 columns: last row holds indices 8 and 9.
        // Moving down from 6 or 7 lands on the last element, not past it.
        assert_eq!(next_index(6, Direction::Down, GRID_4, 10), 9);
        assert_eq!(next_index(7, Direction::Down, GRID_4, 10), 9);
    }

    #[test]
    fn test_grid_right_stops_at_last_element() {
        // 9 elements over 4 columns: index 8 is alone on the last row.
        assert_eq!(next_index(8, Direction::Right, GRID_4, 9), 8);
    }

    #[test]
    fn test_grid_single_column_degenerate() {
        let layout = Layout::Grid { columns: 1 };
        assert_eq!(next_index(0, Direction::Down, layout, 3), 1);
        assert_eq!(next_index(1, Direction::Right, layout, 3), 1);
        assert_eq!(next_index(1, Direction::Left, layout, 3), 1);
        assert_eq!(next_index(2, Direction::Down, layout, 3), 2);
    }

    #[test]
    fn test_linear_wraps_both_ways() {
        assert_eq!(next_index(0, Direction::Up, Layout::Linear, 5), 4);
        assert_eq!(next_index(0, Direction::Left, Layout::Linear, 5), 4);
        assert_eq!(next_index(4, Direction::Down, Layout::Linear, 5), 0);
        assert_eq!(next_index(4, Direction::Right, Layout::Linear, 5), 0);
        assert_eq!(next_index(2, Direction::Right, Layout::Linear, 5), 3);
        assert_eq!(next_index(2, Direction::Left, Layout::Linear, 5), 1);
    }

    #[test]
    fn test_linear_forward_is_cyclic_permutation() {
        let total = 7;
        let start = 3;
        let mut idx = start;
        for _ in 0..total {
            idx = next_index(idx, Direction::Right, Layout::Linear, total);
        }
        assert_eq!(idx, start);
    }

    #[test]
    fn test_linear_backward_inverts_forward() {
        let total = 7;
        for start in 0..total {
            let fwd = next_index(start, Direction::Down, Layout::Linear, total);
            assert_eq!(next_index(fwd, Direction::Up, Layout::Linear, total), start);
        }
    }

    #[test]
    fn test_empty_and_out_of_range_are_unchanged() {
        assert_eq!(next_index(0, Direction::Down, Layout::Linear, 0), 0);
        assert_eq!(next_index(9, Direction::Down, GRID_4, 4), 9);
    }

    #[test]
    fn test_focus_index_position_of_missing_entry() {
        let index = FocusIndex::new(
            vec![FocusEntry::SearchInput, FocusEntry::ChannelCard(0)],
            Layout::Linear,
        );
        assert_eq!(index.position_of(FocusEntry::SearchInput), Some(0));
        assert_eq!(index.position_of(FocusEntry::ChannelCard(7)), None);
    }

    #[test]
    fn test_focus_index_next_from() {
        let index = FocusIndex::new(
            vec![
                FocusEntry::SearchInput,
                FocusEntry::Control(ControlId::Refresh),
                FocusEntry::ChannelCard(0),
            ],
            Layout::Linear,
        );
        assert_eq!(
            index.next_from(0, Direction::Right),
            Some(FocusEntry::Control(ControlId::Refresh))
        );
        assert_eq!(index.next_from(2, Direction::Right), Some(FocusEntry::SearchInput));
    }

    #[test]
    fn test_grid_columns_minimum_one() {
        assert_eq!(grid_columns(100.0, 240.0), 1);
        assert_eq!(grid_columns(0.0, 240.0), 1);
        assert_eq!(grid_columns(1000.0, 240.0), 4);
    }
}

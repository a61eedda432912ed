//! Diamond (isometric) projection between grid cells and screen space.
//!
//! Cell `(x, y)` maps to the centre of its diamond. Moving east shifts a tile
//! half a width right and half a height down; moving south shifts it half a
//! width left and half a height down. These functions ignore the camera; see
//! [`crate::settings::ProjectionSettings`] for the offset-aware wrappers.

use bevy::math::Vec2;

use crate::grid::GridPosition;

/// Projects a cell to the screen position of its centre.
///
/// # Examples
///
/// ```
/// use skirmish::grid::GridPosition;
/// use skirmish::projection::grid_to_screen;
///
/// let screen = grid_to_screen(GridPosition::new(1, 0), 64.0, 32.0);
/// assert_eq!((screen.x, screen.y), (32.0, 16.0));
/// ```
#[expect(
    clippy::cast_precision_loss,
    reason = "Board coordinates are far below 2^24, where f32 stays exact."
)]
#[must_use]
pub const fn grid_to_screen(cell: GridPosition, tile_width: f32, tile_height: f32) -> Vec2 {
    let (x, y) = (cell.x as f32, cell.y as f32);
    Vec2::new((x - y) * tile_width / 2.0, (x + y) * tile_height / 2.0)
}

/// Inverse of [`grid_to_screen`]: the cell whose diamond contains `screen`.
///
/// Points on a diamond edge round away from the origin.
#[expect(
    clippy::cast_possible_truncation,
    reason = "Rounded board coordinates fit comfortably in i32."
)]
#[must_use]
pub fn screen_to_grid(screen: Vec2, tile_width: f32, tile_height: f32) -> GridPosition {
    let u = screen.x / (tile_width / 2.0);
    let v = screen.y / (tile_height / 2.0);
    GridPosition::new(((u + v) / 2.0).round() as i32, ((v - u) / 2.0).round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    const W: f32 = 64.0;
    const H: f32 = 32.0;

    #[rstest]
    #[case::origin(GridPosition::new(0, 0), Vec2::ZERO)]
    #[case::east(GridPosition::new(1, 0), Vec2::new(32.0, 16.0))]
    #[case::south(GridPosition::new(0, 1), Vec2::new(-32.0, 16.0))]
    #[case::diagonal(GridPosition::new(2, 2), Vec2::new(0.0, 64.0))]
    #[case::negative(GridPosition::new(-1, 0), Vec2::new(-32.0, -16.0))]
    fn projects_cell_centres(#[case] cell: GridPosition, #[case] expected: Vec2) {
        let screen = grid_to_screen(cell, W, H);
        assert_relative_eq!(screen.x, expected.x);
        assert_relative_eq!(screen.y, expected.y);
    }

    #[rstest]
    #[case(GridPosition::new(0, 0))]
    #[case(GridPosition::new(7, 3))]
    #[case(GridPosition::new(-4, 9))]
    fn centres_map_back_to_their_cell(#[case] cell: GridPosition) {
        assert_eq!(screen_to_grid(grid_to_screen(cell, W, H), W, H), cell);
    }

    #[test]
    fn points_inside_a_diamond_resolve_to_it() {
        let centre = grid_to_screen(GridPosition::new(3, 4), W, H);
        for nudge in [
            Vec2::new(10.0, 0.0),
            Vec2::new(-10.0, 0.0),
            Vec2::new(0.0, 6.0),
            Vec2::new(0.0, -6.0),
        ] {
            assert_eq!(screen_to_grid(centre + nudge, W, H), GridPosition::new(3, 4));
        }
    }
}

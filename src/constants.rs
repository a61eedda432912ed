//! Tuning constants shared by the projection, motion and turn systems.
//!
//! These are the defaults behind [`crate::settings::ProjectionSettings`] and
//! [`crate::settings::MotionSettings`]; hosts override them through the
//! settings resources rather than by editing these values.

/// Width of one diamond tile in screen pixels.
pub const TILE_WIDTH: f32 = 64.0;
/// Height of one diamond tile in screen pixels.
///
/// Half the width, which is why horizontal motion runs at twice the vertical
/// speed.
pub const TILE_HEIGHT: f32 = 32.0;
/// Screen offset of grid cell `(0, 0)`.
pub const CAMERA_OFFSET: [f32; 2] = [400.0, 64.0];
/// Default interpolation speed in pixels per second.
pub const WALK_SPEED: f32 = 120.0;
/// Speeds below this use the tight arrival tolerance.
pub const SNAP_SPEED_THRESHOLD: f32 = 80.0;
/// Arrival tolerance in pixels for slow movers.
pub const SLOW_ARRIVAL_TOLERANCE: f32 = 1.0;
/// Arrival tolerance in pixels for fast movers.
///
/// Wide enough that a fast mover at a low tick rate cannot oscillate around
/// its target.
pub const FAST_ARRIVAL_TOLERANCE: f32 = 4.0;
/// Steps granted to a unit at the start of its controller's turn.
pub const DEFAULT_MOVES_PER_TURN: u32 = 3;

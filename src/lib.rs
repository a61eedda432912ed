//! Simulation core for a turn-based tactics game on a diamond grid.
//!
//! Units occupy grid cells, players alternate turns, and projectiles and
//! pushed objects travel through the grid under collision rules. The crate is
//! a set of Bevy ECS systems bundled in [`SkirmishPlugin`]; rendering, input
//! and content loading belong to the host.
pub mod components;
pub mod constants;
pub mod damage;
pub mod grid;
pub mod logging;
pub mod motion;
pub mod plugin;
pub mod projectile;
pub mod projection;
pub mod push;
pub mod settings;
pub mod spawn;
pub mod turn;

pub use constants::*;

// Re-export commonly used items
pub use damage::{DamageEvent, DamageInbox};
pub use grid::{Direction, GridError, GridPosition, Motion, MotionCause};
pub use logging::init as init_logging;
pub use plugin::{SimSet, SkirmishPlugin};
pub use projection::{grid_to_screen, screen_to_grid};
pub use push::{attempt_push, PushOutcome, PushQueue, PushRequest};
pub use settings::{MotionSettings, ProjectionSettings, SettingsError, SimSettings};
pub use turn::{Selection, TurnState};

pub mod prelude {
    //! Everything a host needs to drive a match.
    //!
    //! ```rust,no_run
    //! use skirmish::prelude::*;
    //! ```

    pub use crate::components::{
        ActiveTurn, Clickable, CollisionPolicy, ControlledBy, ControlledUnits, Disabled, Gates,
        Ground, Health, Impassable, MoveBudget, MoveSpeed, Player, PlayerIndex, Projectile,
        Pushable, ScreenPosition, Selected, StepRate,
    };
    pub use crate::damage::{DamageDealt, DestroyCause, EntityDestroyed};
    pub use crate::motion::UnitMoved;
    pub use crate::spawn::{
        spawn_board, spawn_obstacle, GroundBundle, PlayerBundle, ProjectileBundle, UnitBundle,
    };
    pub use crate::turn::{
        CancelSpell, EndTurn, MoveUnit, PrepSpell, ResetMatch, SelectUnit, SpellCast, StartMatch,
    };
    pub use crate::{
        Direction, GridPosition, Motion, MotionCause, PushQueue, PushRequest, Selection,
        SimSettings, SkirmishPlugin, TurnState,
    };
}

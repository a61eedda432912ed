//! Runtime configuration for projection and motion.
//!
//! Both settings types are Bevy resources. `SkirmishPlugin` initialises them
//! with their defaults only when the host has not inserted its own values, so
//! overrides go in before the plugin is added:
//!
//! ```ignore
//! use skirmish::{settings::SimSettings, SkirmishPlugin};
//!
//! let settings = SimSettings::from_json_file("skirmish.json")?;
//! settings.insert_into(&mut app);
//! app.add_plugins(SkirmishPlugin);
//! ```

use std::fs;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::GridPosition;
use crate::projection::{grid_to_screen, screen_to_grid};
use crate::{
    CAMERA_OFFSET, FAST_ARRIVAL_TOLERANCE, SLOW_ARRIVAL_TOLERANCE, SNAP_SPEED_THRESHOLD,
    TILE_HEIGHT, TILE_WIDTH, WALK_SPEED,
};

/// Tile geometry and camera placement for the diamond projection.
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionSettings {
    /// Full diamond width in pixels.
    pub tile_width: f32,
    /// Full diamond height in pixels.
    pub tile_height: f32,
    /// Screen position of cell `(0, 0)`, as `[x, y]`.
    pub camera_offset: [f32; 2],
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            tile_width: TILE_WIDTH,
            tile_height: TILE_HEIGHT,
            camera_offset: CAMERA_OFFSET,
        }
    }
}

impl ProjectionSettings {
    /// Camera offset as a vector.
    #[must_use]
    pub const fn offset(&self) -> Vec2 {
        let [x, y] = self.camera_offset;
        Vec2::new(x, y)
    }

    /// Screen position of `cell`'s centre, camera offset included.
    #[must_use]
    pub fn to_screen(&self, cell: GridPosition) -> Vec2 {
        grid_to_screen(cell, self.tile_width, self.tile_height) + self.offset()
    }

    /// Cell under a screen position, camera offset included.
    #[must_use]
    pub fn to_grid(&self, screen: Vec2) -> GridPosition {
        screen_to_grid(screen - self.offset(), self.tile_width, self.tile_height)
    }
}

/// Interpolation speed and arrival tolerances.
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSettings {
    /// Speed used when an entity has no `MoveSpeed`, in pixels per second.
    pub walk_speed: f32,
    /// Speeds strictly below this use `slow_tolerance`.
    pub snap_speed_threshold: f32,
    /// Arrival tolerance in pixels for slow movers.
    pub slow_tolerance: f32,
    /// Arrival tolerance in pixels for fast movers.
    pub fast_tolerance: f32,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            walk_speed: WALK_SPEED,
            snap_speed_threshold: SNAP_SPEED_THRESHOLD,
            slow_tolerance: SLOW_ARRIVAL_TOLERANCE,
            fast_tolerance: FAST_ARRIVAL_TOLERANCE,
        }
    }
}

impl MotionSettings {
    /// Arrival tolerance for an entity moving at `speed`.
    #[must_use]
    pub const fn tolerance_for(&self, speed: f32) -> f32 {
        if speed < self.snap_speed_threshold {
            self.slow_tolerance
        } else {
            self.fast_tolerance
        }
    }
}

/// Errors raised while loading [`SimSettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read settings from {path}: {source}")]
    Read {
        /// Path that was requested.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The settings document was not valid JSON for [`SimSettings`].
    #[error("invalid settings document: {0}")]
    Parse(#[from] serde_json::Error),
    /// A numeric setting was outside its usable range.
    #[error("{field} must be {requirement}, got {value}")]
    OutOfRange {
        /// Dotted path of the offending setting.
        field: &'static str,
        /// Rejected value.
        value: f32,
        /// Accepted range, for the message.
        requirement: &'static str,
    },
}

/// All tunables in one document; missing sections fall back to defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    /// Projection geometry.
    pub projection: ProjectionSettings,
    /// Interpolation tuning.
    pub motion: MotionSettings,
}

impl SimSettings {
    /// Parses a JSON settings document.
    ///
    /// # Errors
    /// Returns [`SettingsError::Parse`] when the document is malformed and
    /// [`SettingsError::OutOfRange`] when a value fails [`Self::validate`].
    pub fn from_json_str(document: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(document)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks that tile sizes and the walk speed are finite and positive and
    /// that the arrival tolerances are finite and non-negative.
    ///
    /// # Errors
    /// Returns [`SettingsError::OutOfRange`] naming the first bad value.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let positive = [
            ("projection.tile_width", self.projection.tile_width),
            ("projection.tile_height", self.projection.tile_height),
            ("motion.walk_speed", self.motion.walk_speed),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SettingsError::OutOfRange {
                    field,
                    value,
                    requirement: "finite and greater than zero",
                });
            }
        }
        let non_negative = [
            ("motion.snap_speed_threshold", self.motion.snap_speed_threshold),
            ("motion.slow_tolerance", self.motion.slow_tolerance),
            ("motion.fast_tolerance", self.motion.fast_tolerance),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SettingsError::OutOfRange {
                    field,
                    value,
                    requirement: "finite and not negative",
                });
            }
        }
        Ok(())
    }

    /// Reads and parses a JSON settings file.
    ///
    /// # Errors
    /// Returns [`SettingsError::Read`] when the file cannot be read and
    /// [`SettingsError::Parse`] when its contents are malformed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let file = path.as_ref();
        let document = fs::read_to_string(file).map_err(|source| SettingsError::Read {
            path: file.display().to_string(),
            source,
        })?;
        Self::from_json_str(&document)
    }

    /// Inserts both resources, replacing any existing values.
    pub fn insert_into(self, app: &mut App) {
        app.insert_resource(self.projection);
        app.insert_resource(self.motion);
    }
}

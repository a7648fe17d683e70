//! Game configuration, read from a RON file with built-in defaults for
//! every field.

use serde::{Deserialize, Serialize};

use crate::entity::Tuning;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Logical view size. World units map 1:1 to these pixels before the
    /// surface is scaled to the real window.
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Lander".to_string(),
            width: 1000,
            height: 600,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Seconds of simulated time per step.
    pub fixed_timestep: f32,
    /// Downward acceleration applied to the player every frame.
    pub gravity: f32,
    /// The run ends once the player's y passes this line.
    pub end_game_threshold: f32,
    pub player: Tuning,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 60.0,
            gravity: 10.0,
            end_game_threshold: 800.0,
            player: Tuning::default(),
        }
    }
}

/// Placement of the player and the patrolling obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Player spawn, relative to the level origin.
    pub player_offset: [f32; 2],
    /// Player size as a multiple of the tile size.
    pub player_tiles: f32,
    /// Absolute x of the patrol anchor; its y is the level origin's.
    pub patrol_x: f32,
    pub patrol_tiles: f32,
    pub patrol_amplitude: f32,
    pub patrol_frequency: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            player_offset: [-300.0, -200.0],
            player_tiles: 1.0,
            patrol_x: 300.0,
            patrol_tiles: 2.0,
            patrol_amplitude: 20.0,
            patrol_frequency: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub tile_sheet: String,
    pub tile_sheet_columns: u32,
    pub tile_sheet_rows: u32,
    pub player: String,
    pub patrol: String,
    /// TrueType/OpenType face for HUD text.
    pub font: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            tile_sheet: "assets/game/tilesheet.png".to_string(),
            tile_sheet_columns: 4,
            tile_sheet_rows: 1,
            player: "assets/game/lander.png".to_string(),
            patrol: "assets/game/ufo.png".to_string(),
            font: "assets/fonts/DejaVuSansMono.ttf".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub physics: PhysicsConfig,
    pub scene: SceneConfig,
    pub assets: AssetConfig,
    /// KDL level file. None uses the built-in layout.
    pub level: Option<String>,
    /// Outline every active collider.
    pub show_colliders: bool,
}

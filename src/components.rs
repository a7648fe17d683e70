use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Tile identifier stored in a map cell. 0 is empty.
pub type TileId = u32;

pub const EMPTY_TILE: TileId = 0;
pub const WIN_TILE: TileId = 2;

/// Unique entity identifier within one simulation. Never use a raw u64
/// where an EntityId is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u64);

/// Fixed-step counter. Never cast between Tick and EntityId.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tick(pub u64);

/// Index into the sprite renderer's texture table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Up,
    Right,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Up,
        Direction::Right,
        Direction::Down,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Scripted vertical bobbing around a fixed anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Patrol {
    pub anchor: Vec2,
    pub amplitude: f32,
    /// Angular frequency in radians per second of simulation time.
    pub frequency: f32,
}

impl Patrol {
    pub fn position_at(&self, clock: f32) -> Vec2 {
        Vec2::new(
            self.anchor.x,
            self.anchor.y + (clock * self.frequency).sin() * self.amplitude,
        )
    }
}

/// What kind of game object an entity is. Behaviour differences are driven
/// by matching on this, not by separate types.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityKind {
    Player,
    Block,
    Patrol(Patrol),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityStatus {
    Active,
    Inactive,
}

/// Collision outcome. Playing → {Won, Lost}; never back to Playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Playing,
    Won,
    Lost,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        self != Outcome::Playing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoostStatus {
    Boosting,
    Neutral,
}

/// Per-side contact flags, cleared at the start of every step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionFlags {
    pub top: bool,
    pub bottom: bool,
    pub left: bool,
    pub right: bool,
}

impl CollisionFlags {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Axis-aligned rectangle: top-left corner plus size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle of the given size centred on `center`.
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        Self {
            x: center.x - size.x / 2.0,
            y: center.y - size.y / 2.0,
            w: size.x,
            h: size.y,
        }
    }
}

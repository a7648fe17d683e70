use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::animation::Animation;
use crate::collision::{
    HorizontalGate, highest_tile, horizontal_probes, overlaps, tile_outcome, vertical_probes,
};
use crate::components::{
    BoostStatus, CollisionFlags, Direction, EntityId, EntityKind, EntityStatus, Outcome,
    TextureId,
};
use crate::error::LanderError;
use crate::tile_map::TileMap;

/// Per-entity physics constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Velocity multiplier applied once per step, independent of dt.
    pub drag: f32,
    /// Magnitude of the thrust acceleration.
    pub boost_speed: f32,
    /// Degrees per second while a rotate control is held.
    pub rotation_speed: f32,
    /// Seconds of thrust available.
    pub fuel: f32,
    pub horizontal_gate: HorizontalGate,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            drag: 0.995,
            boost_speed: 30.0,
            rotation_speed: 30.0,
            fuel: 20.0,
            horizontal_gate: HorizontalGate::default(),
        }
    }
}

/// A movable, renderable game object.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    status: EntityStatus,
    outcome: Outcome,

    position: Vec2,
    movement: Vec2,
    velocity: Vec2,
    acceleration: Vec2,

    scale: Vec2,
    collider: Vec2,

    /// Degrees, clockwise on screen.
    angle: f32,
    /// Degrees per second.
    rotation: f32,
    direction: Direction,
    boost: BoostStatus,
    fuel: f32,
    flags: CollisionFlags,

    texture: TextureId,
    animation: Option<Animation>,
    tuning: Tuning,
}

/// Collider extents must be positive and finite on both axes.
pub fn check_collider(collider: Vec2) -> Result<(), LanderError> {
    if !(collider.x > 0.0 && collider.y > 0.0) || !collider.is_finite() {
        return Err(LanderError::InvalidCollider {
            width: collider.x,
            height: collider.y,
        });
    }
    Ok(())
}

impl Entity {
    /// Collider defaults to the render scale, so `scale` must be a valid
    /// collider.
    pub fn new(
        id: EntityId,
        position: Vec2,
        scale: Vec2,
        texture: TextureId,
        kind: EntityKind,
    ) -> Result<Self, LanderError> {
        check_collider(scale)?;
        let tuning = Tuning::default();
        Ok(Self {
            id,
            kind,
            status: EntityStatus::Active,
            outcome: Outcome::Playing,
            position,
            movement: Vec2::ZERO,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            scale,
            collider: scale,
            angle: 0.0,
            rotation: 0.0,
            direction: Direction::Right,
            boost: BoostStatus::Neutral,
            fuel: tuning.fuel,
            flags: CollisionFlags::default(),
            texture,
            animation: None,
            tuning,
        })
    }

    pub fn with_animation(mut self, animation: Animation) -> Self {
        self.animation = Some(animation);
        self
    }

    /// Replaces the physics constants and refills fuel to the new capacity.
    pub fn with_tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = tuning;
        self.fuel = tuning.fuel.max(0.0);
        self
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn movement(&self) -> Vec2 {
        self.movement
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn acceleration(&self) -> Vec2 {
        self.acceleration
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn collider(&self) -> Vec2 {
        self.collider
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn rotation_rate(&self) -> f32 {
        self.rotation
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn fuel(&self) -> f32 {
        self.fuel
    }

    pub fn flags(&self) -> CollisionFlags {
        self.flags
    }

    pub fn texture(&self) -> TextureId {
        self.texture
    }

    pub fn animation(&self) -> Option<&Animation> {
        self.animation.as_ref()
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_boosting(&self) -> bool {
        self.boost == BoostStatus::Boosting
    }

    pub fn is_active(&self) -> bool {
        self.status == EntityStatus::Active
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome.is_terminal()
    }

    pub fn has_won(&self) -> bool {
        self.outcome == Outcome::Won
    }

    pub fn has_lost(&self) -> bool {
        self.outcome == Outcome::Lost
    }

    pub fn activate(&mut self) {
        self.status = EntityStatus::Active;
    }

    pub fn deactivate(&mut self) {
        self.status = EntityStatus::Inactive;
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    pub fn set_acceleration(&mut self, acceleration: Vec2) {
        self.acceleration = acceleration;
    }

    /// Overwrites acceleration; impulses do not stack.
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.acceleration = impulse;
    }

    pub fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
    }

    pub fn set_collider(&mut self, collider: Vec2) -> Result<(), LanderError> {
        check_collider(collider)?;
        self.collider = collider;
        Ok(())
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
    }

    pub fn set_movement(&mut self, movement: Vec2) {
        self.movement = movement;
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn move_up(&mut self) {
        self.movement.y = -1.0;
        self.direction = Direction::Up;
    }

    pub fn move_down(&mut self) {
        self.movement.y = 1.0;
        self.direction = Direction::Down;
    }

    pub fn move_left(&mut self) {
        self.movement.x = -1.0;
        self.direction = Direction::Left;
    }

    pub fn move_right(&mut self) {
        self.movement.x = 1.0;
        self.direction = Direction::Right;
    }

    pub fn normalise_movement(&mut self) {
        self.movement = self.movement.normalize_or_zero();
    }

    pub fn rotate_left(&mut self) {
        self.rotation = -self.tuning.rotation_speed;
    }

    pub fn rotate_right(&mut self) {
        self.rotation = self.tuning.rotation_speed;
    }

    pub fn boost(&mut self) {
        self.boost = BoostStatus::Boosting;
    }

    /// Clear per-frame control intent: rotation and thrust.
    pub fn reset_movement(&mut self) {
        self.rotation = 0.0;
        self.boost = BoostStatus::Neutral;
    }

    /// Record a collision result. Playing is never written back, so a
    /// resolved outcome can only be replaced by the other terminal state.
    fn resolve(&mut self, outcome: Outcome) {
        if !outcome.is_terminal() {
            return;
        }
        if self.outcome != outcome {
            log::debug!(
                "entity {:?} outcome {:?} -> {:?} at ({:.1}, {:.1})",
                self.id,
                self.outcome,
                outcome,
                self.position.x,
                self.position.y
            );
        }
        self.outcome = outcome;
    }

    /// Bounding-box overlap with another active entity. Never true for
    /// self or for inactive entities.
    pub fn is_colliding(&self, other: &Entity) -> bool {
        if !self.is_active() || !other.is_active() || other.id == self.id {
            return false;
        }
        overlaps(self.position, self.collider, other.position, other.collider)
    }

    fn check_entities(&mut self, others: &[Entity]) {
        for other in others {
            if self.is_colliding(other) {
                self.resolve(Outcome::Lost);
            }
        }
    }

    fn check_map_vertical(&mut self, map: Option<&TileMap>) {
        let Some(map) = map else {
            return;
        };
        let (top, bottom) = vertical_probes(self.position, self.collider);

        let tile = highest_tile(map, &top);
        if let Some(outcome) = tile_outcome(tile) {
            self.flags.top = true;
            if self.velocity.y < 0.0 {
                self.resolve(outcome);
            }
        }

        let tile = highest_tile(map, &bottom);
        if let Some(outcome) = tile_outcome(tile) {
            self.flags.bottom = true;
            if self.velocity.y > 0.0 {
                self.resolve(outcome);
            }
        }
    }

    fn check_map_horizontal(&mut self, map: Option<&TileMap>) {
        let Some(map) = map else {
            return;
        };
        let (left, right) = horizontal_probes(self.position, self.collider);
        let gate = match self.tuning.horizontal_gate {
            HorizontalGate::Horizontal => self.velocity.x,
            HorizontalGate::Vertical => self.velocity.y,
        };

        let tile = highest_tile(map, &left);
        if let Some(outcome) = tile_outcome(tile) {
            self.flags.left = true;
            if gate < 0.0 {
                self.resolve(outcome);
            }
        }

        let tile = highest_tile(map, &right);
        if let Some(outcome) = tile_outcome(tile) {
            self.flags.right = true;
            if gate > 0.0 {
                self.resolve(outcome);
            }
        }
    }

    /// Advance one fixed step: rotate, thrust, integrate, then move and
    /// probe one axis at a time (vertical first).
    pub fn update(&mut self, dt: f32, map: Option<&TileMap>, others: &[Entity]) {
        if !self.is_active() {
            return;
        }

        self.flags.reset();

        self.angle += self.rotation * dt;

        if self.boost == BoostStatus::Boosting && self.fuel > 0.0 {
            let radians = self.angle.to_radians();
            self.apply_impulse(Vec2::new(radians.sin(), -radians.cos()) * self.tuning.boost_speed);
            self.fuel = (self.fuel - dt).max(0.0);
        }

        self.velocity += self.acceleration * dt;
        self.velocity *= self.tuning.drag;

        self.position.y += self.velocity.y * dt;
        self.check_entities(others);
        self.check_map_vertical(map);

        self.position.x += self.velocity.x * dt;
        self.check_entities(others);
        self.check_map_horizontal(map);

        if self.movement != Vec2::ZERO && self.flags.bottom {
            if let Some(animation) = self.animation.as_mut() {
                animation.advance(dt, self.direction);
            }
        }
    }
}

//! The game state and its fixed-timestep clock.
//!
//! `Simulation` owns everything the old global state held: the tile map,
//! the player, the obstacles, the step accumulator and the run status. The
//! driver feeds it wall-clock frame deltas through `advance`, which runs as
//! many fixed steps as fit.

use glam::Vec2;

use crate::components::{EntityId, EntityKind, Outcome, Patrol, TextureId, Tick};
use crate::config::{GameConfig, PhysicsConfig};
use crate::entity::{Entity, check_collider};
use crate::error::LanderError;
use crate::events::{EventLog, SimEvent};
use crate::loading::LevelData;
use crate::tile_map::TileMap;

/// Texture handles for the entities built by `Simulation::from_config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureIds {
    pub player: TextureId,
    pub patrol: TextureId,
}

pub struct Simulation {
    map: TileMap,
    player: Entity,
    obstacles: Vec<Entity>,
    physics: PhysicsConfig,
    /// Unspent frame time, always below one step while playing.
    accumulator: f32,
    /// Simulated seconds; drives patrol motion.
    clock: f32,
    tick: Tick,
    terminated: bool,
    last_outcome: Outcome,
    pub events: EventLog,
}

impl Simulation {
    pub fn new(
        map: TileMap,
        player: Entity,
        obstacles: Vec<Entity>,
        physics: PhysicsConfig,
    ) -> Result<Self, LanderError> {
        let step = physics.fixed_timestep;
        if !step.is_finite() || step <= 0.0 {
            return Err(LanderError::InvalidTimestep(step));
        }
        for entity in std::iter::once(&player).chain(&obstacles) {
            check_collider(entity.collider())?;
        }

        let last_outcome = player.outcome();
        Ok(Self {
            map,
            player,
            obstacles,
            physics,
            accumulator: 0.0,
            clock: 0.0,
            tick: Tick(0),
            terminated: false,
            last_outcome,
            events: EventLog::default_capacity(),
        })
    }

    /// Build the standard scene on `level`: the lander offset from the
    /// level origin, one tile square, already under gravity; and a patrol
    /// twice that size bobbing at the origin's height.
    pub fn from_config(
        config: &GameConfig,
        level: LevelData,
        textures: TextureIds,
    ) -> Result<Self, LanderError> {
        let map = level.into_tile_map()?;
        let tile = map.tile_size();
        let origin = map.origin();
        let scene = &config.scene;

        let player_size = Vec2::splat(tile * scene.player_tiles);
        let mut player = Entity::new(
            EntityId(0),
            origin + Vec2::from(scene.player_offset),
            player_size,
            textures.player,
            EntityKind::Player,
        )?
        .with_tuning(config.physics.player);
        player.set_acceleration(Vec2::new(0.0, config.physics.gravity));

        let patrol = Patrol {
            anchor: Vec2::new(scene.patrol_x, origin.y),
            amplitude: scene.patrol_amplitude,
            frequency: scene.patrol_frequency,
        };
        let patrol_size = Vec2::splat(tile * scene.patrol_tiles);
        let ufo = Entity::new(
            EntityId(1),
            patrol.anchor,
            patrol_size,
            textures.patrol,
            EntityKind::Patrol(patrol),
        )?;

        log::info!(
            "scene: {}x{} level, player at ({:.0}, {:.0}), patrol at ({:.0}, {:.0})",
            map.columns(),
            map.rows(),
            player.position().x,
            player.position().y,
            patrol.anchor.x,
            patrol.anchor.y
        );

        Self::new(map, player, vec![ufo], config.physics)
    }

    pub fn map(&self) -> &TileMap {
        &self.map
    }

    pub fn player(&self) -> &Entity {
        &self.player
    }

    /// The driver writes control intent through this between frames.
    pub fn player_mut(&mut self) -> &mut Entity {
        &mut self.player
    }

    pub fn obstacles(&self) -> &[Entity] {
        &self.obstacles
    }

    /// Player first, then obstacles.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        std::iter::once(&self.player).chain(self.obstacles.iter())
    }

    pub fn physics(&self) -> &PhysicsConfig {
        &self.physics
    }

    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn outcome(&self) -> Outcome {
        self.player.outcome()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Stop the run, e.g. on a quit key or window close.
    pub fn terminate(&mut self) {
        if !self.terminated {
            log::info!("simulation terminated at tick {}", self.tick.0);
        }
        self.terminated = true;
    }

    /// Bank `frame_dt` seconds and run every whole fixed step it covers.
    /// Returns the number of steps run. Once the player's outcome is
    /// resolved, or the run is terminated, nothing advances and the
    /// accumulator is left alone.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        if self.player.is_game_over() || self.terminated {
            return 0;
        }
        if frame_dt.is_finite() && frame_dt > 0.0 {
            self.accumulator += frame_dt;
        }

        let step = self.physics.fixed_timestep;
        let mut steps = 0u32;
        while self.accumulator >= step {
            self.step();
            self.accumulator -= step;
            steps += 1;
            if self.player.is_game_over() || self.terminated {
                break;
            }
        }
        steps
    }

    /// One fixed step: update the player against the map and obstacles,
    /// advance the clock, move patrols, then check the end-of-world line.
    pub fn step(&mut self) {
        let dt = self.physics.fixed_timestep;
        let had_fuel = self.player.fuel() > 0.0;

        self.player.update(dt, Some(&self.map), &self.obstacles);
        self.clock += dt;

        for obstacle in &mut self.obstacles {
            if let EntityKind::Patrol(patrol) = obstacle.kind() {
                obstacle.set_position(patrol.position_at(self.clock));
            }
        }

        let id = self.player.id();
        let outcome = self.player.outcome();
        if outcome != self.last_outcome {
            match outcome {
                Outcome::Won => log::info!("Mission Accomplished (tick {})", self.tick.0),
                Outcome::Lost => log::info!("Mission Failed (tick {})", self.tick.0),
                Outcome::Playing => {}
            }
            self.events.push(SimEvent::OutcomeResolved {
                entity: id,
                outcome,
                tick: self.tick,
            });
        }

        if had_fuel && self.player.fuel() <= 0.0 {
            log::debug!("fuel depleted at tick {}", self.tick.0);
            self.events.push(SimEvent::FuelDepleted {
                entity: id,
                tick: self.tick,
            });
        }

        if self.player.position().y > self.physics.end_game_threshold {
            self.events.push(SimEvent::LeftWorld {
                entity: id,
                tick: self.tick,
            });
            self.terminate();
        }

        log::trace!(
            "tick {}: pos ({:.2}, {:.2}) vel ({:.2}, {:.2})",
            self.tick.0,
            self.player.position().x,
            self.player.position().y,
            self.player.velocity().x,
            self.player.velocity().y
        );

        #[cfg(debug_assertions)]
        validate_simulation(self);

        self.last_outcome = outcome;
        self.tick = Tick(self.tick.0 + 1);
    }
}

/// Debug-build consistency checks, run after every step.
#[cfg(debug_assertions)]
pub fn validate_simulation(sim: &Simulation) {
    for entity in sim.entities() {
        let c = entity.collider();
        assert!(
            c.x > 0.0 && c.y > 0.0,
            "entity {:?} has non-positive collider {:?}",
            entity.id(),
            c
        );
    }

    assert!(
        !(sim.last_outcome.is_terminal() && !sim.player.outcome().is_terminal()),
        "player outcome regressed from {:?} to Playing",
        sim.last_outcome
    );

    assert!(
        sim.accumulator.is_finite() && sim.accumulator >= 0.0,
        "accumulator out of range: {}",
        sim.accumulator
    );

    let ids: Vec<EntityId> = sim.entities().map(|e| e.id()).collect();
    for (i, id) in ids.iter().enumerate() {
        assert!(
            !ids[i + 1..].contains(id),
            "duplicate entity id {:?}",
            id
        );
    }
}

use glam::Vec2;

use crate::animation::sprite_rect;
use crate::components::{Outcome, Rect, TextureId};
use crate::entity::Entity;
use crate::events::SimEvent;
use crate::simulation::Simulation;

/// Linear RGBA.
pub type Color = [f32; 4];

pub const WHITE: Color = [1.0, 1.0, 1.0, 1.0];
pub const BLACK: Color = [0.0, 0.0, 0.0, 1.0];
pub const GREEN: Color = [0.0, 0.89, 0.19, 1.0];
pub const RED: Color = [0.9, 0.16, 0.22, 1.0];

/// HUD placement, in view pixels. Text sizes are line heights.
const FUEL_TEXT_POS: Vec2 = Vec2::new(100.0, 80.0);
const FUEL_TEXT_SIZE: f32 = 20.0;
const OUTCOME_TEXT_X: f32 = 100.0;
/// Outcome line sits this far above the level origin.
const OUTCOME_TEXT_RISE: f32 = 50.0;
const OUTCOME_TEXT_SIZE: f32 = 50.0;
const COLLIDER_LINE: f32 = 1.0;

/// Full texture, in normalised coordinates.
const FULL_UV: Rect = Rect::new(0.0, 0.0, 1.0, 1.0);

/// One textured quad.
///
/// `dst` is the unrotated rectangle in view pixels. The quad is rotated by
/// `rotation_deg` (clockwise on screen) about `dst`'s top-left plus
/// `origin`. `src` is in normalised texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteCommand {
    pub texture: TextureId,
    pub src: Rect,
    pub dst: Rect,
    pub origin: Vec2,
    pub rotation_deg: f32,
    pub tint: Color,
}

impl SpriteCommand {
    /// Untextured axis-aligned quad, drawn with the solid white texture.
    pub fn solid(texture: TextureId, dst: Rect, tint: Color) -> Self {
        Self {
            texture,
            src: FULL_UV,
            dst,
            origin: Vec2::ZERO,
            rotation_deg: 0.0,
            tint,
        }
    }

    /// Corners after rotation, clockwise from the top left.
    pub fn corners(&self) -> [Vec2; 4] {
        quad_corners(self.dst, self.origin, self.rotation_deg)
    }
}

/// Corners of `dst` rotated by `rotation_deg` about `dst`'s top-left plus
/// `origin`, in order top-left, top-right, bottom-right, bottom-left of the
/// unrotated rectangle.
pub fn quad_corners(dst: Rect, origin: Vec2, rotation_deg: f32) -> [Vec2; 4] {
    let pivot = Vec2::new(dst.x, dst.y) + origin;
    let (sin, cos) = rotation_deg.to_radians().sin_cos();
    let rotate = |p: Vec2| {
        let d = p - pivot;
        pivot + Vec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos)
    };

    [
        rotate(Vec2::new(dst.x, dst.y)),
        rotate(Vec2::new(dst.x + dst.w, dst.y)),
        rotate(Vec2::new(dst.x + dst.w, dst.y + dst.h)),
        rotate(Vec2::new(dst.x, dst.y + dst.h)),
    ]
}

/// One line of text. `position` is the top-left of the line box and
/// `size` its height, both in view pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCommand {
    pub text: String,
    pub position: Vec2,
    pub size: f32,
    pub color: Color,
}

/// Everything to draw this frame. Sprites are drawn in order, then text
/// on top.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawList {
    pub clear: Color,
    pub commands: Vec<SpriteCommand>,
    pub texts: Vec<TextCommand>,
}

impl DrawList {
    pub fn new(clear: Color) -> Self {
        Self {
            clear,
            commands: Vec::new(),
            texts: Vec::new(),
        }
    }

    pub fn push(&mut self, command: SpriteCommand) {
        self.commands.push(command);
    }

    pub fn push_text(&mut self, text: impl Into<String>, position: Vec2, size: f32, color: Color) {
        self.texts.push(TextCommand {
            text: text.into(),
            position,
            size,
            color,
        });
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Four thin quads tracing `rect`.
    fn outline(&mut self, texture: TextureId, rect: Rect, width: f32, tint: Color) {
        let Rect { x, y, w, h } = rect;
        self.push(SpriteCommand::solid(texture, Rect::new(x, y, w, width), tint));
        self.push(SpriteCommand::solid(
            texture,
            Rect::new(x, y + h - width, w, width),
            tint,
        ));
        self.push(SpriteCommand::solid(texture, Rect::new(x, y, width, h), tint));
        self.push(SpriteCommand::solid(
            texture,
            Rect::new(x + w - width, y, width, h),
            tint,
        ));
    }
}

/// Texture handles and layout the scene builder needs.
#[derive(Debug, Clone, Copy)]
pub struct SceneStyle {
    pub tile_sheet: TextureId,
    pub tile_sheet_columns: u32,
    pub tile_sheet_rows: u32,
    /// 1x1 white texture for debug quads.
    pub solid: TextureId,
    pub show_colliders: bool,
}

/// Normalised sub-rectangle of a `columns`x`rows` sheet. Indices past the
/// end of the sheet wrap.
fn sheet_uv(index: usize, columns: u32, rows: u32) -> Rect {
    let cells = (columns.max(1) * rows.max(1)) as usize;
    sprite_rect(1, 1, index % cells, columns, rows)
}

fn entity_sprite(entity: &Entity) -> SpriteCommand {
    let src = match entity.animation() {
        Some(anim) => sheet_uv(
            anim.current_frame(entity.direction()),
            anim.columns(),
            anim.rows(),
        ),
        None => FULL_UV,
    };
    let scale = entity.scale();

    SpriteCommand {
        texture: entity.texture(),
        src,
        dst: Rect::centered(entity.position(), scale),
        origin: scale / 2.0,
        rotation_deg: entity.angle(),
        tint: WHITE,
    }
}

/// Build the frame's draw list from simulation state.
///
/// Order: map tiles, active entities, collider outlines (when enabled).
/// The HUD is text: the fuel readout always, the outcome line once the run
/// is resolved. Empty cells and inactive entities produce nothing.
///
/// This function is READ-ONLY and does not modify simulation state.
pub fn build_scene(sim: &Simulation, style: &SceneStyle) -> DrawList {
    let mut list = DrawList::new(BLACK);
    let map = sim.map();

    for (col, row, tile) in map.iter_solid() {
        list.push(SpriteCommand {
            texture: style.tile_sheet,
            src: sheet_uv(
                (tile - 1) as usize,
                style.tile_sheet_columns,
                style.tile_sheet_rows,
            ),
            dst: map.cell_rect(col, row),
            origin: Vec2::ZERO,
            rotation_deg: 0.0,
            tint: WHITE,
        });
    }

    for entity in sim.entities().filter(|e| e.is_active()) {
        list.push(entity_sprite(entity));
    }

    if style.show_colliders {
        for entity in sim.entities().filter(|e| e.is_active()) {
            let rect = Rect::centered(entity.position(), entity.collider());
            list.outline(style.solid, rect, COLLIDER_LINE, GREEN);
        }
    }

    list.push_text(
        format!("Fuel: {:.2}", sim.player().fuel()),
        FUEL_TEXT_POS,
        FUEL_TEXT_SIZE,
        RED,
    );

    if let Some(message) = outcome_message(sim.outcome()) {
        let color = if sim.outcome() == Outcome::Won { GREEN } else { RED };
        list.push_text(
            message,
            Vec2::new(OUTCOME_TEXT_X, map.origin().y - OUTCOME_TEXT_RISE),
            OUTCOME_TEXT_SIZE,
            color,
        );
    }

    list
}

/// Outcome line shown to the player, if the run is over.
pub fn outcome_message(outcome: Outcome) -> Option<&'static str> {
    match outcome {
        Outcome::Won => Some("Mission Accomplished"),
        Outcome::Lost => Some("Mission Failed"),
        Outcome::Playing => None,
    }
}

/// Status line for the window title.
///
/// Format: "{title} | Fuel: F.FF" with " | Mission ..." appended once the
/// outcome is resolved.
pub fn render_status(sim: &Simulation, title: &str) -> String {
    let mut status = format!("{} | Fuel: {:.2}", title, sim.player().fuel());
    if let Some(message) = outcome_message(sim.outcome()) {
        status.push_str(" | ");
        status.push_str(message);
    }
    status
}

/// One log line per simulation event.
pub fn describe_event(event: &SimEvent) -> String {
    match event {
        SimEvent::OutcomeResolved {
            entity,
            outcome,
            tick,
        } => {
            let what = outcome_message(*outcome).unwrap_or("Playing");
            format!("[{}] E{}: {}", tick.0, entity.0, what)
        }
        SimEvent::FuelDepleted { entity, tick } => {
            format!("[{}] E{} ran out of fuel", tick.0, entity.0)
        }
        SimEvent::LeftWorld { entity, tick } => {
            format!("[{}] E{} left the world", tick.0, entity.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{EntityId, EntityKind, Tick};
    use crate::config::PhysicsConfig;
    use crate::tile_map::TileMap;

    const TILES: TextureId = TextureId(0);
    const SOLID: TextureId = TextureId(9);

    fn style() -> SceneStyle {
        SceneStyle {
            tile_sheet: TILES,
            tile_sheet_columns: 4,
            tile_sheet_rows: 1,
            solid: SOLID,
            show_colliders: false,
        }
    }

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    /// 3x1 map of 10-unit tiles centred on (15, 5): x in [0, 30].
    fn sim_with(obstacles: Vec<Entity>) -> Simulation {
        let map = TileMap::new(3, 1, 10.0, Vec2::new(15.0, 5.0), vec![1, 0, 4]).expect("valid map");
        let player = Entity::new(
            EntityId(0),
            Vec2::new(50.0, 50.0),
            Vec2::new(8.0, 4.0),
            TextureId(1),
            EntityKind::Player,
        )
        .expect("positive size");
        Simulation::new(map, player, obstacles, PhysicsConfig::default()).expect("valid simulation")
    }

    #[test]
    fn unrotated_corners_match_rect() {
        let dst = Rect::new(10.0, 20.0, 4.0, 2.0);
        let c = quad_corners(dst, Vec2::new(2.0, 1.0), 0.0);
        assert_eq!(
            c,
            [
                Vec2::new(10.0, 20.0),
                Vec2::new(14.0, 20.0),
                Vec2::new(14.0, 22.0),
                Vec2::new(10.0, 22.0)
            ]
        );
    }

    #[test]
    fn quarter_turn_is_clockwise_about_centre() {
        // 4x2 box centred on (2, 1), turned 90 degrees.
        let dst = Rect::new(0.0, 0.0, 4.0, 2.0);
        let c = quad_corners(dst, Vec2::new(2.0, 1.0), 90.0);
        assert!(close(c[0], Vec2::new(3.0, -1.0)));
        assert!(close(c[1], Vec2::new(3.0, 3.0)));
        assert!(close(c[2], Vec2::new(1.0, 3.0)));
        assert!(close(c[3], Vec2::new(1.0, -1.0)));
    }

    #[test]
    fn rotation_about_top_left_keeps_it_fixed() {
        let dst = Rect::new(5.0, 5.0, 2.0, 2.0);
        let c = quad_corners(dst, Vec2::ZERO, 37.0);
        assert!(close(c[0], Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn tiles_use_atlas_index_minus_one() {
        let list = build_scene(&sim_with(Vec::new()), &style());
        let tiles: Vec<_> = list.commands.iter().filter(|c| c.texture == TILES).collect();
        assert_eq!(tiles.len(), 2, "empty cell must not draw");

        assert_eq!(tiles[0].dst, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(tiles[0].src, Rect::new(0.0, 0.0, 0.25, 1.0));
        assert_eq!(tiles[1].dst, Rect::new(20.0, 0.0, 10.0, 10.0));
        assert_eq!(tiles[1].src, Rect::new(0.75, 0.0, 0.25, 1.0));
    }

    #[test]
    fn entities_are_centred_and_rotated() {
        let mut sim = sim_with(Vec::new());
        sim.player_mut().set_angle(45.0);
        let list = build_scene(&sim, &style());
        let sprite = list
            .commands
            .iter()
            .find(|c| c.texture == TextureId(1))
            .expect("player drawn");

        assert_eq!(sprite.dst, Rect::new(46.0, 48.0, 8.0, 4.0));
        assert_eq!(sprite.origin, Vec2::new(4.0, 2.0));
        assert_eq!(sprite.rotation_deg, 45.0);
        assert_eq!(sprite.src, FULL_UV);
    }

    #[test]
    fn inactive_entities_skipped() {
        let mut ghost = Entity::new(
            EntityId(1),
            Vec2::new(80.0, 80.0),
            Vec2::splat(4.0),
            TextureId(2),
            EntityKind::Block,
        )
        .expect("positive size");
        ghost.deactivate();
        let list = build_scene(&sim_with(vec![ghost]), &style());
        assert!(list.commands.iter().all(|c| c.texture != TextureId(2)));
    }

    #[test]
    fn collider_outlines_only_when_enabled() {
        let sim = sim_with(Vec::new());
        let plain = build_scene(&sim, &style());
        let debug = build_scene(
            &sim,
            &SceneStyle {
                show_colliders: true,
                ..style()
            },
        );
        assert_eq!(debug.len(), plain.len() + 4);
        assert!(
            debug
                .commands
                .iter()
                .any(|c| c.texture == SOLID && c.tint == GREEN)
        );
    }

    #[test]
    fn fuel_readout_drawn_every_frame() {
        let mut sim = sim_with(Vec::new());
        let list = build_scene(&sim, &style());
        assert_eq!(list.texts.len(), 1, "no outcome line while playing");
        assert_eq!(
            list.texts[0],
            TextCommand {
                text: "Fuel: 20.00".to_string(),
                position: Vec2::new(100.0, 80.0),
                size: 20.0,
                color: RED,
            }
        );

        sim.player_mut().boost();
        sim.step();
        let list = build_scene(&sim, &style());
        assert_ne!(list.texts[0].text, "Fuel: 20.00");
        assert!(list.texts[0].text.starts_with("Fuel: 19.9"));
    }

    #[test]
    fn outcome_line_after_loss() {
        let ufo = Entity::new(
            EntityId(1),
            Vec2::new(50.0, 50.0),
            Vec2::splat(10.0),
            TextureId(2),
            EntityKind::Block,
        )
        .expect("positive size");
        let mut sim = sim_with(vec![ufo]);
        sim.step();
        assert_eq!(sim.outcome(), Outcome::Lost);

        let list = build_scene(&sim, &style());
        let line = list
            .texts
            .iter()
            .find(|t| t.text == "Mission Failed")
            .expect("outcome drawn");
        // Map origin is (15, 5).
        assert_eq!(line.position, Vec2::new(100.0, -45.0));
        assert_eq!(line.size, 50.0);
        assert_eq!(line.color, RED);
    }

    #[test]
    fn outcome_line_after_win_is_green() {
        // Player box straddles the win tile in the middle cell.
        let map = TileMap::new(3, 1, 10.0, Vec2::new(15.0, 5.0), vec![0, 2, 0]).expect("valid map");
        let mut player = Entity::new(
            EntityId(0),
            Vec2::new(15.0, -2.0),
            Vec2::splat(4.0),
            TextureId(1),
            EntityKind::Player,
        )
        .expect("positive size");
        player.set_velocity(Vec2::new(0.0, 60.0));
        let mut sim =
            Simulation::new(map, player, Vec::new(), PhysicsConfig::default()).expect("valid");
        sim.step();
        assert_eq!(sim.outcome(), Outcome::Won);

        let list = build_scene(&sim, &style());
        let line = list.texts.last().expect("outcome drawn");
        assert_eq!(line.text, "Mission Accomplished");
        assert_eq!(line.color, GREEN);
    }

    #[test]
    fn status_line_formats_fuel_and_outcome() {
        let sim = sim_with(Vec::new());
        assert_eq!(render_status(&sim, "Lander"), "Lander | Fuel: 20.00");
    }

    #[test]
    fn describe_event_formats() {
        let line = describe_event(&SimEvent::OutcomeResolved {
            entity: EntityId(0),
            outcome: Outcome::Won,
            tick: Tick(42),
        });
        assert_eq!(line, "[42] E0: Mission Accomplished");
    }
}

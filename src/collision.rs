//! Probe-point and bounding-box tests shared by entity updates.
//!
//! Map contact is detected by sampling the tile grid at three points along
//! each collider edge (both corners and the midpoint). The highest tile ID
//! among a triple decides the contact; entity contact is a plain AABB test.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::components::{EMPTY_TILE, Outcome, TileId, WIN_TILE};
use crate::tile_map::TileMap;

/// Which velocity component gates the horizontal map check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HorizontalGate {
    /// Left side fires when moving left, right side when moving right.
    #[default]
    Horizontal,
    /// Both sides gated on vertical velocity: left on rising, right on
    /// falling. Kept for replaying levels tuned against that rule.
    Vertical,
}

/// Three probe points along one collider edge.
pub type ProbeTriple = [Vec2; 3];

/// (top, bottom) probe triples: centre, left corner, right corner.
pub fn vertical_probes(position: Vec2, collider: Vec2) -> (ProbeTriple, ProbeTriple) {
    let half = collider / 2.0;
    let top = position.y - half.y;
    let bottom = position.y + half.y;
    let left = position.x - half.x;
    let right = position.x + half.x;

    (
        [
            Vec2::new(position.x, top),
            Vec2::new(left, top),
            Vec2::new(right, top),
        ],
        [
            Vec2::new(position.x, bottom),
            Vec2::new(left, bottom),
            Vec2::new(right, bottom),
        ],
    )
}

/// (left, right) probe triples: centre, top corner, bottom corner.
pub fn horizontal_probes(position: Vec2, collider: Vec2) -> (ProbeTriple, ProbeTriple) {
    let half = collider / 2.0;
    let top = position.y - half.y;
    let bottom = position.y + half.y;
    let left = position.x - half.x;
    let right = position.x + half.x;

    (
        [
            Vec2::new(left, position.y),
            Vec2::new(left, top),
            Vec2::new(left, bottom),
        ],
        [
            Vec2::new(right, position.y),
            Vec2::new(right, top),
            Vec2::new(right, bottom),
        ],
    )
}

/// Highest tile ID under any probe of the triple.
pub fn highest_tile(map: &TileMap, probes: &ProbeTriple) -> TileId {
    probes
        .iter()
        .map(|&p| map.tile_at(p))
        .max()
        .unwrap_or(EMPTY_TILE)
}

/// Outcome of touching `tile` while moving into it. Empty tiles resolve
/// nothing; the win tile wins; every other tile is lethal.
pub fn tile_outcome(tile: TileId) -> Option<Outcome> {
    match tile {
        EMPTY_TILE => None,
        WIN_TILE => Some(Outcome::Won),
        _ => Some(Outcome::Lost),
    }
}

/// Strict overlap of two centred boxes on both axes. Touching edges do not
/// count.
pub fn overlaps(a_pos: Vec2, a_size: Vec2, b_pos: Vec2, b_size: Vec2) -> bool {
    let gap_x = (a_pos.x - b_pos.x).abs() - (a_size.x + b_size.x) / 2.0;
    let gap_y = (a_pos.y - b_pos.y).abs() - (a_size.y + b_size.y) / 2.0;
    gap_x < 0.0 && gap_y < 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_probe_layout() {
        let (top, bottom) = vertical_probes(Vec2::new(10.0, 20.0), Vec2::new(4.0, 8.0));
        assert_eq!(
            top,
            [
                Vec2::new(10.0, 16.0),
                Vec2::new(8.0, 16.0),
                Vec2::new(12.0, 16.0)
            ]
        );
        assert_eq!(
            bottom,
            [
                Vec2::new(10.0, 24.0),
                Vec2::new(8.0, 24.0),
                Vec2::new(12.0, 24.0)
            ]
        );
    }

    #[test]
    fn horizontal_probe_layout() {
        let (left, right) = horizontal_probes(Vec2::new(10.0, 20.0), Vec2::new(4.0, 8.0));
        assert_eq!(
            left,
            [
                Vec2::new(8.0, 20.0),
                Vec2::new(8.0, 16.0),
                Vec2::new(8.0, 24.0)
            ]
        );
        assert_eq!(
            right,
            [
                Vec2::new(12.0, 20.0),
                Vec2::new(12.0, 16.0),
                Vec2::new(12.0, 24.0)
            ]
        );
    }

    #[test]
    fn highest_tile_takes_max() {
        // 3x1 map of 10-unit tiles, x in [-15, 15].
        let map = TileMap::new(3, 1, 10.0, Vec2::ZERO, vec![1, 0, 2]).expect("valid map");
        let probes = [
            Vec2::new(0.0, 0.0),
            Vec2::new(-12.0, 0.0),
            Vec2::new(12.0, 0.0),
        ];
        assert_eq!(highest_tile(&map, &probes), 2);

        let empty = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(99.0, 0.0)];
        assert_eq!(highest_tile(&map, &empty), 0);
    }

    #[test]
    fn tile_outcome_rules() {
        assert_eq!(tile_outcome(0), None);
        assert_eq!(tile_outcome(2), Some(Outcome::Won));
        assert_eq!(tile_outcome(1), Some(Outcome::Lost));
        assert_eq!(tile_outcome(3), Some(Outcome::Lost));
        assert_eq!(tile_outcome(4), Some(Outcome::Lost));
    }

    #[test]
    fn overlap_requires_both_axes() {
        let size = Vec2::splat(10.0);
        assert!(overlaps(Vec2::ZERO, size, Vec2::new(9.0, 9.0), size));
        assert!(!overlaps(Vec2::ZERO, size, Vec2::new(9.0, 11.0), size));
        assert!(!overlaps(Vec2::ZERO, size, Vec2::new(11.0, 0.0), size));
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let size = Vec2::splat(10.0);
        assert!(!overlaps(Vec2::ZERO, size, Vec2::new(10.0, 0.0), size));
        assert!(!overlaps(Vec2::ZERO, size, Vec2::new(0.0, -10.0), size));
    }

    #[test]
    fn overlap_uses_both_sizes() {
        assert!(overlaps(
            Vec2::ZERO,
            Vec2::splat(40.0),
            Vec2::new(55.0, 0.0),
            Vec2::splat(80.0)
        ));
        assert!(!overlaps(
            Vec2::ZERO,
            Vec2::splat(40.0),
            Vec2::new(61.0, 0.0),
            Vec2::splat(80.0)
        ));
    }
}

use glam::Vec2;

use crate::components::{EMPTY_TILE, Rect, TileId};
use crate::error::LanderError;

/// World-space extent of the map. Derived once at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Bounds {
    /// Inclusive on all four edges.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }
}

/// Read-only grid of tile IDs centred on a world origin.
#[derive(Debug)]
pub struct TileMap {
    columns: usize,
    rows: usize,
    tile_size: f32,
    origin: Vec2,
    tiles: Vec<TileId>,
    bounds: Bounds,
}

impl TileMap {
    pub fn new(
        columns: usize,
        rows: usize,
        tile_size: f32,
        origin: Vec2,
        tiles: Vec<TileId>,
    ) -> Result<Self, LanderError> {
        let expected = columns * rows;
        if tiles.len() != expected {
            return Err(LanderError::LevelSize {
                columns,
                rows,
                expected,
                actual: tiles.len(),
            });
        }
        if !tile_size.is_finite() || tile_size <= 0.0 {
            return Err(LanderError::InvalidTileSize(tile_size));
        }

        let half_w = columns as f32 * tile_size / 2.0;
        let half_h = rows as f32 * tile_size / 2.0;
        let bounds = Bounds {
            left: origin.x - half_w,
            right: origin.x + half_w,
            top: origin.y - half_h,
            bottom: origin.y + half_h,
        };

        Ok(Self {
            columns,
            rows,
            tile_size,
            origin,
            tiles,
            bounds,
        })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn index(&self, col: usize, row: usize) -> Option<usize> {
        if col < self.columns && row < self.rows {
            Some(row * self.columns + col)
        } else {
            None
        }
    }

    pub fn get(&self, col: usize, row: usize) -> Option<TileId> {
        self.index(col, row).map(|i| self.tiles[i])
    }

    /// Cell containing a world position, or None outside the grid.
    ///
    /// A point exactly on the right or bottom edge is inside the bounds but
    /// maps to a column/row one past the end, so it also yields None.
    pub fn cell_at(&self, position: Vec2) -> Option<(usize, usize)> {
        if !position.is_finite() || !self.bounds.contains(position) {
            return None;
        }

        let col = ((position.x - self.bounds.left) / self.tile_size).floor();
        let row = ((position.y - self.bounds.top) / self.tile_size).floor();
        if col < 0.0 || row < 0.0 {
            return None;
        }

        let (col, row) = (col as usize, row as usize);
        self.index(col, row).map(|_| (col, row))
    }

    /// Tile ID at a world position; EMPTY_TILE anywhere off the grid.
    pub fn tile_at(&self, position: Vec2) -> TileId {
        self.cell_at(position)
            .and_then(|(col, row)| self.get(col, row))
            .unwrap_or(EMPTY_TILE)
    }

    /// World-space rectangle covered by a cell.
    pub fn cell_rect(&self, col: usize, row: usize) -> Rect {
        Rect::new(
            self.bounds.left + col as f32 * self.tile_size,
            self.bounds.top + row as f32 * self.tile_size,
            self.tile_size,
            self.tile_size,
        )
    }

    /// Every non-empty cell as (col, row, tile), row-major.
    pub fn iter_solid(&self) -> impl Iterator<Item = (usize, usize, TileId)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter(|&(_, &t)| t != EMPTY_TILE)
            .map(|(i, &t)| (i % self.columns, i / self.columns, t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4x3 map, 10-unit tiles, centred on (0,0): x in [-20,20], y in [-15,15].
    fn small_map() -> TileMap {
        #[rustfmt::skip]
        let tiles = vec![
            1, 0, 0, 3,
            0, 2, 0, 0,
            4, 4, 0, 1,
        ];
        TileMap::new(4, 3, 10.0, Vec2::ZERO, tiles).expect("valid map")
    }

    #[test]
    fn boundaries_centre_on_origin() {
        let map = TileMap::new(30, 15, 40.0, Vec2::new(500.0, 300.0), vec![0; 450])
            .expect("valid map");
        let b = map.bounds();
        assert_eq!(b.left, -100.0);
        assert_eq!(b.right, 1100.0);
        assert_eq!(b.top, 0.0);
        assert_eq!(b.bottom, 600.0);
    }

    #[test]
    fn size_mismatch_rejected() {
        let err = TileMap::new(4, 3, 10.0, Vec2::ZERO, vec![0; 11]);
        assert!(matches!(
            err,
            Err(LanderError::LevelSize {
                expected: 12,
                actual: 11,
                ..
            })
        ));
    }

    #[test]
    fn bad_tile_size_rejected() {
        assert!(TileMap::new(1, 1, 0.0, Vec2::ZERO, vec![0]).is_err());
        assert!(TileMap::new(1, 1, -5.0, Vec2::ZERO, vec![0]).is_err());
        assert!(TileMap::new(1, 1, f32::NAN, Vec2::ZERO, vec![0]).is_err());
    }

    #[test]
    fn tile_at_reads_stored_values() {
        let map = small_map();
        assert_eq!(map.tile_at(Vec2::new(-15.0, -10.0)), 1);
        assert_eq!(map.tile_at(Vec2::new(15.0, -10.0)), 3);
        assert_eq!(map.tile_at(Vec2::new(-5.0, 0.0)), 2);
        assert_eq!(map.tile_at(Vec2::new(5.0, 0.0)), 0);
        assert_eq!(map.tile_at(Vec2::new(-15.0, 10.0)), 4);
        assert_eq!(map.tile_at(Vec2::new(19.9, 14.9)), 1);
    }

    #[test]
    fn outside_bounds_is_empty() {
        let map = small_map();
        assert_eq!(map.tile_at(Vec2::new(-20.01, -10.0)), 0);
        assert_eq!(map.tile_at(Vec2::new(20.01, -10.0)), 0);
        assert_eq!(map.tile_at(Vec2::new(0.0, -15.01)), 0);
        assert_eq!(map.tile_at(Vec2::new(0.0, 15.01)), 0);
        assert_eq!(map.tile_at(Vec2::new(1e9, -1e9)), 0);
    }

    #[test]
    fn far_edges_do_not_index_past_grid() {
        let map = small_map();
        // Inside the inclusive bounds but one cell past the last column/row.
        assert_eq!(map.cell_at(Vec2::new(20.0, 0.0)), None);
        assert_eq!(map.cell_at(Vec2::new(0.0, 15.0)), None);
        assert_eq!(map.tile_at(Vec2::new(20.0, 15.0)), 0);
        // Near edges are inclusive and land in cell 0.
        assert_eq!(map.cell_at(Vec2::new(-20.0, -15.0)), Some((0, 0)));
    }

    #[test]
    fn non_finite_positions_are_empty() {
        let map = small_map();
        assert_eq!(map.tile_at(Vec2::new(f32::NAN, 0.0)), 0);
        assert_eq!(map.tile_at(Vec2::new(0.0, f32::INFINITY)), 0);
    }

    #[test]
    fn cell_indices_stay_in_range() {
        let map = small_map();
        let mut y = -16.0;
        while y <= 16.0 {
            let mut x = -21.0;
            while x <= 21.0 {
                if let Some((c, r)) = map.cell_at(Vec2::new(x, y)) {
                    assert!(c < map.columns());
                    assert!(r < map.rows());
                    assert_eq!(map.tile_at(Vec2::new(x, y)), map.get(c, r).unwrap_or(0));
                }
                x += 0.37;
            }
            y += 0.41;
        }
    }

    #[test]
    fn iter_solid_skips_empty() {
        let map = small_map();
        let solid: Vec<_> = map.iter_solid().collect();
        assert_eq!(
            solid,
            vec![(0, 0, 1), (3, 0, 3), (1, 1, 2), (0, 2, 4), (1, 2, 4), (3, 2, 1)]
        );
    }

    #[test]
    fn cell_rect_matches_bounds() {
        let map = small_map();
        assert_eq!(map.cell_rect(0, 0), Rect::new(-20.0, -15.0, 10.0, 10.0));
        assert_eq!(map.cell_rect(3, 2), Rect::new(10.0, 5.0, 10.0, 10.0));
    }

    #[test]
    fn zero_size_map() {
        let map = TileMap::new(0, 0, 10.0, Vec2::ZERO, Vec::new()).expect("empty map");
        assert_eq!(map.get(0, 0), None);
        assert_eq!(map.tile_at(Vec2::ZERO), 0);
    }
}

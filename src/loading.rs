use glam::Vec2;

use crate::components::TileId;
use crate::config::GameConfig;
use crate::error::LanderError;
use crate::tile_map::TileMap;

pub const DEFAULT_TILE_SIZE: f32 = 40.0;
pub const DEFAULT_ORIGIN: Vec2 = Vec2::new(500.0, 300.0);

const DEFAULT_COLUMNS: usize = 30;
const DEFAULT_ROWS: usize = 15;

#[rustfmt::skip]
const DEFAULT_TILES: [TileId; DEFAULT_COLUMNS * DEFAULT_ROWS] = [
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 4, 3, 3, 3, 3, 1, 1, 3, 3, 3, 3, 3, 3, 3, 3, 1, 1,
    1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 4, 3, 3, 0, 4, 0, 0, 3, 3, 3, 3, 3, 0, 0, 3, 1, 1,
    1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 4, 0, 3, 0, 4, 0, 0, 3, 3, 3, 3, 3, 0, 0, 0, 1, 1,
    1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 4, 0, 3, 0, 4, 0, 0, 3, 3, 3, 3, 3, 0, 0, 0, 1, 1,
    1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3, 3, 3, 0, 0, 0, 0, 1, 1,
    1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3, 0, 0, 0, 0, 0, 1, 1,
    1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3, 0, 0, 0, 0, 2, 1, 1,
    1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0, 3, 3, 1, 1,
    1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 4, 0, 3, 3, 4, 0, 0, 0, 0, 0, 0, 0, 3, 3, 3, 1, 1,
    1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 4, 0, 3, 3, 4, 0, 0, 0, 0, 4, 4, 4, 3, 3, 3, 1, 1,
    1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 4, 3, 3, 3, 4, 0, 0, 0, 0, 4, 4, 4, 3, 3, 3, 1, 1,
    1, 1, 0, 4, 0, 0, 4, 4, 0, 4, 0, 0, 0, 4, 3, 3, 3, 3, 3, 3, 0, 0, 4, 4, 4, 3, 3, 3, 1, 1,
    1, 1, 0, 4, 4, 0, 4, 4, 0, 4, 4, 0, 0, 4, 3, 3, 3, 3, 3, 3, 0, 0, 0, 0, 3, 3, 3, 3, 1, 1,
    1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3, 3, 3, 3, 3, 3, 3, 3, 2, 2, 0, 3, 3, 3, 3, 3, 1, 1,
];

/// Raw level description, before validation into a `TileMap`.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelData {
    pub columns: usize,
    pub rows: usize,
    pub tile_size: f32,
    pub origin: Vec2,
    pub tiles: Vec<TileId>,
}

impl LevelData {
    /// The built-in 30x15 cavern, centred on a 1000x600 view.
    pub fn default_level() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
            tile_size: DEFAULT_TILE_SIZE,
            origin: DEFAULT_ORIGIN,
            tiles: DEFAULT_TILES.to_vec(),
        }
    }

    pub fn into_tile_map(self) -> Result<TileMap, LanderError> {
        TileMap::new(
            self.columns,
            self.rows,
            self.tile_size,
            self.origin,
            self.tiles,
        )
    }
}

fn read_file(path: &str) -> Result<String, LanderError> {
    std::fs::read_to_string(path).map_err(|source| LanderError::Io {
        path: path.to_string(),
        source,
    })
}

/// Load the game config from a RON file.
pub fn load_config(path: &str) -> Result<GameConfig, LanderError> {
    let content = read_file(path)?;
    ron::from_str::<GameConfig>(&content).map_err(|source| LanderError::ConfigParse {
        path: path.to_string(),
        source,
    })
}

/// Load the game config, logging a warning and using defaults on failure.
pub fn load_config_or_default(path: &str) -> GameConfig {
    match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("{}, using default config", e);
            GameConfig::default()
        }
    }
}

/// Property on the `level` node, as f64. Accepts both float and integer
/// values.
fn prop_f64(node: &kdl::KdlNode, key: &str) -> Option<f64> {
    let val = node.get(key)?;
    val.as_float().or_else(|| val.as_integer().map(|i| i as f64))
}

fn prop_usize(node: &kdl::KdlNode, key: &str) -> Option<usize> {
    node.get(key)?
        .as_integer()
        .and_then(|i| usize::try_from(i).ok())
}

/// Parse a level document:
///
/// ```kdl
/// level columns=3 rows=2 tile-size=40.0 origin-x=500.0 origin-y=300.0 {
///     row 1 0 1
///     row 1 2 1
/// }
/// ```
///
/// `tile-size` and the origin are optional. Each `row` must hold exactly
/// `columns` non-negative integers.
pub fn parse_level(content: &str, path: &str) -> Result<LevelData, LanderError> {
    let fail = |reason: String| LanderError::LevelParse {
        path: path.to_string(),
        reason,
    };

    let doc = content
        .parse::<kdl::KdlDocument>()
        .map_err(|e| fail(e.to_string()))?;

    let node = doc
        .nodes()
        .iter()
        .find(|n| n.name().value() == "level")
        .ok_or_else(|| fail("no `level` node".to_string()))?;

    let columns = prop_usize(node, "columns")
        .ok_or_else(|| fail("`columns` missing or not a non-negative integer".to_string()))?;
    let rows = prop_usize(node, "rows")
        .ok_or_else(|| fail("`rows` missing or not a non-negative integer".to_string()))?;
    let tile_size = prop_f64(node, "tile-size").unwrap_or(DEFAULT_TILE_SIZE as f64) as f32;
    let origin = Vec2::new(
        prop_f64(node, "origin-x").unwrap_or(DEFAULT_ORIGIN.x as f64) as f32,
        prop_f64(node, "origin-y").unwrap_or(DEFAULT_ORIGIN.y as f64) as f32,
    );

    let mut tiles = Vec::with_capacity(columns * rows);
    let row_nodes = node
        .children()
        .map(|c| c.nodes())
        .unwrap_or_default()
        .iter()
        .filter(|n| n.name().value() == "row");

    for (row_idx, row) in row_nodes.enumerate() {
        let start = tiles.len();
        for entry in row.entries().iter().filter(|e| e.name().is_none()) {
            let tile = entry
                .value()
                .as_integer()
                .and_then(|i| TileId::try_from(i).ok())
                .ok_or_else(|| {
                    fail(format!(
                        "row {}: `{}` is not a tile id",
                        row_idx,
                        entry.value()
                    ))
                })?;
            tiles.push(tile);
        }
        let width = tiles.len() - start;
        if width != columns {
            return Err(fail(format!(
                "row {} has {} tiles, expected {}",
                row_idx, width, columns
            )));
        }
    }

    Ok(LevelData {
        columns,
        rows,
        tile_size,
        origin,
        tiles,
    })
}

/// Load a KDL level file.
pub fn load_level(path: &str) -> Result<LevelData, LanderError> {
    let content = read_file(path)?;
    parse_level(&content, path)
}

/// Level data for the configured path, or the built-in level when none is
/// configured. A file that fails to load falls back to the built-in level
/// with a warning.
pub fn load_level_or_default(path: Option<&str>) -> LevelData {
    let Some(path) = path else {
        return LevelData::default_level();
    };

    match load_level(path) {
        Ok(level) => {
            log::info!("loaded level {} ({}x{})", path, level.columns, level.rows);
            level
        }
        Err(e) => {
            log::warn!("{}, using built-in level", e);
            LevelData::default_level()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_level_builds() {
        let map = LevelData::default_level()
            .into_tile_map()
            .expect("built-in level is valid");
        assert_eq!(map.columns(), 30);
        assert_eq!(map.rows(), 15);
        let b = map.bounds();
        assert_eq!((b.left, b.right, b.top, b.bottom), (-100.0, 1100.0, 0.0, 600.0));
    }

    #[test]
    fn default_level_has_three_win_tiles() {
        let level = LevelData::default_level();
        let wins = level.tiles.iter().filter(|&&t| t == 2).count();
        assert_eq!(wins, 3);
        // Bottom row landing pad.
        assert_eq!(level.tiles[14 * 30 + 20], 2);
        assert_eq!(level.tiles[14 * 30 + 21], 2);
    }

    #[test]
    fn parse_small_level() {
        let text = r#"
            level columns=3 rows=2 tile-size=10.0 origin-x=0.0 origin-y=5 {
                row 1 0 1
                row 1 2 1
            }
        "#;
        let level = parse_level(text, "test.kdl").expect("valid level");
        assert_eq!(level.columns, 3);
        assert_eq!(level.rows, 2);
        assert_eq!(level.tile_size, 10.0);
        assert_eq!(level.origin, Vec2::new(0.0, 5.0));
        assert_eq!(level.tiles, vec![1, 0, 1, 1, 2, 1]);
    }

    #[test]
    fn parse_defaults_tile_size_and_origin() {
        let text = "level columns=1 rows=1 { row 0 }";
        let level = parse_level(text, "test.kdl").expect("valid level");
        assert_eq!(level.tile_size, DEFAULT_TILE_SIZE);
        assert_eq!(level.origin, DEFAULT_ORIGIN);
    }

    #[test]
    fn ragged_row_rejected() {
        let text = "level columns=3 rows=2 { row 1 1 1\n row 1 1 }";
        let err = parse_level(text, "test.kdl");
        assert!(matches!(err, Err(LanderError::LevelParse { .. })));
    }

    #[test]
    fn negative_tile_rejected() {
        let text = "level columns=2 rows=1 { row 1 -1 }";
        assert!(parse_level(text, "test.kdl").is_err());
    }

    #[test]
    fn missing_level_node_rejected() {
        assert!(parse_level("map columns=1 rows=1", "test.kdl").is_err());
    }

    #[test]
    fn row_count_mismatch_caught_by_tile_map() {
        let text = "level columns=2 rows=2 { row 1 1 }";
        let level = parse_level(text, "test.kdl").expect("rows parse");
        assert!(matches!(
            level.into_tile_map(),
            Err(LanderError::LevelSize { .. })
        ));
    }

    #[test]
    fn load_level_from_file() {
        let level = load_level("data/level.kdl").expect("shipped level parses");
        assert_eq!(level, LevelData::default_level());
    }

    #[test]
    fn missing_level_file_falls_back() {
        let level = load_level_or_default(Some("nonexistent.kdl"));
        assert_eq!(level, LevelData::default_level());
        assert!(matches!(
            load_level("nonexistent.kdl"),
            Err(LanderError::Io { .. })
        ));
    }

    #[test]
    fn load_config_from_file() {
        let config = load_config("data/config.ron").expect("shipped config parses");
        assert_eq!(config.window.width, 1000);
        assert_eq!(config.level.as_deref(), Some("data/level.kdl"));
    }

    #[test]
    fn missing_config_uses_defaults() {
        let config = load_config_or_default("nonexistent.ron");
        assert_eq!(config, GameConfig::default());
    }
}

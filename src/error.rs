use thiserror::Error;

use crate::components::Direction;

/// Construction-time and load-time failures.
///
/// Nothing in the per-step simulation returns this; once a scene is built,
/// stepping it cannot fail.
#[derive(Debug, Error)]
pub enum LanderError {
    #[error("level data has {actual} tiles, expected {columns}x{rows} = {expected}")]
    LevelSize {
        columns: usize,
        rows: usize,
        expected: usize,
        actual: usize,
    },

    #[error("tile size must be finite and positive, got {0}")]
    InvalidTileSize(f32),

    #[error("fixed timestep must be finite and positive, got {0}")]
    InvalidTimestep(f32),

    #[error("level file {path}: {reason}")]
    LevelParse { path: String, reason: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("animation atlas has no frames for direction {0:?}")]
    IncompleteAtlas(Direction),

    #[error("collider dimensions must be positive, got {width}x{height}")]
    InvalidCollider { width: f32, height: f32 },

    #[error("failed to load font {path}: {reason}")]
    Font { path: String, reason: String },

    #[error("failed to decode image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

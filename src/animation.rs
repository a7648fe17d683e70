use std::collections::HashMap;

use crate::components::{Direction, Rect};
use crate::error::LanderError;

/// Default animation speed, in frames per second.
pub const DEFAULT_FRAME_RATE: u32 = 14;

/// Frame-by-frame sprite-sheet animation with one frame list per direction.
///
/// Construction checks that every direction has at least one frame, so
/// lookups during update and render never miss.
#[derive(Debug, Clone)]
pub struct Animation {
    frames: [Vec<usize>; 4],
    columns: u32,
    rows: u32,
    frame_rate: u32,
    current: usize,
    elapsed: f32,
}

impl Animation {
    pub fn new(
        mut atlas: HashMap<Direction, Vec<usize>>,
        columns: u32,
        rows: u32,
    ) -> Result<Self, LanderError> {
        let mut take = |d: Direction| match atlas.remove(&d) {
            Some(frames) if !frames.is_empty() => Ok(frames),
            _ => Err(LanderError::IncompleteAtlas(d)),
        };
        let frames = [
            take(Direction::Left)?,
            take(Direction::Up)?,
            take(Direction::Right)?,
            take(Direction::Down)?,
        ];

        Ok(Self {
            frames,
            columns: columns.max(1),
            rows: rows.max(1),
            frame_rate: DEFAULT_FRAME_RATE,
            current: 0,
            elapsed: 0.0,
        })
    }

    pub fn with_frame_rate(mut self, frame_rate: u32) -> Self {
        self.frame_rate = frame_rate.max(1);
        self
    }

    pub fn frames(&self, direction: Direction) -> &[usize] {
        &self.frames[direction.index()]
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Sprite-sheet cell shown for `direction` at the current frame.
    pub fn current_frame(&self, direction: Direction) -> usize {
        let frames = self.frames(direction);
        frames[self.current % frames.len()]
    }

    /// Accumulate `dt`; once a full frame duration has passed, step to the
    /// next frame, wrapping within the direction's list.
    pub fn advance(&mut self, dt: f32, direction: Direction) {
        self.elapsed += dt;
        let frame_duration = 1.0 / self.frame_rate as f32;

        if self.elapsed >= frame_duration {
            self.elapsed = 0.0;
            self.current = (self.current + 1) % self.frames(direction).len();
        }
    }
}

/// Sub-rectangle `index` of a texture partitioned into `columns`x`rows`
/// equal cells, in texels. Cells are numbered row-major from the top left.
pub fn sprite_rect(texture_w: u32, texture_h: u32, index: usize, columns: u32, rows: u32) -> Rect {
    let columns = columns.max(1);
    let rows = rows.max(1);
    let cell_w = texture_w as f32 / columns as f32;
    let cell_h = texture_h as f32 / rows as f32;
    let col = (index % columns as usize) as f32;
    let row = (index / columns as usize) as f32;
    Rect::new(col * cell_w, row * cell_h, cell_w, cell_h)
}

//! Coloured tile layers for map drawing

use sanic_math::{Rect, Vec2};

use crate::level_data::LevelData;

/// A visible tile in map coordinates (y down)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub rect: Rect,
    pub color: [f32; 4],
}

/// Decoded tile layers; each cell holds a colour or nothing
#[derive(Debug, Clone, Default)]
pub struct TileMap {
    width: usize,
    height: usize,
    tile_size: Vec2,
    layers: Vec<Vec<Option<[f32; 4]>>>,
}

impl TileMap {
    pub fn from_level(level: &LevelData) -> Self {
        let width = level.width as usize;
        let height = level.height as usize;
        let layers = level
            .tiles
            .iter()
            .map(|layer| {
                let mut cells = vec![None; width * height];
                for (row, line) in layer.rows.iter().enumerate().take(height) {
                    for (col, ch) in line.chars().enumerate().take(width) {
                        cells[row * width + col] = level.palette.get(&ch).copied();
                    }
                }
                cells
            })
            .collect();

        Self {
            width,
            height,
            tile_size: Vec2::new(level.tile_width as f32, level.tile_height as f32),
            layers,
        }
    }

    /// Map size in pixels
    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(
            self.width as f32 * self.tile_size.x,
            self.height as f32 * self.tile_size.y,
        )
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Tiles overlapping `view`, bottom layer first
    pub fn visible(&self, view: Rect) -> Vec<Tile> {
        if self.width == 0 || self.height == 0 || self.tile_size.x <= 0.0 || self.tile_size.y <= 0.0 {
            return Vec::new();
        }
        let clamp_col = |v: f32| (v / self.tile_size.x).floor().clamp(0.0, self.width as f32) as usize;
        let clamp_row = |v: f32| (v / self.tile_size.y).floor().clamp(0.0, self.height as f32) as usize;
        let (c0, c1) = (clamp_col(view.x), clamp_col(view.x + view.width + self.tile_size.x));
        let (r0, r1) = (clamp_row(view.y), clamp_row(view.y + view.height + self.tile_size.y));

        let mut tiles = Vec::new();
        for cells in &self.layers {
            for row in r0..r1 {
                for col in c0..c1 {
                    if let Some(color) = cells[row * self.width + col] {
                        tiles.push(Tile {
                            rect: Rect::new(
                                col as f32 * self.tile_size.x,
                                row as f32 * self.tile_size.y,
                                self.tile_size.x,
                                self.tile_size.y,
                            ),
                            color,
                        });
                    }
                }
            }
        }
        tiles
    }
}

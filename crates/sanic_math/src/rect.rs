//! Axis-aligned rectangles
//!
//! `Rect` is position + size with the origin at the minimum corner. Which way
//! "top" points depends on the space it is used in: world rects are y-up,
//! screen and map rects are y-down.

use serde::{Serialize, Deserialize};
use crate::Vec2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Rect of the given size centred on a point
    pub fn from_center(center: Vec2, width: f32, height: f32) -> Self {
        Self::new(center.x - width * 0.5, center.y - height * 0.5, width, height)
    }

    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn set_center(&mut self, center: Vec2) {
        self.x = center.x - self.width * 0.5;
        self.y = center.y - self.height * 0.5;
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }

    /// Overlap test; touching edges do not count
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }

    /// Grow (or shrink with negative values) around the centre
    pub fn inflate(&self, dw: f32, dh: f32) -> Self {
        Self::new(self.x - dw * 0.5, self.y - dh * 0.5, self.width + dw, self.height + dh)
    }
}

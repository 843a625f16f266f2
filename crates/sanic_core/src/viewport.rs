//! Viewports and draw lists
//!
//! A viewport is a screen rectangle plus a camera in map space (y down). It
//! can follow an actor by id; the reference is weak and is dropped the first
//! time the actor cannot be found. Drawing produces a [`DrawList`] of
//! screen-space quads that the renderer consumes as-is.

use std::fmt;

use sanic_math::{Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::actor::Actor;
use crate::actor_set::{ActorId, ActorSet};
use crate::stage::Space;
use crate::tags::CollisionTag;
use crate::tilemap::TileMap;

/// The camera looks slightly above the followed body
pub const CAMERA_LIFT: f32 = 30.0;

/// At most this many viewports share the screen
pub const MAX_VIEWPORTS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewportError {
    /// Adding would exceed [`MAX_VIEWPORTS`]
    TooMany(usize),
}

impl fmt::Display for ViewportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewportError::TooMany(n) => {
                write!(f, "Too many viewports: {} requested, {} allowed", n, MAX_VIEWPORTS)
            }
        }
    }
}

impl std::error::Error for ViewportError {}

/// Which layers a viewport draws
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    pub draw_map: bool,
    pub draw_sprites: bool,
    pub draw_physics_overlay: bool,
    /// Alpha of the physics overlay, 0..1
    pub overlay_alpha: f32,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            draw_map: true,
            draw_sprites: true,
            draw_physics_overlay: false,
            overlay_alpha: 0.5,
        }
    }
}

/// A filled, rotated rectangle in screen pixels (y down)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub center: Vec2,
    pub size: Vec2,
    /// Radians, clockwise on screen
    pub angle: f32,
    pub color: [f32; 4],
}

/// Everything one viewport draws in a frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    /// Screen rectangle to clip to
    pub viewport: Rect,
    pub quads: Vec<Quad>,
}

/// Read-only scene a viewport draws from
pub struct Scene<'a> {
    pub tiles: &'a TileMap,
    pub actors: &'a ActorSet<Actor>,
    pub space: &'a Space,
    pub settings: &'a ViewSettings,
}

fn overlay_color(tag: Option<CollisionTag>) -> [f32; 3] {
    match tag {
        Some(CollisionTag::Hero) => [0.2, 0.4, 1.0],
        Some(CollisionTag::Enemy) => [1.0, 0.5, 0.0],
        Some(CollisionTag::Boundary) => [0.6, 0.6, 0.6],
        Some(CollisionTag::Trap) => [1.0, 0.1, 0.1],
        Some(CollisionTag::Stairs) => [0.9, 0.9, 0.2],
        Some(CollisionTag::Geometry) | None => [0.2, 1.0, 0.3],
    }
}

#[derive(Debug, Clone, Default)]
pub struct Viewport {
    rect: Rect,
    camera: Vec2,
    following: Option<ActorId>,
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn follow(&mut self, id: ActorId) {
        self.following = Some(id);
    }

    pub fn unfollow(&mut self) {
        self.following = None;
    }

    pub fn following(&self) -> Option<ActorId> {
        self.following
    }

    /// Screen rectangle
    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.rect = rect;
    }

    /// Camera centre in map space
    pub fn center(&self) -> Vec2 {
        self.camera
    }

    /// The map area this viewport shows
    pub fn visible_area(&self) -> Rect {
        Rect::from_center(self.camera, self.rect.width, self.rect.height)
    }

    /// Re-centre on the followed actor, clamped to the map
    pub fn update(&mut self, actors: &ActorSet<Actor>, space: &Space, map_size: Vec2) {
        if let Some(id) = self.following {
            match actors.get(id).and_then(|actor| actor.position(space)) {
                Some(position) => {
                    self.camera = Vec2::new(position.x, map_size.y - position.y - CAMERA_LIFT);
                }
                None => {
                    log::debug!("Viewport lost actor {:?}", id);
                    self.following = None;
                }
            }
        }
        self.camera = Vec2::new(
            clamp_axis(self.camera.x, self.rect.width, map_size.x),
            clamp_axis(self.camera.y, self.rect.height, map_size.y),
        );
    }

    /// Map point to screen pixels
    pub fn to_screen(&self, map_point: Vec2) -> Vec2 {
        map_point - self.camera + self.rect.size() * 0.5 + self.rect.min()
    }

    fn push_map_rect(&self, quads: &mut Vec<Quad>, rect: Rect, angle: f32, color: [f32; 4]) {
        quads.push(Quad {
            center: self.to_screen(rect.center()),
            size: rect.size(),
            angle,
            color,
        });
    }

    pub fn draw(&self, scene: &Scene<'_>) -> DrawList {
        let map_height = scene.tiles.pixel_size().y;
        let visible = self.visible_area();
        let to_map = |world: Rect| Rect::new(world.x, map_height - (world.y + world.height), world.width, world.height);
        let mut quads = Vec::new();

        if scene.settings.draw_map {
            for tile in scene.tiles.visible(visible) {
                self.push_map_rect(&mut quads, tile.rect, 0.0, tile.color);
            }
        }

        if scene.settings.draw_sprites {
            for (_, actor) in scene.actors.iter() {
                for sprite in actor.sprites() {
                    let Some(placement) = sprite.placement(scene.space) else {
                        continue;
                    };
                    let rect = to_map(placement.rect);
                    if rect.intersects(&visible) {
                        self.push_map_rect(&mut quads, rect, -placement.angle, placement.color);
                    }
                }
            }
        }

        if scene.settings.draw_physics_overlay {
            for (key, shape) in scene.space.shapes() {
                let Some(bbox) = scene.space.shape_bounding_box(key) else {
                    continue;
                };
                let rect = to_map(bbox);
                if !rect.intersects(&visible) {
                    continue;
                }
                let [r, g, b] = overlay_color(CollisionTag::from_collision_type(shape.collision_type));
                self.push_map_rect(&mut quads, rect, 0.0, [r, g, b, scene.settings.overlay_alpha]);
            }
        }

        DrawList {
            viewport: self.rect,
            quads,
        }
    }
}

/// Keep a view of `extent` inside `0..limit`; centre it if the map is smaller
fn clamp_axis(center: f32, extent: f32, limit: f32) -> f32 {
    let half = extent * 0.5;
    if limit <= extent {
        limit * 0.5
    } else {
        center.clamp(half, limit - half)
    }
}

/// Viewports sharing one screen area
#[derive(Debug, Clone, Default)]
pub struct ViewportGroup {
    bounds: Rect,
    viewports: Vec<Viewport>,
}

impl ViewportGroup {
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            viewports: Vec::new(),
        }
    }

    /// Add a viewport, returning its index
    pub fn add(&mut self, viewport: Viewport) -> Result<usize, ViewportError> {
        let count = self.viewports.len() + 1;
        if count > MAX_VIEWPORTS {
            log::error!("Too many viewports ({}), only {} allowed", count, MAX_VIEWPORTS);
            return Err(ViewportError::TooMany(count));
        }
        self.viewports.push(viewport);
        self.layout();
        Ok(count - 1)
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Change the shared area and re-layout
    pub fn resize(&mut self, bounds: Rect) {
        if bounds != self.bounds {
            log::info!("Resizing {} viewports to {}x{}", self.viewports.len(), bounds.width, bounds.height);
            self.bounds = bounds;
            self.layout();
        }
    }

    fn layout(&mut self) {
        let b = self.bounds;
        match self.viewports.as_mut_slice() {
            [only] => only.set_rect(b),
            [top, bottom] => {
                let half = b.height * 0.5;
                top.set_rect(Rect::new(b.x, b.y, b.width, half));
                bottom.set_rect(Rect::new(b.x, b.y + half, b.width, half));
            }
            _ => {}
        }
    }

    pub fn len(&self) -> usize {
        self.viewports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.viewports.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Viewport> {
        self.viewports.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Viewport> {
        self.viewports.get_mut(index)
    }

    /// Drop every follow reference to an actor
    pub fn forget(&mut self, id: ActorId) {
        for viewport in &mut self.viewports {
            if viewport.following == Some(id) {
                viewport.unfollow();
            }
        }
    }

    pub fn update(&mut self, actors: &ActorSet<Actor>, space: &Space, map_size: Vec2) {
        for viewport in &mut self.viewports {
            viewport.update(actors, space, map_size);
        }
    }

    pub fn draw(&self, scene: &Scene<'_>) -> Vec<DrawList> {
        self.viewports.iter().map(|viewport| viewport.draw(scene)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let bounds = Rect::new(0.0, 100.0, 800.0, 400.0);
        let mut group = ViewportGroup::new(bounds);
        assert_eq!(group.add(Viewport::new()), Ok(0));
        assert_eq!(group.get(0).map(Viewport::rect), Some(bounds));

        assert_eq!(group.add(Viewport::new()), Ok(1));
        assert_eq!(group.get(0).map(Viewport::rect), Some(Rect::new(0.0, 100.0, 800.0, 200.0)));
        assert_eq!(group.get(1).map(Viewport::rect), Some(Rect::new(0.0, 300.0, 800.0, 200.0)));

        assert_eq!(group.add(Viewport::new()), Err(ViewportError::TooMany(3)));
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn test_resize_relayouts() {
        let mut group = ViewportGroup::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        group.add(Viewport::new()).expect("first viewport");
        group.resize(Rect::new(0.0, 20.0, 200.0, 80.0));
        assert_eq!(group.get(0).map(Viewport::rect), Some(Rect::new(0.0, 20.0, 200.0, 80.0)));
    }

    #[test]
    fn test_camera_clamps_to_map() {
        let mut viewport = Viewport::new();
        viewport.set_rect(Rect::new(0.0, 0.0, 200.0, 100.0));
        let actors: ActorSet<Actor> = ActorSet::new();
        let space = Space::new();

        viewport.update(&actors, &space, Vec2::new(1000.0, 500.0));
        assert_eq!(viewport.center(), Vec2::new(100.0, 50.0));

        // smaller than the view: centred
        viewport.update(&actors, &space, Vec2::new(100.0, 50.0));
        assert_eq!(viewport.center(), Vec2::new(50.0, 25.0));
    }

    #[test]
    fn test_lost_actor_is_unfollowed() {
        let mut viewport = Viewport::new();
        let mut ids: ActorSet<()> = ActorSet::new();
        let id = ids.add(());
        viewport.follow(id);

        let actors: ActorSet<Actor> = ActorSet::new();
        viewport.update(&actors, &Space::new(), Vec2::new(100.0, 100.0));
        assert_eq!(viewport.following(), None);
    }

    #[test]
    fn test_to_screen() {
        let mut viewport = Viewport::new();
        viewport.set_rect(Rect::new(10.0, 20.0, 200.0, 100.0));
        viewport.camera = Vec2::new(300.0, 400.0);
        assert_eq!(viewport.to_screen(Vec2::new(300.0, 400.0)), Vec2::new(110.0, 70.0));
        assert_eq!(viewport.to_screen(Vec2::new(250.0, 400.0)), Vec2::new(60.0, 70.0));
    }

    #[test]
    fn test_group_forget() {
        let mut group = ViewportGroup::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        group.add(Viewport::new()).expect("viewport");
        let mut ids: ActorSet<()> = ActorSet::new();
        let id = ids.add(());
        if let Some(viewport) = group.get_mut(0) {
            viewport.follow(id);
        }
        group.forget(id);
        assert_eq!(group.get(0).and_then(Viewport::following), None);
    }
}

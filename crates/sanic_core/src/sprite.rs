//! Sprites
//!
//! A sprite tracks one physics shape and knows how to present it: either an
//! animation from a sprite sheet drawn at the body position, or a solid fill
//! covering the shape's bounding box (moving platforms).

use std::sync::Arc;

use sanic_math::{Rect, Vec2};
use sanic_physics::{PhysicsWorld, ShapeKey};

use crate::resources::{Frame, PlayMode, SpriteSheet};

/// Animation playback state
#[derive(Debug, Clone)]
struct Animator {
    sheet: Arc<SpriteSheet>,
    current: Option<usize>,
    frame: usize,
    /// Seconds left on the current frame
    timer: f32,
    /// Looping or held animation to resume after a `Once` animation
    previous: Option<usize>,
}

#[derive(Debug, Clone)]
enum Look {
    Animated(Animator),
    Solid([f32; 4]),
}

/// Something drawn at a shape's position
#[derive(Debug, Clone)]
pub struct Sprite {
    pub shape: ShapeKey,
    /// Mirror horizontally
    pub flip: bool,
    /// Multiplier on animation time
    pub speed_modifier: f32,
    look: Look,
}

/// Where and how to draw a sprite, in world coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpritePlacement {
    pub rect: Rect,
    pub angle: f32,
    pub color: [f32; 4],
}

impl Sprite {
    /// Animated sprite; starts on `initial` if the sheet has it
    pub fn animated(shape: ShapeKey, sheet: Arc<SpriteSheet>, initial: &str) -> Self {
        let mut sprite = Self {
            shape,
            flip: false,
            speed_modifier: 1.0,
            look: Look::Animated(Animator {
                sheet,
                current: None,
                frame: 0,
                timer: 0.0,
                previous: None,
            }),
        };
        sprite.play(initial);
        sprite
    }

    /// Sprite filling the shape's bounding box
    pub fn solid(shape: ShapeKey, color: [f32; 4]) -> Self {
        Self {
            shape,
            flip: false,
            speed_modifier: 1.0,
            look: Look::Solid(color),
        }
    }

    /// Name of the playing animation
    pub fn animation(&self) -> Option<&str> {
        match &self.look {
            Look::Animated(a) => a
                .current
                .and_then(|i| a.sheet.animation(i))
                .map(|anim| anim.name.as_str()),
            Look::Solid(_) => None,
        }
    }

    /// Start an animation from its first frame
    ///
    /// Unknown names are logged and leave the current animation running.
    pub fn play(&mut self, name: &str) -> bool {
        let Look::Animated(animator) = &mut self.look else {
            return false;
        };
        let Some(index) = animator.sheet.find(name) else {
            log::error!("cannot load animation '{}' from '{}'", name, animator.sheet.name);
            return false;
        };
        log::debug!("{} set animation {}", animator.sheet.name, name);

        if let Some(current) = animator.current {
            if !animator.is_once(current) {
                animator.previous = Some(current);
            }
        }
        animator.start(index);
        true
    }

    /// Advance animation time
    pub fn update(&mut self, dt: f32) {
        let speed = self.speed_modifier;
        if let Look::Animated(animator) = &mut self.look {
            animator.advance(dt * speed);
        }
    }

    /// The frame being shown
    pub fn current_frame(&self) -> Option<&Frame> {
        match &self.look {
            Look::Animated(a) => a
                .current
                .and_then(|i| a.sheet.animation(i))
                .and_then(|anim| anim.frames.get(a.frame)),
            Look::Solid(_) => None,
        }
    }

    pub fn frame_index(&self) -> usize {
        match &self.look {
            Look::Animated(a) => a.frame,
            Look::Solid(_) => 0,
        }
    }

    /// Draw placement in world space, None if nothing to draw
    pub fn placement<C>(&self, space: &PhysicsWorld<C>) -> Option<SpritePlacement> {
        let shape = space.get_shape(self.shape)?;
        let body = space.get_body(shape.body)?;
        match &self.look {
            Look::Solid(color) => Some(SpritePlacement {
                rect: space.shape_bounding_box(self.shape)?,
                angle: 0.0,
                color: *color,
            }),
            Look::Animated(_) => {
                let frame = self.current_frame()?;
                let mut axis = Vec2::new(frame.axis[0], frame.axis[1]);
                if self.flip {
                    axis.x = -axis.x;
                }
                // frame axes are authored y-down
                let center = body.position + Vec2::new(axis.x, -axis.y);
                Some(SpritePlacement {
                    rect: Rect::from_center(center, frame.size[0], frame.size[1]),
                    angle: body.angle,
                    color: frame.color,
                })
            }
        }
    }
}

impl Animator {
    fn is_once(&self, index: usize) -> bool {
        self.sheet.animation(index).map(|a| a.mode) == Some(PlayMode::Once)
    }

    fn start(&mut self, index: usize) {
        self.current = Some(index);
        self.frame = 0;
        self.timer = self.sheet.animation(index).map(|a| a.interval()).unwrap_or(0.0);
    }

    fn advance(&mut self, dt: f32) {
        let Some(index) = self.current else {
            return;
        };
        let Some(animation) = self.sheet.animation(index) else {
            return;
        };
        let interval = animation.interval();
        if interval <= 0.0 || animation.frames.is_empty() {
            return;
        }
        let count = animation.frames.len();
        let mode = animation.mode;

        self.timer -= dt;
        while self.timer <= 0.0 {
            match mode {
                PlayMode::Loop => self.frame = (self.frame + 1) % count,
                PlayMode::Hold => {
                    if self.frame + 1 >= count {
                        self.timer = interval;
                        return;
                    }
                    self.frame += 1;
                }
                PlayMode::Once => {
                    if self.frame + 1 >= count {
                        let previous = self.previous.take().or_else(|| self.sheet.find("idle"));
                        match previous {
                            Some(previous) => self.start(previous),
                            None => self.timer = interval,
                        }
                        return;
                    }
                    self.frame += 1;
                }
            }
            self.timer += interval;
        }
    }
}

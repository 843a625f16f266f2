//! State shared with contact callbacks

use sanic_physics::PhysicsWorld;

use crate::actor::Actor;
use crate::actor_set::ActorSet;

/// The physics space, with [`Stage`] as its callback context
pub type Space = PhysicsWorld<Stage>;

/// Trigger-and-forget sound request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundCue {
    pub name: &'static str,
    /// Stop the cue if it is already playing, then play it again
    pub restart: bool,
}

impl SoundCue {
    pub const fn new(name: &'static str) -> Self {
        Self { name, restart: false }
    }

    pub const fn restarting(name: &'static str) -> Self {
        Self { name, restart: true }
    }
}

/// Everything a contact callback may touch during a physics step
#[derive(Default)]
pub struct Stage {
    pub actors: ActorSet<Actor>,
    /// Sound cues waiting for the frame driver
    pub cues: Vec<SoundCue>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued cue
    pub fn drain_cues(&mut self) -> Vec<SoundCue> {
        std::mem::take(&mut self.cues)
    }
}

//! Simulation system
//!
//! Turns wall-clock frames into level updates:
//! - Frame timing with a capped delta
//! - Key events, OS repeats included, routed through the translator
//! - Held-button repeats fed to the hero before each frame
//! - `updates_per_frame` equal level updates
//! - The per-frame score counter

use std::time::{Duration, Instant};

use sanic_core::{Level, SoundCue};
use sanic_input::{Command, KeyboardTranslator};
use winit::event::ElementState;
use winit::keyboard::KeyCode;

use crate::config::WorldConfig;

/// Wall-clock frame timer
pub struct FrameClock {
    last_frame: Instant,
    max_frame_time: f32,
}

impl FrameClock {
    pub fn new(max_frame_time: f32) -> Self {
        Self {
            last_frame: Instant::now(),
            max_frame_time,
        }
    }

    /// Seconds since the previous tick, capped
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let raw_dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        // first frame and focus changes would otherwise dump a huge step on physics
        raw_dt.min(self.max_frame_time)
    }

    /// Restart timing from now
    pub fn reset(&mut self) {
        self.last_frame = Instant::now();
    }
}

/// Time between frames at the target rate
pub fn frame_interval(target_fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / target_fps.max(1) as f64)
}

/// Translate a player key event and hand the command to the hero
///
/// OS key repeats come through as presses of a held key and reach the hero
/// as `Held`; the hero's debounce drops them for one-shot actions.
pub fn route_key(
    keyboard: &mut KeyboardTranslator,
    level: &mut Level,
    key: KeyCode,
    state: ElementState,
) -> Option<Command> {
    let cmd = keyboard.process_keyboard(key, state)?;
    level.handle_command(&cmd);
    Some(cmd)
}

/// Result of one frame of simulation
#[derive(Debug, Default)]
pub struct SimulationResult {
    /// Sound cues raised during the frame
    pub cues: Vec<SoundCue>,
    /// True if a new hero was spawned this frame
    pub hero_respawned: bool,
}

/// Drives the level once per rendered frame
pub struct SimulationSystem {
    clock: FrameClock,
    updates_per_frame: u32,
    score: u64,
}

impl SimulationSystem {
    pub fn new(world: &WorldConfig) -> Self {
        Self {
            clock: FrameClock::new(world.max_frame_time),
            updates_per_frame: world.updates_per_frame.max(1),
            score: 0,
        }
    }

    /// Run one frame against the wall clock
    pub fn update(&mut self, level: &mut Level, held: &[Command]) -> SimulationResult {
        let dt = self.clock.tick();
        self.advance(level, held, dt)
    }

    /// Run one frame of `dt` seconds
    pub fn advance(&mut self, level: &mut Level, held: &[Command], dt: f32) -> SimulationResult {
        let spawns = level.hero_spawns();
        level.handle_held(held);

        let step = dt / self.updates_per_frame as f32;
        for _ in 0..self.updates_per_frame {
            level.update(step);
        }
        self.score += 1;

        SimulationResult {
            cues: level.drain_cues(),
            hero_respawned: level.hero_spawns() != spawns,
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    /// Forget the time spent away (window hidden, event loop paused)
    pub fn reset_clock(&mut self) {
        self.clock.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_time_capped() {
        let mut clock = FrameClock::new(0.01);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(clock.tick(), 0.01);
    }

    #[test]
    fn test_tick_measures_elapsed_time() {
        let mut clock = FrameClock::new(10.0);
        std::thread::sleep(Duration::from_millis(20));
        let dt = clock.tick();
        assert!(dt >= 0.02 && dt < 10.0);
    }

    #[test]
    fn test_frame_interval() {
        assert!((frame_interval(50).as_secs_f64() - 0.02).abs() < 1e-9);
        // zero is treated as one frame per second
        assert_eq!(frame_interval(0), Duration::from_secs(1));
    }
}

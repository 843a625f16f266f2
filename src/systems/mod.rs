//! Application systems
//!
//! Modular systems extracted from main.rs for better organization and testability.

mod audio;
mod hud;
mod render;
mod simulation;
mod window;

pub use audio::AudioSystem;
pub use hud::score_draw_list;
pub use render::{hud_area, level_area, RenderSystem};
pub use simulation::{frame_interval, route_key, FrameClock, SimulationResult, SimulationSystem};
pub use window::{WindowError, WindowSystem};

//! Sanic Forever
//!
//! Library half of the game binary: configuration, the top-level error and
//! the systems the frame driver in `main.rs` is built from.

pub mod config;
pub mod error;
pub mod input;
pub mod systems;

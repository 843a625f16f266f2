//! Top-level application error

use std::fmt;

use sanic_core::{LevelLoadError, ResourceError};
use sanic_render::RenderError;

use crate::config::ConfigError;
use crate::systems::WindowError;

/// Anything that stops the game from starting or running
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Resources(ResourceError),
    Level(LevelLoadError),
    Window(WindowError),
    Render(RenderError),
    /// The event loop could not be created or failed while running
    EventLoop(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Resources(e) => write!(f, "Failed to load resources: {}", e),
            AppError::Level(e) => write!(f, "Failed to load level: {}", e),
            AppError::Window(e) => write!(f, "{}", e),
            AppError::Render(e) => write!(f, "Renderer failed: {}", e),
            AppError::EventLoop(msg) => write!(f, "Event loop error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::Resources(e) => Some(e),
            AppError::Level(e) => Some(e),
            AppError::Window(e) => Some(e),
            AppError::Render(e) => Some(e),
            AppError::EventLoop(_) => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}

impl From<ResourceError> for AppError {
    fn from(e: ResourceError) -> Self {
        AppError::Resources(e)
    }
}

impl From<LevelLoadError> for AppError {
    fn from(e: LevelLoadError) -> Self {
        AppError::Level(e)
    }
}

impl From<WindowError> for AppError {
    fn from(e: WindowError) -> Self {
        AppError::Window(e)
    }
}

impl From<RenderError> for AppError {
    fn from(e: RenderError) -> Self {
        AppError::Render(e)
    }
}

impl From<winit::error::EventLoopError> for AppError {
    fn from(e: winit::error::EventLoopError) -> Self {
        AppError::EventLoop(e.to_string())
    }
}

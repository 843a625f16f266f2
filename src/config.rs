//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`SANIC_SECTION__KEY`)

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use sanic_core::{LevelSettings, Tuning, ViewSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub hero: HeroConfig,
    #[serde(default)]
    pub zombie: ZombieConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`SANIC_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // SANIC_WORLD__GRAVITY=-900 -> world.gravity = -900
        figment = figment.merge(Env::prefixed("SANIC_").split("__"));

        figment.extract().map_err(ConfigError::from)
    }

    /// Simulation settings handed to the level
    pub fn level_settings(&self) -> LevelSettings {
        LevelSettings {
            gravity: self.world.gravity,
            substeps: self.world.substeps,
            respawn_delay: self.world.respawn_delay,
            hero: self.hero.to_tuning(),
            zombie: self.zombie.to_tuning(),
            view: self.display.view_settings(),
        }
    }
}

/// Window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
    /// Start in fullscreen mode
    pub fullscreen: bool,
    pub vsync: bool,
    /// Frames per second the driver paces to
    pub target_fps: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Sanic Forever".to_string(),
            width: 1024,
            height: 768,
            fullscreen: false,
            vsync: true,
            target_fps: 60,
        }
    }
}

/// What gets drawn, and at which scale
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Physical pixels per level pixel
    pub pixel_scale: f32,
    /// Fraction of the window height above the level area
    pub hud_fraction: f32,
    pub draw_sprites: bool,
    pub draw_map: bool,
    pub draw_physics_overlay: bool,
    pub physics_overlay_alpha: f32,
    /// Clear colour [r, g, b, a]
    pub background_color: [f32; 4],
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            pixel_scale: 1.0,
            hud_fraction: 0.2,
            draw_sprites: true,
            draw_map: true,
            draw_physics_overlay: false,
            physics_overlay_alpha: 0.5,
            background_color: [0.35, 0.55, 0.85, 1.0],
        }
    }
}

impl DisplayConfig {
    pub fn view_settings(&self) -> ViewSettings {
        ViewSettings {
            draw_map: self.draw_map,
            draw_sprites: self.draw_sprites,
            draw_physics_overlay: self.draw_physics_overlay,
            overlay_alpha: self.physics_overlay_alpha.clamp(0.0, 1.0),
        }
    }
}

/// Simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Gravity (negative = downward)
    pub gravity: f32,
    /// Physics steps per level update
    pub substeps: u32,
    /// Level updates per rendered frame
    pub updates_per_frame: u32,
    /// Seconds before a dead hero comes back
    pub respawn_delay: f32,
    /// Upper bound on one frame's simulated time, in seconds
    pub max_frame_time: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        let level = LevelSettings::default();
        Self {
            gravity: level.gravity,
            substeps: level.substeps,
            updates_per_frame: 1,
            respawn_delay: level.respawn_delay,
            max_frame_time: 0.05,
        }
    }
}

/// Hero movement tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroConfig {
    pub move_power: f32,
    pub move_speed: f32,
    pub brake_power: f32,
    pub jump_power: f32,
    pub air_move_speed: f32,
}

impl Default for HeroConfig {
    fn default() -> Self {
        let tuning = LevelSettings::default().hero;
        Self {
            move_power: tuning.move_power,
            move_speed: tuning.move_speed,
            brake_power: tuning.brake_power,
            jump_power: tuning.jump_power,
            air_move_speed: tuning.air_move_speed,
        }
    }
}

impl HeroConfig {
    pub fn to_tuning(&self) -> Tuning {
        Tuning {
            move_power: self.move_power,
            move_speed: self.move_speed,
            brake_power: self.brake_power,
            jump_power: self.jump_power,
            air_move_speed: self.air_move_speed,
        }
    }
}

/// Zombie movement tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZombieConfig {
    pub move_power: f32,
    pub move_speed: f32,
    pub jump_power: f32,
}

impl Default for ZombieConfig {
    fn default() -> Self {
        let tuning = LevelSettings::default().zombie;
        Self {
            move_power: tuning.move_power,
            move_speed: tuning.move_speed,
            jump_power: tuning.jump_power,
        }
    }
}

impl ZombieConfig {
    pub fn to_tuning(&self) -> Tuning {
        Tuning {
            move_power: self.move_power,
            move_speed: self.move_speed,
            jump_power: self.jump_power,
            ..LevelSettings::default().zombie
        }
    }
}

/// Data file locations, relative to the working directory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub level: PathBuf,
    pub resources: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            level: PathBuf::from("assets/levels/level0.ron"),
            resources: PathBuf::from("assets"),
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.target_fps, 60);
        assert_eq!(config.world.gravity, -1500.0);
        assert_eq!(config.paths.level, PathBuf::from("assets/levels/level0.ron"));
    }

    #[test]
    fn test_level_settings_follow_config() {
        let mut config = AppConfig::default();
        config.world.gravity = -900.0;
        config.hero.jump_power = 1234.0;
        config.zombie.move_speed = 2.0;
        config.display.draw_physics_overlay = true;

        let settings = config.level_settings();
        assert_eq!(settings.gravity, -900.0);
        assert_eq!(settings.hero.jump_power, 1234.0);
        assert_eq!(settings.zombie.move_speed, 2.0);
        assert_eq!(settings.zombie.brake_power, LevelSettings::default().zombie.brake_power);
        assert!(settings.view.draw_physics_overlay);
    }

    #[test]
    fn test_default_settings_round_trip() {
        assert_eq!(AppConfig::default().level_settings(), LevelSettings::default());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml = toml::to_string(&config).expect("config serializes");
        assert!(toml.contains("title"));
        assert!(toml.contains("gravity"));
        assert!(toml.contains("air_move_speed"));
    }
}

//! Resource registry
//!
//! Built once at startup from the resource directory and shared read-only
//! (behind an `Arc`) with the level and actor factories.
//!
//! - `animations.ron`: sprite sheets, each a list of named animations
//! - `sounds.ron`: sound cue names mapped to files under `sounds/`

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// How an animation behaves after its last frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayMode {
    /// Wrap around to the first frame
    #[default]
    Loop,
    /// Stay on the last frame
    Hold,
    /// Return to the previously playing animation
    Once,
}

/// One animation frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Frame size in pixels
    pub size: [f32; 2],
    /// Draw offset from the body position (mirrored when flipped)
    #[serde(default)]
    pub axis: [f32; 2],
    /// Fill colour (RGBA)
    #[serde(default = "default_color")]
    pub color: [f32; 4],
}

fn default_color() -> [f32; 4] {
    [1.0, 1.0, 1.0, 1.0]
}

/// A named sequence of frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub name: String,
    /// Time each frame is shown
    pub interval_ms: f32,
    #[serde(default)]
    pub mode: PlayMode,
    pub frames: Vec<Frame>,
}

impl Animation {
    pub fn interval(&self) -> f32 {
        self.interval_ms / 1000.0
    }
}

/// Animations for one kind of sprite
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpriteSheet {
    pub name: String,
    pub animations: Vec<Animation>,
}

impl SpriteSheet {
    pub fn new(name: impl Into<String>, animations: Vec<Animation>) -> Self {
        Self {
            name: name.into(),
            animations,
        }
    }

    /// Index of a named animation
    pub fn find(&self, name: &str) -> Option<usize> {
        self.animations.iter().position(|a| a.name == name)
    }

    pub fn animation(&self, index: usize) -> Option<&Animation> {
        self.animations.get(index)
    }
}

/// Error type for resource loading
#[derive(Debug)]
pub enum ResourceError {
    /// IO error reading a resource file
    Io(io::Error),
    /// RON parse error
    Parse(ron::error::SpannedError),
    /// A resource required at startup is not defined
    Missing(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Io(err) => write!(f, "Resource IO error: {}", err),
            ResourceError::Parse(err) => write!(f, "Resource parse error: {}", err),
            ResourceError::Missing(name) => write!(f, "Missing resource: {}", name),
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Io(err) => Some(err),
            ResourceError::Parse(err) => Some(err),
            ResourceError::Missing(_) => None,
        }
    }
}

impl From<io::Error> for ResourceError {
    fn from(err: io::Error) -> Self {
        ResourceError::Io(err)
    }
}

impl From<ron::error::SpannedError> for ResourceError {
    fn from(err: ron::error::SpannedError) -> Self {
        ResourceError::Parse(err)
    }
}

/// Pre-loaded lookup tables for sprites and sounds
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    sheets: HashMap<String, Arc<SpriteSheet>>,
    sounds: HashMap<String, PathBuf>,
}

impl ResourceRegistry {
    /// Load `animations.ron` and `sounds.ron` from a resource directory
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ResourceError> {
        let dir = dir.as_ref();
        log::info!("Loading resources from {}", dir.display());
        let animations = std::fs::read_to_string(dir.join("animations.ron"))?;
        let sounds = std::fs::read_to_string(dir.join("sounds.ron"))?;
        let mut registry = Self::from_ron(&animations, &sounds)?;

        let sound_dir = dir.join("sounds");
        for path in registry.sounds.values_mut() {
            *path = sound_dir.join(&*path);
        }
        Ok(registry)
    }

    /// Parse registry sources already held in memory
    pub fn from_ron(animations: &str, sounds: &str) -> Result<Self, ResourceError> {
        let sheets: HashMap<String, Vec<Animation>> = ron::from_str(animations)?;
        let sounds: HashMap<String, PathBuf> = ron::from_str(sounds)?;

        let sheets = sheets
            .into_iter()
            .map(|(name, animations)| {
                log::debug!("Sprite sheet '{}' with {} animations", name, animations.len());
                let sheet = Arc::new(SpriteSheet::new(name.clone(), animations));
                (name, sheet)
            })
            .collect();

        Ok(Self { sheets, sounds })
    }

    pub fn with_sheet(mut self, sheet: SpriteSheet) -> Self {
        self.sheets.insert(sheet.name.clone(), Arc::new(sheet));
        self
    }

    pub fn sheet(&self, name: &str) -> Option<Arc<SpriteSheet>> {
        self.sheets.get(name).cloned()
    }

    /// A sheet, or an empty one if it is not defined
    ///
    /// Sprites built from an empty sheet log every `play` and draw nothing.
    pub fn sheet_or_empty(&self, name: &str) -> Arc<SpriteSheet> {
        self.sheet(name).unwrap_or_else(|| {
            log::warn!("Sprite sheet '{}' is not defined", name);
            Arc::new(SpriteSheet::new(name, Vec::new()))
        })
    }

    /// Fail unless every named sheet is defined
    pub fn require_sheets(&self, names: &[&str]) -> Result<(), ResourceError> {
        match names.iter().find(|name| !self.sheets.contains_key(**name)) {
            Some(name) => Err(ResourceError::Missing(format!("sprite sheet '{}'", name))),
            None => Ok(()),
        }
    }

    pub fn sound(&self, cue: &str) -> Option<&Path> {
        self.sounds.get(cue).map(PathBuf::as_path)
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANIMATIONS: &str = r#"{
        "zombie": [
            (name: "idle", interval_ms: 100.0, frames: [(size: (28.0, 48.0), axis: (0.0, 2.0))]),
            (name: "walking", interval_ms: 180.0, mode: Loop, frames: [
                (size: (28.0, 48.0), color: (0.3, 0.6, 0.3, 1.0)),
                (size: (28.0, 48.0), color: (0.3, 0.5, 0.3, 1.0)),
            ]),
        ],
    }"#;

    const SOUNDS: &str = r#"{ "hurt": "hurt.ogg" }"#;

    #[test]
    fn test_parse_registry() {
        let registry = ResourceRegistry::from_ron(ANIMATIONS, SOUNDS).expect("valid sources");
        assert_eq!(registry.sheet_count(), 1);

        let sheet = registry.sheet("zombie").expect("zombie sheet");
        let walking = sheet.find("walking").and_then(|i| sheet.animation(i)).expect("walking");
        assert_eq!(walking.frames.len(), 2);
        assert!((walking.interval() - 0.18).abs() < 1e-6);

        let idle = sheet.find("idle").and_then(|i| sheet.animation(i)).expect("idle");
        assert_eq!(idle.mode, PlayMode::Loop);
        assert_eq!(idle.frames[0].color, [1.0, 1.0, 1.0, 1.0]);

        assert!(registry.sound("hurt").is_some());
        assert!(registry.sound("missing").is_none());
    }

    #[test]
    fn test_require_sheets() {
        let registry = ResourceRegistry::from_ron(ANIMATIONS, SOUNDS).expect("valid sources");
        assert!(registry.require_sheets(&["zombie"]).is_ok());
        let err = registry.require_sheets(&["zombie", "sanic"]).unwrap_err();
        assert!(format!("{}", err).contains("sanic"));
    }

    #[test]
    fn test_sheet_or_empty() {
        let registry = ResourceRegistry::default();
        let sheet = registry.sheet_or_empty("nope");
        assert!(sheet.animations.is_empty());
    }

    #[test]
    fn test_parse_error() {
        let result = ResourceRegistry::from_ron("{ oops", SOUNDS);
        assert!(matches!(result, Err(ResourceError::Parse(_))));
    }

    #[test]
    fn test_load_missing_dir() {
        let dir = std::env::temp_dir().join("sanic_resources_missing");
        let result = ResourceRegistry::load(&dir);
        assert!(matches!(result, Err(ResourceError::Io(_))));
    }
}

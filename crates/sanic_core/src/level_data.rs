//! Level file format
//!
//! Levels are authored as RON. Coordinates follow the map editor convention:
//! pixels, origin at the top-left, y pointing down. The shape loader flips
//! them into the y-up physics space using the map height.
//!
//! ```ron
//! #![enable(implicit_some)]
//! (
//!     name: "level0",
//!     width: 4, height: 2, tile_width: 32, tile_height: 32,
//!     palette: { '#': (0.4, 0.3, 0.2, 1.0) },
//!     tiles: [(name: "ground", rows: ["....", "####"])],
//!     object_groups: [
//!         (name: "Physics", objects: [
//!             Box(x: 0.0, y: 32.0, width: 128.0, height: 32.0),
//!             Marker(kind: "sanic", x: 16.0, y: 0.0),
//!         ]),
//!     ],
//! )
//! ```

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::Path;

use sanic_math::Vec2;
use sanic_physics::VelocityMode;
use serde::{Deserialize, Serialize};

use crate::actor::BuildError;
use crate::tags::CollisionTag;

/// Error type for level loading
#[derive(Debug)]
pub enum LevelLoadError {
    /// IO error reading the level file
    Io(io::Error),
    /// RON parse error
    Parse(ron::error::SpannedError),
    /// The file parsed but describes something unusable
    Invalid(String),
}

impl fmt::Display for LevelLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelLoadError::Io(err) => write!(f, "Level IO error: {}", err),
            LevelLoadError::Parse(err) => write!(f, "Level parse error: {}", err),
            LevelLoadError::Invalid(msg) => write!(f, "Invalid level: {}", msg),
        }
    }
}

impl std::error::Error for LevelLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LevelLoadError::Io(err) => Some(err),
            LevelLoadError::Parse(err) => Some(err),
            LevelLoadError::Invalid(_) => None,
        }
    }
}

impl From<io::Error> for LevelLoadError {
    fn from(err: io::Error) -> Self {
        LevelLoadError::Io(err)
    }
}

impl From<ron::error::SpannedError> for LevelLoadError {
    fn from(err: ron::error::SpannedError) -> Self {
        LevelLoadError::Parse(err)
    }
}

impl From<BuildError> for LevelLoadError {
    fn from(err: BuildError) -> Self {
        LevelLoadError::Invalid(err.to_string())
    }
}

/// Per-shape physics properties; unset fields fall back to defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShapeConfig {
    pub collision_type: Option<CollisionTag>,
    pub elasticity: Option<f32>,
    pub friction: Option<f32>,
    pub layers: Option<u32>,
    pub sensor: Option<bool>,
    /// Rounding radius for polys, thickness for segments
    pub radius: Option<f32>,
}

impl ShapeConfig {
    /// Fill unset fields from `fallback`
    pub fn or(&self, fallback: &ShapeConfig) -> ShapeConfig {
        ShapeConfig {
            collision_type: self.collision_type.or(fallback.collision_type),
            elasticity: self.elasticity.or(fallback.elasticity),
            friction: self.friction.or(fallback.friction),
            layers: self.layers.or(fallback.layers),
            sensor: self.sensor.or(fallback.sensor),
            radius: self.radius.or(fallback.radius),
        }
    }
}

/// Per-object body properties; unset fields fall back to defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BodyConfig {
    /// Attach to the space's static body instead of a body of its own
    #[serde(rename = "static")]
    pub is_static: Option<bool>,
    pub mass: Option<f32>,
    /// Overrides the computed moment
    pub moment: Option<f32>,
    pub angle: Option<f32>,
    /// Shape offset from the body origin
    pub offset: Option<(f32, f32)>,
    pub velocity_mode: Option<VelocityMode>,
}

impl BodyConfig {
    pub fn or(&self, fallback: &BodyConfig) -> BodyConfig {
        BodyConfig {
            is_static: self.is_static.or(fallback.is_static),
            mass: self.mass.or(fallback.mass),
            moment: self.moment.or(fallback.moment),
            angle: self.angle.or(fallback.angle),
            offset: self.offset.or(fallback.offset),
            velocity_mode: self.velocity_mode.or(fallback.velocity_mode),
        }
    }
}

/// Default properties for one shape category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShapeTemplate {
    pub shape: ShapeConfig,
    pub body: BodyConfig,
}

/// Level-wide defaults per shape category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShapeDefaults {
    #[serde(rename = "box")]
    pub boxes: ShapeTemplate,
    pub poly: ShapeTemplate,
    pub circle: ShapeTemplate,
    pub segment: ShapeTemplate,
}

/// A typed level object
///
/// `Poly` and `Segment` points are relative to the object's `x`/`y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum LevelObject {
    Box {
        #[serde(default)]
        name: Option<String>,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        #[serde(default)]
        shape: ShapeConfig,
        #[serde(default)]
        body: BodyConfig,
    },
    Poly {
        #[serde(default)]
        name: Option<String>,
        x: f32,
        y: f32,
        points: Vec<(f32, f32)>,
        #[serde(default)]
        shape: ShapeConfig,
        #[serde(default)]
        body: BodyConfig,
    },
    Circle {
        #[serde(default)]
        name: Option<String>,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        #[serde(default)]
        shape: ShapeConfig,
        #[serde(default)]
        body: BodyConfig,
    },
    Segment {
        #[serde(default)]
        name: Option<String>,
        x: f32,
        y: f32,
        points: Vec<(f32, f32)>,
        #[serde(default)]
        shape: ShapeConfig,
        #[serde(default)]
        body: BodyConfig,
    },
    /// Non-physical point of interest such as a spawn
    Marker {
        #[serde(default)]
        name: Option<String>,
        kind: String,
        x: f32,
        y: f32,
    },
}

impl LevelObject {
    pub fn name(&self) -> Option<&str> {
        match self {
            LevelObject::Box { name, .. }
            | LevelObject::Poly { name, .. }
            | LevelObject::Circle { name, .. }
            | LevelObject::Segment { name, .. }
            | LevelObject::Marker { name, .. } => name.as_deref(),
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, LevelObject::Marker { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectGroup {
    pub name: String,
    #[serde(default)]
    pub objects: Vec<LevelObject>,
}

/// One layer of tiles, one string per row, one char per tile
///
/// Chars missing from the palette (conventionally `.`) are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TileLayer {
    pub name: String,
    pub rows: Vec<String>,
}

/// A spawn or other marker in map coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerData<'a> {
    pub kind: &'a str,
    pub name: Option<&'a str>,
    pub position: Vec2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelData {
    pub name: String,
    /// Map width in tiles
    pub width: u32,
    /// Map height in tiles
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    #[serde(default)]
    pub palette: HashMap<char, [f32; 4]>,
    #[serde(default)]
    pub tiles: Vec<TileLayer>,
    #[serde(default)]
    pub defaults: ShapeDefaults,
    #[serde(default)]
    pub object_groups: Vec<ObjectGroup>,
    /// Fill colour for moving platforms
    #[serde(default = "default_platform_color")]
    pub platform_color: [f32; 4],
}

fn default_platform_color() -> [f32; 4] {
    [0.55, 0.45, 0.35, 1.0]
}

impl LevelData {
    /// Load a level from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelLoadError> {
        let path = path.as_ref();
        log::info!("Loading level from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron(&contents)
    }

    /// Parse and validate a level held in memory
    pub fn from_ron(source: &str) -> Result<Self, LevelLoadError> {
        let level: LevelData = ron::from_str(source)?;
        level.validate()?;
        Ok(level)
    }

    /// Map width in pixels
    pub fn pixel_width(&self) -> f32 {
        (self.width * self.tile_width) as f32
    }

    /// Map height in pixels
    pub fn pixel_height(&self) -> f32 {
        (self.height * self.tile_height) as f32
    }

    /// Convert a map (y-down) point to physics space (y-up)
    pub fn to_world(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new(x, self.pixel_height() - y)
    }

    /// Every marker in every group, in file order
    pub fn markers(&self) -> impl Iterator<Item = MarkerData<'_>> + '_ {
        self.object_groups
            .iter()
            .flat_map(|group| group.objects.iter())
            .filter_map(|object| match object {
                LevelObject::Marker { name, kind, x, y } => Some(MarkerData {
                    kind: kind.as_str(),
                    name: name.as_deref(),
                    position: Vec2::new(*x, *y),
                }),
                _ => None,
            })
    }

    /// First marker of the given kind, case-insensitive
    pub fn find_marker(&self, kind: &str) -> Option<MarkerData<'_>> {
        self.markers().find(|m| m.kind.eq_ignore_ascii_case(kind))
    }

    fn validate(&self) -> Result<(), LevelLoadError> {
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(LevelLoadError::Invalid("tile size must be non-zero".to_string()));
        }
        for layer in &self.tiles {
            if layer.rows.len() > self.height as usize {
                return Err(LevelLoadError::Invalid(format!(
                    "tile layer '{}' has {} rows, map is {} tall",
                    layer.name,
                    layer.rows.len(),
                    self.height
                )));
            }
            if let Some(row) = layer.rows.iter().find(|r| r.chars().count() > self.width as usize) {
                return Err(LevelLoadError::Invalid(format!(
                    "tile layer '{}' row '{}' is wider than the map",
                    layer.name, row
                )));
            }
        }
        Ok(())
    }
}

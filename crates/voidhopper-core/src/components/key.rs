//! Spatial keys: the deterministic `world:x:y:z` identity of a block.

use super::common::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Integer block coordinates inside a named world.
///
/// Nodes and link endpoints are both identified this way. The string form
/// produced by `Display` is what the persistence file and portable records
/// store, and `FromStr` is its exact inverse for every key whose world name
/// is encodable (see [`BlockKey::try_new`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockKey {
    pub world: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// Characters that separate keys and their parts in stored text
pub const RESERVED_WORLD_CHARS: [char; 3] = [':', ';', ','];

/// Check that a world name survives the text form unchanged
pub fn validate_world_name(name: &str) -> Result<(), KeyParseError> {
    if name.is_empty() {
        return Err(KeyParseError::EmptyWorld);
    }
    if name.contains(&RESERVED_WORLD_CHARS[..]) {
        return Err(KeyParseError::ReservedCharacter(name.to_string()));
    }
    Ok(())
}

impl BlockKey {
    /// Unchecked constructor for names the host already vouches for.
    /// Registry entry points refuse keys that fail [`Self::is_encodable`].
    pub fn new(world: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }

    /// Validating constructor
    pub fn try_new(
        world: impl Into<String>,
        x: i32,
        y: i32,
        z: i32,
    ) -> Result<Self, KeyParseError> {
        let world = world.into();
        validate_world_name(&world)?;
        Ok(Self { world, x, y, z })
    }

    /// Whether `Display` followed by `FromStr` reproduces this key
    pub fn is_encodable(&self) -> bool {
        validate_world_name(&self.world).is_ok()
    }

    /// Chunk column containing this block (16x16 columns)
    pub fn chunk(&self) -> (i32, i32) {
        (self.x >> 4, self.z >> 4)
    }

    /// Centre of the block in world space
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            self.x as f64 + 0.5,
            self.y as f64 + 0.5,
            self.z as f64 + 0.5,
        )
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}:{}", self.world, self.x, self.y, self.z)
    }
}

/// Why a key string could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    #[error("expected 4 ':'-separated parts, found {0}")]
    WrongPartCount(usize),
    #[error("empty world name")]
    EmptyWorld,
    #[error("world name '{0}' contains a reserved separator")]
    ReservedCharacter(String),
    #[error("malformed coordinate '{0}'")]
    BadCoordinate(String),
}

impl FromStr for BlockKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 4 {
            return Err(KeyParseError::WrongPartCount(parts.len()));
        }
        validate_world_name(parts[0])?;

        let coord = |raw: &str| {
            raw.parse::<i32>()
                .map_err(|_| KeyParseError::BadCoordinate(raw.to_string()))
        };

        Ok(Self {
            world: parts[0].to_string(),
            x: coord(parts[1])?,
            y: coord(parts[2])?,
            z: coord(parts[3])?,
        })
    }
}

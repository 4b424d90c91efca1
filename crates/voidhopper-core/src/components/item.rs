//! Loose resource units: kinds, stacks and the ECS components a dropped
//! unit carries in the host world.

use super::common::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of a resource kind, e.g. `COBBLESTONE`.
///
/// Tokens are trimmed and upper-cased on parse; anything outside
/// `[A-Z0-9_]` is rejected so a persisted filter cannot smuggle in
/// separators used by the portable tag format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceKind(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceKindError {
    #[error("empty resource kind")]
    Empty,
    #[error("invalid resource kind '{0}'")]
    Invalid(String),
}

impl ResourceKind {
    pub fn new(token: &str) -> Result<Self, ResourceKindError> {
        let normalized = token.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(ResourceKindError::Empty);
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(ResourceKindError::Invalid(token.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResourceKind {
    type Err = ResourceKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ResourceKind {
    type Error = ResourceKindError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<ResourceKind> for String {
    fn from(kind: ResourceKind) -> Self {
        kind.0
    }
}

/// A quantity of one resource kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub kind: ResourceKind,
    pub amount: u32,
}

impl ItemStack {
    pub fn new(kind: ResourceKind, amount: u32) -> Self {
        Self { kind, amount }
    }

    pub fn is_empty(&self) -> bool {
        self.amount == 0
    }

    /// Same kind, different amount
    pub fn with_amount(&self, amount: u32) -> Self {
        Self {
            kind: self.kind.clone(),
            amount,
        }
    }
}

// ---------------------------------------------------------------------------
// ECS components for dropped units in `SimWorld`
// ---------------------------------------------------------------------------

/// Marks an entity as a loose unit lying in the named world
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedItem {
    pub world: String,
}

/// World-space position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position(pub Vec3);

/// Velocity in blocks per tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity(pub Vec3);

/// Remaining ticks before a player may pick the unit up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PickupDelay(pub u32);

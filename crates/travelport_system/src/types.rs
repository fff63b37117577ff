//! # Core Type Definitions
//!
//! Small value types shared by every module: port identifiers, positions and
//! the per-tick player snapshot the host hands to the plugin.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a TravelPort.
///
/// Assigned once by the registry (lowest unused non-negative integer) and
/// never reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortId(pub u32);

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 3D position in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// What the host reports about one online player each tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    /// Player name, the identity used by access lists and presence records
    pub name: String,
    /// World the player currently stands in
    pub world: String,
    /// Current position
    pub position: Vec3,
}

impl PlayerSnapshot {
    pub fn new(name: impl Into<String>, world: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            world: world.into(),
            position,
        }
    }
}

/// Fully resolved teleport target handed to [`Host::teleport`](crate::host::Host::teleport).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeleportTarget {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
}

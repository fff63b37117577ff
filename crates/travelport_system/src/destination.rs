//! Teleport destinations.
//!
//! A [`Destination`] is immutable; ports replace theirs wholesale.
//!
//! Persisted form:
//!
//! ```text
//! Destination{locx=1.5,locy=64,locz=-3.5,pitch=0,yaw=90,world=world}
//! ```

use crate::error::TravelError;
use crate::record::{format_record, RecordFields};
use crate::types::TeleportTarget;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

const DESTINATION_TYPE: &str = "Destination";

/// A point in a world plus the orientation players face on arrival.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Destination {
    world: String,
    x: f64,
    y: f64,
    z: f64,
    yaw: f32,
    pitch: f32,
}

impl Destination {
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64, yaw: f32, pitch: f32) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
            yaw,
            pitch,
        }
    }

    pub fn world(&self) -> &str {
        &self.world
    }

    /// The target the host should teleport a player to.
    pub fn resolve_teleport_target(&self) -> TeleportTarget {
        TeleportTarget {
            world: self.world.clone(),
            x: self.x,
            y: self.y,
            z: self.z,
            yaw: self.yaw,
            pitch: self.pitch,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = format_record(
            DESTINATION_TYPE,
            &[
                ("locx", self.x.to_string()),
                ("locy", self.y.to_string()),
                ("locz", self.z.to_string()),
                ("pitch", self.pitch.to_string()),
                ("yaw", self.yaw.to_string()),
                ("world", self.world.clone()),
            ],
        );
        f.write_str(&text)
    }
}

impl FromStr for Destination {
    type Err = TravelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let record = RecordFields::parse(s, DESTINATION_TYPE)?;
        let world = record.get("world")?;
        if world.is_empty() {
            return Err(TravelError::syntax("empty world", s));
        }
        let destination = Self::new(
            world,
            record.parse_field("locx")?,
            record.parse_field("locy")?,
            record.parse_field("locz")?,
            record.parse_field("yaw")?,
            record.parse_field("pitch")?,
        );
        let finite = [destination.x, destination.y, destination.z]
            .iter()
            .all(|c| c.is_finite())
            && destination.yaw.is_finite()
            && destination.pitch.is_finite();
        if !finite {
            return Err(TravelError::syntax("non-finite coordinate", s));
        }
        Ok(destination)
    }
}

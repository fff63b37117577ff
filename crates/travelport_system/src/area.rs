//! # Areas
//!
//! Geometric containment predicates bound to a single world. The only shape is
//! the axis-aligned [`CuboidArea`]; [`Area`] wraps it so new shapes stay an
//! exhaustive `match` away.
//!
//! Persisted form:
//!
//! ```text
//! CuboidArea{highx=10,lowx=0,highy=70,lowy=64,highz=5,lowz=-5,world=world}
//! ```

use crate::error::TravelError;
use crate::record::{format_record, RecordFields};
use crate::types::Vec3;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

const CUBOID_TYPE: &str = "CuboidArea";

/// A volume of one world that may contain players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Area {
    Cuboid(CuboidArea),
}

impl Area {
    /// Returns true if `position` in `world` lies inside this area.
    pub fn contains(&self, world: &str, position: &Vec3) -> bool {
        match self {
            Area::Cuboid(cuboid) => cuboid.contains(world, position),
        }
    }

    /// Number of blocks covered, used to rank overlapping areas.
    pub fn volume(&self) -> u64 {
        match self {
            Area::Cuboid(cuboid) => cuboid.volume(),
        }
    }

    pub fn world(&self) -> &str {
        match self {
            Area::Cuboid(cuboid) => &cuboid.world,
        }
    }
}

impl From<CuboidArea> for Area {
    fn from(cuboid: CuboidArea) -> Self {
        Area::Cuboid(cuboid)
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Area::Cuboid(cuboid) => fmt::Display::fmt(cuboid, f),
        }
    }
}

impl FromStr for Area {
    type Err = TravelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim_start().starts_with(CUBOID_TYPE) {
            Ok(Area::Cuboid(s.parse()?))
        } else {
            Err(TravelError::syntax("unknown area type", s))
        }
    }
}

/// Axis-aligned box of blocks with inclusive bounds.
///
/// Bounds are normalized on construction, so the corner order passed to
/// [`CuboidArea::new`] never changes the result of [`CuboidArea::contains`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CuboidArea {
    world: String,
    low: [i32; 3],
    high: [i32; 3],
}

impl CuboidArea {
    /// Creates a cuboid spanning two arbitrary corners.
    pub fn new(world: impl Into<String>, corner_a: [i32; 3], corner_b: [i32; 3]) -> Self {
        let mut low = [0; 3];
        let mut high = [0; 3];
        for axis in 0..3 {
            low[axis] = corner_a[axis].min(corner_b[axis]);
            high[axis] = corner_a[axis].max(corner_b[axis]);
        }
        Self {
            world: world.into(),
            low,
            high,
        }
    }

    pub fn world(&self) -> &str {
        &self.world
    }

    pub fn low(&self) -> [i32; 3] {
        self.low
    }

    pub fn high(&self) -> [i32; 3] {
        self.high
    }

    /// World is matched first; then each axis of the containing block is
    /// checked against the inclusive bounds.
    pub fn contains(&self, world: &str, position: &Vec3) -> bool {
        if self.world != world {
            return false;
        }
        let block = [position.x, position.y, position.z].map(|c| c.floor() as i64);
        (0..3).all(|axis| {
            i64::from(self.low[axis]) <= block[axis] && block[axis] <= i64::from(self.high[axis])
        })
    }

    pub fn volume(&self) -> u64 {
        (0..3)
            .map(|axis| (i64::from(self.high[axis]) - i64::from(self.low[axis]) + 1) as u64)
            .fold(1u64, u64::saturating_mul)
    }
}

impl fmt::Display for CuboidArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = format_record(
            CUBOID_TYPE,
            &[
                ("highx", self.high[0].to_string()),
                ("lowx", self.low[0].to_string()),
                ("highy", self.high[1].to_string()),
                ("lowy", self.low[1].to_string()),
                ("highz", self.high[2].to_string()),
                ("lowz", self.low[2].to_string()),
                ("world", self.world.clone()),
            ],
        );
        f.write_str(&text)
    }
}

impl FromStr for CuboidArea {
    type Err = TravelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let record = RecordFields::parse(s, CUBOID_TYPE)?;
        let world = record.get("world")?;
        if world.is_empty() {
            return Err(TravelError::syntax("empty world", s));
        }
        Ok(Self::new(
            world,
            [
                record.parse_field("lowx")?,
                record.parse_field("lowy")?,
                record.parse_field("lowz")?,
            ],
            [
                record.parse_field("highx")?,
                record.parse_field("highy")?,
                record.parse_field("highz")?,
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_order_does_not_matter() {
        let a = [10, 64, -3];
        let b = [-2, 70, 8];
        let forward = CuboidArea::new("world", a, b);
        let backward = CuboidArea::new("world", b, a);
        assert_eq!(forward, backward);
        assert_eq!(forward.low(), [-2, 64, -3]);
        assert_eq!(forward.high(), [10, 70, 8]);

        for point in [
            Vec3::new(0.5, 65.0, 0.0),
            Vec3::new(-2.0, 64.0, -3.0),
            Vec3::new(10.9, 70.9, 8.9),
            Vec3::new(11.0, 65.0, 0.0),
            Vec3::new(-2.1, 65.0, 0.0),
        ] {
            assert_eq!(
                forward.contains("world", &point),
                backward.contains("world", &point)
            );
        }
    }

    #[test]
    fn test_corner_order_does_not_matter_for_generated_corners() {
        // small linear congruential generator; deterministic across runs
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        let mut next = |range: i32| -> i32 {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            ((seed >> 33) % (2 * range as u64 + 1)) as i32 - range
        };

        for _ in 0..200 {
            let a = [next(20), next(20), next(20)];
            let b = [next(20), next(20), next(20)];
            let forward = CuboidArea::new("world", a, b);
            let backward = CuboidArea::new("world", b, a);
            assert_eq!(forward, backward);

            for _ in 0..20 {
                let point = Vec3::new(
                    f64::from(next(24)) + 0.5,
                    f64::from(next(24)),
                    f64::from(next(24)) + 0.25,
                );
                let block = [point.x.floor() as i32, point.y.floor() as i32, point.z.floor() as i32];
                let expected = (0..3).all(|axis| {
                    a[axis].min(b[axis]) <= block[axis] && block[axis] <= a[axis].max(b[axis])
                });
                assert_eq!(forward.contains("world", &point), expected);
                assert_eq!(backward.contains("world", &point), expected);
            }
        }
    }

    #[test]
    fn test_contains_inclusive_bounds() {
        let cuboid = CuboidArea::new("world", [0, 0, 0], [2, 2, 2]);
        assert!(cuboid.contains("world", &Vec3::new(0.0, 0.0, 0.0)));
        assert!(cuboid.contains("world", &Vec3::new(2.99, 2.5, 2.0)));
        assert!(!cuboid.contains("world", &Vec3::new(3.0, 1.0, 1.0)));
        assert!(!cuboid.contains("world", &Vec3::new(-0.01, 1.0, 1.0)));
    }

    #[test]
    fn test_contains_is_world_scoped() {
        let cuboid = CuboidArea::new("world", [0, 0, 0], [5, 5, 5]);
        assert!(!cuboid.contains("world_nether", &Vec3::new(1.0, 1.0, 1.0)));
    }

    #[test]
    fn test_volume() {
        let cuboid = CuboidArea::new("world", [0, 0, 0], [1, 2, 3]);
        assert_eq!(cuboid.volume(), 2 * 3 * 4);
        assert_eq!(Area::from(cuboid).volume(), 24);
    }

    #[test]
    fn test_text_form() {
        let area = Area::from(CuboidArea::new("world", [10, 70, 5], [0, 64, -5]));
        assert_eq!(
            area.to_string(),
            "CuboidArea{highx=10,lowx=0,highy=70,lowy=64,highz=5,lowz=-5,world=world}"
        );
    }

    #[test]
    fn test_round_trip_with_negative_coordinates() {
        for (a, b) in [
            ([-100, -64, -100], [-1, -1, -1]),
            ([i32::MIN, 0, 5], [i32::MAX, 0, -5]),
            ([3, 3, 3], [3, 3, 3]),
        ] {
            let area = Area::from(CuboidArea::new("the_end", a, b));
            let parsed: Area = area.to_string().parse().unwrap();
            assert_eq!(parsed, area);
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!("Sphere{r=3}".parse::<Area>().is_err());
        assert!("CuboidArea{highx=1,lowx=0,highy=1,lowy=0,highz=1,world=w}"
            .parse::<Area>()
            .is_err());
        assert!("CuboidArea{highx=a,lowx=0,highy=1,lowy=0,highz=1,lowz=0,world=w}"
            .parse::<Area>()
            .is_err());
    }
}

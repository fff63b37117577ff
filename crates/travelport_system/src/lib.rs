//! # TravelPort System
//!
//! Core of the EasyTravel game-server plugin: cuboid regions ("TravelPorts")
//! that send the players standing in them to a linked partner port, with
//! optional fares, passwords, access lists and timed departures.
//!
//! ## Core Features
//!
//! - **World-scoped areas**: cuboids normalised from any two corners
//! - **Symmetric links**: the [`Registry`] is the only place links change
//! - **Departure policies**: manual, fixed interval, or fixed times of day
//! - **Fare gate**: per-player permission and economy checks, with refunds
//!   when a booked journey is cancelled
//! - **Flat-file persistence**: one `;`-delimited line per port
//!
//! ## Architecture Overview
//!
//! The host adapter implements [`Host`], [`Permissions`] and optionally
//! [`Economy`], builds an [`EasyTravel`] from a [`TravelConfig`] and calls
//! [`EasyTravel::tick`] once per server tick:
//!
//! ```text
//! host tick ─▶ PresenceTracker ─▶ Departure (per port) ─▶ TravelPort::depart
//!                                                            │
//!                         Host::teleport ◀── DelayedTasks ◀──┘
//! ```
//!
//! Everything runs on the host's tick thread; no type here spawns threads or
//! blocks outside of [`EasyTravel::load`] and [`EasyTravel::save`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use travelport_system::*;
//!
//! struct Console;
//! impl Host for Console {
//!     fn send_message(&self, player: &str, message: &str) {
//!         println!("[{player}] {message}");
//!     }
//!     fn teleport(&self, _player: &str, _target: &TeleportTarget) -> bool {
//!         true
//!     }
//! }
//!
//! fn main() -> Result<(), TravelError> {
//!     let mut plugin = EasyTravel::new(TravelConfig::default(), Box::new(Console), Box::new(AllowAll));
//!     plugin.load()?;
//!
//!     let spawn = plugin
//!         .registry_mut()
//!         .create("Spawn", CuboidArea::new("world", [0, 60, 0], [10, 70, 10]).into())
//!         .id();
//!     let harbour = plugin
//!         .registry_mut()
//!         .create("Harbour", CuboidArea::new("world", [500, 60, 0], [510, 70, 10]).into())
//!         .id();
//!     plugin.registry_mut().link(spawn, harbour)?;
//!     plugin.set_departure(spawn, "every 2h".parse()?)?;
//!
//!     plugin.player_joined("alice");
//!     let alice = PlayerSnapshot::new("alice", "world", Vec3::new(5.0, 61.0, 5.0));
//!     plugin.tick(0, &[alice]);
//!     plugin.save()
//! }
//! ```

pub mod area;
pub mod config;
pub mod departure;
pub mod destination;
pub mod error;
pub mod host;
pub mod plugin;
pub mod port;
pub mod presence;
pub mod record;
pub mod registry;
pub mod scheduler;
pub mod store;
pub mod time;
pub mod types;


pub use area::{Area, CuboidArea};
pub use config::{Messages, PermissionSettings, TravelConfig};
pub use departure::{CommandOutcome, Departure, IntervalDeparture, ScheduledDeparture};
pub use destination::Destination;
pub use error::TravelError;
pub use host::{AllowAll, Economy, Host, Permissions};
pub use plugin::{EasyTravel, TravelTask};
pub use port::{Boarding, DepartContext, TravelPort};
pub use presence::{Presence, PresenceChange, PresenceTracker};
pub use registry::{LinkProblem, LoadSummary, Registry};
pub use scheduler::{DelayedTasks, TaskHandle};
pub use store::{FlatFileStore, LoadReport, PortStore, SkippedLine};
pub use time::{GameDuration, TimeOfDay, TICKS_PER_DAY, TICKS_PER_HOUR};
pub use types::{PlayerSnapshot, PortId, TeleportTarget, Vec3};

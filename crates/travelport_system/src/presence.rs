//! Per-player presence: which TravelPort a player stands in and the last
//! password they typed.
//!
//! The tracker is fed one [`PlayerSnapshot`] per online player per tick and
//! reports entry/exit transitions; it never talks to departure policies
//! itself. A player stays with their current port as long as its area still
//! contains them, even if a smaller overlapping area would win a fresh
//! lookup.

use crate::registry::Registry;
use crate::types::{PlayerSnapshot, PortId};
use std::collections::HashMap;
use tracing::debug;

/// Transient state of one connected player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presence {
    pub port: Option<PortId>,
    pub password: Option<String>,
}

/// Transitions produced by one [`PresenceTracker::update`].
///
/// Both may be set when a player steps straight from one port into another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresenceChange {
    pub left: Option<PortId>,
    pub entered: Option<PortId>,
}

impl PresenceChange {
    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.entered.is_none()
    }
}

#[derive(Debug, Default)]
pub struct PresenceTracker {
    players: HashMap<String, Presence>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a player with no port and no password.
    pub fn join(&mut self, player: &str) {
        self.players.insert(player.to_string(), Presence::default());
    }

    /// Stops tracking a player, returning their last state.
    pub fn quit(&mut self, player: &str) -> Option<Presence> {
        self.players.remove(player)
    }

    pub fn is_online(&self, player: &str) -> bool {
        self.players.contains_key(player)
    }

    pub fn get(&self, player: &str) -> Option<&Presence> {
        self.players.get(player)
    }

    pub fn port_of(&self, player: &str) -> Option<PortId> {
        self.players.get(player).and_then(|presence| presence.port)
    }

    /// Sets the current port without reporting a transition.
    pub fn set_port(&mut self, player: &str, port: Option<PortId>) {
        self.players.entry(player.to_string()).or_default().port = port;
    }

    pub fn set_password(&mut self, player: &str, password: Option<String>) {
        self.players.entry(player.to_string()).or_default().password = password;
    }

    pub fn password(&self, player: &str) -> Option<&str> {
        self.players
            .get(player)
            .and_then(|presence| presence.password.as_deref())
    }

    /// Players currently tracked in `port`, in name order.
    pub fn players_in(&self, port: PortId) -> Vec<String> {
        let mut players: Vec<String> = self
            .players
            .iter()
            .filter(|(_, presence)| presence.port == Some(port))
            .map(|(name, _)| name.clone())
            .collect();
        players.sort();
        players
    }

    /// Clears `port` from every player standing in it; returns those players.
    pub fn forget_port(&mut self, port: PortId) -> Vec<String> {
        let players = self.players_in(port);
        for player in &players {
            if let Some(presence) = self.players.get_mut(player) {
                presence.port = None;
            }
        }
        players
    }

    /// Clears every player's port, keeping passwords.
    pub fn clear_ports(&mut self) {
        for presence in self.players.values_mut() {
            presence.port = None;
        }
    }

    /// Re-evaluates one player's position against the registry.
    pub fn update(&mut self, snapshot: &PlayerSnapshot, registry: &Registry) -> PresenceChange {
        let presence = self.players.entry(snapshot.name.clone()).or_default();
        let mut change = PresenceChange::default();

        if let Some(current) = presence.port {
            let still_inside = registry
                .get(current)
                .map(|port| port.area().contains(&snapshot.world, &snapshot.position))
                .unwrap_or(false);
            if still_inside {
                return change;
            }
            debug!("🚶 {} left TravelPort {}", snapshot.name, current);
            presence.port = None;
            change.left = Some(current);
        }

        if let Some(port) = registry.port_at(&snapshot.world, &snapshot.position) {
            debug!("🚪 {} entered TravelPort {}", snapshot.name, port.id());
            presence.port = Some(port.id());
            change.entered = Some(port.id());
        }

        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::CuboidArea;
    use crate::types::Vec3;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.create("plaza", CuboidArea::new("world", [0, 0, 0], [20, 20, 20]).into());
        registry.create("booth", CuboidArea::new("world", [5, 5, 5], [6, 6, 6]).into());
        registry.create("harbour", CuboidArea::new("world", [100, 0, 0], [110, 10, 10]).into());
        registry
    }

    fn at(x: f64, y: f64, z: f64) -> PlayerSnapshot {
        PlayerSnapshot::new("alice", "world", Vec3::new(x, y, z))
    }

    #[test]
    fn test_enter_and_leave() {
        let registry = registry();
        let mut tracker = PresenceTracker::new();
        tracker.join("alice");

        assert!(tracker.update(&at(50.0, 1.0, 1.0), &registry).is_empty());

        let change = tracker.update(&at(105.0, 1.0, 1.0), &registry);
        assert_eq!(change.entered, Some(PortId(2)));
        assert_eq!(tracker.port_of("alice"), Some(PortId(2)));

        assert!(tracker.update(&at(106.0, 2.0, 2.0), &registry).is_empty());

        let change = tracker.update(&at(50.0, 1.0, 1.0), &registry);
        assert_eq!(change.left, Some(PortId(2)));
        assert_eq!(change.entered, None);
        assert_eq!(tracker.port_of("alice"), None);
    }

    #[test]
    fn test_other_world_is_outside() {
        let registry = registry();
        let mut tracker = PresenceTracker::new();
        let snapshot = PlayerSnapshot::new("alice", "nether", Vec3::new(105.0, 1.0, 1.0));
        assert!(tracker.update(&snapshot, &registry).is_empty());
    }

    #[test]
    fn test_smallest_area_wins_on_entry() {
        let registry = registry();
        let mut tracker = PresenceTracker::new();
        let change = tracker.update(&at(5.5, 5.5, 5.5), &registry);
        assert_eq!(change.entered, Some(PortId(1)));
    }

    #[test]
    fn test_current_port_is_sticky() {
        let registry = registry();
        let mut tracker = PresenceTracker::new();
        tracker.update(&at(1.0, 1.0, 1.0), &registry);
        assert_eq!(tracker.port_of("alice"), Some(PortId(0)));

        assert!(tracker.update(&at(5.5, 5.5, 5.5), &registry).is_empty());
        assert_eq!(tracker.port_of("alice"), Some(PortId(0)));
    }

    #[test]
    fn test_step_from_one_port_into_another() {
        let registry = registry();
        let mut tracker = PresenceTracker::new();
        tracker.update(&at(5.5, 5.5, 5.5), &registry);

        let change = tracker.update(&at(10.0, 10.0, 10.0), &registry);
        assert_eq!(change.left, Some(PortId(1)));
        assert_eq!(change.entered, Some(PortId(0)));
    }

    #[test]
    fn test_removed_port_counts_as_left() {
        let mut registry = registry();
        let mut tracker = PresenceTracker::new();
        tracker.update(&at(105.0, 1.0, 1.0), &registry);
        registry.remove(PortId(2)).unwrap();

        let change = tracker.update(&at(105.0, 1.0, 1.0), &registry);
        assert_eq!(change.left, Some(PortId(2)));
        assert_eq!(change.entered, None);
    }

    #[test]
    fn test_password_and_forget_port() {
        let mut tracker = PresenceTracker::new();
        tracker.join("alice");
        tracker.join("bob");
        tracker.set_password("alice", Some("sesame".to_string()));
        tracker.set_port("alice", Some(PortId(3)));
        tracker.set_port("bob", Some(PortId(3)));

        assert_eq!(tracker.password("alice"), Some("sesame"));
        assert_eq!(tracker.players_in(PortId(3)), vec!["alice", "bob"]);
        assert_eq!(tracker.forget_port(PortId(3)), vec!["alice", "bob"]);
        assert_eq!(tracker.port_of("bob"), None);

        let last = tracker.quit("alice").unwrap();
        assert_eq!(last.password.as_deref(), Some("sesame"));
        assert!(!tracker.is_online("alice"));
    }
}

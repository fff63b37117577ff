//! # TravelPort
//!
//! The aggregate a player stands in: an [`Area`], an optional
//! [`Destination`], the link to a partner port, access control, fare,
//! password and [`Departure`] policy.
//!
//! Link symmetry is not enforced here; only the
//! [`Registry`](crate::registry::Registry) may change the target id.

use crate::area::Area;
use crate::config::{Messages, TravelConfig};
use crate::departure::{self, CommandOutcome, Departure};
use crate::destination::Destination;
use crate::error::TravelError;
use crate::host::{Economy, Host, Permissions};
use crate::types::{PortId, TeleportTarget};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// A named, owned region that sends players to its linked partner.
#[derive(Debug, Clone, Serialize)]
pub struct TravelPort {
    id: PortId,
    name: String,
    owner: Option<String>,
    area: Area,
    destination: Option<Destination>,
    target: Option<PortId>,
    #[serde(skip)]
    password: Option<String>,
    price: f64,
    allowed: BTreeSet<String>,
    #[serde(serialize_with = "departure::serialize_description")]
    departure: Departure,
}

/// A player who passed the fare gate, with what they paid.
#[derive(Debug, Clone, PartialEq)]
pub struct Boarding {
    pub player: String,
    pub fare: f64,
}

/// Collaborators consulted while boarding players.
pub struct DepartContext<'a> {
    pub config: &'a TravelConfig,
    pub host: &'a dyn Host,
    pub permissions: &'a dyn Permissions,
    pub economy: Option<&'a dyn Economy>,
}

impl TravelPort {
    /// Creates an unlinked, free, open port with manual departure.
    pub fn new(id: PortId, name: impl Into<String>, area: Area) -> Self {
        Self {
            id,
            name: name.into(),
            owner: None,
            area,
            destination: None,
            target: None,
            password: None,
            price: 0.0,
            allowed: BTreeSet::new(),
            departure: Departure::Manual,
        }
    }

    pub fn id(&self) -> PortId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn set_owner(&mut self, owner: Option<String>) {
        self.owner = owner;
    }

    pub fn area(&self) -> &Area {
        &self.area
    }

    pub fn set_area(&mut self, area: Area) {
        self.area = area;
    }

    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref()
    }

    pub fn set_destination(&mut self, destination: Option<Destination>) {
        self.destination = destination;
    }

    /// Id of the linked partner port.
    pub fn target(&self) -> Option<PortId> {
        self.target
    }

    pub(crate) fn set_target(&mut self, target: Option<PortId>) {
        self.target = target;
    }

    pub fn is_linked(&self) -> bool {
        self.target.is_some()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn set_password(&mut self, password: Option<String>) {
        self.password = password;
    }

    pub fn is_password_locked(&self) -> bool {
        self.password.is_some()
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn set_price(&mut self, price: f64) -> Result<(), TravelError> {
        if !price.is_finite() || price < 0.0 {
            return Err(TravelError::InvalidPrice(price));
        }
        self.price = price;
        Ok(())
    }

    /// Player and group names allowed to travel; empty means everybody.
    pub fn allowed(&self) -> &BTreeSet<String> {
        &self.allowed
    }

    pub fn allow(&mut self, name: impl Into<String>) -> bool {
        self.allowed.insert(name.into())
    }

    pub fn disallow(&mut self, name: &str) -> bool {
        let before = self.allowed.len();
        self.allowed.retain(|entry| !entry.eq_ignore_ascii_case(name));
        self.allowed.len() != before
    }

    pub fn departure(&self) -> &Departure {
        &self.departure
    }

    pub fn departure_mut(&mut self) -> &mut Departure {
        &mut self.departure
    }

    /// Replaces the policy; the new one starts with an empty queue.
    pub fn set_departure(&mut self, departure: Departure) {
        self.departure = departure;
    }

    /// Where players arriving at this port are put.
    pub fn teleport_target(&self) -> Result<TeleportTarget, TravelError> {
        self.destination
            .as_ref()
            .map(Destination::resolve_teleport_target)
            .ok_or(TravelError::MissingDestination(self.id))
    }

    /// True iff the player has the base travel permission and either the
    /// access list is empty or it names the player or their group.
    pub fn is_allowed(&self, permissions: &dyn Permissions, capability: &str, player: &str) -> bool {
        if !permissions.has_permission(player, capability) {
            return false;
        }
        if self.allowed.is_empty() {
            return true;
        }
        let group = permissions.group(player);
        self.allowed.iter().any(|entry| {
            entry.eq_ignore_ascii_case(player)
                || group.as_deref().is_some_and(|g| entry.eq_ignore_ascii_case(g))
        })
    }

    /// Travel command from a player standing in this port.
    pub fn command(&self, player: &str, supplied: Option<&str>, now: u64) -> Result<CommandOutcome, TravelError> {
        self.departure
            .on_command(player, supplied, self.password.as_deref(), now)
    }

    /// Runs the access and fare gate over `players`.
    ///
    /// Each player is checked on their own: a rejected player is told why and
    /// dropped, the others carry on. Returns the players that boarded.
    pub fn depart(&self, players: Vec<String>, ctx: &DepartContext<'_>) -> Vec<Boarding> {
        let messages = &ctx.config.messages;
        let price = self.price.to_string();
        let mut boarded = Vec::with_capacity(players.len());

        for player in players {
            if !self.is_allowed(ctx.permissions, &ctx.config.permissions.depart, &player) {
                let text = Messages::render(&messages.not_allowed, &[("name", self.name.as_str())]);
                ctx.host.send_message(&player, &text);
                continue;
            }

            let mut fare = 0.0;
            if self.price > 0.0 {
                let Some(economy) = ctx.economy else {
                    let text = Messages::render(&messages.economy_unavailable, &[("name", self.name.as_str())]);
                    ctx.host.send_message(&player, &text);
                    continue;
                };
                let currency = economy.currency();
                let values = [
                    ("name", self.name.as_str()),
                    ("price", price.as_str()),
                    ("currency", currency.as_str()),
                ];
                if !economy.pay(&player, self.price) {
                    ctx.host
                        .send_message(&player, &Messages::render(&messages.insufficient_funds, &values));
                    continue;
                }
                ctx.host
                    .send_message(&player, &Messages::render(&messages.paid, &values));
                fare = self.price;
            }

            if ctx.config.depart_delay_ticks > 0 {
                let text = Messages::render(&messages.departing, &[("name", self.name.as_str())]);
                ctx.host.send_message(&player, &text);
            }

            debug!("🧳 Port {} boarded {} (fare {})", self.id, player, fare);
            boarded.push(Boarding { player, fare });
        }

        boarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::CuboidArea;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct MockHost {
        messages: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl MockHost {
        fn messages_for(&self, player: &str) -> Vec<String> {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .filter(|(p, _)| p == player)
                .map(|(_, m)| m.clone())
                .collect()
        }
    }

    impl Host for MockHost {
        fn send_message(&self, player: &str, message: &str) {
            self.messages
                .lock()
                .unwrap()
                .push((player.to_string(), message.to_string()));
        }

        fn teleport(&self, _player: &str, _target: &TeleportTarget) -> bool {
            true
        }
    }

    #[derive(Default)]
    struct MockPermissions {
        denied: HashSet<String>,
        groups: HashMap<String, String>,
    }

    impl Permissions for MockPermissions {
        fn has_permission(&self, player: &str, _capability: &str) -> bool {
            !self.denied.contains(player)
        }

        fn group(&self, player: &str) -> Option<String> {
            self.groups.get(player).cloned()
        }
    }

    struct MockEconomy {
        balances: Mutex<HashMap<String, f64>>,
    }

    impl MockEconomy {
        fn with(balances: &[(&str, f64)]) -> Self {
            Self {
                balances: Mutex::new(balances.iter().map(|(p, b)| (p.to_string(), *b)).collect()),
            }
        }

        fn balance(&self, player: &str) -> f64 {
            self.balances.lock().unwrap().get(player).copied().unwrap_or(0.0)
        }
    }

    impl Economy for MockEconomy {
        fn currency(&self) -> String {
            "coins".to_string()
        }

        fn pay(&self, player: &str, amount: f64) -> bool {
            let mut balances = self.balances.lock().unwrap();
            let balance = balances.entry(player.to_string()).or_insert(0.0);
            if *balance < amount {
                return false;
            }
            *balance -= amount;
            true
        }

        fn grant(&self, player: &str, amount: f64) {
            *self.balances.lock().unwrap().entry(player.to_string()).or_insert(0.0) += amount;
        }
    }

    fn port() -> TravelPort {
        TravelPort::new(
            PortId(1),
            "Harbour",
            CuboidArea::new("world", [0, 60, 0], [10, 70, 10]).into(),
        )
    }

    #[test]
    fn test_new_port_defaults() {
        let port = port();
        assert!(!port.is_linked());
        assert!(!port.is_password_locked());
        assert_eq!(port.price(), 0.0);
        assert!(port.allowed().is_empty());
        assert_eq!(port.departure(), &Departure::Manual);
        assert!(matches!(
            port.teleport_target(),
            Err(TravelError::MissingDestination(PortId(1)))
        ));
    }

    #[test]
    fn test_price_must_be_non_negative() {
        let mut port = port();
        assert!(matches!(port.set_price(-1.0), Err(TravelError::InvalidPrice(_))));
        assert!(port.set_price(f64::NAN).is_err());
        assert!(port.set_price(2.5).is_ok());
        assert_eq!(port.price(), 2.5);
    }

    #[test]
    fn test_is_allowed() {
        let mut permissions = MockPermissions::default();
        permissions.denied.insert("mallory".to_string());
        permissions.groups.insert("bob".to_string(), "Sailors".to_string());

        let mut port = port();
        assert!(port.is_allowed(&permissions, "easytravel.depart", "alice"));
        assert!(!port.is_allowed(&permissions, "easytravel.depart", "mallory"));

        port.allow("Alice");
        port.allow("sailors");
        assert!(port.is_allowed(&permissions, "easytravel.depart", "alice"));
        assert!(port.is_allowed(&permissions, "easytravel.depart", "bob"));
        assert!(!port.is_allowed(&permissions, "easytravel.depart", "carol"));

        assert!(port.disallow("SAILORS"));
        assert!(!port.is_allowed(&permissions, "easytravel.depart", "bob"));
        assert!(!port.disallow("nobody"));
    }

    #[test]
    fn test_depart_gate_is_per_player() {
        let host = MockHost::default();
        let mut permissions = MockPermissions::default();
        permissions.denied.insert("mallory".to_string());
        let economy = MockEconomy::with(&[("alice", 20.0), ("bob", 5.0)]);
        let config = TravelConfig::default();

        let mut port = port();
        port.set_price(10.0).unwrap();
        let ctx = DepartContext {
            config: &config,
            host: &host,
            permissions: &permissions,
            economy: Some(&economy),
        };

        let boarded = port.depart(
            vec!["mallory".to_string(), "bob".to_string(), "alice".to_string()],
            &ctx,
        );

        assert_eq!(
            boarded,
            vec![Boarding {
                player: "alice".to_string(),
                fare: 10.0
            }]
        );
        assert_eq!(economy.balance("alice"), 10.0);
        assert_eq!(economy.balance("bob"), 5.0);
        assert_eq!(
            host.messages_for("mallory"),
            vec!["You are not allowed to travel from Harbour."]
        );
        assert_eq!(
            host.messages_for("bob"),
            vec!["You need 10 coins to travel from Harbour."]
        );
        assert_eq!(
            host.messages_for("alice"),
            vec!["You paid 10 coins for your journey.", "Departing from Harbour..."]
        );
    }

    #[test]
    fn test_depart_without_economy() {
        let host = MockHost::default();
        let permissions = MockPermissions::default();
        let mut config = TravelConfig::default();
        config.depart_delay_ticks = 0;

        let mut port = port();
        let ctx = DepartContext {
            config: &config,
            host: &host,
            permissions: &permissions,
            economy: None,
        };

        let boarded = port.depart(vec!["alice".to_string()], &ctx);
        assert_eq!(boarded.len(), 1);
        assert!(host.messages_for("alice").is_empty(), "no delay, no departing notice");

        port.set_price(1.0).unwrap();
        let ctx = DepartContext { economy: None, ..ctx };
        assert!(port.depart(vec!["alice".to_string()], &ctx).is_empty());
        assert_eq!(
            host.messages_for("alice"),
            vec!["Travelling from Harbour costs money, but no economy is available."]
        );
    }

    #[test]
    fn test_command_uses_port_password() {
        let mut port = port();
        port.set_password(Some("open sesame".to_string()));
        assert!(matches!(
            port.command("alice", Some("nope"), 0),
            Err(TravelError::InvalidPassword)
        ));
        assert_eq!(
            port.command("alice", Some("open sesame"), 0).unwrap(),
            CommandOutcome::Depart(vec!["alice".to_string()])
        );
    }
}

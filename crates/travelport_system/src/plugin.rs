//! # EasyTravel Plugin
//!
//! [`EasyTravel`] is the facade a host adapter drives. It owns the
//! [`Registry`], the [`PresenceTracker`] and the pending delayed tasks, and
//! talks to the server only through the [`Host`], [`Permissions`] and
//! [`Economy`] collaborators it was built with.
//!
//! The host calls [`EasyTravel::tick`] once per server tick with the current
//! world time and a snapshot of every online player. Each tick runs three
//! passes in a fixed order:
//!
//! 1. **Presence** - entry/exit transitions are forwarded to the departure
//!    policies; a boarded player who leaves the port loses their seat.
//! 2. **Departures** - timed policies are advanced, ports in id order.
//! 3. **Tasks** - teleports and arrival notices that became due fire.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut plugin = EasyTravel::new(config, Box::new(host), Box::new(AllowAll))
//!     .with_economy(Box::new(vault));
//! plugin.load()?;
//! loop {
//!     plugin.tick(server.world_time(), &server.snapshots());
//! }
//! ```

use crate::config::{Messages, TravelConfig};
use crate::departure::{CommandOutcome, Departure};
use crate::error::TravelError;
use crate::host::{Economy, Host, Permissions};
use crate::port::{Boarding, DepartContext, TravelPort};
use crate::presence::PresenceTracker;
use crate::registry::{LoadSummary, Registry};
use crate::scheduler::{DelayedTasks, TaskHandle};
use crate::store::{FlatFileStore, PortStore};
use crate::time::GameDuration;
use crate::types::{PlayerSnapshot, PortId};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Work deferred by the departure and arrival delays.
#[derive(Debug, Clone, PartialEq)]
pub enum TravelTask {
    /// Move a boarded player from `origin` to its linked port.
    Teleport {
        player: String,
        origin: PortId,
        fare: f64,
    },
    /// Tell a player they arrived at `port`.
    ArrivalNotice { player: String, port: PortId },
}

/// The TravelPort runtime.
pub struct EasyTravel {
    config: TravelConfig,
    registry: Registry,
    presence: PresenceTracker,
    tasks: DelayedTasks<TravelTask>,
    /// Players holding a seat, keyed by name
    boarded: HashMap<String, TaskHandle>,
    /// Ticks seen so far; delayed tasks are timed against this
    tick_count: u64,
    /// World time of the last tick; departure policies are timed against this
    world_time: u64,
    store: Box<dyn PortStore>,
    host: Box<dyn Host>,
    permissions: Box<dyn Permissions>,
    economy: Option<Box<dyn Economy>>,
}

impl EasyTravel {
    /// Creates the plugin persisting to `config.ports_file`, without economy.
    pub fn new(config: TravelConfig, host: Box<dyn Host>, permissions: Box<dyn Permissions>) -> Self {
        let store = Box::new(FlatFileStore::new(&config.ports_file));
        Self {
            config,
            registry: Registry::new(),
            presence: PresenceTracker::new(),
            tasks: DelayedTasks::new(),
            boarded: HashMap::new(),
            tick_count: 0,
            world_time: 0,
            store,
            host,
            permissions,
            economy: None,
        }
    }

    pub fn with_economy(mut self, economy: Box<dyn Economy>) -> Self {
        self.economy = Some(economy);
        self
    }

    pub fn with_store(mut self, store: Box<dyn PortStore>) -> Self {
        self.store = store;
        self
    }

    pub fn config(&self) -> &TravelConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Direct registry access for administrative commands.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    pub fn world_time(&self) -> u64 {
        self.world_time
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// True while the player has paid and waits for their teleport.
    pub fn is_boarded(&self, player: &str) -> bool {
        self.boarded.contains_key(player)
    }

    /// Replaces the registry with the store's contents.
    ///
    /// Presence and boarded seats refer to the old ids and are dropped.
    pub fn load(&mut self) -> Result<LoadSummary, TravelError> {
        let summary = self.registry.load(self.store.as_ref())?;
        for player in self.boarded.keys().cloned().collect::<Vec<_>>() {
            self.cancel_boarding(&player, true);
        }
        self.presence.clear_ports();
        debug!(
            "📂 Registry holds {} TravelPorts ({} lines skipped)",
            summary.loaded,
            summary.skipped.len()
        );
        Ok(summary)
    }

    pub fn save(&self) -> Result<(), TravelError> {
        self.registry.save(self.store.as_ref())?;
        debug!("💾 Saved {} TravelPorts", self.registry.len());
        Ok(())
    }

    pub fn player_joined(&mut self, player: &str) {
        self.presence.join(player);
    }

    /// Forgets a disconnecting player, refunding a seat they held.
    pub fn player_quit(&mut self, player: &str) {
        self.cancel_boarding(player, false);
        if let Some(port) = self.presence.quit(player).and_then(|presence| presence.port) {
            if let Ok(port) = self.registry.get_mut(port) {
                port.departure_mut().on_player_left(player);
            }
        }
    }

    /// Remembers the password a player typed for later travel commands.
    pub fn set_password(&mut self, player: &str, password: Option<String>) {
        self.presence.set_password(player, password);
    }

    /// A player's travel command.
    ///
    /// Without an explicit `password` the last one set through
    /// [`EasyTravel::set_password`] is tried.
    pub fn command_depart(&mut self, player: &str, password: Option<&str>) -> Result<CommandOutcome, TravelError> {
        let Some(port_id) = self.presence.port_of(player) else {
            self.host.send_message(player, &self.config.messages.not_in_port);
            return Err(TravelError::NotFound(format!(
                "{player} is not standing in a TravelPort"
            )));
        };
        let port = self.registry.get(port_id)?;
        let name = port.name().to_string();
        let supplied = password
            .map(str::to_string)
            .or_else(|| self.presence.password(player).map(str::to_string));

        let outcome = match port.command(player, supplied.as_deref(), self.world_time) {
            Ok(outcome) => outcome,
            Err(e) => {
                let text = Messages::render(&self.config.messages.invalid_password, &[("name", name.as_str())]);
                self.host.send_message(player, &text);
                return Err(e);
            }
        };

        match &outcome {
            CommandOutcome::Depart(players) => {
                self.depart(port_id, players.clone());
            }
            CommandOutcome::NextDeparture { remaining, .. } => {
                let time = remaining.to_string();
                let text = Messages::render(
                    &self.config.messages.next_departure,
                    &[("name", name.as_str()), ("time", time.as_str())],
                );
                self.host.send_message(player, &text);
            }
            CommandOutcome::NoDeparture => {
                let text = Messages::render(&self.config.messages.no_departure, &[("name", name.as_str())]);
                self.host.send_message(player, &text);
            }
        }
        Ok(outcome)
    }

    /// Replaces a port's departure policy and queues everybody already
    /// standing in it.
    pub fn set_departure(&mut self, port: PortId, departure: Departure) -> Result<(), TravelError> {
        let players = self.presence.players_in(port);
        let now = self.world_time;
        let port = self.registry.get_mut(port)?;
        port.set_departure(departure);
        port.departure_mut().start(now);
        for player in players {
            port.departure_mut().on_player_entered(&player, now);
        }
        info!("🕒 TravelPort {} now departs {}", port.id(), port.departure());
        Ok(())
    }

    /// Removes a port, cancelling seats booked from it and clearing the
    /// presence of players standing in it.
    pub fn remove_port(&mut self, port: PortId) -> Result<TravelPort, TravelError> {
        self.registry.get(port)?;
        let leaving: Vec<String> = self
            .boarded
            .iter()
            .filter(|(_, handle)| {
                matches!(
                    self.tasks.get(**handle),
                    Some(TravelTask::Teleport { origin, .. }) if *origin == port
                )
            })
            .map(|(player, _)| player.clone())
            .collect();
        for player in leaving {
            self.cancel_boarding(&player, true);
        }
        self.presence.forget_port(port);
        self.registry.remove(port)
    }

    /// Runs the access and fare gate for `players` at `port` and books a
    /// teleport for each one that boards.
    ///
    /// Players already holding a seat are ignored.
    pub fn depart(&mut self, port: PortId, players: Vec<String>) -> Vec<Boarding> {
        let players: Vec<String> = players
            .into_iter()
            .filter(|player| !self.boarded.contains_key(player))
            .collect();
        if players.is_empty() {
            return Vec::new();
        }

        let Ok(origin) = self.registry.get(port) else {
            warn!("⚠️ Departure requested from missing TravelPort {}", port);
            return Vec::new();
        };
        let ctx = DepartContext {
            config: &self.config,
            host: self.host.as_ref(),
            permissions: self.permissions.as_ref(),
            economy: self.economy.as_deref(),
        };
        let boardings = origin.depart(players, &ctx);

        for boarding in &boardings {
            let task = TravelTask::Teleport {
                player: boarding.player.clone(),
                origin: port,
                fare: boarding.fare,
            };
            let handle = self
                .tasks
                .schedule(self.tick_count, self.config.depart_delay_ticks, task);
            self.boarded.insert(boarding.player.clone(), handle);
        }
        boardings
    }

    /// Advances the plugin by one server tick.
    pub fn tick(&mut self, world_time: u64, players: &[PlayerSnapshot]) {
        self.world_time = world_time;
        self.tick_count += 1;

        for snapshot in players {
            self.update_presence(snapshot);
        }

        for id in self.registry.ids() {
            let batch = match self.registry.get_mut(id) {
                Ok(port) => port.departure_mut().on_tick(world_time),
                Err(_) => None,
            };
            if let Some(batch) = batch {
                debug!("⏰ TravelPort {} departs with {} waiting", id, batch.len());
                self.depart(id, batch);
            }
        }

        for task in self.tasks.take_due(self.tick_count) {
            self.run_task(task);
        }
    }

    fn update_presence(&mut self, snapshot: &PlayerSnapshot) {
        let player = snapshot.name.as_str();
        let change = self.presence.update(snapshot, &self.registry);

        if let Some(left) = change.left {
            self.cancel_boarding(player, true);
            if let Ok(port) = self.registry.get_mut(left) {
                port.departure_mut().on_player_left(player);
            }
        }

        if let Some(entered) = change.entered {
            let now = self.world_time;
            let Ok(port) = self.registry.get_mut(entered) else {
                return;
            };
            port.departure_mut().on_player_entered(player, now);

            let messages = &self.config.messages;
            let name = port.name();
            let text = match (port.departure(), port.departure().next_departure(now)) {
                (Departure::Manual, _) => Messages::render(&messages.entered_manual, &[("name", name)]),
                (_, Some(at)) => {
                    let time = GameDuration(at.saturating_sub(now)).to_string();
                    Messages::render(&messages.entered_timed, &[("name", name), ("time", time.as_str())])
                }
                (_, None) => Messages::render(&messages.no_departure, &[("name", name)]),
            };
            self.host.send_message(player, &text);
        }
    }

    /// Withdraws a player's seat and gives the fare back.
    fn cancel_boarding(&mut self, player: &str, notify: bool) {
        let Some(handle) = self.boarded.remove(player) else {
            return;
        };
        let Some(TravelTask::Teleport { origin, fare, .. }) = self.tasks.cancel(handle) else {
            return;
        };

        info!("🛑 Cancelled journey of {} from TravelPort {}", player, origin);
        if notify {
            let name = self
                .registry
                .get(origin)
                .map(|port| port.name().to_string())
                .unwrap_or_else(|_| origin.to_string());
            let text = Messages::render(&self.config.messages.cancelled, &[("name", name.as_str())]);
            self.host.send_message(player, &text);
        }
        self.refund(player, fare, notify);
    }

    fn refund(&self, player: &str, fare: f64, notify: bool) {
        if fare <= 0.0 || !self.config.refund_on_cancel {
            return;
        }
        let Some(economy) = self.economy.as_deref() else {
            return;
        };
        economy.grant(player, fare);
        debug!("💰 Refunded {} to {}", fare, player);
        if notify {
            let price = fare.to_string();
            let currency = economy.currency();
            let text = Messages::render(
                &self.config.messages.refunded,
                &[("price", price.as_str()), ("currency", currency.as_str())],
            );
            self.host.send_message(player, &text);
        }
    }

    fn run_task(&mut self, task: TravelTask) {
        match task {
            TravelTask::Teleport {
                player,
                origin,
                fare,
            } => {
                self.boarded.remove(&player);
                if !self.presence.is_online(&player) {
                    return;
                }
                self.teleport(&player, origin, fare);
            }
            TravelTask::ArrivalNotice { player, port } => {
                if !self.presence.is_online(&player) {
                    return;
                }
                if let Ok(port) = self.registry.get(port) {
                    let text = Messages::render(&self.config.messages.arrived, &[("name", port.name())]);
                    self.host.send_message(&player, &text);
                }
            }
        }
    }

    fn teleport(&mut self, player: &str, origin: PortId, fare: f64) {
        let Ok(port) = self.registry.get(origin) else {
            warn!("⚠️ TravelPort {} vanished before {} could leave", origin, player);
            self.refund(player, fare, true);
            return;
        };
        let name = port.name().to_string();

        let resolved = match port.target() {
            None => Err(format!("TravelPort {origin} is not linked")),
            Some(target) => match self.registry.get(target) {
                Err(_) => Err(format!("TravelPort {origin} links to missing port {target}")),
                Ok(partner) => partner
                    .teleport_target()
                    .map(|location| (target, location))
                    .map_err(|e| e.to_string()),
            },
        };

        let (target, location) = match resolved {
            Ok(resolved) => resolved,
            Err(reason) => {
                warn!("⚠️ Skipping {}: {}", player, reason);
                let text = Messages::render(&self.config.messages.missing_target, &[("name", name.as_str())]);
                self.host.send_message(player, &text);
                self.refund(player, fare, true);
                return;
            }
        };

        if !self.host.teleport(player, &location) {
            warn!("⚠️ Host refused to teleport {} to TravelPort {}", player, target);
            self.refund(player, fare, true);
            return;
        }

        if let Ok(port) = self.registry.get_mut(origin) {
            port.departure_mut().on_player_left(player);
        }
        self.presence.set_port(player, Some(target));
        self.tasks.schedule(
            self.tick_count,
            self.config.arrival_notice_delay_ticks,
            TravelTask::ArrivalNotice {
                player: player.to_string(),
                port: target,
            },
        );
        info!("🧭 {} travelled from TravelPort {} to {}", player, origin, target);
    }
}

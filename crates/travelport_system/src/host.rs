//! # Host Collaborators
//!
//! The plugin never touches the game server directly. Everything it needs
//! from the host platform comes through these traits, so a server adapter
//! (or a test mock) decides how messages, teleports, permissions and money
//! actually work.

use crate::types::TeleportTarget;

/// Messaging and teleportation primitives of the host server.
pub trait Host: Send + Sync {
    /// Sends a chat line to an online player. Unknown players are ignored.
    fn send_message(&self, player: &str, message: &str);

    /// Moves a player; returns false if the host refused (player offline,
    /// world not loaded, teleport event cancelled...).
    fn teleport(&self, player: &str, target: &TeleportTarget) -> bool;
}

/// Permission checks delegated to the host's permission plugin.
pub trait Permissions: Send + Sync {
    fn has_permission(&self, player: &str, capability: &str) -> bool;

    /// Primary group of the player, if the permission plugin has groups.
    fn group(&self, player: &str) -> Option<String>;
}

/// Optional economy plugin used to charge fares.
pub trait Economy: Send + Sync {
    /// Currency name shown in messages.
    fn currency(&self) -> String;

    /// Debits `amount`; false means insufficient funds and nothing changed.
    fn pay(&self, player: &str, amount: f64) -> bool;

    /// Credits `amount`.
    fn grant(&self, player: &str, amount: f64);
}

/// Grants every capability; for hosts without a permission plugin.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl Permissions for AllowAll {
    fn has_permission(&self, _player: &str, _capability: &str) -> bool {
        true
    }

    fn group(&self, _player: &str) -> Option<String> {
        None
    }
}

//! Plugin configuration.
//!
//! [`TravelConfig`] carries every tunable the plugin reads: where ports are
//! persisted, departure/arrival delays, the permission node and the message
//! templates. It is built once by the host (usually deserialized from the
//! `[travel]` table of a TOML file) and handed to the plugin, so tests can
//! inject their own values.

use crate::error::TravelError;
use serde::{Deserialize, Serialize};

fn default_ports_file() -> String {
    "travelports.txt".to_string()
}

fn default_depart_delay_ticks() -> u64 {
    60 // 3 seconds at 20 ticks per second
}

fn default_arrival_notice_delay_ticks() -> u64 {
    20
}

fn default_refund_on_cancel() -> bool {
    true
}

fn default_depart_permission() -> String {
    "easytravel.depart".to_string()
}

/// Top-level plugin settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelConfig {
    /// Path of the `;`-delimited ports file
    #[serde(default = "default_ports_file")]
    pub ports_file: String,
    /// Ticks between paying and being teleported
    #[serde(default = "default_depart_delay_ticks")]
    pub depart_delay_ticks: u64,
    /// Ticks between arrival and the "arrived at" notice
    #[serde(default = "default_arrival_notice_delay_ticks")]
    pub arrival_notice_delay_ticks: u64,
    /// Give the fare back when a boarded journey is cancelled
    #[serde(default = "default_refund_on_cancel")]
    pub refund_on_cancel: bool,
    #[serde(default)]
    pub permissions: PermissionSettings,
    #[serde(default)]
    pub messages: Messages,
}

/// Permission node names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionSettings {
    /// Base capability every traveller needs
    #[serde(default = "default_depart_permission")]
    pub depart: String,
}

impl Default for PermissionSettings {
    fn default() -> Self {
        Self {
            depart: default_depart_permission(),
        }
    }
}

/// Player-facing message templates.
///
/// Placeholders: `{name}` (port name), `{price}`, `{currency}`, `{time}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub entered_manual: String,
    pub entered_timed: String,
    pub not_allowed: String,
    pub economy_unavailable: String,
    pub insufficient_funds: String,
    pub paid: String,
    pub departing: String,
    pub missing_target: String,
    pub arrived: String,
    pub next_departure: String,
    pub no_departure: String,
    pub invalid_password: String,
    pub not_in_port: String,
    pub cancelled: String,
    pub refunded: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            entered_manual: "Welcome to {name}! Use /travel to depart.".to_string(),
            entered_timed: "Welcome to {name}! Next departure in {time}.".to_string(),
            not_allowed: "You are not allowed to travel from {name}.".to_string(),
            economy_unavailable: "Travelling from {name} costs money, but no economy is available."
                .to_string(),
            insufficient_funds: "You need {price} {currency} to travel from {name}.".to_string(),
            paid: "You paid {price} {currency} for your journey.".to_string(),
            departing: "Departing from {name}...".to_string(),
            missing_target: "{name} has no destination to travel to.".to_string(),
            arrived: "You arrived at {name}.".to_string(),
            next_departure: "Next departure from {name} in {time}.".to_string(),
            no_departure: "{name} has no scheduled departures.".to_string(),
            invalid_password: "Wrong password for {name}.".to_string(),
            not_in_port: "You are not standing in a TravelPort.".to_string(),
            cancelled: "Your journey from {name} was cancelled.".to_string(),
            refunded: "You were refunded {price} {currency}.".to_string(),
        }
    }
}

impl Messages {
    /// Substitutes `{key}` placeholders in `template`.
    pub fn render(template: &str, values: &[(&str, &str)]) -> String {
        values
            .iter()
            .fold(template.to_string(), |text, (key, value)| {
                text.replace(&format!("{{{key}}}"), value)
            })
    }

    fn all(&self) -> [(&'static str, &str); 15] {
        [
            ("entered_manual", self.entered_manual.as_str()),
            ("entered_timed", self.entered_timed.as_str()),
            ("not_allowed", self.not_allowed.as_str()),
            ("economy_unavailable", self.economy_unavailable.as_str()),
            ("insufficient_funds", self.insufficient_funds.as_str()),
            ("paid", self.paid.as_str()),
            ("departing", self.departing.as_str()),
            ("missing_target", self.missing_target.as_str()),
            ("arrived", self.arrived.as_str()),
            ("next_departure", self.next_departure.as_str()),
            ("no_departure", self.no_departure.as_str()),
            ("invalid_password", self.invalid_password.as_str()),
            ("not_in_port", self.not_in_port.as_str()),
            ("cancelled", self.cancelled.as_str()),
            ("refunded", self.refunded.as_str()),
        ]
    }
}

impl Default for TravelConfig {
    fn default() -> Self {
        Self {
            ports_file: default_ports_file(),
            depart_delay_ticks: default_depart_delay_ticks(),
            arrival_notice_delay_ticks: default_arrival_notice_delay_ticks(),
            refund_on_cancel: default_refund_on_cancel(),
            permissions: PermissionSettings::default(),
            messages: Messages::default(),
        }
    }
}

impl TravelConfig {
    /// Checks the settings for values the plugin cannot work with.
    pub fn validate(&self) -> Result<(), TravelError> {
        if self.ports_file.trim().is_empty() {
            return Err(TravelError::Config("ports_file cannot be empty".to_string()));
        }
        if self.permissions.depart.trim().is_empty() {
            return Err(TravelError::Config(
                "permissions.depart cannot be empty".to_string(),
            ));
        }
        if let Some((key, _)) = self.messages.all().iter().find(|(_, t)| t.trim().is_empty()) {
            return Err(TravelError::Config(format!("messages.{key} cannot be empty")));
        }
        Ok(())
    }
}

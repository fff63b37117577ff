//! Error types for the TravelPort system.
//!
//! Every fallible operation in this crate returns [`TravelError`]. None of the
//! variants is fatal to the host: callers either surface them to the player
//! (lookups, links, passwords) or recover locally (persisted-line syntax).

use crate::types::PortId;

/// Enumeration of the failures the TravelPort core can report.
#[derive(Debug, thiserror::Error)]
pub enum TravelError {
    /// A persisted or user-supplied string could not be parsed
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Unknown port, or a name search that matched zero or several ports
    #[error("TravelPort not found: {0}")]
    NotFound(String),

    /// Link/unlink attempted against the current link state
    #[error("Invalid link: {0}")]
    InvalidLink(String),

    /// Teleport requested for a port whose destination was never set
    #[error("TravelPort {0} has no destination")]
    MissingDestination(PortId),

    /// Manual departure with a wrong or missing password
    #[error("Invalid password")]
    InvalidPassword,

    /// Negative or non-finite fare
    #[error("Invalid price: {0}")]
    InvalidPrice(f64),

    /// Reading or writing the ports file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration did not validate
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TravelError {
    /// Builds a [`TravelError::Syntax`] naming the offending input.
    pub fn syntax(what: &str, input: &str) -> Self {
        Self::Syntax(format!("{what}: '{input}'"))
    }
}

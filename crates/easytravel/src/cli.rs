//! Command-line interface handling for the EasyTravel administration tool.
//!
//! This module provides command-line argument parsing using the `clap`
//! builder API. Global options select the configuration file and logging
//! output; a subcommand selects the operation on the ports file.

use clap::{Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::path::PathBuf;

/// Operation requested on the command line.
///
/// Ports are named by the same token players type: a numeric id or a
/// unique part of the port name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    /// List ports whose name contains `keyword` (all ports without one)
    List { keyword: Option<String>, json: bool },
    /// Show every attribute of one port
    Show { port: String, json: bool },
    /// Report broken links and ports without destination
    Check,
    /// Link two unlinked ports with each other
    Link { first: String, second: String },
    /// Remove a port's link on both sides
    Unlink { port: String },
    /// Delete a port, unlinking it first
    Remove { port: String },
    /// Replace a port's departure policy
    Departure { port: String, description: String },
}

impl AdminCommand {
    /// Whether the command changes the ports file.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            AdminCommand::Link { .. }
                | AdminCommand::Unlink { .. }
                | AdminCommand::Remove { .. }
                | AdminCommand::Departure { .. }
        )
    }
}

/// Command line arguments parsed from user input.
///
/// Options here override the matching configuration file settings.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for the ports file
    pub ports_file: Option<PathBuf>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    /// The operation to run
    pub command: AdminCommand,
}

fn port_arg() -> Arg {
    Arg::new("port")
        .value_name("PORT")
        .help("Port id or unique part of its name")
        .required(true)
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .help("Print JSON instead of text")
        .action(ArgAction::SetTrue)
}

/// Builds the clap command tree.
pub fn command() -> Command {
    Command::new("EasyTravel")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect and edit EasyTravel TravelPort files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("easytravel.toml")
                .global(true),
        )
        .arg(
            Arg::new("ports")
                .short('p')
                .long("ports")
                .value_name("FILE")
                .help("Ports file path (overrides travel.ports_file)")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)")
                .global(true),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .help("Output logs in JSON format")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("list")
                .about("List ports, optionally filtered by name")
                .arg(Arg::new("keyword").value_name("KEYWORD").help("Part of a port name"))
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("show")
                .about("Show one port in detail")
                .arg(port_arg())
                .arg(json_arg()),
        )
        .subcommand(Command::new("check").about("Report broken links and missing destinations"))
        .subcommand(
            Command::new("link")
                .about("Link two unlinked ports")
                .arg(port_arg().id("first"))
                .arg(port_arg().id("second")),
        )
        .subcommand(
            Command::new("unlink")
                .about("Remove a port's link on both sides")
                .arg(port_arg()),
        )
        .subcommand(
            Command::new("remove")
                .about("Delete a port")
                .arg(port_arg()),
        )
        .subcommand(
            Command::new("departure")
                .about("Set a port's departure: MANUAL, 'every <duration>' or HH:MM,HH:MM")
                .arg(port_arg())
                .arg(
                    Arg::new("description")
                        .value_name("DESCRIPTION")
                        .help("Departure description")
                        .required(true)
                        .num_args(1..)
                        .trailing_var_arg(true),
                ),
        )
}

impl CliArgs {
    /// Parses the process arguments, exiting with usage on error.
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    /// Parses an explicit argument list.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Ok(Self::from_matches(&command().try_get_matches_from(args)?))
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        let command = match matches.subcommand() {
            Some(("list", sub)) => AdminCommand::List {
                keyword: sub.get_one::<String>("keyword").cloned(),
                json: sub.get_flag("json"),
            },
            Some(("show", sub)) => AdminCommand::Show {
                port: string(sub, "port"),
                json: sub.get_flag("json"),
            },
            Some(("link", sub)) => AdminCommand::Link {
                first: string(sub, "first"),
                second: string(sub, "second"),
            },
            Some(("unlink", sub)) => AdminCommand::Unlink {
                port: string(sub, "port"),
            },
            Some(("remove", sub)) => AdminCommand::Remove {
                port: string(sub, "port"),
            },
            Some(("departure", sub)) => AdminCommand::Departure {
                port: string(sub, "port"),
                description: sub
                    .get_many::<String>("description")
                    .map(|words| words.cloned().collect::<Vec<_>>().join(" "))
                    .unwrap_or_default(),
            },
            _ => AdminCommand::Check,
        };

        Self {
            config_path: PathBuf::from(string(matches, "config")),
            ports_file: matches.get_one::<String>("ports").map(PathBuf::from),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            command,
        }
    }
}

/// Required and defaulted arguments are always present after parsing.
fn string(matches: &ArgMatches, id: &str) -> String {
    matches.get_one::<String>(id).cloned().unwrap_or_default()
}

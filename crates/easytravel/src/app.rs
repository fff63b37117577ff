//! Main application logic.
//!
//! [`Application`] loads the configuration and the ports file, runs one
//! [`AdminCommand`] against the registry and saves the file again when the
//! command changed it.

use crate::cli::{AdminCommand, CliArgs};
use crate::config::AppConfig;
use std::io::Write;
use tracing::{info, warn};
use travelport_system::{
    Departure, FlatFileStore, LinkProblem, PortId, Registry, TravelError, TravelPort,
};

/// One run of the administration tool.
pub struct Application {
    /// Loaded application configuration
    config: AppConfig,
    /// The operation to run
    command: AdminCommand,
    store: FlatFileStore,
    registry: Registry,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply command-line argument overrides
    /// 3. Validate merged configuration
    /// 4. Load the ports file into a fresh registry
    ///
    /// # Arguments
    ///
    /// * `args` - Parsed command-line arguments
    pub fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path)?;

        if let Some(ports_file) = args.ports_file {
            config.travel.ports_file = ports_file.to_string_lossy().to_string();
        }

        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }

        if args.json_logs {
            config.logging.json_format = true;
        }

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }

        let store = FlatFileStore::new(&config.travel.ports_file);
        let mut registry = Registry::new();
        let summary = registry.load(&store)?;
        if !summary.skipped.is_empty() {
            warn!(
                "⚠️ {} lines of {} could not be loaded; saving will drop them",
                summary.skipped.len(),
                store.path().display()
            );
        }

        Ok(Self {
            config,
            command: args.command,
            store,
            registry,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Runs the command, writing its report to `out`.
    pub fn run(&mut self, out: &mut dyn Write) -> Result<(), Box<dyn std::error::Error>> {
        let command = self.command.clone();
        match &command {
            AdminCommand::List { keyword, json } => {
                let ports = self.registry.search_all(keyword.as_deref().unwrap_or(""));
                if *json {
                    writeln!(out, "{}", serde_json::to_string_pretty(&ports)?)?;
                } else if ports.is_empty() {
                    writeln!(out, "No TravelPorts found.")?;
                } else {
                    for port in ports {
                        writeln!(out, "{}", self.summary_line(port))?;
                    }
                }
            }
            AdminCommand::Show { port, json } => {
                let port = self.registry.search(port)?;
                if *json {
                    writeln!(out, "{}", serde_json::to_string_pretty(port)?)?;
                } else {
                    self.write_details(out, port)?;
                }
            }
            AdminCommand::Check => self.check(out)?,
            AdminCommand::Link { first, second } => {
                let first = self.registry.search(first)?.id();
                let second = self.registry.search(second)?.id();
                self.registry.link(first, second)?;
                writeln!(out, "Linked {} <-> {}.", self.name_of(first), self.name_of(second))?;
            }
            AdminCommand::Unlink { port } => {
                let id = self.registry.search(port)?.id();
                self.registry.unlink(id)?;
                writeln!(out, "Unlinked {}.", self.name_of(id))?;
            }
            AdminCommand::Remove { port } => {
                let id = self.registry.search(port)?.id();
                let removed = self.registry.remove(id)?;
                writeln!(out, "Removed [{}] {}.", removed.id(), removed.name())?;
            }
            AdminCommand::Departure { port, description } => {
                let id = self.registry.search(port)?.id();
                let departure: Departure = description.parse()?;
                let port = self.registry.get_mut(id)?;
                port.set_departure(departure);
                writeln!(out, "{} now departs {}.", port.name(), port.departure())?;
            }
        }

        if command.is_mutating() {
            self.registry.save(&self.store)?;
            info!("💾 Saved {} TravelPorts to {}", self.registry.len(), self.store.path().display());
        }
        Ok(())
    }

    fn name_of(&self, id: PortId) -> String {
        self.registry
            .get(id)
            .map(|port| format!("[{}] {}", port.id(), port.name()))
            .unwrap_or_else(|_| format!("[{id}]"))
    }

    fn summary_line(&self, port: &TravelPort) -> String {
        let link = match port.target() {
            Some(target) => format!("-> {}", self.name_of(target)),
            None => "unlinked".to_string(),
        };
        format!(
            "[{}] {} ({}, {}, {})",
            port.id(),
            port.name(),
            port.area().world(),
            link,
            port.departure()
        )
    }

    fn write_details(&self, out: &mut dyn Write, port: &TravelPort) -> Result<(), TravelError> {
        let link = port
            .target()
            .map(|target| self.name_of(target))
            .unwrap_or_else(|| "none".to_string());
        let allowed = if port.allowed().is_empty() {
            "everybody".to_string()
        } else {
            port.allowed().iter().cloned().collect::<Vec<_>>().join(", ")
        };
        let destination = port
            .destination()
            .map(ToString::to_string)
            .unwrap_or_else(|| "not set".to_string());

        writeln!(out, "TravelPort [{}] {}", port.id(), port.name())?;
        writeln!(out, "  owner:       {}", port.owner().unwrap_or("none"))?;
        writeln!(out, "  linked to:   {link}")?;
        writeln!(out, "  price:       {}", port.price())?;
        writeln!(out, "  password:    {}", if port.is_password_locked() { "set" } else { "none" })?;
        writeln!(out, "  allowed:     {allowed}")?;
        writeln!(out, "  area:        {}", port.area())?;
        writeln!(out, "  destination: {destination}")?;
        writeln!(out, "  departure:   {}", port.departure())?;
        Ok(())
    }

    fn check(&self, out: &mut dyn Write) -> Result<(), TravelError> {
        let mut problems = 0;

        for problem in self.registry.link_problems() {
            problems += 1;
            match problem {
                LinkProblem::MissingTarget { port, target } => {
                    warn!("⚠️ TravelPort {} links to missing port {}", port, target);
                    writeln!(out, "{} links to missing port [{target}]", self.name_of(port))?;
                }
                LinkProblem::OneSided { port, target } => {
                    warn!("⚠️ TravelPort {} links to {} which does not link back", port, target);
                    writeln!(
                        out,
                        "{} links to {} which does not link back",
                        self.name_of(port),
                        self.name_of(target)
                    )?;
                }
            }
        }

        for port in self.registry.ports() {
            if port.destination().is_none() {
                problems += 1;
                writeln!(out, "{} has no destination", self.name_of(port.id()))?;
            }
        }

        if problems == 0 {
            writeln!(out, "✅ {} TravelPorts, no problems found.", self.registry.len())?;
        }
        Ok(())
    }
}

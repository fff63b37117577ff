//! # Port Persistence
//!
//! Ports are stored one per line in a `;`-delimited text file:
//!
//! ```text
//! id;name;targetId;owner;allowedList;password;price;area;destination;departure
//! ```
//!
//! - absent `targetId`, `owner`, `password` and `destination` are written as
//!   the literal `null`; an empty (open) allowed list too
//! - `allowedList` is comma-joined
//! - free text escapes `%`, `;`, `,`, `=` and braces as `%NAME%` tokens
//!   (`;` becomes `%SEMICOLON%`)
//! - `area` and `destination` use the `TypeName{key=value,...}` form
//! - `departure` is `MANUAL`, `every <duration>` or comma-joined times
//!
//! Lines from the older 9-column layout (no departure) load as `MANUAL`.
//! Malformed lines are skipped with a warning; they never abort a load.

use crate::area::Area;
use crate::departure::Departure;
use crate::destination::Destination;
use crate::error::TravelError;
use crate::port::TravelPort;
use crate::record::{escape, unescape};
use crate::types::PortId;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const NULL: &str = "null";
const SEPARATOR: char = ';';
const COLUMNS: usize = 10;
const LEGACY_COLUMNS: usize = 9;

/// A persisted line that could not be loaded.
#[derive(Debug)]
pub struct SkippedLine {
    /// 1-based line number
    pub line: usize,
    pub error: TravelError,
}

/// Outcome of reading a store.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub ports: Vec<TravelPort>,
    pub skipped: Vec<SkippedLine>,
}

/// Persistence backend for the registry.
pub trait PortStore: Send + Sync {
    /// Reads every port; per-line problems land in [`LoadReport::skipped`].
    fn load(&self) -> Result<LoadReport, TravelError>;

    /// Replaces the stored ports with `ports`.
    fn save(&self, ports: &[&TravelPort]) -> Result<(), TravelError>;
}

/// The `;`-delimited text file store.
#[derive(Debug, Clone)]
pub struct FlatFileStore {
    path: PathBuf,
}

impl FlatFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl PortStore for FlatFileStore {
    fn load(&self) -> Result<LoadReport, TravelError> {
        if !self.path.exists() {
            info!("📂 No ports file at {}, starting empty", self.path.display());
            return Ok(LoadReport::default());
        }

        let content = fs::read_to_string(&self.path)?;
        let report = parse_lines(&content);
        for skipped in &report.skipped {
            warn!(
                "⚠️ Skipping {} line {}: {}",
                self.path.display(),
                skipped.line,
                skipped.error
            );
        }
        info!(
            "📂 Loaded {} TravelPorts from {} ({} skipped)",
            report.ports.len(),
            self.path.display(),
            report.skipped.len()
        );
        Ok(report)
    }

    fn save(&self, ports: &[&TravelPort]) -> Result<(), TravelError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut content = String::new();
        for port in ports {
            content.push_str(&encode_line(port));
            content.push('\n');
        }

        let temp = self.temp_path();
        fs::write(&temp, content)?;
        fs::rename(&temp, &self.path)?;
        debug!("💾 Saved {} TravelPorts to {}", ports.len(), self.path.display());
        Ok(())
    }
}

/// Parses a whole file body; blank lines are ignored, duplicate ids skipped.
pub fn parse_lines(content: &str) -> LoadReport {
    let mut report = LoadReport::default();
    let mut seen = HashSet::new();

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let parsed = decode_line(line).and_then(|port| {
            if seen.insert(port.id()) {
                Ok(port)
            } else {
                Err(TravelError::syntax("duplicate id", &port.id().to_string()))
            }
        });
        match parsed {
            Ok(port) => report.ports.push(port),
            Err(error) => report.skipped.push(SkippedLine {
                line: index + 1,
                error,
            }),
        }
    }

    report
}

fn optional(column: &str) -> Option<&str> {
    (column != NULL).then_some(column)
}

fn write_optional(value: Option<&str>) -> String {
    value.map_or_else(|| NULL.to_string(), escape)
}

/// Serializes one port as a 10-column line (without newline).
pub fn encode_line(port: &TravelPort) -> String {
    let allowed = if port.allowed().is_empty() {
        NULL.to_string()
    } else {
        port.allowed()
            .iter()
            .map(|name| escape(name))
            .collect::<Vec<_>>()
            .join(",")
    };

    [
        port.id().to_string(),
        escape(port.name()),
        port.target().map_or_else(|| NULL.to_string(), |t| t.to_string()),
        write_optional(port.owner()),
        allowed,
        write_optional(port.password()),
        port.price().to_string(),
        port.area().to_string(),
        port.destination()
            .map_or_else(|| NULL.to_string(), ToString::to_string),
        port.departure().describe(),
    ]
    .join(&SEPARATOR.to_string())
}

/// Parses one persisted line.
pub fn decode_line(line: &str) -> Result<TravelPort, TravelError> {
    let columns: Vec<&str> = line.split(SEPARATOR).collect();
    if columns.len() != COLUMNS && columns.len() != LEGACY_COLUMNS {
        return Err(TravelError::Syntax(format!(
            "expected {COLUMNS} columns, found {}",
            columns.len()
        )));
    }

    let id = columns[0]
        .trim()
        .parse()
        .map(PortId)
        .map_err(|_| TravelError::syntax("bad id", columns[0]))?;
    let area: Area = columns[7].parse()?;
    let mut port = TravelPort::new(id, unescape(columns[1]), area);

    if let Some(target) = optional(columns[2]) {
        let target = target
            .trim()
            .parse()
            .map_err(|_| TravelError::syntax("bad target id", target))?;
        port.set_target(Some(PortId(target)));
    }

    port.set_owner(optional(columns[3]).map(unescape));

    if let Some(allowed) = optional(columns[4]) {
        for name in allowed.split(',').filter(|n| !n.is_empty()) {
            port.allow(unescape(name));
        }
    }

    port.set_password(optional(columns[5]).map(unescape));

    let price: f64 = columns[6]
        .trim()
        .parse()
        .map_err(|_| TravelError::syntax("bad price", columns[6]))?;
    port.set_price(price)
        .map_err(|_| TravelError::syntax("bad price", columns[6]))?;

    if let Some(destination) = optional(columns[8]) {
        port.set_destination(Some(destination.parse::<Destination>()?));
    }

    let departure = match columns.get(9) {
        Some(description) => description.parse()?,
        None => Departure::Manual,
    };
    port.set_departure(departure);

    Ok(port)
}

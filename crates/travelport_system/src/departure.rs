//! # Departure Policies
//!
//! A [`Departure`] decides *when* players waiting at a port actually leave.
//! It is a closed set of variants, so every driver matches on it
//! exhaustively:
//!
//! | Variant      | Persisted form      | Trigger                                      |
//! |--------------|---------------------|----------------------------------------------|
//! | `Manual`     | `MANUAL`            | the player's own travel command              |
//! | `Interval`   | `every <duration>`  | a fixed world-time interval since last leave |
//! | `Schedule`   | `HH:MM,HH:MM,...`   | fixed times of day                           |
//!
//! Policies never talk to the host. They keep their waiting queue up to date
//! from presence events and hand back the batch of player names that should
//! depart; the plugin runs the fare gate and schedules the teleports.

use crate::error::TravelError;
use crate::time::{GameDuration, TimeOfDay, TICKS_PER_DAY};
use serde::Serializer;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

const MANUAL: &str = "MANUAL";
const EVERY: &str = "every ";

/// Result of a player's travel command at a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// These players leave now.
    Depart(Vec<String>),
    /// The port leaves on its own timetable.
    NextDeparture { at: u64, remaining: GameDuration },
    /// A schedule without any times never departs.
    NoDeparture,
}

/// When queued players at a port depart.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Departure {
    #[default]
    Manual,
    Interval(IntervalDeparture),
    Schedule(ScheduledDeparture),
}

impl Departure {
    /// Handles a travel command issued by `player` standing in the port.
    ///
    /// `password` is the port's password, `supplied` what the player typed.
    /// Only manual ports check it; timed ports report their next departure.
    pub fn on_command(
        &self,
        player: &str,
        supplied: Option<&str>,
        password: Option<&str>,
        now: u64,
    ) -> Result<CommandOutcome, TravelError> {
        match self {
            Departure::Manual => {
                if let Some(password) = password {
                    if supplied != Some(password) {
                        return Err(TravelError::InvalidPassword);
                    }
                }
                Ok(CommandOutcome::Depart(vec![player.to_string()]))
            }
            Departure::Interval(_) | Departure::Schedule(_) => Ok(match self.next_departure(now) {
                Some(at) => CommandOutcome::NextDeparture {
                    at,
                    remaining: GameDuration(at.saturating_sub(now)),
                },
                None => CommandOutcome::NoDeparture,
            }),
        }
    }

    pub fn on_player_entered(&mut self, player: &str, now: u64) {
        match self {
            Departure::Manual => {}
            Departure::Interval(interval) => {
                interval.anchor(now);
                interval.queue.insert(player.to_string());
            }
            Departure::Schedule(schedule) => schedule.on_player_entered(player, now),
        }
    }

    pub fn on_player_left(&mut self, player: &str) {
        match self {
            Departure::Manual => {}
            Departure::Interval(interval) => {
                interval.queue.remove(player);
            }
            Departure::Schedule(schedule) => schedule.on_player_left(player),
        }
    }

    /// Starts counting a fresh interval policy from world time `now`.
    ///
    /// Policies that already started, and other variants, are left alone.
    pub fn start(&mut self, now: u64) {
        if let Departure::Interval(interval) = self {
            interval.anchor(now);
        }
    }

    /// Advances the policy to world time `now`; returns the departing batch
    /// if the port leaves on this tick.
    pub fn on_tick(&mut self, now: u64) -> Option<Vec<String>> {
        match self {
            Departure::Manual => None,
            Departure::Interval(interval) => interval.on_tick(now),
            Departure::Schedule(schedule) => schedule.on_tick(now),
        }
    }

    /// Absolute world time of the next timed departure, if any.
    pub fn next_departure(&self, now: u64) -> Option<u64> {
        match self {
            Departure::Manual => None,
            Departure::Interval(interval) => Some(interval.next_departure(now)),
            Departure::Schedule(schedule) => schedule.next.or_else(|| schedule.compute_next(now)),
        }
    }

    /// Players currently waiting for a timed departure, in name order.
    pub fn queued(&self) -> Vec<&str> {
        match self {
            Departure::Manual => Vec::new(),
            Departure::Interval(interval) => interval.queue.iter().map(String::as_str).collect(),
            Departure::Schedule(schedule) => schedule.queue.iter().map(String::as_str).collect(),
        }
    }

    /// Persisted description; parses back with [`Departure::from_str`].
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Departure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Departure::Manual => f.write_str(MANUAL),
            Departure::Interval(interval) => write!(f, "{EVERY}{}", interval.interval),
            Departure::Schedule(schedule) => {
                let times: Vec<String> = schedule.times.iter().map(ToString::to_string).collect();
                f.write_str(&times.join(","))
            }
        }
    }
}

impl FromStr for Departure {
    type Err = TravelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(MANUAL) {
            return Ok(Departure::Manual);
        }

        let is_interval = trimmed
            .get(..EVERY.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(EVERY));
        if is_interval {
            let interval: GameDuration = trimmed[EVERY.len()..].parse()?;
            if interval.ticks() == 0 {
                return Err(TravelError::syntax("interval must be positive", s));
            }
            return Ok(Departure::Interval(IntervalDeparture::new(interval)));
        }

        if trimmed.is_empty() {
            return Ok(Departure::Schedule(ScheduledDeparture::new(Vec::new())));
        }
        let times = trimmed
            .split(',')
            .map(str::parse)
            .collect::<Result<Vec<TimeOfDay>, _>>()?;
        Ok(Departure::Schedule(ScheduledDeparture::new(times)))
    }
}

/// Serializes a departure as its persisted description.
pub fn serialize_description<S: Serializer>(departure: &Departure, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&departure.describe())
}

/// Departs everybody waiting every `interval` ticks of world time.
///
/// A new or freshly loaded policy has no `last_depart` yet; it starts
/// counting at the first world time it sees.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalDeparture {
    interval: GameDuration,
    last_depart: Option<u64>,
    queue: BTreeSet<String>,
}

impl IntervalDeparture {
    pub fn new(interval: GameDuration) -> Self {
        Self {
            interval,
            last_depart: None,
            queue: BTreeSet::new(),
        }
    }

    pub fn starting_at(interval: GameDuration, last_depart: u64) -> Self {
        Self {
            last_depart: Some(last_depart),
            ..Self::new(interval)
        }
    }

    pub fn interval(&self) -> GameDuration {
        self.interval
    }

    pub fn last_depart(&self) -> Option<u64> {
        self.last_depart
    }

    /// World time of the next departure; one full interval after `now`
    /// while the policy has not started.
    pub fn next_departure(&self, now: u64) -> u64 {
        self.last_depart
            .unwrap_or(now)
            .saturating_add(self.interval.ticks())
    }

    fn anchor(&mut self, now: u64) {
        if self.last_depart.is_none() {
            self.last_depart = Some(now);
        }
    }

    fn on_tick(&mut self, now: u64) -> Option<Vec<String>> {
        let Some(last_depart) = self.last_depart else {
            self.last_depart = Some(now);
            return None;
        };
        // The world clock was set back; count the interval from here.
        if now < last_depart {
            self.last_depart = Some(now);
            return None;
        }
        if now < self.next_departure(now) {
            return None;
        }
        self.last_depart = Some(now);
        Some(self.queue.iter().cloned().collect())
    }
}

/// Departs everybody waiting at fixed times of day.
///
/// `next` is only tracked while somebody waits: it is set when the first
/// player enters and cleared when the last one leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledDeparture {
    times: Vec<TimeOfDay>,
    next: Option<u64>,
    queue: BTreeSet<String>,
}

impl ScheduledDeparture {
    pub fn new(mut times: Vec<TimeOfDay>) -> Self {
        times.sort();
        times.dedup();
        Self {
            times,
            next: None,
            queue: BTreeSet::new(),
        }
    }

    pub fn times(&self) -> &[TimeOfDay] {
        &self.times
    }

    /// Absolute world time of the pending departure, while players wait.
    pub fn pending(&self) -> Option<u64> {
        self.next
    }

    /// First scheduled time strictly after `now`, wrapping to the earliest
    /// time of the following day.
    fn compute_next(&self, now: u64) -> Option<u64> {
        let first = self.times.first()?;
        let day_start = now - now % TICKS_PER_DAY;
        let time_of_day = now % TICKS_PER_DAY;
        let next = match self.times.iter().find(|t| t.ticks() > time_of_day) {
            Some(t) => day_start + t.ticks(),
            None => day_start + TICKS_PER_DAY + first.ticks(),
        };
        Some(next)
    }

    fn on_player_entered(&mut self, player: &str, now: u64) {
        self.queue.insert(player.to_string());
        if self.next.is_none() {
            self.next = self.compute_next(now);
        }
    }

    fn on_player_left(&mut self, player: &str) {
        self.queue.remove(player);
        if self.queue.is_empty() {
            self.next = None;
        }
    }

    fn on_tick(&mut self, now: u64) -> Option<Vec<String>> {
        let next = self.next?;
        // The world clock was set back by more than a day; re-anchor.
        if next > now + TICKS_PER_DAY {
            self.next = self.compute_next(now);
            return None;
        }
        if now < next {
            return None;
        }
        self.next = self.compute_next(now);
        Some(self.queue.iter().cloned().collect())
    }
}

//! # Game Time
//!
//! World time is counted in ticks: one day is [`TICKS_PER_DAY`] ticks, one
//! hour [`TICKS_PER_HOUR`], and tick 0 shows 06:00 on the clock.
//!
//! Durations and times of day share one compact grammar: a sequence of
//! `<int>d`, `<int>h`, `<int>m`, `<int>t` and `HH:MM` tokens, optionally
//! separated by whitespace, whose values are added together.
//!
//! ```text
//! 1d          one full day (24000 ticks)
//! 2h30m       2500 ticks
//! 1h 15t      1015 ticks
//! 18:00       as a time of day: 12000 ticks after dawn
//! ```

use crate::error::TravelError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const TICKS_PER_DAY: u64 = 24_000;
pub const TICKS_PER_HOUR: u64 = 1_000;
/// Clock hour at tick 0.
const DAWN_HOUR: u64 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Day,
    Hour,
    Minute,
    Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Amount(u64, Unit),
    Clock { hours: u64, minutes: u64 },
}

fn tokenize(input: &str) -> Result<Vec<Token>, TravelError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut digits = String::new();
        while let Some(c) = chars.next_if(|c| c.is_ascii_digit()) {
            digits.push(c);
        }
        if digits.is_empty() {
            return Err(TravelError::syntax("expected a number", input));
        }
        let value: u64 = digits
            .parse()
            .map_err(|_| TravelError::syntax("number out of range", input))?;

        let token = match chars.next().map(|c| c.to_ascii_lowercase()) {
            Some('d') => Token::Amount(value, Unit::Day),
            Some('h') => Token::Amount(value, Unit::Hour),
            Some('m') => Token::Amount(value, Unit::Minute),
            Some('t') => Token::Amount(value, Unit::Tick),
            Some(':') => {
                let minutes: String = (0..2).filter_map(|_| chars.next_if(|c| c.is_ascii_digit())).collect();
                if minutes.len() != 2 {
                    return Err(TravelError::syntax("expected HH:MM", input));
                }
                let minutes: u64 = minutes
                    .parse()
                    .map_err(|_| TravelError::syntax("expected HH:MM", input))?;
                if value >= 24 || minutes >= 60 {
                    return Err(TravelError::syntax("clock time out of range", input));
                }
                Token::Clock {
                    hours: value,
                    minutes,
                }
            }
            _ => return Err(TravelError::syntax("expected unit d, h, m, t or HH:MM", input)),
        };
        tokens.push(token);
    }

    if tokens.is_empty() {
        return Err(TravelError::syntax("empty time", input));
    }
    Ok(tokens)
}

/// Sums whole ticks and minutes separately; minutes convert once at the end.
fn sum_tokens(
    input: &str,
    tokens: &[Token],
    clock: impl Fn(u64, u64) -> (u64, u64),
) -> Result<u64, TravelError> {
    let overflow = || TravelError::syntax("time out of range", input);
    let mut ticks: u64 = 0;
    let mut minutes: u64 = 0;

    for token in tokens {
        let (t, m) = match *token {
            Token::Amount(n, Unit::Day) => (n.checked_mul(TICKS_PER_DAY).ok_or_else(overflow)?, 0),
            Token::Amount(n, Unit::Hour) => (n.checked_mul(TICKS_PER_HOUR).ok_or_else(overflow)?, 0),
            Token::Amount(n, Unit::Minute) => (0, n),
            Token::Amount(n, Unit::Tick) => (n, 0),
            Token::Clock { hours, minutes } => clock(hours, minutes),
        };
        ticks = ticks.checked_add(t).ok_or_else(overflow)?;
        minutes = minutes.checked_add(m).ok_or_else(overflow)?;
    }

    let minute_ticks = minutes.checked_mul(TICKS_PER_HOUR).ok_or_else(overflow)? / 60;
    ticks.checked_add(minute_ticks).ok_or_else(overflow)
}

/// Writes the sub-hour remainder as minutes when exact, else as ticks.
fn write_remainder(f: &mut fmt::Formatter<'_>, ticks: u64) -> fmt::Result {
    if (ticks * 60) % TICKS_PER_HOUR == 0 {
        write!(f, "{}m", ticks * 60 / TICKS_PER_HOUR)
    } else {
        write!(f, "{ticks}t")
    }
}

/// A span of world time in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct GameDuration(pub u64);

impl GameDuration {
    pub const fn ticks(self) -> u64 {
        self.0
    }
}

impl FromStr for GameDuration {
    type Err = TravelError;

    /// `HH:MM` inside a duration means HH hours plus MM minutes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens = tokenize(s)?;
        sum_tokens(s, &tokens, |hours, minutes| (hours * TICKS_PER_HOUR, minutes)).map(Self)
    }
}

impl fmt::Display for GameDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.0 / TICKS_PER_DAY;
        let hours = (self.0 % TICKS_PER_DAY) / TICKS_PER_HOUR;
        let rest = self.0 % TICKS_PER_HOUR;

        if days > 0 {
            write!(f, "{days}d")?;
        }
        if hours > 0 {
            write!(f, "{hours}h")?;
        }
        if rest > 0 || self.0 == 0 {
            write_remainder(f, rest)?;
        }
        Ok(())
    }
}

/// A point within a day, in ticks after dawn (always below [`TICKS_PER_DAY`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TimeOfDay(u32);

impl TimeOfDay {
    pub fn from_ticks(ticks: u64) -> Self {
        Self((ticks % TICKS_PER_DAY) as u32)
    }

    /// Time of day shown at absolute `world_time`.
    pub fn of_world_time(world_time: u64) -> Self {
        Self::from_ticks(world_time)
    }

    pub const fn ticks(self) -> u64 {
        self.0 as u64
    }
}

impl FromStr for TimeOfDay {
    type Err = TravelError;

    /// `HH:MM` is a clock reading; unit tokens are offsets from dawn.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens = tokenize(s)?;
        let ticks = sum_tokens(s, &tokens, |hours, minutes| {
            (((hours + 24 - DAWN_HOUR) % 24) * TICKS_PER_HOUR, minutes)
        })?;
        Ok(Self::from_ticks(ticks))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ticks = self.ticks();
        let rest = ticks % TICKS_PER_HOUR;
        if (rest * 60) % TICKS_PER_HOUR == 0 {
            let hours = (ticks / TICKS_PER_HOUR + DAWN_HOUR) % 24;
            write!(f, "{:02}:{:02}", hours, rest * 60 / TICKS_PER_HOUR)
        } else {
            write!(f, "{ticks}t")
        }
    }
}

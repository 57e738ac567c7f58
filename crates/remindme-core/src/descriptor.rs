//! Reminder descriptors and the wire-format parser.
//!
//! A submission travels as `<destination>|<timespec>|<message>`. The payload
//! is split on the first two `|` only, so the message may itself contain `|`.
//!
//! | Destination | Timespec | Meaning                               |
//! |-------------|----------|---------------------------------------|
//! | `at`        | `HH:MM`  | next local clock time `HH:MM`         |
//! | `in`        | `<n>m`, `<n>h` | `n` minutes / hours from now    |
//! | `on`        | `MM/DD`  | next local calendar date `MM/DD`      |

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ParseError;

/// Separator between the three wire fields.
pub const FIELD_SEPARATOR: char = '|';

/// The three-way selector for timing semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    At,
    In,
    On,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::At => "at",
            Destination::In => "in",
            Destination::On => "on",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Destination {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "at" => Ok(Destination::At),
            "in" => Ok(Destination::In),
            "on" => Ok(Destination::On),
            other => Err(ParseError::UnknownDestination(other.to_string())),
        }
    }
}

/// Unit of a relative duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DurationUnit {
    Minutes,
    Hours,
}

impl DurationUnit {
    fn seconds(&self) -> u64 {
        match self {
            DurationUnit::Minutes => 60,
            DurationUnit::Hours => 3_600,
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            DurationUnit::Minutes => "m",
            DurationUnit::Hours => "h",
        }
    }
}

/// When a reminder should fire. Kind and payload live in one variant, so a
/// clock time can never carry a duration payload and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum When {
    /// Next occurrence of `hour:minute` on the local clock.
    AbsoluteClockTime { hour: u8, minute: u8 },
    /// `magnitude` units from the moment of registration.
    RelativeDuration { magnitude: u64, unit: DurationUnit },
    /// Next occurrence of `month/day` on the local calendar.
    CalendarDate { month: u8, day: u8 },
}

impl When {
    pub fn destination(&self) -> Destination {
        match self {
            When::AbsoluteClockTime { .. } => Destination::At,
            When::RelativeDuration { .. } => Destination::In,
            When::CalendarDate { .. } => Destination::On,
        }
    }

    /// Short kind label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            When::AbsoluteClockTime { .. } => "absolute_clock_time",
            When::RelativeDuration { .. } => "relative_duration",
            When::CalendarDate { .. } => "calendar_date",
        }
    }

    /// The delay of a relative duration, `None` for absolute kinds.
    pub fn delay(&self) -> Option<Duration> {
        match self {
            When::RelativeDuration { magnitude, unit } => {
                Some(Duration::from_secs(magnitude.saturating_mul(unit.seconds())))
            }
            _ => None,
        }
    }

    /// Canonical timespec text, e.g. `09:16`, `5m`, `08/17`.
    pub fn timespec(&self) -> String {
        match self {
            When::AbsoluteClockTime { hour, minute } => format!("{hour:02}:{minute:02}"),
            When::RelativeDuration { magnitude, unit } => format!("{magnitude}{}", unit.suffix()),
            When::CalendarDate { month, day } => format!("{month:02}/{day:02}"),
        }
    }

    fn check(&self) -> Result<(), ParseError> {
        match *self {
            When::AbsoluteClockTime { hour, minute } => {
                if hour > 23 {
                    return Err(ParseError::format("at", format!("hour {hour} is out of range 0-23")));
                }
                if minute > 59 {
                    return Err(ParseError::format(
                        "at",
                        format!("minute {minute} is out of range 0-59"),
                    ));
                }
            }
            When::RelativeDuration { magnitude, unit } => {
                if magnitude.checked_mul(unit.seconds()).is_none() {
                    return Err(ParseError::InvalidDuration(self.timespec()));
                }
            }
            When::CalendarDate { month, day } => {
                if !(1..=12).contains(&month) {
                    return Err(ParseError::format("on", format!("month {month} is out of range 1-12")));
                }
                if !(1..=31).contains(&day) {
                    return Err(ParseError::format("on", format!("day {day} is out of range 1-31")));
                }
            }
        }
        Ok(())
    }
}

/// A fully parsed reminder request. Only constructed through [`parse`] or
/// [`Descriptor::new`], both of which validate every field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    when: When,
    message: String,
}

impl Descriptor {
    pub fn new(when: When, message: impl Into<String>) -> Result<Self, ParseError> {
        let message = message.into();
        when.check()?;
        if message.is_empty() {
            return Err(ParseError::format(when.destination().as_str(), "message is empty"));
        }
        Ok(Self { when, message })
    }

    pub fn when(&self) -> &When {
        &self.when
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Render back to the wire format.
    pub fn encode(&self) -> String {
        join_fields(
            self.when.destination().as_str(),
            &self.when.timespec(),
            &self.message,
        )
    }
}

impl FromStr for Descriptor {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Join the three CLI fields into a wire payload.
pub fn join_fields(destination: &str, timespec: &str, message: &str) -> String {
    format!("{destination}{FIELD_SEPARATOR}{timespec}{FIELD_SEPARATOR}{message}")
}

/// Parse a raw `<destination>|<timespec>|<message>` payload.
pub fn parse(raw: &str) -> Result<Descriptor, ParseError> {
    let mut fields = raw.splitn(3, FIELD_SEPARATOR);
    let raw_destination = fields.next().unwrap_or_default();
    let destination = raw_destination.parse::<Destination>()?;
    let (timespec, message) = match (fields.next(), fields.next()) {
        (Some(timespec), Some(message)) => (timespec, message),
        _ => {
            return Err(ParseError::format(
                raw_destination,
                "expected <destination>|<timespec>|<message>",
            ))
        }
    };

    let when = match destination {
        Destination::At => parse_clock_time(timespec)?,
        Destination::In => parse_duration(timespec)?,
        Destination::On => parse_calendar_date(timespec)?,
    };

    Descriptor::new(when, message)
}

fn parse_clock_time(timespec: &str) -> Result<When, ParseError> {
    let (hour, minute) = timespec
        .split_once(':')
        .ok_or_else(|| ParseError::format("at", format!("'{timespec}' is not HH:MM")))?;
    Ok(When::AbsoluteClockTime {
        hour: parse_field("at", "hour", hour)?,
        minute: parse_field("at", "minute", minute)?,
    })
}

fn parse_calendar_date(timespec: &str) -> Result<When, ParseError> {
    let (month, day) = timespec
        .split_once('/')
        .ok_or_else(|| ParseError::format("on", format!("'{timespec}' is not MM/DD")))?;
    Ok(When::CalendarDate {
        month: parse_field("on", "month", month)?,
        day: parse_field("on", "day", day)?,
    })
}

fn parse_field(destination: &str, name: &str, text: &str) -> Result<u8, ParseError> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::format(
            destination,
            format!("{name} '{text}' is not a non-negative integer"),
        ));
    }
    // Leading zeros are allowed, so parse wide before narrowing.
    text.parse::<u32>()
        .ok()
        .and_then(|n| u8::try_from(n).ok())
        .ok_or_else(|| ParseError::format(destination, format!("{name} '{text}' is out of range")))
}

fn parse_duration(timespec: &str) -> Result<When, ParseError> {
    let split = timespec
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_alphabetic())
        .last()
        .map(|(i, _)| i)
        .unwrap_or(timespec.len());
    let (digits, suffix) = timespec.split_at(split);

    let unit = match suffix {
        "m" => DurationUnit::Minutes,
        "h" => DurationUnit::Hours,
        "" => return Err(ParseError::InvalidDuration(timespec.to_string())),
        other => return Err(ParseError::UnsupportedUnit(other.to_string())),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidDuration(timespec.to_string()));
    }
    let magnitude = digits
        .parse::<u64>()
        .map_err(|_| ParseError::InvalidDuration(timespec.to_string()))?;

    Ok(When::RelativeDuration { magnitude, unit })
}

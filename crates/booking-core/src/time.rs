//! Time-of-day primitives shared by the availability engine and the selector.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveTime;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Days of the week, as written in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Returns Saturday and Sunday.
    pub fn weekends() -> Vec<Weekday> {
        vec![Weekday::Saturday, Weekday::Sunday]
    }

    /// Converts from chrono's Weekday.
    pub fn from_chrono(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

/// Half of the day shown next to a 12-hour clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Am,
    Pm,
}

impl Period {
    /// Returns the period a 24-hour clock hour belongs to.
    pub fn of_hour(hour: u8) -> Self {
        if hour < 12 {
            Period::Am
        } else {
            Period::Pm
        }
    }

    /// Range of 24-hour clock hours covered by this period.
    pub fn hours(self) -> std::ops::RangeInclusive<u8> {
        match self {
            Period::Am => 0..=11,
            Period::Pm => 12..=23,
        }
    }

    /// Converts a 12-hour clock hour (1-12) in this period to 0-23.
    pub fn to_24h(self, hour12: u8) -> u8 {
        let base = hour12 % 12;
        match self {
            Period::Am => base,
            Period::Pm => base + 12,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Am => "AM",
            Period::Pm => "PM",
        }
    }
}

fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("valid time pattern"))
}

/// Time of day represented as hour and minute.
///
/// Serialized as `"HH:MM"` so configuration files stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    /// Hour (0-23).
    pub hour: u8,
    /// Minute (0-59).
    pub minute: u8,
}

impl TimeOfDay {
    /// Creates a new TimeOfDay.
    ///
    /// # Panics
    /// Panics if hour >= 24 or minute >= 60.
    pub fn new(hour: u8, minute: u8) -> Self {
        assert!(hour < 24, "hour must be 0-23");
        assert!(minute < 60, "minute must be 0-59");
        Self { hour, minute }
    }

    /// Creates a TimeOfDay, rejecting out-of-range values.
    pub fn try_new(hour: u8, minute: u8) -> Result<Self> {
        if hour >= 24 || minute >= 60 {
            return Err(ConfigError::InvalidTime(format!("{hour}:{minute}")));
        }
        Ok(Self { hour, minute })
    }

    /// Creates a TimeOfDay from hour only (minute = 0).
    pub fn from_hour(hour: u8) -> Self {
        Self::new(hour, 0)
    }

    /// Converts to minutes since midnight for comparison.
    pub fn to_minutes(&self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }

    /// Creates from minutes since midnight.
    pub fn from_minutes(minutes: u16) -> Self {
        Self::new((minutes / 60) as u8, (minutes % 60) as u8)
    }

    /// Converts to a chrono NaiveTime with zero seconds.
    pub fn to_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour as u32, self.minute as u32, 0)
            .unwrap_or(NaiveTime::MIN)
    }

    pub fn period(&self) -> Period {
        Period::of_hour(self.hour)
    }

    /// Hour on a 12-hour clock (1-12).
    pub fn hour12(&self) -> u8 {
        match self.hour % 12 {
            0 => 12,
            h => h,
        }
    }
}

impl PartialOrd for TimeOfDay {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeOfDay {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.to_minutes().cmp(&other.to_minutes())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let caps = time_pattern()
            .captures(s.trim())
            .ok_or_else(|| ConfigError::InvalidTime(s.to_string()))?;
        let hour: u8 = caps[1]
            .parse()
            .map_err(|_| ConfigError::InvalidTime(s.to_string()))?;
        let minute: u8 = caps[2]
            .parse()
            .map_err(|_| ConfigError::InvalidTime(s.to_string()))?;
        Self::try_new(hour, minute).map_err(|_| ConfigError::InvalidTime(s.to_string()))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// Selectable minutes within every hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct MinuteGrid {
    step: u8,
}

impl MinuteGrid {
    /// Default step between selectable minutes.
    pub const DEFAULT_STEP: u8 = 15;

    /// Creates a grid; the step must divide 60.
    pub fn new(step: u8) -> Result<Self> {
        if step == 0 || step > 60 || 60 % step != 0 {
            return Err(ConfigError::InvalidMinuteStep(step));
        }
        Ok(Self { step })
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    /// Returns the selectable minutes in ascending order.
    pub fn minutes(&self) -> impl Iterator<Item = u8> {
        (0..60).step_by(self.step as usize)
    }

    pub fn contains(&self, minute: u8) -> bool {
        minute < 60 && minute % self.step == 0
    }

    /// Rounds a minute down onto the grid.
    pub fn floor(&self, minute: u8) -> u8 {
        minute.min(59) / self.step * self.step
    }
}

impl Default for MinuteGrid {
    fn default() -> Self {
        Self {
            step: Self::DEFAULT_STEP,
        }
    }
}

impl TryFrom<u8> for MinuteGrid {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<MinuteGrid> for u8 {
    fn from(value: MinuteGrid) -> Self {
        value.step
    }
}

/// Inclusive range of bookable times within a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// First bookable time.
    pub start: TimeOfDay,
    /// Last bookable time.
    pub end: TimeOfDay,
}

impl TimeWindow {
    /// Creates a window, rejecting a start after the end.
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Result<Self> {
        if start > end {
            return Err(ConfigError::InvertedWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a window from whole hours.
    ///
    /// # Panics
    /// Panics if either hour is out of range or `start_hour > end_hour`.
    pub fn from_hours(start_hour: u8, end_hour: u8) -> Self {
        assert!(start_hour <= end_hour, "start hour must not be after end hour");
        Self {
            start: TimeOfDay::from_hour(start_hour),
            end: TimeOfDay::from_hour(end_hour),
        }
    }

    /// Checks if a time falls within this window (both ends inclusive).
    pub fn contains(&self, time: TimeOfDay) -> bool {
        time >= self.start && time <= self.end
    }

    /// Checks if an hour overlaps this window.
    pub fn contains_hour(&self, hour: u8) -> bool {
        hour >= self.start.hour && hour <= self.end.hour
    }

    /// Checks the boundaries against the grid and, for general windows, the hour.
    pub fn validate(&self, grid: MinuteGrid, hour_aligned: bool) -> Result<()> {
        if self.start > self.end {
            return Err(ConfigError::InvertedWindow {
                start: self.start,
                end: self.end,
            });
        }
        for edge in [self.start, self.end] {
            if hour_aligned && edge.minute != 0 {
                return Err(ConfigError::NotHourAligned(edge));
            }
            if !grid.contains(edge.minute) {
                return Err(ConfigError::OffGrid(edge, grid.step()));
            }
        }
        Ok(())
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

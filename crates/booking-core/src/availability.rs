//! Availability rules for appointment booking.
//!
//! A [`Schedule`] maps a calendar date to the window of times that can be
//! booked on it.
//!
//! ## Resolution Order
//!
//! 1. Date-keyed exceptions - always open, with exactly the exception window
//! 2. Blackout ranges - closed
//! 3. Weekly rule for the weekday - open or closed
//! 4. Default window
//!
//! The first source that matches decides; sources are never merged.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::time::{MinuteGrid, Period, TimeOfDay, TimeWindow, Weekday};

/// Which rule produced an open window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSource {
    /// A per-date exception.
    Exception,
    /// The weekly rule for the weekday.
    Weekly,
    /// The fallback window.
    Default,
}

/// Effective availability of one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// No time is bookable.
    Closed,
    /// Times within `window` are bookable.
    Open {
        window: TimeWindow,
        source: WindowSource,
    },
}

impl Availability {
    pub fn is_open(&self) -> bool {
        matches!(self, Availability::Open { .. })
    }

    /// Returns the window if open.
    pub fn window(&self) -> Option<TimeWindow> {
        match self {
            Availability::Closed => None,
            Availability::Open { window, .. } => Some(*window),
        }
    }
}

/// An inclusive span of dates that is closed unless an exception says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlackoutRange {
    /// First closed date.
    pub from: NaiveDate,
    /// Last closed date.
    pub to: NaiveDate,
}

impl BlackoutRange {
    /// Creates a range, rejecting `from > to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(ConfigError::InvertedBlackout { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }
}

/// A selectable option in an hour or minute dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotOption {
    /// Hour (0-23) or minute (0-59), depending on the list.
    pub value: u8,
    /// Whether the option can be picked.
    pub enabled: bool,
}

/// Booking availability rules.
///
/// Weekly entries map a weekday to `Some(window)` (open) or `None` (closed);
/// weekdays without an entry fall back to the default window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schedule {
    /// Step between selectable minutes.
    pub minute_step: MinuteGrid,
    /// Window used when no other rule matches.
    pub default_window: TimeWindow,
    /// Recurring weekly rules. Entries read from a file are merged over the
    /// clinic defaults, so weekdays left out keep their built-in rule.
    #[serde(deserialize_with = "merge_weekly")]
    pub weekly: HashMap<Weekday, Option<TimeWindow>>,
    /// Per-date overrides.
    pub exceptions: BTreeMap<NaiveDate, TimeWindow>,
    /// Closed date spans.
    pub blackouts: Vec<BlackoutRange>,
}

fn merge_weekly<'de, D>(
    deserializer: D,
) -> std::result::Result<HashMap<Weekday, Option<TimeWindow>>, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = HashMap::<Weekday, Option<TimeWindow>>::deserialize(deserializer)?;
    let mut weekly = Schedule::clinic_defaults().weekly;
    weekly.extend(overrides);
    Ok(weekly)
}

impl Default for Schedule {
    fn default() -> Self {
        Self::clinic_defaults()
    }
}

impl Schedule {
    /// Creates a schedule with only a default window and closed weekends.
    pub fn new(default_window: TimeWindow) -> Self {
        let weekly = Weekday::weekends().into_iter().map(|d| (d, None)).collect();
        Self {
            minute_step: MinuteGrid::default(),
            default_window,
            weekly,
            exceptions: BTreeMap::new(),
            blackouts: Vec::new(),
        }
    }

    /// Clinic opening hours: Monday 12-19, Tuesday to Friday 10-19, weekends closed.
    pub fn clinic_defaults() -> Self {
        let mut schedule = Self::new(TimeWindow::from_hours(8, 20));
        schedule.set_weekly(Weekday::Monday, Some(TimeWindow::from_hours(12, 19)));
        for day in [
            Weekday::Tuesday,
            Weekday::Wednesday,
            Weekday::Thursday,
            Weekday::Friday,
        ] {
            schedule.set_weekly(day, Some(TimeWindow::from_hours(10, 19)));
        }
        schedule
    }

    /// Sets the weekly rule for a weekday (`None` closes it).
    pub fn set_weekly(&mut self, day: Weekday, window: Option<TimeWindow>) {
        self.weekly.insert(day, window);
    }

    /// Removes the weekly rule so the weekday uses the default window.
    pub fn clear_weekly(&mut self, day: Weekday) {
        self.weekly.remove(&day);
    }

    /// Adds or replaces an exception for a date.
    pub fn add_exception(&mut self, date: NaiveDate, window: TimeWindow) {
        self.exceptions.insert(date, window);
    }

    /// Removes the exception for a date.
    pub fn remove_exception(&mut self, date: NaiveDate) -> Option<TimeWindow> {
        self.exceptions.remove(&date)
    }

    pub fn add_blackout(&mut self, range: BlackoutRange) {
        self.blackouts.push(range);
    }

    pub fn set_minute_step(&mut self, grid: MinuteGrid) {
        self.minute_step = grid;
    }

    /// Checks every window and range against the construction rules.
    pub fn validate(&self) -> Result<()> {
        let grid = self.minute_step;
        self.default_window.validate(grid, true)?;
        for window in self.weekly.values().flatten() {
            window.validate(grid, true)?;
        }
        for window in self.exceptions.values() {
            window.validate(grid, false)?;
        }
        for range in &self.blackouts {
            if range.from > range.to {
                return Err(ConfigError::InvertedBlackout {
                    from: range.from,
                    to: range.to,
                });
            }
        }
        Ok(())
    }

    /// Resolves the effective availability of a date.
    pub fn resolve(&self, date: NaiveDate) -> Availability {
        if let Some(window) = self.exceptions.get(&date) {
            debug!(%date, %window, "exception window");
            return Availability::Open {
                window: *window,
                source: WindowSource::Exception,
            };
        }

        if self.blackouts.iter().any(|range| range.contains(date)) {
            debug!(%date, "date inside blackout range");
            return Availability::Closed;
        }

        let day = Weekday::from_chrono(date.weekday());
        match self.weekly.get(&day) {
            Some(Some(window)) => Availability::Open {
                window: *window,
                source: WindowSource::Weekly,
            },
            Some(None) => Availability::Closed,
            None => Availability::Open {
                window: self.default_window,
                source: WindowSource::Default,
            },
        }
    }

    /// Returns true if any time is bookable on the date.
    pub fn is_open(&self, date: NaiveDate) -> bool {
        self.resolve(date).is_open()
    }

    /// Returns true if the hour lies within the window of the date.
    pub fn hour_allowed(&self, date: NaiveDate, hour: u8) -> bool {
        self.resolve(date)
            .window()
            .is_some_and(|w| w.contains_hour(hour))
    }

    /// Returns true if `hour:minute` can be booked on the date.
    ///
    /// The minute must be on the grid and the time must lie within the exact
    /// window bounds, so the closing hour of a general window only accepts
    /// minute 0 and an exception starting at 15:30 rejects 15:00 and 15:15.
    pub fn minute_allowed(&self, date: NaiveDate, hour: u8, minute: u8) -> bool {
        let Some(window) = self.resolve(date).window() else {
            return false;
        };
        if !window.contains_hour(hour) || !self.minute_step.contains(minute) {
            return false;
        }
        window.contains(TimeOfDay::new(hour, minute))
    }

    /// Returns true if the full time can be booked on the date.
    pub fn time_allowed(&self, date: NaiveDate, time: TimeOfDay) -> bool {
        self.minute_allowed(date, time.hour, time.minute)
    }

    /// Moves a time to the nearest bookable time on the date.
    ///
    /// Times before the window become its start, times after it its end, and
    /// times inside it have their minute rounded down onto the grid. Returns
    /// `None` if the date is closed.
    pub fn clamp_to_window(&self, date: NaiveDate, hour: u8, minute: u8) -> Option<TimeOfDay> {
        let window = self.resolve(date).window()?;
        let (hour, minute) = (hour.min(23), minute.min(59));
        let minutes = hour as u16 * 60 + minute as u16;

        if minutes <= window.start.to_minutes() {
            return Some(window.start);
        }
        if minutes >= window.end.to_minutes() {
            return Some(window.end);
        }

        let snapped = TimeOfDay::new(hour, self.minute_step.floor(minute));
        Some(snapped.max(window.start))
    }

    /// Returns the earliest bookable time on the date.
    pub fn first_available(&self, date: NaiveDate) -> Option<TimeOfDay> {
        self.resolve(date).window().map(|w| w.start)
    }

    /// Returns every bookable time on the date, in order.
    pub fn slots(&self, date: NaiveDate) -> Vec<TimeOfDay> {
        let Some(window) = self.resolve(date).window() else {
            return Vec::new();
        };
        (window.start.hour..=window.end.hour)
            .flat_map(|hour| {
                self.minute_step
                    .minutes()
                    .map(move |minute| TimeOfDay::new(hour, minute))
            })
            .filter(|time| window.contains(*time))
            .collect()
    }

    /// Lists all 24 hours with their enabled state for the date.
    pub fn hour_options(&self, date: NaiveDate) -> Vec<SlotOption> {
        let window = self.resolve(date).window();
        (0..24)
            .map(|hour| SlotOption {
                value: hour,
                enabled: window.is_some_and(|w| w.contains_hour(hour)),
            })
            .collect()
    }

    /// Lists the grid minutes with their enabled state for the date and hour.
    pub fn minute_options(&self, date: NaiveDate, hour: u8) -> Vec<SlotOption> {
        self.minute_step
            .minutes()
            .map(|minute| SlotOption {
                value: minute,
                enabled: self.minute_allowed(date, hour, minute),
            })
            .collect()
    }

    /// Returns true if any bookable hour of the date falls in the period.
    pub fn period_allowed(&self, date: NaiveDate, period: Period) -> bool {
        period.hours().any(|hour| self.hour_allowed(date, hour))
    }
}

//! Date and time selection constrained by a [`Schedule`].
//!
//! The selector is a small state machine:
//!
//! - `NoDateSelected` - nothing picked yet
//! - `DateSelectedClosed` - the picked date has no bookable hours
//! - `DateSelectedOpen` - a date and a valid time are held
//!
//! Picking a date re-evaluates the state from scratch. Editing the hour,
//! minute or period repairs the time through [`Schedule::clamp_to_window`].
//! Subscribers are told about the combined timestamp only when it changes.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::availability::Schedule;
use crate::calendar::is_selectable;
use crate::error::BookingError;
use crate::time::{Period, TimeOfDay};

/// Callback invoked with the new combined timestamp.
pub type SelectionCallback = Arc<dyn Fn(Option<NaiveDateTime>) + Send + Sync>;

/// What happens to the chosen time when a different date is picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateChangePolicy {
    /// Always move to the first available time of the new date.
    #[default]
    Snap,
    /// Keep the previous time, clamped into the new window.
    Clamp,
}

/// Current selector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectorState {
    #[default]
    NoDateSelected,
    DateSelectedClosed {
        date: NaiveDate,
    },
    DateSelectedOpen {
        date: NaiveDate,
        time: TimeOfDay,
    },
}

impl SelectorState {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            SelectorState::NoDateSelected => None,
            SelectorState::DateSelectedClosed { date }
            | SelectorState::DateSelectedOpen { date, .. } => Some(*date),
        }
    }

    pub fn time(&self) -> Option<TimeOfDay> {
        match self {
            SelectorState::DateSelectedOpen { time, .. } => Some(*time),
            _ => None,
        }
    }

    /// Combined date and time, seconds zeroed.
    pub fn picked(&self) -> Option<NaiveDateTime> {
        match self {
            SelectorState::DateSelectedOpen { date, time } => {
                Some(date.and_time(time.to_naive_time()))
            }
            _ => None,
        }
    }
}

/// Stateful date/time picker.
pub struct DateTimeSelector {
    schedule: Schedule,
    policy: DateChangePolicy,
    state: SelectorState,
    last_emitted: Option<NaiveDateTime>,
    subscribers: Vec<SelectionCallback>,
}

impl std::fmt::Debug for DateTimeSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DateTimeSelector")
            .field("policy", &self.policy)
            .field("state", &self.state)
            .field("last_emitted", &self.last_emitted)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl DateTimeSelector {
    /// Creates a selector with the default date-change policy.
    pub fn new(schedule: Schedule) -> Self {
        Self::with_policy(schedule, DateChangePolicy::default())
    }

    pub fn with_policy(schedule: Schedule, policy: DateChangePolicy) -> Self {
        Self {
            schedule,
            policy,
            state: SelectorState::NoDateSelected,
            last_emitted: None,
            subscribers: Vec::new(),
        }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn state(&self) -> SelectorState {
        self.state
    }

    pub fn policy(&self) -> DateChangePolicy {
        self.policy
    }

    pub fn picked(&self) -> Option<NaiveDateTime> {
        self.state.picked()
    }

    /// Registers a callback for timestamp changes.
    pub fn subscribe(&mut self, callback: SelectionCallback) {
        self.subscribers.push(callback);
    }

    /// Picks a date and re-evaluates the state from scratch.
    ///
    /// Returns true if the combined timestamp changed.
    pub fn select_date(&mut self, date: NaiveDate) -> bool {
        let previous = self.state.time();
        self.state = match self.schedule.resolve(date).window() {
            None => SelectorState::DateSelectedClosed { date },
            Some(_) => {
                let time = match (self.policy, previous) {
                    (DateChangePolicy::Clamp, Some(prev)) => {
                        self.schedule.clamp_to_window(date, prev.hour, prev.minute)
                    }
                    _ => self.schedule.first_available(date),
                };
                match time {
                    Some(time) => SelectorState::DateSelectedOpen { date, time },
                    None => SelectorState::DateSelectedClosed { date },
                }
            }
        };
        debug!(%date, state = ?self.state, "date selected");
        self.emit_if_changed()
    }

    /// Picks a date, refusing days before `today`.
    pub fn select_date_from(
        &mut self,
        date: NaiveDate,
        today: NaiveDate,
    ) -> std::result::Result<bool, BookingError> {
        if date < today {
            return Err(BookingError::PastDate(date));
        }
        Ok(self.select_date(date))
    }

    /// Returns true if `date` can be picked relative to `today`.
    pub fn is_selectable(&self, date: NaiveDate, today: NaiveDate) -> bool {
        is_selectable(date, today, &self.schedule)
    }

    /// Sets the hour (0-23), repairing the minute if needed.
    pub fn set_hour(&mut self, hour: u8) -> bool {
        let Some(time) = self.state.time() else {
            return false;
        };
        self.set_time(hour, time.minute)
    }

    /// Sets the minute, repairing it onto the window.
    pub fn set_minute(&mut self, minute: u8) -> bool {
        let Some(time) = self.state.time() else {
            return false;
        };
        self.set_time(time.hour, minute)
    }

    /// Switches between AM and PM, keeping the 12-hour clock hour.
    pub fn set_period(&mut self, period: Period) -> bool {
        let Some(time) = self.state.time() else {
            return false;
        };
        if time.period() == period {
            return false;
        }
        self.set_time(period.to_24h(time.hour12()), time.minute)
    }

    /// Sets hour and minute together, clamping into the window of the date.
    pub fn set_time(&mut self, hour: u8, minute: u8) -> bool {
        let SelectorState::DateSelectedOpen { date, .. } = self.state else {
            return false;
        };
        if let Some(time) = self.schedule.clamp_to_window(date, hour, minute) {
            if (time.hour, time.minute) != (hour, minute) {
                debug!(%date, requested = %format!("{hour:02}:{minute:02}"), repaired = %time, "time repaired");
            }
            self.state = SelectorState::DateSelectedOpen { date, time };
        }
        self.emit_if_changed()
    }

    /// Re-checks the held selection against the current rules.
    pub fn repair(&mut self) -> bool {
        self.state = match self.state {
            SelectorState::NoDateSelected => SelectorState::NoDateSelected,
            SelectorState::DateSelectedClosed { date } => match self.schedule.first_available(date) {
                Some(time) => SelectorState::DateSelectedOpen { date, time },
                None => SelectorState::DateSelectedClosed { date },
            },
            SelectorState::DateSelectedOpen { date, time } => {
                match self.schedule.clamp_to_window(date, time.hour, time.minute) {
                    Some(time) => SelectorState::DateSelectedOpen { date, time },
                    None => SelectorState::DateSelectedClosed { date },
                }
            }
        };
        self.emit_if_changed()
    }

    /// Swaps the rules and repairs the selection against them.
    pub fn replace_schedule(&mut self, schedule: Schedule) -> bool {
        self.schedule = schedule;
        self.repair()
    }

    /// Returns to `NoDateSelected`.
    pub fn clear(&mut self) -> bool {
        self.state = SelectorState::NoDateSelected;
        self.emit_if_changed()
    }

    fn emit_if_changed(&mut self) -> bool {
        let current = self.state.picked();
        if current == self.last_emitted {
            return false;
        }
        self.last_emitted = current;
        for callback in &self.subscribers {
            callback(current);
        }
        true
    }
}

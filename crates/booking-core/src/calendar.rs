//! Month grid for the booking calendar.
//!
//! The grid always has six Monday-first weeks (42 cells); days of the
//! previous and next month fill the leading and trailing cells.

use chrono::{Datelike, Months, NaiveDate};

use crate::availability::Schedule;

/// Number of cells in a month grid.
pub const GRID_CELLS: usize = 42;

/// One day in the month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    /// False for leading/trailing days of adjacent months.
    pub in_current_month: bool,
    pub is_today: bool,
    /// Past or closed days cannot be picked.
    pub disabled: bool,
}

/// A month shown by the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthView {
    first: NaiveDate,
}

impl MonthView {
    /// Creates the view containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    /// Creates the view for a year and month (1-12).
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    /// Initial view: the month of `initial`, or of `today` if `initial` is in the past.
    pub fn initial(initial: Option<NaiveDate>, today: NaiveDate) -> Self {
        match initial {
            Some(date) if date >= today => Self::containing(date),
            _ => Self::containing(today),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn days_in_month(&self) -> u32 {
        self.next().first.pred_opt().map_or(31, |last| last.day())
    }

    /// Navigation before the month of `today` is not allowed.
    pub fn can_go_prev(&self, today: NaiveDate) -> bool {
        (self.year(), self.month()) > (today.year(), today.month())
    }

    pub fn next(&self) -> Self {
        Self {
            first: self.first + Months::new(1),
        }
    }

    /// Returns the previous month, or `None` if that would be before `today`.
    pub fn prev(&self, today: NaiveDate) -> Option<Self> {
        if !self.can_go_prev(today) {
            return None;
        }
        Some(Self {
            first: self.first - Months::new(1),
        })
    }

    /// Builds the 42 grid cells.
    pub fn cells(&self, today: NaiveDate, schedule: &Schedule) -> Vec<DayCell> {
        let leading = self.first.weekday().num_days_from_monday() as u64;
        let start = self.first - chrono::Days::new(leading);

        start
            .iter_days()
            .take(GRID_CELLS)
            .map(|date| DayCell {
                date,
                in_current_month: date.month() == self.month() && date.year() == self.year(),
                is_today: date == today,
                disabled: !is_selectable(date, today, schedule),
            })
            .collect()
    }

    /// Label such as `"October 2025"`.
    pub fn label(&self) -> String {
        self.first.format("%B %Y").to_string()
    }
}

/// A date can be picked if it is not in the past and has bookable hours.
pub fn is_selectable(date: NaiveDate, today: NaiveDate, schedule: &Schedule) -> bool {
    date >= today && schedule.is_open(date)
}

//! Booking Core - availability rules, date/time selection and the booking form.
//!
//! This crate holds everything of the booking flow that does not touch the
//! network. Submissions are sent by `booking-client`.
//!
//! ## Example
//!
//! ```
//! use booking_core::availability::Schedule;
//! use booking_core::selector::DateTimeSelector;
//! use booking_core::time::TimeOfDay;
//! use chrono::NaiveDate;
//!
//! let mut selector = DateTimeSelector::new(Schedule::clinic_defaults());
//! // 2025-10-13 is a Monday, open 12:00-19:00
//! selector.select_date(NaiveDate::from_ymd_opt(2025, 10, 13).unwrap());
//! assert_eq!(selector.state().time(), Some(TimeOfDay::new(12, 0)));
//! ```

pub mod availability;
pub mod calendar;
pub mod config;
pub mod confirmation;
pub mod error;
pub mod form;
pub mod offers;
pub mod selector;
pub mod session;
pub mod time;

pub use availability::{Availability, BlackoutRange, Schedule, WindowSource};
pub use config::BookingConfig;
pub use error::{BookingError, ConfigError};
pub use form::{BookingForm, BookingRequest, ClientContext, ContactFields};
pub use selector::{DateChangePolicy, DateTimeSelector, SelectorState};
pub use session::BookingSession;
pub use time::{MinuteGrid, Period, TimeOfDay, TimeWindow, Weekday};

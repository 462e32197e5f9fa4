//! Booking session: the single owner of selector, form, offers and overlay.
//!
//! Offer selection and date/time changes go through the session, which
//! writes them into the form directly. No global event bus is involved.

use std::time::Instant;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use crate::availability::Schedule;
use crate::config::BookingConfig;
use crate::confirmation::{CloseReason, ConfirmationPopup, Key};
use crate::error::BookingError;
use crate::form::{BookingForm, BookingRequest, ClientContext};
use crate::offers::OfferCatalog;
use crate::selector::{DateTimeSelector, SelectionCallback, SelectorState};
use crate::time::Period;

/// Message shown when a submission fails.
pub const SUBMIT_FAILURE_ALERT: &str = "Oups, une erreur est survenue. Merci de réessayer.";

/// Everything one visitor interacts with while booking.
#[derive(Debug)]
pub struct BookingSession {
    selector: DateTimeSelector,
    form: BookingForm,
    offers: OfferCatalog,
    confirmation: ConfirmationPopup,
    context: ClientContext,
}

impl BookingSession {
    pub fn new(
        selector: DateTimeSelector,
        form: BookingForm,
        offers: OfferCatalog,
        confirmation: ConfirmationPopup,
        context: ClientContext,
    ) -> Self {
        let mut session = Self {
            selector,
            form,
            offers,
            confirmation,
            context,
        };
        session.sync_picked();
        session
    }

    /// Builds a session from configuration.
    pub fn from_config(config: &BookingConfig) -> Self {
        Self::new(
            DateTimeSelector::with_policy(config.schedule.clone(), config.date_change_policy),
            BookingForm::with_unspecified_offer(config.unspecified_offer.clone()),
            config.offers.clone(),
            ConfirmationPopup::new(config.confirmation.clone()),
            config.client.clone(),
        )
    }

    pub fn schedule(&self) -> &Schedule {
        self.selector.schedule()
    }

    pub fn selector_state(&self) -> SelectorState {
        self.selector.state()
    }

    pub fn form(&self) -> &BookingForm {
        &self.form
    }

    /// Mutable access for contact fields and consent.
    pub fn form_mut(&mut self) -> &mut BookingForm {
        &mut self.form
    }

    pub fn offers(&self) -> &OfferCatalog {
        &self.offers
    }

    pub fn confirmation(&self) -> &ConfirmationPopup {
        &self.confirmation
    }

    pub fn context(&self) -> &ClientContext {
        &self.context
    }

    /// Registers an extra listener for timestamp changes.
    pub fn subscribe(&mut self, callback: SelectionCallback) {
        self.selector.subscribe(callback);
    }

    /// Picks a date; past dates are refused and leave the state untouched.
    ///
    /// A closed date is still selected (the state becomes
    /// `DateSelectedClosed` and the form loses its time) before
    /// `BookingError::DateClosed` is returned.
    pub fn select_date(&mut self, date: NaiveDate, today: NaiveDate) -> Result<(), BookingError> {
        self.selector.select_date_from(date, today)?;
        self.sync_picked();
        match self.selector.state() {
            SelectorState::DateSelectedClosed { date } => Err(BookingError::DateClosed(date)),
            _ => Ok(()),
        }
    }

    /// Sets hour and minute, repairing them into the window.
    pub fn set_time(&mut self, hour: u8, minute: u8) -> Result<(), BookingError> {
        self.require_open_date()?;
        self.selector.set_time(hour, minute);
        self.sync_picked();
        Ok(())
    }

    pub fn set_hour(&mut self, hour: u8) -> Result<(), BookingError> {
        self.require_open_date()?;
        self.selector.set_hour(hour);
        self.sync_picked();
        Ok(())
    }

    pub fn set_minute(&mut self, minute: u8) -> Result<(), BookingError> {
        self.require_open_date()?;
        self.selector.set_minute(minute);
        self.sync_picked();
        Ok(())
    }

    pub fn set_period(&mut self, period: Period) -> Result<(), BookingError> {
        self.require_open_date()?;
        self.selector.set_period(period);
        self.sync_picked();
        Ok(())
    }

    /// Swaps the rules, repairing any held selection.
    pub fn replace_schedule(&mut self, schedule: Schedule) {
        self.selector.replace_schedule(schedule);
        self.sync_picked();
    }

    /// Writes an offer from the catalog into the form.
    pub fn choose_offer(&mut self, title: &str) -> Result<(), BookingError> {
        if !self.offers.contains(title) {
            return Err(BookingError::UnknownOffer(title.to_string()));
        }
        self.form.set_offer(Some(title.to_string()));
        Ok(())
    }

    pub fn clear_offer(&mut self) {
        self.form.set_offer(None);
    }

    pub fn can_submit(&self) -> bool {
        self.form.can_submit()
    }

    /// Builds the request to send, or `None` if the submit control is disabled.
    pub fn prepare_submission(&mut self) -> Option<BookingRequest> {
        let request = self.form.begin_submit(&self.context)?;
        info!(
            picked_date = %request.picked_date,
            offer = %request.offer,
            "Booking submission started"
        );
        Some(request)
    }

    /// Clears the form and opens the confirmation overlay.
    pub fn submission_succeeded(&mut self, now: Instant) {
        self.form.finish_success();
        self.confirmation.show(now);
        info!("Booking submission succeeded");
    }

    /// Keeps the form for a retry and returns the alert text.
    pub fn submission_failed(&mut self, error: &dyn std::error::Error) -> &'static str {
        self.form.finish_failure();
        warn!(%error, "Booking submission failed");
        SUBMIT_FAILURE_ALERT
    }

    pub fn close_confirmation(&mut self) -> Option<CloseReason> {
        self.confirmation.close().then_some(CloseReason::Manual)
    }

    pub fn confirmation_key(&mut self, key: Key) -> Option<CloseReason> {
        self.confirmation.handle_key(key)
    }

    pub fn tick(&mut self, now: Instant) -> Option<CloseReason> {
        self.confirmation.tick(now)
    }

    pub fn picked(&self) -> Option<NaiveDateTime> {
        self.selector.picked()
    }

    fn require_open_date(&self) -> Result<(), BookingError> {
        match self.selector.state() {
            SelectorState::NoDateSelected => Err(BookingError::NoDateSelected),
            SelectorState::DateSelectedClosed { date } => Err(BookingError::DateClosed(date)),
            SelectorState::DateSelectedOpen { .. } => Ok(()),
        }
    }

    fn sync_picked(&mut self) {
        self.form.set_picked(self.selector.picked());
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;
    use std::time::Duration;

    use super::*;
    use crate::form::ContactFields;
    use crate::time::{TimeOfDay, TimeWindow};

    #[derive(Debug)]
    struct Unreachable;

    impl fmt::Display for Unreachable {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "connection refused")
        }
    }

    impl std::error::Error for Unreachable {}

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2025, 10, 13)
    }

    fn session() -> BookingSession {
        let mut config = BookingConfig::default();
        config.schedule.add_exception(
            date(2025, 10, 15),
            TimeWindow::new(TimeOfDay::new(15, 30), TimeOfDay::new(19, 0)).unwrap(),
        );
        config.client = ClientContext {
            page: "/".to_string(),
            user_agent: "test".to_string(),
            timezone: "Europe/Paris".to_string(),
        };
        BookingSession::from_config(&config)
    }

    fn fill(session: &mut BookingSession) {
        session
            .form_mut()
            .set_contact(ContactFields::new("Dupont", "Marie", "0601020304", "marie@example.com"));
        session.form_mut().set_consent(true);
    }

    #[test]
    fn picked_date_flows_into_form() {
        let mut session = session();
        session.select_date(date(2025, 10, 15), today()).unwrap();
        assert_eq!(
            session.form().picked(),
            Some(date(2025, 10, 15).and_hms_opt(15, 30, 0).unwrap())
        );

        session.set_time(16, 45).unwrap();
        assert_eq!(
            session.form().picked(),
            Some(date(2025, 10, 15).and_hms_opt(16, 45, 0).unwrap())
        );
    }

    #[test]
    fn closed_date_clears_form_time() {
        let mut session = session();
        session.select_date(date(2025, 10, 15), today()).unwrap();
        assert_eq!(
            session.select_date(date(2025, 10, 18), today()),
            Err(BookingError::DateClosed(date(2025, 10, 18)))
        );
        assert_eq!(
            session.selector_state(),
            SelectorState::DateSelectedClosed {
                date: date(2025, 10, 18)
            }
        );
        assert_eq!(session.form().picked(), None);
        assert_eq!(
            session.set_hour(12),
            Err(BookingError::DateClosed(date(2025, 10, 18)))
        );
    }

    #[test]
    fn time_edits_need_a_date() {
        let mut session = session();
        assert_eq!(session.set_minute(15), Err(BookingError::NoDateSelected));
        assert_eq!(session.set_period(Period::Pm), Err(BookingError::NoDateSelected));
    }

    #[test]
    fn past_date_is_refused() {
        let mut session = session();
        assert_eq!(
            session.select_date(date(2025, 10, 10), today()),
            Err(BookingError::PastDate(date(2025, 10, 10)))
        );
        assert_eq!(session.selector_state(), SelectorState::NoDateSelected);
    }

    #[test]
    fn offer_selection_goes_through_catalog() {
        let mut session = session();
        session.choose_offer("Bilan morphologique complet").unwrap();
        assert_eq!(session.form().offer(), Some("Bilan morphologique complet"));

        assert_eq!(
            session.choose_offer("Unknown"),
            Err(BookingError::UnknownOffer("Unknown".to_string()))
        );
        assert_eq!(session.form().offer(), Some("Bilan morphologique complet"));

        session.clear_offer();
        assert_eq!(session.form().offer(), None);
    }

    #[test]
    fn no_consent_means_no_request() {
        let mut session = session();
        fill(&mut session);
        session.form_mut().set_consent(false);
        assert!(!session.can_submit());
        assert!(session.prepare_submission().is_none());
    }

    #[test]
    fn success_resets_text_and_shows_confirmation() {
        let mut session = session();
        session.select_date(date(2025, 10, 13), today()).unwrap();
        fill(&mut session);
        session.choose_offer("Bilan morphologique complet").unwrap();

        let request = session.prepare_submission().unwrap();
        assert_eq!(request.picked_date, "2025-10-13 12:00:00");
        assert_eq!(request.timezone, "Europe/Paris");
        assert!(!session.can_submit());

        let now = Instant::now();
        session.submission_succeeded(now);
        assert_eq!(session.form().contact(), &ContactFields::default());
        assert_eq!(session.form().offer(), None);
        assert!(session.form().consent());
        assert_eq!(
            session.form().picked(),
            Some(date(2025, 10, 13).and_hms_opt(12, 0, 0).unwrap())
        );
        assert!(session.confirmation().is_open());

        assert_eq!(session.tick(now + Duration::from_millis(4000)), Some(CloseReason::Timeout));
        assert!(!session.confirmation().is_open());
    }

    #[test]
    fn failure_keeps_input_and_alerts() {
        let mut session = session();
        session.select_date(date(2025, 10, 14), today()).unwrap();
        fill(&mut session);
        session.prepare_submission().unwrap();

        let alert = session.submission_failed(&Unreachable);
        assert_eq!(alert, SUBMIT_FAILURE_ALERT);
        assert_eq!(session.form().contact().name, "Dupont");
        assert!(session.can_submit());
        assert!(!session.confirmation().is_open());
    }

    #[test]
    fn confirmation_can_be_closed() {
        let mut session = session();
        session.submission_succeeded(Instant::now());
        assert_eq!(session.confirmation_key(Key::Escape), Some(CloseReason::Escape));

        session.submission_succeeded(Instant::now());
        assert_eq!(session.close_confirmation(), Some(CloseReason::Manual));
        assert_eq!(session.close_confirmation(), None);
    }

    #[test]
    fn schedule_change_repairs_form_time() {
        let mut session = session();
        session.select_date(date(2025, 10, 14), today()).unwrap();
        session.set_time(10, 30).unwrap();

        let mut schedule = session.schedule().clone();
        schedule.add_exception(date(2025, 10, 14), TimeWindow::from_hours(14, 16));
        session.replace_schedule(schedule);
        assert_eq!(
            session.form().picked(),
            Some(date(2025, 10, 14).and_hms_opt(14, 0, 0).unwrap())
        );
    }
}

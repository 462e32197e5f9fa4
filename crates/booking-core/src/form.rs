//! Booking form state and request payload.
//!
//! Only presence is checked: every contact field must be non-blank and
//! consent must be given. Formats such as phone or email are not validated.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Label sent when no offer was chosen.
pub const DEFAULT_UNSPECIFIED_OFFER: &str = "Non précisé";

/// Format of the picked date on the wire, in local time.
pub const LOCAL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Environment the request is sent from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientContext {
    /// Path of the page hosting the form.
    pub page: String,
    pub user_agent: String,
    /// IANA timezone name, empty if unknown.
    pub timezone: String,
}

impl Default for ClientContext {
    fn default() -> Self {
        Self {
            page: "/".to_string(),
            user_agent: format!("clinic-booking/{}", env!("CARGO_PKG_VERSION")),
            timezone: resolve_timezone(std::env::var("TZ").ok()),
        }
    }
}

/// Picks the IANA zone name: `TZ` if set, otherwise the system zone.
fn resolve_timezone(tz_env: Option<String>) -> String {
    tz_env
        .map(|tz| tz.trim_start_matches(':').trim().to_string())
        .filter(|tz| !tz.is_empty())
        .or_else(|| iana_time_zone::get_timezone().ok())
        .unwrap_or_default()
}

/// Contact details typed by the visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFields {
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub email: String,
}

impl ContactFields {
    pub fn new(
        name: impl Into<String>,
        surname: impl Into<String>,
        phone: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            surname: surname.into(),
            phone: phone.into(),
            email: email.into(),
        }
    }

    /// Returns true if every field has non-blank content.
    pub fn is_complete(&self) -> bool {
        [&self.name, &self.surname, &self.phone, &self.email]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// URL-encoded payload posted to the form endpoint.
///
/// Field names match what the endpoint expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingRequest {
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "prenom")]
    pub surname: String,
    #[serde(rename = "telephone")]
    pub phone: String,
    pub email: String,
    #[serde(rename = "offre")]
    pub offer: String,
    #[serde(rename = "pickedDate")]
    pub picked_date: String,
    #[serde(rename = "acceptGDPR")]
    pub consent: bool,
    pub page: String,
    #[serde(rename = "ua")]
    pub user_agent: String,
    #[serde(rename = "tz")]
    pub timezone: String,
}

impl BookingRequest {
    /// Encodes the request as an `application/x-www-form-urlencoded` body,
    /// exactly as it is posted.
    pub fn encode(&self) -> std::result::Result<String, serde_urlencoded::ser::Error> {
        serde_urlencoded::to_string(self)
    }
}

/// Formats a timestamp as local `YYYY-MM-DD HH:MM:SS` without any UTC shift.
pub fn format_local(datetime: NaiveDateTime) -> String {
    datetime.format(LOCAL_DATETIME_FORMAT).to_string()
}

/// Controlled booking form.
#[derive(Debug, Clone)]
pub struct BookingForm {
    contact: ContactFields,
    offer: Option<String>,
    consent: bool,
    picked: Option<NaiveDateTime>,
    in_flight: bool,
    unspecified_offer: String,
}

impl Default for BookingForm {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingForm {
    pub fn new() -> Self {
        Self::with_unspecified_offer(DEFAULT_UNSPECIFIED_OFFER)
    }

    /// Creates a form that sends `label` when no offer is chosen.
    pub fn with_unspecified_offer(label: impl Into<String>) -> Self {
        Self {
            contact: ContactFields::default(),
            offer: None,
            consent: false,
            picked: None,
            in_flight: false,
            unspecified_offer: label.into(),
        }
    }

    pub fn contact(&self) -> &ContactFields {
        &self.contact
    }

    pub fn set_contact(&mut self, contact: ContactFields) {
        self.contact = contact;
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        self.contact.name = value.into();
    }

    pub fn set_surname(&mut self, value: impl Into<String>) {
        self.contact.surname = value.into();
    }

    pub fn set_phone(&mut self, value: impl Into<String>) {
        self.contact.phone = value.into();
    }

    pub fn set_email(&mut self, value: impl Into<String>) {
        self.contact.email = value.into();
    }

    pub fn offer(&self) -> Option<&str> {
        self.offer.as_deref()
    }

    /// Sets the chosen offer; an empty title clears it.
    pub fn set_offer(&mut self, title: Option<String>) {
        self.offer = title.filter(|t| !t.is_empty());
    }

    pub fn consent(&self) -> bool {
        self.consent
    }

    pub fn set_consent(&mut self, consent: bool) {
        self.consent = consent;
    }

    pub fn picked(&self) -> Option<NaiveDateTime> {
        self.picked
    }

    /// Mirrors the selector's timestamp without touching any other field.
    pub fn set_picked(&mut self, picked: Option<NaiveDateTime>) {
        self.picked = picked;
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Whether the submit control is enabled.
    pub fn can_submit(&self) -> bool {
        !self.in_flight && self.consent && self.contact.is_complete()
    }

    /// Builds the request and marks the form in flight.
    ///
    /// Returns `None` without side effects when the form cannot be submitted.
    pub fn begin_submit(&mut self, context: &ClientContext) -> Option<BookingRequest> {
        if !self.can_submit() {
            return None;
        }
        self.in_flight = true;

        Some(BookingRequest {
            name: self.contact.name.clone(),
            surname: self.contact.surname.clone(),
            phone: self.contact.phone.clone(),
            email: self.contact.email.clone(),
            offer: self
                .offer
                .clone()
                .unwrap_or_else(|| self.unspecified_offer.clone()),
            picked_date: self.picked.map(format_local).unwrap_or_default(),
            consent: self.consent,
            page: context.page.clone(),
            user_agent: context.user_agent.clone(),
            timezone: context.timezone.clone(),
        })
    }

    /// Clears the contact fields and offer after a successful submission.
    ///
    /// Consent and the picked date/time are kept.
    pub fn finish_success(&mut self) {
        self.contact = ContactFields::default();
        self.offer = None;
        self.in_flight = false;
    }

    /// Keeps every field so the visitor can retry.
    pub fn finish_failure(&mut self) {
        self.in_flight = false;
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn context() -> ClientContext {
        ClientContext {
            page: "/reservation".to_string(),
            user_agent: "test-agent".to_string(),
            timezone: "Europe/Paris".to_string(),
        }
    }

    fn filled_form() -> BookingForm {
        let mut form = BookingForm::new();
        form.set_contact(ContactFields::new("Dupont", "Marie", "0601020304", "marie@example.com"));
        form.set_consent(true);
        form.set_picked(Some(
            NaiveDate::from_ymd_opt(2025, 10, 15)
                .unwrap()
                .and_hms_opt(15, 30, 0)
                .unwrap(),
        ));
        form
    }

    // ==================== Validation Tests ====================

    #[test]
    fn empty_form_cannot_submit() {
        let mut form = BookingForm::new();
        assert!(!form.can_submit());
        assert!(form.begin_submit(&context()).is_none());
        assert!(!form.is_in_flight());
    }

    #[test]
    fn consent_is_required() {
        let mut form = filled_form();
        form.set_consent(false);
        assert!(!form.can_submit());
        assert!(form.begin_submit(&context()).is_none());
    }

    #[test]
    fn blank_field_blocks_submit() {
        let mut form = filled_form();
        form.set_phone("   ");
        assert!(!form.can_submit());
    }

    #[test]
    fn missing_date_is_allowed() {
        let mut form = filled_form();
        form.set_picked(None);
        let request = form.begin_submit(&context()).unwrap();
        assert_eq!(request.picked_date, "");
    }

    // ==================== Request Tests ====================

    #[test]
    fn request_carries_local_date_and_context() {
        let mut form = filled_form();
        let request = form.begin_submit(&context()).unwrap();

        assert_eq!(request.name, "Dupont");
        assert_eq!(request.surname, "Marie");
        assert_eq!(request.picked_date, "2025-10-15 15:30:00");
        assert_eq!(request.offer, DEFAULT_UNSPECIFIED_OFFER);
        assert!(request.consent);
        assert_eq!(request.page, "/reservation");
        assert_eq!(request.user_agent, "test-agent");
        assert_eq!(request.timezone, "Europe/Paris");
    }

    #[test]
    fn request_uses_chosen_offer_and_custom_label() {
        let mut form = filled_form();
        form.set_offer(Some("Bilan morphologique complet".to_string()));
        assert_eq!(form.begin_submit(&context()).unwrap().offer, "Bilan morphologique complet");

        let mut form = BookingForm::with_unspecified_offer("Not specified");
        form.set_contact(filled_form().contact().clone());
        form.set_consent(true);
        form.set_offer(Some(String::new()));
        assert_eq!(form.begin_submit(&context()).unwrap().offer, "Not specified");
    }

    #[test]
    fn request_encodes_as_form_body() {
        let mut form = filled_form();
        form.set_name("A&B");
        form.set_surname("C=D");
        form.set_phone("06 01");
        let encoded = form.begin_submit(&context()).unwrap().encode().unwrap();

        assert_eq!(
            encoded,
            "nom=A%26B&prenom=C%3DD&telephone=06+01&email=marie%40example.com\
             &offre=Non+pr%C3%A9cis%C3%A9&pickedDate=2025-10-15+15%3A30%3A00\
             &acceptGDPR=true&page=%2Freservation&ua=test-agent&tz=Europe%2FParis"
        );
    }

    #[test]
    fn encoded_body_decodes_to_fields() {
        let mut form = filled_form();
        form.set_offer(Some("Soin découverte minceur 40 min".to_string()));
        let encoded = form.begin_submit(&context()).unwrap().encode().unwrap();

        let fields: Vec<(String, String)> = serde_urlencoded::from_str(&encoded).unwrap();
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["nom", "prenom", "telephone", "email", "offre", "pickedDate", "acceptGDPR", "page", "ua", "tz"]
        );
        assert!(fields.contains(&("offre".to_string(), "Soin découverte minceur 40 min".to_string())));
        assert!(fields.contains(&("acceptGDPR".to_string(), "true".to_string())));
    }

    #[test]
    fn timezone_prefers_tz_variable() {
        assert_eq!(resolve_timezone(Some("Europe/Paris".to_string())), "Europe/Paris");
        assert_eq!(resolve_timezone(Some(":America/New_York".to_string())), "America/New_York");
    }

    #[test]
    fn timezone_falls_back_to_system_zone() {
        let system = iana_time_zone::get_timezone().unwrap_or_default();
        assert_eq!(resolve_timezone(None), system);
        assert_eq!(resolve_timezone(Some("  ".to_string())), system);
    }

    #[test]
    fn request_serializes_with_wire_names() {
        let mut form = filled_form();
        let json = serde_json::to_value(form.begin_submit(&context()).unwrap()).unwrap();
        assert_eq!(json["nom"], "Dupont");
        assert_eq!(json["prenom"], "Marie");
        assert_eq!(json["pickedDate"], "2025-10-15 15:30:00");
        assert_eq!(json["acceptGDPR"], true);
        assert_eq!(json["ua"], "test-agent");
    }

    // ==================== Lifecycle Tests ====================

    #[test]
    fn in_flight_blocks_second_submit() {
        let mut form = filled_form();
        assert!(form.begin_submit(&context()).is_some());
        assert!(form.is_in_flight());
        assert!(!form.can_submit());
        assert!(form.begin_submit(&context()).is_none());
    }

    #[test]
    fn success_clears_text_fields_only() {
        let mut form = filled_form();
        form.set_offer(Some("Bilan morphologique complet".to_string()));
        let picked = form.picked();
        form.begin_submit(&context()).unwrap();

        form.finish_success();
        assert_eq!(form.contact(), &ContactFields::default());
        assert_eq!(form.offer(), None);
        assert!(form.consent());
        assert_eq!(form.picked(), picked);
        assert!(!form.is_in_flight());
    }

    #[test]
    fn failure_preserves_everything() {
        let mut form = filled_form();
        let before = form.contact().clone();
        form.begin_submit(&context()).unwrap();

        form.finish_failure();
        assert_eq!(form.contact(), &before);
        assert!(form.consent());
        assert!(form.can_submit());
    }
}

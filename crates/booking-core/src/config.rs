//! Booking configuration loaded from a JSON file.
//!
//! Every section is optional; a missing file or section falls back to the
//! built-in clinic defaults.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::availability::Schedule;
use crate::confirmation::ConfirmationSettings;
use crate::error::Result;
use crate::form::{ClientContext, DEFAULT_UNSPECIFIED_OFFER};
use crate::offers::OfferCatalog;
use crate::selector::DateChangePolicy;

/// Endpoint used when none is configured. Empty means submissions fail until set.
pub const DEFAULT_ENDPOINT: &str = "";

/// Name of the config file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Full booking configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    pub schedule: Schedule,
    /// URL the form is posted to.
    pub endpoint: String,
    pub offers: OfferCatalog,
    /// Offer label sent when none was chosen.
    pub unspecified_offer: String,
    pub date_change_policy: DateChangePolicy,
    pub confirmation: ConfirmationSettings,
    pub client: ClientContext,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            schedule: Schedule::clinic_defaults(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            offers: OfferCatalog::clinic_defaults(),
            unspecified_offer: DEFAULT_UNSPECIFIED_OFFER.to_string(),
            date_change_policy: DateChangePolicy::default(),
            confirmation: ConfirmationSettings::default(),
            client: ClientContext::default(),
        }
    }
}

impl BookingConfig {
    /// Returns the default config file path, if a config directory exists.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "clinic-booking", "ClinicBooking")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Parses and validates a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file, validating the schedule.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_json(&contents)?;
        info!(
            path = %path.display(),
            exceptions = config.schedule.exceptions.len(),
            blackouts = config.schedule.blackouts.len(),
            "Loaded booking config"
        );
        Ok(config)
    }

    /// Loads a config file, or the defaults if it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Writes the config as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.schedule.validate()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::error::ConfigError;
    use crate::time::{TimeOfDay, TimeWindow};

    #[test]
    fn empty_document_gives_defaults() {
        let config = BookingConfig::from_json("{}").unwrap();
        assert_eq!(config, BookingConfig::default());
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.date_change_policy, DateChangePolicy::Snap);
    }

    #[test]
    fn partial_document_overrides_sections() {
        let json = r#"{
            "endpoint": "http://127.0.0.1:9000/exec",
            "date_change_policy": "clamp",
            "schedule": {
                "exceptions": { "2025-10-15": { "start": "15:30", "end": "19:00" } }
            },
            "offers": [ { "title": "Massage" } ],
            "confirmation": { "auto_close_ms": 0 }
        }"#;
        let config = BookingConfig::from_json(json).unwrap();

        assert_eq!(config.endpoint, "http://127.0.0.1:9000/exec");
        assert_eq!(config.date_change_policy, DateChangePolicy::Clamp);
        assert!(config.offers.contains("Massage"));
        assert_eq!(config.confirmation.auto_close_ms, 0);
        assert_eq!(config.confirmation.title, ConfirmationSettings::default().title);
        assert_eq!(
            config
                .schedule
                .first_available(NaiveDate::from_ymd_opt(2025, 10, 15).unwrap()),
            Some(TimeOfDay::new(15, 30))
        );
        // Weekly rules keep their defaults
        assert!(!config
            .schedule
            .is_open(NaiveDate::from_ymd_opt(2025, 10, 18).unwrap()));
    }

    #[test]
    fn partial_weekly_section_keeps_sunday_closed() {
        let json = r#"{
            "schedule": {
                "minute_step": 15,
                "default_window": { "start": "08:00", "end": "20:00" },
                "weekly": { "monday": { "start": "12:00", "end": "19:00" }, "saturday": null },
                "blackouts": [ { "from": "2025-08-01", "to": "2025-08-15" } ]
            }
        }"#;
        let config = BookingConfig::from_json(json).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2025, 10, 19).unwrap();
        assert!(!config.schedule.is_open(sunday));
    }

    #[test]
    fn invalid_schedule_is_rejected() {
        let json = r#"{ "schedule": { "default_window": { "start": "08:30", "end": "20:00" } } }"#;
        assert!(matches!(
            BookingConfig::from_json(json),
            Err(ConfigError::NotHourAligned(_))
        ));

        let json = r#"{ "schedule": { "minute_step": 7 } }"#;
        assert!(matches!(BookingConfig::from_json(json), Err(ConfigError::Json(_))));

        let json = r#"{ "schedule": { "exceptions": { "2025-10-15": { "start": "25:00", "end": "19:00" } } } }"#;
        assert!(matches!(BookingConfig::from_json(json), Err(ConfigError::Json(_))));
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = BookingConfig::default();
        config.schedule.add_exception(
            NaiveDate::from_ymd_opt(2025, 12, 24).unwrap(),
            TimeWindow::new(TimeOfDay::new(9, 0), TimeOfDay::new(12, 30)).unwrap(),
        );
        config.save(&path).unwrap();

        let loaded = BookingConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert_eq!(
            BookingConfig::load_or_default(&path).unwrap(),
            BookingConfig::default()
        );
        assert!(matches!(BookingConfig::load(&path), Err(ConfigError::Io(_))));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            BookingConfig::load_or_default(&path),
            Err(ConfigError::Json(_))
        ));
    }
}

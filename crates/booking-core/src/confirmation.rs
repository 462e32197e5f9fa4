//! Confirmation overlay shown after a booking was sent.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Default time before the overlay closes itself.
pub const DEFAULT_AUTO_CLOSE: Duration = Duration::from_millis(4000);

/// Overlay text and timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationSettings {
    pub title: String,
    pub message: String,
    /// Zero disables auto-close.
    pub auto_close_ms: u64,
}

impl Default for ConfirmationSettings {
    fn default() -> Self {
        Self {
            title: "Réservation envoyée".to_string(),
            message: "Nous vous contactons très vite pour finaliser votre séance. Merci !"
                .to_string(),
            auto_close_ms: DEFAULT_AUTO_CLOSE.as_millis() as u64,
        }
    }
}

/// Keys the overlay reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Other,
}

/// Element that should hold focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    CloseButton,
}

/// Why the overlay was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Manual,
    Escape,
    Timeout,
}

/// Dismissible confirmation overlay.
#[derive(Debug, Clone)]
pub struct ConfirmationPopup {
    settings: ConfirmationSettings,
    opened_at: Option<Instant>,
}

impl ConfirmationPopup {
    pub fn new(settings: ConfirmationSettings) -> Self {
        Self {
            settings,
            opened_at: None,
        }
    }

    pub fn settings(&self) -> &ConfirmationSettings {
        &self.settings
    }

    pub fn title(&self) -> &str {
        &self.settings.title
    }

    pub fn message(&self) -> &str {
        &self.settings.message
    }

    pub fn is_open(&self) -> bool {
        self.opened_at.is_some()
    }

    pub fn auto_close(&self) -> Option<Duration> {
        match self.settings.auto_close_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    /// Opens the overlay; reopening restarts the timer.
    pub fn show(&mut self, now: Instant) {
        self.opened_at = Some(now);
    }

    /// Closes the overlay. Returns false if it was already closed.
    pub fn close(&mut self) -> bool {
        self.opened_at.take().is_some()
    }

    /// Handles a key press while the overlay is open.
    pub fn handle_key(&mut self, key: Key) -> Option<CloseReason> {
        match key {
            Key::Escape if self.close() => Some(CloseReason::Escape),
            _ => None,
        }
    }

    /// Closes the overlay once the auto-close delay has elapsed.
    pub fn tick(&mut self, now: Instant) -> Option<CloseReason> {
        let opened_at = self.opened_at?;
        let delay = self.auto_close()?;
        if now.saturating_duration_since(opened_at) >= delay {
            self.opened_at = None;
            return Some(CloseReason::Timeout);
        }
        None
    }

    /// Time left before auto-close, if it is running.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let opened_at = self.opened_at?;
        let delay = self.auto_close()?;
        Some(delay.saturating_sub(now.saturating_duration_since(opened_at)))
    }

    pub fn focus_target(&self) -> Option<FocusTarget> {
        self.is_open().then_some(FocusTarget::CloseButton)
    }
}

impl Default for ConfirmationPopup {
    fn default() -> Self {
        Self::new(ConfirmationSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_closed() {
        let popup = ConfirmationPopup::default();
        assert!(!popup.is_open());
        assert_eq!(popup.focus_target(), None);
        assert_eq!(popup.auto_close(), Some(DEFAULT_AUTO_CLOSE));
    }

    #[test]
    fn auto_closes_after_delay() {
        let mut popup = ConfirmationPopup::default();
        let start = Instant::now();
        popup.show(start);
        assert_eq!(popup.focus_target(), Some(FocusTarget::CloseButton));

        assert_eq!(popup.tick(start + Duration::from_millis(3999)), None);
        assert!(popup.is_open());
        assert_eq!(
            popup.remaining(start + Duration::from_millis(1000)),
            Some(Duration::from_millis(3000))
        );

        assert_eq!(
            popup.tick(start + Duration::from_millis(4000)),
            Some(CloseReason::Timeout)
        );
        assert!(!popup.is_open());
        assert_eq!(popup.tick(start + Duration::from_millis(5000)), None);
    }

    #[test]
    fn escape_closes() {
        let mut popup = ConfirmationPopup::default();
        popup.show(Instant::now());
        assert_eq!(popup.handle_key(Key::Enter), None);
        assert_eq!(popup.handle_key(Key::Escape), Some(CloseReason::Escape));
        assert!(!popup.is_open());
        assert_eq!(popup.handle_key(Key::Escape), None);
    }

    #[test]
    fn manual_close() {
        let mut popup = ConfirmationPopup::default();
        popup.show(Instant::now());
        assert!(popup.close());
        assert!(!popup.close());
    }

    #[test]
    fn zero_delay_disables_auto_close() {
        let mut popup = ConfirmationPopup::new(ConfirmationSettings {
            auto_close_ms: 0,
            ..Default::default()
        });
        let start = Instant::now();
        popup.show(start);
        assert_eq!(popup.tick(start + Duration::from_secs(3600)), None);
        assert!(popup.is_open());
        assert_eq!(popup.remaining(start), None);
    }

    #[test]
    fn reopening_restarts_timer() {
        let mut popup = ConfirmationPopup::default();
        let start = Instant::now();
        popup.show(start);
        popup.show(start + Duration::from_millis(3000));
        assert_eq!(popup.tick(start + Duration::from_millis(5000)), None);
        assert_eq!(
            popup.tick(start + Duration::from_millis(7000)),
            Some(CloseReason::Timeout)
        );
    }
}

//! Bookable offers shown next to the booking form.

use serde::{Deserialize, Serialize};

/// A package the visitor can book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Title, also sent as the offer label.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Highlighted offer.
    #[serde(default)]
    pub featured: bool,
}

impl Offer {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            badge: None,
            price: None,
            featured: false,
        }
    }

    pub fn with_badge(mut self, badge: impl Into<String>) -> Self {
        self.badge = Some(badge.into());
        self
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    pub fn featured(mut self) -> Self {
        self.featured = true;
        self
    }
}

/// The list of offers that can be written into the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfferCatalog {
    offers: Vec<Offer>,
}

impl Default for OfferCatalog {
    fn default() -> Self {
        Self::clinic_defaults()
    }
}

impl OfferCatalog {
    pub fn new(offers: Vec<Offer>) -> Self {
        Self { offers }
    }

    /// The clinic's discovery offers.
    pub fn clinic_defaults() -> Self {
        Self::new(vec![
            Offer::new("Soin découverte minceur 40 min")
                .with_badge("Offre la plus choisie")
                .with_price("29,90 €")
                .featured(),
            Offer::new("Bilan morphologique complet").with_badge("Offre découverte"),
            Offer::new("Séance découverte Cryolipolyse (1 zone)"),
        ])
    }

    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    /// Finds an offer by exact title.
    pub fn get(&self, title: &str) -> Option<&Offer> {
        self.offers.iter().find(|o| o.title == title)
    }

    pub fn contains(&self, title: &str) -> bool {
        self.get(title).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

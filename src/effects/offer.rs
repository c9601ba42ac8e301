//! Founder offer: a "spots left" counter persisted in browser storage that
//! ticks down each time someone opens the booking widget.

use crate::utils::parse::parse_int_prefix;
use mockall::automock;
use std::collections::HashMap;

pub const STORAGE_KEY: &str = "founder_spots_left_v1";
pub const MAX_SPOTS: u32 = 5;
pub const MIN_SPOTS: u32 = 1;
pub const BOOKING_URL: &str = "https://calendly.com/kevincacheiro93/30-min-meeting";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage quota exceeded")]
    QuotaExceeded,
}

/// Key/value storage with `localStorage` semantics.
#[automock]
pub trait OfferStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// The third-party booking widget.
#[automock]
pub trait Scheduler {
    /// The widget's global with its popup initialiser is loaded.
    fn has_popup_widget(&self) -> bool;
    fn open_popup(&mut self, url: &str);
    fn open_tab(&mut self, url: &str);
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl OfferStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Parses a stored value, falling back to the full count for anything
/// missing, non-numeric or outside `MIN_SPOTS..=MAX_SPOTS`.
pub fn parse_spots(stored: Option<&str>) -> u32 {
    stored
        .and_then(parse_int_prefix)
        .filter(|spots| (MIN_SPOTS as i64..=MAX_SPOTS as i64).contains(spots))
        .map(|spots| spots as u32)
        .unwrap_or(MAX_SPOTS)
}

pub struct FounderOffer<S: OfferStorage> {
    storage: S,
    spots: u32,
    bound: bool,
    booking_url: String,
}

impl<S: OfferStorage> FounderOffer<S> {
    pub fn load(storage: S) -> Self {
        Self::with_booking_url(storage, BOOKING_URL)
    }

    pub fn with_booking_url(storage: S, booking_url: &str) -> Self {
        let stored = match storage.get_item(STORAGE_KEY) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read founder offer spots, using default: {}", e);
                None
            }
        };
        Self {
            spots: parse_spots(stored.as_deref()),
            storage,
            bound: false,
            booking_url: booking_url.to_string(),
        }
    }

    pub fn spots(&self) -> u32 {
        self.spots
    }

    pub fn label(&self) -> String {
        format!("( {} of {} left )", self.spots, MAX_SPOTS)
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Binds the claim handler. Only the first call does anything.
    pub fn bind(&mut self) -> bool {
        if self.bound {
            return false;
        }
        self.bound = true;
        true
    }

    /// Opens the booking widget and takes one spot while more than one is
    /// left. Returns the spots remaining afterwards.
    pub fn claim(&mut self, scheduler: &mut impl Scheduler) -> u32 {
        if !self.bound {
            return self.spots;
        }
        if scheduler.has_popup_widget() {
            scheduler.open_popup(&self.booking_url);
        } else {
            scheduler.open_tab(&self.booking_url);
        }

        if self.spots > MIN_SPOTS {
            self.spots -= 1;
            if let Err(e) = self.storage.set_item(STORAGE_KEY, &self.spots.to_string()) {
                tracing::warn!("Failed to persist founder offer spots: {}", e);
            }
        }
        self.spots
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab_scheduler() -> MockScheduler {
        let mut scheduler = MockScheduler::new();
        scheduler.expect_has_popup_widget().return_const(false);
        scheduler
            .expect_open_tab()
            .withf(|url: &str| url == BOOKING_URL)
            .return_const(());
        scheduler
    }

    #[test]
    fn corrupt_values_reset_to_five() {
        for raw in ["0", "99", "abc", "", "-2"] {
            assert_eq!(parse_spots(Some(raw)), 5, "{:?}", raw);
        }
        assert_eq!(parse_spots(None), 5);
        assert_eq!(parse_spots(Some("3")), 3);
        assert_eq!(parse_spots(Some("3.5")), 3);
    }

    #[test]
    fn claims_count_down_to_one_and_stop() {
        let mut storage = MemoryStorage::default();
        storage.set_item(STORAGE_KEY, "abc").unwrap();
        let mut offer = FounderOffer::load(storage);
        assert_eq!(offer.spots(), 5);
        offer.bind();

        let mut scheduler = tab_scheduler();
        for expected in [4, 3, 2, 1] {
            assert_eq!(offer.claim(&mut scheduler), expected);
        }
        assert_eq!(offer.label(), "( 1 of 5 left )");
        assert_eq!(offer.claim(&mut scheduler), 1);

        let storage = offer.into_storage();
        assert_eq!(storage.get_item(STORAGE_KEY).unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn stored_value_survives_reload() {
        let mut storage = MemoryStorage::default();
        storage.set_item(STORAGE_KEY, "2").unwrap();
        let offer = FounderOffer::load(storage);
        assert_eq!(offer.spots(), 2);
    }

    #[test]
    fn popup_is_preferred_when_widget_is_loaded() {
        let mut scheduler = MockScheduler::new();
        scheduler.expect_has_popup_widget().return_const(true);
        scheduler.expect_open_popup().times(1).return_const(());
        scheduler.expect_open_tab().never();

        let mut offer = FounderOffer::load(MemoryStorage::default());
        offer.bind();
        offer.claim(&mut scheduler);
    }

    #[test]
    fn unbound_claim_does_nothing() {
        let mut scheduler = MockScheduler::new();
        scheduler.expect_has_popup_widget().never();
        let mut offer = FounderOffer::load(MemoryStorage::default());
        assert_eq!(offer.claim(&mut scheduler), 5);
        assert!(offer.bind());
        assert!(!offer.bind());
    }

    #[test]
    fn storage_failures_keep_the_counter_working() {
        let mut storage = MockOfferStorage::new();
        storage
            .expect_get_item()
            .returning(|_| Err(StorageError::Unavailable("disabled".to_string())));
        storage
            .expect_set_item()
            .times(1)
            .returning(|_, _| Err(StorageError::QuotaExceeded));

        let mut offer = FounderOffer::load(storage);
        assert_eq!(offer.spots(), 5);
        offer.bind();
        assert_eq!(offer.claim(&mut tab_scheduler()), 4);
    }
}

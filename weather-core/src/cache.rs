//! In-memory TTL cache for weather data, keyed by city name.
//!
//! Two collections (current conditions and forecasts), each guarded by its
//! own coarse mutex; every operation is a short map access. Expired entries
//! are removed only by an explicit sweep or a full clear, never implicitly
//! on lookup.

use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::model::{CurrentWeather, DataKind, Envelope, Forecast};

#[derive(Debug, Default)]
pub struct CacheStore {
    weather: Mutex<HashMap<String, Envelope<CurrentWeather>>>,
    forecast: Mutex<HashMap<String, Envelope<Forecast>>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or wholesale-overwrite the current-weather entry for a city,
    /// stamped with the present instant. Last write wins, no merge.
    pub fn store_weather(&self, city: &str, data: CurrentWeather) {
        let envelope = Envelope::new(data, DataKind::Current.validity());
        self.weather.lock().insert(city.to_string(), envelope);
    }

    pub fn store_forecast(&self, city: &str, data: Forecast) {
        let envelope = Envelope::new(data, DataKind::Forecast.validity());
        self.forecast.lock().insert(city.to_string(), envelope);
    }

    /// Point lookup; returns expired entries too. `None` only means the key
    /// was never stored (or has been swept).
    pub fn weather(&self, city: &str) -> Option<CurrentWeather> {
        self.weather.lock().get(city).map(|e| e.payload().clone())
    }

    pub fn forecast(&self, city: &str) -> Option<Forecast> {
        self.forecast.lock().get(city).map(|e| e.payload().clone())
    }

    /// True iff an entry exists for `(city, kind)` and is within its
    /// validity window right now.
    pub fn is_valid(&self, city: &str, kind: DataKind) -> bool {
        let now = Utc::now();
        match kind {
            DataKind::Current => self
                .weather
                .lock()
                .get(city)
                .is_some_and(|e| e.is_valid_at(now)),
            DataKind::Forecast => self
                .forecast
                .lock()
                .get(city)
                .is_some_and(|e| e.is_valid_at(now)),
        }
    }

    /// Age of the cached entry in minutes, or `None` when absent.
    pub fn age_minutes(&self, city: &str, kind: DataKind) -> Option<i64> {
        match kind {
            DataKind::Current => self.weather.lock().get(city).map(Envelope::age_minutes),
            DataKind::Forecast => self.forecast.lock().get(city).map(Envelope::age_minutes),
        }
    }

    /// Remove every expired entry from both collections and return how many
    /// were dropped. Meant for periodic invocation, keeping lookups O(1).
    pub fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let mut removed = 0;

        {
            let mut weather = self.weather.lock();
            let before = weather.len();
            weather.retain(|_, e| e.is_valid_at(now));
            removed += before - weather.len();
        }
        {
            let mut forecast = self.forecast.lock();
            let before = forecast.len();
            forecast.retain(|_, e| e.is_valid_at(now));
            removed += before - forecast.len();
        }

        if removed > 0 {
            tracing::debug!(removed, "swept expired cache entries");
        }
        removed
    }

    /// Unconditionally drop everything; returns the prior total size.
    pub fn clear_all(&self) -> usize {
        let mut weather = self.weather.lock();
        let mut forecast = self.forecast.lock();
        let count = weather.len() + forecast.len();
        weather.clear();
        forecast.clear();
        count
    }

    /// Total number of entries across both collections.
    pub fn len(&self) -> usize {
        self.weather.lock().len() + self.forecast.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cities with a current-weather entry, expired or not.
    pub fn cached_cities(&self) -> Vec<String> {
        let mut cities: Vec<String> = self.weather.lock().keys().cloned().collect();
        cities.sort();
        cities
    }
}

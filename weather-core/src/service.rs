//! Fetch orchestration: cache-hit vs. network-fetch decisions, in-flight
//! request bookkeeping, and event delivery to the caller.
//!
//! All outcomes are reported through a single unbounded event channel; a
//! request produces at most one terminal event (ready or error), optionally
//! preceded by [`WeatherEvent::LoadingStarted`] when the network is hit.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::Url;
use tokio::sync::mpsc;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{classify_provider_error, classify_transport_error, ErrorCategory};
use crate::model::{CurrentWeather, DataKind, Forecast};
use crate::parse::{parse_current, parse_forecast};
use crate::transport::Transport;

/// Default OpenWeatherMap API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
/// Default per-request transport timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Real OpenWeatherMap keys are 32 hex chars; anything this short is
/// rejected before a request is issued.
const MIN_API_KEY_LEN: usize = 20;

/// Everything a consumer can observe from the service.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherEvent {
    /// A network fetch has been issued for `(city, kind)`.
    LoadingStarted { city: String, kind: DataKind },
    /// Current conditions are available, from cache or network.
    CurrentWeatherReady { city: String, data: CurrentWeather },
    /// A forecast bundle is available, from cache or network.
    ForecastReady { city: String, data: Forecast },
    /// A fresh payload was written to the cache.
    CacheUpdated { city: String, kind: DataKind },
    /// Expired or cleared entries were dropped from the cache.
    CacheCleanedUp { removed: usize },
    /// A request failed; `category` is stable for programmatic branching.
    ErrorOccurred {
        city: String,
        message: String,
        category: ErrorCategory,
    },
}

/// Metadata for one in-flight transport operation, keyed by request id.
/// Created when the fetch is issued, retired exactly once on completion.
#[derive(Debug, Clone)]
struct PendingFetch {
    city: String,
    kind: DataKind,
}

/// Error payload shape OpenWeatherMap uses for non-success statuses.
/// `cod` is ignored; the HTTP status is authoritative.
#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    message: String,
}

pub struct WeatherService {
    api_key: String,
    base_url: String,
    timeout: Duration,

    transport: Arc<dyn Transport>,
    cache: CacheStore,

    pending: Mutex<HashMap<u64, PendingFetch>>,
    next_request_id: AtomicU64,

    events: mpsc::UnboundedSender<WeatherEvent>,
}

impl WeatherService {
    /// Build a service and the receiving half of its event channel.
    pub fn new(
        api_key: impl Into<String>,
        transport: Arc<dyn Transport>,
    ) -> (Self, mpsc::UnboundedReceiver<WeatherEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let service = Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            transport,
            cache: CacheStore::new(),
            pending: Mutex::new(HashMap::new()),
            next_request_id: AtomicU64::new(1),
            events: tx,
        };
        (service, rx)
    }

    /// Build from an on-disk [`Config`], applying its overrides.
    pub fn from_config(
        config: &Config,
        transport: Arc<dyn Transport>,
    ) -> (Self, mpsc::UnboundedReceiver<WeatherEvent>) {
        let (mut service, rx) =
            Self::new(config.api_key.clone().unwrap_or_default(), transport);
        if let Some(base_url) = &config.base_url {
            service.base_url = base_url.trim_end_matches('/').to_string();
        }
        service.timeout = config.request_timeout();
        (service, rx)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_api_key_plausible(&self) -> bool {
        self.api_key.len() > MIN_API_KEY_LEN
    }

    /// Request current conditions for a city. Emits either an immediate
    /// ready event (cache hit) or loading-started followed by exactly one
    /// terminal event.
    pub async fn request_current_weather(&self, city: &str) {
        let Some(city) = self.validate_request(city) else {
            return;
        };

        if self.cache.is_valid(&city, DataKind::Current) {
            if let Some(data) = self.cache.weather(&city) {
                tracing::debug!(%city, "current weather cache hit");
                self.emit(WeatherEvent::CurrentWeatherReady { city, data });
                return;
            }
        }

        tracing::debug!(%city, "current weather cache miss, fetching");
        self.fetch(city, DataKind::Current).await;
    }

    /// Request a 5-day forecast for a city. Same event contract as
    /// [`Self::request_current_weather`].
    pub async fn request_forecast(&self, city: &str) {
        let Some(city) = self.validate_request(city) else {
            return;
        };

        if self.cache.is_valid(&city, DataKind::Forecast) {
            if let Some(data) = self.cache.forecast(&city) {
                tracing::debug!(%city, "forecast cache hit");
                self.emit(WeatherEvent::ForecastReady { city, data });
                return;
            }
        }

        tracing::debug!(%city, "forecast cache miss, fetching");
        self.fetch(city, DataKind::Forecast).await;
    }

    /// Reject bad input before any network traffic. Returns the trimmed
    /// city name when the request may proceed.
    fn validate_request(&self, city: &str) -> Option<String> {
        let trimmed = city.trim();
        if trimmed.is_empty() {
            self.report_error(city, "empty city name", ErrorCategory::Validation);
            return None;
        }
        if !self.is_api_key_plausible() {
            self.report_error(trimmed, "missing or invalid API key", ErrorCategory::Configuration);
            return None;
        }
        Some(trimmed.to_string())
    }

    async fn fetch(&self, city: String, kind: DataKind) {
        self.emit(WeatherEvent::LoadingStarted {
            city: city.clone(),
            kind,
        });

        let url = match self.build_url(&city, kind) {
            Ok(url) => url,
            Err(message) => {
                self.report_error(&city, &message, ErrorCategory::Configuration);
                return;
            }
        };

        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        self.pending
            .lock()
            .insert(request_id, PendingFetch { city, kind });

        let result = self.transport.get(url, self.timeout).await;

        // The pending entry is the source of truth for who this reply
        // belongs to; it is retired here, exactly once, on every path.
        let Some(pending) = self.pending.lock().remove(&request_id) else {
            return;
        };

        match result {
            Err(transport_err) => {
                let (category, message) = classify_transport_error(&transport_err);
                self.report_error(&pending.city, &message, category);
            }
            Ok(reply) if !reply.is_success() => {
                let provider_message = serde_json::from_str::<ProviderErrorBody>(&reply.body)
                    .unwrap_or_default()
                    .message;
                let (category, message) =
                    classify_provider_error(reply.status, &provider_message);
                self.report_error(&pending.city, &message, category);
            }
            Ok(reply) => match pending.kind {
                DataKind::Current => self.complete_current(&pending.city, &reply.body),
                DataKind::Forecast => self.complete_forecast(&pending.city, &reply.body),
            },
        }
    }

    fn complete_current(&self, city: &str, body: &str) {
        let data = match parse_current(body) {
            Ok(data) => data,
            Err(err) => {
                tracing::debug!(%city, %err, "current weather body not decodable");
                self.report_error(city, "invalid provider response", ErrorCategory::Parsing);
                return;
            }
        };

        if !data.is_valid() {
            self.report_error(city, "invalid weather data", ErrorCategory::Validation);
            return;
        }

        self.cache.store_weather(city, data.clone());
        self.emit(WeatherEvent::CurrentWeatherReady {
            city: city.to_string(),
            data,
        });
        self.emit(WeatherEvent::CacheUpdated {
            city: city.to_string(),
            kind: DataKind::Current,
        });
    }

    fn complete_forecast(&self, city: &str, body: &str) {
        let data = match parse_forecast(body) {
            Ok(data) => data,
            Err(err) => {
                tracing::debug!(%city, %err, "forecast body not decodable");
                self.report_error(city, "invalid provider response", ErrorCategory::Parsing);
                return;
            }
        };

        if !data.is_valid() {
            self.report_error(city, "invalid forecast data", ErrorCategory::Validation);
            return;
        }

        self.cache.store_forecast(city, data.clone());
        self.emit(WeatherEvent::ForecastReady {
            city: city.to_string(),
            data,
        });
        self.emit(WeatherEvent::CacheUpdated {
            city: city.to_string(),
            kind: DataKind::Forecast,
        });
    }

    fn build_url(&self, city: &str, kind: DataKind) -> Result<Url, String> {
        let endpoint = match kind {
            DataKind::Current => "weather",
            DataKind::Forecast => "forecast",
        };
        Url::parse_with_params(
            &format!("{}/{endpoint}", self.base_url),
            [("q", city), ("appid", self.api_key.as_str()), ("units", "metric")],
        )
        .map_err(|_| format!("malformed base URL: {}", self.base_url))
    }

    fn report_error(&self, city: &str, message: &str, category: ErrorCategory) {
        tracing::warn!(%city, %category, message, "weather request failed");
        self.emit(WeatherEvent::ErrorOccurred {
            city: city.to_string(),
            message: message.to_string(),
            category,
        });
    }

    fn emit(&self, event: WeatherEvent) {
        // A dropped receiver means the consumer went away; nothing to do.
        let _ = self.events.send(event);
    }

    // --- cache management surface -------------------------------------

    pub fn has_valid_cache(&self, city: &str, kind: DataKind) -> bool {
        self.cache.is_valid(city, kind)
    }

    pub fn cache_age_minutes(&self, city: &str, kind: DataKind) -> Option<i64> {
        self.cache.age_minutes(city, kind)
    }

    pub fn cached_cities(&self) -> Vec<String> {
        self.cache.cached_cities()
    }

    /// Drop every cached entry and announce how many were removed.
    pub fn clear_cache(&self) -> usize {
        let removed = self.cache.clear_all();
        self.emit(WeatherEvent::CacheCleanedUp { removed });
        removed
    }

    /// Drop expired entries and announce how many were removed.
    pub fn sweep_cache(&self) -> usize {
        let removed = self.cache.sweep_expired();
        self.emit(WeatherEvent::CacheCleanedUp { removed });
        removed
    }

    /// Periodic expiry sweep, mirroring an hourly cleanup timer. The task
    /// runs until the service is dropped (or the handle is aborted).
    pub fn spawn_cache_sweeper(self: &Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        let service = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick fires immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(service) = service.upgrade() else {
                    return;
                };
                service.sweep_cache();
            }
        })
    }

    /// Number of fetches currently in flight.
    pub fn pending_requests(&self) -> usize {
        self.pending.lock().len()
    }
}

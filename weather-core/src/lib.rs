//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Typed records for current conditions and 5-day forecasts
//! - Lenient parsing of OpenWeatherMap payloads
//! - A TTL-bounded in-memory cache
//! - The fetch orchestrator that decides cache-hit vs. network and reports
//!   every outcome over an event channel
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod parse;
pub mod service;
pub mod transport;

pub use cache::CacheStore;
pub use config::Config;
pub use error::{ErrorCategory, classify_provider_error, classify_transport_error};
pub use model::{CurrentWeather, DailySummary, DataKind, Envelope, Forecast, ForecastEntry};
pub use parse::{parse_current, parse_forecast};
pub use service::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, WeatherEvent, WeatherService};
pub use transport::{HttpTransport, Transport, TransportError, TransportReply};

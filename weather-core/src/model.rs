use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Validity window for cached current-weather entries.
pub const WEATHER_VALIDITY_MINUTES: i64 = 15;
/// Validity window for cached forecast bundles.
pub const FORECAST_VALIDITY_MINUTES: i64 = 120;

/// The two kinds of cached weather data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Current,
    Forecast,
}

impl DataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::Current => "weather",
            DataKind::Forecast => "forecast",
        }
    }

    /// Fixed cache validity for this kind of data.
    pub fn validity(&self) -> TimeDelta {
        match self {
            DataKind::Current => TimeDelta::minutes(WEATHER_VALIDITY_MINUTES),
            DataKind::Forecast => TimeDelta::minutes(FORECAST_VALIDITY_MINUTES),
        }
    }
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current conditions for one city, as returned by the provider's
/// `/weather` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub city_name: String,
    pub country_code: String,
    pub city_id: i64,

    pub latitude: f64,
    pub longitude: f64,

    pub temperature: f64,
    pub feels_like: f64,
    pub temperature_min: f64,
    pub temperature_max: f64,

    pub main_condition: String,
    pub description: String,
    pub icon_code: String,
    pub condition_id: i32,

    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_direction: i32,
    pub visibility: f64,
    pub cloudiness: i32,

    /// Observation time reported by the provider.
    pub observed_at: DateTime<Utc>,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    /// UTC offset of the location, in seconds.
    pub timezone_offset_secs: i32,
}

impl CurrentWeather {
    /// A record is usable only when the provider identified the city.
    pub fn is_valid(&self) -> bool {
        !self.city_name.is_empty() && self.city_id > 0
    }

    pub fn age_in_minutes(&self) -> i64 {
        (Utc::now() - self.observed_at).num_minutes()
    }
}

/// One 3-hour forecast slot from the provider's `/forecast` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub date_time: DateTime<Utc>,

    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub pressure: f64,

    pub main_condition: String,
    pub description: String,
    pub icon_code: String,
    pub condition_id: i32,

    pub wind_speed: f64,
    pub wind_direction: i32,
    pub wind_gust: f64,
    pub cloudiness: i32,
    /// Probability of precipitation, 0–100 percent.
    pub precipitation_probability: f64,
}

/// Number of 3-hour slots per forecast day.
pub const ENTRIES_PER_DAY: usize = 8;

/// A 5-day / 3-hour forecast bundle. Entry order is chronological
/// (insertion order from the provider payload).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub city_name: String,
    pub latitude: f64,
    pub longitude: f64,

    pub entries: Vec<ForecastEntry>,
    pub retrieved_at: DateTime<Utc>,
}

/// Per-day rollup of a forecast: temperature range plus the condition
/// of the midday slot.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub min_temp: f64,
    pub max_temp: f64,
    pub dominant_condition: String,
    pub icon_code: String,
}

impl Forecast {
    pub fn is_valid(&self) -> bool {
        !self.city_name.is_empty() && !self.entries.is_empty()
    }

    pub fn total_entries(&self) -> usize {
        self.entries.len()
    }

    pub fn age_in_minutes(&self) -> i64 {
        (Utc::now() - self.retrieved_at).num_minutes()
    }

    /// Entries for day `day_index` (0-based), in fixed 8-slot buckets.
    /// Out-of-range days yield an empty slice.
    pub fn entries_for_day(&self, day_index: usize) -> &[ForecastEntry] {
        let start = day_index * ENTRIES_PER_DAY;
        let end = (start + ENTRIES_PER_DAY).min(self.entries.len());
        if start >= end {
            &[]
        } else {
            &self.entries[start..end]
        }
    }

    /// One summary per non-empty day bucket; empty buckets are skipped,
    /// never padded.
    pub fn daily_summaries(&self) -> Vec<DailySummary> {
        let mut summaries = Vec::new();

        for day in 0..5 {
            let bucket = self.entries_for_day(day);
            let Some(first) = bucket.first() else {
                continue;
            };

            let (min_temp, max_temp) = bucket.iter().fold(
                (first.temperature, first.temperature),
                |(min, max), entry| (min.min(entry.temperature), max.max(entry.temperature)),
            );

            // Prefer the midday slot when the bucket is long enough.
            let noon_index = if bucket.len() > 4 { 4 } else { bucket.len() / 2 };
            let noon = &bucket[noon_index];

            summaries.push(DailySummary {
                date: first.date_time.date_naive(),
                min_temp,
                max_temp,
                dominant_condition: noon.main_condition.clone(),
                icon_code: noon.icon_code.clone(),
            });
        }

        summaries
    }
}

/// A cached payload stamped with its capture time and validity window.
///
/// Envelopes are owned exclusively by the cache store; callers get
/// clones of the payload, never a handle to the envelope itself.
#[derive(Debug, Clone)]
pub struct Envelope<T> {
    payload: T,
    cached_at: DateTime<Utc>,
    validity: TimeDelta,
}

impl<T> Envelope<T> {
    pub fn new(payload: T, validity: TimeDelta) -> Self {
        Self::with_timestamp(payload, validity, Utc::now())
    }

    pub fn with_timestamp(payload: T, validity: TimeDelta, cached_at: DateTime<Utc>) -> Self {
        Self {
            payload,
            cached_at,
            validity,
        }
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn cached_at(&self) -> DateTime<Utc> {
        self.cached_at
    }

    /// Absolute age keeps the predicate stable under minor clock skew.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        (now - self.cached_at).abs() <= self.validity
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn age_minutes_at(&self, now: DateTime<Utc>) -> i64 {
        (now - self.cached_at).num_minutes()
    }

    pub fn age_minutes(&self) -> i64 {
        self.age_minutes_at(Utc::now())
    }
}

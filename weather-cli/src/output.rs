//! Terminal rendering of service events.

use weather_core::{CurrentWeather, Forecast, WeatherEvent};

/// Print one event; returns `true` when the event was an error.
pub fn render_event(event: &WeatherEvent) -> bool {
    match event {
        WeatherEvent::LoadingStarted { city, kind } => {
            println!("Fetching {kind} for {city}...");
            false
        }
        WeatherEvent::CurrentWeatherReady { data, .. } => {
            render_current(data);
            false
        }
        WeatherEvent::ForecastReady { data, .. } => {
            render_forecast(data);
            false
        }
        WeatherEvent::CacheUpdated { .. } | WeatherEvent::CacheCleanedUp { .. } => false,
        WeatherEvent::ErrorOccurred {
            city,
            message,
            category,
        } => {
            eprintln!("error ({category}) for {city}: {message}");
            true
        }
    }
}

fn render_current(data: &CurrentWeather) {
    println!(
        "{}, {}  {:.1}°C (feels like {:.1}°C)",
        data.city_name, data.country_code, data.temperature, data.feels_like
    );
    if !data.description.is_empty() {
        println!("  {}", data.description);
    }
    println!(
        "  humidity {:.0}%  pressure {:.0} hPa  wind {:.1} m/s",
        data.humidity, data.pressure, data.wind_speed
    );
    println!("  observed at {}", data.observed_at.format("%Y-%m-%d %H:%M UTC"));
}

fn render_forecast(data: &Forecast) {
    println!("5-day forecast for {}:", data.city_name);
    for day in data.daily_summaries() {
        println!(
            "  {}  {:>5.1}°C … {:>5.1}°C  {}",
            day.date.format("%a %d %b"),
            day.min_temp,
            day.max_temp,
            day.dominant_condition
        );
    }
}

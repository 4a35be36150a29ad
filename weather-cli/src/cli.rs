use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use weather_core::{Config, HttpTransport, WeatherEvent, WeatherService};

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI with a TTL-bounded cache")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeatherMap API key (prompted interactively).
    Configure,

    /// Show current conditions for a city.
    Current {
        /// City name, e.g. "Paris" or "New York".
        city: String,
    },

    /// Show the 5-day forecast for a city.
    Forecast {
        /// City name.
        city: String,
    },

    /// Prompt loop; repeated lookups within a session hit the cache.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Current { city } => {
                let (service, rx) = build_service()?;
                service.request_current_weather(&city).await;
                render_pending_events(rx)
            }
            Command::Forecast { city } => {
                let (service, rx) = build_service()?;
                service.request_forecast(&city).await;
                render_pending_events(rx)
            }
            Command::Interactive => interactive().await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let key = inquire::Password::new("OpenWeatherMap API key:")
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    config.api_key = Some(key.trim().to_string());
    config.save()?;

    println!("API key saved to {}", Config::config_file_path()?.display());
    Ok(())
}

fn build_service() -> anyhow::Result<(Arc<WeatherService>, mpsc::UnboundedReceiver<WeatherEvent>)> {
    let config = Config::load()?;
    if !config.has_api_key() {
        bail!("No API key configured.\nHint: run `weather configure` first.");
    }

    let (service, rx) = WeatherService::from_config(&config, Arc::new(HttpTransport::new()));
    Ok((Arc::new(service), rx))
}

/// Drain and render everything the service emitted for a completed request.
fn render_pending_events(mut rx: mpsc::UnboundedReceiver<WeatherEvent>) -> anyhow::Result<()> {
    let mut failed = false;
    while let Ok(event) = rx.try_recv() {
        failed |= output::render_event(&event);
    }
    if failed {
        bail!("request failed");
    }
    Ok(())
}

async fn interactive() -> anyhow::Result<()> {
    let (service, mut rx) = build_service()?;

    // Hourly sweep, as a long-lived session accumulates stale entries.
    let sweeper = service.spawn_cache_sweeper(Duration::from_secs(60 * 60));

    println!("Interactive mode. Empty input exits.");
    loop {
        let city = inquire::Text::new("City:").prompt().unwrap_or_default();
        if city.trim().is_empty() {
            break;
        }

        let kind = inquire::Select::new("Lookup:", vec!["current", "forecast"])
            .prompt()
            .unwrap_or("current");

        match kind {
            "forecast" => service.request_forecast(&city).await,
            _ => service.request_current_weather(&city).await,
        }

        while let Ok(event) = rx.try_recv() {
            output::render_event(&event);
        }
    }

    sweeper.abort();
    Ok(())
}

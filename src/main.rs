//! # Sea Forecast Application Entry Point
//!
//! This binary crate coordinates configuration, data fetching and rendering.
//! It supports a production mode (writes the panel image for the display driver)
//! and development modes (ASCII table or JSON dump on stdout).
//!
//! ## Usage
//! ```text
//! sea-forecast [--config <path>] [--output <path>] [--stdout] [--json]
//! ```

// Test modules
#[cfg(test)]
mod tests;

use anyhow::Context;
use sea_forecast_lib::config::{Config, DEFAULT_CONFIG_PATH};
use sea_forecast_lib::renderer::draw_ascii;
use sea_forecast_lib::source::{http_client, OpenMeteoClient};
use sea_forecast_lib::tide_data::AdmiraltyClient;
use sea_forecast_lib::forecast;
use std::env;
use std::time::Duration;

/// Default location of the rendered panel image.
const DEFAULT_OUTPUT_PATH: &str = "sea-forecast.pbm";

/// Value following `flag` on the command line, if any.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|index| args.get(index + 1))
        .map(String::as_str)
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::init_from_env(env);

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let development_mode = args.iter().any(|arg| arg == "--stdout");
    let json_mode = args.iter().any(|arg| arg == "--json");
    let config_path = flag_value(&args, "--config").unwrap_or(DEFAULT_CONFIG_PATH);
    let output_path = flag_value(&args, "--output").unwrap_or(DEFAULT_OUTPUT_PATH);

    let config = Config::load_from_path(config_path);

    let http = http_client(Duration::from_secs(config.api.request_timeout_secs))
        .context("failed to build HTTP client")?;
    let admiralty = AdmiraltyClient::new(
        http.clone(),
        config.api.admiralty_url.as_str(),
        config.tidal_api_key(),
    );
    let open_meteo = OpenMeteoClient::new(
        http,
        config.api.marine_url.as_str(),
        config.api.forecast_url.as_str(),
        config.location.timezone.as_str(),
    );

    // Create Tokio runtime for the feed requests
    let rt = tokio::runtime::Runtime::new()?;

    // Any feed failure aborts the run; there is no partial forecast
    let forecast = rt
        .block_on(forecast::aggregate(&config, &admiralty, &open_meteo))
        .map_err(|error| {
            log::error!("Data request failed: {}", error);
            error
        })
        .context("data request failure, please check logs")?;

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&forecast)?);
        return Ok(());
    }

    // Development mode: ASCII output for testing
    if development_mode {
        print!("{}", draw_ascii(&forecast));
        return Ok(());
    }

    forecast::write_panel(&forecast, &config.display, output_path)
        .with_context(|| format!("failed to write panel image to {}", output_path))?;

    Ok(())
}

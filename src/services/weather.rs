//! Weather forecast source.
//!
//! The live implementation calls the OpenWeatherMap 5-day / 3-hour forecast
//! endpoint, by coordinates when the city has them and by name otherwise.

use async_trait::async_trait;
use url::Url;

use crate::config::WeatherConfig;
use crate::models::{City, Forecast};

/// Errors raised while fetching a forecast
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("WEATHER_API_KEY is not set")]
    MissingApiKey,

    #[error("Invalid weather API URL: {0}")]
    InvalidUrl(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid forecast JSON: {0}")]
    Decode(String),

    #[error("Forecast contained no entries")]
    EmptyForecast,
}

/// Anything that can produce a forecast for a city
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn forecast(&self, city: &City) -> Result<Forecast, WeatherError>;
}

/// OpenWeatherMap forecast client
#[derive(Debug, Clone)]
pub struct OpenWeatherMapClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherMapClient {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Builds the forecast URL, metric units
    pub fn forecast_url(&self, city: &City, api_key: &str) -> Result<Url, WeatherError> {
        let endpoint = format!("{}/data/2.5/forecast", self.base_url);

        let mut params: Vec<(&str, String)> = match city.coordinates {
            Some(coords) => vec![("lat", coords.lat.to_string()), ("lon", coords.lon.to_string())],
            None => vec![("q", city.name.clone())],
        };
        params.push(("appid", api_key.to_string()));
        params.push(("units", "metric".to_string()));

        Url::parse_with_params(&endpoint, &params)
            .map_err(|e| WeatherError::InvalidUrl(format!("{}: {}", endpoint, e)))
    }
}

/// Replaces the API key in a URL before it is logged
fn redact(url: &Url, api_key: &str) -> String {
    url.as_str().replace(api_key, "REDACTED")
}

#[async_trait]
impl WeatherSource for OpenWeatherMapClient {
    async fn forecast(&self, city: &City) -> Result<Forecast, WeatherError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            log::error!("WEATHER_API_KEY not found. Cannot fetch weather.");
            WeatherError::MissingApiKey
        })?;

        let url = self.forecast_url(city, api_key)?;
        log::info!("Fetching weather forecast from: {}", redact(&url, api_key));

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            log::error!("Error fetching weather forecast for {}: {}", city.name, e);
            e
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!(
                "Weather API returned {} for {} (check API key/city name)",
                status.as_u16(),
                city.name
            );
            return Err(WeatherError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        let forecast: Forecast =
            serde_json::from_slice(&body).map_err(|e| WeatherError::Decode(e.to_string()))?;

        if forecast.list.is_empty() {
            return Err(WeatherError::EmptyForecast);
        }

        Ok(forecast)
    }
}

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::config::WeatherConfig;
use crate::error::{AppError, WeatherError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temp_c: f64,
    pub temp_f: f64,
    pub condition: Condition,
    pub humidity: i64,
    pub wind_kph: f64,
    pub feelslike_c: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySummary {
    pub maxtemp_c: f64,
    pub mintemp_c: f64,
    pub condition: Condition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: String,
    pub day: DaySummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast {
    pub forecastday: Vec<ForecastDay>,
}

/// Weather payload returned to clients, mirroring the upstream API shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherPayload {
    pub location: Location,
    pub current: CurrentConditions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Forecast>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitySuggestion {
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    error: Option<UpstreamErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorDetail {
    message: String,
}

#[derive(Clone)]
pub struct WeatherClient {
    http: Client,
    config: WeatherConfig,
}

impl WeatherClient {
    pub fn new(config: WeatherConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    fn api_key(&self) -> Result<&str, AppError> {
        if self.config.api_key.is_empty() {
            return Err(AppError::WeatherError(WeatherError::MissingApiKey));
        }
        Ok(&self.config.api_key)
    }

    /// Fetches current conditions plus a `days`-day forecast for a city.
    pub async fn forecast(&self, city: &str, days: u8) -> Result<WeatherPayload, AppError> {
        let key = self.api_key()?;
        let url = format!("{}/forecast.json", self.config.api_url);
        let days = days.to_string();

        let response = self
            .http
            .get(&url)
            .query(&[
                ("key", key),
                ("q", city),
                ("days", days.as_str()),
                ("aqi", "no"),
                ("lang", self.config.language.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::WeatherError(WeatherError::RequestFailed(e.to_string())))?;

        if !response.status().is_success() {
            let message = Self::upstream_message(response).await;
            error!("Weather API forecast error: {}", message);
            return Err(AppError::WeatherError(WeatherError::UpstreamError(message)));
        }

        response
            .json::<WeatherPayload>()
            .await
            .map_err(|e| AppError::WeatherError(WeatherError::UpstreamError(e.to_string())))
    }

    /// Returns city suggestions for a query, keeping only cities in the
    /// configured country.
    pub async fn search(&self, query: &str) -> Result<Vec<CitySuggestion>, AppError> {
        let key = self.api_key()?;
        let url = format!("{}/search.json", self.config.api_url);

        let response = self
            .http
            .get(&url)
            .query(&[("key", key), ("q", query)])
            .send()
            .await
            .map_err(|e| AppError::WeatherError(WeatherError::RequestFailed(e.to_string())))?;

        if !response.status().is_success() {
            let message = Self::upstream_message(response).await;
            error!("Weather API search error: {}", message);
            return Err(AppError::WeatherError(WeatherError::UpstreamError(message)));
        }

        let suggestions = response
            .json::<Vec<CitySuggestion>>()
            .await
            .map_err(|e| AppError::WeatherError(WeatherError::UpstreamError(e.to_string())))?;

        Ok(suggestions
            .into_iter()
            .filter(|city| city.country == self.config.search_country)
            .collect())
    }

    async fn upstream_message(response: reqwest::Response) -> String {
        let status = response.status();
        response
            .json::<UpstreamErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error.map(|e| e.message))
            .unwrap_or_else(|| format!("upstream returned status {}", status))
    }
}

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::AppState;

const MAX_FORECAST_DAYS: u8 = 5;
const MIN_SEARCH_QUERY_LEN: usize = 2;

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub city: Option<String>,
    pub days: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// GET /api/weather?city=<name>&days=<1..5>
pub async fn forecast(
    query: web::Query<ForecastQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let city = query
        .city
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::ValidationError("city parameter is required".into()))?;

    let days = query.days.unwrap_or(1);
    if days < 1 || days > MAX_FORECAST_DAYS {
        return Err(AppError::ValidationError(format!(
            "days must be between 1 and {}",
            MAX_FORECAST_DAYS
        )));
    }

    info!("Weather lookup for city: {} ({} days)", city, days);
    let payload = state.weather.forecast(city, days).await?;

    Ok(HttpResponse::Ok().json(payload))
}

/// GET /api/weather/search?q=<query>
pub async fn search(
    query: web::Query<SearchQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let q = query.q.as_deref().map(str::trim).unwrap_or("");
    if q.chars().count() < MIN_SEARCH_QUERY_LEN {
        return Err(AppError::ValidationError(format!(
            "q must be at least {} characters",
            MIN_SEARCH_QUERY_LEN
        )));
    }

    let suggestions = state.weather.search(q).await?;

    Ok(HttpResponse::Ok().json(suggestions))
}

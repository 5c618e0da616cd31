use meteo_server::{AppState, BillingClient, DbOperations, Settings, WeatherClient, WebhookVerifier};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

/// Builds an AppState over a lazily-connected pool, so request handling
/// up to the first database touch can be exercised without Postgres.
pub fn test_state(config: Settings) -> AppState {
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("Failed to create lazy pool");

    AppState {
        db: DbOperations::new(Arc::new(pool)),
        weather: WeatherClient::new(config.weather.clone()),
        billing: BillingClient::new(config.billing.clone()),
        webhook_verifier: WebhookVerifier::new(
            config.billing.webhook_secret.clone(),
            config.billing.signature_tolerance_secs,
        ),
        config: Arc::new(config),
    }
}

pub mod account;
pub mod auth;
pub mod billing;
pub mod config;
pub mod db;
pub mod error;
pub mod favorites;
pub mod weather;

use std::sync::Arc;
use std::time::Duration;
use actix_web::HttpResponse;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::Session;
pub use billing::{BillingClient, WebhookVerifier};
pub use db::{Account, DbOperations, Favorite};
pub use weather::WeatherClient;

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub db: DbOperations,
    pub weather: WeatherClient,
    pub billing: BillingClient,
    pub webhook_verifier: WebhookVerifier,
}

impl AppState {
    pub async fn new(config: Settings) -> Result<Self> {
        // Initialize database connection pool and apply migrations
        let db = DbOperations::new_with_options(
            &config.database.url,
            config.database.max_connections,
            Duration::from_secs(5),
        )
        .await?;
        db.run_migrations().await?;

        let weather = WeatherClient::new(config.weather.clone());
        let billing = BillingClient::new(config.billing.clone());
        let webhook_verifier = WebhookVerifier::new(
            config.billing.webhook_secret.clone(),
            config.billing.signature_tolerance_secs,
        );

        Ok(Self {
            config: Arc::new(config),
            db,
            weather,
            billing,
            webhook_verifier,
        })
    }

    pub async fn shutdown(&self) -> Result<()> {
        // Close database connections
        self.db.pool().close().await;

        Ok(())
    }
}

//! Account profile endpoint
//!
//! Exposes the server's read-mostly copy of the account, including the
//! premium entitlement fields the UI gates forecasts and favorites on.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::Session;
use crate::db::models::Account;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub is_premium: bool,
    pub subscription_status: String,
    pub premium_activated_at: Option<DateTime<Utc>>,
}

impl From<Account> for ProfileResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            display_name: account.display_name,
            is_premium: account.is_premium,
            subscription_status: account.subscription_status,
            premium_activated_at: account.premium_activated_at,
        }
    }
}

/// GET /api/me
pub async fn profile(
    session: Session,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let account = state
        .db
        .ensure_account(session.account_id, &session.email)
        .await?;

    Ok(HttpResponse::Ok().json(ProfileResponse::from(account)))
}

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::Session;
use crate::error::{AppError, DatabaseError};
use crate::favorites::entitlement;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AddFavoriteRequest {
    pub city_name: String,
}

/// GET /api/favorites
pub async fn list(
    session: Session,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let favorites = state.db.list_favorites(session.account_id).await?;
    Ok(HttpResponse::Ok().json(favorites))
}

/// POST /api/favorites
pub async fn add(
    session: Session,
    req: web::Json<AddFavoriteRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let city_name = req.city_name.trim();
    if city_name.is_empty() {
        return Err(AppError::ValidationError("city_name is required".into()));
    }

    let account = state
        .db
        .ensure_account(session.account_id, &session.email)
        .await?;

    let cap = entitlement::favorite_cap(account.is_premium);
    let favorite = state.db.add_favorite(account.id, city_name, cap).await?;

    info!("Favorite added for account {}: {}", account.id, city_name);
    Ok(HttpResponse::Created().json(favorite))
}

/// DELETE /api/favorites/{id}
pub async fn remove(
    session: Session,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let deleted = state.db.delete_favorite(id, session.account_id).await?;

    if !deleted {
        return Err(AppError::DatabaseError(DatabaseError::NotFound));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "deleted": id
    })))
}

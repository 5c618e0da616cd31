use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use tracing::{info, warn};

use crate::auth::Session;
use crate::billing::events::{plan_transition, AccountTransition, WebhookEvent};
use crate::error::{AppError, BillingError};
use crate::AppState;

/// POST /api/billing/checkout
///
/// Creates a premium subscription checkout session for the session
/// account, provisioning the billing customer on first use.
pub async fn create_checkout(
    session: Session,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let account = state
        .db
        .ensure_account(session.account_id, &session.email)
        .await?;

    let customer_id = match account.billing_customer_id {
        Some(id) => id,
        None => {
            let id = state
                .billing
                .create_customer(&account.email, account.id)
                .await?;
            state.db.set_billing_customer(account.id, &id).await?;
            id
        }
    };

    let session_id = state
        .billing
        .create_checkout_session(&customer_id, account.id)
        .await?;

    info!("Checkout session created for account {}", account.id);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "sessionId": session_id
    })))
}

/// POST /api/billing/webhook
///
/// Receives signed events from the payment processor. The signature is
/// checked against the raw body before anything else; a bad signature
/// changes no state. Event types outside the handled set, and events for
/// accounts we do not know, are acknowledged as no-ops so the processor
/// stops retrying them.
pub async fn webhook(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let header = req
        .headers()
        .get("Stripe-Signature")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            AppError::BillingError(BillingError::InvalidSignature(
                "missing Stripe-Signature header".into(),
            ))
        })?;

    state.webhook_verifier.verify(&body, header, Utc::now())?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::ValidationError(format!("Invalid event payload: {}", e)))?;

    match plan_transition(&event) {
        Some(transition) => apply_transition(&state, &event.event_type, transition).await?,
        None => info!("Ignoring webhook event: {}", event.event_type),
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "received": true
    })))
}

async fn apply_transition(
    state: &AppState,
    event_type: &str,
    transition: AccountTransition,
) -> Result<(), AppError> {
    let rows = match transition {
        AccountTransition::CheckoutCompleted {
            account_id,
            customer_id,
            subscription_id,
        } => {
            state
                .db
                .activate_premium(
                    account_id,
                    customer_id.as_deref(),
                    subscription_id.as_deref(),
                )
                .await?
        }
        AccountTransition::SubscriptionUpdated {
            customer_id,
            status,
            is_premium,
        } => {
            state
                .db
                .update_subscription(&customer_id, &status, is_premium)
                .await?
        }
        AccountTransition::SubscriptionDeleted { customer_id } => {
            state.db.cancel_subscription(&customer_id).await?
        }
    };

    if rows == 0 {
        warn!("Webhook event {} matched no account, ignoring", event_type);
    } else {
        info!("Webhook event {} applied to {} account(s)", event_type, rows);
    }

    Ok(())
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Local copy of an auth-backend user, enriched with billing state.
///
/// Premium entitlement lives in `is_premium` and `subscription_status`,
/// and is mutated only by verified billing webhook events.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub is_premium: bool,
    pub subscription_status: String,
    pub billing_customer_id: Option<String>,
    pub billing_subscription_id: Option<String>,
    pub premium_activated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(id: Uuid, email: String, display_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            email,
            display_name,
            is_premium: false,
            subscription_status: SubscriptionStatus::Free.as_str().to_string(),
            billing_customer_id: None,
            billing_subscription_id: None,
            premium_activated_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Favorite {
    pub id: Uuid,
    pub account_id: Uuid,
    pub city_name: String,
    pub created_at: DateTime<Utc>,
}

impl Favorite {
    pub fn new(account_id: Uuid, city_name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            city_name,
            created_at: Utc::now(),
        }
    }
}

/// Canonical subscription states written by the webhook dispatcher.
/// Statuses delivered by the billing processor are stored as-is, so the
/// column can also hold values outside this set (e.g. "past_due").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Free,
    Active,
    Trialing,
    Canceled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Free => "free",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Canceled => "canceled",
        }
    }
}

/// Whether a billing subscription status grants premium entitlement.
pub fn status_grants_premium(status: &str) -> bool {
    matches!(status, "active" | "trialing")
}

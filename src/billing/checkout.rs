use reqwest::Client;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::config::BillingConfig;
use crate::error::{AppError, BillingError};

#[derive(Debug, Deserialize)]
struct CreatedObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    error: Option<UpstreamErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorDetail {
    message: String,
}

/// REST client for the payment processor's customer and checkout APIs.
#[derive(Clone)]
pub struct BillingClient {
    http: Client,
    config: BillingConfig,
}

impl BillingClient {
    pub fn new(config: BillingConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    fn secret_key(&self) -> Result<&str, AppError> {
        if self.config.secret_key.is_empty() {
            return Err(AppError::ConfigError(
                "Billing secret key is not configured".into(),
            ));
        }
        Ok(&self.config.secret_key)
    }

    /// Creates a billing customer for an account and returns its id.
    pub async fn create_customer(
        &self,
        email: &str,
        account_id: Uuid,
    ) -> Result<String, AppError> {
        let key = self.secret_key()?;
        let url = format!("{}/v1/customers", self.config.api_url);

        let response = self
            .http
            .post(&url)
            .basic_auth(key, None::<&str>)
            .form(&[
                ("email", email.to_string()),
                ("metadata[account_id]", account_id.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::BillingError(BillingError::RequestFailed(e.to_string())))?;

        if !response.status().is_success() {
            let message = Self::upstream_message(response).await;
            error!("Billing customer creation failed: {}", message);
            return Err(AppError::BillingError(BillingError::UpstreamError(message)));
        }

        let created = response
            .json::<CreatedObject>()
            .await
            .map_err(|e| AppError::BillingError(BillingError::UpstreamError(e.to_string())))?;

        Ok(created.id)
    }

    /// Creates a subscription checkout session for the premium plan and
    /// returns the session id the client redirects to.
    pub async fn create_checkout_session(
        &self,
        customer_id: &str,
        account_id: Uuid,
    ) -> Result<String, AppError> {
        let key = self.secret_key()?;
        let url = format!("{}/v1/checkout/sessions", self.config.api_url);

        let response = self
            .http
            .post(&url)
            .basic_auth(key, None::<&str>)
            .form(&[
                ("customer", customer_id.to_string()),
                ("mode", "subscription".to_string()),
                ("payment_method_types[0]", "card".to_string()),
                ("line_items[0][price]", self.config.price_id.clone()),
                ("line_items[0][quantity]", "1".to_string()),
                ("success_url", self.config.success_url.clone()),
                ("cancel_url", self.config.cancel_url.clone()),
                // The webhook locates the account through this metadata.
                ("metadata[userId]", account_id.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::BillingError(BillingError::RequestFailed(e.to_string())))?;

        if !response.status().is_success() {
            let message = Self::upstream_message(response).await;
            error!("Checkout session creation failed: {}", message);
            return Err(AppError::BillingError(BillingError::UpstreamError(message)));
        }

        let created = response
            .json::<CreatedObject>()
            .await
            .map_err(|e| AppError::BillingError(BillingError::UpstreamError(e.to_string())))?;

        Ok(created.id)
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(api_url: String, secret_key: &str) -> BillingConfig {
        BillingConfig {
            api_url,
            secret_key: secret_key.to_string(),
            webhook_secret: "whsec_test".to_string(),
            price_id: "price_premium".to_string(),
            success_url: "http://localhost:3000/dashboard?success=true".to_string(),
            cancel_url: "http://localhost:3000/premium?canceled=true".to_string(),
            signature_tolerance_secs: 300,
        }
    }

    #[tokio::test]
    async fn test_create_customer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/customers"))
            .and(body_string_contains("email=user%40example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "cus_123"})))
            .mount(&server)
            .await;

        let client = BillingClient::new(test_config(server.uri(), "sk_test"));
        let id = client
            .create_customer("user@example.com", Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(id, "cus_123");
    }

    #[tokio::test]
    async fn test_create_checkout_session() {
        let server = MockServer::start().await;
        let account_id = Uuid::new_v4();
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .and(body_string_contains("customer=cus_123"))
            .and(body_string_contains("mode=subscription"))
            .and(body_string_contains(account_id.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "cs_test_789"})))
            .mount(&server)
            .await;

        let client = BillingClient::new(test_config(server.uri(), "sk_test"));
        let session_id = client
            .create_checkout_session("cus_123", account_id)
            .await
            .unwrap();
        assert_eq!(session_id, "cs_test_789");
    }

    #[tokio::test]
    async fn test_upstream_error_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "error": {"message": "Your card was declined."}
            })))
            .mount(&server)
            .await;

        let client = BillingClient::new(test_config(server.uri(), "sk_test"));
        let err = client
            .create_checkout_session("cus_123", Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Your card was declined."));
    }

    #[tokio::test]
    async fn test_missing_secret_key() {
        let client = BillingClient::new(test_config("http://127.0.0.1:1".into(), ""));
        let err = client
            .create_customer("user@example.com", Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{AppError, BillingError};

type HmacSha256 = Hmac<Sha256>;

/// Verifies payment-processor webhook signatures.
///
/// The signature header carries a unix timestamp and one or more hex
/// HMAC-SHA256 digests over `"{timestamp}.{raw body}"`:
///
/// ```text
/// Stripe-Signature: t=1712000000,v1=5257a86...
/// ```
///
/// Verification fails closed: no account state is touched unless the
/// timestamp is within tolerance and one digest matches.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    pub fn new(secret: String, tolerance_secs: i64) -> Self {
        Self {
            secret,
            tolerance_secs,
        }
    }

    pub fn verify(
        &self,
        payload: &[u8],
        header: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        // An unconfigured secret must never validate: anyone could mint
        // matching signatures.
        if self.secret.is_empty() {
            return Err(AppError::ConfigError(
                "Webhook secret is not configured".into(),
            ));
        }

        let mut timestamp: Option<i64> = None;
        let mut candidates: Vec<&str> = Vec::new();

        for element in header.split(',') {
            match element.trim().split_once('=') {
                Some(("t", value)) => timestamp = value.parse().ok(),
                Some(("v1", value)) => candidates.push(value),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            AppError::BillingError(BillingError::InvalidSignature(
                "missing or malformed timestamp".into(),
            ))
        })?;

        if candidates.is_empty() {
            return Err(AppError::BillingError(BillingError::InvalidSignature(
                "missing v1 signature".into(),
            )));
        }

        if (now.timestamp() - timestamp).abs() > self.tolerance_secs {
            return Err(AppError::BillingError(BillingError::InvalidSignature(
                "timestamp outside tolerance".into(),
            )));
        }

        for candidate in candidates {
            let Ok(digest) = hex::decode(candidate) else {
                continue;
            };
            // verify_slice is a constant-time comparison
            if self.mac(timestamp, payload)?.verify_slice(&digest).is_ok() {
                return Ok(());
            }
        }

        Err(AppError::BillingError(BillingError::InvalidSignature(
            "signature mismatch".into(),
        )))
    }

    fn mac(&self, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, AppError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes()).map_err(|e| {
            AppError::BillingError(BillingError::InvalidSignature(e.to_string()))
        })?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac)
    }
}

/// Produces a valid signature header for a payload, as the payment
/// processor would. Used by tests and local webhook tooling.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

//! Billing module
//!
//! Integration with the payment processor: checkout session creation for
//! the premium subscription, and the signed webhook that drives the
//! persisted premium state. The webhook path is the only writer of the
//! premium flag; nothing else in the server flips it.

pub mod checkout;
pub mod events;
pub mod handlers;
pub mod signature;

pub use checkout::BillingClient;
pub use events::{plan_transition, AccountTransition, WebhookEvent};
pub use signature::WebhookVerifier;

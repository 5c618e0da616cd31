use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::db::models::status_grants_premium;

/// A verified webhook event as delivered by the payment processor.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub object: Value,
}

/// The account row update a webhook event maps to.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountTransition {
    CheckoutCompleted {
        account_id: Uuid,
        customer_id: Option<String>,
        subscription_id: Option<String>,
    },
    SubscriptionUpdated {
        customer_id: String,
        status: String,
        is_premium: bool,
    },
    SubscriptionDeleted {
        customer_id: String,
    },
}

/// Maps an event to its account transition. `None` means the delivery is
/// a no-op: an event type we do not handle, or a payload missing the
/// fields needed to locate an account.
pub fn plan_transition(event: &WebhookEvent) -> Option<AccountTransition> {
    let object = &event.data.object;

    match event.event_type.as_str() {
        "checkout.session.completed" => {
            let account_id = object
                .pointer("/metadata/userId")
                .and_then(Value::as_str)
                .and_then(|id| Uuid::parse_str(id).ok())?;

            Some(AccountTransition::CheckoutCompleted {
                account_id,
                customer_id: string_field(object, "customer"),
                subscription_id: string_field(object, "subscription"),
            })
        }
        "customer.subscription.updated" => {
            let customer_id = string_field(object, "customer")?;
            let status = string_field(object, "status")?;
            let is_premium = status_grants_premium(&status);

            Some(AccountTransition::SubscriptionUpdated {
                customer_id,
                status,
                is_premium,
            })
        }
        "customer.subscription.deleted" => {
            let customer_id = string_field(object, "customer")?;
            Some(AccountTransition::SubscriptionDeleted { customer_id })
        }
        _ => None,
    }
}

fn string_field(object: &Value, field: &str) -> Option<String> {
    object.get(field).and_then(Value::as_str).map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(event_type: &str, object: Value) -> WebhookEvent {
        serde_json::from_value(json!({
            "type": event_type,
            "data": {"object": object}
        }))
        .unwrap()
    }

    #[test]
    fn test_checkout_completed() {
        let account_id = Uuid::new_v4();
        let e = event(
            "checkout.session.completed",
            json!({
                "customer": "cus_123",
                "subscription": "sub_456",
                "metadata": {"userId": account_id.to_string()}
            }),
        );

        assert_eq!(
            plan_transition(&e),
            Some(AccountTransition::CheckoutCompleted {
                account_id,
                customer_id: Some("cus_123".into()),
                subscription_id: Some("sub_456".into()),
            })
        );
    }

    #[test]
    fn test_checkout_completed_without_user_metadata_is_noop() {
        let e = event(
            "checkout.session.completed",
            json!({"customer": "cus_123", "metadata": {}}),
        );
        assert_eq!(plan_transition(&e), None);
    }

    #[test]
    fn test_subscription_updated_to_trialing_grants_premium() {
        let e = event(
            "customer.subscription.updated",
            json!({"customer": "cus_123", "status": "trialing"}),
        );

        assert_eq!(
            plan_transition(&e),
            Some(AccountTransition::SubscriptionUpdated {
                customer_id: "cus_123".into(),
                status: "trialing".into(),
                is_premium: true,
            })
        );
    }

    #[test]
    fn test_subscription_updated_to_past_due_revokes_premium() {
        let e = event(
            "customer.subscription.updated",
            json!({"customer": "cus_123", "status": "past_due"}),
        );

        match plan_transition(&e) {
            Some(AccountTransition::SubscriptionUpdated {
                status, is_premium, ..
            }) => {
                assert_eq!(status, "past_due");
                assert!(!is_premium);
            }
            other => panic!("unexpected transition: {:?}", other),
        }
    }

    #[test]
    fn test_subscription_deleted() {
        let e = event(
            "customer.subscription.deleted",
            json!({"customer": "cus_123", "status": "canceled"}),
        );

        assert_eq!(
            plan_transition(&e),
            Some(AccountTransition::SubscriptionDeleted {
                customer_id: "cus_123".into()
            })
        );
    }

    #[test]
    fn test_unrecognized_event_type_is_noop() {
        let e = event("invoice.paid", json!({"customer": "cus_123"}));
        assert_eq!(plan_transition(&e), None);
    }
}

use anyhow::{Result, anyhow, bail};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::domain::value_objects::billing::BillingEvent;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed webhook, in seconds, before it is treated as a replay.
pub const DEFAULT_SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub created: Option<i64>,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionObject {
    customer: Option<String>,
    customer_email: Option<String>,
    customer_details: Option<CustomerDetails>,
}

#[derive(Debug, Deserialize)]
struct CustomerDetails {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CustomerScopedObject {
    customer: Option<String>,
    subscription: Option<String>,
}

/// Verifies `Stripe-Signature` headers. https://stripe.com/docs/webhooks/signatures
pub struct StripeWebhookVerifier {
    webhook_secret: String,
    tolerance_secs: i64,
}

impl StripeWebhookVerifier {
    pub fn new(webhook_secret: String) -> Self {
        Self {
            webhook_secret,
            tolerance_secs: DEFAULT_SIGNATURE_TOLERANCE_SECS,
        }
    }

    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Checks the header against the raw body and returns the parsed event.
    /// `now` is the current unix time in seconds.
    pub fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<StripeEvent> {
        let mut timestamp: Option<&str> = None;
        let mut signatures: Vec<&str> = Vec::new();

        for part in signature_header.split(',').map(str::trim) {
            if let Some(rest) = part.strip_prefix("t=") {
                timestamp = Some(rest);
            } else if let Some(rest) = part.strip_prefix("v1=") {
                signatures.push(rest);
            }
        }

        let timestamp = timestamp.ok_or_else(|| anyhow!("missing timestamp in stripe-signature"))?;
        if signatures.is_empty() {
            bail!("missing v1 in stripe-signature");
        }

        let signed_at: i64 = timestamp
            .parse()
            .map_err(|_| anyhow!("invalid timestamp in stripe-signature"))?;
        if (now - signed_at).abs() > self.tolerance_secs {
            bail!("stripe-signature timestamp outside tolerance");
        }

        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);

        // Stripe sends one v1 entry per active secret during rotation.
        let matched = signatures.iter().any(|signature| {
            hex::decode(signature)
                .map(|provided| mac.clone().verify_slice(&provided).is_ok())
                .unwrap_or(false)
        });
        if !matched {
            bail!("invalid webhook signature");
        }

        parse_event(payload)
    }
}

pub fn parse_event(payload: &[u8]) -> Result<StripeEvent> {
    let event: StripeEvent = serde_json::from_slice(payload)?;
    Ok(event)
}

/// Builds a `Stripe-Signature` header value for `payload`.
pub fn signature_header(webhook_secret: &str, timestamp: i64, payload: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(webhook_secret.as_bytes())?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let signature = hex::encode(mac.finalize().into_bytes());
    Ok(format!("t={timestamp},v1={signature}"))
}

/// Maps a Stripe event to the billing fact it carries. `Ok(None)` for event
/// types that do not affect membership.
pub fn billing_event(event: &StripeEvent) -> Result<Option<BillingEvent>> {
    let object = &event.data.object;

    let billing = match event.type_.as_str() {
        "checkout.session.completed" => {
            let session: CheckoutSessionObject = serde_json::from_value(object.clone())?;
            let email = session
                .customer_details
                .and_then(|details| details.email)
                .or(session.customer_email)
                // Stored user emails are lowercase.
                .map(|email| email.trim().to_ascii_lowercase())
                .ok_or_else(|| anyhow!("checkout session {} has no customer email", event.id))?;
            BillingEvent::SubscriptionActivated {
                email,
                customer_id: session.customer,
            }
        }
        "invoice.paid" => {
            let invoice: CustomerScopedObject = serde_json::from_value(object.clone())?;
            BillingEvent::InvoicePaid {
                customer_id: required_customer(invoice.customer, event)?,
                subscription_id: invoice.subscription,
            }
        }
        "invoice.payment_failed" => {
            let invoice: CustomerScopedObject = serde_json::from_value(object.clone())?;
            BillingEvent::PaymentFailed {
                customer_id: required_customer(invoice.customer, event)?,
            }
        }
        "customer.subscription.deleted" | "subscription.deleted" => {
            let subscription: CustomerScopedObject = serde_json::from_value(object.clone())?;
            BillingEvent::SubscriptionDeleted {
                customer_id: required_customer(subscription.customer, event)?,
            }
        }
        _ => return Ok(None),
    };

    Ok(Some(billing))
}

fn required_customer(customer: Option<String>, event: &StripeEvent) -> Result<String> {
    customer.ok_or_else(|| anyhow!("{} event {} has no customer", event.type_, event.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "whsec_test";

    fn payload(event_type: &str, object: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "id": "evt_1",
            "type": event_type,
            "created": 1_700_000_000,
            "data": { "object": object }
        }))
        .unwrap()
    }

    #[test]
    fn accepts_valid_signature() {
        let body = payload("invoice.paid", json!({ "customer": "cus_1" }));
        let header = signature_header(SECRET, 1_700_000_000, &body).unwrap();

        let event = StripeWebhookVerifier::new(SECRET.to_string())
            .verify_webhook_signature(&body, &header, 1_700_000_010)
            .unwrap();

        assert_eq!(event.id, "evt_1");
        assert_eq!(event.type_, "invoice.paid");
    }

    #[test]
    fn rejects_tampered_body() {
        let body = payload("invoice.paid", json!({ "customer": "cus_1" }));
        let header = signature_header(SECRET, 1_700_000_000, &body).unwrap();
        let tampered = payload("invoice.paid", json!({ "customer": "cus_2" }));

        let result = StripeWebhookVerifier::new(SECRET.to_string()).verify_webhook_signature(
            &tampered,
            &header,
            1_700_000_000,
        );

        assert!(result.is_err());
    }

    #[test]
    fn rejects_stale_timestamp() {
        let body = payload("invoice.paid", json!({ "customer": "cus_1" }));
        let header = signature_header(SECRET, 1_700_000_000, &body).unwrap();

        let result = StripeWebhookVerifier::new(SECRET.to_string())
            .verify_webhook_signature(&body, &header, 1_700_000_000 + 301);

        assert!(result.is_err());
    }

    #[test]
    fn rejects_header_without_v1() {
        let body = payload("invoice.paid", json!({ "customer": "cus_1" }));

        let result = StripeWebhookVerifier::new(SECRET.to_string())
            .verify_webhook_signature(&body, "t=1700000000", 1_700_000_000);

        assert!(result.is_err());
    }

    #[test]
    fn checkout_completed_is_keyed_by_email() {
        let body = payload(
            "checkout.session.completed",
            json!({ "customer": "cus_9", "customer_details": { "email": "a@example.com" } }),
        );
        let event = parse_event(&body).unwrap();

        assert_eq!(
            billing_event(&event).unwrap(),
            Some(BillingEvent::SubscriptionActivated {
                email: "a@example.com".to_string(),
                customer_id: Some("cus_9".to_string()),
            })
        );
    }

    #[test]
    fn checkout_email_is_lowercased() {
        let body = payload(
            "checkout.session.completed",
            json!({ "customer": "cus_9", "customer_email": " Alice@Example.COM " }),
        );
        let event = parse_event(&body).unwrap();

        assert_eq!(
            billing_event(&event).unwrap(),
            Some(BillingEvent::SubscriptionActivated {
                email: "alice@example.com".to_string(),
                customer_id: Some("cus_9".to_string()),
            })
        );
    }

    #[test]
    fn both_subscription_deleted_spellings_are_recognized() {
        for event_type in ["customer.subscription.deleted", "subscription.deleted"] {
            let event = parse_event(&payload(event_type, json!({ "customer": "cus_3" }))).unwrap();
            assert_eq!(
                billing_event(&event).unwrap(),
                Some(BillingEvent::SubscriptionDeleted {
                    customer_id: "cus_3".to_string()
                })
            );
        }
    }

    #[test]
    fn unrelated_event_types_are_ignored() {
        let event = parse_event(&payload("customer.created", json!({ "id": "cus_1" }))).unwrap();
        assert_eq!(billing_event(&event).unwrap(), None);
    }
}

use std::sync::Arc;

use chrono::Utc;
use crates::{
    domain::{
        entities::payment_records::InsertPaymentRecordEntity,
        repositories::{payment_records::PaymentRecordRepository, users::UserRepository},
        value_objects::billing::BillingEvent,
    },
    payments::stripe_client::{self, StripeWebhookVerifier},
};
use serde::Serialize;
use tracing::{info, warn};

use crate::usecases::{
    entitlements::EntitlementUseCase,
    errors::{UseCaseError, UseCaseResult},
};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WebhookReceipt {
    pub received: bool,
    pub event_id: String,
    pub event_type: String,
    /// `false` for event types that carry no billing fact.
    pub handled: bool,
}

pub struct BillingWebhookUseCase<U, P>
where
    U: UserRepository + Send + Sync + 'static,
    P: PaymentRecordRepository + Send + Sync + 'static,
{
    entitlements: Arc<EntitlementUseCase<U>>,
    payment_record_repository: Arc<P>,
    verifier: Option<StripeWebhookVerifier>,
}

impl<U, P> BillingWebhookUseCase<U, P>
where
    U: UserRepository + Send + Sync + 'static,
    P: PaymentRecordRepository + Send + Sync + 'static,
{
    /// Without a verifier every payload is trusted as-is; only for local runs.
    pub fn new(
        entitlements: Arc<EntitlementUseCase<U>>,
        payment_record_repository: Arc<P>,
        verifier: Option<StripeWebhookVerifier>,
    ) -> Self {
        Self {
            entitlements,
            payment_record_repository,
            verifier,
        }
    }

    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> UseCaseResult<WebhookReceipt> {
        let event = match &self.verifier {
            Some(verifier) => {
                let signature = signature.ok_or_else(|| {
                    UseCaseError::Validation("missing stripe-signature header".to_string())
                })?;
                verifier
                    .verify_webhook_signature(payload, signature, Utc::now().timestamp())
                    .map_err(|err| {
                        warn!(error = %err, "billing: webhook rejected");
                        UseCaseError::Validation(format!("webhook rejected: {err}"))
                    })?
            }
            None => stripe_client::parse_event(payload)
                .map_err(|err| UseCaseError::Validation(format!("malformed event: {err}")))?,
        };

        let billing_event = stripe_client::billing_event(&event)
            .map_err(|err| UseCaseError::Validation(format!("malformed {}: {err}", event.type_)))?;

        let Some(billing_event) = billing_event else {
            info!(event_id = %event.id, event_type = %event.type_, "billing: event ignored");
            return Ok(WebhookReceipt {
                received: true,
                event_id: event.id,
                event_type: event.type_,
                handled: false,
            });
        };

        if let BillingEvent::InvoicePaid {
            customer_id,
            subscription_id,
        } = &billing_event
        {
            let inserted = self
                .payment_record_repository
                .record_payment(InsertPaymentRecordEntity {
                    event_id: event.id.clone(),
                    customer_id: customer_id.clone(),
                    session_id: subscription_id.clone(),
                })
                .await?;
            if !inserted {
                info!(event_id = %event.id, "billing: payment already recorded");
            }
        }

        self.entitlements.apply_billing_event(&billing_event).await?;

        Ok(WebhookReceipt {
            received: true,
            event_id: event.id,
            event_type: event.type_,
            handled: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::domain::repositories::{
        payment_records::MockPaymentRecordRepository, users::MockUserRepository,
    };
    use mockall::predicate::eq;
    use serde_json::json;

    const SECRET: &str = "whsec_test_secret";

    fn invoice_paid(event_id: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "id": event_id,
            "type": "invoice.paid",
            "created": 1_700_000_000,
            "data": {"object": {"customer": "cus_1", "subscription": "sub_1"}}
        }))
        .unwrap()
    }

    fn build(
        user_repo: MockUserRepository,
        payment_repo: MockPaymentRecordRepository,
        verifier: Option<StripeWebhookVerifier>,
    ) -> BillingWebhookUseCase<MockUserRepository, MockPaymentRecordRepository> {
        BillingWebhookUseCase::new(
            Arc::new(EntitlementUseCase::new(Arc::new(user_repo), 5)),
            Arc::new(payment_repo),
            verifier,
        )
    }

    #[tokio::test]
    async fn signed_invoice_records_payment_and_grants_membership() {
        let payload = invoice_paid("evt_1");
        let header = stripe_client::signature_header(SECRET, Utc::now().timestamp(), &payload)
            .unwrap();

        let mut payment_repo = MockPaymentRecordRepository::new();
        payment_repo
            .expect_record_payment()
            .withf(|record| {
                record.event_id == "evt_1"
                    && record.customer_id == "cus_1"
                    && record.session_id.as_deref() == Some("sub_1")
            })
            .times(1)
            .returning(|_| Ok(true));

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_set_membership_by_customer_id()
            .with(eq("cus_1"), eq(true))
            .times(1)
            .returning(|_, _| Ok(1));

        let usecase = build(
            user_repo,
            payment_repo,
            Some(StripeWebhookVerifier::new(SECRET.to_string())),
        );
        let receipt = usecase
            .handle_webhook(&payload, Some(&header))
            .await
            .unwrap();

        assert!(receipt.handled);
        assert_eq!(receipt.event_type, "invoice.paid");
    }

    #[tokio::test]
    async fn bad_signature_changes_nothing() {
        let payload = invoice_paid("evt_1");
        let header =
            stripe_client::signature_header("wrong", Utc::now().timestamp(), &payload).unwrap();

        let mut payment_repo = MockPaymentRecordRepository::new();
        payment_repo.expect_record_payment().never();
        let mut user_repo = MockUserRepository::new();
        user_repo.expect_set_membership_by_customer_id().never();

        let usecase = build(
            user_repo,
            payment_repo,
            Some(StripeWebhookVerifier::new(SECRET.to_string())),
        );

        assert!(matches!(
            usecase.handle_webhook(&payload, Some(&header)).await,
            Err(UseCaseError::Validation(_))
        ));
        assert!(matches!(
            usecase.handle_webhook(&payload, None).await,
            Err(UseCaseError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn unknown_event_type_is_acknowledged() {
        let payload = serde_json::to_vec(&json!({
            "id": "evt_2",
            "type": "customer.created",
            "created": 1_700_000_000,
            "data": {"object": {}}
        }))
        .unwrap();

        let usecase = build(
            MockUserRepository::new(),
            MockPaymentRecordRepository::new(),
            None,
        );
        let receipt = usecase.handle_webhook(&payload, None).await.unwrap();

        assert!(receipt.received);
        assert!(!receipt.handled);
    }

    #[tokio::test]
    async fn replayed_invoice_still_settles_membership() {
        let payload = invoice_paid("evt_1");

        let mut payment_repo = MockPaymentRecordRepository::new();
        payment_repo.expect_record_payment().returning(|_| Ok(false));
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_set_membership_by_customer_id()
            .returning(|_, _| Ok(1));

        let usecase = build(user_repo, payment_repo, None);
        let receipt = usecase.handle_webhook(&payload, None).await.unwrap();

        assert!(receipt.handled);
    }
}

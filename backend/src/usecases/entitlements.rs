use std::sync::Arc;

use crates::domain::{
    entities::users::{InsertUserEntity, UserEntity},
    repositories::users::UserRepository,
    value_objects::{
        billing::BillingEvent,
        entitlements::{CreditDecision, EntitlementStatus},
    },
};
use tracing::{error, info, warn};

use crate::usecases::errors::{UseCaseError, UseCaseResult};

pub struct EntitlementUseCase<U>
where
    U: UserRepository + Send + Sync + 'static,
{
    user_repository: Arc<U>,
    default_credits: i32,
}

impl<U> EntitlementUseCase<U>
where
    U: UserRepository + Send + Sync + 'static,
{
    pub fn new(user_repository: Arc<U>, default_credits: i32) -> Self {
        Self {
            user_repository,
            default_credits,
        }
    }

    /// Creates the user on first visit; later calls return the stored row unchanged.
    pub async fn ensure_user(&self, email: &str, user_name: &str) -> UseCaseResult<UserEntity> {
        let email = email.trim();
        if email.is_empty() {
            return Err(UseCaseError::Validation("email is required".to_string()));
        }

        let user = self
            .user_repository
            .upsert_user(InsertUserEntity {
                email: email.to_string(),
                user_name: user_name.trim().to_string(),
                credits: self.default_credits,
                is_member: false,
            })
            .await
            .map_err(|err| {
                error!(email, db_error = ?err, "entitlements: failed to upsert user");
                err
            })?;

        Ok(user)
    }

    pub async fn get_status(&self, email: &str) -> UseCaseResult<EntitlementStatus> {
        let user = self.find_user(email).await?;

        Ok(EntitlementStatus {
            credits: user.credits,
            is_member: user.is_member,
        })
    }

    /// Members pass without spending. Everyone else spends one credit through
    /// a conditional decrement; a user at zero is denied, not errored.
    pub async fn check_and_consume_credit(&self, email: &str) -> UseCaseResult<CreditDecision> {
        let user = self.find_user(email).await?;

        if user.is_member {
            info!(email, "entitlements: member access granted");
            return Ok(CreditDecision {
                granted: true,
                remaining_credits: user.credits,
                is_member: true,
            });
        }

        let remaining = self
            .user_repository
            .consume_credit_if_available(email)
            .await
            .map_err(|err| {
                error!(email, db_error = ?err, "entitlements: failed to consume credit");
                err
            })?;

        match remaining {
            Some(remaining_credits) => {
                info!(email, remaining_credits, "entitlements: credit consumed");
                Ok(CreditDecision {
                    granted: true,
                    remaining_credits,
                    is_member: false,
                })
            }
            None => {
                warn!(email, "entitlements: no credits remaining");
                Ok(CreditDecision {
                    granted: false,
                    remaining_credits: 0,
                    is_member: false,
                })
            }
        }
    }

    /// Only the membership flag (and the customer id) move; credits never do.
    pub async fn apply_billing_event(&self, event: &BillingEvent) -> UseCaseResult<usize> {
        let updated = match event {
            BillingEvent::SubscriptionActivated { email, customer_id } => {
                self.user_repository
                    .activate_membership_by_email(email, customer_id.clone())
                    .await?
            }
            BillingEvent::InvoicePaid { customer_id, .. }
            | BillingEvent::PaymentFailed { customer_id }
            | BillingEvent::SubscriptionDeleted { customer_id } => {
                self.user_repository
                    .set_membership_by_customer_id(customer_id, event.grants_membership())
                    .await?
            }
        };

        if updated == 0 {
            warn!(kind = event.kind(), "entitlements: billing event matched no user");
        } else {
            info!(
                kind = event.kind(),
                is_member = event.grants_membership(),
                updated,
                "entitlements: billing event applied"
            );
        }

        Ok(updated)
    }

    async fn find_user(&self, email: &str) -> UseCaseResult<UserEntity> {
        self.user_repository
            .find_by_email(email)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("user {email}")))
    }
}

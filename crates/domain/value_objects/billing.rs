/// Trusted billing facts, already mapped from the payment provider's events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingEvent {
    /// Keyed by email: the external customer id is not on the user row yet.
    SubscriptionActivated {
        email: String,
        customer_id: Option<String>,
    },
    InvoicePaid {
        customer_id: String,
        subscription_id: Option<String>,
    },
    PaymentFailed {
        customer_id: String,
    },
    SubscriptionDeleted {
        customer_id: String,
    },
}

impl BillingEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            BillingEvent::SubscriptionActivated { .. } => "subscription_activated",
            BillingEvent::InvoicePaid { .. } => "invoice_paid",
            BillingEvent::PaymentFailed { .. } => "payment_failed",
            BillingEvent::SubscriptionDeleted { .. } => "subscription_deleted",
        }
    }

    /// Membership flag the event leaves the user with.
    pub fn grants_membership(&self) -> bool {
        matches!(
            self,
            BillingEvent::SubscriptionActivated { .. } | BillingEvent::InvoicePaid { .. }
        )
    }
}

use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::payment_records::InsertPaymentRecordEntity;

#[automock]
#[async_trait]
pub trait PaymentRecordRepository {
    /// Appends to the ledger. Returns `false` if the event id was already recorded.
    async fn record_payment(&self, record: InsertPaymentRecordEntity) -> Result<bool>;
}

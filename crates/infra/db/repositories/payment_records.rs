use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into};
use std::sync::Arc;

use crate::{
    domain::{
        entities::payment_records::InsertPaymentRecordEntity,
        repositories::payment_records::PaymentRecordRepository,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::payment_records},
};

pub struct PaymentRecordPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentRecordPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentRecordRepository for PaymentRecordPostgres {
    async fn record_payment(&self, record: InsertPaymentRecordEntity) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let inserted = insert_into(payment_records::table)
            .values(&record)
            .on_conflict(payment_records::event_id)
            .do_nothing()
            .execute(&mut conn)?;

        Ok(inserted > 0)
    }
}

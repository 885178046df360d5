use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infra::db::postgres::schema::payment_records;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable, PartialEq)]
#[diesel(table_name = payment_records)]
pub struct PaymentRecordEntity {
    pub id: i32,
    pub event_id: String,
    pub customer_id: String,
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, PartialEq)]
#[diesel(table_name = payment_records)]
pub struct InsertPaymentRecordEntity {
    /// Provider event id; replays of the same event collide on it.
    pub event_id: String,
    pub customer_id: String,
    pub session_id: Option<String>,
}

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infra::db::postgres::schema::users;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable, PartialEq)]
#[diesel(table_name = users)]
pub struct UserEntity {
    pub id: i32,
    pub email: String,
    pub user_name: String,
    pub credits: i32,
    pub is_member: bool,
    pub customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, PartialEq)]
#[diesel(table_name = users)]
pub struct InsertUserEntity {
    pub email: String,
    pub user_name: String,
    pub credits: i32,
    pub is_member: bool,
}

use anyhow::Result;
use async_trait::async_trait;
use diesel::{insert_into, prelude::*};
use std::sync::Arc;

use crate::{
    domain::{
        entities::users::{InsertUserEntity, UserEntity},
        repositories::users::UserRepository,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::users},
};

pub struct UserPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl UserPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserRepository for UserPostgres {
    async fn upsert_user(&self, user: InsertUserEntity) -> Result<UserEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let inserted = insert_into(users::table)
            .values(&user)
            .on_conflict(users::email)
            .do_nothing()
            .returning(UserEntity::as_returning())
            .get_result::<UserEntity>(&mut conn)
            .optional()?;

        if let Some(created) = inserted {
            return Ok(created);
        }

        let existing = users::table
            .filter(users::email.eq(&user.email))
            .select(UserEntity::as_select())
            .first::<UserEntity>(&mut conn)?;

        Ok(existing)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let user = users::table
            .filter(users::email.eq(email))
            .select(UserEntity::as_select())
            .first::<UserEntity>(&mut conn)
            .optional()?;

        Ok(user)
    }

    async fn consume_credit_if_available(&self, email: &str) -> Result<Option<i32>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Single conditional statement: the row lock serializes concurrent
        // consumers and the `credits > 0` guard is re-checked after the lock.
        let remaining = diesel::update(
            users::table
                .filter(users::email.eq(email))
                .filter(users::credits.gt(0)),
        )
        .set(users::credits.eq(users::credits - 1))
        .returning(users::credits)
        .get_result::<i32>(&mut conn)
        .optional()?;

        Ok(remaining)
    }

    async fn activate_membership_by_email(
        &self,
        email: &str,
        customer_id: Option<String>,
    ) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let target = users::table.filter(users::email.eq(email));

        let updated = match customer_id {
            Some(customer_id) => diesel::update(target)
                .set((
                    users::is_member.eq(true),
                    users::customer_id.eq(Some(customer_id)),
                ))
                .execute(&mut conn)?,
            None => diesel::update(target)
                .set(users::is_member.eq(true))
                .execute(&mut conn)?,
        };

        Ok(updated)
    }

    async fn set_membership_by_customer_id(
        &self,
        customer_id: &str,
        is_member: bool,
    ) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = diesel::update(users::table.filter(users::customer_id.eq(customer_id)))
            .set(users::is_member.eq(is_member))
            .execute(&mut conn)?;

        Ok(updated)
    }
}

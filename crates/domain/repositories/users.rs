use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::users::{InsertUserEntity, UserEntity};

#[automock]
#[async_trait]
pub trait UserRepository {
    /// Inserts the user if the email is unseen, otherwise returns the stored row untouched.
    async fn upsert_user(&self, user: InsertUserEntity) -> Result<UserEntity>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>>;

    /// Atomically decrements credits when they are positive. Returns the new
    /// balance, or `None` if the user has no credit left (or does not exist).
    async fn consume_credit_if_available(&self, email: &str) -> Result<Option<i32>>;

    async fn activate_membership_by_email(
        &self,
        email: &str,
        customer_id: Option<String>,
    ) -> Result<usize>;

    async fn set_membership_by_customer_id(
        &self,
        customer_id: &str,
        is_member: bool,
    ) -> Result<usize>;
}

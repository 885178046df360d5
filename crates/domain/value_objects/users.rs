use serde::Serialize;

use crate::domain::entities::users::UserEntity;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub email: String,
    pub user_name: String,
    pub credits: i32,
    pub is_member: bool,
}

impl From<UserEntity> for UserDto {
    fn from(entity: UserEntity) -> Self {
        Self {
            email: entity.email,
            user_name: entity.user_name,
            credits: entity.credits,
            is_member: entity.is_member,
        }
    }
}

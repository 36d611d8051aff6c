use kernel::model::{id::UserId, role::Role, user::UserProfile};
use serde::{Deserialize, Serialize};
use strum::VariantNames;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, VariantNames)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RoleName {
    Admin,
    User,
}

impl From<Role> for RoleName {
    fn from(value: Role) -> Self {
        match value {
            Role::Admin => Self::Admin,
            Role::User => Self::User,
        }
    }
}

impl From<RoleName> for Role {
    fn from(value: RoleName) -> Self {
        match value {
            RoleName::Admin => Self::Admin,
            RoleName::User => Self::User,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: UserId,
    pub email: String,
    pub display_name: String,
    pub role: RoleName,
}

impl From<UserProfile> for UserResponse {
    fn from(value: UserProfile) -> Self {
        let UserProfile {
            user_id,
            email,
            display_name,
            role,
        } = value;
        Self {
            user_id,
            email,
            display_name,
            role: RoleName::from(role),
        }
    }
}

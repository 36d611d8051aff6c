use crate::model::{id::UserId, role::Role};

pub mod event;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: UserId,
    pub email: String,
    pub display_name: String,
    pub role: Role,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

// プロフィールテーブルの内容そのもの。role は未設定の場合がある
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredProfile {
    pub user_id: UserId,
    pub email: String,
    pub display_name: String,
    pub role: Option<Role>,
}

impl From<StoredProfile> for UserProfile {
    fn from(value: StoredProfile) -> Self {
        let StoredProfile {
            user_id,
            email,
            display_name,
            role,
        } = value;
        Self {
            user_id,
            email,
            display_name,
            role: role.unwrap_or_default(),
        }
    }
}

use kernel::model::{id::UserId, role::Role, user::StoredProfile};
use shared::error::AppError;

#[derive(sqlx::FromRow)]
pub struct ProfileRow {
    pub user_id: UserId,
    pub email: String,
    pub display_name: String,
    pub role: Option<String>,
}

impl TryFrom<ProfileRow> for StoredProfile {
    type Error = AppError;

    fn try_from(value: ProfileRow) -> Result<Self, Self::Error> {
        let ProfileRow {
            user_id,
            email,
            display_name,
            role,
        } = value;
        let role = role
            .map(|r| {
                r.parse::<Role>()
                    .map_err(|_| AppError::ConversionEntityError(format!("unknown role: {r}")))
            })
            .transpose()?;
        Ok(StoredProfile {
            user_id,
            email,
            display_name,
            role,
        })
    }
}

// ログイン時のパスワード照合に使う
#[derive(sqlx::FromRow)]
pub struct UserCredentialRow {
    pub user_id: UserId,
    pub password_hash: String,
}

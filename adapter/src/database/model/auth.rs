use crate::redis::model::{RedisKey, RedisValue};
use kernel::model::{auth::AccessToken, id::UserId};
use shared::error::AppError;

// Redis 上のセッション: キーがアクセストークン、値がユーザー ID
pub struct AuthorizationKey(String);
pub struct AuthorizedUserId(UserId);

impl From<&AccessToken> for AuthorizationKey {
    fn from(value: &AccessToken) -> Self {
        Self(value.as_str().to_string())
    }
}

impl From<UserId> for AuthorizedUserId {
    fn from(value: UserId) -> Self {
        Self(value)
    }
}

impl AuthorizedUserId {
    pub fn into_inner(self) -> UserId {
        self.0
    }
}

impl RedisKey for AuthorizationKey {
    type Value = AuthorizedUserId;

    fn inner(&self) -> String {
        format!("session:{}", self.0)
    }
}

impl RedisValue for AuthorizedUserId {
    fn inner(&self) -> String {
        self.0.to_string()
    }
}

impl TryFrom<String> for AuthorizedUserId {
    type Error = AppError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Ok(Self(s.parse::<UserId>()?))
    }
}

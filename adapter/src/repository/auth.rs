use std::sync::Arc;

use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    auth::{event::CreateToken, AccessToken},
    id::UserId,
};
use kernel::repository::auth::AuthRepository;
use shared::error::{AppError, AppResult};

use crate::{
    database::{
        model::{
            auth::{AuthorizationKey, AuthorizedUserId},
            user::UserCredentialRow,
        },
        ConnectionPool,
    },
    redis::RedisClient,
    repository::user::verify_password,
};

#[derive(new)]
pub struct AuthRepositoryImpl {
    db: ConnectionPool,
    kv: Arc<RedisClient>,
    ttl: u64,
}

#[async_trait]
impl AuthRepository for AuthRepositoryImpl {
    async fn fetch_user_id_from_token(
        &self,
        access_token: &AccessToken,
    ) -> AppResult<Option<UserId>> {
        let key: AuthorizationKey = access_token.into();
        self.kv
            .get(&key)
            .await
            .map(|x| x.map(AuthorizedUserId::into_inner))
    }

    async fn verify_user(&self, email: &str, password: &str) -> AppResult<UserId> {
        let row: Option<UserCredentialRow> = sqlx::query_as(
            r#"
                SELECT user_id, password_hash
                FROM users
                WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        // メールアドレスが存在しない場合もパスワード誤りと同じエラーにする
        let Some(row) = row else {
            return Err(AppError::UnauthenticatedError);
        };

        if !verify_password(password, &row.password_hash).await? {
            return Err(AppError::UnauthenticatedError);
        }

        Ok(row.user_id)
    }

    async fn create_token(&self, event: CreateToken) -> AppResult<AccessToken> {
        let key: AuthorizationKey = (&event.access_token).into();
        let value: AuthorizedUserId = event.user_id.into();
        self.kv.set_ex(&key, &value, self.ttl).await?;
        Ok(event.access_token)
    }

    async fn delete_token(&self, access_token: AccessToken) -> AppResult<()> {
        let key: AuthorizationKey = (&access_token).into();
        self.kv.delete(&key).await
    }
}

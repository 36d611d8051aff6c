use crate::database::{model::user::ProfileRow, ConnectionPool};
use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    id::UserId,
    user::{event::CreateUser, StoredProfile, UserProfile},
};
use kernel::repository::user::UserRepository;
use shared::error::{AppError, AppResult};

#[derive(new)]
pub struct UserRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    // 認証用の users とプロフィールを同一トランザクションで登録する
    // どちらかが失敗した場合はどちらも残らない
    async fn create(&self, event: CreateUser) -> AppResult<UserProfile> {
        let user_id = UserId::new();
        let password_hash = hash_password(&event.password).await?;

        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
                INSERT INTO users (user_id, email, password_hash)
                VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(&event.email)
        .bind(password_hash)
        .execute(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::UnprocessableEntity(format!("{} is already registered", event.email))
            }
            _ => AppError::SpecificOperationError(e),
        })?;

        let res = sqlx::query(
            r#"
                INSERT INTO profiles (user_id, email, display_name, role)
                VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_id)
        .bind(&event.email)
        .bind(&event.display_name)
        .bind(event.role.as_ref())
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No profile record has been created".into(),
            ));
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(UserProfile {
            user_id,
            email: event.email,
            display_name: event.display_name,
            role: event.role,
        })
    }

    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<StoredProfile>> {
        let row: Option<ProfileRow> = sqlx::query_as(
            r#"
                SELECT user_id, email, display_name, role
                FROM profiles
                WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        row.map(StoredProfile::try_from).transpose()
    }
}

// bcrypt は CPU を占有するのでブロッキング用のスレッドで実行する
async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AppError::Unexpected(e.into()))?
        .map_err(AppError::from)
}

pub(crate) async fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let (password, hash) = (password.to_owned(), hash.to_owned());
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Unexpected(e.into()))?
        .map_err(AppError::from)
}

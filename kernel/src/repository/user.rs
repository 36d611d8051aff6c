use crate::model::{
    id::UserId,
    user::{event::CreateUser, StoredProfile, UserProfile},
};
use async_trait::async_trait;
use mockall::automock;
use shared::error::AppResult;

#[automock]
#[async_trait]
pub trait UserRepository: Send + Sync {
    // 認証用の ID とプロフィールを登録する
    async fn create(&self, event: CreateUser) -> AppResult<UserProfile>;
    // ユーザー ID に紐づくプロフィールを取得する
    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<StoredProfile>>;
}

use crate::{
    model::{id::UserId, user::UserProfile},
    repository::user::UserRepository,
};
use shared::error::{AppError, AppResult};
use std::sync::Arc;

/// Maps an authenticated identity to its profile and role.
#[derive(Clone)]
pub struct ProfileResolver {
    repository: Arc<dyn UserRepository>,
}

impl ProfileResolver {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    // プロフィールが存在しなければ NotFound、role が未設定なら user とする
    pub async fn resolve(&self, user_id: UserId) -> AppResult<UserProfile> {
        self.repository
            .find_profile(user_id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| {
                AppError::EntityNotFound(format!("profile of user ({user_id}) was not found"))
            })
    }
}

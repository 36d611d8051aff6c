use crate::{
    model::{
        auth::{event::CreateToken, AccessToken, AuthStateChanged},
        user::{event::CreateUser, UserProfile},
    },
    notifier::Subscription,
    repository::{auth::AuthRepository, user::UserRepository},
    service::profile::ProfileResolver,
};
use shared::error::{AppError, AppResult};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

const AUTH_FEED_CAPACITY: usize = 16;

/// Registration, login, logout and session restore.
#[derive(Clone)]
pub struct SessionService {
    auth: Arc<dyn AuthRepository>,
    users: Arc<dyn UserRepository>,
    profiles: ProfileResolver,
    events: broadcast::Sender<AuthStateChanged>,
}

impl SessionService {
    pub fn new(
        auth: Arc<dyn AuthRepository>,
        users: Arc<dyn UserRepository>,
        profiles: ProfileResolver,
    ) -> Self {
        let (events, _) = broadcast::channel(AUTH_FEED_CAPACITY);
        Self {
            auth,
            users,
            profiles,
            events,
        }
    }

    // ID とプロフィールを登録する。ログインはしない
    pub async fn register(&self, event: CreateUser) -> AppResult<UserProfile> {
        let profile = self.users.create(event).await?;
        tracing::info!(user.id = %profile.user_id, user.role = %profile.role, "user registered");
        Ok(profile)
    }

    pub async fn login(&self, email: &str, password: &str) -> AppResult<(AccessToken, UserProfile)> {
        let user_id = self.auth.verify_user(email, password).await?;
        let profile = self.profiles.resolve(user_id).await?;
        let access_token = self.auth.create_token(CreateToken::new(user_id)).await?;

        self.publish(AuthStateChanged::SignedIn(user_id));
        Ok((access_token, profile))
    }

    pub async fn logout(&self, access_token: AccessToken) -> AppResult<()> {
        let user_id = self.auth.fetch_user_id_from_token(&access_token).await?;
        self.auth.delete_token(access_token).await?;

        if let Some(user_id) = user_id {
            self.publish(AuthStateChanged::SignedOut(user_id));
        }
        Ok(())
    }

    /// Profile behind `access_token`, or `None` when the session is gone.
    pub async fn restore(&self, access_token: Option<&AccessToken>) -> AppResult<Option<UserProfile>> {
        let Some(access_token) = access_token else {
            return Ok(None);
        };
        match self.auth.fetch_user_id_from_token(access_token).await? {
            Some(user_id) => self.profiles.resolve(user_id).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn authenticate(&self, access_token: &AccessToken) -> AppResult<UserProfile> {
        self.restore(Some(access_token))
            .await?
            .ok_or(AppError::UnauthenticatedError)
    }

    /// Forwards the resolved profile on sign-in and `None` on sign-out.
    pub fn on_auth_state_change<F>(&self, handler: F) -> Subscription
    where
        F: Fn(Option<UserProfile>) + Send + Sync + 'static,
    {
        let mut rx = self.events.subscribe();
        let profiles = self.profiles.clone();

        let handle = tokio::spawn(async move {
            loop {
                let change = match rx.recv().await {
                    Ok(change) => change,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "auth feed lagged behind");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                match change {
                    AuthStateChanged::SignedIn(user_id) => match profiles.resolve(user_id).await {
                        Ok(profile) => handler(Some(profile)),
                        Err(e) => {
                            tracing::warn!(error.message = %e, user.id = %user_id, "could not resolve signed-in profile");
                            handler(None)
                        }
                    },
                    AuthStateChanged::SignedOut(_) => handler(None),
                }
            }
        });

        Subscription::new(handle)
    }

    fn publish(&self, change: AuthStateChanged) {
        if self.events.send(change).is_err() {
            tracing::debug!(?change, "auth state change dropped: no subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{id::UserId, role::Role, user::StoredProfile},
        repository::{auth::MockAuthRepository, user::MockUserRepository},
    };
    use std::time::Duration;
    use tokio::{sync::mpsc, time::timeout};

    fn profile_repo() -> MockUserRepository {
        let mut users = MockUserRepository::new();
        users.expect_find_profile().returning(|id| {
            Ok(Some(StoredProfile {
                user_id: id,
                email: "yui@example.com".into(),
                display_name: "Yui".into(),
                role: Some(Role::Admin),
            }))
        });
        users
    }

    fn service(auth: MockAuthRepository, users: MockUserRepository) -> SessionService {
        let users: Arc<dyn UserRepository> = Arc::new(users);
        SessionService::new(Arc::new(auth), users.clone(), ProfileResolver::new(users))
    }

    #[tokio::test]
    async fn login_issues_token_and_resolves_profile() {
        let user_id = UserId::new();
        let mut auth = MockAuthRepository::new();
        auth.expect_verify_user()
            .withf(|email, password| email == "yui@example.com" && password == "secret1")
            .returning(move |_, _| Ok(user_id));
        auth.expect_create_token()
            .returning(|event| Ok(event.access_token));

        let (token, profile) = service(auth, profile_repo())
            .login("yui@example.com", "secret1")
            .await
            .unwrap();
        assert!(!token.as_str().is_empty());
        assert_eq!(profile.user_id, user_id);
        assert_eq!(profile.role, Role::Admin);
    }

    #[tokio::test]
    async fn restore_without_token_is_anonymous() {
        let svc = service(MockAuthRepository::new(), MockUserRepository::new());
        assert_eq!(svc.restore(None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_token_fails_authentication() {
        let mut auth = MockAuthRepository::new();
        auth.expect_fetch_user_id_from_token().returning(|_| Ok(None));

        let err = service(auth, MockUserRepository::new())
            .authenticate(&AccessToken("gone".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnauthenticatedError));
    }

    #[tokio::test]
    async fn auth_feed_forwards_profile_then_none() {
        let user_id = UserId::new();
        let mut auth = MockAuthRepository::new();
        auth.expect_verify_user().returning(move |_, _| Ok(user_id));
        auth.expect_create_token().returning(|event| Ok(event.access_token));
        auth.expect_fetch_user_id_from_token()
            .returning(move |_| Ok(Some(user_id)));
        auth.expect_delete_token().returning(|_| Ok(()));

        let svc = service(auth, profile_repo());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _subscription = svc.on_auth_state_change(move |profile| {
            let _ = tx.send(profile);
        });

        let (token, _) = svc.login("yui@example.com", "secret1").await.unwrap();
        svc.logout(token).await.unwrap();

        let signed_in = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        let signed_out = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        assert_eq!(signed_in.map(|p| p.user_id), Some(user_id));
        assert_eq!(signed_out, None);
    }
}

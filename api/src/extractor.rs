use async_trait::async_trait;
use axum::{
    extract::{FromRequest, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    extract::CookieJar,
    headers::{authorization::Bearer, Authorization, HeaderMapExt},
};
use kernel::{
    model::{auth::AccessToken, id::UserId, user::UserProfile},
    service::session::SessionService,
};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};
use std::convert::Infallible;

// ログイン時にセッショントークンを保存するクッキー名
pub const SESSION_COOKIE: &str = "secret";

pub struct AuthorizedUser {
    pub access_token: AccessToken,
    pub profile: UserProfile,
}

impl AuthorizedUser {
    pub fn id(&self) -> UserId {
        self.profile.user_id
    }

    pub fn is_admin(&self) -> bool {
        self.profile.is_admin()
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::ForbiddenOperation)
        }
    }
}

#[async_trait]
impl FromRequestParts<AppRegistry> for AuthorizedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        registry: &AppRegistry,
    ) -> Result<Self, Self::Rejection> {
        let access_token = session_token(parts).ok_or(AppError::UnauthorizedError)?;
        authorize(registry.session_service(), access_token).await
    }
}

// プロフィールが消えたセッションは未認証として扱う
async fn authorize(
    sessions: &SessionService,
    access_token: AccessToken,
) -> AppResult<AuthorizedUser> {
    let profile = sessions
        .authenticate(&access_token)
        .await
        .map_err(|e| match e {
            AppError::EntityNotFound(_) => AppError::UnauthenticatedError,
            e => e,
        })?;

    Ok(AuthorizedUser {
        access_token,
        profile,
    })
}

/// JSON body whose rejection renders as [`AppError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct PathParam<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);

/// Session token if the request carries one; never rejects.
pub struct SessionToken(pub Option<AccessToken>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionToken {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_token(parts)))
    }
}

// クッキーを優先し、なければ Authorization: Bearer ヘッダーを見る
fn session_token(parts: &Parts) -> Option<AccessToken> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(AccessToken(cookie.value().to_string()));
    }
    parts
        .headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| AccessToken(auth.token().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, Request};
    use kernel::{
        model::{role::Role, user::StoredProfile},
        repository::{
            auth::MockAuthRepository,
            user::{MockUserRepository, UserRepository},
        },
        service::profile::ProfileResolver,
    };
    use std::sync::Arc;

    fn parts(name: header::HeaderName, value: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header(name, value)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn reads_token_from_secret_cookie() {
        let parts = parts(header::COOKIE, "theme=dark; secret=abc123");
        assert_eq!(session_token(&parts), Some(AccessToken("abc123".into())));
    }

    #[test]
    fn falls_back_to_bearer_header() {
        let parts = parts(header::AUTHORIZATION, "Bearer xyz789");
        assert_eq!(session_token(&parts), Some(AccessToken("xyz789".into())));
    }

    #[test]
    fn anonymous_request_has_no_token() {
        let parts = parts(header::ACCEPT, "application/json");
        assert_eq!(session_token(&parts), None);
    }

    fn user(role: Role) -> AuthorizedUser {
        AuthorizedUser {
            access_token: AccessToken("token".into()),
            profile: UserProfile {
                user_id: UserId::new(),
                email: "sora@example.com".into(),
                display_name: "Sora".into(),
                role,
            },
        }
    }

    #[test]
    fn only_admin_passes_admin_gate() {
        assert!(user(Role::Admin).require_admin().is_ok());
        assert!(matches!(
            user(Role::User).require_admin(),
            Err(AppError::ForbiddenOperation)
        ));
    }

    fn sessions(profile: Option<StoredProfile>) -> SessionService {
        let user_id = UserId::new();
        let mut auth = MockAuthRepository::new();
        auth.expect_fetch_user_id_from_token()
            .returning(move |_| Ok(Some(user_id)));
        let mut users = MockUserRepository::new();
        users
            .expect_find_profile()
            .returning(move |id| Ok(profile.clone().map(|p| StoredProfile { user_id: id, ..p })));
        let users: Arc<dyn UserRepository> = Arc::new(users);
        SessionService::new(Arc::new(auth), users.clone(), ProfileResolver::new(users))
    }

    #[tokio::test]
    async fn session_without_profile_is_unauthenticated() {
        let result = authorize(&sessions(None), AccessToken("token".into())).await;
        assert!(matches!(result, Err(AppError::UnauthenticatedError)));
    }

    #[tokio::test]
    async fn session_with_profile_is_authorized() {
        let stored = StoredProfile {
            user_id: UserId::new(),
            email: "sora@example.com".into(),
            display_name: "Sora".into(),
            role: None,
        };
        let user = authorize(&sessions(Some(stored)), AccessToken("token".into()))
            .await
            .unwrap();
        assert_eq!(user.profile.display_name, "Sora");
        assert!(!user.is_admin());
    }
}

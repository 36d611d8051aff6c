use crate::{
    extractor::{JsonBody, SessionToken, SESSION_COOKIE},
    model::{
        auth::{LoginRequest, RegisterRequest},
        user::UserResponse,
    },
};
use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use garde::Validate;
use registry::AppRegistry;
use shared::error::AppResult;

pub async fn register(
    State(registry): State<AppRegistry>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    req.validate(&())?;

    let profile = registry.session_service().register(req.into()).await?;
    Ok((StatusCode::CREATED, Json(profile.into())))
}

pub async fn login(
    State(registry): State<AppRegistry>,
    jar: CookieJar,
    JsonBody(req): JsonBody<LoginRequest>,
) -> AppResult<(CookieJar, Json<UserResponse>)> {
    req.validate(&())?;

    let (access_token, profile) = registry
        .session_service()
        .login(&req.email, &req.password)
        .await?;

    let cookie = Cookie::build((SESSION_COOKIE, access_token.0))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    Ok((jar.add(cookie), Json(profile.into())))
}

pub async fn logout(
    State(registry): State<AppRegistry>,
    SessionToken(access_token): SessionToken,
    jar: CookieJar,
) -> AppResult<(CookieJar, StatusCode)> {
    if let Some(access_token) = access_token {
        registry.session_service().logout(access_token).await?;
    }
    // トークンの有無にかかわらずクッキーは失効させる
    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/"));
    Ok((jar, StatusCode::NO_CONTENT))
}

pub async fn restore_session(
    State(registry): State<AppRegistry>,
    SessionToken(access_token): SessionToken,
) -> AppResult<Json<Option<UserResponse>>> {
    registry
        .session_service()
        .restore(access_token.as_ref())
        .await
        .map(|profile| Json(profile.map(UserResponse::from)))
}

use crate::handler::auth::{login, logout, register, restore_session};
use axum::{
    routing::{get, post},
    Router,
};
use registry::AppRegistry;

pub fn build_auth_routers() -> Router<AppRegistry> {
    let auth_routers = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(restore_session));

    Router::new().nest("/auth", auth_routers)
}

use crate::handler::user::get_current_user;
use axum::{routing::get, Router};
use registry::AppRegistry;

pub fn build_user_router() -> Router<AppRegistry> {
    Router::new().route("/users/me", get(get_current_user))
}

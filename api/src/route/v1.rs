use super::{
    auth::build_auth_routers, booking::build_booking_routers, calendar::build_calendar_routers,
    health::build_health_check_routers, user::build_user_router,
};
use axum::Router;
use registry::AppRegistry;

pub fn routes() -> Router<AppRegistry> {
    let router = Router::new()
        .merge(build_health_check_routers())
        .merge(build_auth_routers())
        .merge(build_booking_routers())
        .merge(build_calendar_routers())
        .merge(build_user_router());
    Router::new().nest("/api/v1", router)
}

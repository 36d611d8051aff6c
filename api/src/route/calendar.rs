use crate::handler::calendar::show_day_slots;
use axum::{routing::get, Router};
use registry::AppRegistry;

pub fn build_calendar_routers() -> Router<AppRegistry> {
    let calendar_routers = Router::new().route("/:date/slots", get(show_day_slots));

    Router::new().nest("/calendar", calendar_routers)
}

use crate::handler::booking::{
    create_booking, delete_booking, show_booking, show_booking_list, show_bookings_in_range,
    show_my_bookings, stream_bookings, update_booking, update_booking_status,
};
use axum::{
    routing::{get, put},
    Router,
};
use registry::AppRegistry;

pub fn build_booking_routers() -> Router<AppRegistry> {
    let bookings_routers = Router::new()
        .route("/", get(show_booking_list).post(create_booking))
        .route("/me", get(show_my_bookings))
        .route("/range", get(show_bookings_in_range))
        .route("/stream", get(stream_bookings))
        .route(
            "/:booking_id",
            get(show_booking).put(update_booking).delete(delete_booking),
        )
        .route("/:booking_id/status", put(update_booking_status));

    Router::new().nest("/bookings", bookings_routers)
}

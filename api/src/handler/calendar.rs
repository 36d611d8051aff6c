use crate::{
    extractor::{AuthorizedUser, PathParam, QueryParams},
    model::calendar::{CalendarDayResponse, SlotsQuery},
};
use axum::{extract::State, Json};
use chrono::NaiveDate;
use kernel::model::booking::{slot::CalendarDay, BookingRange};
use registry::AppRegistry;
use shared::error::AppResult;

pub async fn show_day_slots(
    _user: AuthorizedUser,
    PathParam(date): PathParam<NaiveDate>,
    QueryParams(query): QueryParams<SlotsQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<CalendarDayResponse>> {
    let offset = registry.studio_offset();
    let studio = registry.studio_config();
    let hours = (studio.open_hour, studio.close_hour);
    let board = registry.booking_board();

    // ボードが購読中ならその内容を、そうでなければストアから直接読む
    let day = if board.is_live() {
        CalendarDay::build(date, offset, hours, &board.snapshot(), query.exclude)
    } else {
        tracing::debug!(%date, "booking board is not live; reading the store");
        let bookings = registry
            .booking_service()
            .list_by_range(BookingRange::for_day(date, offset)?)
            .await?;
        CalendarDay::build(date, offset, hours, &bookings, query.exclude)
    };

    Ok(Json(day.into()))
}

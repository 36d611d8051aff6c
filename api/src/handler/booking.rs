use crate::{
    extractor::{AuthorizedUser, JsonBody, PathParam, QueryParams},
    model::booking::{
        BookingFilter, BookingListQuery, BookingRangeQuery, BookingResponse, BookingsResponse,
        CreateBookingRequest, CreateBookingRequestWithUser, UpdateBookingRequest,
        UpdateBookingRequestWithId, UpdateBookingStatusRequest,
    },
};
use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chrono::Utc;
use futures::Stream;
use garde::Validate;
use kernel::model::{
    booking::{Booking, BookingRange, BookingStatus},
    id::BookingId,
};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};
use tokio::sync::mpsc;

pub async fn show_booking_list(
    _user: AuthorizedUser,
    QueryParams(query): QueryParams<BookingListQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<BookingsResponse>> {
    let service = registry.booking_service();
    let bookings = match query.status {
        None => service.list_all().await?,
        Some(BookingFilter::Today) => {
            service
                .list_today(Utc::now(), registry.studio_offset())
                .await?
        }
        Some(BookingFilter::Pending) => service.list_by_status(BookingStatus::Pending).await?,
        Some(BookingFilter::Approved) => service.list_by_status(BookingStatus::Approved).await?,
        Some(BookingFilter::Rejected) => service.list_by_status(BookingStatus::Rejected).await?,
    };

    Ok(Json(bookings.into()))
}

pub async fn show_my_bookings(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<BookingsResponse>> {
    registry
        .booking_service()
        .list_by_user(user.id())
        .await
        .map(BookingsResponse::from)
        .map(Json)
}

pub async fn show_bookings_in_range(
    _user: AuthorizedUser,
    QueryParams(query): QueryParams<BookingRangeQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<BookingsResponse>> {
    let range = BookingRange::new(query.from, query.to)?;

    registry
        .booking_service()
        .list_by_range(range)
        .await
        .map(BookingsResponse::from)
        .map(Json)
}

pub async fn show_booking(
    _user: AuthorizedUser,
    PathParam(booking_id): PathParam<BookingId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<BookingResponse>> {
    registry
        .booking_service()
        .get(booking_id)
        .await
        .map(BookingResponse::from)
        .map(Json)
}

pub async fn create_booking(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
    JsonBody(req): JsonBody<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<BookingResponse>)> {
    req.validate(&())?;

    if let Some(status) = req.status.as_deref() {
        tracing::debug!(requested.status = status, "ignoring status on new booking");
    }

    let event = CreateBookingRequestWithUser::new(
        user.id(),
        user.profile.display_name.clone(),
        req,
    );
    let booking = registry.booking_service().create(event.into()).await?;

    Ok((StatusCode::CREATED, Json(booking.into())))
}

pub async fn update_booking(
    user: AuthorizedUser,
    PathParam(booking_id): PathParam<BookingId>,
    State(registry): State<AppRegistry>,
    JsonBody(req): JsonBody<UpdateBookingRequest>,
) -> AppResult<Json<BookingResponse>> {
    req.validate(&())?;

    let service = registry.booking_service();
    ensure_editable(&user, &service.get(booking_id).await?)?;

    service
        .edit(UpdateBookingRequestWithId::new(booking_id, req).into())
        .await
        .map(BookingResponse::from)
        .map(Json)
}

pub async fn delete_booking(
    user: AuthorizedUser,
    PathParam(booking_id): PathParam<BookingId>,
    State(registry): State<AppRegistry>,
) -> AppResult<StatusCode> {
    let service = registry.booking_service();
    ensure_editable(&user, &service.get(booking_id).await?)?;

    service
        .delete(booking_id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
}

pub async fn update_booking_status(
    user: AuthorizedUser,
    PathParam(booking_id): PathParam<BookingId>,
    State(registry): State<AppRegistry>,
    JsonBody(req): JsonBody<UpdateBookingStatusRequest>,
) -> AppResult<Json<BookingResponse>> {
    user.require_admin()?;

    registry
        .booking_service()
        .set_status(booking_id, req.status.into())
        .await
        .map(BookingResponse::from)
        .map(Json)
}

/// Streams the full booking list on connect and after every change.
pub async fn stream_bookings(
    _user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let (tx, rx) = mpsc::unbounded_channel::<Vec<Booking>>();

    // 先に購読してから初回分を送るので、その間の変更も取りこぼさない
    let refresh = tx.clone();
    let subscription = registry.booking_notifier().subscribe(move |bookings| {
        let _ = refresh.send(bookings);
    });
    let initial = registry.booking_service().list_all().await?;
    let _ = tx.send(initial);
    drop(tx);

    // クライアントが切断するとストリームと一緒に購読も破棄される
    let stream = futures::stream::unfold((rx, subscription), |(mut rx, subscription)| async move {
        let bookings = rx.recv().await?;
        let event = Event::default()
            .event("bookings")
            .json_data(BookingsResponse::from(bookings));
        Some((event, (rx, subscription)))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

// 利用者本人の保留中の予約だけを編集・削除できる
fn ensure_editable(user: &AuthorizedUser, booking: &Booking) -> AppResult<()> {
    if !booking.is_owned_by(user.id()) {
        return Err(AppError::ForbiddenOperation);
    }
    if !booking.is_pending() {
        return Err(AppError::UnprocessableEntity(format!(
            "booking ({}) is {} and can no longer be changed",
            booking.id, booking.status
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::model::{auth::AccessToken, id::UserId, role::Role, user::UserProfile};

    fn caller() -> AuthorizedUser {
        AuthorizedUser {
            access_token: AccessToken("token".into()),
            profile: UserProfile {
                user_id: UserId::new(),
                email: "aoi@example.com".into(),
                display_name: "Aoi".into(),
                role: Role::User,
            },
        }
    }

    fn booking(owner: UserId, status: BookingStatus) -> Booking {
        Booking {
            id: BookingId::new(),
            user_id: owner,
            user_name: "Aoi".into(),
            start_time: "2026-01-08T10:00:00Z".parse().unwrap(),
            end_time: "2026-01-08T12:00:00Z".parse().unwrap(),
            status,
            reason: "Band Practice".into(),
            created_at: "2026-01-01T09:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn owner_may_change_pending_booking() {
        let user = caller();
        assert!(ensure_editable(&user, &booking(user.id(), BookingStatus::Pending)).is_ok());
    }

    #[test]
    fn other_users_booking_is_forbidden() {
        let user = caller();
        let err = ensure_editable(&user, &booking(UserId::new(), BookingStatus::Pending))
            .unwrap_err();
        assert!(matches!(err, AppError::ForbiddenOperation));
    }

    #[test]
    fn decided_booking_is_locked_for_owner() {
        let user = caller();
        for status in [BookingStatus::Approved, BookingStatus::Rejected] {
            let err = ensure_editable(&user, &booking(user.id(), status)).unwrap_err();
            assert!(matches!(err, AppError::UnprocessableEntity(_)));
        }
    }
}

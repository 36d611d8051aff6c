use crate::{
    model::{
        booking::{
            event::{CreateBooking, DeleteBooking, UpdateBooking, UpdateBookingStatus},
            Booking, BookingOrder, BookingRange, BookingStatus,
        },
        id::{BookingId, UserId},
    },
    repository::booking::BookingRepository,
};
use chrono::{DateTime, FixedOffset, Utc};
use shared::error::{AppError, AppResult};
use std::sync::Arc;

/// Booking workflow on top of the store.
///
/// Ownership, the pending-only rule for edits and deletes, and the admin-only
/// rule for status changes belong to the caller. Overlapping bookings are
/// accepted: slot occupancy is advisory.
#[derive(Clone)]
pub struct BookingService {
    repository: Arc<dyn BookingRepository>,
}

impl BookingService {
    pub fn new(repository: Arc<dyn BookingRepository>) -> Self {
        Self { repository }
    }

    pub async fn create(&self, event: CreateBooking) -> AppResult<Booking> {
        validate_window(event.start_time, event.end_time)?;

        let booking = self.repository.create(event).await?;
        tracing::info!(
            booking.id = %booking.id,
            booking.user_id = %booking.user_id,
            "booking requested"
        );
        Ok(booking)
    }

    pub async fn edit(&self, event: UpdateBooking) -> AppResult<Booking> {
        if event.is_empty() {
            return self.get(event.booking_id).await;
        }

        if event.start_time.is_some() || event.end_time.is_some() {
            let current = self.get(event.booking_id).await?;
            validate_window(
                event.start_time.unwrap_or(current.start_time),
                event.end_time.unwrap_or(current.end_time),
            )?;
        }

        self.repository.update(event).await
    }

    pub async fn delete(&self, booking_id: BookingId) -> AppResult<()> {
        self.repository
            .delete(DeleteBooking::new(booking_id))
            .await?;
        tracing::info!(booking.id = %booking_id, "booking deleted");
        Ok(())
    }

    // どのステータスからどのステータスへの変更も受け付ける
    pub async fn set_status(
        &self,
        booking_id: BookingId,
        status: BookingStatus,
    ) -> AppResult<Booking> {
        let booking = self
            .repository
            .update_status(UpdateBookingStatus::new(booking_id, status))
            .await?;
        tracing::info!(booking.id = %booking_id, booking.status = %status, "booking status set");
        Ok(booking)
    }

    pub async fn get(&self, booking_id: BookingId) -> AppResult<Booking> {
        self.repository
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::EntityNotFound(format!("booking ({booking_id}) was not found")))
    }

    pub async fn list_all(&self) -> AppResult<Vec<Booking>> {
        self.repository.find_all(BookingOrder::CreatedAtDesc).await
    }

    pub async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<Booking>> {
        self.repository
            .find_by_user_id(user_id, BookingOrder::CreatedAtDesc)
            .await
    }

    pub async fn list_by_status(&self, status: BookingStatus) -> AppResult<Vec<Booking>> {
        self.repository
            .find_by_status(status, BookingOrder::CreatedAtDesc)
            .await
    }

    pub async fn list_by_range(&self, range: BookingRange) -> AppResult<Vec<Booking>> {
        self.repository
            .find_by_range(range, BookingOrder::StartTimeAsc)
            .await
    }

    /// Bookings starting on the studio-local date of `now`.
    pub async fn list_today(
        &self,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> AppResult<Vec<Booking>> {
        let today = now.with_timezone(&offset).date_naive();
        self.list_by_range(BookingRange::for_day(today, offset)?)
            .await
    }
}

fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<()> {
    if end <= start {
        return Err(AppError::InvalidInput(format!(
            "end time ({end}) must be after start time ({start})"
        )));
    }
    Ok(())
}

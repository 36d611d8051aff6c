use kernel::model::{
    booking::{Booking, BookingStatus},
    id::{BookingId, UserId},
};
use shared::error::AppError;
use sqlx::types::chrono::{DateTime, Utc};

// bookings テーブルの 1 行。status はテキストで保存されている
#[derive(sqlx::FromRow)]
pub struct BookingRow {
    pub booking_id: BookingId,
    pub user_id: UserId,
    pub user_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = AppError;

    fn try_from(value: BookingRow) -> Result<Self, Self::Error> {
        let BookingRow {
            booking_id,
            user_id,
            user_name,
            start_time,
            end_time,
            status,
            reason,
            created_at,
        } = value;
        let status = status.parse::<BookingStatus>().map_err(|_| {
            AppError::ConversionEntityError(format!(
                "booking ({booking_id}) has an unknown status: {status}"
            ))
        })?;
        Ok(Booking {
            id: booking_id,
            user_id,
            user_name,
            start_time,
            end_time,
            status,
            reason,
            created_at,
        })
    }
}

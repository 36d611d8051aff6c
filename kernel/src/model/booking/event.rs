use crate::model::{
    booking::BookingStatus,
    id::{BookingId, UserId},
};
use chrono::{DateTime, Utc};
use derive_new::new;

// 新規予約にはステータスを持たせない。保存時に必ず pending となる
#[derive(new, Debug, Clone)]
pub struct CreateBooking {
    pub user_id: UserId,
    pub user_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub reason: String,
}

#[derive(new, Debug, Clone)]
pub struct UpdateBooking {
    pub booking_id: BookingId,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}

impl UpdateBooking {
    pub fn is_empty(&self) -> bool {
        self.start_time.is_none() && self.end_time.is_none() && self.reason.is_none()
    }
}

#[derive(new, Debug, Clone, Copy)]
pub struct UpdateBookingStatus {
    pub booking_id: BookingId,
    pub status: BookingStatus,
}

#[derive(new, Debug, Clone, Copy)]
pub struct DeleteBooking {
    pub booking_id: BookingId,
}

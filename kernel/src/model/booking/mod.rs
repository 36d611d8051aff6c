use crate::model::id::{BookingId, UserId};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult};
use strum::{AsRefStr, Display, EnumString};

pub mod event;
pub mod slot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub user_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// 保留中の予約だけが利用者本人による編集・削除の対象になる
    pub fn is_pending(&self) -> bool {
        self.status == BookingStatus::Pending
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
}

impl BookingStatus {
    // 却下された予約は枠を占有しない
    pub fn occupies_slot(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Approved)
    }
}

/// Sort order requested by the caller of a listing query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookingOrder {
    #[default]
    CreatedAtDesc,
    StartTimeAsc,
}

/// Half-open interval `[from, to)` over booking start times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl BookingRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> AppResult<Self> {
        if to <= from {
            return Err(AppError::InvalidInput(format!(
                "range end ({to}) must be after range start ({from})"
            )));
        }
        Ok(Self { from, to })
    }

    /// The whole calendar day `date` as seen from the studio time zone.
    pub fn for_day(date: NaiveDate, offset: FixedOffset) -> AppResult<Self> {
        let start = date
            .and_hms_opt(0, 0, 0)
            .and_then(|t| offset.from_local_datetime(&t).single())
            .ok_or_else(|| AppError::InvalidInput(format!("invalid date: {date}")))?;
        let from = start.with_timezone(&Utc);
        Self::new(from, from + chrono::Duration::days(1))
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at < self.to
    }
}

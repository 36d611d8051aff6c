use chrono::{DateTime, Utc};
use derive_new::new;
use garde::Validate;
use kernel::model::{
    booking::{
        event::{CreateBooking, UpdateBooking},
        Booking, BookingStatus,
    },
    id::{BookingId, UserId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatusName {
    Pending,
    Approved,
    Rejected,
}

impl From<BookingStatus> for BookingStatusName {
    fn from(value: BookingStatus) -> Self {
        match value {
            BookingStatus::Pending => Self::Pending,
            BookingStatus::Approved => Self::Approved,
            BookingStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<BookingStatusName> for BookingStatus {
    fn from(value: BookingStatusName) -> Self {
        match value {
            BookingStatusName::Pending => Self::Pending,
            BookingStatusName::Approved => Self::Approved,
            BookingStatusName::Rejected => Self::Rejected,
        }
    }
}

// 一覧の絞り込み。today は保存されるステータスではなく、当日開始の予約を表す
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingFilter {
    Pending,
    Approved,
    Rejected,
    Today,
}

#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    #[serde(default)]
    pub status: Option<BookingFilter>,
}

#[derive(Debug, Deserialize)]
pub struct BookingRangeQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[garde(skip)]
    pub start_time: DateTime<Utc>,
    #[garde(skip)]
    pub end_time: DateTime<Utc>,
    #[garde(length(max = 500))]
    #[serde(default)]
    pub reason: String,
    // 受け付けるが使わない。新規予約は常に pending
    #[garde(skip)]
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(new)]
pub struct CreateBookingRequestWithUser(UserId, String, CreateBookingRequest);

impl From<CreateBookingRequestWithUser> for CreateBooking {
    fn from(value: CreateBookingRequestWithUser) -> Self {
        let CreateBookingRequestWithUser(
            user_id,
            user_name,
            CreateBookingRequest {
                start_time,
                end_time,
                reason,
                ..
            },
        ) = value;
        CreateBooking::new(user_id, user_name, start_time, end_time, reason)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingRequest {
    #[garde(skip)]
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[garde(skip)]
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[garde(length(max = 500))]
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(new)]
pub struct UpdateBookingRequestWithId(BookingId, UpdateBookingRequest);

impl From<UpdateBookingRequestWithId> for UpdateBooking {
    fn from(value: UpdateBookingRequestWithId) -> Self {
        let UpdateBookingRequestWithId(
            booking_id,
            UpdateBookingRequest {
                start_time,
                end_time,
                reason,
            },
        ) = value;
        UpdateBooking::new(booking_id, start_time, end_time, reason)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingStatusRequest {
    pub status: BookingStatusName,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: BookingId,
    pub user_id: UserId,
    pub user_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatusName,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(value: Booking) -> Self {
        let Booking {
            id,
            user_id,
            user_name,
            start_time,
            end_time,
            status,
            reason,
            created_at,
        } = value;
        Self {
            id,
            user_id,
            user_name,
            start_time,
            end_time,
            status: status.into(),
            reason,
            created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingsResponse {
    pub items: Vec<BookingResponse>,
}

impl From<Vec<Booking>> for BookingsResponse {
    fn from(value: Vec<Booking>) -> Self {
        Self {
            items: value.into_iter().map(BookingResponse::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_request_ignores_supplied_status() {
        let req: CreateBookingRequest = serde_json::from_value(json!({
            "startTime": "2026-01-08T10:00:00Z",
            "endTime": "2026-01-08T12:00:00Z",
            "reason": "Band Practice",
            "status": "approved"
        }))
        .unwrap();
        assert!(req.validate(&()).is_ok());

        let user_id = UserId::new();
        let event: CreateBooking =
            CreateBookingRequestWithUser::new(user_id, "Aoi".into(), req).into();
        assert_eq!(event.user_id, user_id);
        assert_eq!(event.user_name, "Aoi");
        assert_eq!(event.reason, "Band Practice");
    }

    #[test]
    fn partial_update_keeps_missing_fields_empty() {
        let req: UpdateBookingRequest =
            serde_json::from_value(json!({ "reason": "Recording" })).unwrap();
        let event: UpdateBooking = UpdateBookingRequestWithId::new(BookingId::new(), req).into();
        assert!(event.start_time.is_none());
        assert!(event.end_time.is_none());
        assert_eq!(event.reason.as_deref(), Some("Recording"));
    }

    #[test]
    fn today_is_a_filter_but_not_a_status() {
        let query: BookingListQuery = serde_json::from_value(json!({ "status": "today" })).unwrap();
        assert_eq!(query.status, Some(BookingFilter::Today));

        let status = serde_json::from_value::<UpdateBookingStatusRequest>(json!({ "status": "today" }));
        assert!(status.is_err());
    }

    #[test]
    fn response_uses_camel_case_and_lowercase_status() {
        let booking = Booking {
            id: BookingId::new(),
            user_id: UserId::new(),
            user_name: "Aoi".into(),
            start_time: "2026-01-08T10:00:00Z".parse().unwrap(),
            end_time: "2026-01-08T12:00:00Z".parse().unwrap(),
            status: BookingStatus::Approved,
            reason: "Band Practice".into(),
            created_at: "2026-01-01T09:00:00Z".parse().unwrap(),
        };
        let value = serde_json::to_value(BookingResponse::from(booking)).unwrap();
        assert_eq!(value["status"], "approved");
        assert_eq!(value["userName"], "Aoi");
        assert!(value.get("startTime").is_some());
    }
}

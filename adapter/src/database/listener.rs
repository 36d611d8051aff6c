use crate::database::ConnectionPool;
use kernel::{
    model::id::BookingId,
    notifier::{BookingChanged, BookingFeed, ChangeKind},
};
use serde::Deserialize;
use shared::error::{AppError, AppResult};
use sqlx::postgres::PgListener;
use std::time::Duration;
use tokio::task::JoinHandle;

// migrations の notify_booking_change トリガーが通知するチャネル
pub const BOOKING_CHANNEL: &str = "booking_changes";
const RECONNECT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct ChangePayload {
    op: String,
    booking_id: BookingId,
}

impl TryFrom<ChangePayload> for BookingChanged {
    type Error = AppError;

    fn try_from(value: ChangePayload) -> Result<Self, Self::Error> {
        let kind = value
            .op
            .parse::<ChangeKind>()
            .map_err(|e| AppError::ConversionEntityError(format!("{}: {e}", value.op)))?;
        Ok(BookingChanged::new(kind, value.booking_id))
    }
}

fn parse_payload(payload: &str) -> AppResult<BookingChanged> {
    serde_json::from_str::<ChangePayload>(payload)
        .map_err(|e| AppError::ConversionEntityError(e.to_string()))?
        .try_into()
}

/// Forwards `bookings` row changes from PostgreSQL into `feed`.
pub async fn spawn_booking_listener(
    db: &ConnectionPool,
    feed: BookingFeed,
) -> AppResult<JoinHandle<()>> {
    let mut listener = PgListener::connect_with(db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;
    listener
        .listen(BOOKING_CHANNEL)
        .await
        .map_err(AppError::SpecificOperationError)?;
    tracing::info!(channel = BOOKING_CHANNEL, "listening for booking changes");

    Ok(tokio::spawn(async move {
        loop {
            // 切断中の通知は失われるので、再接続を待ってから全件の再取得を促す
            let received = listener.try_recv().await;
            let step = forward(
                received.as_ref().map(|n| n.as_ref().map(|n| n.payload())),
                &feed,
            );
            if step == ListenStep::ConnectionLost {
                tokio::time::sleep(RECONNECT_INTERVAL).await;
                feed.resync();
            }
        }
    }))
}

#[derive(Debug, PartialEq, Eq)]
enum ListenStep {
    Received,
    ConnectionLost,
}

fn forward(received: Result<Option<&str>, &sqlx::Error>, feed: &BookingFeed) -> ListenStep {
    match received {
        Ok(Some(payload)) => {
            match parse_payload(payload) {
                Ok(change) => feed.publish(change),
                Err(e) => tracing::warn!(
                    error.message = %e,
                    payload,
                    "malformed booking notification"
                ),
            }
            ListenStep::Received
        }
        // PgListener は次の try_recv で再接続する
        Ok(None) => {
            tracing::warn!("booking listener lost its connection");
            ListenStep::ConnectionLost
        }
        Err(e) => {
            tracing::warn!(error.message = %e, "booking listener could not reconnect");
            ListenStep::ConnectionLost
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::notifier::FeedEvent;

    #[test]
    fn parses_trigger_payload() {
        let id = BookingId::new();
        let payload = format!(r#"{{"op":"UPDATE","booking_id":"{id}"}}"#);
        let change = parse_payload(&payload).unwrap();
        assert_eq!(change.kind, ChangeKind::Update);
        assert_eq!(change.booking_id, id);
    }

    #[test]
    fn rejects_unknown_operation() {
        let payload = format!(r#"{{"op":"TRUNCATE","booking_id":"{}"}}"#, BookingId::new());
        assert!(matches!(
            parse_payload(&payload),
            Err(AppError::ConversionEntityError(_))
        ));
    }

    #[test]
    fn notification_is_forwarded_to_feed() {
        let feed = BookingFeed::new();
        let mut rx = feed.receiver();
        let id = BookingId::new();
        let payload = format!(r#"{{"op":"INSERT","booking_id":"{id}"}}"#);

        assert_eq!(forward(Ok(Some(payload.as_str())), &feed), ListenStep::Received);
        assert_eq!(
            rx.try_recv().unwrap(),
            FeedEvent::Changed(BookingChanged::new(ChangeKind::Insert, id))
        );
    }

    #[test]
    fn lost_connection_asks_for_resync() {
        let feed = BookingFeed::new();
        let mut rx = feed.receiver();

        assert_eq!(forward(Ok(None), &feed), ListenStep::ConnectionLost);
        assert_eq!(
            forward(Err(&sqlx::Error::PoolTimedOut), &feed),
            ListenStep::ConnectionLost
        );
        // resync はループ側が待機後に送る
        assert!(rx.try_recv().is_err());
    }
}

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use kernel::{
    model::{
        booking::{
            event::{CreateBooking, DeleteBooking, UpdateBooking, UpdateBookingStatus},
            slot::occupied_slots,
            Booking, BookingOrder, BookingRange, BookingStatus,
        },
        id::{BookingId, UserId},
    },
    notifier::{BookingChanged, BookingFeed, BookingNotifier, ChangeKind},
    repository::booking::BookingRepository,
    service::booking::BookingService,
};
use shared::error::{AppError, AppResult};
use std::{sync::Arc, sync::Mutex, time::Duration};
use tokio::{sync::mpsc, time::timeout};

// テーブルの代わりに Vec を使い、変更のたびにトリガーと同様にフィードへ通知する
struct InMemoryBookings {
    rows: Mutex<Vec<Booking>>,
    feed: BookingFeed,
}

impl InMemoryBookings {
    fn new(feed: BookingFeed) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            feed,
        }
    }

    fn sorted(mut rows: Vec<Booking>, order: BookingOrder) -> Vec<Booking> {
        match order {
            BookingOrder::CreatedAtDesc => rows.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            BookingOrder::StartTimeAsc => rows.sort_by(|a, b| a.start_time.cmp(&b.start_time)),
        }
        rows
    }

    fn select(&self, order: BookingOrder, pred: impl Fn(&Booking) -> bool) -> Vec<Booking> {
        let rows = self.rows.lock().unwrap();
        Self::sorted(rows.iter().filter(|b| pred(b)).cloned().collect(), order)
    }

    fn modify(&self, id: BookingId, f: impl FnOnce(&mut Booking)) -> AppResult<Booking> {
        let booking = {
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|b| b.id == id)
                .ok_or_else(|| AppError::EntityNotFound(id.to_string()))?;
            f(row);
            row.clone()
        };
        self.feed
            .publish(BookingChanged::new(ChangeKind::Update, id));
        Ok(booking)
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookings {
    async fn create(&self, event: CreateBooking) -> AppResult<Booking> {
        let booking = Booking {
            id: BookingId::new(),
            user_id: event.user_id,
            user_name: event.user_name,
            start_time: event.start_time,
            end_time: event.end_time,
            status: BookingStatus::Pending,
            reason: event.reason,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(booking.clone());
        self.feed
            .publish(BookingChanged::new(ChangeKind::Insert, booking.id));
        Ok(booking)
    }

    async fn find_all(&self, order: BookingOrder) -> AppResult<Vec<Booking>> {
        Ok(self.select(order, |_| true))
    }

    async fn find_by_id(&self, booking_id: BookingId) -> AppResult<Option<Booking>> {
        Ok(self.select(BookingOrder::default(), |b| b.id == booking_id).pop())
    }

    async fn find_by_user_id(
        &self,
        user_id: UserId,
        order: BookingOrder,
    ) -> AppResult<Vec<Booking>> {
        Ok(self.select(order, |b| b.user_id == user_id))
    }

    async fn find_by_range(
        &self,
        range: BookingRange,
        order: BookingOrder,
    ) -> AppResult<Vec<Booking>> {
        Ok(self.select(order, |b| range.contains(b.start_time)))
    }

    async fn find_by_status(
        &self,
        status: BookingStatus,
        order: BookingOrder,
    ) -> AppResult<Vec<Booking>> {
        Ok(self.select(order, |b| b.status == status))
    }

    async fn update(&self, event: UpdateBooking) -> AppResult<Booking> {
        self.modify(event.booking_id, |b| {
            if let Some(start) = event.start_time {
                b.start_time = start;
            }
            if let Some(end) = event.end_time {
                b.end_time = end;
            }
            if let Some(reason) = event.reason {
                b.reason = reason;
            }
        })
    }

    async fn update_status(&self, event: UpdateBookingStatus) -> AppResult<Booking> {
        self.modify(event.booking_id, |b| b.status = event.status)
    }

    async fn delete(&self, event: DeleteBooking) -> AppResult<()> {
        let removed = {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|b| b.id != event.booking_id);
            before != rows.len()
        };
        if !removed {
            return Err(AppError::EntityNotFound(event.booking_id.to_string()));
        }
        self.feed
            .publish(BookingChanged::new(ChangeKind::Delete, event.booking_id));
        Ok(())
    }
}

struct Harness {
    service: BookingService,
    notifier: BookingNotifier,
    store: Arc<InMemoryBookings>,
}

fn harness() -> Harness {
    let feed = BookingFeed::new();
    let store = Arc::new(InMemoryBookings::new(feed.clone()));
    let repository: Arc<dyn BookingRepository> = store.clone();
    Harness {
        service: BookingService::new(repository.clone()),
        notifier: BookingNotifier::new(feed, repository),
        store,
    }
}

fn at(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn band_practice(user_id: UserId, name: &str) -> CreateBooking {
    CreateBooking::new(
        user_id,
        name.into(),
        at("2026-01-08T10:00:00Z"),
        at("2026-01-08T12:00:00Z"),
        "Band Practice".into(),
    )
}

async fn next(rx: &mut mpsc::UnboundedReceiver<Vec<Booking>>) -> Vec<Booking> {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("refresh did not arrive")
        .expect("subscription closed")
}

#[tokio::test]
async fn approved_booking_shows_on_calendar_and_overlap_is_accepted() -> anyhow::Result<()> {
    let h = harness();
    let user_a = UserId::new();
    let user_b = UserId::new();

    let booking = h.service.create(band_practice(user_a, "Aoi")).await?;
    assert_eq!(booking.status, BookingStatus::Pending);

    let approved = h
        .service
        .set_status(booking.id, BookingStatus::Approved)
        .await?;
    assert_eq!(approved.status, BookingStatus::Approved);

    let date = NaiveDate::from_ymd_opt(2026, 1, 8).unwrap();
    let utc = FixedOffset::east_opt(0).unwrap();
    let day = h
        .service
        .list_by_range(BookingRange::for_day(date, utc)?)
        .await?;
    let slots: Vec<String> = occupied_slots(date, utc, &day, None)
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(slots, vec!["10:00", "11:00"]);

    // 重複する予約も書き込み時には拒否されない
    let overlapping = h.service.create(band_practice(user_b, "Haru")).await?;
    assert_eq!(overlapping.status, BookingStatus::Pending);
    assert_eq!(h.service.list_all().await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn refresh_reflects_each_mutation_exactly_once() -> anyhow::Result<()> {
    let h = harness();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _subscription = h.notifier.subscribe(move |bookings| {
        let _ = tx.send(bookings);
    });
    let user = UserId::new();

    let created = h.service.create(band_practice(user, "Aoi")).await?;
    let view = next(&mut rx).await;
    assert_eq!(view.iter().filter(|b| b.id == created.id).count(), 1);

    h.service
        .edit(UpdateBooking::new(
            created.id,
            None,
            Some(at("2026-01-08T13:00:00Z")),
            Some("Recording".into()),
        ))
        .await?;
    let view = next(&mut rx).await;
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].reason, "Recording");
    assert_eq!(view[0].end_time, at("2026-01-08T13:00:00Z"));
    assert_eq!(view[0].status, BookingStatus::Pending);

    h.service
        .set_status(created.id, BookingStatus::Rejected)
        .await?;
    let view = next(&mut rx).await;
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].status, BookingStatus::Rejected);

    h.service.delete(created.id).await?;
    let view = next(&mut rx).await;
    assert!(view.is_empty());
    Ok(())
}

#[tokio::test]
async fn repeated_approval_is_idempotent() -> anyhow::Result<()> {
    let h = harness();
    let booking = h.service.create(band_practice(UserId::new(), "Aoi")).await?;

    let first = h
        .service
        .set_status(booking.id, BookingStatus::Approved)
        .await?;
    let snapshot = h.store.find_all(BookingOrder::CreatedAtDesc).await?;
    let second = h
        .service
        .set_status(booking.id, BookingStatus::Approved)
        .await?;

    assert_eq!(first, second);
    assert_eq!(snapshot, h.store.find_all(BookingOrder::CreatedAtDesc).await?);
    Ok(())
}

#[tokio::test]
async fn listings_use_requested_order() -> anyhow::Result<()> {
    let h = harness();
    let user = UserId::new();
    let late = h
        .service
        .create(CreateBooking::new(
            user,
            "Aoi".into(),
            at("2026-01-08T15:00:00Z"),
            at("2026-01-08T16:00:00Z"),
            "Late".into(),
        ))
        .await?;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let early = h
        .service
        .create(CreateBooking::new(
            user,
            "Aoi".into(),
            at("2026-01-08T09:00:00Z"),
            at("2026-01-08T10:00:00Z"),
            "Early".into(),
        ))
        .await?;

    let listing: Vec<_> = h.service.list_by_user(user).await?.into_iter().map(|b| b.id).collect();
    assert_eq!(listing, vec![early.id, late.id]);

    let range = BookingRange::new(at("2026-01-08T00:00:00Z"), at("2026-01-09T00:00:00Z"))?;
    let by_start: Vec<_> = h
        .service
        .list_by_range(range)
        .await?
        .into_iter()
        .map(|b| b.id)
        .collect();
    assert_eq!(by_start, vec![early.id, late.id]);

    h.service.set_status(late.id, BookingStatus::Approved).await?;
    let approved = h.service.list_by_status(BookingStatus::Approved).await?;
    assert_eq!(approved.len(), 1);
    assert_eq!(approved[0].id, late.id);
    Ok(())
}

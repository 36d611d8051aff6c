//! Booking change feed and the full-refresh notifier built on top of it.
//!
//! Every change event makes each subscriber re-fetch the complete booking set;
//! nothing is diffed. Subscribers receive a [`Subscription`] that stops delivery
//! when dropped or unsubscribed.

use crate::{
    model::{
        booking::{Booking, BookingOrder},
        id::BookingId,
    },
    repository::booking::BookingRepository,
};
use derive_new::new;
use std::sync::Arc;
use strum::{Display, EnumString};
use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};

const FEED_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

#[derive(new, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingChanged {
    pub kind: ChangeKind,
    pub booking_id: BookingId,
}

/// What travels on the feed: a row-level change, or a request to resync
/// after the change source may have missed events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedEvent {
    Changed(BookingChanged),
    Resync,
}

/// Broadcast channel carrying row-level booking changes.
#[derive(Clone)]
pub struct BookingFeed {
    tx: broadcast::Sender<FeedEvent>,
}

impl BookingFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, change: BookingChanged) {
        self.send(FeedEvent::Changed(change));
    }

    /// Asks every subscriber to refetch without a specific change.
    pub fn resync(&self) {
        self.send(FeedEvent::Resync);
    }

    pub fn receiver(&self) -> broadcast::Receiver<FeedEvent> {
        self.tx.subscribe()
    }

    fn send(&self, event: FeedEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!(?event, "booking feed event dropped: no subscribers");
        }
    }
}

impl Default for BookingFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancellation handle of a running subscription.
#[derive(Debug)]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    pub fn unsubscribe(self) {
        drop(self)
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Clone)]
pub struct BookingNotifier {
    feed: BookingFeed,
    repository: Arc<dyn BookingRepository>,
}

impl BookingNotifier {
    pub fn new(feed: BookingFeed, repository: Arc<dyn BookingRepository>) -> Self {
        Self { feed, repository }
    }

    pub fn feed(&self) -> &BookingFeed {
        &self.feed
    }

    pub fn repository(&self) -> Arc<dyn BookingRepository> {
        self.repository.clone()
    }

    /// Calls `handler` with a freshly fetched booking set after every change.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(Vec<Booking>) + Send + Sync + 'static,
    {
        // spawn 前に受信側を作っておき、直後の変更も取りこぼさない
        let mut rx = self.feed.receiver();
        let repository = self.repository.clone();

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(FeedEvent::Changed(change)) => tracing::debug!(?change, "booking changed"),
                    Ok(FeedEvent::Resync) => tracing::info!("booking feed resync requested"),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "booking feed lagged behind, refreshing")
                    }
                    Err(RecvError::Closed) => break,
                }

                match repository.find_all(BookingOrder::CreatedAtDesc).await {
                    Ok(bookings) => handler(bookings),
                    Err(e) => tracing::warn!(
                        error.message = %e,
                        "failed to refresh bookings after change"
                    ),
                }
            }
        });

        Subscription::new(handle)
    }
}

//! Process-wide in-memory copy of the booking set.
//!
//! The board is display state only. The store stays authoritative and the
//! board is replaced wholesale whenever the notifier reports a change.

use crate::{
    model::booking::{Booking, BookingOrder},
    notifier::{BookingNotifier, Subscription},
};
use shared::error::AppResult;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub struct BookingBoard {
    notifier: BookingNotifier,
    state: Arc<RwLock<BoardState>>,
    subscription: Mutex<Option<Subscription>>,
}

// generation は購読側の更新ごとに進む
#[derive(Default)]
struct BoardState {
    generation: u64,
    bookings: Vec<Booking>,
}

impl BookingBoard {
    pub fn new(notifier: BookingNotifier) -> Self {
        Self {
            notifier,
            state: Arc::new(RwLock::new(BoardState::default())),
            subscription: Mutex::new(None),
        }
    }

    /// Loads the current bookings and starts following changes.
    ///
    /// A refresh delivered while the initial load is in flight wins over the
    /// initial result.
    pub async fn init(&self) -> AppResult<()> {
        let started_at = self.read().generation;
        let cell = self.state.clone();
        let subscription = self.notifier.subscribe(move |bookings| {
            let mut state = cell.write().unwrap_or_else(PoisonError::into_inner);
            state.generation += 1;
            state.bookings = bookings;
        });

        let bookings = self
            .notifier
            .repository()
            .find_all(BookingOrder::CreatedAtDesc)
            .await?;
        {
            let mut state = self.write();
            if state.generation == started_at {
                tracing::info!(count = bookings.len(), "booking board initialized");
                state.bookings = bookings;
            } else {
                tracing::debug!("booking board refreshed during init; initial load discarded");
            }
        }

        let previous = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(subscription);
        drop(previous);
        Ok(())
    }

    /// Stops following changes and forgets the cached bookings.
    pub fn teardown(&self) {
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
            tracing::info!("booking board torn down");
        }
        self.write().bookings = Vec::new();
    }

    pub fn is_live(&self) -> bool {
        self.subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(Subscription::is_active)
    }

    pub fn snapshot(&self) -> Vec<Booking> {
        self.read().bookings.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, BoardState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BoardState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

//! Hourly slot occupancy for the calendar view.

use crate::model::{booking::Booking, id::BookingId};
use chrono::{Duration, FixedOffset, NaiveDate, Timelike};
use std::collections::BTreeSet;
use std::fmt;

/// One hourly label (`HH:MM`, 24-hour clock) within a studio-local day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot {
    hour: u32,
    minute: u32,
}

impl Slot {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Returns the occupied slots of `date`, sorted and without duplicates.
///
/// Only pending and approved bookings starting on `date` (studio-local) count.
/// Each one is walked from its start in one-hour steps while the step is still
/// before its end, so a 10:00-12:00 booking yields `10:00` and `11:00`.
/// `exclude` drops a booking from the calculation, which lets an edit be
/// checked without colliding with its own slots.
pub fn occupied_slots<'a, I>(
    date: NaiveDate,
    offset: FixedOffset,
    bookings: I,
    exclude: Option<BookingId>,
) -> Vec<Slot>
where
    I: IntoIterator<Item = &'a Booking>,
{
    let mut taken = BTreeSet::new();

    for booking in bookings {
        if !booking.status.occupies_slot() || exclude == Some(booking.id) {
            continue;
        }
        if booking.start_time.with_timezone(&offset).date_naive() != date {
            continue;
        }

        let mut current = booking.start_time;
        while current < booking.end_time {
            let local = current.with_timezone(&offset);
            taken.insert(Slot {
                hour: local.hour(),
                minute: local.minute(),
            });
            current += Duration::hours(1);
        }
    }

    taken.into_iter().collect()
}

/// Bookable slots between `open_hour` (inclusive) and `close_hour` (exclusive).
pub fn slot_grid(open_hour: u32, close_hour: u32) -> Vec<Slot> {
    (open_hour..close_hour.min(24))
        .filter_map(|hour| Slot::new(hour, 0))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub taken: Vec<Slot>,
    pub available: Vec<Slot>,
}

impl CalendarDay {
    pub fn build<'a, I>(
        date: NaiveDate,
        offset: FixedOffset,
        (open_hour, close_hour): (u32, u32),
        bookings: I,
        exclude: Option<BookingId>,
    ) -> Self
    where
        I: IntoIterator<Item = &'a Booking>,
    {
        let taken = occupied_slots(date, offset, bookings, exclude);
        let available = slot_grid(open_hour, close_hour)
            .into_iter()
            .filter(|slot| !taken.contains(slot))
            .collect();
        Self {
            date,
            taken,
            available,
        }
    }
}

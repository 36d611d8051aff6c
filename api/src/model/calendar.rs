use chrono::NaiveDate;
use kernel::model::{booking::slot::CalendarDay, id::BookingId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    // 編集中の予約自身の枠を除外する
    #[serde(default)]
    pub exclude: Option<BookingId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDayResponse {
    pub date: NaiveDate,
    pub taken: Vec<String>,
    pub available: Vec<String>,
}

impl From<CalendarDay> for CalendarDayResponse {
    fn from(value: CalendarDay) -> Self {
        let CalendarDay {
            date,
            taken,
            available,
        } = value;
        Self {
            date,
            taken: taken.iter().map(ToString::to_string).collect(),
            available: available.iter().map(ToString::to_string).collect(),
        }
    }
}

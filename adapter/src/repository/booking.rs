use crate::database::{model::booking::BookingRow, ConnectionPool};
use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    booking::{
        event::{CreateBooking, DeleteBooking, UpdateBooking, UpdateBookingStatus},
        Booking, BookingOrder, BookingRange, BookingStatus,
    },
    id::{BookingId, UserId},
};
use kernel::repository::booking::BookingRepository;
use shared::error::{AppError, AppResult};

const BOOKING_COLUMNS: &str =
    "booking_id, user_id, user_name, start_time, end_time, status, reason, created_at";

#[derive(new)]
pub struct BookingRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl BookingRepository for BookingRepositoryImpl {
    // 予約を登録する。重複する時間帯のチェックは行わない
    async fn create(&self, event: CreateBooking) -> AppResult<Booking> {
        let sql = format!(
            r#"
                INSERT INTO bookings
                (booking_id, user_id, user_name, start_time, end_time, status, reason)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING {BOOKING_COLUMNS}
            "#
        );
        let row: BookingRow = sqlx::query_as(&sql)
            .bind(BookingId::new())
            .bind(event.user_id)
            .bind(event.user_name)
            .bind(event.start_time)
            .bind(event.end_time)
            .bind(BookingStatus::Pending.as_ref())
            .bind(event.reason)
            .fetch_one(self.db.inner_ref())
            .await
            .map_err(map_write_error)?;

        row.try_into()
    }

    async fn find_all(&self, order: BookingOrder) -> AppResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY {}",
            order_by(order)
        );
        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .fetch_all(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        into_bookings(rows)
    }

    async fn find_by_id(&self, booking_id: BookingId) -> AppResult<Option<Booking>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_id = $1");
        let row: Option<BookingRow> = sqlx::query_as(&sql)
            .bind(booking_id)
            .fetch_optional(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        row.map(Booking::try_from).transpose()
    }

    async fn find_by_user_id(
        &self,
        user_id: UserId,
        order: BookingOrder,
    ) -> AppResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY {}",
            order_by(order)
        );
        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        into_bookings(rows)
    }

    // 開始時刻が [from, to) に含まれる予約を取得する
    async fn find_by_range(
        &self,
        range: BookingRange,
        order: BookingOrder,
    ) -> AppResult<Vec<Booking>> {
        let sql = format!(
            r#"
                SELECT {BOOKING_COLUMNS} FROM bookings
                WHERE start_time >= $1 AND start_time < $2
                ORDER BY {}
            "#,
            order_by(order)
        );
        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        into_bookings(rows)
    }

    async fn find_by_status(
        &self,
        status: BookingStatus,
        order: BookingOrder,
    ) -> AppResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = $1 ORDER BY {}",
            order_by(order)
        );
        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .bind(status.as_ref())
            .fetch_all(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        into_bookings(rows)
    }

    // 指定された項目だけを更新する。None の項目は現在の値のまま
    async fn update(&self, event: UpdateBooking) -> AppResult<Booking> {
        let sql = format!(
            r#"
                UPDATE bookings
                SET
                    start_time = COALESCE($2, start_time),
                    end_time = COALESCE($3, end_time),
                    reason = COALESCE($4, reason)
                WHERE booking_id = $1
                RETURNING {BOOKING_COLUMNS}
            "#
        );
        let row: Option<BookingRow> = sqlx::query_as(&sql)
            .bind(event.booking_id)
            .bind(event.start_time)
            .bind(event.end_time)
            .bind(event.reason)
            .fetch_optional(self.db.inner_ref())
            .await
            .map_err(map_write_error)?;

        row.ok_or_else(|| not_found(event.booking_id))?.try_into()
    }

    async fn update_status(&self, event: UpdateBookingStatus) -> AppResult<Booking> {
        let sql = format!(
            "UPDATE bookings SET status = $2 WHERE booking_id = $1 RETURNING {BOOKING_COLUMNS}"
        );
        let row: Option<BookingRow> = sqlx::query_as(&sql)
            .bind(event.booking_id)
            .bind(event.status.as_ref())
            .fetch_optional(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        row.ok_or_else(|| not_found(event.booking_id))?.try_into()
    }

    async fn delete(&self, event: DeleteBooking) -> AppResult<()> {
        let res = sqlx::query("DELETE FROM bookings WHERE booking_id = $1")
            .bind(event.booking_id)
            .execute(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(not_found(event.booking_id));
        }

        Ok(())
    }
}

fn order_by(order: BookingOrder) -> &'static str {
    match order {
        BookingOrder::CreatedAtDesc => "created_at DESC",
        BookingOrder::StartTimeAsc => "start_time ASC",
    }
}

fn into_bookings(rows: Vec<BookingRow>) -> AppResult<Vec<Booking>> {
    rows.into_iter().map(Booking::try_from).collect()
}

fn not_found(booking_id: BookingId) -> AppError {
    AppError::EntityNotFound(format!("booking ({booking_id}) was not found"))
}

// CHECK 制約 (start_time < end_time) 違反は入力エラーとして返す
fn map_write_error(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_check_violation() => {
            AppError::InvalidInput("end time must be after start time".into())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::UnprocessableEntity("booking owner does not exist".into())
        }
        _ => AppError::SpecificOperationError(e),
    }
}

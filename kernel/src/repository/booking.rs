use crate::model::{
    booking::{
        event::{CreateBooking, DeleteBooking, UpdateBooking, UpdateBookingStatus},
        Booking, BookingOrder, BookingRange, BookingStatus,
    },
    id::{BookingId, UserId},
};
use async_trait::async_trait;
use mockall::automock;
use shared::error::AppResult;

#[automock]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    // 予約を登録する。ステータスは常に pending で保存される
    async fn create(&self, event: CreateBooking) -> AppResult<Booking>;
    // すべての予約を取得する
    async fn find_all(&self, order: BookingOrder) -> AppResult<Vec<Booking>>;
    // 予約 ID から予約を取得する
    async fn find_by_id(&self, booking_id: BookingId) -> AppResult<Option<Booking>>;
    // ユーザー ID に紐づく予約を取得する
    async fn find_by_user_id(&self, user_id: UserId, order: BookingOrder)
        -> AppResult<Vec<Booking>>;
    // 開始時刻が指定範囲に含まれる予約を取得する
    async fn find_by_range(&self, range: BookingRange, order: BookingOrder)
        -> AppResult<Vec<Booking>>;
    // 指定ステータスの予約を取得する
    async fn find_by_status(
        &self,
        status: BookingStatus,
        order: BookingOrder,
    ) -> AppResult<Vec<Booking>>;
    // 指定された項目だけを更新する。ステータスは変更しない
    async fn update(&self, event: UpdateBooking) -> AppResult<Booking>;
    // ステータスを上書きする
    async fn update_status(&self, event: UpdateBookingStatus) -> AppResult<Booking>;
    // 予約を削除する
    async fn delete(&self, event: DeleteBooking) -> AppResult<()>;
}

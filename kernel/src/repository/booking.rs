use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::error::AppResult;

use crate::model::booking::event::{CreateCodRequest, CreatePaidBooking, OwnerDecision};
use crate::model::booking::{Booking, BookingRecord, DateWindow};
use crate::model::id::{BookingId, EquipmentId, UserId};

#[async_trait]
pub trait BookingRepository: Send + Sync {
    // 指定期間に空きがあるかを調べる（Availability Oracle）。
    // 事前チェックとしても使われるが、最終的な判定は create 系操作の
    // クリティカルセクション内で改めて行われる
    async fn is_available(&self, equipment_id: EquipmentId, window: DateWindow)
        -> AppResult<bool>;

    // 決済確認済みのオンライン予約を作成する。
    // 空き確認と挿入は同一のアトミックな単位で行い、
    // 競合した場合は Conflict を返す
    async fn create_paid(&self, event: CreatePaidBooking) -> AppResult<Booking>;

    // COD リクエストを作成する（承認待ち、スロットはまだ確保されない）
    async fn create_cod_request(&self, event: CreateCodRequest) -> AppResult<Booking>;

    // オーナーの承認／棄却。二度目の判断は AlreadyDecided で弾く
    async fn decide(&self, booking_id: BookingId, decision: OwnerDecision) -> AppResult<Booking>;

    // COD の現金回収を記録し、予約を完了させる
    async fn mark_cod_paid(&self, booking_id: BookingId) -> AppResult<Booking>;

    // 以下は台帳とアーカイブを横断する読み取り専用の射影
    async fn find_by_renter(&self, renter_id: UserId) -> AppResult<Vec<BookingRecord>>;
    async fn find_by_owner(&self, owner_id: UserId) -> AppResult<Vec<BookingRecord>>;
    async fn find_history_by_equipment_id(
        &self,
        equipment_id: EquipmentId,
    ) -> AppResult<Vec<BookingRecord>>;
    async fn owner_income(&self, owner_id: UserId) -> AppResult<i64>;

    // スイーパー用の操作。
    // expire_stale_approvals は承認期限切れの COD リクエストを棄却し、
    // find_due_for_archive は猶予期間を過ぎた予約の ID を返し、
    // archive は 1 予約をアーカイブへ移送する（再実行に対して冪等）
    async fn expire_stale_approvals(&self, now: DateTime<Utc>) -> AppResult<Vec<BookingId>>;
    async fn find_due_for_archive(&self, now: DateTime<Utc>) -> AppResult<Vec<BookingId>>;
    async fn archive(&self, booking_id: BookingId, now: DateTime<Utc>) -> AppResult<()>;
}

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use derive_new::new;

use kernel::model::booking::event::{CreateCodRequest, CreatePaidBooking, OwnerDecision};
use kernel::model::booking::{
    Booking, BookingRecord, CompletedBooking, DateWindow, LifecycleStatus,
};
use kernel::model::id::{BookingId, EquipmentId, UserId};
use kernel::repository::booking::BookingRepository;
use shared::error::{AppError, AppResult};

use crate::store::{BookingStore, StoreInner};

#[derive(new)]
pub struct BookingRepositoryImpl {
    store: BookingStore,
    approval_ttl_hours: i64,
    grace_days: i64,
}

#[async_trait]
impl BookingRepository for BookingRepositoryImpl {
    async fn is_available(
        &self,
        equipment_id: EquipmentId,
        window: DateWindow,
    ) -> AppResult<bool> {
        let inner = self.store.lock_with_retries().await?;
        Ok(!has_blocking_overlap(&inner, equipment_id, window))
    }

    async fn create_paid(&self, event: CreatePaidBooking) -> AppResult<Booking> {
        ensure_not_self_rental(event.renter_id, event.owner_id)?;

        let mut inner = self.store.lock_with_retries().await?;

        // 事前チェック済みでも、挿入と同じクリティカルセクション内で
        // 改めて空きを確認する。こちらが権威ある判定となり、
        // 競合する確定済み予約が割り込んでいた場合は Conflict になる
        if has_blocking_overlap(&inner, event.equipment_id, event.window) {
            return Err(AppError::Conflict(format!(
                "equipment {} is already booked for the requested dates",
                event.equipment_id
            )));
        }

        let booking = Booking::from_paid_event(event, Utc::now());
        inner.ledger.insert(booking.booking_id, booking.clone());

        Ok(booking)
    }

    async fn create_cod_request(&self, event: CreateCodRequest) -> AppResult<Booking> {
        ensure_not_self_rental(event.renter_id, event.owner_id)?;

        let mut inner = self.store.lock_with_retries().await?;

        if has_blocking_overlap(&inner, event.equipment_id, event.window) {
            return Err(AppError::Conflict(format!(
                "equipment {} is already booked for the requested dates",
                event.equipment_id
            )));
        }

        // 承認待ちの間はスロットを確保しない。
        // 後続の支払い済み予約にスロットを奪われうるのは仕様上の挙動で、
        // その場合の承認は decide 側で Conflict になる
        let now = Utc::now();
        let deadline = now + Duration::hours(self.approval_ttl_hours);
        let booking = Booking::from_cod_event(event, deadline, now);
        inner.ledger.insert(booking.booking_id, booking.clone());

        Ok(booking)
    }

    async fn decide(&self, booking_id: BookingId, decision: OwnerDecision) -> AppResult<Booking> {
        let mut inner = self.store.lock_with_retries().await?;

        let mut booking = inner
            .ledger
            .get(&booking_id)
            .cloned()
            .ok_or_else(|| booking_not_found(booking_id))?;

        let now = Utc::now();
        match decision {
            OwnerDecision::Approve => {
                booking.approve(now)?;
                // 承認待ちの間にスロットが確定済み予約へ渡っていた場合、
                // ここで確定させると重複予約になるため承認を退ける。
                // 台帳上の自身の旧コピーは pending のため判定を妨げない
                if has_blocking_overlap(&inner, booking.equipment_id, booking.window) {
                    return Err(AppError::Conflict(format!(
                        "the slot for equipment {} was taken while awaiting approval",
                        booking.equipment_id
                    )));
                }
            }
            OwnerDecision::Reject => booking.reject(now)?,
        }

        inner.ledger.insert(booking_id, booking.clone());
        Ok(booking)
    }

    async fn mark_cod_paid(&self, booking_id: BookingId) -> AppResult<Booking> {
        let mut inner = self.store.lock_with_retries().await?;

        let mut booking = inner
            .ledger
            .get(&booking_id)
            .cloned()
            .ok_or_else(|| booking_not_found(booking_id))?;

        booking.mark_cod_paid(Utc::now())?;
        inner.ledger.insert(booking_id, booking.clone());

        Ok(booking)
    }

    async fn find_by_renter(&self, renter_id: UserId) -> AppResult<Vec<BookingRecord>> {
        let inner = self.store.lock_with_retries().await?;
        Ok(collect_records(&inner, |b| b.renter_id == renter_id, |c| {
            c.renter_id == renter_id
        }))
    }

    async fn find_by_owner(&self, owner_id: UserId) -> AppResult<Vec<BookingRecord>> {
        let inner = self.store.lock_with_retries().await?;
        Ok(collect_records(&inner, |b| b.owner_id == owner_id, |c| {
            c.owner_id == owner_id
        }))
    }

    // 機材ごとの予約履歴。進行中の予約を先頭に、
    // アーカイブ済みは完了日時の新しい順で続ける
    async fn find_history_by_equipment_id(
        &self,
        equipment_id: EquipmentId,
    ) -> AppResult<Vec<BookingRecord>> {
        let inner = self.store.lock_with_retries().await?;
        Ok(collect_records(
            &inner,
            |b| b.equipment_id == equipment_id,
            |c| c.equipment_id == equipment_id,
        ))
    }

    // オーナー収入は台帳・アーカイブ両方の支払い済み予約の payout 合計
    async fn owner_income(&self, owner_id: UserId) -> AppResult<i64> {
        let inner = self.store.lock_with_retries().await?;
        let records = collect_records(&inner, |b| b.owner_id == owner_id, |c| {
            c.owner_id == owner_id
        });
        Ok(records.iter().map(BookingRecord::paid_owner_payout).sum())
    }

    async fn expire_stale_approvals(&self, now: DateTime<Utc>) -> AppResult<Vec<BookingId>> {
        let mut inner = self.store.lock_with_retries().await?;
        let mut expired = Vec::new();
        for booking in inner.ledger.values_mut() {
            if booking.expire_approval(now) {
                expired.push(booking.booking_id);
            }
        }
        Ok(expired)
    }

    async fn find_due_for_archive(&self, now: DateTime<Utc>) -> AppResult<Vec<BookingId>> {
        let inner = self.store.lock_with_retries().await?;
        let due = inner
            .ledger
            .values()
            .filter(|b| {
                // 承認待ちのまま残っているものは対象外
                // （期限切れは expire_stale_approvals が先に棄却している）
                b.lifecycle_status != LifecycleStatus::Pending
                    && b.archive_due_at(self.grace_days) <= now
            })
            .map(|b| b.booking_id)
            .collect();
        Ok(due)
    }

    async fn archive(&self, booking_id: BookingId, now: DateTime<Utc>) -> AppResult<()> {
        let mut inner = self.store.lock_with_retries().await?;

        let Some(booking) = inner.ledger.get(&booking_id).cloned() else {
            // 台帳に無い場合、アーカイブ済みであれば前回の部分的な実行が
            // 完了していたということなので冪等に成功させる
            return if inner.archive.contains_key(&booking_id) {
                Ok(())
            } else {
                Err(booking_not_found(booking_id))
            };
        };

        if booking.archive_due_at(self.grace_days) > now {
            return Err(AppError::UnprocessableEntity(format!(
                "booking {booking_id} has not passed its grace deadline yet"
            )));
        }

        if booking.lifecycle_status == LifecycleStatus::Cancelled {
            // キャンセル済みはスナップショットを残さず台帳から回収する
            inner.ledger.remove(&booking_id);
            return Ok(());
        }

        // スナップショット書き込み→台帳削除の順。
        // 途中で落ちても両方に存在する（復旧可能な）状態にしかならない。
        // 既にスナップショットがある場合は書き込みを飛ばして削除のみ行う
        if !inner.archive.contains_key(&booking_id) {
            let snapshot = CompletedBooking::snapshot(&booking, now);
            inner.archive.insert(booking_id, snapshot);
        }
        inner.ledger.remove(&booking_id);

        Ok(())
    }
}

fn ensure_not_self_rental(renter_id: UserId, owner_id: UserId) -> AppResult<()> {
    if renter_id == owner_id {
        return Err(AppError::Forbidden(
            "owners cannot rent their own equipment".into(),
        ));
    }
    Ok(())
}

fn booking_not_found(booking_id: BookingId) -> AppError {
    AppError::EntityNotFound(format!("booking {booking_id} was not found"))
}

fn has_blocking_overlap(
    inner: &StoreInner,
    equipment_id: EquipmentId,
    window: DateWindow,
) -> bool {
    inner.ledger.values().any(|b| {
        b.equipment_id == equipment_id
            && b.blocks_availability()
            && b.window.overlaps(&window)
    })
}

fn collect_records<F, G>(inner: &StoreInner, active: F, archived: G) -> Vec<BookingRecord>
where
    F: Fn(&Booking) -> bool,
    G: Fn(&CompletedBooking) -> bool,
{
    let mut actives: Vec<&Booking> = inner.ledger.values().filter(|b| active(b)).collect();
    actives.sort_by_key(|b| b.created_at);

    let mut archives: Vec<&CompletedBooking> =
        inner.archive.values().filter(|c| archived(c)).collect();
    archives.sort_by_key(|c| std::cmp::Reverse(c.completed_at));

    actives
        .into_iter()
        .cloned()
        .map(BookingRecord::Active)
        .chain(archives.into_iter().cloned().map(BookingRecord::Archived))
        .collect()
}

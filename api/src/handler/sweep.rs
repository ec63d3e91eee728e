use std::time::Duration;

use chrono::Utc;
use registry::AppRegistry;
use shared::error::AppResult;
use tokio::time::sleep;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub expired: usize,
    pub archived: usize,
    pub failed: usize,
}

// 照合スイーパーの 1 サイクル。
// ① 承認期限切れの COD リクエストをタイムアウト棄却し、
// ② 猶予期限を過ぎた予約を 1 件ずつアーカイブへ移送する。
// 個別の失敗はログに残してスキップし、次のサイクルで再試行される
pub async fn sweep_once(registry: &AppRegistry) -> AppResult<SweepSummary> {
    let now = Utc::now();
    let repo = registry.booking_repository();

    let expired = repo.expire_stale_approvals(now).await?;
    for booking_id in &expired {
        tracing::info!(%booking_id, "cancelled cod request past its approval deadline");
    }

    let due = repo.find_due_for_archive(now).await?;
    let mut archived = 0;
    let mut failed = 0;
    for booking_id in due {
        match repo.archive(booking_id, now).await {
            Ok(()) => archived += 1,
            Err(e) => {
                failed += 1;
                tracing::error!(
                    %booking_id,
                    error = %e,
                    "failed to archive booking, leaving it for the next tick"
                );
            }
        }
    }

    if !expired.is_empty() || archived > 0 {
        tracing::info!(
            expired = expired.len(),
            archived,
            "sweep tick reconciled bookings"
        );
    }

    Ok(SweepSummary {
        expired: expired.len(),
        archived,
        failed,
    })
}

// 設定された間隔でスイーパーを回し続ける。
// 1 サイクル全体が失敗しても停止せず、次のサイクルで続きから処理する
pub async fn run_sweeper(registry: AppRegistry) {
    let tick = Duration::from_secs(registry.app_config().sweeper.tick_seconds);
    loop {
        if let Err(e) = sweep_once(&registry).await {
            tracing::error!(error = %e, "sweep tick failed");
        }
        sleep(tick).await;
    }
}

#[cfg(test)]
mod tests {
    use adapter::store::BookingStore;
    use chrono::{Duration as ChronoDuration, NaiveDate};
    use kernel::model::booking::DateWindow;
    use kernel::model::equipment::Equipment;
    use kernel::model::id::{EquipmentId, UserId};
    use kernel::repository::equipment::EquipmentRepository as _;
    use shared::config::AppConfig;

    use super::*;
    use crate::handler::booking::{create_cod_request, create_paid_booking, list_by_renter, owner_decide};
    use crate::model::booking::{
        CreateCodRequestRequest, CreatePaidBookingRequest, DeliveryAddressRequest,
        OwnerDecisionRequest,
    };

    async fn registry_with_equipment() -> (AppRegistry, EquipmentId) {
        let app_config = AppConfig::default();
        let registry = AppRegistry::new(BookingStore::new(&app_config.storage), app_config);
        let equipment_id = EquipmentId::new();
        registry
            .equipment_repository()
            .register(Equipment {
                equipment_id,
                owner_id: UserId::new(),
                equipment_name: "scissor lift".into(),
            })
            .await
            .unwrap();
        (registry, equipment_id)
    }

    fn address_req() -> DeliveryAddressRequest {
        DeliveryAddressRequest {
            full_address: "3-4-1 Shibaura".into(),
            city: "Minato".into(),
            state: "Tokyo".into(),
            postal_code: "108-8548".into(),
        }
    }

    // 猶予期限を確実に過ぎた期間
    fn elapsed_window() -> DateWindow {
        let end = Utc::now().date_naive() - ChronoDuration::days(3);
        DateWindow::new(end - ChronoDuration::days(2), end).unwrap()
    }

    fn future_date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // シナリオ D: 期限切れの確定済み予約は 1 サイクルでアーカイブされ、
    // 以降のサイクルでは何も起きない
    #[tokio::test]
    async fn sweep_archives_elapsed_bookings_once() {
        let (registry, equipment_id) = registry_with_equipment().await;
        let renter_id = UserId::new();
        let w = elapsed_window();

        create_paid_booking(
            &registry,
            CreatePaidBookingRequest {
                equipment_id,
                renter_id,
                start_date: w.start,
                end_date: w.end,
                total_price: 25_000,
                delivery_address: address_req(),
                payment_ref: "pay_sweep_test".into(),
            },
        )
        .await
        .unwrap();

        let first = sweep_once(&registry).await.unwrap();
        assert_eq!(first.archived, 1);
        assert_eq!(first.failed, 0);

        let second = sweep_once(&registry).await.unwrap();
        assert_eq!(second.archived, 0);

        let records = list_by_renter(&registry, renter_id).await.unwrap();
        assert_eq!(records.items.len(), 1);
        assert!(records.items[0].completed_at.is_some());
    }

    // 棄却済みでレンタル期間も過ぎたリクエストは台帳から回収される
    #[tokio::test]
    async fn sweep_collects_elapsed_cancelled_requests() {
        let (registry, equipment_id) = registry_with_equipment().await;
        let renter_id = UserId::new();
        let w = elapsed_window();

        let created = create_cod_request(
            &registry,
            CreateCodRequestRequest {
                equipment_id,
                renter_id,
                start_date: w.start,
                end_date: w.end,
                total_price: 25_000,
                delivery_address: address_req(),
            },
        )
        .await
        .unwrap();
        owner_decide(&registry, created.booking_id, OwnerDecisionRequest::Reject)
            .await
            .unwrap();

        let summary = sweep_once(&registry).await.unwrap();
        assert_eq!(summary.archived, 1);

        // スナップショットを残さない回収なので一覧からも消える
        let records = list_by_renter(&registry, renter_id).await.unwrap();
        assert!(records.items.is_empty());
    }

    // 猶予期限前の予約には決して手を付けない
    #[tokio::test]
    async fn sweep_ignores_bookings_within_grace() {
        let (registry, equipment_id) = registry_with_equipment().await;
        let renter_id = UserId::new();

        create_paid_booking(
            &registry,
            CreatePaidBookingRequest {
                equipment_id,
                renter_id,
                start_date: future_date(2099, 6, 1),
                end_date: future_date(2099, 6, 5),
                total_price: 25_000,
                delivery_address: address_req(),
                payment_ref: "pay_sweep_future".into(),
            },
        )
        .await
        .unwrap();

        let summary = sweep_once(&registry).await.unwrap();
        assert_eq!(summary, SweepSummary::default());

        let records = list_by_renter(&registry, renter_id).await.unwrap();
        assert_eq!(records.items.len(), 1);
        assert!(records.items[0].completed_at.is_none());
    }
}

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult};

use crate::model::id::{BookingId, EquipmentId, UserId};

pub mod event;

use self::event::{CreateCodRequest, CreatePaidBooking};

// 予約期間（両端を含む日付区間）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> AppResult<Self> {
        if start > end {
            return Err(AppError::UnprocessableEntity(
                "start date must not be after end date".into(),
            ));
        }
        Ok(Self { start, end })
    }

    // 重複判定。端の日が同じ場合も重複として扱う
    pub fn overlaps(&self, other: &DateWindow) -> bool {
        self.start <= other.end && self.end >= other.start
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    pub full_address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    Online,
    CashOnDelivery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApprovalStatus {
    // オンライン決済はオーナー承認を経ない
    NotApplicable,
    PendingOwner,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl LifecycleStatus {
    // 外部に見せる状態は支払い状態と承認状態から一意に導出する。
    // 個別のフィールド更新で組み合わせが発散しないよう、
    // 遷移メソッドは必ずこの関数を通す
    pub fn derive(
        method: PaymentMethod,
        payment: PaymentStatus,
        approval: ApprovalStatus,
    ) -> Self {
        match approval {
            ApprovalStatus::Rejected => LifecycleStatus::Cancelled,
            ApprovalStatus::PendingOwner => match (method, payment) {
                // 現金回収済みの COD はオーナー判断を待たずに完了とする
                (PaymentMethod::CashOnDelivery, PaymentStatus::Paid) => LifecycleStatus::Completed,
                _ => LifecycleStatus::Pending,
            },
            ApprovalStatus::NotApplicable | ApprovalStatus::Approved => match (method, payment) {
                (PaymentMethod::Online, PaymentStatus::Paid) => LifecycleStatus::Confirmed,
                (PaymentMethod::Online, _) => LifecycleStatus::Pending,
                (PaymentMethod::CashOnDelivery, PaymentStatus::Paid) => LifecycleStatus::Completed,
                (PaymentMethod::CashOnDelivery, _) => LifecycleStatus::Confirmed,
            },
        }
    }

    // 空き判定をブロックするのは confirmed / completed のみ
    pub fn blocks_availability(&self) -> bool {
        matches!(self, LifecycleStatus::Confirmed | LifecycleStatus::Completed)
    }
}

// 台帳（Ledger）上の予約
#[derive(Debug, Clone)]
pub struct Booking {
    pub booking_id: BookingId,
    pub equipment_id: EquipmentId,
    pub renter_id: UserId,
    // 作成時点の機材オーナーを非正規化して保持する。
    // 以後の機材側のオーナー変更の影響を受けない
    pub owner_id: UserId,
    pub window: DateWindow,
    pub total_price: i64,
    pub owner_payout: i64,
    pub delivery_address: DeliveryAddress,
    pub payment_ref: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub approval_status: ApprovalStatus,
    pub approval_deadline: Option<DateTime<Utc>>,
    pub lifecycle_status: LifecycleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    // 決済確認済みのオンライン予約。作成と同時に confirmed になる
    pub fn from_paid_event(event: CreatePaidBooking, now: DateTime<Utc>) -> Self {
        let CreatePaidBooking {
            equipment_id,
            renter_id,
            owner_id,
            window,
            total_price,
            delivery_address,
            payment_ref,
        } = event;
        let method = PaymentMethod::Online;
        let payment = PaymentStatus::Paid;
        let approval = ApprovalStatus::NotApplicable;
        Self {
            booking_id: BookingId::new(),
            equipment_id,
            renter_id,
            owner_id,
            window,
            total_price,
            // プラットフォーム手数料を導入するまでは総額と同額
            owner_payout: total_price,
            delivery_address,
            payment_ref: Some(payment_ref),
            payment_method: method,
            payment_status: payment,
            approval_status: approval,
            approval_deadline: None,
            lifecycle_status: LifecycleStatus::derive(method, payment, approval),
            created_at: now,
            updated_at: now,
        }
    }

    // オーナー承認待ちの COD リクエスト
    pub fn from_cod_event(
        event: CreateCodRequest,
        approval_deadline: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        let CreateCodRequest {
            equipment_id,
            renter_id,
            owner_id,
            window,
            total_price,
            delivery_address,
        } = event;
        let method = PaymentMethod::CashOnDelivery;
        let payment = PaymentStatus::Pending;
        let approval = ApprovalStatus::PendingOwner;
        Self {
            booking_id: BookingId::new(),
            equipment_id,
            renter_id,
            owner_id,
            window,
            total_price,
            owner_payout: total_price,
            delivery_address,
            payment_ref: None,
            payment_method: method,
            payment_status: payment,
            approval_status: approval,
            approval_deadline: Some(approval_deadline),
            lifecycle_status: LifecycleStatus::derive(method, payment, approval),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn blocks_availability(&self) -> bool {
        self.lifecycle_status.blocks_availability()
    }

    // オーナー承認。承認待ち以外の状態からは受け付けない（単発・不可逆）
    pub fn approve(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        self.ensure_pending_owner()?;
        self.approval_status = ApprovalStatus::Approved;
        self.refresh_lifecycle(now);
        Ok(())
    }

    pub fn reject(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        self.ensure_pending_owner()?;
        self.approval_status = ApprovalStatus::Rejected;
        self.refresh_lifecycle(now);
        Ok(())
    }

    // COD の現金回収。日付ベースの完了（スイーパー）を待たずに完了へ進める
    pub fn mark_cod_paid(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        if self.payment_method != PaymentMethod::CashOnDelivery {
            return Err(AppError::WrongPaymentMethod(format!(
                "booking {} is not a cash-on-delivery booking",
                self.booking_id
            )));
        }
        self.payment_status = PaymentStatus::Paid;
        self.refresh_lifecycle(now);
        Ok(())
    }

    // 承認期限切れの COD リクエストをタイムアウト棄却する。
    // 期限内・承認済みのものには何もしない
    pub fn expire_approval(&mut self, now: DateTime<Utc>) -> bool {
        if self.approval_status != ApprovalStatus::PendingOwner {
            return false;
        }
        match self.approval_deadline {
            Some(deadline) if deadline < now => {
                self.approval_status = ApprovalStatus::Rejected;
                self.refresh_lifecycle(now);
                true
            }
            _ => false,
        }
    }

    // アーカイブ対象になる日時（終了日 + 猶予日数の翌日 0 時）
    pub fn archive_due_at(&self, grace_days: i64) -> DateTime<Utc> {
        (self.window.end + Duration::days(grace_days))
            .and_time(NaiveTime::MIN)
            .and_utc()
            + Duration::days(1)
    }

    fn ensure_pending_owner(&self) -> AppResult<()> {
        if self.approval_status != ApprovalStatus::PendingOwner {
            return Err(AppError::AlreadyDecided(format!(
                "booking {} has already received an owner decision",
                self.booking_id
            )));
        }
        Ok(())
    }

    fn refresh_lifecycle(&mut self, now: DateTime<Utc>) {
        self.lifecycle_status = LifecycleStatus::derive(
            self.payment_method,
            self.payment_status,
            self.approval_status,
        );
        self.updated_at = now;
    }
}

// アーカイブ（完了済みストア）のエントリ。書き込み後は不変
#[derive(Debug, Clone)]
pub struct CompletedBooking {
    pub booking_id: BookingId,
    pub equipment_id: EquipmentId,
    pub renter_id: UserId,
    pub owner_id: UserId,
    pub window: DateWindow,
    pub total_price: i64,
    pub owner_payout: i64,
    pub payment_ref: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub completed_at: DateTime<Utc>,
}

impl CompletedBooking {
    pub fn snapshot(booking: &Booking, completed_at: DateTime<Utc>) -> Self {
        Self {
            booking_id: booking.booking_id,
            equipment_id: booking.equipment_id,
            renter_id: booking.renter_id,
            owner_id: booking.owner_id,
            window: booking.window,
            total_price: booking.total_price,
            owner_payout: booking.owner_payout,
            payment_ref: booking.payment_ref.clone(),
            payment_method: booking.payment_method,
            payment_status: booking.payment_status,
            completed_at,
        }
    }
}

// 台帳とアーカイブを横断する読み取り用の型。
// 予約はどの時点でもどちらか一方にのみ存在する
#[derive(Debug, Clone)]
pub enum BookingRecord {
    Active(Booking),
    Archived(CompletedBooking),
}

impl BookingRecord {
    pub fn booking_id(&self) -> BookingId {
        match self {
            BookingRecord::Active(b) => b.booking_id,
            BookingRecord::Archived(c) => c.booking_id,
        }
    }

    pub fn equipment_id(&self) -> EquipmentId {
        match self {
            BookingRecord::Active(b) => b.equipment_id,
            BookingRecord::Archived(c) => c.equipment_id,
        }
    }

    pub fn renter_id(&self) -> UserId {
        match self {
            BookingRecord::Active(b) => b.renter_id,
            BookingRecord::Archived(c) => c.renter_id,
        }
    }

    pub fn owner_id(&self) -> UserId {
        match self {
            BookingRecord::Active(b) => b.owner_id,
            BookingRecord::Archived(c) => c.owner_id,
        }
    }

    pub fn paid_owner_payout(&self) -> i64 {
        let (status, payout) = match self {
            BookingRecord::Active(b) => (b.payment_status, b.owner_payout),
            BookingRecord::Archived(c) => (c.payment_status, c.owner_payout),
        };
        if status == PaymentStatus::Paid {
            payout
        } else {
            0
        }
    }
}

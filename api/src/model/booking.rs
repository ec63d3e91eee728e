use chrono::{DateTime, NaiveDate, Utc};
use garde::Validate;
use kernel::model::booking::event::OwnerDecision;
use kernel::model::booking::{
    ApprovalStatus, Booking, BookingRecord, DeliveryAddress, LifecycleStatus, PaymentMethod,
    PaymentStatus,
};
use kernel::model::id::{BookingId, EquipmentId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAvailabilityRequest {
    pub equipment_id: EquipmentId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub available: bool,
}

// 配送先住所。4 項目すべて必須
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddressRequest {
    #[garde(length(min = 1))]
    pub full_address: String,
    #[garde(length(min = 1))]
    pub city: String,
    #[garde(length(min = 1))]
    pub state: String,
    #[garde(length(min = 1))]
    pub postal_code: String,
}

impl From<DeliveryAddressRequest> for DeliveryAddress {
    fn from(value: DeliveryAddressRequest) -> Self {
        let DeliveryAddressRequest {
            full_address,
            city,
            state,
            postal_code,
        } = value;
        DeliveryAddress {
            full_address,
            city,
            state,
            postal_code,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaidBookingRequest {
    #[garde(skip)]
    pub equipment_id: EquipmentId,
    #[garde(skip)]
    pub renter_id: UserId,
    #[garde(skip)]
    pub start_date: NaiveDate,
    #[garde(skip)]
    pub end_date: NaiveDate,
    #[garde(range(min = 1))]
    pub total_price: i64,
    #[garde(dive)]
    pub delivery_address: DeliveryAddressRequest,
    // 外部の決済フローで検証済みの支払い参照
    #[garde(length(min = 1))]
    pub payment_ref: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCodRequestRequest {
    #[garde(skip)]
    pub equipment_id: EquipmentId,
    #[garde(skip)]
    pub renter_id: UserId,
    #[garde(skip)]
    pub start_date: NaiveDate,
    #[garde(skip)]
    pub end_date: NaiveDate,
    #[garde(range(min = 1))]
    pub total_price: i64,
    #[garde(dive)]
    pub delivery_address: DeliveryAddressRequest,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum OwnerDecisionRequest {
    Approve,
    Reject,
}

impl From<OwnerDecisionRequest> for OwnerDecision {
    fn from(value: OwnerDecisionRequest) -> Self {
        match value {
            OwnerDecisionRequest::Approve => OwnerDecision::Approve,
            OwnerDecisionRequest::Reject => OwnerDecision::Reject,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddressResponse {
    pub full_address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl From<DeliveryAddress> for DeliveryAddressResponse {
    fn from(value: DeliveryAddress) -> Self {
        let DeliveryAddress {
            full_address,
            city,
            state,
            postal_code,
        } = value;
        Self {
            full_address,
            city,
            state,
            postal_code,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub booking_id: BookingId,
    pub equipment_id: EquipmentId,
    pub renter_id: UserId,
    pub owner_id: UserId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_price: i64,
    pub owner_payout: i64,
    pub delivery_address: DeliveryAddressResponse,
    pub payment_ref: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub approval_status: ApprovalStatus,
    pub approval_deadline: Option<DateTime<Utc>>,
    pub lifecycle_status: LifecycleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(value: Booking) -> Self {
        let Booking {
            booking_id,
            equipment_id,
            renter_id,
            owner_id,
            window,
            total_price,
            owner_payout,
            delivery_address,
            payment_ref,
            payment_method,
            payment_status,
            approval_status,
            approval_deadline,
            lifecycle_status,
            created_at,
            updated_at,
        } = value;
        Self {
            booking_id,
            equipment_id,
            renter_id,
            owner_id,
            start_date: window.start,
            end_date: window.end,
            total_price,
            owner_payout,
            delivery_address: delivery_address.into(),
            payment_ref,
            payment_method,
            payment_status,
            approval_status,
            approval_deadline,
            lifecycle_status,
            created_at,
            updated_at,
        }
    }
}

// 台帳・アーカイブを問わない一覧表示用の要約。
// アーカイブ済みのエントリのみ completed_at を持つ
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummaryResponse {
    pub booking_id: BookingId,
    pub equipment_id: EquipmentId,
    pub renter_id: UserId,
    pub owner_id: UserId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_price: i64,
    pub owner_payout: i64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub lifecycle_status: LifecycleStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<BookingRecord> for BookingSummaryResponse {
    fn from(value: BookingRecord) -> Self {
        match value {
            BookingRecord::Active(b) => Self {
                booking_id: b.booking_id,
                equipment_id: b.equipment_id,
                renter_id: b.renter_id,
                owner_id: b.owner_id,
                start_date: b.window.start,
                end_date: b.window.end,
                total_price: b.total_price,
                owner_payout: b.owner_payout,
                payment_method: b.payment_method,
                payment_status: b.payment_status,
                lifecycle_status: b.lifecycle_status,
                completed_at: None,
            },
            BookingRecord::Archived(c) => Self {
                booking_id: c.booking_id,
                equipment_id: c.equipment_id,
                renter_id: c.renter_id,
                owner_id: c.owner_id,
                start_date: c.window.start,
                end_date: c.window.end,
                total_price: c.total_price,
                owner_payout: c.owner_payout,
                payment_method: c.payment_method,
                payment_status: c.payment_status,
                lifecycle_status: LifecycleStatus::Completed,
                completed_at: Some(c.completed_at),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingListResponse {
    pub items: Vec<BookingSummaryResponse>,
}

impl From<Vec<BookingRecord>> for BookingListResponse {
    fn from(value: Vec<BookingRecord>) -> Self {
        Self {
            items: value
                .into_iter()
                .map(BookingSummaryResponse::from)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerIncomeResponse {
    pub owner_id: UserId,
    pub total_income: i64,
}

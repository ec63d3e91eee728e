use derive_new::new;

use crate::model::booking::{DateWindow, DeliveryAddress};
use crate::model::id::{EquipmentId, UserId};

// 決済確認済みのオンライン予約を作成する。
// payment_ref は外部の決済ゲートウェイで検証済みの参照を受け取るだけで、
// エンジン自身はゲートウェイと通信しない
#[derive(new, Debug)]
pub struct CreatePaidBooking {
    pub equipment_id: EquipmentId,
    pub renter_id: UserId,
    pub owner_id: UserId,
    pub window: DateWindow,
    pub total_price: i64,
    pub delivery_address: DeliveryAddress,
    pub payment_ref: String,
}

// オーナー承認待ちの COD リクエストを作成する
#[derive(new, Debug)]
pub struct CreateCodRequest {
    pub equipment_id: EquipmentId,
    pub renter_id: UserId,
    pub owner_id: UserId,
    pub window: DateWindow,
    pub total_price: i64,
    pub delivery_address: DeliveryAddress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerDecision {
    Approve,
    Reject,
}

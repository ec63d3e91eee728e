use garde::Validate;
use kernel::model::booking::event::{CreateCodRequest, CreatePaidBooking};
use kernel::model::booking::DateWindow;
use kernel::model::equipment::Equipment;
use kernel::model::id::{BookingId, EquipmentId, UserId};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

use crate::model::booking::{
    AvailabilityResponse, BookingListResponse, BookingResponse, CheckAvailabilityRequest,
    CreateCodRequestRequest, CreatePaidBookingRequest, OwnerDecisionRequest, OwnerIncomeResponse,
};

// 空き確認（事前チェック）。
// ここでの結果は UX 向けで、最終判定は作成操作の内部で改めて行われる
pub async fn check_availability(
    registry: &AppRegistry,
    req: CheckAvailabilityRequest,
) -> AppResult<AvailabilityResponse> {
    let window = DateWindow::new(req.start_date, req.end_date)?;

    registry
        .booking_repository()
        .is_available(req.equipment_id, window)
        .await
        .map(|available| AvailabilityResponse { available })
}

// 決済確認済みのオンライン予約を作成する
pub async fn create_paid_booking(
    registry: &AppRegistry,
    req: CreatePaidBookingRequest,
) -> AppResult<BookingResponse> {
    req.validate(&())?;
    let window = DateWindow::new(req.start_date, req.end_date)?;

    let equipment = resolve_equipment(registry, req.equipment_id).await?;
    ensure_not_owner(&equipment, req.renter_id)?;
    ensure_advisory_availability(registry, req.equipment_id, window).await?;

    let event = CreatePaidBooking::new(
        req.equipment_id,
        req.renter_id,
        equipment.owner_id,
        window,
        req.total_price,
        req.delivery_address.into(),
        req.payment_ref,
    );

    registry
        .booking_repository()
        .create_paid(event)
        .await
        .map(BookingResponse::from)
}

// COD リクエストを作成する（オーナー承認待ちで開始）
pub async fn create_cod_request(
    registry: &AppRegistry,
    req: CreateCodRequestRequest,
) -> AppResult<BookingResponse> {
    req.validate(&())?;
    let window = DateWindow::new(req.start_date, req.end_date)?;

    let equipment = resolve_equipment(registry, req.equipment_id).await?;
    ensure_not_owner(&equipment, req.renter_id)?;
    ensure_advisory_availability(registry, req.equipment_id, window).await?;

    let event = CreateCodRequest::new(
        req.equipment_id,
        req.renter_id,
        equipment.owner_id,
        window,
        req.total_price,
        req.delivery_address.into(),
    );

    registry
        .booking_repository()
        .create_cod_request(event)
        .await
        .map(BookingResponse::from)
}

pub async fn owner_decide(
    registry: &AppRegistry,
    booking_id: BookingId,
    decision: OwnerDecisionRequest,
) -> AppResult<BookingResponse> {
    registry
        .booking_repository()
        .decide(booking_id, decision.into())
        .await
        .map(BookingResponse::from)
}

pub async fn mark_cod_paid(
    registry: &AppRegistry,
    booking_id: BookingId,
) -> AppResult<BookingResponse> {
    registry
        .booking_repository()
        .mark_cod_paid(booking_id)
        .await
        .map(BookingResponse::from)
}

pub async fn list_by_renter(
    registry: &AppRegistry,
    renter_id: UserId,
) -> AppResult<BookingListResponse> {
    registry
        .booking_repository()
        .find_by_renter(renter_id)
        .await
        .map(BookingListResponse::from)
}

pub async fn list_by_owner(
    registry: &AppRegistry,
    owner_id: UserId,
) -> AppResult<BookingListResponse> {
    registry
        .booking_repository()
        .find_by_owner(owner_id)
        .await
        .map(BookingListResponse::from)
}

// 機材ごとの予約履歴（台帳とアーカイブを横断）
pub async fn equipment_history(
    registry: &AppRegistry,
    equipment_id: EquipmentId,
) -> AppResult<BookingListResponse> {
    registry
        .booking_repository()
        .find_history_by_equipment_id(equipment_id)
        .await
        .map(BookingListResponse::from)
}

pub async fn owner_income(
    registry: &AppRegistry,
    owner_id: UserId,
) -> AppResult<OwnerIncomeResponse> {
    registry
        .booking_repository()
        .owner_income(owner_id)
        .await
        .map(|total_income| OwnerIncomeResponse {
            owner_id,
            total_income,
        })
}

async fn resolve_equipment(
    registry: &AppRegistry,
    equipment_id: EquipmentId,
) -> AppResult<Equipment> {
    registry
        .equipment_repository()
        .find_by_id(equipment_id)
        .await?
        .ok_or_else(|| AppError::EntityNotFound(format!("equipment {equipment_id} was not found")))
}

fn ensure_not_owner(equipment: &Equipment, renter_id: UserId) -> AppResult<()> {
    if equipment.owner_id == renter_id {
        return Err(AppError::Forbidden(
            "owners cannot rent their own equipment".into(),
        ));
    }
    Ok(())
}

async fn ensure_advisory_availability(
    registry: &AppRegistry,
    equipment_id: EquipmentId,
    window: DateWindow,
) -> AppResult<()> {
    let available = registry
        .booking_repository()
        .is_available(equipment_id, window)
        .await?;
    if !available {
        return Err(AppError::Conflict(format!(
            "equipment {equipment_id} is already booked for the requested dates"
        )));
    }
    Ok(())
}

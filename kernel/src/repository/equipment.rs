use async_trait::async_trait;
use shared::error::AppResult;

use crate::model::equipment::Equipment;
use crate::model::id::EquipmentId;

// 機材ディレクトリ（外部コラボレーター）への狭いインターフェース。
// 予約エンジンは find_by_id しか呼ばない。register は起動時・テストでの
// 初期投入用で、予約経路からディレクトリを変更することはない
#[async_trait]
pub trait EquipmentRepository: Send + Sync {
    async fn register(&self, equipment: Equipment) -> AppResult<()>;
    async fn find_by_id(&self, equipment_id: EquipmentId) -> AppResult<Option<Equipment>>;
}

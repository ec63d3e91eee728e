use crate::model::id::{EquipmentId, UserId};

// 機材カタログは外部コラボレーター。
// 予約エンジンは存在確認とオーナー ID の参照にのみ使う
#[derive(Debug, Clone)]
pub struct Equipment {
    pub equipment_id: EquipmentId,
    pub owner_id: UserId,
    pub equipment_name: String,
}

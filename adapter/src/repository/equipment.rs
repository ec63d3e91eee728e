use std::collections::HashMap;

use async_trait::async_trait;
use kernel::model::equipment::Equipment;
use kernel::model::id::EquipmentId;
use kernel::repository::equipment::EquipmentRepository;
use shared::error::AppResult;
use tokio::sync::RwLock;

// インメモリの機材ディレクトリ。
// 予約エンジンからは読み取り専用で、register は初期投入にのみ使う
#[derive(Default)]
pub struct EquipmentRepositoryImpl {
    directory: RwLock<HashMap<EquipmentId, Equipment>>,
}

impl EquipmentRepositoryImpl {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EquipmentRepository for EquipmentRepositoryImpl {
    async fn register(&self, equipment: Equipment) -> AppResult<()> {
        let mut directory = self.directory.write().await;
        directory.insert(equipment.equipment_id, equipment);
        Ok(())
    }

    async fn find_by_id(&self, equipment_id: EquipmentId) -> AppResult<Option<Equipment>> {
        let directory = self.directory.read().await;
        Ok(directory.get(&equipment_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use kernel::model::id::UserId;

    use super::*;

    #[tokio::test]
    async fn registered_equipment_is_resolvable() {
        let repo = EquipmentRepositoryImpl::new();
        let equipment_id = EquipmentId::new();
        repo.register(Equipment {
            equipment_id,
            owner_id: UserId::new(),
            equipment_name: "excavator".into(),
        })
        .await
        .unwrap();

        assert!(repo.find_by_id(equipment_id).await.unwrap().is_some());
        assert!(repo.find_by_id(EquipmentId::new()).await.unwrap().is_none());
    }
}

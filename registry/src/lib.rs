use std::sync::Arc;

use adapter::repository::booking::BookingRepositoryImpl;
use adapter::repository::equipment::EquipmentRepositoryImpl;
use adapter::store::BookingStore;
use kernel::repository::booking::BookingRepository;
use kernel::repository::equipment::EquipmentRepository;
use shared::config::AppConfig;

#[derive(Clone)]
pub struct AppRegistry {
    app_config: Arc<AppConfig>,
    booking_repository: Arc<dyn BookingRepository>,
    equipment_repository: Arc<dyn EquipmentRepository>,
}

impl AppRegistry {
    pub fn new(store: BookingStore, app_config: AppConfig) -> Self {
        let booking_repository = Arc::new(BookingRepositoryImpl::new(
            store,
            app_config.sweeper.approval_ttl_hours,
            app_config.sweeper.grace_days,
        ));
        let equipment_repository = Arc::new(EquipmentRepositoryImpl::new());
        Self {
            app_config: Arc::new(app_config),
            booking_repository,
            equipment_repository,
        }
    }

    pub fn app_config(&self) -> Arc<AppConfig> {
        self.app_config.clone()
    }

    pub fn booking_repository(&self) -> Arc<dyn BookingRepository> {
        self.booking_repository.clone()
    }

    pub fn equipment_repository(&self) -> Arc<dyn EquipmentRepository> {
        self.equipment_repository.clone()
    }
}

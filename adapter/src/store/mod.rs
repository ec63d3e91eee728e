use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use kernel::model::booking::{Booking, CompletedBooking};
use kernel::model::id::BookingId;
use shared::config::StorageConfig;
use shared::error::{AppError, AppResult};
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::{sleep, timeout};

// 台帳とアーカイブを 1 つのロックで保護する共有ストア。
// 空き確認→挿入の列や、1 予約ぶんの移送が同一クリティカルセクションに
// 収まることで、予約がどの時点でも片方のストアにのみ存在して見える
#[derive(Default)]
pub struct StoreInner {
    pub ledger: HashMap<BookingId, Booking>,
    pub archive: HashMap<BookingId, CompletedBooking>,
}

#[derive(Clone)]
pub struct BookingStore {
    inner: Arc<Mutex<StoreInner>>,
    lock_timeout: Duration,
    lock_retries: u32,
    retry_backoff: Duration,
}

impl BookingStore {
    pub fn new(cfg: &StorageConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner::default())),
            lock_timeout: Duration::from_millis(cfg.lock_timeout_millis),
            lock_retries: cfg.lock_retries,
            retry_backoff: Duration::from_millis(cfg.retry_backoff_millis),
        }
    }

    // ロック取得には必ず上限時間を設ける。無期限に待たず Unavailable を返す
    pub async fn lock(&self) -> AppResult<MutexGuard<'_, StoreInner>> {
        timeout(self.lock_timeout, self.inner.lock())
            .await
            .map_err(|_| AppError::Unavailable("booking store lock timed out".into()))
    }

    // 一時的な取得失敗は規定回数までバックオフしながらリトライし、
    // 使い切ったら Unavailable をそのまま呼び出し側へ返す
    pub async fn lock_with_retries(&self) -> AppResult<MutexGuard<'_, StoreInner>> {
        let mut attempts: u32 = 0;
        loop {
            match self.lock().await {
                Ok(guard) => return Ok(guard),
                Err(e) if e.is_transient() && attempts < self.lock_retries => {
                    attempts += 1;
                    tracing::warn!(
                        error = %e,
                        attempts,
                        "retrying booking store lock acquisition"
                    );
                    sleep(self.retry_backoff * attempts).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub sweeper: SweeperConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        Ok(Self {
            storage: StorageConfig::from_env()?,
            sweeper: SweeperConfig::from_env()?,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            sweeper: SweeperConfig::default(),
        }
    }
}

// ストレージ（台帳ストア）アクセスの設定。
// ロック取得はタイムアウト付きで、規定回数までバックオフしながらリトライする
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub lock_timeout_millis: u64,
    pub lock_retries: u32,
    pub retry_backoff_millis: u64,
}

impl StorageConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            lock_timeout_millis: env_or("STORAGE_LOCK_TIMEOUT_MILLIS", 3000)?,
            lock_retries: env_or("STORAGE_LOCK_RETRIES", 3)?,
            retry_backoff_millis: env_or("STORAGE_RETRY_BACKOFF_MILLIS", 100)?,
        })
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            lock_timeout_millis: 3000,
            lock_retries: 3,
            retry_backoff_millis: 100,
        }
    }
}

// 照合スイーパーと COD 承認まわりの設定
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    // スイーパーの実行間隔（秒）
    pub tick_seconds: u64,
    // レンタル終了日からアーカイブ対象になるまでの猶予日数
    pub grace_days: i64,
    // COD リクエストの承認期限（時間）
    pub approval_ttl_hours: i64,
}

impl SweeperConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            tick_seconds: env_or("SWEEPER_TICK_SECONDS", 60)?,
            grace_days: env_or("SWEEPER_GRACE_DAYS", 1)?,
            approval_ttl_hours: env_or("COD_APPROVAL_TTL_HOURS", 24)?,
        })
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            tick_seconds: 60,
            grace_days: 1,
            approval_ttl_hours: 24,
        }
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(v) => v
            .parse()
            .with_context(|| format!("failed to parse environment variable {key}")),
    }
}

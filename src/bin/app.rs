use adapter::store::BookingStore;
use anyhow::Result;
use api::handler::sweep::run_sweeper;
use registry::AppRegistry;
use shared::config::AppConfig;
use shared::env::{which, Environment};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_logger()?;
    bootstrap().await
}

fn init_logger() -> Result<()> {
    let log_level = match which() {
        Environment::Development => "debug",
        Environment::Production => "info",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| log_level.into());

    let subscriber = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_target(false);

    tracing_subscriber::registry()
        .with(subscriber)
        .with(env_filter)
        .try_init()?;

    Ok(())
}

async fn bootstrap() -> Result<()> {
    let app_config = AppConfig::new()?;
    let store = BookingStore::new(&app_config.storage);

    let registry = AppRegistry::new(store, app_config);

    tracing::info!(
        tick_seconds = registry.app_config().sweeper.tick_seconds,
        grace_days = registry.app_config().sweeper.grace_days,
        "booking engine started, running reconciliation sweeper"
    );

    // 予約操作はトランスポート層（スコープ外）から registry 経由で届く。
    // このプロセス自体は照合スイーパーを回し続ける
    run_sweeper(registry).await;

    Ok(())
}

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use taskboard::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let cfg = Config::from_env()?;
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "taskboard",
        "taskboard starting: RUST_LOG='{}', port={}, environment={:?}, token_ttl={}s, admin_bootstrap={}",
        rust_log, cfg.port, cfg.environment, cfg.token_ttl.as_secs(), cfg.admin.is_some()
    );

    taskboard::server::run(cfg).await
}

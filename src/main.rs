use std::sync::Arc;

use minihttp::config::Config;
use minihttp::routing::Registry;
use minihttp::{server, webapp};
use tracing_subscriber::EnvFilter;

fn build_registry(cfg: &Config) -> anyhow::Result<Registry> {
    Ok(Registry::builder(&cfg.static_files.root)
        .not_found_page(&cfg.static_files.not_found_page)
        .mime_table(cfg.mime_table()?)
        .routes(webapp::routes(&cfg.storage)?)
        .build())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let registry = Arc::new(build_registry(&cfg)?);

    tokio::select! {
        res = server::listener::run(&cfg, registry) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

//! `stockconf-migrate`: create the PostgreSQL schema if it is missing.

use anyhow::Context;

use stockconf_infra::{PostgresStore, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env().context("invalid configuration")?;
    stockconf_observability::tracing::init(settings.log_format);

    let url = settings.require_database_url()?;
    let store = PostgresStore::connect(url, settings.max_connections)
        .await
        .context("failed to connect to the database")?;
    store.apply_schema().await.context("failed to apply schema")?;

    tracing::info!("database schema is up to date");
    Ok(())
}

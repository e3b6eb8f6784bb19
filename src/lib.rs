pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use crate::core::config::{PersistenceMode, Settings};
use crate::core::{state::AppState, telemetry};
use crate::repositories::memory::MemoryRepository;
use crate::repositories::postgres::PgRepository;
use crate::repositories::DynRepository;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let repo = build_repository(&settings).await?;
    let state = AppState::new(settings, repo);

    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        backend = %state.backend().as_str(),
        "TestHub API listening"
    );

    axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await?;

    Ok(())
}

/// Picks the repository backend at startup. In `Auto` mode a broken database
/// connection degrades to the non-durable in-memory store instead of aborting.
async fn build_repository(settings: &Settings) -> anyhow::Result<DynRepository> {
    match settings.persistence().mode {
        PersistenceMode::Memory => {
            tracing::info!("Using in-memory repository");
            Ok(Arc::new(MemoryRepository::new()))
        }
        PersistenceMode::Postgres => {
            let repo = connect_postgres(settings).await?;
            Ok(Arc::new(repo))
        }
        PersistenceMode::Auto => match connect_postgres(settings).await {
            Ok(repo) => Ok(Arc::new(repo)),
            Err(err) => {
                tracing::error!(
                    error = %format!("{err:#}"),
                    "Database unavailable; falling back to in-memory repository"
                );
                Ok(Arc::new(MemoryRepository::new()))
            }
        },
    }
}

async fn connect_postgres(settings: &Settings) -> anyhow::Result<PgRepository> {
    let pool = db::init_pool(settings).await?;
    db::run_migrations(&pool).await?;
    tracing::info!("Database connected and migrated");
    Ok(PgRepository::new(pool))
}

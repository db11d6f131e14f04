//! # footfall-db
//!
//! The durable store (spec.md §4.3): devices, verified submission records,
//! and derived pet state. Backed by `sqlx::AnyPool`, which accepts either a
//! `sqlite://` path (the default — zero external services) or a
//! `postgres://` URL, mirroring the dual-backend pattern the rest of this
//! stack's ecosystem uses for "works standalone, scales to Postgres."

pub mod repository;

use anyhow::Result;
use footfall_common::config::AppConfig;

/// Which backing store is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbBackend {
    Postgres,
    Sqlite,
}

impl DbBackend {
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("sqlite://") || url.starts_with("sqlite:") {
            DbBackend::Sqlite
        } else {
            DbBackend::Postgres
        }
    }
}

/// Shared database handle passed into the gateway, batch submitter, and pet
/// orchestrator.
#[derive(Clone)]
pub struct Database {
    pub pool: sqlx::AnyPool,
    pub backend: DbBackend,
}

impl Database {
    /// Connect using `config.database.path`.
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let backend = DbBackend::from_url(&config.database.path);

        let pool = match backend {
            DbBackend::Postgres => {
                tracing::info!("connecting to PostgreSQL");
                sqlx::any::AnyPoolOptions::new()
                    .max_connections(config.database.max_connections)
                    .min_connections(config.database.min_connections)
                    .connect(&config.database.path)
                    .await?
            }
            DbBackend::Sqlite => {
                tracing::info!(path = %config.database.path, "connecting to SQLite");
                sqlx::any::AnyPoolOptions::new()
                    .max_connections(1)
                    .min_connections(1)
                    .connect(&config.database.path)
                    .await?
            }
        };

        Ok(Self { pool, backend })
    }

    /// Connect directly to an arbitrary URL, bypassing global config. Used
    /// by tests that spin up an isolated in-memory SQLite pool.
    pub async fn connect_url(url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();
        let backend = DbBackend::from_url(url);
        let pool = sqlx::any::AnyPoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .connect(url)
            .await?;
        Ok(Self { pool, backend })
    }

    /// Run migrations appropriate for the active backend.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("running database migrations");
        match self.backend {
            DbBackend::Postgres => {
                sqlx::migrate!("./migrations").run(&self.pool).await?;
            }
            DbBackend::Sqlite => {
                sqlx::migrate!("./migrations-lite").run(&self.pool).await?;
            }
        }
        tracing::info!("migrations complete");
        Ok(())
    }

    /// Lightweight liveness probe for the health endpoint.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

pub mod dto;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use error::{EngineError, Result, StorageError, StorageResult};
pub use repository::{EventRepository, InMemoryRepository, PgRepository};
pub use services::AggregationFacade;

/// Postgres connection pool plus the embedded schema migrations.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> StorageResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn repository(&self) -> PgRepository {
        PgRepository::new(self.pool.clone())
    }
}

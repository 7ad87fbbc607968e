//! Rotation state persistence.
//!
//! Stores never fail the caller: reads fall back to the default state and
//! writes report failure through [`WriteOutcome`]. Both outcomes say what
//! happened so callers and tests can tell a first run from a recovery.

pub mod file;
pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{StateBackend, StateConfig};
use crate::db;
use crate::error::{AppError, AppResult};
use crate::models::RotationState;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;
pub use postgres::PgStateStore;

/// Result of reading the rotation state
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// A stored record was found and decoded
    Loaded(RotationState),
    /// Nothing stored yet
    Missing,
    /// The record was unreadable or corrupt; the default state applies
    Recovered { reason: String },
}

impl ReadOutcome {
    /// The effective state, defaulting when nothing usable was stored
    pub fn into_state(self) -> RotationState {
        match self {
            ReadOutcome::Loaded(state) => state,
            ReadOutcome::Missing | ReadOutcome::Recovered { .. } => RotationState::default(),
        }
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self, ReadOutcome::Recovered { .. })
    }
}

/// Result of writing the rotation state
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    Persisted,
    Failed { reason: String },
}

impl WriteOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, WriteOutcome::Persisted)
    }
}

/// Durable single-record key-value store for the rotation state
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Reads the stored state. Never fails.
    async fn read(&self) -> ReadOutcome;

    /// Replaces the stored state. Readers never observe a partial record.
    async fn write(&self, state: &RotationState) -> WriteOutcome;

    /// Whether the backing storage is currently usable
    async fn health_check(&self) -> bool {
        !self.read().await.is_recovered()
    }

    /// Short human-readable location, e.g. `file:city_tweet_log.json`
    fn describe(&self) -> String;
}

/// Opens the configured state store, connecting and migrating the database if needed
pub async fn open(config: &StateConfig) -> AppResult<Arc<dyn StateStore>> {
    match config.backend {
        StateBackend::File => Ok(Arc::new(FileStateStore::new(&config.file_path))),
        StateBackend::Postgres => {
            let database = config.database.as_ref().ok_or_else(|| {
                AppError::Internal("postgres state backend selected without DATABASE_URL".into())
            })?;
            let pool = db::create_pool(database).await?;
            db::run_migrations(&pool).await?;
            Ok(Arc::new(PgStateStore::new(pool)))
        }
    }
}

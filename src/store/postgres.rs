//! PostgreSQL backend: a single-row `rotation_state` table, upserted in one
//! statement per write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{ReadOutcome, StateStore, WriteOutcome};
use crate::db::{self, DbPool};
use crate::models::RotationState;

#[derive(Debug, FromRow)]
struct RotationRow {
    last_posted_city: Option<String>,
    last_clear_time: Option<DateTime<Utc>>,
}

pub struct PgStateStore {
    pool: DbPool,
}

impl PgStateStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StateStore for PgStateStore {
    async fn read(&self) -> ReadOutcome {
        let row = sqlx::query_as::<_, RotationRow>(
            "SELECT last_posted_city, last_clear_time FROM rotation_state WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await;

        match row {
            Ok(Some(row)) => ReadOutcome::Loaded(RotationState {
                last_posted_city: row.last_posted_city,
                last_clear_time: row.last_clear_time,
            }),
            Ok(None) => ReadOutcome::Missing,
            Err(e) => {
                log::error!("Error reading rotation state: {}. Starting with empty state.", e);
                ReadOutcome::Recovered {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn write(&self, state: &RotationState) -> WriteOutcome {
        let result = sqlx::query(
            r#"
            INSERT INTO rotation_state (id, last_posted_city, last_clear_time, updated_at)
            VALUES (1, $1, $2, NOW())
            ON CONFLICT (id) DO UPDATE
            SET last_posted_city = EXCLUDED.last_posted_city,
                last_clear_time = EXCLUDED.last_clear_time,
                updated_at = NOW()
            "#,
        )
        .bind(state.last_posted_city.as_deref())
        .bind(state.last_clear_time)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => WriteOutcome::Persisted,
            Err(e) => {
                log::error!("Error writing rotation state: {}", e);
                WriteOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn health_check(&self) -> bool {
        db::health_check(&self.pool).await
    }

    fn describe(&self) -> String {
        "postgres:rotation_state".to_string()
    }
}

//! Run output storage. Every run pushes exactly one record.

use std::collections::{HashMap, VecDeque};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::run::RunResultRow;
use crate::output::RunOutput;

/// A pushed run output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRun {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub output: RunOutput,
}

impl StoredRun {
    pub fn new(run_id: Uuid, output: RunOutput) -> Self {
        Self {
            run_id,
            created_at: Utc::now(),
            output,
        }
    }
}

#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn push(&self, run: &StoredRun) -> Result<()>;

    async fn fetch(&self, run_id: Uuid) -> Result<Option<StoredRun>>;
}

/// Postgres-backed sink: one row per run in `run_results`.
pub struct PgResultSink {
    pool: PgPool,
}

impl PgResultSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResultSink for PgResultSink {
    async fn push(&self, run: &StoredRun) -> Result<()> {
        let output = serde_json::to_value(&run.output)?;
        sqlx::query(
            r#"
            INSERT INTO run_results (run_id, output, is_error, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(run.run_id)
        .bind(output)
        .bind(run.output.is_error())
        .bind(run.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch(&self, run_id: Uuid) -> Result<Option<StoredRun>> {
        let row: Option<RunResultRow> = sqlx::query_as(
            "SELECT run_id, output, is_error, created_at FROM run_results WHERE run_id = $1",
        )
        .bind(run_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<StoredRun> {
            let output: RunOutput = serde_json::from_value(row.output)
                .with_context(|| format!("stored output for run {} is malformed", row.run_id))?;
            if output.is_error() != row.is_error {
                warn!("Run {}: is_error column disagrees with stored output", row.run_id);
            }
            Ok(StoredRun {
                run_id: row.run_id,
                created_at: row.created_at,
                output,
            })
        })
        .transpose()
    }
}

/// Runs kept by `MemoryResultSink::new` before the oldest are evicted.
pub const DEFAULT_MEMORY_CAPACITY: usize = 1000;

/// In-process sink used when no database is configured.
/// Holds at most `capacity` runs; pushing past that evicts the oldest run.
pub struct MemoryResultSink {
    capacity: usize,
    runs: RwLock<MemoryRuns>,
}

#[derive(Default)]
struct MemoryRuns {
    by_id: HashMap<Uuid, StoredRun>,
    order: VecDeque<Uuid>,
}

impl MemoryResultSink {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            runs: RwLock::new(MemoryRuns::default()),
        }
    }
}

impl Default for MemoryResultSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultSink for MemoryResultSink {
    async fn push(&self, run: &StoredRun) -> Result<()> {
        let mut runs = self.runs.write().await;
        if runs.by_id.insert(run.run_id, run.clone()).is_none() {
            runs.order.push_back(run.run_id);
        }
        while runs.order.len() > self.capacity {
            if let Some(oldest) = runs.order.pop_front() {
                runs.by_id.remove(&oldest);
                debug!("Evicted run {oldest} from the in-memory sink");
            }
        }
        Ok(())
    }

    async fn fetch(&self, run_id: Uuid) -> Result<Option<StoredRun>> {
        Ok(self.runs.read().await.by_id.get(&run_id).cloned())
    }
}

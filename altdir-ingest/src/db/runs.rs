//! Ingest run records
//!
//! Every batch run leaves a row behind: `running` while in progress, then
//! `completed` with its summary or `aborted` with the fatal error.

use altdir_common::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::parse_guid;
use crate::models::RunSummary;
use crate::utils::retry_on_lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Running,
    Completed,
    Aborted,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Aborted => "aborted",
        }
    }

    fn parse(value: &str) -> Result<Self> {
        match value {
            "running" => Ok(RunState::Running),
            "completed" => Ok(RunState::Completed),
            "aborted" => Ok(RunState::Aborted),
            other => Err(Error::Internal(format!("Unknown run state '{}'", other))),
        }
    }
}

/// Persisted record of one batch run
#[derive(Debug, Clone)]
pub struct IngestRun {
    pub run_id: Uuid,
    pub batch_name: String,
    pub state: RunState,
    pub summary: Option<RunSummary>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Record the start of a run
pub async fn start_run(pool: &SqlitePool, batch_name: &str, max_wait_ms: u64) -> Result<Uuid> {
    let run_id = Uuid::new_v4();
    let run_id_str = run_id.to_string();
    let started_at = Utc::now().to_rfc3339();

    retry_on_lock("start_run", max_wait_ms, || async {
        sqlx::query(
            r#"
            INSERT INTO ingest_runs (run_id, batch_name, state, started_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&run_id_str)
        .bind(batch_name)
        .bind(RunState::Running.as_str())
        .bind(&started_at)
        .execute(pool)
        .await?;

        Ok::<(), Error>(())
    })
    .await?;

    Ok(run_id)
}

/// Mark a run completed and store its summary
pub async fn finish_run(
    pool: &SqlitePool,
    run_id: Uuid,
    summary: &RunSummary,
    max_wait_ms: u64,
) -> Result<()> {
    let summary_json = serde_json::to_string(summary)
        .map_err(|e| Error::Internal(format!("Failed to serialize run summary: {}", e)))?;

    end_run(pool, run_id, RunState::Completed, Some(summary_json), None, max_wait_ms).await
}

/// Mark a run aborted with the error that stopped it
pub async fn abort_run(pool: &SqlitePool, run_id: Uuid, error: &str, max_wait_ms: u64) -> Result<()> {
    end_run(
        pool,
        run_id,
        RunState::Aborted,
        None,
        Some(error.to_string()),
        max_wait_ms,
    )
    .await
}

async fn end_run(
    pool: &SqlitePool,
    run_id: Uuid,
    state: RunState,
    summary: Option<String>,
    error: Option<String>,
    max_wait_ms: u64,
) -> Result<()> {
    let run_id_str = run_id.to_string();
    let ended_at = Utc::now().to_rfc3339();

    retry_on_lock("end_run", max_wait_ms, || async {
        let result = sqlx::query(
            r#"
            UPDATE ingest_runs
            SET state = ?, summary = ?, error = ?, ended_at = ?
            WHERE run_id = ?
            "#,
        )
        .bind(state.as_str())
        .bind(&summary)
        .bind(&error)
        .bind(&ended_at)
        .bind(&run_id_str)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("ingest run {}", run_id_str)));
        }
        Ok::<(), Error>(())
    })
    .await
}

/// Most recent runs first
pub async fn list_recent_runs(pool: &SqlitePool, limit: u32) -> Result<Vec<IngestRun>> {
    let rows = sqlx::query(
        r#"
        SELECT run_id, batch_name, state, summary, error, started_at, ended_at
        FROM ingest_runs
        ORDER BY started_at DESC, rowid DESC
        LIMIT ?
        "#,
    )
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    let mut runs = Vec::with_capacity(rows.len());
    for row in rows {
        let run_id: String = row.get("run_id");
        let state: String = row.get("state");

        let summary: Option<String> = row.get("summary");
        let summary = summary
            .map(|json| serde_json::from_str::<RunSummary>(&json))
            .transpose()
            .map_err(|e| Error::Internal(format!("Failed to deserialize run summary: {}", e)))?;

        let started_at: String = row.get("started_at");
        let ended_at: Option<String> = row.get("ended_at");

        runs.push(IngestRun {
            run_id: parse_guid(&run_id)?,
            batch_name: row.get("batch_name"),
            state: RunState::parse(&state)?,
            summary,
            error: row.get("error"),
            started_at: parse_timestamp(&started_at)?,
            ended_at: ended_at.as_deref().map(parse_timestamp).transpose()?,
        });
    }

    Ok(runs)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse timestamp '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use altdir_common::db::init_memory_database;

    #[tokio::test]
    async fn test_run_lifecycle() {
        let pool = init_memory_database().await.unwrap();

        let run_id = start_run(&pool, "office-suites", 1000).await.unwrap();
        let runs = list_recent_runs(&pool, 10).await.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].state, RunState::Running);
        assert!(runs[0].ended_at.is_none());

        let mut summary = RunSummary::new("office-suites");
        summary.alternatives_created = 3;
        finish_run(&pool, run_id, &summary, 1000).await.unwrap();

        let runs = list_recent_runs(&pool, 10).await.unwrap();
        assert_eq!(runs[0].state, RunState::Completed);
        assert_eq!(runs[0].summary.as_ref().unwrap().alternatives_created, 3);
        assert!(runs[0].ended_at.is_some());
    }

    #[tokio::test]
    async fn test_abort_records_error() {
        let pool = init_memory_database().await.unwrap();

        let run_id = start_run(&pool, "dev-tools", 1000).await.unwrap();
        abort_run(&pool, run_id, "pool closed", 1000).await.unwrap();

        let runs = list_recent_runs(&pool, 10).await.unwrap();
        assert_eq!(runs[0].state, RunState::Aborted);
        assert_eq!(runs[0].error.as_deref(), Some("pool closed"));
        assert!(runs[0].summary.is_none());
    }

    #[tokio::test]
    async fn test_finishing_unknown_run_is_not_found() {
        let pool = init_memory_database().await.unwrap();

        let err = finish_run(&pool, Uuid::new_v4(), &RunSummary::new("x"), 1000)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}

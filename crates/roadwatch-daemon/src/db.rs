use anyhow::{Context, Result};
use roadwatch_core::{
    EpochMs, ErrorOutcome, HazardRecord, HazardStatus, Id, Judgment, RejectedOutcome,
    VerifiedOutcome,
};
use serde::Serialize;
use std::path::Path;

use surrealdb::engine::local::{Db as LocalDb, Mem, SurrealKv};
use surrealdb::Surreal;

pub type SurrealDb = Surreal<LocalDb>;

/// Record store: one mutable `hazard` table plus three append-only
/// outcome tables (`hazard_verified`, `hazard_rejected`, `hazard_error`).
#[derive(Clone)]
pub struct Db {
    inner: SurrealDb,
}

impl Db {
    pub async fn connect(db_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(db_dir)
            .with_context(|| format!("creating db_dir {}", db_dir.display()))?;

        let db_path = db_dir
            .to_str()
            .context("db_dir must be valid utf-8")?
            .to_string();

        let inner = Surreal::new::<SurrealKv>(db_path)
            .await
            .context("connecting to embedded SurrealKV")?;

        inner
            .use_ns("roadwatch")
            .use_db("main")
            .await
            .context("selecting surreal namespace/db")?;

        Ok(Self { inner })
    }

    /// In-memory engine, used by tests.
    pub async fn connect_memory() -> Result<Self> {
        let inner = Surreal::new::<Mem>(())
            .await
            .context("connecting to in-memory surreal engine")?;
        inner
            .use_ns("roadwatch")
            .use_db("main")
            .await
            .context("selecting surreal namespace/db")?;
        Ok(Self { inner })
    }

    pub async fn bootstrap_schema(&self) -> Result<()> {
        let schema = include_str!("../schema.surql");
        self.inner
            .query(schema)
            .await
            .context("applying schema")?
            .check()
            .context("schema statements")?;
        Ok(())
    }

    pub fn inner(&self) -> &SurrealDb {
        &self.inner
    }

    pub async fn create_hazard(&self, record: &HazardRecord) -> Result<()> {
        self.inner
            .query("CREATE type::thing('hazard', $id) CONTENT $rec RETURN NONE;")
            .bind(("id", record.id.clone()))
            .bind(("rec", content_without_id(record)?))
            .await?
            .check()
            .context("creating hazard record")?;
        Ok(())
    }

    pub async fn get_hazard(&self, id: &str) -> Result<Option<HazardRecord>> {
        let mut res = self
            .inner
            .query(
                "SELECT *, record::id(id) AS id FROM hazard \
                 WHERE id = type::thing('hazard', $id) LIMIT 1;",
            )
            .bind(("id", id.to_string()))
            .await?;
        let record: Option<HazardRecord> = res.take(0)?;
        Ok(record)
    }

    /// Pending records created before `cutoff_ms`, oldest first. Used by
    /// the watcher to re-trigger stale invocations.
    pub async fn list_pending_before(&self, cutoff_ms: EpochMs) -> Result<Vec<HazardRecord>> {
        let mut res = self
            .inner
            .query(
                "SELECT *, record::id(id) AS id FROM hazard \
                 WHERE status = $status AND created_ms < $cutoff \
                 ORDER BY created_ms ASC;",
            )
            .bind(("status", HazardStatus::Pending))
            .bind(("cutoff", cutoff_ms))
            .await?;
        let records: Vec<HazardRecord> = res.take(0)?;
        Ok(records)
    }

    pub async fn mark_verified(&self, id: &str, judgment: &Judgment, now: EpochMs) -> Result<()> {
        self.inner
            .query(
                "UPDATE type::thing('hazard', $id) SET \
                 status = $status, verification = $judgment, verified_ms = $now, \
                 error_log = NONE, error_ms = NONE RETURN NONE;",
            )
            .bind(("id", id.to_string()))
            .bind(("status", HazardStatus::Verified))
            .bind(("judgment", serde_json::to_value(judgment)?))
            .bind(("now", now))
            .await?
            .check()
            .context("marking hazard verified")?;
        Ok(())
    }

    pub async fn mark_rejected(&self, id: &str, judgment: &Judgment, now: EpochMs) -> Result<()> {
        self.inner
            .query(
                "UPDATE type::thing('hazard', $id) SET \
                 status = $status, verification = $judgment, verified_ms = $now, \
                 error_log = NONE, error_ms = NONE RETURN NONE;",
            )
            .bind(("id", id.to_string()))
            .bind(("status", HazardStatus::Rejected))
            .bind(("judgment", serde_json::to_value(judgment)?))
            .bind(("now", now))
            .await?
            .check()
            .context("marking hazard rejected")?;
        Ok(())
    }

    pub async fn mark_error(&self, id: &str, message: &str, now: EpochMs) -> Result<()> {
        self.inner
            .query(
                "UPDATE type::thing('hazard', $id) SET \
                 status = $status, error_log = $message, error_ms = $now RETURN NONE;",
            )
            .bind(("id", id.to_string()))
            .bind(("status", HazardStatus::Error))
            .bind(("message", message.to_string()))
            .bind(("now", now))
            .await?
            .check()
            .context("marking hazard errored")?;
        Ok(())
    }

    /// Explicit retry of an errored record: back to pending with the
    /// error fields cleared. Does nothing for other statuses.
    pub async fn reset_to_pending(&self, id: &str) -> Result<()> {
        self.inner
            .query(
                "UPDATE type::thing('hazard', $id) SET \
                 status = $pending, error_log = NONE, error_ms = NONE \
                 WHERE status = $error RETURN NONE;",
            )
            .bind(("id", id.to_string()))
            .bind(("pending", HazardStatus::Pending))
            .bind(("error", HazardStatus::Error))
            .await?
            .check()
            .context("resetting hazard to pending")?;
        Ok(())
    }

    pub async fn append_verified(&self, row: &VerifiedOutcome) -> Result<()> {
        self.append("hazard_verified", &row.id, row).await
    }

    pub async fn append_rejected(&self, row: &RejectedOutcome) -> Result<()> {
        self.append("hazard_rejected", &row.id, row).await
    }

    pub async fn append_error(&self, row: &ErrorOutcome) -> Result<()> {
        self.append("hazard_error", &row.id, row).await
    }

    pub async fn list_verified_for(&self, hazard_id: &str) -> Result<Vec<VerifiedOutcome>> {
        self.list_outcomes("hazard_verified", hazard_id).await
    }

    pub async fn list_rejected_for(&self, hazard_id: &str) -> Result<Vec<RejectedOutcome>> {
        self.list_outcomes("hazard_rejected", hazard_id).await
    }

    pub async fn list_errors_for(&self, hazard_id: &str) -> Result<Vec<ErrorOutcome>> {
        self.list_outcomes("hazard_error", hazard_id).await
    }

    async fn append<T: Serialize>(&self, table: &str, id: &str, row: &T) -> Result<()> {
        self.inner
            .query("CREATE type::thing($table, $id) CONTENT $row RETURN NONE;")
            .bind(("table", table.to_string()))
            .bind(("id", id.to_string()))
            .bind(("row", content_without_id(row)?))
            .await?
            .check()
            .with_context(|| format!("appending {table} row"))?;
        Ok(())
    }

    async fn list_outcomes<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        hazard_id: &str,
    ) -> Result<Vec<T>> {
        let mut res = self
            .inner
            .query(
                "SELECT *, record::id(id) AS id FROM type::table($table) \
                 WHERE hazard_id = $hazard_id ORDER BY id ASC;",
            )
            .bind(("table", table.to_string()))
            .bind(("hazard_id", hazard_id.to_string()))
            .await?;
        let rows: Vec<T> = res.take(0)?;
        Ok(rows)
    }
}

/// Serialize a row for CONTENT, dropping the `id` field: the record id
/// carries it, and the read side projects it back with `record::id`.
fn content_without_id<T: Serialize>(row: &T) -> Result<serde_json::Value> {
    let mut value = serde_json::to_value(row)?;
    if let Some(obj) = value.as_object_mut() {
        obj.remove("id");
    }
    Ok(value)
}

pub fn new_ulid() -> Id {
    ulid::Ulid::new().to_string()
}

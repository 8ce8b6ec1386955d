//! Run history: writing merged results and reading them back.

use rusqlite::{Connection, Transaction, params};
use serde::{Deserialize, Serialize};

use super::Database;
use crate::normalize::MergedResult;
use crate::types::{Result, ResultExt, RunId, format_number, log_filter_error};

/// Dimension tables a run links to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionTable {
    Regions,
    Regulations,
}

impl DimensionTable {
    fn table(&self) -> &'static str {
        match self {
            Self::Regions => "regions",
            Self::Regulations => "regulations",
        }
    }

    fn link_table(&self) -> &'static str {
        match self {
            Self::Regions => "run_regions",
            Self::Regulations => "run_regulations",
        }
    }

    fn link_column(&self) -> &'static str {
        match self {
            Self::Regions => "region_id",
            Self::Regulations => "regulation_id",
        }
    }
}

/// Writes one run and its dimension rows inside a single transaction.
///
/// Obtained through [`Database::write_run`], which commits or rolls back.
pub struct RunWriter<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> RunWriter<'conn> {
    pub(super) fn begin(conn: &'conn mut Connection) -> Result<Self> {
        let tx = conn
            .transaction()
            .with_context("Failed to start transaction")?;
        Ok(Self { tx })
    }

    /// Insert the run row and return its row ID.
    pub fn begin_run(&self, run_id: &RunId, title: &str, risk_score: f64) -> Result<i64> {
        let run_time = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        self.tx
            .execute(
                "INSERT INTO feature_runs (run_id, run_time, feature_name, risk_score)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    run_id.as_str(),
                    run_time,
                    title.trim(),
                    format_number(risk_score)
                ],
            )
            .with_context_fn(|| format!("Failed to insert run {}", run_id))?;

        Ok(self.tx.last_insert_rowid())
    }

    /// Insert a region or regulation by name, or return the existing row ID.
    pub fn upsert_dimension(&self, table: DimensionTable, name: &str) -> Result<i64> {
        let sql = format!(
            "INSERT INTO {} (name) VALUES (?1)
             ON CONFLICT(name) DO UPDATE SET name = excluded.name
             RETURNING id",
            table.table()
        );

        self.tx
            .query_row(&sql, params![name], |row| row.get(0))
            .with_context_fn(|| format!("Failed to upsert {} '{}'", table.table(), name))
    }

    /// Link a run to a dimension row; linking twice is a no-op.
    pub fn link_run_to_dimension(
        &self,
        run: i64,
        table: DimensionTable,
        dimension_id: i64,
    ) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (run_id, {}) VALUES (?1, ?2) ON CONFLICT DO NOTHING",
            table.link_table(),
            table.link_column()
        );

        self.tx
            .execute(&sql, params![run, dimension_id])
            .with_context_fn(|| format!("Failed to link run to {}", table.table()))?;
        Ok(())
    }

    pub fn commit(self) -> Result<()> {
        self.tx.commit().with_context("Failed to commit transaction")
    }

    pub fn rollback(self) -> Result<()> {
        self.tx
            .rollback()
            .with_context("Failed to roll back transaction")
    }
}

/// One row of the run history listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: i64,
    pub run_id: RunId,
    pub run_time: String,
    pub feature_name: String,
    pub risk_score: Option<String>,
    pub regions: Vec<String>,
    pub regulations: Vec<String>,
}

type RunRow = (i64, String, String, String, Option<String>, String, String);

pub struct RunStore<'a> {
    db: &'a Database,
}

impl<'a> RunStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Persist a merged result with its regions and regulations atomically.
    pub fn record_run(&self, title: &str, result: &MergedResult) -> Result<RunId> {
        let run_id = RunId::generate();

        self.db.write_run(|writer| {
            let run = writer.begin_run(&run_id, title, result.score.value)?;

            let mut links = Vec::new();
            for region in &result.findings.regions_hit {
                let id = writer.upsert_dimension(DimensionTable::Regions, region)?;
                links.push((DimensionTable::Regions, id));
            }
            for regulation in &result.findings.regulations_hit {
                let id = writer.upsert_dimension(DimensionTable::Regulations, regulation)?;
                links.push((DimensionTable::Regulations, id));
            }

            for (table, id) in links {
                writer.link_run_to_dimension(run, table, id)?;
            }
            Ok(())
        })?;

        tracing::info!("Saved analysis run {}", run_id);
        Ok(run_id)
    }

    /// Most recent runs first, with their linked dimension names.
    pub fn list_recent_runs(&self, limit: usize) -> Result<Vec<RunSummary>> {
        let conn = self.db.connection()?;
        let mut stmt = conn
            .prepare(
                r#"
                SELECT fr.id, fr.run_id, fr.run_time, fr.feature_name, fr.risk_score,
                       (SELECT json_group_array(name) FROM (
                            SELECT r.name FROM run_regions rr
                            JOIN regions r ON rr.region_id = r.id
                            WHERE rr.run_id = fr.id ORDER BY rr.rowid)) AS regions,
                       (SELECT json_group_array(name) FROM (
                            SELECT reg.name FROM run_regulations rrn
                            JOIN regulations reg ON rrn.regulation_id = reg.id
                            WHERE rrn.run_id = fr.id ORDER BY rrn.rowid)) AS regulations
                FROM feature_runs fr
                ORDER BY fr.run_time DESC, fr.id DESC
                LIMIT ?1
                "#,
            )
            .with_context("Failed to prepare run history query")?;

        let rows: Vec<RunRow> = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            })
            .with_context("Failed to query run history")?
            .filter_map(|r| log_filter_error(r, "reading run history row"))
            .collect();

        rows.into_iter()
            .map(
                |(id, run_id, run_time, feature_name, risk_score, regions, regulations)| {
                    Ok(RunSummary {
                        id,
                        run_id: RunId::new(run_id),
                        run_time,
                        feature_name,
                        risk_score,
                        regions: serde_json::from_str(&regions)?,
                        regulations: serde_json::from_str(&regulations)?,
                    })
                },
            )
            .collect()
    }
}

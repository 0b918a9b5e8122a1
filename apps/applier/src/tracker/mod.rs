//! Application Tracker: one row per application attempt, in SQLite.

use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::form::FillReport;
use crate::models::application::ApplicationRow;

pub mod handlers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    InProgress,
    Submitted,
    Failed,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::InProgress => "in_progress",
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "in_progress" => Ok(ApplicationStatus::InProgress),
            "submitted" => Ok(ApplicationStatus::Submitted),
            "failed" => Ok(ApplicationStatus::Failed),
            other => Err(AppError::Validation(format!(
                "unknown status '{other}' (expected pending, in_progress, submitted or failed)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationStats {
    pub total_applications: i64,
    pub submitted: i64,
    pub pending: i64,
    pub failed: i64,
    /// Percentage of all applications that were submitted.
    pub success_rate: f64,
    pub companies_applied: i64,
    pub positions_applied: i64,
}

#[derive(Clone)]
pub struct ApplicationTracker {
    db: SqlitePool,
}

impl ApplicationTracker {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Inserts a new application and returns its id.
    pub async fn add_application(
        &self,
        company: &str,
        position: &str,
        url: &str,
        status: ApplicationStatus,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let suffix = Uuid::new_v4().simple().to_string();
        let application_id = format!(
            "{}_{}_{}",
            company.trim().replace(' ', "_"),
            now.format("%Y%m%d_%H%M%S"),
            &suffix[..8]
        );

        sqlx::query(
            r#"
            INSERT INTO applications
                (application_id, company, position, url, status, submitted_date, last_updated)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&application_id)
        .bind(company)
        .bind(position)
        .bind(url)
        .bind(status.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await?;

        info!("Tracking application {application_id} ({position} at {company})");
        Ok(application_id)
    }

    pub async fn record_fill_results(
        &self,
        application_id: &str,
        report: &FillReport,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE applications SET filled_fields = ?, unfilled_fields = ?, last_updated = ? \
             WHERE application_id = ?",
        )
        .bind(report.filled_count as i64)
        .bind(report.unfilled_count as i64)
        .bind(Utc::now())
        .bind(application_id)
        .execute(&self.db)
        .await?;
        ensure_updated(result.rows_affected(), application_id)
    }

    pub async fn mark_submitted(&self, application_id: &str) -> Result<(), AppError> {
        self.set_status(application_id, ApplicationStatus::Submitted, None)
            .await
    }

    pub async fn mark_failed(&self, application_id: &str, error: &str) -> Result<(), AppError> {
        self.set_status(application_id, ApplicationStatus::Failed, Some(error))
            .await
    }

    async fn set_status(
        &self,
        application_id: &str,
        status: ApplicationStatus,
        error: Option<&str>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE applications SET status = ?, errors = COALESCE(?, errors), last_updated = ? \
             WHERE application_id = ?",
        )
        .bind(status.as_str())
        .bind(error)
        .bind(Utc::now())
        .bind(application_id)
        .execute(&self.db)
        .await?;
        ensure_updated(result.rows_affected(), application_id)
    }

    pub async fn get(&self, application_id: &str) -> Result<Option<ApplicationRow>, AppError> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE application_id = ?",
        )
        .bind(application_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    /// Newest first.
    pub async fn recent(&self, limit: i64) -> Result<Vec<ApplicationRow>, AppError> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications ORDER BY submitted_date DESC, rowid DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    /// Newest first.
    pub async fn by_status(
        &self,
        status: ApplicationStatus,
        limit: i64,
    ) -> Result<Vec<ApplicationRow>, AppError> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE status = ? \
             ORDER BY submitted_date DESC, rowid DESC LIMIT ?",
        )
        .bind(status.as_str())
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    /// Case-insensitive substring match on company or position.
    pub async fn search(&self, query: &str) -> Result<Vec<ApplicationRow>, AppError> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            r#"
            SELECT * FROM applications
            WHERE instr(lower(company), lower(?1)) > 0
               OR instr(lower(position), lower(?1)) > 0
            ORDER BY submitted_date DESC, rowid DESC
            "#,
        )
        .bind(query)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    /// Oldest first, in insertion order.
    pub async fn all(&self) -> Result<Vec<ApplicationRow>, AppError> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications ORDER BY submitted_date ASC, rowid ASC",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    /// Writes every application to `path` as CSV with a header row. Returns
    /// the number of rows written.
    pub async fn export_csv(&self, path: &Path) -> Result<usize, AppError> {
        let rows = self.all().await?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let mut wtr = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        for row in &rows {
            wtr.serialize(row).context("Failed to write CSV record")?;
        }
        wtr.flush().context("Failed to flush CSV writer")?;

        info!("Exported {} application(s) to {}", rows.len(), path.display());
        Ok(rows.len())
    }

    pub async fn statistics(&self) -> Result<ApplicationStats, AppError> {
        let (total, submitted, pending, failed, companies, positions): (i64, i64, i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(status = 'submitted'), 0),
                    COALESCE(SUM(status = 'pending'), 0),
                    COALESCE(SUM(status = 'failed'), 0),
                    COUNT(DISTINCT company),
                    COUNT(DISTINCT position)
                FROM applications
                "#,
            )
            .fetch_one(&self.db)
            .await?;

        let success_rate = if total > 0 {
            submitted as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        Ok(ApplicationStats {
            total_applications: total,
            submitted,
            pending,
            failed,
            success_rate,
            companies_applied: companies,
            positions_applied: positions,
        })
    }
}

fn ensure_updated(rows_affected: u64, application_id: &str) -> Result<(), AppError> {
    if rows_affected == 0 {
        return Err(AppError::NotFound(format!(
            "Application {application_id} not found"
        )));
    }
    Ok(())
}

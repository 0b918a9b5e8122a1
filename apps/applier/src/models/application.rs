use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationRow {
    pub application_id: String,
    pub company: String,
    pub position: String,
    pub url: String,
    pub status: String,
    pub submitted_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub notes: String,
    pub resume_used: String,
    pub cover_letter_used: String,
    pub filled_fields: i64,
    pub unfilled_fields: i64,
    pub errors: String,
}

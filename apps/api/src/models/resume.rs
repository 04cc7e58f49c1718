use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// One persisted analysis: the upload's filename plus both LLM stage outputs.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: i64,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub extracted_data: Value,
    pub llm_analysis: Value,
}

/// List-view projection of `ResumeRow`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeSummary {
    pub id: i64,
    pub filename: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

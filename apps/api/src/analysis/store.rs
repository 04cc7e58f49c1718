//! Persistence for completed analyses.

use chrono::Utc;
use sqlx::types::Json;
use sqlx::SqlitePool;
use tracing::info;

use crate::analysis::records::{AnalysisRecord, StructuredRecord};
use crate::models::resume::{ResumeRow, ResumeSummary};

/// Both stage outputs of one upload. Stored together or not at all.
pub struct NewAnalysis<'a> {
    pub filename: &'a str,
    pub structured: &'a StructuredRecord,
    pub analysis: &'a AnalysisRecord,
}

/// Inserts a completed analysis in a single transaction and returns the stored row.
pub async fn insert_analysis(
    pool: &SqlitePool,
    new: NewAnalysis<'_>,
) -> Result<ResumeRow, sqlx::Error> {
    let NewAnalysis {
        filename,
        structured,
        analysis,
    } = new;

    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes
            (filename, uploaded_at, name, email, phone, extracted_data, llm_analysis)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(filename)
    .bind(Utc::now())
    .bind(structured.name())
    .bind(structured.email())
    .bind(structured.phone())
    .bind(Json(structured.as_value()))
    .bind(Json(analysis.as_value()))
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!("Stored analysis {} for '{}'", row.id, row.filename);
    Ok(row)
}

/// Summaries, newest first.
pub async fn list_summaries(
    pool: &SqlitePool,
    skip: i64,
    limit: i64,
) -> Result<Vec<ResumeSummary>, sqlx::Error> {
    sqlx::query_as::<_, ResumeSummary>(
        r#"
        SELECT id, filename, name, email, uploaded_at
        FROM resumes
        ORDER BY id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await
}

pub async fn get_analysis(pool: &SqlitePool, id: i64) -> Result<Option<ResumeRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Deletes one analysis, returning its filename, or `None` if the id is unknown.
pub async fn delete_analysis(pool: &SqlitePool, id: i64) -> Result<Option<String>, sqlx::Error> {
    let filename: Option<String> =
        sqlx::query_scalar("DELETE FROM resumes WHERE id = ? RETURNING filename")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    if let Some(filename) = &filename {
        info!("Deleted analysis {id} ('{filename}')");
    }
    Ok(filename)
}

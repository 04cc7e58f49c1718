//! Pipeline orchestrator. Runs one upload end-to-end.
//!
//! Flow: extract_text → blank check → truncate → extract_structured → analyze →
//! insert_analysis. Stages run strictly in sequence; nothing is persisted unless
//! both LLM stages succeed.

use std::sync::Arc;

use bytes::Bytes;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::analysis::extraction::ExtractionClient;
use crate::analysis::pdf_text::extract_text;
use crate::analysis::records::{AnalysisRecord, StructuredRecord};
use crate::analysis::review::AnalysisClient;
use crate::analysis::store::{insert_analysis, NewAnalysis};
use crate::errors::AppError;
use crate::llm_client::retry::RetryPolicy;
use crate::llm_client::TextGenerator;
use crate::models::resume::ResumeRow;

/// Both stage outputs for one resume.
#[derive(Debug, Clone)]
pub struct CompletedAnalysis {
    pub structured: StructuredRecord,
    pub analysis: AnalysisRecord,
}

/// The analysis core, built once at startup and shared through `AppState`.
pub struct ResumeAnalyzer {
    extraction: ExtractionClient,
    review: AnalysisClient,
    max_resume_chars: usize,
}

impl ResumeAnalyzer {
    pub fn new(llm: Arc<dyn TextGenerator>, policy: RetryPolicy, max_resume_chars: usize) -> Self {
        Self {
            extraction: ExtractionClient::new(llm.clone(), policy.clone()),
            review: AnalysisClient::new(llm, policy),
            max_resume_chars,
        }
    }

    /// Runs text extraction and both LLM stages. Does not touch the database.
    pub async fn analyze_pdf(&self, pdf: Bytes) -> Result<CompletedAnalysis, AppError> {
        let resume_text = extract_text(pdf).await?;
        if resume_text.trim().is_empty() {
            warn!("Rejecting PDF with no extractable text (empty or image-only)");
            return Err(AppError::Validation(
                "Could not extract text from PDF. The file might be empty or image-based."
                    .to_string(),
            ));
        }

        let (resume_text, truncated) = truncate_chars(&resume_text, self.max_resume_chars);
        if truncated {
            warn!(
                "Resume text truncated to {} characters before extraction",
                self.max_resume_chars
            );
        }

        let structured = self.extraction.extract_structured(resume_text).await?;
        info!(
            "Structured extraction complete: {} core skills, {} soft skills, {} experience entries, {} education entries",
            structured.core_skills().len(),
            structured.soft_skills().len(),
            structured.experience().len(),
            structured.education().len()
        );
        debug!(
            "Extracted location={:?}, has_summary={}",
            structured.location(),
            structured.summary().is_some()
        );

        let analysis = self.review.analyze(&structured).await?;
        info!(
            "Analysis complete: rating={:?}, {} upskill suggestions",
            analysis.resume_rating(),
            analysis.upskill_suggestions().len()
        );
        if analysis.improvement_areas().is_none() {
            warn!("Analysis response has no improvement_areas");
        }

        Ok(CompletedAnalysis {
            structured,
            analysis,
        })
    }
}

/// Full upload pipeline: analysis, then one atomic insert.
pub async fn process_upload(
    pool: &SqlitePool,
    analyzer: &ResumeAnalyzer,
    filename: &str,
    pdf: Bytes,
) -> Result<ResumeRow, AppError> {
    info!("Analyzing '{}' ({} bytes)", filename, pdf.len());

    let CompletedAnalysis {
        structured,
        analysis,
    } = analyzer.analyze_pdf(pdf).await?;

    let row = insert_analysis(
        pool,
        NewAnalysis {
            filename,
            structured: &structured,
            analysis: &analysis,
        },
    )
    .await?;

    Ok(row)
}

/// Cuts `text` to at most `max_chars` characters on a char boundary.
/// Returns the kept slice and whether anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

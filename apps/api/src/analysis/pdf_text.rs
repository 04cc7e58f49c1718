//! PDF → plain text. No OCR: image-only pages contribute nothing.

use bytes::Bytes;
use tracing::{debug, warn};

use crate::analysis::AnalysisError;

/// Extracts the text of every page, in page order, joined by newlines.
///
/// Pages with no extractable text are skipped. A blank result is valid output;
/// rejecting it is the caller's decision. Fails only when the bytes are not a
/// readable PDF. Parsing runs on the blocking pool, and a panic inside the
/// parser is reported as an extraction failure.
pub async fn extract_text(pdf: Bytes) -> Result<String, AnalysisError> {
    let pages = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem_by_pages(&pdf)
    })
    .await
    .map_err(|e| {
        warn!("PDF parser aborted: {e}");
        AnalysisError::Extraction(format!("PDF parser aborted: {e}"))
    })?
    .map_err(|e| {
        warn!("Unreadable PDF: {e}");
        AnalysisError::Extraction(e.to_string())
    })?;

    debug!("Extracted text from {} PDF pages", pages.len());
    Ok(join_pages(pages))
}

/// Joins page texts with `\n`, dropping blank pages. Blank lines at the edges
/// of a page are removed; indentation within the page is kept.
pub fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    pages
        .into_iter()
        .filter_map(|page| strip_blank_edge_lines(page.as_ref()).map(str::to_string))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `None` for a whitespace-only page.
fn strip_blank_edge_lines(page: &str) -> Option<&str> {
    let first_visible = page.find(|c: char| !c.is_whitespace())?;
    let line_start = page[..first_visible].rfind('\n').map_or(0, |i| i + 1);
    Some(page[line_start..].trim_end())
}

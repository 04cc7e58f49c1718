// Resume analysis pipeline.
// Flow: PDF bytes → pdf_text → extraction (LLM stage 1) → review (LLM stage 2) → store.
// All LLM calls go through llm_client and the shared retry policy.

pub mod extraction;
pub mod handlers;
pub mod pdf_text;
pub mod pipeline;
pub mod prompts;
pub mod records;
pub mod review;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;

use serde_json::Value;
use thiserror::Error;
use tracing::error;

use crate::llm_client::retry::{with_backoff, RetryError, RetryPolicy};
use crate::llm_client::{parse_json_response, LlmError, TextGenerator};

/// Which LLM stage produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extraction,
    Analysis,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Extraction => f.write_str("extraction"),
            Stage::Analysis => f.write_str("analysis"),
        }
    }
}

/// Failures of the analysis core. Transient LLM failures never appear here
/// directly: the retry wrapper absorbs them or reports `RetryExhausted`.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Could not read PDF: {0}")]
    Extraction(String),

    #[error("LLM call failed after {attempts} attempts: {last}")]
    RetryExhausted { attempts: u32, last: LlmError },

    #[error("LLM returned malformed JSON during {stage}: {source}")]
    MalformedResponse {
        stage: Stage,
        #[source]
        source: serde_json::Error,
    },

    #[error("LLM call failed: {0}")]
    Llm(LlmError),

    #[error("Failed to encode resume data for the LLM: {0}")]
    Encode(serde_json::Error),
}

impl From<RetryError<LlmError>> for AnalysisError {
    fn from(err: RetryError<LlmError>) -> Self {
        match err {
            RetryError::Exhausted { attempts, last } => {
                AnalysisError::RetryExhausted { attempts, last }
            }
            RetryError::Permanent(e) => AnalysisError::Llm(e),
        }
    }
}

/// One guarded LLM call: the request is retried on transient failures, then the
/// text payload is cleaned and parsed. A parse failure is terminal.
async fn guarded_json_call(
    llm: &dyn TextGenerator,
    policy: &RetryPolicy,
    stage: Stage,
    prompt: &str,
    system: &str,
) -> Result<Value, AnalysisError> {
    let label = format!("LLM {stage} call");
    let text = with_backoff(policy, &label, || llm.generate(prompt, system))
        .await
        .map_err(|e| {
            let e = AnalysisError::from(e);
            if matches!(e, AnalysisError::Llm(_)) {
                error!("{label} failed permanently: {e}");
            }
            e
        })?;

    parse_json_response(&text).map_err(|source| {
        error!("LLM returned malformed JSON during {stage}: {source}");
        AnalysisError::MalformedResponse { stage, source }
    })
}

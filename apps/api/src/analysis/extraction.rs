//! Extraction client: LLM stage 1, resume text to `StructuredRecord`.

use std::sync::Arc;

use crate::analysis::prompts::{EXTRACTION_PERSONA, EXTRACTION_PROMPT_TEMPLATE};
use crate::analysis::records::StructuredRecord;
use crate::analysis::{guarded_json_call, AnalysisError, Stage};
use crate::llm_client::prompts::json_only_system;
use crate::llm_client::retry::RetryPolicy;
use crate::llm_client::TextGenerator;

#[derive(Clone)]
pub struct ExtractionClient {
    llm: Arc<dyn TextGenerator>,
    policy: RetryPolicy,
}

impl ExtractionClient {
    pub fn new(llm: Arc<dyn TextGenerator>, policy: RetryPolicy) -> Self {
        Self { llm, policy }
    }

    /// Asks the model for the structured resume fields.
    ///
    /// Transient failures are retried per the policy. A response that is not
    /// JSON after fence stripping fails with `MalformedResponse` and is never
    /// retried. The JSON is not checked against the schema.
    pub async fn extract_structured(
        &self,
        resume_text: &str,
    ) -> Result<StructuredRecord, AnalysisError> {
        let prompt = EXTRACTION_PROMPT_TEMPLATE.replace("{resume_text}", resume_text);
        let system = json_only_system(EXTRACTION_PERSONA);

        let value =
            guarded_json_call(self.llm.as_ref(), &self.policy, Stage::Extraction, &prompt, &system)
                .await?;
        Ok(StructuredRecord::from_value(value))
    }
}

//! Analysis client: LLM stage 2, `StructuredRecord` to `AnalysisRecord`.

use std::sync::Arc;

use crate::analysis::prompts::{ANALYSIS_PERSONA, ANALYSIS_PROMPT_TEMPLATE};
use crate::analysis::records::{AnalysisRecord, StructuredRecord};
use crate::analysis::{guarded_json_call, AnalysisError, Stage};
use crate::llm_client::prompts::json_only_system;
use crate::llm_client::retry::RetryPolicy;
use crate::llm_client::TextGenerator;

#[derive(Clone)]
pub struct AnalysisClient {
    llm: Arc<dyn TextGenerator>,
    policy: RetryPolicy,
}

impl AnalysisClient {
    pub fn new(llm: Arc<dyn TextGenerator>, policy: RetryPolicy) -> Self {
        Self { llm, policy }
    }

    /// Asks the model for a rating, improvement advice and upskill suggestions.
    /// Same retry and parse rules as the extraction stage.
    pub async fn analyze(&self, record: &StructuredRecord) -> Result<AnalysisRecord, AnalysisError> {
        let resume_json =
            serde_json::to_string_pretty(record.as_value()).map_err(AnalysisError::Encode)?;
        let prompt = ANALYSIS_PROMPT_TEMPLATE.replace("{resume_json}", &resume_json);
        let system = json_only_system(ANALYSIS_PERSONA);

        let value =
            guarded_json_call(self.llm.as_ref(), &self.policy, Stage::Analysis, &prompt, &system)
                .await?;
        Ok(AnalysisRecord::from_value(value))
    }
}

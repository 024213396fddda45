use inference::{SummaryModel, SummaryParams};
use std::sync::Arc;

use crate::PipelineError;

/// Short abstractive summary of a report. Mandatory stage.
pub struct Summarizer {
    model: Arc<dyn SummaryModel>,
    params: SummaryParams,
}

impl Summarizer {
    pub fn new(model: Arc<dyn SummaryModel>) -> Self {
        Self {
            model,
            params: SummaryParams::default(),
        }
    }

    pub fn with_params(mut self, params: SummaryParams) -> Result<Self, PipelineError> {
        params.validate().map_err(PipelineError::Config)?;
        self.params = params;
        Ok(self)
    }

    pub fn params(&self) -> &SummaryParams {
        &self.params
    }

    pub async fn summarize(&self, text: &str) -> Result<String, PipelineError> {
        self.model
            .summarize(text, &self.params)
            .await
            .map_err(PipelineError::model("summarizer"))
    }
}

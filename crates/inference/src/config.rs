use serde::{Deserialize, Serialize};

/// Where the pretrained models live and how to reach them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InferenceConfig {
    /// Base URL; the model id is appended as a path segment.
    pub api_base_url: String,
    /// Authorization header (e.g., `"Bearer hf_xxx"`).
    pub api_auth_header: Option<String>,
    pub sentiment_model: String,
    pub zero_shot_model: String,
    pub summarizer_model: String,
    pub ner_model: String,
    /// Overall request timeout in seconds.
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://router.huggingface.co/hf-inference/models".into(),
            api_auth_header: None,
            sentiment_model: "distilbert-base-uncased-finetuned-sst-2-english".into(),
            zero_shot_model: "facebook/bart-large-mnli".into(),
            summarizer_model: "sshleifer/distilbart-cnn-12-6".into(),
            ner_model: "dslim/bert-base-NER".into(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl InferenceConfig {
    /// Full endpoint URL for `model`.
    pub fn model_url(&self, model: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            model.trim_start_matches('/')
        )
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api_base_url.trim().is_empty() {
            return Err("api_base_url must not be empty".into());
        }
        for (field, value) in [
            ("sentiment_model", &self.sentiment_model),
            ("zero_shot_model", &self.zero_shot_model),
            ("summarizer_model", &self.summarizer_model),
            ("ner_model", &self.ner_model),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{field} must not be empty"));
            }
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than zero".into());
        }
        Ok(())
    }
}

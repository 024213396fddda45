//! YAML configuration for the triage pipeline.
//!
//! Every section is optional; missing keys fall back to defaults. Environment
//! variables are applied on top of the file, once, at startup.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "field-triage"
//!
//! inference:
//!   api_base_url: "https://router.huggingface.co/hf-inference/models"
//!   zero_shot_model: "facebook/bart-large-mnli"
//!   timeout_secs: 30
//!
//! semantic:
//!   mode: "onnx"
//!   model_name: "all-MiniLM-L6-v2"
//!   model_path: "./models/all-MiniLM-L6-v2/onnx/model.onnx"
//!   tokenizer_path: "./models/all-MiniLM-L6-v2/tokenizer.json"
//!   secondary_model_dir: "./models/bge-small-en-v1.5"
//!   use_gpu: false
//!
//! summary:
//!   min_length: 12
//!   max_length: 60
//!
//! duplicates:
//!   threshold: 0.82
//! ```
//!
//! ## Environment overrides
//!
//! | Variable | Field |
//! |---|---|
//! | `TRIAGE_USE_GPU` | `semantic.use_gpu` |
//! | `TRIAGE_EMBEDDING_MODE` | `semantic.mode` |
//! | `TRIAGE_EMBEDDING_MODEL` | `semantic.model_name` |
//! | `TRIAGE_EMBEDDING_MODEL_PATH` | `semantic.model_path` |
//! | `TRIAGE_EMBEDDING_TOKENIZER_PATH` | `semantic.tokenizer_path` |
//! | `TRIAGE_EMBEDDING_API_URL` | `semantic.api_url` |
//! | `TRIAGE_SECONDARY_MODEL_DIR` | `semantic.secondary_model_dir` (empty disables) |
//! | `TRIAGE_INFERENCE_URL` | `inference.api_base_url` |
//! | `HF_API_TOKEN` | bearer auth for both model endpoints, unless already set |

use std::fs;
use std::path::{Path, PathBuf};

use inference::{InferenceConfig, SummaryParams};
use matcher::DEFAULT_THRESHOLD;
use semantic::SemanticConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TriageConfig {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub inference: InferenceConfig,

    #[serde(default)]
    pub semantic: SemanticConfig,

    #[serde(default)]
    pub summary: SummaryParams,

    #[serde(default)]
    pub duplicates: DuplicateYamlConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DuplicateYamlConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

impl Default for DuplicateYamlConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            name: None,
            inference: InferenceConfig::default(),
            semantic: SemanticConfig::default(),
            summary: SummaryParams::default(),
            duplicates: DuplicateYamlConfig::default(),
        }
    }
}

impl TriageConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: TriageConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// File (if any), then process environment, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies the documented overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(flag) = lookup("TRIAGE_USE_GPU") {
            self.semantic.use_gpu = parse_flag(&flag);
        }
        if let Some(mode) = lookup("TRIAGE_EMBEDDING_MODE") {
            self.semantic.mode = mode.trim().to_lowercase();
        }
        if let Some(model) = lookup("TRIAGE_EMBEDDING_MODEL") {
            self.semantic.model_name = model;
        }
        if let Some(path) = lookup("TRIAGE_EMBEDDING_MODEL_PATH") {
            self.semantic.model_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("TRIAGE_EMBEDDING_TOKENIZER_PATH") {
            self.semantic.tokenizer_path = PathBuf::from(path);
        }
        if let Some(url) = lookup("TRIAGE_EMBEDDING_API_URL") {
            self.semantic.api_url = Some(url);
        }
        if let Some(dir) = lookup("TRIAGE_SECONDARY_MODEL_DIR") {
            let dir = dir.trim();
            self.semantic.secondary_model_dir = (!dir.is_empty()).then(|| PathBuf::from(dir));
        }
        if let Some(url) = lookup("TRIAGE_INFERENCE_URL") {
            self.inference.api_base_url = url;
        }
        if let Some(token) = lookup("HF_API_TOKEN").filter(|t| !t.trim().is_empty()) {
            let header = format!("Bearer {}", token.trim());
            self.inference
                .api_auth_header
                .get_or_insert_with(|| header.clone());
            self.semantic.api_auth_header.get_or_insert(header);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => {}
            v => return Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }
        self.inference
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("inference: {e}")))?;
        self.semantic
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("semantic: {e}")))?;
        self.summary
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("summary: {e}")))?;
        if !(-1.0..=1.0).contains(&self.duplicates.threshold) {
            return Err(ConfigLoadError::Validation(format!(
                "duplicates.threshold must be within [-1, 1], got {}",
                self.duplicates.threshold
            )));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_valid_yaml() {
        let yaml = r#"
version: "1.0"
name: "field triage"
semantic:
  model_name: "all-mpnet-base-v2"
  secondary_model_dir: "/srv/models/bge"
summary:
  min_length: 10
  max_length: 40
"#;
        let config = TriageConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.name.as_deref(), Some("field triage"));
        assert_eq!(config.semantic.model_name, "all-mpnet-base-v2");
        assert_eq!(
            config.semantic.secondary_model_dir,
            Some(PathBuf::from("/srv/models/bge"))
        );
        assert_eq!(config.summary.max_length, 40);
        assert!(!config.summary.do_sample);
        assert_eq!(config.duplicates.threshold, DEFAULT_THRESHOLD);
        assert_eq!(config.inference.ner_model, "dslim/bert-base-NER");
    }

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let config = TriageConfig::from_yaml("version: \"1\"\n").unwrap();
        assert_eq!(config, TriageConfig {
            version: "1".into(),
            ..TriageConfig::default()
        });
    }

    #[test]
    fn test_unsupported_version() {
        let err = TriageConfig::from_yaml("version: \"2.0\"\n").unwrap_err();
        assert!(matches!(err, ConfigLoadError::UnsupportedVersion(v) if v == "2.0"));
    }

    #[test]
    fn test_invalid_summary_bounds() {
        let yaml = "version: \"1.0\"\nsummary:\n  min_length: 80\n  max_length: 20\n";
        assert!(matches!(
            TriageConfig::from_yaml(yaml),
            Err(ConfigLoadError::Validation(msg)) if msg.starts_with("summary")
        ));
    }

    #[test]
    fn test_invalid_threshold() {
        let yaml = "version: \"1.0\"\nduplicates:\n  threshold: 1.5\n";
        assert!(TriageConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_api_mode_without_url_fails() {
        let yaml = "version: \"1.0\"\nsemantic:\n  mode: api\n";
        assert!(matches!(
            TriageConfig::from_yaml(yaml),
            Err(ConfigLoadError::Validation(msg)) if msg.contains("api_url")
        ));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            TriageConfig::from_yaml("version: [unclosed"),
            Err(ConfigLoadError::YamlParse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "version: \"1.0\"\nduplicates:\n  threshold: 0.9").unwrap();
        let config = TriageConfig::from_file(file.path()).unwrap();
        assert!((config.duplicates.threshold - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            TriageConfig::from_file("/no/such/triage.yaml"),
            Err(ConfigLoadError::FileRead(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = TriageConfig::default();
        config.apply_env(env(&[
            ("TRIAGE_USE_GPU", "true"),
            ("TRIAGE_EMBEDDING_MODEL", "paraphrase-MiniLM-L3-v2"),
            ("TRIAGE_SECONDARY_MODEL_DIR", "/models/bge"),
            ("TRIAGE_INFERENCE_URL", "http://models.local"),
            ("HF_API_TOKEN", "hf_abc"),
        ]));
        assert!(config.semantic.use_gpu);
        assert_eq!(config.semantic.model_name, "paraphrase-MiniLM-L3-v2");
        assert_eq!(
            config.semantic.secondary_model_dir,
            Some(PathBuf::from("/models/bge"))
        );
        assert_eq!(config.inference.api_base_url, "http://models.local");
        assert_eq!(
            config.inference.api_auth_header.as_deref(),
            Some("Bearer hf_abc")
        );
        assert_eq!(
            config.semantic.api_auth_header.as_deref(),
            Some("Bearer hf_abc")
        );
    }

    #[test]
    fn test_env_does_not_replace_explicit_auth() {
        let mut config = TriageConfig::default();
        config.inference.api_auth_header = Some("Bearer from-file".into());
        config.apply_env(env(&[("HF_API_TOKEN", "hf_env")]));
        assert_eq!(
            config.inference.api_auth_header.as_deref(),
            Some("Bearer from-file")
        );
        assert_eq!(
            config.semantic.api_auth_header.as_deref(),
            Some("Bearer hf_env")
        );
    }

    #[test]
    fn test_empty_secondary_dir_disables_backend() {
        let mut config = TriageConfig::default();
        config.semantic.secondary_model_dir = Some(PathBuf::from("/models/bge"));
        config.apply_env(env(&[("TRIAGE_SECONDARY_MODEL_DIR", "")]));
        assert!(config.semantic.secondary_model_dir.is_none());
    }

    #[test]
    fn test_gpu_flag_parsing() {
        for (raw, expected) in [("1", true), ("ON", true), ("false", false), ("no", false)] {
            assert_eq!(parse_flag(raw), expected, "flag {raw}");
        }
    }
}

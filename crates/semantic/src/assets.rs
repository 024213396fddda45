use std::path::{Path, PathBuf};

use crate::SemanticError;

/// Local files an ONNX backend needs.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ModelAssets {
    pub(crate) model_path: PathBuf,
    pub(crate) tokenizer_path: PathBuf,
}

/// Model file names probed inside a model directory, in order.
const MODEL_CANDIDATES: [&str; 2] = ["model.onnx", "onnx/model.onnx"];
const TOKENIZER_FILE: &str = "tokenizer.json";

impl ModelAssets {
    /// Explicit paths, both of which must exist.
    pub(crate) fn from_paths(model: &Path, tokenizer: &Path) -> Result<Self, SemanticError> {
        if !model.is_file() {
            return Err(SemanticError::ModelNotFound(model.display().to_string()));
        }
        if !tokenizer.is_file() {
            return Err(SemanticError::TokenizerMissing(
                tokenizer.display().to_string(),
            ));
        }
        Ok(Self {
            model_path: model.to_path_buf(),
            tokenizer_path: tokenizer.to_path_buf(),
        })
    }

    /// Resolves a Hugging Face style export directory.
    pub(crate) fn from_dir(dir: &Path) -> Result<Self, SemanticError> {
        if !dir.is_dir() {
            return Err(SemanticError::ModelNotFound(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        let model_path = MODEL_CANDIDATES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| {
                SemanticError::ModelNotFound(format!("no model.onnx under {}", dir.display()))
            })?;

        let tokenizer_path = dir.join(TOKENIZER_FILE);
        if !tokenizer_path.is_file() {
            return Err(SemanticError::TokenizerMissing(
                tokenizer_path.display().to_string(),
            ));
        }

        Ok(Self {
            model_path,
            tokenizer_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn from_dir_prefers_top_level_model() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("onnx")).unwrap();
        fs::write(dir.path().join("model.onnx"), b"top").unwrap();
        fs::write(dir.path().join("onnx/model.onnx"), b"nested").unwrap();
        fs::write(dir.path().join("tokenizer.json"), b"{}").unwrap();

        let assets = ModelAssets::from_dir(dir.path()).unwrap();
        assert_eq!(assets.model_path, dir.path().join("model.onnx"));
        assert_eq!(assets.tokenizer_path, dir.path().join("tokenizer.json"));
    }

    #[test]
    fn from_dir_finds_nested_export() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("onnx")).unwrap();
        fs::write(dir.path().join("onnx/model.onnx"), b"nested").unwrap();
        fs::write(dir.path().join("tokenizer.json"), b"{}").unwrap();

        let assets = ModelAssets::from_dir(dir.path()).unwrap();
        assert_eq!(assets.model_path, dir.path().join("onnx/model.onnx"));
    }

    #[test]
    fn from_dir_reports_missing_tokenizer() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("model.onnx"), b"m").unwrap();
        assert!(matches!(
            ModelAssets::from_dir(dir.path()),
            Err(SemanticError::TokenizerMissing(_))
        ));
    }

    #[test]
    fn from_dir_rejects_missing_directory() {
        let err = ModelAssets::from_dir(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, SemanticError::ModelNotFound(_)));
    }

    #[test]
    fn from_paths_checks_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.onnx");
        let tokenizer = dir.path().join("tokenizer.json");
        fs::write(&model, b"m").unwrap();

        assert!(matches!(
            ModelAssets::from_paths(&model, &tokenizer),
            Err(SemanticError::TokenizerMissing(_))
        ));
        fs::write(&tokenizer, b"{}").unwrap();
        assert!(ModelAssets::from_paths(&model, &tokenizer).is_ok());
    }
}

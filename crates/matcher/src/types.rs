use serde::{Deserialize, Serialize};

/// Similarity at or above which a candidate counts as a duplicate.
pub const DEFAULT_THRESHOLD: f32 = 0.82;

/// A candidate that cleared the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateMatch {
    pub text: String,
    /// Cosine similarity to the query, in `[-1, 1]`.
    pub similarity: f32,
}

/// Matches sorted by descending similarity; ties keep candidate order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicateResult {
    pub is_duplicate: bool,
    pub matches: Vec<DuplicateMatch>,
}

impl DuplicateResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_matches(matches: Vec<DuplicateMatch>) -> Self {
        Self {
            is_duplicate: !matches.is_empty(),
            matches,
        }
    }
}

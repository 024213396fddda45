/// Report text prepared for the downstream stages.
///
/// Models see `text` (case kept, which matters for entity tagging); keyword
/// matching works on `lowered`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedReport {
    pub text: String,
    pub lowered: String,
}

impl NormalizedReport {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

pub fn normalize(text: &str) -> NormalizedReport {
    let text = text.trim().to_string();
    let lowered = text.to_lowercase();
    NormalizedReport { text, lowered }
}

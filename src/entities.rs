use inference::{EntityTagger, NerSpan, Outcome};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::warn;

/// Word stems that indicate a medical symptom.
pub const SYMPTOM_STEMS: [&str; 19] = [
    "injur", "bleed", "fractur", "wound", "limp", "mange", "rash", "cough", "fever", "weak",
    "starv", "thin", "vomit", "diarrh", "bite", "rabies", "pain", "swoll", "dehydrat",
];

const LOCATION_GROUP: &str = "LOC";
const SUBWORD_MARKER: &str = "##";

/// Each stem anchored at the start of a word. A stem ending in a silent `e`
/// also matches its `-ing` form (`bite` / `biting`).
static SYMPTOM_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    SYMPTOM_STEMS
        .iter()
        .map(|stem| {
            let mut pattern = format!(r"\b{}", regex::escape(stem));
            if let Some(root) = stem.strip_suffix('e') {
                pattern = format!(r"\b(?:{}|{}ing)", regex::escape(stem), regex::escape(root));
            }
            let re = Regex::new(&pattern).expect("symptom patterns are static and valid");
            (*stem, re)
        })
        .collect()
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityBundle {
    /// Reserved; always empty.
    pub breeds: Vec<String>,
    /// Discovery order, case-insensitively unique, first casing kept.
    pub locations: Vec<String>,
    /// Matched stems, unique and sorted.
    pub symptoms: Vec<String>,
    /// Reserved; always empty.
    pub dates: Vec<String>,
}

/// Locations from the NER capability plus symptom keywords from the text.
///
/// NER is optional: if it fails the bundle still carries symptoms and the
/// result is [`Outcome::Degraded`].
pub struct EntityExtractor {
    tagger: Arc<dyn EntityTagger>,
}

impl EntityExtractor {
    pub fn new(tagger: Arc<dyn EntityTagger>) -> Self {
        Self { tagger }
    }

    pub async fn extract(&self, text: &str) -> Outcome<EntityBundle> {
        let symptoms = extract_symptoms(&text.to_lowercase());

        match self.tagger.tag(text).await {
            Ok(spans) => Outcome::complete(EntityBundle {
                locations: collect_locations(&spans),
                symptoms,
                ..Default::default()
            }),
            Err(err) => {
                warn!(error = %err, "entity tagging failed; continuing without locations");
                Outcome::degraded(
                    EntityBundle {
                        symptoms,
                        ..Default::default()
                    },
                    format!("ner: {err}"),
                )
            }
        }
    }
}

/// Symptom stems present in `lowered` (already lower-cased).
pub fn extract_symptoms(lowered: &str) -> Vec<String> {
    SYMPTOM_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(lowered))
        .map(|(stem, _)| stem.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// `LOC` spans with sub-word markers stripped, deduplicated case-insensitively.
pub fn collect_locations(spans: &[NerSpan]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut locations = Vec::new();
    for span in spans.iter().filter(|s| s.entity_group == LOCATION_GROUP) {
        let word = span.word.replace(SUBWORD_MARKER, "");
        let word = word.trim();
        if word.is_empty() {
            continue;
        }
        if seen.insert(word.to_lowercase()) {
            locations.push(word.to_string());
        }
    }
    locations
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference::test_support::FakeModels;

    #[test]
    fn symptoms_match_word_prefixes() {
        let found = extract_symptoms("a dog was seen bleeding and biting near chennai");
        assert_eq!(found, ["bite", "bleed"]);
    }

    #[test]
    fn symptoms_are_sorted_and_unique() {
        let found = extract_symptoms("weak, very weak, vomiting and a wound; wounds everywhere");
        assert_eq!(found, ["vomit", "weak", "wound"]);
    }

    #[test]
    fn stems_need_a_word_start() {
        // "within" contains "thin" but not at a word boundary.
        assert!(extract_symptoms("within the park").is_empty());
        assert_eq!(extract_symptoms("very thin dog"), ["thin"]);
    }

    #[test]
    fn silent_e_stems_also_take_ing_form() {
        assert_eq!(extract_symptoms("a manging puppy"), ["mange"]);
        assert_eq!(extract_symptoms("kept biting people"), ["bite"]);
        // Only the -ing form; other truncations of the root stay unmatched.
        assert!(extract_symptoms("mang and bit and bitter").is_empty());
    }

    #[test]
    fn no_symptoms_in_plain_sighting() {
        assert!(extract_symptoms("brown dog sitting by the road").is_empty());
    }

    #[test]
    fn locations_strip_markers_and_dedupe() {
        let spans = vec![
            NerSpan::new("LOC", "Chennai", 0.99),
            NerSpan::new("PER", "Ravi", 0.98),
            NerSpan::new("LOC", "##nagar", 0.7),
            NerSpan::new("LOC", "chennai", 0.95),
            NerSpan::new("LOC", "  ", 0.5),
        ];
        assert_eq!(collect_locations(&spans), ["Chennai", "nagar"]);
    }

    #[tokio::test]
    async fn extract_combines_ner_and_keywords() {
        let tagger = FakeModels::default().with_spans(vec![NerSpan::new("LOC", "Chennai", 0.99)]);
        let extractor = EntityExtractor::new(Arc::new(tagger));
        let outcome = extractor
            .extract("A dog was seen bleeding and biting near Chennai")
            .await;
        assert!(!outcome.is_degraded());
        let bundle = outcome.into_value();
        assert_eq!(bundle.locations, ["Chennai"]);
        assert_eq!(bundle.symptoms, ["bite", "bleed"]);
        assert!(bundle.breeds.is_empty());
        assert!(bundle.dates.is_empty());
    }

    #[tokio::test]
    async fn ner_failure_degrades_to_symptoms_only() {
        let extractor = EntityExtractor::new(Arc::new(FakeModels::default().failing_tagger()));
        let outcome = extractor.extract("Limping dog near Madurai").await;
        assert!(outcome.is_degraded());
        assert!(outcome.reason().is_some_and(|r| r.starts_with("ner:")));
        let bundle = outcome.into_value();
        assert!(bundle.locations.is_empty());
        assert_eq!(bundle.symptoms, ["limp"]);
    }
}

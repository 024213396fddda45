use inference::SentimentLabel;

/// Substrings that mark a report as urgent regardless of tone.
pub const URGENCY_KEYWORDS: [&str; 6] = ["bleed", "injur", "bite", "die", "critical", "urgent"];

const SENTIMENT_WEIGHT: f32 = 0.8;
const KEYWORD_WEIGHT: f32 = 0.2;

/// `0.8 * (1.0 if negative else 0.3) + 0.2 * keyword_hit`, clipped to `[0, 1]`.
///
/// `lowered` must already be lower-cased. Keywords are plain substrings, so
/// "bleeding" counts for "bleed".
pub fn urgency_score(sentiment: SentimentLabel, lowered: &str) -> f32 {
    let tone = match sentiment {
        SentimentLabel::Negative => 1.0,
        SentimentLabel::Positive => 0.3,
    };
    let hit = if has_urgency_keyword(lowered) { 1.0 } else { 0.0 };
    (SENTIMENT_WEIGHT * tone + KEYWORD_WEIGHT * hit).clamp(0.0, 1.0)
}

pub fn has_urgency_keyword(lowered: &str) -> bool {
    URGENCY_KEYWORDS.iter().any(|k| lowered.contains(k))
}

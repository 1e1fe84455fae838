use crate::domain::OracleDecision;
use regex::Regex;
use std::sync::LazyLock;

static PREDICTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Prediction\**\s*:\s*\**\s*\[?([01])\b").expect("static regex")
});

static CONFIDENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Confidence Score\**\s*:\s*\**\s*\[?([0-9]*\.?[0-9]+)").expect("static regex")
});

const RATIONALE_LABEL: &str = "Rationale:";

/// Reads the terminal decision response.
///
/// The last `Prediction:` and `Confidence Score:` win. A stated confidence
/// outside `[0, 1]` is discarded. The rationale is everything after the last
/// `Rationale:` label, untrimmed beyond surrounding whitespace; shaping it
/// into a single bounded line is the decision maker's job.
pub fn parse_decision(text: &str) -> OracleDecision {
    let prediction = PREDICTION
        .captures_iter(text)
        .last()
        .and_then(|c| c[1].parse::<u8>().ok());

    let confidence = CONFIDENCE
        .captures_iter(text)
        .last()
        .and_then(|c| c[1].parse::<f64>().ok())
        .filter(|c| (0.0..=1.0).contains(c));

    let rationale = text
        .rfind(RATIONALE_LABEL)
        .map(|pos| text[pos + RATIONALE_LABEL.len()..].trim())
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    OracleDecision {
        prediction,
        confidence,
        rationale,
    }
}

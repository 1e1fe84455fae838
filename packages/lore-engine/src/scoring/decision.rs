use super::aggregator::ClaimSignals;
use super::breakdown::ScoreBreakdown;
use crate::config::ScoringConfig;
use crate::domain::OracleDecision;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::warn;

pub const NO_RATIONALE: &str = "No rationale provided";

static CLAIM_CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bclaims?\s*(?:id\s*)?[:#]?\s*([A-Za-z0-9_]+)((?:\s*(?:,|and|&|/)\s*#?[A-Za-z0-9_]+)*)")
        .expect("static regex")
});

/// The verdict written to the result sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub prediction: u8,
    pub confidence_score: f64,
    pub rationale: String,
    /// What the oracle itself predicted, when it said.
    pub oracle_prediction: Option<u8>,
    /// For inconsistent verdicts: whether the rationale names a flagged claim.
    pub cites_flagged_claim: bool,
}

/// Thresholds the final score and packages confidence plus rationale.
#[derive(Debug, Clone)]
pub struct DecisionMaker {
    config: ScoringConfig,
}

impl DecisionMaker {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn predict(&self, final_score: f64) -> u8 {
        if final_score < self.config.threshold {
            0
        } else {
            1
        }
    }

    /// Fallback confidence keyed on the prediction.
    pub fn default_confidence(&self, prediction: u8) -> f64 {
        if prediction == 1 {
            self.config.default_confidence_consistent
        } else {
            self.config.default_confidence_inconsistent
        }
    }

    /// The engine's prediction always stands. Confidence is the oracle's stated
    /// value when it gave one in range, else the final score; a story with no
    /// MAJOR claims has a vacuous score and falls back to the default
    /// confidence for its prediction instead.
    pub fn decide(
        &self,
        breakdown: &ScoreBreakdown,
        oracle: &OracleDecision,
        signals: &[ClaimSignals],
    ) -> Decision {
        let prediction = self.predict(breakdown.final_score);

        if let Some(stated) = oracle.prediction.filter(|p| *p != prediction) {
            warn!(
                "Oracle predicted {} but score {:.3} gives {}; keeping {}",
                stated, breakdown.final_score, prediction, prediction
            );
        }

        let confidence_score = match oracle.confidence {
            Some(stated) => stated,
            None if breakdown.total_possible_penalty <= 0.0 => self.default_confidence(prediction),
            None => breakdown.final_score,
        };

        let rationale = sanitize_rationale(oracle.rationale.as_deref(), self.config.rationale_max_chars);

        let cites_flagged_claim = prediction == 1 || cites_flagged(&rationale, signals);
        if !cites_flagged_claim {
            warn!("Rationale for an inconsistent verdict names no contradicted or orphaned claim");
        }

        Decision {
            prediction,
            confidence_score,
            rationale,
            oracle_prediction: oracle.prediction,
            cites_flagged_claim,
        }
    }
}

/// First line only, surrounding quotes stripped, at most `max_chars`
/// characters.
pub fn sanitize_rationale(raw: Option<&str>, max_chars: usize) -> String {
    let line = raw
        .and_then(|r| r.lines().map(str::trim).find(|l| !l.is_empty()))
        .unwrap_or_default();
    let line = line
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '“' | '”' | '*') || c.is_whitespace());

    if line.is_empty() {
        return NO_RATIONALE.to_string();
    }
    line.chars().take(max_chars).collect::<String>().trim_end().to_string()
}

/// Claim ids referenced as "Claim 3", "claims 2 and 5", "Claim #4".
pub fn cited_claims(rationale: &str) -> Vec<String> {
    let mut ids = Vec::new();
    for caps in CLAIM_CITATION.captures_iter(rationale) {
        ids.push(caps[1].to_string());
        if let Some(rest) = caps.get(2) {
            ids.extend(
                rest.as_str()
                    .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("and"))
                    .map(str::to_string),
            );
        }
    }
    ids
}

fn cites_flagged(rationale: &str, signals: &[ClaimSignals]) -> bool {
    let cited = cited_claims(rationale);
    signals
        .iter()
        .filter(|s| s.is_flagged())
        .any(|s| cited.iter().any(|id| *id == s.claim_id))
}

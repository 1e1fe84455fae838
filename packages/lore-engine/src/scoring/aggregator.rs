use super::breakdown::ScoreBreakdown;
use crate::config::ScoringConfig;
use crate::domain::{
    CausalVerdict, ClaimId, ClaimSet, CounterfactualResult, Importance, Phase, StoryAnnotations,
    TemporalStatus, TransitionType,
};
use crate::graph::OrphanReport;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Everything the engine concluded about one claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSignals {
    pub claim_id: ClaimId,
    pub importance: Importance,
    pub verdict: Option<CausalVerdict>,
    pub temporal_contradictions: usize,
    pub impossible_transition: bool,
    /// The fatal root this claim was orphaned from.
    pub orphaned_by: Option<ClaimId>,
    pub counterfactual_violated: bool,
    pub penalty: f64,
}

impl ClaimSignals {
    fn new(claim_id: &str, importance: Importance) -> Self {
        Self {
            claim_id: claim_id.to_string(),
            importance,
            verdict: None,
            temporal_contradictions: 0,
            impossible_transition: false,
            orphaned_by: None,
            counterfactual_violated: false,
            penalty: 0.0,
        }
    }

    /// True when any signal fired for the claim, weighted or not.
    pub fn is_flagged(&self) -> bool {
        self.verdict.is_some_and(|v| v.is_contradiction())
            || self.temporal_contradictions > 0
            || self.impossible_transition
            || self.orphaned_by.is_some()
            || self.counterfactual_violated
    }
}

/// Turns parsed annotations plus the orphan report into weighted penalties.
///
/// Only registered claims contribute. Repeated records for the same claim
/// collapse to the last one. Penalties from different categories add up on
/// the same claim.
#[derive(Debug, Clone)]
pub struct SignalAggregator {
    config: ScoringConfig,
}

impl SignalAggregator {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn aggregate(
        &self,
        claims: &ClaimSet,
        annotations: &StoryAnnotations,
        orphans: &OrphanReport,
    ) -> (Vec<ClaimSignals>, ScoreBreakdown) {
        let weights = &self.config.penalties;
        let mut breakdown = ScoreBreakdown::default();
        let mut signals: Vec<ClaimSignals> = claims
            .iter()
            .map(|c| ClaimSignals::new(&c.id, c.importance))
            .collect();
        let position: HashMap<&str, usize> = claims
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.as_str(), i))
            .collect();

        // Causal
        for (id, verdict) in claims.effective_verdicts(&annotations.causal) {
            let Some(&i) = position.get(id.as_str()) else {
                continue;
            };
            let entry = &mut signals[i];
            entry.verdict = Some(verdict);
            let (tally, penalty) = match (entry.importance, verdict) {
                (_, CausalVerdict::Consistent) => continue,
                (Importance::Major, CausalVerdict::FatalContradiction) => {
                    (&mut breakdown.major_fatal, weights.major_fatal)
                }
                (Importance::Major, CausalVerdict::SoftContradiction) => {
                    (&mut breakdown.major_soft, weights.major_soft)
                }
                (Importance::Minor, _) => (&mut breakdown.minor_issues, weights.minor_contradiction),
            };
            tally.record(penalty);
            entry.penalty += penalty;
        }

        // Temporal: last stated status per (claim, phase)
        let mut phases: HashMap<(&str, Phase), TemporalStatus> = HashMap::new();
        for annotation in &annotations.temporal {
            if let Some(status) = annotation.status {
                phases.insert((annotation.claim_id.as_str(), annotation.phase), status);
            }
        }
        let mut contradicting: Vec<(&str, Phase)> = phases
            .into_iter()
            .filter(|(_, status)| *status == TemporalStatus::Contradicts)
            .map(|(key, _)| key)
            .collect();
        contradicting.sort();
        for (id, _) in contradicting {
            let Some(&i) = position.get(id) else {
                continue;
            };
            signals[i].temporal_contradictions += 1;
            signals[i].penalty += weights.temporal_contradiction;
            breakdown
                .temporal_contradictions
                .record(weights.temporal_contradiction);
        }

        // Memory
        let mut transitions: HashMap<&str, TransitionType> = HashMap::new();
        for memory in &annotations.memory {
            transitions.insert(memory.claim_id.as_str(), memory.transition_type);
        }
        for signal in signals.iter_mut() {
            if transitions.get(signal.claim_id.as_str()) == Some(&TransitionType::Impossible) {
                signal.impossible_transition = true;
                signal.penalty += weights.memory_impossible;
                breakdown.memory_violations.record(weights.memory_impossible);
            }
        }

        // Dependency
        for orphan in &orphans.orphans {
            let Some(&i) = position.get(orphan.claim_id.as_str()) else {
                continue;
            };
            signals[i].orphaned_by = Some(orphan.root_id.clone());
            signals[i].penalty += weights.orphaned;
            breakdown.dependency_violations.record(weights.orphaned);
        }

        // Counterfactual
        let mut results: HashMap<&str, CounterfactualResult> = HashMap::new();
        for check in &annotations.counterfactuals {
            results.insert(check.claim_id.as_str(), check.result);
        }
        for signal in signals.iter_mut() {
            if results.get(signal.claim_id.as_str()) == Some(&CounterfactualResult::Violated) {
                signal.counterfactual_violated = true;
                signal.penalty += weights.counterfactual_violated;
                breakdown
                    .counterfactual_violations
                    .record(weights.counterfactual_violated);
            }
        }

        let total_possible = claims.major_count() as f64 * self.config.major_weight;
        breakdown.finalize(total_possible);

        debug!(
            "Aggregated {} claims: penalty {:.2} of {:.2}, score {:.3}",
            signals.len(),
            breakdown.total_penalty,
            breakdown.total_possible_penalty,
            breakdown.final_score
        );

        (signals, breakdown)
    }
}

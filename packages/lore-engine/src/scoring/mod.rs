//! Consistency scoring.
//!
//! Parsed annotations go in; a [`ScoreBreakdown`] and a thresholded
//! [`Decision`] come out. The engine owns every number: the oracle's own
//! orphan classification and prediction are logged when they disagree but
//! never change the result.

pub mod aggregator;
pub mod breakdown;
pub mod decision;

pub use aggregator::{ClaimSignals, SignalAggregator};
pub use breakdown::{ScoreBreakdown, SignalTally, normalize};
pub use decision::{Decision, DecisionMaker, NO_RATIONALE, cited_claims, sanitize_rationale};

use crate::config::ScoringConfig;
use crate::domain::{ClaimSet, StoryAnnotations};
use crate::graph::{ClaimGraph, OrphanDisagreement, OrphanReport};
use crate::parser;

/// Intermediate result for one story, before the decision prompt.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub claims: ClaimSet,
    pub graph: ClaimGraph,
    pub orphans: OrphanReport,
    pub disagreements: Vec<OrphanDisagreement>,
    pub signals: Vec<ClaimSignals>,
    pub breakdown: ScoreBreakdown,
}

impl Assessment {
    pub fn flagged(&self) -> impl Iterator<Item = &ClaimSignals> {
        self.signals.iter().filter(|s| s.is_flagged())
    }
}

#[derive(Debug, Clone)]
pub struct ConsistencyEngine {
    aggregator: SignalAggregator,
    decision_maker: DecisionMaker,
}

impl Default for ConsistencyEngine {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

impl ConsistencyEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            aggregator: SignalAggregator::new(config.clone()),
            decision_maker: DecisionMaker::new(config),
        }
    }

    /// Reconciles claims, propagates orphan status and scores the story.
    pub fn assess(&self, annotations: &StoryAnnotations) -> Assessment {
        let claims = ClaimSet::reconcile(annotations);
        let graph = ClaimGraph::build(&claims, &annotations.dependencies);
        let orphans = graph.propagate_orphans(&claims.fatal_roots(&annotations.causal));
        let disagreements = orphans.disagreements(&graph, &annotations.orphan_proposals);
        let (signals, breakdown) = self.aggregator.aggregate(&claims, annotations, &orphans);

        Assessment {
            claims,
            graph,
            orphans,
            disagreements,
            signals,
            breakdown,
        }
    }

    /// Reads the terminal oracle response and settles the verdict.
    pub fn decide(&self, assessment: &Assessment, decision_text: &str) -> Decision {
        let oracle = parser::parse_decision(decision_text);
        self.decision_maker
            .decide(&assessment.breakdown, &oracle, &assessment.signals)
    }
}

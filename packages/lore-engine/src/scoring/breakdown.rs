use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Count and summed penalty for one signal category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalTally {
    pub count: usize,
    pub penalty: f64,
}

impl SignalTally {
    pub fn record(&mut self, penalty: f64) {
        self.count += 1;
        self.penalty += penalty;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub major_fatal: SignalTally,
    pub major_soft: SignalTally,
    pub minor_issues: SignalTally,
    pub temporal_contradictions: SignalTally,
    pub memory_violations: SignalTally,
    pub dependency_violations: SignalTally,
    pub counterfactual_violations: SignalTally,
    pub total_penalty: f64,
    pub total_possible_penalty: f64,
    pub final_score: f64,
}

impl ScoreBreakdown {
    pub fn categories(&self) -> [(&'static str, &SignalTally); 7] {
        [
            ("MAJOR FATAL", &self.major_fatal),
            ("MAJOR SOFT", &self.major_soft),
            ("MINOR issues", &self.minor_issues),
            ("Temporal contradictions", &self.temporal_contradictions),
            ("Memory violations", &self.memory_violations),
            ("Dependency violations", &self.dependency_violations),
            ("Counterfactual violations", &self.counterfactual_violations),
        ]
    }

    /// Sums the category penalties and normalizes against `total_possible`.
    pub fn finalize(&mut self, total_possible: f64) {
        let total: f64 = self.categories().iter().map(|(_, t)| t.penalty).sum();
        self.total_penalty = total;
        self.total_possible_penalty = total_possible;
        self.final_score = normalize(self.total_penalty, total_possible);
    }

    /// Text block handed to the decision prompt.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Contradiction Score: {:.3}", self.final_score);
        let _ = writeln!(out, "Breakdown:");
        for (label, tally) in self.categories() {
            let _ = writeln!(out, "- {}: {} (-{:.2})", label, tally.count, tally.penalty);
        }
        let _ = writeln!(out, "Total Penalty: {:.2}", self.total_penalty);
        let _ = writeln!(out, "Total Possible Penalty: {:.2}", self.total_possible_penalty);
        let _ = write!(out, "Final Score: {:.3}", self.final_score);
        out
    }
}

/// `1 - penalty / possible`, clamped to `[0, 1]`. With nothing to lose
/// (`possible <= 0`) the story is fully consistent.
pub fn normalize(total_penalty: f64, total_possible: f64) -> f64 {
    if total_possible <= 0.0 || !total_possible.is_finite() {
        return 1.0;
    }
    let score = 1.0 - total_penalty / total_possible;
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}

//! Prompt builders, one per oracle stage.
//!
//! Each prompt pins the output format to the labels the parsers read
//! (`Claim ID`, `Importance:`, `Status:`, `Result:` and so on).

use crate::domain::Claim;
use crate::scoring::{ClaimSignals, ScoreBreakdown};
use std::fmt::Write;

/// Numbered claim list as shown to the oracle.
pub fn render_claims(claims: &[Claim]) -> String {
    let mut out = String::new();
    for claim in claims {
        let _ = writeln!(out, "Claim {}: {}", claim.id, claim.text);
    }
    out
}

pub fn extract_claims(backstory: &str) -> String {
    format!(
        r#"Extract all explicit and implicit claims from the backstory.

Organize into:
1. Early-life events
2. Formative experiences
3. Beliefs and values
4. Fears and psychological traits
5. Ambitions and goals
6. Assumptions about how the world works

Rules:
- One numbered line per claim, numbering continues across sections
- Each must be a factual claim
- Do not invent

Backstory:
{backstory}
"#
    )
}

pub fn classify_importance(claims: &str) -> String {
    format!(
        r#"Classify each claim as MAJOR or MINOR.

MAJOR:
- Shapes identity, values, motivations
- Affects causal chains
- Influences multiple future events

MINOR:
- Descriptive, stylistic, incidental

Output for each claim:
Claim ID
Importance: MAJOR/MINOR
Reason: 1 line

Claims:
{claims}
"#
    )
}

pub fn map_dependencies(claims: &str) -> String {
    format!(
        r#"Map logical dependencies between the backstory claims.

A claim depends on a prerequisite claim when:
- It is a motivation or belief caused by the prerequisite event.
- It is a goal meant to resolve a trauma in the prerequisite.
- It is an assumption grounded in the prerequisite experience.

Output one line per dependency:
Claim X -> Claim Y (Reason)

Claims without prerequisites are omitted.

Claims:
{claims}
"#
    )
}

pub fn generate_queries(claims: &str) -> String {
    format!(
        r#"For each claim, write a short search query that would find relevant
evidence in the novel.

Output:
Claim 1: <query>
Claim 2: <query>
...

Claims:
{claims}
"#
    )
}

pub fn temporal_analysis(claims: &str, evidence: &str) -> String {
    format!(
        r#"Perform temporal constraint mapping.

For each claim, analyze the narrative phases:
- EARLY: introduction/background
- MID: turning points/conflicts
- LATE: final outcomes

For each phase give:
Status: Supports / Contradicts / Constrains
Explanation: 1 line

Output format:
Claim ID

EARLY:
Status:
Explanation:

MID:
Status:
Explanation:

LATE:
Status:
Explanation:

Claims:
{claims}

Evidence:
{evidence}
"#
    )
}

pub fn causal_evaluation(claims: &str, importance: &str, temporal: &str) -> String {
    format!(
        r#"Evaluate narrative consistency with importance weighting.

For each claim:
- Use its IMPORTANCE (MAJOR / MINOR)
- Use the EARLY/MID/LATE analysis
- Classify as:
  FATAL CONTRADICTION (only for MAJOR claims)
  SOFT CONTRADICTION
  CONSISTENT

Output:
Claim ID
Importance:
Result:
Explanation: 1-2 lines

Claims:
{claims}

Importance:
{importance}

Temporal Analysis:
{temporal}
"#
    )
}

pub fn memory_propagation(claims: &str, temporal: &str, importance: &str) -> String {
    format!(
        r#"Track the character's mental state across the narrative.

For each MAJOR claim:
1. State the belief or trait in the EARLY, MID and LATE phases.
2. Classify the transitions:
   - GRADUAL: plausible evolution with triggering events
   - SUDDEN: unexplained rapid shift
   - IMPOSSIBLE: direct reversal without causal justification
3. For SUDDEN or IMPOSSIBLE transitions, name the trigger that would be
   needed and whether the evidence contains it.

Output format:
Claim ID
Importance:
EARLY State: <belief/trait>
MID State: <belief/trait>
LATE State: <belief/trait>
Transition Type: GRADUAL / SUDDEN / IMPOSSIBLE
Trigger Events: <list or NONE FOUND>
Analysis: 1-2 lines

Claims:
{claims}

Temporal Analysis:
{temporal}

Importance:
{importance}
"#
    )
}

pub fn cross_claim_validation(claims: &str, causal: &str, dependencies: &str) -> String {
    format!(
        r#"Perform cross-claim dependency validation.

A claim is CAUSALLY ORPHANED when it depends, directly or through other
claims, on a root claim that has a FATAL CONTRADICTION. Without the root
event the dependent goal or belief has no motivation left in the story.

Output format:
Claim ID
Status: CAUSALLY ORPHANED / VALID
Explanation: 1-2 lines

Claims:
{claims}

Causal Analysis:
{causal}

Dependencies:
{dependencies}
"#
    )
}

pub fn counterfactual_verification(claims: &str, evidence: &str, importance: &str) -> String {
    format!(
        r#"Perform counterfactual verification.

For each MAJOR claim:
1. Hypothesis: "If the claim is true..."
2. Expectation: "...the character MUST or MUST NOT act a certain way."
3. Verification: does the evidence show the opposite behavior?

Example:
Claim: "Pacifist"
Expectation: Must not fight back in an ambush.
Evidence: "He punched the guard."
Verification Result: VIOLATED

Output format:
Claim ID
Hypothesis:
Expectation:
Verification Result: SATISFIED / VIOLATED / UNKNOWN
Explanation: 1 line

Claims:
{claims}

Importance:
{importance}

Evidence:
{evidence}
"#
    )
}

/// Flagged claims as bullet lines for the decision prompt.
pub fn render_flagged(signals: &[ClaimSignals]) -> String {
    let mut out = String::new();
    for signal in signals.iter().filter(|s| s.is_flagged()) {
        let mut reasons: Vec<String> = Vec::new();
        if let Some(verdict) = signal.verdict.filter(|v| v.is_contradiction()) {
            reasons.push(verdict.to_string());
        }
        if signal.temporal_contradictions > 0 {
            reasons.push(format!("{} temporal contradictions", signal.temporal_contradictions));
        }
        if signal.impossible_transition {
            reasons.push("IMPOSSIBLE transition".to_string());
        }
        if let Some(root) = &signal.orphaned_by {
            reasons.push(format!("CAUSALLY ORPHANED by Claim {root}"));
        }
        if signal.counterfactual_violated {
            reasons.push("VIOLATED expectation".to_string());
        }
        let _ = writeln!(
            out,
            "- Claim {} ({}): {}",
            signal.claim_id,
            signal.importance,
            reasons.join(", ")
        );
    }
    if out.is_empty() {
        out.push_str("- none\n");
    }
    out
}

pub struct DecisionContext<'a> {
    pub breakdown: &'a ScoreBreakdown,
    pub threshold: f64,
    pub signals: &'a [ClaimSignals],
    pub causal: &'a str,
    pub memory: &'a str,
    pub counterfactual: &'a str,
}

pub fn final_decision(ctx: &DecisionContext<'_>) -> String {
    let score = ctx.breakdown.render();
    let flagged = render_flagged(ctx.signals);
    let threshold = ctx.threshold;
    let causal = ctx.causal;
    let memory = ctx.memory;
    let counterfactual = ctx.counterfactual;
    format!(
        r#"Make the final consistency judgment. The score below is already
computed and is not up for revision.

Decision Rules:
- Final Score < {threshold} -> Prediction: 0 (Contradict)
- Final Score >= {threshold} -> Prediction: 1 (Consistent)

Rationale Requirements:
- For Prediction 0, name the failing claim (e.g. "Root Claim 3 contradicted").
- Include a short verbatim quote from the novel as proof.
- One line.

Output format:
Prediction: <0 or 1>
Confidence Score: <0.0 to 1.0>
Rationale: <specific failure> + "direct quote"

Score Analysis:
{score}

Flagged Claims:
{flagged}
Weighted Analysis:
{causal}

Memory States:
{memory}

Counterfactual Analysis:
{counterfactual}
"#
    )
}

use super::{RawRecord, clean_line, field, non_empty, split_records};
use crate::domain::{
    CausalResult, CausalVerdict, CounterfactualCheck, CounterfactualResult, Importance,
    MemoryTransition, OrphanProposal, OrphanStatus, Phase, PhaseStates, TemporalAnnotation,
    TemporalStatus, TransitionType,
};
use regex::Regex;
use std::sync::LazyLock;

static PHASE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(EARLY|MID|LATE)(?:\s+[Pp]hase|\s+PHASE)?\s*(?::|-|$)\s*(.*)$")
        .expect("static regex")
});

/// Records that carry no recognised field are stray prose that happened to
/// start with "Claim N" and are dropped.
fn labelled(text: &str) -> impl Iterator<Item = RawRecord<'_>> {
    split_records(text)
        .into_iter()
        .filter(|r| r.fields().next().is_some())
}

fn phase_header(line: &str) -> Option<(Phase, &str)> {
    let line = clean_line(line);
    let caps = PHASE_HEADER.captures(line)?;
    let phase = Phase::from_label(caps.get(1)?.as_str())?;
    Some((phase, caps.get(2).map_or("", |m| m.as_str()).trim()))
}

/// Reads per-claim EARLY/MID/LATE blocks. A phase that is named without a
/// recognisable `Status:` is kept with `status: None`; it contributes no
/// signal.
pub fn parse_temporal(text: &str) -> Vec<TemporalAnnotation> {
    let mut annotations = Vec::new();

    for record in split_records(text) {
        let mut phases: Vec<TemporalAnnotation> = Vec::new();

        for line in &record.lines {
            if let Some((phase, rest)) = phase_header(line) {
                match phases.iter().position(|a| a.phase == phase) {
                    Some(pos) => {
                        let entry = phases.remove(pos);
                        phases.push(entry);
                    }
                    None => phases.push(TemporalAnnotation {
                        claim_id: record.claim_id.clone(),
                        phase,
                        status: None,
                        explanation: None,
                    }),
                }
                // "EARLY: Status: Supports" or "EARLY: Supports"
                if let (Some(current), false) = (phases.last_mut(), rest.is_empty()) {
                    let inline = match field(rest) {
                        Some(f) if f.label == "Status" => TemporalStatus::from_label(f.value),
                        Some(_) => None,
                        None => TemporalStatus::from_label(rest),
                    };
                    current.status = inline.or(current.status);
                }
                continue;
            }

            let (Some(f), Some(current)) = (field(line), phases.last_mut()) else {
                continue;
            };
            match f.label {
                "Status" => current.status = TemporalStatus::from_label(f.value).or(current.status),
                "Explanation" => current.explanation = non_empty(f.value),
                _ => {}
            }
        }

        phases.sort_by_key(|a| a.phase);
        annotations.extend(phases);
    }

    annotations
}

/// Reads `Importance: / Result: / Explanation:` records. A missing or
/// unreadable `Result:` counts as CONSISTENT.
pub fn parse_causal(text: &str) -> Vec<CausalResult> {
    labelled(text)
        .map(|record| CausalResult {
            importance: record.value("Importance").and_then(Importance::from_label),
            verdict: record
                .value("Result")
                .and_then(CausalVerdict::from_label)
                .unwrap_or_default(),
            explanation: record.value("Explanation").and_then(non_empty),
            claim_id: record.claim_id,
        })
        .collect()
}

fn parse_triggers(value: Option<&str>) -> Vec<String> {
    let Some(value) = value else {
        return Vec::new();
    };
    let upper = value.trim().to_uppercase();
    if upper.is_empty() || upper.starts_with("NONE") || matches!(upper.as_str(), "N/A" | "NA" | "-")
    {
        return Vec::new();
    }
    value
        .split([',', ';'])
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Reads memory-state records. A missing `Transition Type:` is GRADUAL.
pub fn parse_memory(text: &str) -> Vec<MemoryTransition> {
    labelled(text)
        .map(|record| MemoryTransition {
            importance: record.value("Importance").and_then(Importance::from_label),
            states: PhaseStates {
                early: record.value("EARLY State").and_then(non_empty),
                mid: record.value("MID State").and_then(non_empty),
                late: record.value("LATE State").and_then(non_empty),
            },
            transition_type: record
                .value("Transition Type")
                .and_then(TransitionType::from_label)
                .unwrap_or_default(),
            trigger_events: parse_triggers(record.value("Trigger Events")),
            analysis: record.value("Analysis").and_then(non_empty),
            claim_id: record.claim_id,
        })
        .collect()
}

/// Reads the oracle's own orphan classification. A missing `Status:` is VALID.
pub fn parse_orphan_proposals(text: &str) -> Vec<OrphanProposal> {
    labelled(text)
        .map(|record| OrphanProposal {
            status: record
                .value("Status")
                .and_then(OrphanStatus::from_label)
                .unwrap_or_default(),
            explanation: record.value("Explanation").and_then(non_empty),
            claim_id: record.claim_id,
        })
        .collect()
}

/// Reads counterfactual records. A missing `Verification Result:` is UNKNOWN.
pub fn parse_counterfactuals(text: &str) -> Vec<CounterfactualCheck> {
    labelled(text)
        .map(|record| CounterfactualCheck {
            hypothesis: record.value("Hypothesis").and_then(non_empty),
            expectation: record.value("Expectation").and_then(non_empty),
            result: record
                .value("Verification Result")
                .and_then(CounterfactualResult::from_label)
                .unwrap_or_default(),
            explanation: record.value("Explanation").and_then(non_empty),
            claim_id: record.claim_id,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_temporal_blocks() {
        let text = "\
Claim 1

EARLY:
Status: Supports
Explanation: Chapter 2 shows the mine.

MID:
Status: Contradicts
Explanation: She works underground in chapter 9.

LATE:
Explanation: Not mentioned.

Claim 2
EARLY: Status: Constrains
";
        let annotations = parse_temporal(text);
        assert_eq!(annotations.len(), 4);

        assert_eq!(annotations[0].phase, Phase::Early);
        assert_eq!(annotations[0].status, Some(TemporalStatus::Supports));
        assert_eq!(annotations[1].status, Some(TemporalStatus::Contradicts));
        assert_eq!(
            annotations[1].explanation.as_deref(),
            Some("She works underground in chapter 9.")
        );
        assert_eq!(annotations[2].phase, Phase::Late);
        assert_eq!(annotations[2].status, None);

        assert_eq!(annotations[3].claim_id, "2");
        assert_eq!(annotations[3].status, Some(TemporalStatus::Constrains));
    }

    #[test]
    fn test_parse_causal_defaults_to_consistent() {
        let text = "\
Claim 1
Importance: MAJOR
Result: FATAL CONTRADICTION
Explanation: She descends the shaft willingly.

Claim 2
Importance: MINOR
Explanation: No evidence either way.
";
        let results = parse_causal(text);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].verdict, CausalVerdict::FatalContradiction);
        assert_eq!(results[0].importance, Some(Importance::Major));
        assert_eq!(results[1].verdict, CausalVerdict::Consistent);
    }

    #[test]
    fn test_stray_claim_prose_is_not_a_record() {
        let text = "\
Claim 1
Result: FATAL CONTRADICTION
Claim 2 is discussed above and needs no entry.
";
        let results = parse_causal(text);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].claim_id, "1");
    }

    #[test]
    fn test_negated_results_take_the_default() {
        let checks =
            parse_counterfactuals("Claim 1\nVerification Result: NOT SATISFIED\nClaim 2\nVerification Result: NOT VIOLATED\n");
        assert_eq!(checks.len(), 2);
        assert!(checks.iter().all(|c| c.result == CounterfactualResult::Unknown));

        let causal = parse_causal("Claim 1\nResult: NOT CONSISTENT\n");
        assert_eq!(causal[0].verdict, CausalVerdict::Consistent);

        let temporal = parse_temporal("Claim 1\nLATE:\nStatus: Does not contradict\n");
        assert_eq!(temporal.len(), 1);
        assert_eq!(temporal[0].status, None);
    }

    #[test]
    fn test_claim_prose_inside_a_record_keeps_its_verdict() {
        let text = "\
Claim 1
Importance: MAJOR
Claim 2 is the premise, so:
Result: FATAL CONTRADICTION
Explanation: she leaves the island
Claim 2
Importance: MAJOR
Result: CONSISTENT
";
        let results = parse_causal(text);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].claim_id, "1");
        assert_eq!(results[0].verdict, CausalVerdict::FatalContradiction);
        assert_eq!(results[1].claim_id, "2");
        assert_eq!(results[1].verdict, CausalVerdict::Consistent);
    }

    #[test]
    fn test_parse_memory_defaults() {
        let text = "\
Claim 3
Importance: MAJOR
EARLY State: terrified of the dark
MID State: leads the night patrol
LATE State: leads the night patrol
Transition Type: IMPOSSIBLE
Trigger Events: NONE FOUND
Analysis: Reversal with no cause.

Claim 4
EARLY State: shy
Trigger Events: the wedding; the duel
";
        let transitions = parse_memory(text);
        assert_eq!(transitions.len(), 2);
        assert_eq!(transitions[0].transition_type, TransitionType::Impossible);
        assert!(transitions[0].trigger_events.is_empty());
        assert_eq!(
            transitions[0].states.mid.as_deref(),
            Some("leads the night patrol")
        );
        assert_eq!(transitions[1].transition_type, TransitionType::Gradual);
        assert_eq!(transitions[1].trigger_events, vec!["the wedding", "the duel"]);
    }

    #[test]
    fn test_parse_orphans_and_counterfactuals() {
        let orphans = parse_orphan_proposals(
            "Claim 5\nStatus: CAUSALLY ORPHANED\nExplanation: root 2 is false\n\nClaim 6\nStatus: CAUSALLY ORPHANED / VALID\n",
        );
        assert_eq!(orphans[0].status, OrphanStatus::CausallyOrphaned);
        assert_eq!(orphans[1].status, OrphanStatus::Valid);

        let checks = parse_counterfactuals(
            "Claim 1\nHypothesis: If she fears the mine...\nExpectation: she must refuse to descend\nVerification Result: VIOLATED\n\nClaim 2\nHypothesis: If he is loyal...\n",
        );
        assert_eq!(checks[0].result, CounterfactualResult::Violated);
        assert_eq!(
            checks[0].expectation.as_deref(),
            Some("she must refuse to descend")
        );
        assert_eq!(checks[1].result, CounterfactualResult::Unknown);
    }
}

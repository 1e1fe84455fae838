use super::{clean_line, non_empty, normalize_claim_id, split_records};
use crate::domain::{Claim, ClaimId, DependencyEdge, Importance, ImportanceTag, RetrievalQuery};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static NUMBERED_CLAIM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:Claim\s+)?(\d+)\s*[.):]\**\s*(.+)$").expect("static regex")
});

static ARROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(?:->|→|=>|⇒)\s*").expect("static regex"));

static TARGET_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(?:[,;&/]|\band\b)\s*").expect("static regex"));

/// Headings the extraction prompt asks the oracle to group claims under.
const SECTION_HEADINGS: &[&str] = &[
    "early-life events",
    "formative experiences",
    "beliefs and values",
    "fears and psychological traits",
    "ambitions and goals",
    "assumptions about how the world works",
];

fn is_heading(text: &str) -> bool {
    let text = text.trim_end_matches(['*', ' ']);
    text.ends_with(':') || SECTION_HEADINGS.contains(&text.to_lowercase().as_str())
}

/// Reads the numbered claim list. The stated number becomes the claim id;
/// a number that was already used gets the next free one so no claim is lost.
/// Every claim starts as MINOR until the importance stage says otherwise.
pub fn parse_claims(text: &str) -> Vec<Claim> {
    let mut claims: Vec<Claim> = Vec::new();
    let mut taken: HashSet<u64> = HashSet::new();

    for line in text.lines() {
        let line = clean_line(line);
        let Some(caps) = NUMBERED_CLAIM.captures(line) else {
            continue;
        };
        let body = caps[2].trim_matches(|c: char| c == '*' || c.is_whitespace());
        if body.is_empty() || is_heading(body) {
            continue;
        }
        let Ok(mut number) = caps[1].parse::<u64>() else {
            continue;
        };
        if taken.contains(&number) {
            number = taken.iter().max().map_or(1, |m| m + 1);
        }
        taken.insert(number);
        claims.push(Claim::new(number.to_string(), body, Importance::Minor));
    }

    claims
}

/// Reads `Claim ID / Importance: / Reason:` records. A record without a
/// recognisable `Importance:` value yields `importance: None`, which leaves the
/// claim at its default of MINOR.
pub fn parse_importance(text: &str) -> Vec<ImportanceTag> {
    split_records(text)
        .into_iter()
        .map(|record| ImportanceTag {
            importance: record.value("Importance").and_then(Importance::from_label),
            reason: record.value("Reason").and_then(non_empty),
            claim_id: record.claim_id,
        })
        .collect()
}

fn split_reason(segment: &str) -> (&str, Option<&str>) {
    if let Some(open) = segment.find('(') {
        let reason = segment[open + 1..].trim_end().trim_end_matches(')');
        return (&segment[..open], Some(reason));
    }
    if let Some((ids, reason)) = segment.split_once(':') {
        return (ids, Some(reason));
    }
    if let Some((ids, reason)) = segment.split_once(" - ") {
        return (ids, Some(reason));
    }
    (segment, None)
}

fn claim_refs(segment: &str) -> Vec<ClaimId> {
    let mut ids: Vec<ClaimId> = Vec::new();
    for part in TARGET_SEPARATOR.split(segment) {
        if let Some(id) = normalize_claim_id(part) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids
}

/// Reads `Claim X -> Claim Y (reason)` lines. Several prerequisites may be
/// listed on one line, and chains (`A -> B -> C`) yield one edge per hop.
/// Lines naming no usable claim on either side are skipped.
pub fn parse_dependencies(text: &str) -> Vec<DependencyEdge> {
    let mut edges = Vec::new();

    for line in text.lines() {
        let line = clean_line(line);
        let segments: Vec<&str> = ARROW.split(line).collect();
        if segments.len() < 2 {
            continue;
        }

        let last = segments.len() - 1;
        let (tail, reason) = split_reason(segments[last]);
        let reason = reason
            .map(|r| r.trim().trim_matches('"').to_string())
            .unwrap_or_default();

        for hop in 0..last {
            let sources = claim_refs(segments[hop]);
            let targets = if hop + 1 == last {
                claim_refs(tail)
            } else {
                claim_refs(segments[hop + 1])
            };
            for source in &sources {
                for target in &targets {
                    edges.push(
                        DependencyEdge::new(source.clone(), target.clone())
                            .with_reason(reason.clone()),
                    );
                }
            }
        }
    }

    edges
}

/// Reads `Claim N: <query>` lines. Queries of two characters or fewer are
/// dropped; a claim listed twice keeps its last query.
pub fn parse_queries(text: &str) -> Vec<RetrievalQuery> {
    let mut queries: Vec<RetrievalQuery> = Vec::new();

    for line in text.lines() {
        let line = clean_line(line);
        let Some((label, query)) = line.split_once(':') else {
            continue;
        };
        let label = label.trim();
        if label.len() > 24 {
            continue;
        }
        let looks_like_ref = label.starts_with("Claim") || label.chars().all(|c| c.is_ascii_digit());
        if !looks_like_ref {
            continue;
        }
        let Some(claim_id) = normalize_claim_id(label) else {
            continue;
        };
        let query = query.trim().trim_matches(|c: char| c == '"' || c == '\'').trim();
        if query.chars().count() <= 2 {
            continue;
        }

        match queries.iter_mut().find(|q| q.claim_id == claim_id) {
            Some(existing) => existing.query = query.to_string(),
            None => queries.push(RetrievalQuery {
                claim_id,
                query: query.to_string(),
            }),
        }
    }

    queries
}

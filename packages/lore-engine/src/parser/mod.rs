//! Line-oriented readers for oracle output.
//!
//! The oracle follows a convention, not a grammar. Every reader here is total:
//! unrecognised lines are skipped and missing fields fall back to the
//! documented defaults, so a parse never fails a story.

pub mod analysis;
pub mod claims;
pub mod decision;

pub use analysis::{
    parse_causal, parse_counterfactuals, parse_memory, parse_orphan_proposals, parse_temporal,
};
pub use claims::{parse_claims, parse_dependencies, parse_importance, parse_queries};
pub use decision::parse_decision;

use crate::domain::ClaimId;
use regex::Regex;
use std::sync::LazyLock;

/// Field labels recognised in oracle output. Matching is case-sensitive.
pub const FIELD_LABELS: &[&str] = &[
    "Claim ID",
    "Importance",
    "Reason",
    "Status",
    "Explanation",
    "Result",
    "EARLY State",
    "MID State",
    "LATE State",
    "Transition Type",
    "Trigger Events",
    "Analysis",
    "Hypothesis",
    "Expectation",
    "Verification Result",
    "Prediction",
    "Confidence Score",
    "Rationale",
];

static ENUMERATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[.)]\s+").expect("static regex"));

/// A `Label: value` line whose label is in [`FIELD_LABELS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    pub label: &'a str,
    pub value: &'a str,
}

/// Strips list bullets, markdown emphasis and quoting from the start of a line.
pub(crate) fn clean_line(line: &str) -> &str {
    line.trim()
        .trim_start_matches(|c: char| matches!(c, '-' | '*' | '•' | '#' | '>') || c.is_whitespace())
        .trim_end_matches(|c: char| c == '*' || c.is_whitespace())
}

fn clean_value(value: &str) -> &str {
    value.trim_matches(|c: char| c == '*' || c == '_' || c.is_whitespace())
}

pub(crate) fn field(line: &str) -> Option<Field<'_>> {
    let line = clean_line(line);
    let (label, value) = line.split_once(':')?;
    let label = label.trim_matches(|c: char| c == '*' || c.is_whitespace());
    let label = FIELD_LABELS.iter().find(|known| **known == label)?;
    Some(Field {
        label: *label,
        value: clean_value(value),
    })
}

pub(crate) fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Normalises an oracle claim reference: "Claim 3", "Claim ID: 3", "#3", "3."
/// all become "3". Returns `None` for references with no usable identifier,
/// including template echoes such as "Claim ID" or "Prerequisite ID".
pub fn normalize_claim_id(raw: &str) -> Option<ClaimId> {
    let mut rest = raw.trim();
    loop {
        let before = rest.len();
        rest = rest.trim_start_matches(|c: char| {
            matches!(c, '*' | '#' | ':' | '(' | '[' | '-' | '_' | '.') || c.is_whitespace()
        });
        for prefix in ["claim", "prerequisite", "id"] {
            if rest.len() >= prefix.len()
                && rest.is_char_boundary(prefix.len())
                && rest[..prefix.len()].eq_ignore_ascii_case(prefix)
            {
                rest = &rest[prefix.len()..];
            }
        }
        if rest.len() == before {
            break;
        }
    }

    let id: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    if id.is_empty() || matches!(id.to_ascii_lowercase().as_str(), "none" | "na" | "n") {
        None
    } else {
        Some(id)
    }
}

/// Recognises a line opening a per-claim record and returns the claim id plus
/// any trailing text on the same line ("Claim 2: Importance: MAJOR").
///
/// The id must end the line or be followed by a separator (`:`, `-`, `.`,
/// `|`, `(`), a known field or a phase label. Prose such as "Claim 2 is the premise, so:"
/// is not a header.
pub(crate) fn claim_header(line: &str) -> Option<(ClaimId, &str)> {
    let mut line = clean_line(line);
    if let Some(m) = ENUMERATION.find(line) {
        line = &line[m.end()..];
    }
    let rest = line.strip_prefix("Claim")?;
    let next = rest.chars().next()?;
    if !(next.is_whitespace() || next == ':' || next == '#' || next.is_ascii_digit()) {
        return None;
    }

    let id = normalize_claim_id(rest)?;
    let pos = rest.find(id.as_str())? + id.len();
    let after = rest[pos..]
        .trim_start_matches(|c: char| matches!(c, '*' | ')' | ']') || c.is_whitespace());
    let trailing = rest[pos..].trim_start_matches(|c: char| {
        matches!(c, ':' | '-' | ')' | '.' | '*' | '|') || c.is_whitespace()
    });

    let separated = after.is_empty()
        || after.starts_with([':', '-', '.', '|', '(', '\u{2013}', '\u{2014}']);
    let phase_follows = trailing
        .split(|c: char| c == ':' || c.is_whitespace())
        .next()
        .is_some_and(|word| matches!(word, "EARLY" | "MID" | "LATE"));
    if !separated && !phase_follows && field(trailing).is_none() {
        return None;
    }
    Some((id, trailing))
}

/// One claim's slice of a record-structured block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawRecord<'a> {
    pub claim_id: ClaimId,
    pub lines: Vec<&'a str>,
}

impl<'a> RawRecord<'a> {
    pub fn fields(&self) -> impl Iterator<Item = Field<'a>> + '_ {
        self.lines.iter().filter_map(|l| field(*l))
    }

    /// Last value given for `label`, if any. Later lines override earlier ones.
    pub fn value(&self, label: &str) -> Option<&'a str> {
        self.fields()
            .filter(|f| f.label == label)
            .last()
            .map(|f| f.value)
    }
}

/// Splits a block into per-claim records. Lines before the first claim header
/// are discarded. A `Claim ID:` field line also opens a record.
pub(crate) fn split_records(text: &str) -> Vec<RawRecord<'_>> {
    let mut records: Vec<RawRecord<'_>> = Vec::new();

    for line in text.lines() {
        if let Some((claim_id, trailing)) = claim_header(line) {
            let mut lines = Vec::new();
            if !trailing.is_empty() {
                lines.push(trailing);
            }
            records.push(RawRecord { claim_id, lines });
            continue;
        }
        if let Some(current) = records.last_mut() {
            if !line.trim().is_empty() {
                current.lines.push(line);
            }
        }
    }

    records
}

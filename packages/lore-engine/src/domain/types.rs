use serde::{Deserialize, Serialize};

/// Claim identifiers are normalised oracle labels ("Claim 3" -> "3").
pub type ClaimId = String;

/// Resolves a free-text value against a keyword table.
///
/// The earliest keyword in the value wins, so trailing commentary such as
/// "SOFT CONTRADICTION (mostly consistent otherwise)" still resolves. A value
/// that lists several alternatives separated by `/` is an echo of the prompt
/// template and resolves to nothing. So does a value whose deciding keyword is
/// negated ("NOT SATISFIED", "does not contradict"); the field then takes its
/// default.
fn match_keyword<T: Copy + PartialEq>(value: &str, table: &[(&str, T)]) -> Option<T> {
    let upper = value.to_uppercase();
    let words: Vec<&str> = upper
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let mut hits: Vec<(T, bool)> = Vec::new();

    for (i, word) in words.iter().enumerate() {
        if let Some((_, variant)) = table.iter().find(|(kw, _)| kw == word) {
            hits.push((*variant, negated(&words[..i])));
        }
    }

    let (first, first_negated) = *hits.first()?;
    if first_negated {
        return None;
    }
    let ambiguous = hits.iter().any(|(v, _)| *v != first);
    if ambiguous && value.contains('/') {
        return None;
    }
    Some(first)
}

/// True when the words just before a keyword negate it: "NOT", "NO",
/// "NEVER", or a contraction split as "DOESN" + "T".
fn negated(preceding: &[&str]) -> bool {
    match preceding {
        [.., "NOT" | "NO" | "NEVER"] => true,
        [.., contraction, "T"] => contraction.ends_with('N'),
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Importance {
    Major,
    #[default]
    Minor,
}

impl Importance {
    pub fn from_label(value: &str) -> Option<Self> {
        match_keyword(value, &[("MAJOR", Self::Major), ("MINOR", Self::Minor)])
    }
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Major => write!(f, "MAJOR"),
            Self::Minor => write!(f, "MINOR"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Early,
    Mid,
    Late,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Early, Phase::Mid, Phase::Late];

    pub fn from_label(value: &str) -> Option<Self> {
        match_keyword(
            value,
            &[("EARLY", Self::Early), ("MID", Self::Mid), ("LATE", Self::Late)],
        )
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Early => write!(f, "EARLY"),
            Self::Mid => write!(f, "MID"),
            Self::Late => write!(f, "LATE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemporalStatus {
    Supports,
    Contradicts,
    Constrains,
}

impl TemporalStatus {
    pub fn from_label(value: &str) -> Option<Self> {
        match_keyword(
            value,
            &[
                ("SUPPORTS", Self::Supports),
                ("SUPPORT", Self::Supports),
                ("SUPPORTED", Self::Supports),
                ("CONTRADICTS", Self::Contradicts),
                ("CONTRADICT", Self::Contradicts),
                ("CONTRADICTED", Self::Contradicts),
                ("CONSTRAINS", Self::Constrains),
                ("CONSTRAIN", Self::Constrains),
                ("CONSTRAINED", Self::Constrains),
            ],
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CausalVerdict {
    FatalContradiction,
    SoftContradiction,
    #[default]
    Consistent,
}

impl CausalVerdict {
    pub fn from_label(value: &str) -> Option<Self> {
        match_keyword(
            value,
            &[
                ("FATAL", Self::FatalContradiction),
                ("SOFT", Self::SoftContradiction),
                ("CONTRADICTION", Self::SoftContradiction),
                ("INCONSISTENT", Self::SoftContradiction),
                ("CONSISTENT", Self::Consistent),
            ],
        )
    }

    pub fn is_contradiction(&self) -> bool {
        !matches!(self, Self::Consistent)
    }
}

impl std::fmt::Display for CausalVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FatalContradiction => write!(f, "FATAL CONTRADICTION"),
            Self::SoftContradiction => write!(f, "SOFT CONTRADICTION"),
            Self::Consistent => write!(f, "CONSISTENT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionType {
    #[default]
    Gradual,
    Sudden,
    Impossible,
}

impl TransitionType {
    pub fn from_label(value: &str) -> Option<Self> {
        match_keyword(
            value,
            &[
                ("GRADUAL", Self::Gradual),
                ("SUDDEN", Self::Sudden),
                ("IMPOSSIBLE", Self::Impossible),
            ],
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrphanStatus {
    #[default]
    Valid,
    CausallyOrphaned,
}

impl OrphanStatus {
    pub fn from_label(value: &str) -> Option<Self> {
        match_keyword(
            value,
            &[
                ("ORPHANED", Self::CausallyOrphaned),
                ("VALID", Self::Valid),
            ],
        )
    }
}

impl std::fmt::Display for OrphanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Valid => write!(f, "VALID"),
            Self::CausallyOrphaned => write!(f, "CAUSALLY ORPHANED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CounterfactualResult {
    Satisfied,
    Violated,
    #[default]
    Unknown,
}

impl CounterfactualResult {
    pub fn from_label(value: &str) -> Option<Self> {
        match_keyword(
            value,
            &[
                ("SATISFIED", Self::Satisfied),
                ("VIOLATED", Self::Violated),
                ("UNKNOWN", Self::Unknown),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_labels() {
        assert_eq!(
            CausalVerdict::from_label("FATAL CONTRADICTION"),
            Some(CausalVerdict::FatalContradiction)
        );
        assert_eq!(
            CausalVerdict::from_label("fatal_contradiction"),
            Some(CausalVerdict::FatalContradiction)
        );
        assert_eq!(
            CausalVerdict::from_label("SOFT CONTRADICTION (otherwise consistent)"),
            Some(CausalVerdict::SoftContradiction)
        );
        assert_eq!(
            CausalVerdict::from_label("Consistent"),
            Some(CausalVerdict::Consistent)
        );
        assert_eq!(CausalVerdict::from_label("unclear"), None);
    }

    #[test]
    fn test_template_echo_is_ambiguous() {
        assert_eq!(TransitionType::from_label("GRADUAL / SUDDEN / IMPOSSIBLE"), None);
        assert_eq!(OrphanStatus::from_label("CAUSALLY ORPHANED / VALID"), None);
        assert_eq!(Importance::from_label("MAJOR/MINOR"), None);
    }

    #[test]
    fn test_inconsistent_is_not_consistent() {
        assert_eq!(
            CausalVerdict::from_label("Inconsistent"),
            Some(CausalVerdict::SoftContradiction)
        );
    }

    #[test]
    fn test_negated_keyword_falls_back_to_default() {
        assert_eq!(CounterfactualResult::from_label("NOT SATISFIED"), None);
        assert_eq!(CounterfactualResult::from_label("NOT VIOLATED"), None);
        assert_eq!(CausalVerdict::from_label("NOT CONSISTENT"), None);
        assert_eq!(CausalVerdict::from_label("No contradiction"), None);
        assert_eq!(TemporalStatus::from_label("Does not contradict"), None);
        assert_eq!(TemporalStatus::from_label("doesn't contradict"), None);
        assert_eq!(TransitionType::from_label("never sudden"), None);
    }

    #[test]
    fn test_negation_after_the_deciding_keyword_is_ignored() {
        assert_eq!(
            CausalVerdict::from_label("SOFT CONTRADICTION (not fatal)"),
            Some(CausalVerdict::SoftContradiction)
        );
        assert_eq!(
            CounterfactualResult::from_label("VIOLATED, not merely strained"),
            Some(CounterfactualResult::Violated)
        );
    }

    #[test]
    fn test_temporal_status_synonyms() {
        assert_eq!(
            TemporalStatus::from_label("Contradicted"),
            Some(TemporalStatus::Contradicts)
        );
        assert_eq!(
            TemporalStatus::from_label("supports"),
            Some(TemporalStatus::Supports)
        );
    }
}

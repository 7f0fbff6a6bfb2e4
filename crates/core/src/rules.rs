//! Keyword rule layer of the classifier: fixed phrase sets tested in a
//! fixed priority order, plus the no-early-exit multi-match probe the
//! router uses to detect ambiguous requests.

use std::collections::BTreeSet;

use crate::intent::Intent;

/// Keyword sets and fixed confidences for the rule pass. Carried as data
/// rather than embedded literals so tests can vary the sets without
/// touching classification logic.
#[derive(Clone, Debug)]
pub struct RuleBook {
    pub time_phrases: Vec<String>,
    pub time_prefixes: Vec<String>,
    pub incident_keywords: Vec<String>,
    pub advice_keywords: Vec<String>,
    pub time_confidence: f64,
    pub incident_confidence: f64,
    pub advice_confidence: f64,
    pub unknown_confidence: f64,
}

impl Default for RuleBook {
    fn default() -> Self {
        Self {
            time_phrases: to_owned(&["time in ", "current time"]),
            time_prefixes: to_owned(&["what time"]),
            incident_keywords: to_owned(&[
                "redis",
                "outage",
                "incident",
                "kubernetes",
                "pod restart",
                "connection pool",
                "high cpu",
            ]),
            advice_keywords: to_owned(&[
                "observability",
                "evaluation",
                "guardrail",
                "hallucination",
                "feedback loop",
                "production ai",
            ]),
            time_confidence: 0.90,
            incident_confidence: 0.85,
            advice_confidence: 0.70,
            unknown_confidence: 0.30,
        }
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl RuleBook {
    /// First match in priority order: WorldTime, then RunbookSearch, then
    /// GeneralOpsAdvice. No match yields `Unknown` at the floor confidence.
    pub fn classify(&self, input: &str) -> (Intent, f64) {
        let lower = input.trim().to_ascii_lowercase();

        if self.matches_time(&lower) {
            return (Intent::WorldTime, self.time_confidence);
        }
        if self.matches_incident(&lower) {
            return (Intent::RunbookSearch, self.incident_confidence);
        }
        if self.matches_advice(&lower) {
            return (Intent::GeneralOpsAdvice, self.advice_confidence);
        }

        (Intent::Unknown, self.unknown_confidence)
    }

    /// Evaluates all three sets without early exit. Two or more matches
    /// mean the request is ambiguous and must not be silently routed.
    pub fn detect_matches(&self, input: &str) -> BTreeSet<Intent> {
        let lower = input.trim().to_ascii_lowercase();
        let mut matches = BTreeSet::new();

        if self.matches_time(&lower) {
            matches.insert(Intent::WorldTime);
        }
        if self.matches_incident(&lower) {
            matches.insert(Intent::RunbookSearch);
        }
        if self.matches_advice(&lower) {
            matches.insert(Intent::GeneralOpsAdvice);
        }

        matches
    }

    fn matches_time(&self, lower: &str) -> bool {
        self.time_phrases.iter().any(|phrase| lower.contains(phrase.as_str()))
            || self.time_prefixes.iter().any(|prefix| lower.starts_with(prefix.as_str()))
    }

    fn matches_incident(&self, lower: &str) -> bool {
        self.incident_keywords.iter().any(|keyword| lower.contains(keyword.as_str()))
    }

    fn matches_advice(&self, lower: &str) -> bool {
        self.advice_keywords.iter().any(|keyword| lower.contains(keyword.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::RuleBook;
    use crate::intent::Intent;

    #[test]
    fn time_questions_win_with_high_confidence() {
        let rules = RuleBook::default();
        assert_eq!(rules.classify("What time is it in Tokyo?"), (Intent::WorldTime, 0.90));
        assert_eq!(rules.classify("current time please"), (Intent::WorldTime, 0.90));
    }

    #[test]
    fn incident_keywords_map_to_runbook_search() {
        let rules = RuleBook::default();
        assert_eq!(rules.classify("redis is timing out"), (Intent::RunbookSearch, 0.85));
        assert_eq!(
            rules.classify("we see a pod restart loop in kubernetes"),
            (Intent::RunbookSearch, 0.85)
        );
    }

    #[test]
    fn advice_keywords_map_to_general_ops_advice() {
        let rules = RuleBook::default();
        assert_eq!(
            rules.classify("how do we improve observability?"),
            (Intent::GeneralOpsAdvice, 0.70)
        );
    }

    #[test]
    fn unmatched_input_is_unknown_at_floor_confidence() {
        let rules = RuleBook::default();
        assert_eq!(rules.classify("tell me a story"), (Intent::Unknown, 0.30));
    }

    #[test]
    fn category_priority_is_ordered_but_detection_is_not() {
        let rules = RuleBook::default();
        let input = "redis outage, also what's the time in London?";

        // classify resolves to the highest-priority category...
        assert_eq!(rules.classify(input).0, Intent::WorldTime);

        // ...but the multi-match probe reports both, so the router can
        // treat the request as ambiguous instead of silently resolving it.
        let matches = rules.detect_matches(input);
        assert!(matches.contains(&Intent::WorldTime));
        assert!(matches.contains(&Intent::RunbookSearch));
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn matching_is_order_independent_within_a_category() {
        let rules = RuleBook::default();
        assert_eq!(rules.classify("the outage hit redis"), rules.classify("redis hit the outage"));
    }
}

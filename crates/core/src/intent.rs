use serde::{Deserialize, Serialize};

/// Closed set of request categories the router can dispatch to.
///
/// The derived ordering is load-bearing: when several rule sets match at
/// once, the router lists the options sorted by this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Unknown,
    WorldTime,
    RunbookSearch,
    GeneralOpsAdvice,
}

impl Intent {
    /// Human-readable label used when asking the user to pick one intent.
    pub fn option_label(self) -> &'static str {
        match self {
            Self::WorldTime => "time in a city",
            Self::RunbookSearch => "runbook/incident search",
            Self::GeneralOpsAdvice => "general ops advice",
            Self::Unknown => "something else",
        }
    }
}

/// Which decision layer produced the final intent. Diagnostic only; the
/// router never branches on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingPath {
    RulesOnly,
    RulesPlusEmbeddings,
}

/// Outcome of one classification pass. Confidence is a [0, 1] score, not
/// a calibrated probability.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassificationResult {
    pub intent: Intent,
    pub confidence: f64,
    pub path: RoutingPath,
}

impl ClassificationResult {
    pub fn rules_only(intent: Intent, confidence: f64) -> Self {
        Self { intent, confidence, path: RoutingPath::RulesOnly }
    }
}

/// Terminal artifact of one routed request.
#[derive(Clone, Debug, PartialEq)]
pub struct IntentRoutingResult {
    pub intent: Intent,
    pub confidence: f64,
    pub path: RoutingPath,
    pub response_text: String,
}

impl IntentRoutingResult {
    pub fn new(
        intent: Intent,
        confidence: f64,
        path: RoutingPath,
        response_text: impl Into<String>,
    ) -> Self {
        Self { intent, confidence, path, response_text: response_text.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::Intent;

    #[test]
    fn intent_order_drives_option_listing() {
        let mut intents = vec![Intent::GeneralOpsAdvice, Intent::WorldTime, Intent::RunbookSearch];
        intents.sort();
        assert_eq!(
            intents,
            vec![Intent::WorldTime, Intent::RunbookSearch, Intent::GeneralOpsAdvice]
        );
    }

    #[test]
    fn option_labels_are_stable() {
        assert_eq!(Intent::WorldTime.option_label(), "time in a city");
        assert_eq!(Intent::RunbookSearch.option_label(), "runbook/incident search");
        assert_eq!(Intent::GeneralOpsAdvice.option_label(), "general ops advice");
    }
}

//! Request orchestration: ambiguity deflection, classification, tool
//! dispatch under deadlines, and answer composition with safe fallbacks.

use std::time::Duration;

use opsroute_core::config::RoutingConfig;
use opsroute_core::intent::{ClassificationResult, Intent, IntentRoutingResult, RoutingPath};

use crate::classifier::IntentClassifier;
use crate::composer::{looks_like_unknown, AnswerComposer};
use crate::tools::{string_args, ToolPlan, ToolRegistry, RUNBOOK_SEARCH_TOOL, WORLD_TIME_TOOL};

const MULTI_REQUEST_CONFIDENCE: f64 = 0.40;

const WHICH_CITY: &str = "Which city?";

const UNKNOWN_HELP: &str = "I don't know. Try asking for the time in a city, or describe an incident (Redis, DB pool, pods restarting).";

pub struct IntentRouter {
    classifier: IntentClassifier,
    tools: ToolRegistry,
    composer: AnswerComposer,
    routing: RoutingConfig,
}

impl IntentRouter {
    pub fn new(
        classifier: IntentClassifier,
        tools: ToolRegistry,
        composer: AnswerComposer,
        routing: RoutingConfig,
    ) -> Self {
        Self { classifier, tools, composer, routing }
    }

    /// Routes one validated input end to end. Infallible by contract:
    /// every failure along the way becomes a safe response sentence.
    pub async fn route_and_execute(&self, input: &str) -> IntentRoutingResult {
        let matches = self.classifier.detect_rule_matches(input);
        if matches.len() >= 2 {
            let options = matches
                .iter()
                .map(|intent| intent.option_label())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::info!(%options, "multiple intents matched; deflecting");
            return IntentRoutingResult::new(
                Intent::Unknown,
                MULTI_REQUEST_CONFIDENCE,
                RoutingPath::RulesOnly,
                format!("I can only handle one request at a time. Which do you want: {options}?"),
            );
        }

        let classification = self.classifier.classify(input).await;
        tracing::info!(
            intent = ?classification.intent,
            confidence = classification.confidence,
            path = ?classification.path,
            "dispatching"
        );

        match classification.intent {
            Intent::WorldTime => self.handle_world_time(input, classification).await,
            Intent::RunbookSearch => self.handle_runbook_search(input, classification).await,
            Intent::GeneralOpsAdvice => self.handle_general_advice(input, classification).await,
            Intent::Unknown => IntentRoutingResult::new(
                classification.intent,
                classification.confidence,
                classification.path,
                UNKNOWN_HELP,
            ),
        }
    }

    async fn handle_world_time(
        &self,
        input: &str,
        classification: ClassificationResult,
    ) -> IntentRoutingResult {
        let Some(city) = extract_city_for_time(input) else {
            return self.finish(classification, WHICH_CITY.to_string());
        };

        let plan = ToolPlan::tool(WORLD_TIME_TOOL, string_args("city", &city));
        let result = self.tools.execute(&plan, self.tool_deadline()).await;

        let response = match result.output {
            Some(output) if result.ok => output,
            _ => result.safe_message,
        };
        self.finish(classification, response)
    }

    async fn handle_runbook_search(
        &self,
        input: &str,
        classification: ClassificationResult,
    ) -> IntentRoutingResult {
        let plan = ToolPlan::tool(RUNBOOK_SEARCH_TOOL, string_args("query", input));
        let result = self.tools.execute(&plan, self.tool_deadline()).await;

        let Some(tool_output) = result.output.filter(|_| result.ok) else {
            // Failed tools never reach the composer.
            return self.finish(classification, result.safe_message);
        };

        let composed = tokio::time::timeout(
            Duration::from_millis(self.routing.compose_timeout_ms),
            self.composer.compose_grounded_answer(input, RUNBOOK_SEARCH_TOOL, &tool_output),
        )
        .await;

        let response = match composed {
            Ok(answer) if !looks_like_unknown(&answer) => answer,
            Ok(_) => tool_output,
            Err(_) => {
                tracing::warn!("answer composition timed out; returning raw tool output");
                tool_output
            }
        };
        self.finish(classification, response)
    }

    async fn handle_general_advice(
        &self,
        input: &str,
        classification: ClassificationResult,
    ) -> IntentRoutingResult {
        let answer = self.composer.compose_general_answer(input).await;
        self.finish(classification, answer)
    }

    fn finish(&self, classification: ClassificationResult, response: String) -> IntentRoutingResult {
        IntentRoutingResult::new(
            classification.intent,
            classification.confidence,
            classification.path,
            response,
        )
    }

    fn tool_deadline(&self) -> Duration {
        Duration::from_millis(self.routing.tool_timeout_ms)
    }
}

/// Pulls the city phrase out of a time question. Prefers "time in X";
/// falls back to anything after "in " as long as the input mentions time.
fn extract_city_for_time(input: &str) -> Option<String> {
    // ASCII lowercasing keeps byte offsets aligned with the original.
    let lower = input.to_ascii_lowercase();

    let start = if let Some(idx) = lower.find("time in ") {
        idx + "time in ".len()
    } else if lower.contains("time") {
        lower.find("in ").map(|idx| idx + "in ".len())?
    } else {
        return None;
    };

    let cleaned = input[start..].trim().trim_end_matches(['?', '.', '!']).trim_end();
    let city: String = cleaned.chars().take(64).collect();
    (!city.is_empty()).then_some(city)
}

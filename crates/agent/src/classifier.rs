//! Intent classification: keyword rules first, embedding disambiguation
//! only when the rules are uncertain, and a merge policy between the two.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::OnceCell;

use opsroute_core::config::RoutingConfig;
use opsroute_core::intent::{ClassificationResult, Intent, RoutingPath};
use opsroute_core::rules::RuleBook;
use opsroute_core::similarity::cosine_similarity;

use crate::llm::LanguageModelService;

/// Rule results at or above this confidence skip embeddings entirely.
const RULE_SHORT_CIRCUIT_CONFIDENCE: f64 = 0.80;

/// When rules and embeddings disagree, rules this confident win.
const RULE_OVERRIDE_CONFIDENCE: f64 = 0.65;

/// Forced confidence when the top two embedding candidates are too close
/// to pick between. GeneralOpsAdvice is the safest non-action default.
const AMBIGUOUS_FALLBACK_CONFIDENCE: f64 = 0.50;

/// Short, stable prototype descriptions whose embeddings stand in for
/// each intent during similarity scoring.
const INTENT_PROTOTYPES: &[(Intent, &str)] = &[
    (Intent::WorldTime, "user asks for current time in a specific city"),
    (
        Intent::RunbookSearch,
        "user describes an incident and wants a runbook or troubleshooting steps",
    ),
    (Intent::GeneralOpsAdvice, "user asks general production operations advice for AI systems"),
];

pub struct IntentClassifier {
    llm: Arc<dyn LanguageModelService>,
    rules: RuleBook,
    routing: RoutingConfig,
    // Embedded lazily on first use, then cached for the process lifetime.
    prototypes: OnceCell<Vec<(Intent, Vec<f32>)>>,
}

impl IntentClassifier {
    pub fn new(llm: Arc<dyn LanguageModelService>, rules: RuleBook, routing: RoutingConfig) -> Self {
        Self { llm, rules, routing, prototypes: OnceCell::new() }
    }

    /// Independent multi-match probe used by the router before
    /// classification; two or more matches mean the request is ambiguous.
    pub fn detect_rule_matches(&self, input: &str) -> BTreeSet<Intent> {
        self.rules.detect_matches(input)
    }

    /// Classification never fails past this boundary: any embedding or
    /// transport error degrades to the rule-layer result.
    pub async fn classify(&self, input: &str) -> ClassificationResult {
        let (rule_intent, rule_confidence) = self.rules.classify(input);

        if rule_intent != Intent::Unknown && rule_confidence >= RULE_SHORT_CIRCUIT_CONFIDENCE {
            tracing::info!(intent = ?rule_intent, confidence = rule_confidence, "rules-only routing selected");
            return ClassificationResult::rules_only(rule_intent, rule_confidence);
        }

        if !self.routing.use_embedding_disambiguation {
            tracing::info!(intent = ?rule_intent, confidence = rule_confidence, "embeddings disabled; using rules");
            return ClassificationResult::rules_only(rule_intent, rule_confidence);
        }

        match self.disambiguate(input, rule_intent, rule_confidence).await {
            Ok(result) => result,
            Err(error) => {
                tracing::warn!(%error, "embedding-based routing failed; falling back to rules");
                ClassificationResult::rules_only(rule_intent, rule_confidence)
            }
        }
    }

    async fn disambiguate(
        &self,
        input: &str,
        rule_intent: Intent,
        rule_confidence: f64,
    ) -> Result<ClassificationResult> {
        let prototypes = self.warm_prototypes().await?;
        let query = self.llm.embed(input).await?;

        let mut scored: Vec<(Intent, f64)> = prototypes
            .iter()
            .map(|(intent, vector)| (*intent, cosine_similarity(vector, &query)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let Some(&(top_intent, top_score)) = scored.first() else {
            return Ok(ClassificationResult::rules_only(rule_intent, rule_confidence));
        };

        // Rescale cosine [-1, 1] into a [0, 1] confidence; a missing
        // runner-up counts as minimum-similarity.
        let top_confidence = (top_score + 1.0) / 2.0;
        let second_confidence =
            scored.get(1).map(|(_, score)| (score + 1.0) / 2.0).unwrap_or(0.0);
        let margin = top_confidence - second_confidence;

        if top_confidence < self.routing.embedding_confidence_threshold {
            tracing::info!(
                top = top_confidence,
                threshold = self.routing.embedding_confidence_threshold,
                "embedding confidence too low; falling back to rules"
            );
            return Ok(ClassificationResult {
                intent: rule_intent,
                confidence: rule_confidence,
                path: RoutingPath::RulesPlusEmbeddings,
            });
        }

        if margin < self.routing.ambiguity_margin {
            tracing::info!(
                margin,
                threshold = self.routing.ambiguity_margin,
                "embedding ambiguity too high; using safest default"
            );
            return Ok(ClassificationResult {
                intent: Intent::GeneralOpsAdvice,
                confidence: AMBIGUOUS_FALLBACK_CONFIDENCE,
                path: RoutingPath::RulesPlusEmbeddings,
            });
        }

        if rule_intent != Intent::Unknown
            && rule_intent != top_intent
            && rule_confidence >= RULE_OVERRIDE_CONFIDENCE
        {
            tracing::info!(
                rules_intent = ?rule_intent,
                rules_confidence = rule_confidence,
                embed_intent = ?top_intent,
                embed_confidence = top_confidence,
                "rules override embeddings"
            );
            return Ok(ClassificationResult {
                intent: rule_intent,
                confidence: rule_confidence,
                path: RoutingPath::RulesPlusEmbeddings,
            });
        }

        tracing::info!(intent = ?top_intent, confidence = top_confidence, "embedding routing selected");
        Ok(ClassificationResult {
            intent: top_intent,
            confidence: top_confidence,
            path: RoutingPath::RulesPlusEmbeddings,
        })
    }

    /// Idempotent warm-up: all prototype embeddings are computed on the
    /// first call and reused afterwards, even across concurrent callers.
    async fn warm_prototypes(&self) -> Result<&Vec<(Intent, Vec<f32>)>> {
        self.prototypes
            .get_or_try_init(|| async {
                let mut vectors = Vec::with_capacity(INTENT_PROTOTYPES.len());
                for (intent, prototype) in INTENT_PROTOTYPES {
                    let vector = self.llm.embed(prototype).await?;
                    vectors.push((*intent, vector));
                }
                Ok(vectors)
            })
            .await
    }
}

//! Startup wiring: builds the Ollama client, embeds the runbook corpus,
//! and assembles the router. An index build failure aborts startup.

use std::sync::Arc;

use anyhow::{Context, Result};

use opsroute_core::config::AppConfig;
use opsroute_core::corpus::seed_runbooks;
use opsroute_core::rules::RuleBook;

use crate::classifier::IntentClassifier;
use crate::composer::AnswerComposer;
use crate::llm::LanguageModelService;
use crate::ollama::OllamaClient;
use crate::router::IntentRouter;
use crate::search::SemanticSearchIndex;
use crate::tools::ToolRegistry;

pub async fn bootstrap(config: AppConfig) -> Result<IntentRouter> {
    let llm: Arc<dyn LanguageModelService> = Arc::new(OllamaClient::new(config.ollama.clone())?);

    let index = Arc::new(
        SemanticSearchIndex::build(seed_runbooks(), llm.as_ref())
            .await
            .context("building the runbook search index")?,
    );

    let classifier =
        IntentClassifier::new(llm.clone(), RuleBook::default(), config.routing.clone());
    let tools = ToolRegistry::new(llm.clone(), index);
    let composer = AnswerComposer::new(llm);

    Ok(IntentRouter::new(classifier, tools, composer, config.routing))
}

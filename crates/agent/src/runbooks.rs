use std::sync::Arc;

use anyhow::Result;

use crate::llm::LanguageModelService;
use crate::search::SemanticSearchIndex;

const TOP_K: usize = 3;
const EXCERPT_CHARS: usize = 180;
const NO_RESULTS: &str = "No relevant runbook documents found.";

/// Semantic lookup over the runbook index, formatted for direct display
/// or as grounding material for the composer.
pub struct RunbookSearchTool {
    index: Arc<SemanticSearchIndex>,
    llm: Arc<dyn LanguageModelService>,
}

impl RunbookSearchTool {
    pub fn new(index: Arc<SemanticSearchIndex>, llm: Arc<dyn LanguageModelService>) -> Self {
        Self { index, llm }
    }

    pub async fn search(&self, query: &str) -> Result<String> {
        tracing::info!(top_k = TOP_K, "runbook search");
        let results = self.index.search(self.llm.as_ref(), query, TOP_K).await?;
        tracing::info!(count = results.len(), "runbook search results");

        if results.is_empty() {
            return Ok(NO_RESULTS.to_string());
        }

        let mut output = String::from("Relevant documents:\n");
        for (document, score) in results {
            output.push_str(&format!(
                "- {}: {} (score: {score:.3})\n",
                document.id, document.title
            ));
            output.push_str(&format!("  Excerpt: {}\n", excerpt(&document.body)));
        }

        Ok(output)
    }
}

fn excerpt(body: &str) -> String {
    if body.chars().count() <= EXCERPT_CHARS {
        return body.to_string();
    }
    let truncated: String = body.chars().take(EXCERPT_CHARS).collect();
    format!("{truncated}...")
}

//! Embedding index over the runbook corpus.
//!
//! Built once at startup; a build failure is fatal (no partial index is
//! ever served). The index is immutable afterwards, so it can be shared
//! across requests behind an `Arc` without locking.

use anyhow::{Context, Result};

use opsroute_core::corpus::KnowledgeDocument;
use opsroute_core::similarity::cosine_similarity;

use crate::llm::LanguageModelService;

pub struct SearchIndexEntry {
    pub document: KnowledgeDocument,
    pub embedding: Vec<f32>,
}

pub struct SemanticSearchIndex {
    entries: Vec<SearchIndexEntry>,
}

impl SemanticSearchIndex {
    /// Embeds every document body exactly once. Rebuilding means
    /// discarding the whole index and calling this again.
    pub async fn build(
        documents: Vec<KnowledgeDocument>,
        llm: &dyn LanguageModelService,
    ) -> Result<Self> {
        tracing::info!(count = documents.len(), "indexing runbooks");

        let mut entries = Vec::with_capacity(documents.len());
        for document in documents {
            let embedding = llm
                .embed(&document.body)
                .await
                .with_context(|| format!("embedding runbook {}", document.id))?;
            entries.push(SearchIndexEntry { document, embedding });
        }

        tracing::info!("runbook index ready");
        Ok(Self { entries })
    }

    /// Top-K documents by descending cosine similarity. The sort is
    /// stable, so ties keep their original corpus order.
    pub async fn search(
        &self,
        llm: &dyn LanguageModelService,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<(KnowledgeDocument, f64)>> {
        let query_vector = llm.embed(query).await?;

        let mut scored: Vec<(KnowledgeDocument, f64)> = self
            .entries
            .iter()
            .map(|entry| {
                (entry.document.clone(), cosine_similarity(&entry.embedding, &query_vector))
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use opsroute_core::corpus::KnowledgeDocument;

    use super::SemanticSearchIndex;
    use crate::llm::stub::StubLanguageModel;

    fn doc(id: &str, body: &str) -> KnowledgeDocument {
        KnowledgeDocument { id: id.to_string(), title: format!("Title {id}"), body: body.to_string() }
    }

    #[tokio::test]
    async fn build_embeds_each_document_once() {
        let llm = StubLanguageModel::new();
        let index = SemanticSearchIndex::build(vec![doc("A", "alpha"), doc("B", "beta")], &llm)
            .await
            .expect("build should succeed");

        assert_eq!(index.len(), 2);
        assert_eq!(llm.embed_calls(), 2);
    }

    #[tokio::test]
    async fn build_failure_is_fatal() {
        let llm = StubLanguageModel::new().with_failing_embeds();
        let result = SemanticSearchIndex::build(vec![doc("A", "alpha")], &llm).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn search_ranks_by_similarity_and_truncates() {
        let llm = StubLanguageModel::new()
            .with_embedding("alpha", vec![1.0, 0.0])
            .with_embedding("beta", vec![0.0, 1.0])
            .with_embedding("gamma", vec![0.7, 0.7])
            .with_embedding("query", vec![1.0, 0.1]);

        let index = SemanticSearchIndex::build(
            vec![doc("A", "alpha"), doc("B", "beta"), doc("C", "gamma")],
            &llm,
        )
        .await
        .expect("build should succeed");

        let results = index.search(&llm, "query", 2).await.expect("search should succeed");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.id, "A");
        assert_eq!(results[1].0.id, "C");
        assert!(results[0].1 > results[1].1);
    }

    #[tokio::test]
    async fn ties_keep_corpus_order() {
        let llm = StubLanguageModel::new()
            .with_default_embedding(vec![1.0, 0.0]);

        let index = SemanticSearchIndex::build(
            vec![doc("first", "one"), doc("second", "two"), doc("third", "three")],
            &llm,
        )
        .await
        .expect("build should succeed");

        let results = index.search(&llm, "query", 3).await.expect("search should succeed");
        let ids: Vec<&str> = results.iter().map(|(d, _)| d.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }
}

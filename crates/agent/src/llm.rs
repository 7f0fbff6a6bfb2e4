use anyhow::Result;
use async_trait::async_trait;

/// Capability boundary to the text-generation/embedding backend.
///
/// `chat` is one constrained exchange: exactly one system instruction and
/// one user payload, no conversation history. `embed` treats a blank
/// input as a data condition and yields an empty vector; transport and
/// protocol failures are real errors so callers can decide whether to
/// degrade (classifier) or abort (index build).
#[async_trait]
pub trait LanguageModelService: Send + Sync {
    async fn chat(&self, system: &str, user: &str) -> Result<String>;
    async fn embed(&self, input: &str) -> Result<Vec<f32>>;
}

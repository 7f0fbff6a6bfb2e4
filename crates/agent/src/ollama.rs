//! Ollama HTTP backend for the `LanguageModelService` capability.
//!
//! Talks to the local Ollama API: `/api/chat` for constrained completions
//! and `/api/embed` for embedding vectors. Streaming is disabled on the
//! wire, so a chat response always arrives as one final message.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use opsroute_core::config::OllamaConfig;

use crate::llm::LanguageModelService;

pub struct OllamaClient {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .context("building ollama http client")?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl LanguageModelService for OllamaClient {
    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.config.chat_model,
            messages: vec![
                WireMessage { role: "system", content: system },
                WireMessage { role: "user", content: user },
            ],
            stream: false,
        };

        let response = self
            .client
            .post(self.endpoint("api/chat"))
            .json(&body)
            .send()
            .await
            .context("ollama chat request failed")?;

        if !response.status().is_success() {
            bail!("ollama chat returned status {}", response.status());
        }

        let parsed: ChatResponse =
            response.json().await.context("parsing ollama chat response")?;
        Ok(parsed.message.map(|message| message.content).unwrap_or_default())
    }

    async fn embed(&self, input: &str) -> Result<Vec<f32>> {
        // Blank input is a data condition, not a request worth making.
        if input.trim().is_empty() {
            return Ok(Vec::new());
        }

        let body = EmbedRequest { model: &self.config.embedding_model, input };
        let response = self
            .client
            .post(self.endpoint("api/embed"))
            .json(&body)
            .send()
            .await
            .context("ollama embed request failed")?;

        if !response.status().is_success() {
            bail!("ollama embed returned status {}", response.status());
        }

        let parsed: EmbedResponse =
            response.json().await.context("parsing ollama embed response")?;
        // A well-formed response without a vector degrades to "no usable
        // vector"; cosine similarity treats that as maximally dissimilar.
        Ok(parsed.embeddings.into_iter().next().unwrap_or_default())
    }
}

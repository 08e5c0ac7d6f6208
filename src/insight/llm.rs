// src/insight/llm.rs
//! Chat-model abstraction over OpenAI-style chat-completions gateways.
//!
//! The same client shape covers both configured endpoints: the fast model
//! behind the Clova-compatible gateway (quick opinion, follow-up) and the
//! larger OpenAI model (report stage). Test doubles live next to the real
//! client so the pipeline can be driven without network access.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A text-generation backend: one prompt in, one completion out.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
    /// Backend name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Chat-completions client. `base_url` selects the gateway
/// (e.g. `https://api.openai.com/v1` or an NCP API gateway URL).
pub struct OpenAiChat {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiChat {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            http: crate::fetch::http_client(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
            max_tokens,
            temperature,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(anyhow!("api key not configured for {}", self.model));
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("chat completion request")?
            .error_for_status()
            .context("chat completion status")?;

        let body: Resp = resp.json().await.context("chat completion body")?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("empty choices from {}", self.model))?;
        Ok(content.trim().to_string())
    }

    fn name(&self) -> &'static str {
        "openai-chat"
    }
}

/// Always returns the configured text. For pipeline tests.
pub struct FixedChat(pub String);

#[async_trait]
impl ChatModel for FixedChat {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok(self.0.clone())
    }
    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Always fails. For degraded-path tests.
pub struct FailingChat;

#[async_trait]
impl ChatModel for FailingChat {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(anyhow!("simulated generation failure"))
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}

//! Azure OpenAI HTTP client
//!
//! Talks to a chat completions deployment inside an Azure AI Foundry
//! project. Authentication is the `api-key` header; the deployment and
//! API version are part of the URL.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::FoundryConfig;
use crate::error::{Error, Result};
use crate::llm::traits::ChatModel;
use crate::llm::types::{ChatCompletion, ChatMessage, TokenUsage};
use crate::util::preview;

/// Azure OpenAI chat completions client
#[derive(Clone)]
pub struct FoundryClient {
    client: Client,
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    messages: &'a [ChatMessage],
    temperature: f64,
    max_tokens: u32,
    top_p: f64,
    frequency_penalty: f64,
    presence_penalty: f64,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: TokenUsage,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

impl FoundryClient {
    /// Create a new client from the Foundry section of the configuration.
    pub fn new(config: &FoundryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            endpoint: config.openai_endpoint.trim_end_matches('/').to_string(),
            api_key: config.openai_api_key.clone(),
            deployment: config.openai_deployment.clone(),
            api_version: config.openai_api_version.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Deployment (model) name this client targets.
    pub fn deployment(&self) -> &str {
        &self.deployment
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }
}

#[async_trait]
impl ChatModel for FoundryClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatCompletion> {
        let url = self.completions_url();
        let request = CompletionRequest {
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: 0.95,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        };

        debug!(
            "Sending {} messages to deployment {}",
            messages.len(),
            self.deployment
        );

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::Http)?;

        if !status.is_success() {
            warn!("Azure OpenAI error: {} - {}", status, preview(&body, 500));
            return Err(Error::Api(format!("{}: {}", status, body)));
        }

        let parsed: CompletionResponse = serde_json::from_str(&body).map_err(|e| {
            Error::Api(format!("Failed to parse response: {} - {}", e, preview(&body, 500)))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::Api("response contained no choices".to_string()))?;

        info!(
            "Completion received: {} tokens total, preview: {}",
            parsed.usage.total_tokens,
            preview(&content, 80)
        );

        Ok(ChatCompletion {
            content,
            usage: parsed.usage,
        })
    }
}

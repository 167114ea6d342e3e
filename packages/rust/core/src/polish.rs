//! Optional LLM polishing of formatted post content.
//!
//! Polishing never fails the pipeline: any error is logged and the original
//! content is returned unchanged. Without credentials nothing is sent at all.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use chatblog_shared::{ChatBlogError, PolishConfig, PolishCredentials, Result};

/// System instruction sent with every completion request.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that polishes Discord conversations \
into coherent blog posts. Maintain the content and substance but improve readability, fix \
grammar, and organize into paragraphs.";

/// Prefix of the user message; the formatted conversation follows it.
const USER_PROMPT_PREFIX: &str = "Polish this Discord conversation into a well-formatted blog post:\n\n";

/// Upper bound on logged error bodies.
const MAX_LOGGED_BODY: usize = 200;

// ---------------------------------------------------------------------------
// TextPolisher
// ---------------------------------------------------------------------------

/// Rewrites post content for readability.
///
/// Implementations are infallible by contract: on any failure they return
/// the input unchanged.
pub trait TextPolisher {
    fn polish(&self, content: &str) -> impl Future<Output = String> + Send;
}

/// Returns content unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl TextPolisher for Passthrough {
    async fn polish(&self, content: &str) -> String {
        content.to_string()
    }
}

/// An absent polisher is a passthrough.
impl<P: TextPolisher + Sync> TextPolisher for Option<P> {
    async fn polish(&self, content: &str) -> String {
        match self {
            Some(polisher) => polisher.polish(content).await,
            None => content.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types (chat completions)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Azure OpenAI
// ---------------------------------------------------------------------------

/// Polishes content through an Azure OpenAI chat-completions deployment.
pub struct AzureOpenAiPolisher {
    client: Client,
    url: String,
    api_key: String,
    temperature: f32,
}

impl AzureOpenAiPolisher {
    pub fn new(credentials: PolishCredentials, config: &PolishConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatBlogError::Network(format!("failed to build HTTP client: {e}")))?;

        let url = completions_url(
            &credentials.endpoint,
            &credentials.deployment,
            &config.api_version,
        );
        info!(deployment = %credentials.deployment, "AI polishing enabled");

        Ok(Self {
            client,
            url,
            api_key: credentials.api_key,
            temperature: config.temperature,
        })
    }

    /// One completion request. Any failure is returned as [`ChatBlogError::Polish`].
    pub async fn try_polish(&self, content: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.into(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("{USER_PROMPT_PREFIX}{content}"),
                },
            ],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatBlogError::Polish(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let shown: String = body.chars().take(MAX_LOGGED_BODY).collect();
            return Err(ChatBlogError::Polish(format!("HTTP {status}: {shown}")));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatBlogError::Polish(format!("malformed response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ChatBlogError::Polish("response carried no completion text".into()))
    }
}

impl TextPolisher for AzureOpenAiPolisher {
    #[instrument(skip_all, fields(len = content.len()))]
    async fn polish(&self, content: &str) -> String {
        match self.try_polish(content).await {
            Ok(polished) => {
                debug!(before = content.len(), after = polished.len(), "content polished");
                polished
            }
            Err(e) => {
                error!(error = %e, "AI polishing failed, keeping original content");
                content.to_string()
            }
        }
    }
}

/// `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version={version}`
fn completions_url(endpoint: &str, deployment: &str, api_version: &str) -> String {
    format!(
        "{}/openai/deployments/{deployment}/chat/completions?api-version={api_version}",
        endpoint.trim_end_matches('/')
    )
}

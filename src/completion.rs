use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;

/// Connection and sampling options for the completion endpoint.
///
/// Injected into the client constructor; pipeline code never reads these
/// from ambient process state.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "gpt-4-1106-preview".to_string(),
            temperature: 0.7,
            max_tokens: 1500,
        }
    }
}

/// The external completion capability: one system instruction, one user
/// message, plain text back.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// OpenAI-style chat-completions client.
pub struct OpenAiClient {
    http: reqwest::Client,
    config: CompletionConfig,
}

impl OpenAiClient {
    pub fn new(config: CompletionConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let res = self
            .http
            .post(self.config.endpoint.as_str())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let json: serde_json::Value = res.json().await?;
        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow!("completion response carried no message content"))?;

        Ok(content.trim().to_string())
    }
}

/// Strip a leading/trailing triple-backtick fence (with optional language
/// tag) from completion output.
///
/// The endpoint is not contractually guaranteed to omit fences, so every
/// consumer runs this before structural parsing.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let mut lines: Vec<&str> = trimmed.lines().collect();
    // First line is the opening fence, possibly "```json" or "```csv"
    lines.remove(0);
    if let Some(last) = lines.last() {
        if last.trim().starts_with("```") {
            lines.pop();
        }
    }
    lines.join("\n").trim().to_string()
}

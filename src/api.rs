use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Base URL used when neither the config file nor the CLI override one.
pub const DEFAULT_API_BASE: &str = "http://localhost:3000";

#[derive(Serialize)]
struct ChatRequest {
    message: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    reply: Option<String>,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one prompt and return the reply text. A missing reply field
    /// comes back as an empty string; callers decide the fallback.
    pub async fn send(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        debug!(chars = prompt.chars().count(), "sending chat request");

        let request = ChatRequest {
            message: prompt.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "chat request failed with status {}",
                response.status()
            ));
        }

        let chat_response: ChatResponse = response.json().await?;
        debug!("chat request settled");
        Ok(chat_response.reply.unwrap_or_default())
    }

    /// Probe the backend health endpoint.
    pub async fn health(&self) -> Result<String> {
        let url = format!("{}/api/health", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("health check failed: {}", response.status()));
        }

        let health: HealthResponse = response.json().await?;
        Ok(health.status)
    }
}

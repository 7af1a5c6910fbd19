use crate::llm::client::LLMClient;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use ollama_rs::{
    generation::chat::{request::ChatMessageRequest, ChatMessage},
    Ollama,
};
use std::time::Duration;

const DEFAULT_PORT: u16 = 11434;

pub struct OllamaClient {
    client: Ollama,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String, timeout: Duration) -> Result<Self> {
        let (host, port) = split_base_url(&base_url)?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::LLM(format!("Failed to build Ollama client: {}", e)))?;

        Ok(Self {
            client: Ollama::new_with_client(host, port, http),
            model,
        })
    }
}

/// Split `scheme://host[:port][/path]` into the `scheme://host` and port pair
/// the Ollama client is constructed from. The port defaults to 11434.
fn split_base_url(base_url: &str) -> Result<(String, u16)> {
    let url = reqwest::Url::parse(base_url).map_err(|e| {
        AppError::Configuration(format!("Invalid Ollama URL '{}': {}", base_url, e))
    })?;
    let host = url.host_str().ok_or_else(|| {
        AppError::Configuration(format!("Ollama URL '{}' has no host", base_url))
    })?;

    Ok((
        format!("{}://{}", url.scheme(), host),
        url.port().unwrap_or(DEFAULT_PORT),
    ))
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let messages = vec![ChatMessage::user(prompt.to_string())];
        let request = ChatMessageRequest::new(self.model.clone(), messages);

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AppError::LLM(format!("Ollama error: {}", e)))?;

        Ok(response.message.content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

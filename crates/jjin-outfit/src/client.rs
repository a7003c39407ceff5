//! OpenAI chat completion and image generation client.

use std::time::Duration;

use async_trait::async_trait;
use jjin_core::{NetworkError, OutfitConfig, ReqwestErrorExt};
use serde::{Deserialize, Serialize};
use tracing::instrument;

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
const IMAGE_GENERATIONS_PATH: &str = "/v1/images/generations";

#[async_trait]
pub trait OutfitClient: Send + Sync {
    /// Single-turn chat completion; returns the assistant's text.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, NetworkError>;

    /// Generate one image and return its URL.
    async fn generate_image(&self, prompt: &str) -> Result<String, NetworkError>;

    /// Whether credentials are present.
    fn is_configured(&self) -> bool {
        true
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
}

pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    chat_model: String,
    image_model: String,
    image_size: String,
}

impl OpenAiClient {
    pub fn new(config: &OutfitConfig) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(ReqwestErrorExt::into_network_error)?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            chat_model: config.chat_model.clone(),
            image_model: config.image_model.clone(),
            image_size: config.image_size.clone(),
        })
    }

    #[cfg(test)]
    pub fn new_with_base_url(api_key: &str, base_url: &str) -> Self {
        let defaults = OutfitConfig::default();
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
            chat_model: defaults.chat_model,
            image_model: defaults.image_model,
            image_size: defaults.image_size,
        }
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    async fn post_json<B: Serialize + ?Sized, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, NetworkError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(body)
            .send()
            .await
            .map_err(ReqwestErrorExt::into_network_error)?;

        self.handle_response(response).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, NetworkError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| NetworkError::InvalidResponse(format!("JSON parse error: {}", e)))
        } else {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!("OpenAI returned {}", status);
            Err(NetworkError::from_status(status, text))
        }
    }
}

#[async_trait]
impl OutfitClient for OpenAiClient {
    #[instrument(skip(self, system), level = "info")]
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, NetworkError> {
        let request = ChatRequest {
            model: &self.chat_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response: ChatResponse = self.post_json(CHAT_COMPLETIONS_PATH, &request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| NetworkError::InvalidResponse("chat completion had no content".into()))
    }

    #[instrument(skip(self), level = "info")]
    async fn generate_image(&self, prompt: &str) -> Result<String, NetworkError> {
        let request = ImageRequest {
            model: &self.image_model,
            prompt,
            n: 1,
            size: &self.image_size,
        };

        let response: ImageResponse = self.post_json(IMAGE_GENERATIONS_PATH, &request).await?;

        response
            .data
            .into_iter()
            .next()
            .and_then(|d| d.url)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| NetworkError::InvalidResponse("image generation had no url".into()))
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

//! Minimal client for the OpenAI-compatible HTTP API.
//!
//! Covers the two endpoints the pipeline uses: chat completions for
//! summaries and text-to-speech for narration.

use std::path::Path;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

/// Errors from the OpenAI-compatible API layer.
#[derive(Debug, thiserror::Error)]
pub enum OpenAiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("OpenAI API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage<'a>],
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

/// HTTP client bound to one API root and key.
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    /// * `base_url` - API root including the version, e.g. `https://api.openai.com/v1`.
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send `POST /chat/completions` and return the first choice's text.
    ///
    /// Returns `None` when the reply carries no content.
    pub async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage<'_>],
        max_tokens: u32,
    ) -> Result<Option<String>, OpenAiError> {
        let body = ChatRequest {
            model,
            messages,
            max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let parsed: ChatResponse = response.json().await?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }

    /// Send `POST /audio/speech` and stream the audio body into `dest`.
    ///
    /// Returns the number of bytes written.
    pub async fn speech_to_file(
        &self,
        model: &str,
        voice: &str,
        input: &str,
        dest: &Path,
    ) -> Result<u64, OpenAiError> {
        let body = SpeechRequest {
            model,
            voice,
            input,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }

    /// Pass 2xx responses through; turn anything else into [`OpenAiError::ApiError`].
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, OpenAiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(OpenAiError::ApiError {
            status: status.as_u16(),
            body,
        })
    }
}

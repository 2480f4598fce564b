use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::{
    config::AppConfig,
    error::ServiceError,
    model::{
        TextGenerator,
        types::{ErrorEnvelope, GenerateContentRequest, GenerateContentResponse},
    },
    params::GenerationParameters,
};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> Result<Self, ServiceError> {
        if config.api_key.is_empty() {
            return Err(ServiceError::Internal("Gemini API key is missing".into()));
        }

        // The overall request deadline is enforced by the chat handler.
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ServiceError::Internal(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            endpoint: format!(
                "{}/models/{}:generateContent",
                config.api_base, config.model
            ),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParameters,
    ) -> Result<String, ServiceError> {
        let body = GenerateContentRequest::user_prompt(prompt, params);
        tracing::debug!(endpoint = %self.endpoint, ?params, "calling generateContent");

        let response = self
            .http
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::Collaborator(e.to_string()))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| ServiceError::Collaborator(e.to_string()))?;

        if !status.is_success() {
            return Err(ServiceError::Collaborator(describe_failure(status, &raw)));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&raw).map_err(|e| {
            ServiceError::Collaborator(format!("unexpected generateContent reply: {e}"))
        })?;
        extract_text(parsed)
    }
}

/// Concatenates the text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Result<String, ServiceError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(ServiceError::Collaborator(format!(
            "prompt was not answered: {reason}"
        )));
    };

    let texts: Vec<String> = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    if texts.is_empty() {
        let reason = candidate
            .finish_reason
            .unwrap_or_else(|| "UNKNOWN".to_string());
        return Err(ServiceError::Collaborator(format!(
            "response contained no text (finish reason: {reason})"
        )));
    }

    Ok(texts.concat())
}

fn describe_failure(status: StatusCode, raw: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(raw) {
        Ok(envelope) => match envelope.error.status {
            Some(kind) => format!("{kind}: {}", envelope.error.message),
            None => envelope.error.message,
        },
        Err(_) if raw.trim().is_empty() => format!("provider returned {status}"),
        Err(_) => format!("provider returned {status}: {}", raw.trim()),
    }
}

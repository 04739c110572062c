use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::application::ports::{ConversionHints, ConverterError, TierConverter};
use crate::application::services::{count_tokens, truncate_to_tokens};
use crate::domain::{ConversionOutput, EnhancedDocument, Tier};
use crate::infrastructure::observability::sanitize_prompt;

use super::markdown::estimate_quality;

const SYSTEM_PROMPT: &str = "You convert extracted document text into clean markdown. \
Keep every fact, heading, list and table. Do not summarize and do not add commentary.";

const BASE_QUALITY: f32 = 0.95;

/// Generative tier backed by any server that speaks the OpenAI chat-completions contract.
pub struct OpenAiGenerativeConverter {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    max_prompt_tokens: usize,
}

impl OpenAiGenerativeConverter {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

    pub fn new(base_url: &str, model: &str, api_key: &str, max_prompt_tokens: usize) -> Self {
        let client = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            max_prompt_tokens,
        }
    }

    /// Instructions derived from the hints, followed by as much document text as fits.
    pub fn build_prompt(&self, document: &EnhancedDocument, hints: &ConversionHints) -> (String, bool) {
        let mut guidance = Vec::new();
        if let Some(flow) = hints.flow_type {
            guidance.push(format!("The document flow is {flow}."));
        }
        if !hints.section_boundaries.is_empty() {
            let pages = hints
                .section_boundaries
                .iter()
                .map(|p| (p + 1).to_string())
                .collect::<Vec<_>>()
                .join(", ");
            guidance.push(format!("New sections start on pages {pages}."));
        }
        if let Some(previous) = hints.previous_attempt {
            match previous.quality_score {
                Some(q) => guidance.push(format!(
                    "A {} conversion scored {q:.2}; fix its structure.",
                    previous.tier
                )),
                None => guidance.push(format!("A {} conversion failed.", previous.tier)),
            }
        }

        let header = if guidance.is_empty() {
            String::from("Document:\n")
        } else {
            format!("{}\n\nDocument:\n", guidance.join(" "))
        };

        let budget = self.max_prompt_tokens.saturating_sub(count_tokens(&header));
        let body = truncate_to_tokens(document.text(), budget);
        let truncated = body.len() < document.text().len();
        (format!("{header}{body}"), truncated)
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl TierConverter for OpenAiGenerativeConverter {
    fn tier(&self) -> Tier {
        Tier::GenerativeAssisted
    }

    #[tracing::instrument(skip(self, document, hints), fields(document_id = %document.raw.id()))]
    async fn convert(
        &self,
        document: &EnhancedDocument,
        hints: &ConversionHints,
    ) -> Result<ConversionOutput, ConverterError> {
        let (prompt, truncated) = self.build_prompt(document, hints);
        tracing::debug!(prompt = %sanitize_prompt(&prompt), truncated, "Generative conversion request");

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt }
            ],
            "temperature": 0.0,
            "stream": false
        });

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| ConverterError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(ConverterError::Unavailable(format!("HTTP {status}")));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ConverterError::Unrecoverable(format!("HTTP {status}: {text}")));
        }

        let raw_bytes = response
            .bytes()
            .await
            .map_err(|e| ConverterError::Unavailable(e.to_string()))?;
        let completion: ChatCompletion = serde_json::from_slice(&raw_bytes).map_err(|e| {
            tracing::error!(
                raw_response = %sanitize_prompt(&String::from_utf8_lossy(&raw_bytes)),
                "Failed to parse chat completion"
            );
            ConverterError::InvalidOutput(e.to_string())
        })?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ConverterError::InvalidOutput("empty completion".to_string()))?;

        let mut warnings = Vec::new();
        if truncated {
            warnings.push(format!(
                "document truncated to {} prompt tokens",
                self.max_prompt_tokens
            ));
        }
        let source_chars = document.text().chars().count();
        let ratio_quality = estimate_quality(source_chars, text.chars().count(), warnings.len());
        let quality_score = (BASE_QUALITY - (1.0 - ratio_quality)).clamp(0.0, 1.0);

        Ok(ConversionOutput {
            text,
            quality_score,
            warnings,
        })
    }
}

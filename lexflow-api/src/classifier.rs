//! Anthropic Messages API classifier

use std::time::Duration;

use async_trait::async_trait;
use lexflow_common::classifier::{
    prompt, ClassificationRequest, Classifier, ClassifierError, RawClassification,
};
use lexflow_common::config::ClassifierConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Classifier backed by the Anthropic Messages API
pub struct AnthropicClassifier {
    http_client: reqwest::Client,
    config: ClassifierConfig,
}

impl AnthropicClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassifierError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    fn request_body(&self, request: &ClassificationRequest) -> MessagesRequest<'_> {
        MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            system: prompt::system_prompt(),
            messages: vec![Message {
                role: "user",
                content: prompt::user_message(request),
            }],
        }
    }
}

/// First text block of a Messages API response
fn first_text(response: MessagesResponse) -> Option<String> {
    response
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
}

#[async_trait]
impl Classifier for AnthropicClassifier {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<RawClassification, ClassifierError> {
        debug!(model = %self.config.model, "Calling classifier API");

        let response = self
            .http_client
            .post(&self.config.api_url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;
        let model = parsed
            .model
            .clone()
            .unwrap_or_else(|| self.config.model.clone());
        let text = first_text(parsed).ok_or(ClassifierError::EmptyResponse)?;

        info!(model = %model, chars = text.len(), "Classifier response received");
        Ok(RawClassification { text, model })
    }
}

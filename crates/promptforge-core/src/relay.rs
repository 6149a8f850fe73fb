use std::{sync::Arc, time::Instant};

use tracing::{debug, info};

use crate::{
    config::RelayConfig,
    error::RelayError,
    model::CompletionTransport,
    types::{ChatCompletionRequest, ChatCompletionResponse},
};

/// Rewrites a raw prompt through the upstream completion API.
///
/// Holds no per-request state; one instance is shared by every request task.
pub struct PromptRelay {
    config: Arc<RelayConfig>,
    transport: Arc<dyn CompletionTransport>,
}

impl PromptRelay {
    pub fn new(config: Arc<RelayConfig>, transport: Arc<dyn CompletionTransport>) -> Self {
        Self { config, transport }
    }

    /// Single attempt: no retry, no caching.
    pub async fn transform(&self, input: &str) -> Result<String, RelayError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(RelayError::Config("missing credential"))?;

        let payload = self.build_request(input);
        debug!(
            model = %payload.model,
            input_chars = input.chars().count(),
            "sending prompt upstream"
        );

        let started = Instant::now();
        let body = self
            .transport
            .send(api_key, &payload)
            .await
            .map_err(RelayError::Transport)?;

        let response = serde_json::from_str::<ChatCompletionResponse>(&body)?;
        let choices = response.choices.len();
        let content = response.into_first_content();

        info!(
            model = %payload.model,
            choices,
            output_chars = content.chars().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "prompt transformed"
        );

        Ok(content)
    }

    fn build_request(&self, input: &str) -> ChatCompletionRequest {
        ChatCompletionRequest::single_user_message(
            self.config.model.clone(),
            self.config.template.render(input),
        )
    }
}

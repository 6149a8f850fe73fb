mod mock;
mod openrouter;

use async_trait::async_trait;

use crate::types::ChatCompletionRequest;

pub use mock::{MockReply, MockTransport};
pub use openrouter::OpenRouterTransport;

/// One outbound chat-completion exchange.
///
/// Implementations return the raw response body; decoding belongs to the relay
/// so that transport and shape failures stay distinguishable.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn send(&self, api_key: &str, payload: &ChatCompletionRequest) -> anyhow::Result<String>;
}

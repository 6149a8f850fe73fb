use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::RwLock;

use super::CompletionTransport;
use crate::types::ChatCompletionRequest;

/// What a [`MockTransport`] answers with.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this raw body verbatim.
    Body(String),
    /// Fail as if the connection broke.
    Fail(String),
    /// Answer with a single choice whose content is the outbound user message.
    Echo,
}

/// In-process transport that records every call instead of reaching the network.
#[derive(Debug)]
pub struct MockTransport {
    reply: MockReply,
    calls: AtomicUsize,
    seen: RwLock<Vec<(String, ChatCompletionRequest)>>,
}

impl MockTransport {
    pub fn new(reply: MockReply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            seen: RwLock::new(Vec::new()),
        }
    }

    /// Answers with one choice carrying `content`.
    pub fn completion(content: &str) -> Self {
        Self::new(MockReply::Body(
            json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
                .to_string(),
        ))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// API keys and payloads in call order.
    pub async fn requests(&self) -> Vec<(String, ChatCompletionRequest)> {
        self.seen.read().await.clone()
    }
}

#[async_trait]
impl CompletionTransport for MockTransport {
    async fn send(&self, api_key: &str, payload: &ChatCompletionRequest) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .write()
            .await
            .push((api_key.to_owned(), payload.clone()));

        match &self.reply {
            MockReply::Body(body) => Ok(body.clone()),
            MockReply::Fail(reason) => Err(anyhow::anyhow!("{reason}")),
            MockReply::Echo => {
                let content = payload
                    .messages
                    .last()
                    .map(|message| message.content.as_str())
                    .unwrap_or_default();
                Ok(json!({ "choices": [{ "message": { "content": content } }] }).to_string())
            }
        }
    }
}

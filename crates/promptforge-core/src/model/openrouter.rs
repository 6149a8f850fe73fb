use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::CompletionTransport;
use crate::{config::AppConfig, types::ChatCompletionRequest};

#[derive(Debug, Clone)]
pub struct OpenRouterTransport {
    client: Client,
    endpoint: String,
    referer: Option<String>,
    title: Option<String>,
}

impl OpenRouterTransport {
    pub fn new(
        base_url: &str,
        referer: Option<String>,
        title: Option<String>,
        timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            referer,
            title,
        })
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        Self::new(
            &config.openrouter_base_url,
            config.openrouter_referer.clone(),
            config.openrouter_title.clone(),
            config.upstream_timeout,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionTransport for OpenRouterTransport {
    async fn send(&self, api_key: &str, payload: &ChatCompletionRequest) -> anyhow::Result<String> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(payload);

        if let Some(referer) = &self.referer {
            builder = builder.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.title {
            builder = builder.header("X-Title", title);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            debug!(%status, bytes = body.len(), "upstream responded");
        } else {
            warn!(%status, body = %truncate(&body, 512), "upstream returned non-success status");
        }

        Ok(body)
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use axum::{
        Json, Router,
        extract::State,
        http::{HeaderMap, StatusCode},
        routing::post,
    };
    use serde_json::{Value, json};
    use tokio::{net::TcpListener, sync::RwLock};

    use super::{OpenRouterTransport, truncate};
    use crate::{model::CompletionTransport, types::ChatCompletionRequest};

    #[derive(Debug, Default)]
    struct Captured {
        headers: Option<HeaderMap>,
        body: Option<Value>,
    }

    type Shared = Arc<RwLock<Captured>>;

    async fn capture(
        State(captured): State<Shared>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        let mut guard = captured.write().await;
        guard.headers = Some(headers);
        guard.body = Some(body);
        Json(json!({ "choices": [{ "message": { "content": "ok" } }] }))
    }

    async fn unauthorized() -> (StatusCode, Json<Value>) {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "code": 401, "message": "No auth credentials found" } })),
        )
    }

    async fn stalled() -> Json<Value> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Json(json!({ "choices": [] }))
    }

    async fn spawn_upstream(captured: Shared) -> String {
        let app = Router::new()
            .route("/api/v1/chat/completions", post(capture))
            .route("/denied/chat/completions", post(unauthorized))
            .route("/stalled/chat/completions", post(stalled))
            .with_state(captured);
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind should succeed");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn posts_bearer_authenticated_json_to_chat_completions() {
        let captured = Shared::default();
        let base = spawn_upstream(captured.clone()).await;
        let transport = OpenRouterTransport::new(
            &format!("{base}/api/v1/"),
            Some("https://promptforge.local".to_owned()),
            Some("PromptForge".to_owned()),
            None,
        )
        .expect("client should build");

        let payload = ChatCompletionRequest::single_user_message("test/model", "hello".to_owned());
        let body = transport
            .send("sk-test", &payload)
            .await
            .expect("send should succeed");

        assert_eq!(transport.endpoint(), format!("{base}/api/v1/chat/completions"));
        assert!(body.contains("\"ok\""));

        let guard = captured.read().await;
        let headers = guard.headers.as_ref().expect("headers captured");
        assert_eq!(headers["authorization"], "Bearer sk-test");
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(headers["http-referer"], "https://promptforge.local");
        assert_eq!(headers["x-title"], "PromptForge");
        assert_eq!(
            guard.body.as_ref().expect("body captured"),
            &json!({
                "model": "test/model",
                "messages": [{ "role": "user", "content": "hello" }]
            })
        );
    }

    #[tokio::test]
    async fn non_success_status_still_returns_body() {
        let base = spawn_upstream(Shared::default()).await;
        let transport = OpenRouterTransport::new(&format!("{base}/denied"), None, None, None)
            .expect("client should build");

        let body = transport
            .send("bad-key", &ChatCompletionRequest::single_user_message("m", String::new()))
            .await
            .expect("an http error status is not a transport failure");

        assert!(body.contains("No auth credentials found"));
    }

    #[tokio::test]
    async fn configured_timeout_aborts_a_stalled_upstream() {
        let base = spawn_upstream(Shared::default()).await;
        let transport = OpenRouterTransport::new(
            &format!("{base}/stalled"),
            None,
            None,
            Some(Duration::from_millis(100)),
        )
        .expect("client should build");

        let started = std::time::Instant::now();
        let result = transport
            .send("sk", &ChatCompletionRequest::single_user_message("m", "x".to_owned()))
            .await;

        let error = result.expect_err("stalled upstream should time out");
        assert!(
            error
                .downcast_ref::<reqwest::Error>()
                .is_some_and(reqwest::Error::is_timeout),
            "unexpected error: {error:#}"
        );
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind should succeed");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let transport = OpenRouterTransport::new(&format!("http://{addr}"), None, None, None)
            .expect("client should build");
        let result = transport
            .send("sk", &ChatCompletionRequest::single_user_message("m", "x".to_owned()))
            .await;

        assert!(result.is_err());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("привет", 3), "при");
        assert_eq!(truncate("short", 10), "short");
    }
}

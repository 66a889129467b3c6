//! The `LlmProvider` trait: the external-collaborator contract the Tool
//! Client's concrete tools call through. Cancellation is not part of the
//! trait signature — every call site races the returned stream against a
//! `CancellationToken`/`tokio::time::timeout` externally instead, which is
//! the only pattern any provider implementation here actually honours.

use futures::{Stream, StreamExt};
use std::pin::Pin;

use crate::types::{LlmRequest, StreamDelta};

pub type LlmResult<T> = Result<T, LlmError>;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("rate limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("stream error: {0}")]
    StreamError(String),

    #[error("cancelled")]
    Cancelled,

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

pub type LlmStream = Pin<Box<dyn Stream<Item = LlmResult<StreamDelta>> + Send>>;

#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;
    fn models(&self) -> &[&str];

    fn supports_model(&self, model: &str) -> bool {
        self.models()
            .iter()
            .any(|m| *m == model || model.starts_with(m))
    }

    async fn complete_stream(&self, request: LlmRequest) -> LlmResult<LlmStream>;
}

/// Drains a provider's stream into a single string, for the pedagogical
/// tools' one-shot request/response calls. Cancellation/timeout is the
/// caller's job (see `tutor_tools::executor`).
pub async fn complete(provider: &dyn LlmProvider, request: LlmRequest) -> LlmResult<String> {
    let mut stream = provider.complete_stream(request).await?;
    let mut text = String::new();
    while let Some(delta) = stream.next().await {
        match delta? {
            StreamDelta::Text(chunk) => text.push_str(&chunk),
            StreamDelta::Done { .. } => break,
        }
    }
    Ok(text)
}

use std::{future::Future, time::Duration};

use async_stream::try_stream;
use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use inkpress_core::{cancel::CancelHandle, provider::Endpoint};
use reqwest::{
    Client as HttpClient, Response, StatusCode,
    header::{ACCEPT, HeaderValue},
};
use serde_json::Value;

use crate::{
    api_v1::ChatCompletionRequest, error::OpenAiError, profile::ProviderProfile,
    sse::SseDecoder,
};

/// Timeout for non-streaming calls unless the adapter says otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for OpenAI-compatible *chat/completions* endpoints.
///
/// * The endpoint URL and API key travel with each call, so one client
///   serves every configured provider.
/// * Non-streaming calls carry a per-request timeout; streaming calls do not.
/// * Shares a single `reqwest::Client`, so cloning `OpenAiClient` is cheap.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: HttpClient,
    timeout: Duration,
}

impl OpenAiClient {
    /// Build with a custom `reqwest::Client` in case the caller needs proxy
    /// settings, custom TLS, etc.
    pub fn with_http(http: HttpClient, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Perform a **non-streaming** chat completion and return the raw JSON
    /// reply for the profile to pick apart.
    pub async fn chat_completion(
        &self,
        endpoint: &Endpoint,
        request: ChatCompletionRequest,
        profile: &'static ProviderProfile,
    ) -> Result<Value, OpenAiError> {
        let request = request.stream(false);
        let headers = profile.headers(&endpoint.api_key)?;

        let resp = self
            .http
            .post(&endpoint.url)
            .headers(headers)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;
        let resp = check_status(resp, profile).await?;

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Perform a **streaming** chat completion.
    ///
    /// Yields tokens in arrival order.  Once `cancel` fires the stream ends
    /// without an error, whether it was still waiting for the response
    /// headers or for the next body chunk.
    pub fn chat_completion_stream<'a>(
        &'a self,
        endpoint: Endpoint,
        request: ChatCompletionRequest,
        profile: &'static ProviderProfile,
        cancel: CancelHandle,
    ) -> impl Stream<Item = Result<String, OpenAiError>> + Send + 'a {
        let request = request.stream(true);

        try_stream! {
            let mut headers = profile.headers(&endpoint.api_key)?;
            headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

            if cancel.is_cancelled() {
                return;
            }

            let send = self.http.post(&endpoint.url).headers(headers).json(&request).send();
            let Some(resp) = until_cancelled(&cancel, send).await else {
                return;
            };
            let resp = check_status(resp?, profile).await?;
            let resp = require_body(resp)?;

            let mut body = resp.bytes_stream();
            let mut decoder = SseDecoder::new(profile);

            loop {
                if cancel.is_cancelled() {
                    return;
                }
                let Some(next) = until_cancelled(&cancel, body.next()).await else {
                    return;
                };
                let Some(chunk) = next else {
                    break;
                };
                let chunk: Bytes = chunk?;

                for token in decoder.feed(&chunk) {
                    yield token;
                }
            }

            if let Some(leftover) = decoder.finish() {
                tracing::debug!(provider = profile.id, leftover = %leftover, "dropping unterminated line at end of stream");
            }
            tracing::debug!(provider = profile.id, events = decoder.events(), "stream body finished");
        }
    }
}

/// `None` if `cancel` fires before `fut` completes.
async fn until_cancelled<F: Future>(cancel: &CancelHandle, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        out = fut => Some(out),
    }
}

fn require_body(resp: Response) -> Result<Response, OpenAiError> {
    if resp.status() == StatusCode::NO_CONTENT {
        return Err(OpenAiError::MissingBody);
    }
    Ok(resp)
}

async fn check_status(
    resp: Response,
    profile: &'static ProviderProfile,
) -> Result<Response, OpenAiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    tracing::debug!(provider = profile.id, status = status.as_u16(), body = %body, "provider rejected request");

    Err(OpenAiError::Api {
        status,
        message: profile.error_message(status.as_u16(), status.canonical_reason()),
    })
}

use std::{env, sync::Arc, time::Duration};

use inkpress_core::error::{InkpressError, Result};
use reqwest::Client as HttpClient;

use crate::{
    client::{DEFAULT_TIMEOUT, OpenAiClient},
    error::OpenAiError,
};

/// Thin wrapper that wires the HTTP client [`OpenAiClient`] into a value that
/// implements the `inkpress_core::provider` traits.
///
/// The adapter holds no credentials: endpoint URL, API key and provider id
/// arrive with every call from the current `ProviderSettings`, and the
/// provider id selects the [`crate::profile::ProviderProfile`] used for
/// headers, token extraction and error messages.
#[derive(Debug, Clone)]
pub struct OpenAiAdapter {
    pub(crate) client: Arc<OpenAiClient>,
}

impl OpenAiAdapter {
    pub fn client(&self) -> &OpenAiClient {
        &self.client
    }
}

/// Builder for [`OpenAiAdapter`].
///
/// ```rust,no_run
/// use inkpress_openai::OpenAiAdapterBuilder;
///
/// let backend = OpenAiAdapterBuilder::new_from_env()
///     .build()
///     .expect("INKPRESS_HTTP_TIMEOUT_SECS must be a number");
/// ```
#[derive(Debug, Default)]
pub struct OpenAiAdapterBuilder {
    pub(crate) timeout: Option<Duration>,
    pub(crate) timeout_env: Option<String>,
    pub(crate) http: Option<HttpClient>,
}

impl OpenAiAdapterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks up `INKPRESS_HTTP_TIMEOUT_SECS` for non-streaming calls.
    ///
    /// Never panics. A malformed value only surfaces during [`Self::build`].
    pub fn new_from_env() -> Self {
        Self {
            timeout_env: env::var("INKPRESS_HTTP_TIMEOUT_SECS").ok(),
            ..Self::default()
        }
    }

    /// Timeout for non-streaming calls. Streaming calls never time out.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use a preconfigured `reqwest::Client` (proxy, custom roots, ...).
    pub fn with_http(mut self, http: HttpClient) -> Self {
        self.http = Some(http);
        self
    }

    /// # Errors
    ///
    /// * [`InkpressError::Config`] – if `INKPRESS_HTTP_TIMEOUT_SECS` is not a
    ///   positive number of seconds.
    /// * [`InkpressError::Backend`] – if the HTTP client cannot be created.
    pub fn build(self) -> Result<OpenAiAdapter> {
        let timeout = match (self.timeout, self.timeout_env) {
            (Some(timeout), _) => timeout,
            (None, Some(raw)) => parse_timeout(&raw)?,
            (None, None) => DEFAULT_TIMEOUT,
        };

        let http = match self.http {
            Some(http) => http,
            None => HttpClient::builder().build().map_err(OpenAiError::from)?,
        };

        Ok(OpenAiAdapter {
            client: Arc::new(OpenAiClient::with_http(http, timeout)),
        })
    }
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(InkpressError::Config(format!(
            "`INKPRESS_HTTP_TIMEOUT_SECS` must be a positive number of seconds, got {raw:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_defaults_and_overrides() {
        let adapter = OpenAiAdapterBuilder::new().build().unwrap();
        assert_eq!(adapter.client().timeout(), DEFAULT_TIMEOUT);

        let adapter = OpenAiAdapterBuilder::new()
            .with_timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(adapter.client().timeout(), Duration::from_secs(5));
    }

    #[test]
    fn malformed_env_timeout_fails_at_build() {
        let builder = OpenAiAdapterBuilder {
            timeout_env: Some("soon".into()),
            ..OpenAiAdapterBuilder::default()
        };
        assert!(matches!(builder.build(), Err(InkpressError::Config(_))));

        let builder = OpenAiAdapterBuilder {
            timeout_env: Some(" 12 ".into()),
            ..OpenAiAdapterBuilder::default()
        };
        assert_eq!(builder.build().unwrap().client().timeout(), Duration::from_secs(12));
    }
}

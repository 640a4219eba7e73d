use std::{fmt, future::Future, pin::Pin};

use futures_core::stream::Stream;

use crate::{cancel::CancelHandle, config::ProviderSettings, error::Result, generic::GenericMessage};

/// A **backend** turns chat messages into a network call to a concrete
/// provider and extracts the assistant's text from the reply.
///
/// The method returns a [`Pin<Box<dyn Future>>`] so the trait stays
/// object-safe without pulling in `async_trait`.
pub trait ChatCompletionProvider: Send + Sync {
    /// Perform a single non-streaming round-trip and return the reply text.
    fn chat_complete<'p>(
        &'p self,
        params: ChatCompleteParameters,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'p>>;
}

/// A provider that can deliver the model’s answer **incrementally**.
///
/// The stream yields UTF-8 text fragments in the order the provider framed
/// them.  It ends without an error once `cancel` is signalled; callers tell
/// "finished" and "cancelled" apart by asking the handle.
pub trait StreamingChatProvider: ChatCompletionProvider {
    type Delta<'s>: Stream<Item = Result<String>> + Send + 's
    where
        Self: 's;

    /// Start a streaming chat completion.
    fn chat_complete_stream<'s>(
        &'s self,
        params: ChatCompleteParameters,
        cancel: CancelHandle,
    ) -> Self::Delta<'s>;
}

/// Where a request goes and how it authenticates.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub provider_id: String,
    pub api_key: String,
    /// Full chat-completions URL.
    pub url: String,
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("provider_id", &self.provider_id)
            .field("api_key", &"<redacted>")
            .field("url", &self.url)
            .finish()
    }
}

impl From<&ProviderSettings> for Endpoint {
    fn from(value: &ProviderSettings) -> Self {
        Self {
            provider_id: value.provider_id.clone(),
            api_key: value.api_key.clone(),
            url: value.api_domain.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatCompleteParameters {
    pub endpoint: Endpoint,
    pub model: String,
    pub messages: Vec<GenericMessage>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    /// Ask the provider for extended reasoning (deep-thinking mode).
    pub extended_reasoning: bool,
}

impl ChatCompleteParameters {
    pub fn new(endpoint: Endpoint, model: impl Into<String>, messages: Vec<GenericMessage>) -> Self {
        Self {
            endpoint,
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
            extended_reasoning: false,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_extended_reasoning(mut self, enabled: bool) -> Self {
        self.extended_reasoning = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_debug_hides_the_api_key() {
        let endpoint = Endpoint::from(&ProviderSettings::new("https://x/v1", "sk-secret", "m"));
        let rendered = format!("{endpoint:?}");

        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("https://x/v1"));
    }
}

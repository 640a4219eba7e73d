//! Turning a caller's prompt plus the current settings into one request.
//!
//! Message order is fixed: preset system words first, then the prompt's own
//! messages with empty contents dropped.  Deep-thinking mode rewrites the
//! prompt, caps the temperature and asks the provider for extended reasoning.

use crate::{
    cancel::CancelHandle,
    config::ProviderSettings,
    generic::{GenericMessage, GenericRole, Prompt},
    provider::{ChatCompleteParameters, Endpoint},
};

/// Instruction prepended to the user's text in deep-thinking mode.
pub const DEEP_THINKING_PREFIX: &str =
    "Please analyze in depth and answer the following question in detail:\n\n";

/// Upper bound for the temperature in deep-thinking mode.
pub const DEEP_THINKING_MAX_TEMPERATURE: f64 = 0.3;

/// What the caller wants streamed.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    pub prompt: Prompt,
    pub deep_thinking: bool,
}

impl StreamRequest {
    pub fn new(prompt: impl Into<Prompt>) -> Self {
        Self {
            prompt: prompt.into(),
            deep_thinking: false,
        }
    }

    pub fn with_deep_thinking(mut self, enabled: bool) -> Self {
        self.deep_thinking = enabled;
        self
    }
}

/// Rewrite `prompt` for deep-thinking mode.
///
/// * text: the whole prompt gets the prefix;
/// * messages: only the first `user` message does;
/// * pair: the `user` half does, even when it was missing.
pub fn apply_deep_thinking(prompt: Prompt) -> Prompt {
    match prompt {
        Prompt::Text(text) => Prompt::Text(format!("{DEEP_THINKING_PREFIX}{text}")),
        Prompt::Messages(mut messages) => {
            if let Some(first_user) = messages.iter_mut().find(|m| m.role == GenericRole::User) {
                first_user.content = format!("{DEEP_THINKING_PREFIX}{}", first_user.content);
            }
            Prompt::Messages(messages)
        }
        Prompt::Pair { system, user } => Prompt::Pair {
            system,
            user: Some(format!("{DEEP_THINKING_PREFIX}{}", user.unwrap_or_default())),
        },
    }
}

/// Everything one call needs, derived once when the call starts.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The prompt as the caller supplied it.
    pub prompt: Prompt,
    pub messages: Vec<GenericMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub deep_thinking: bool,
    pub cancel: CancelHandle,
}

impl RequestContext {
    pub fn new(settings: &ProviderSettings, request: StreamRequest) -> Self {
        let StreamRequest {
            prompt,
            deep_thinking,
        } = request;

        let processed = if deep_thinking {
            apply_deep_thinking(prompt.clone())
        } else {
            prompt.clone()
        };

        let messages = settings
            .preset_system_messages
            .iter()
            .map(|word| GenericMessage::system(word.as_str()))
            .chain(
                processed
                    .into_messages()
                    .into_iter()
                    .filter(|m| !m.content.is_empty()),
            )
            .collect();

        let temperature = if deep_thinking {
            settings.temperature.min(DEEP_THINKING_MAX_TEMPERATURE)
        } else {
            settings.temperature
        };

        Self {
            prompt,
            messages,
            temperature,
            max_tokens: settings.max_tokens,
            deep_thinking,
            cancel: CancelHandle::new(),
        }
    }

    /// Provider-facing parameters for this call.
    pub fn parameters(&self, settings: &ProviderSettings) -> ChatCompleteParameters {
        ChatCompleteParameters::new(
            Endpoint::from(settings),
            settings.model.clone(),
            self.messages.clone(),
        )
        .with_temperature(self.temperature)
        .with_max_tokens(self.max_tokens)
        .with_extended_reasoning(self.deep_thinking)
    }
}

//! Per-provider differences, as a plain table.
//!
//! Every provider the editor knows speaks the OpenAI chat-completions
//! dialect, so today each [`ProviderProfile`] points at the same default
//! functions and only the display name differs.  The table stays keyed by
//! provider id so a provider can override one function without touching any
//! call site.  Unknown ids resolve to [`DEFAULT_PROFILE`], whose every
//! field is the default implementation.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;

use crate::error::OpenAiError;

pub type HeaderBuilder = fn(&str) -> Result<HeaderMap, OpenAiError>;
pub type TokenExtractor = fn(&Value) -> Option<String>;
pub type ContentExtractor = fn(&Value) -> String;
pub type ErrorFormatter = fn(&str, u16, Option<&str>) -> String;

/// Static description of one provider.
#[derive(Debug, Clone, Copy)]
pub struct ProviderProfile {
    pub id: &'static str,
    /// Substituted into authentication and access error messages.
    pub display_name: &'static str,
    pub build_headers: HeaderBuilder,
    pub extract_stream_token: TokenExtractor,
    pub extract_final_content: ContentExtractor,
    pub format_error: ErrorFormatter,
}

impl ProviderProfile {
    const fn openai_compatible(id: &'static str, display_name: &'static str) -> Self {
        Self {
            id,
            display_name,
            build_headers: bearer_headers,
            extract_stream_token: delta_content,
            extract_final_content: message_content,
            format_error: status_message,
        }
    }

    pub fn headers(&self, api_key: &str) -> Result<HeaderMap, OpenAiError> {
        (self.build_headers)(api_key)
    }

    pub fn stream_token(&self, payload: &Value) -> Option<String> {
        (self.extract_stream_token)(payload)
    }

    pub fn final_content(&self, payload: &Value) -> String {
        (self.extract_final_content)(payload)
    }

    pub fn error_message(&self, status: u16, status_text: Option<&str>) -> String {
        (self.format_error)(self.display_name, status, status_text)
    }
}

pub static DEFAULT_PROFILE: ProviderProfile = ProviderProfile::openai_compatible("default", "AI");

static PROFILES: [ProviderProfile; 8] = [
    ProviderProfile::openai_compatible("openai", "OpenAI"),
    ProviderProfile::openai_compatible("nvidia", "NVIDIA AI"),
    ProviderProfile::openai_compatible("qwen", "Qwen"),
    ProviderProfile::openai_compatible("zhipu", "Zhipu AI"),
    ProviderProfile::openai_compatible("deepseek", "DeepSeek"),
    ProviderProfile::openai_compatible("doubao", "Doubao"),
    ProviderProfile::openai_compatible("tencent", "Tencent Yuanbao"),
    ProviderProfile::openai_compatible("custom", "AI"),
];

/// Look up a provider by id, falling back to [`DEFAULT_PROFILE`].
pub fn profile_for(provider_id: &str) -> &'static ProviderProfile {
    PROFILES
        .iter()
        .find(|p| p.id == provider_id)
        .unwrap_or(&DEFAULT_PROFILE)
}

pub fn known_profiles() -> &'static [ProviderProfile] {
    &PROFILES
}

/// `Content-Type: application/json` and `Authorization: Bearer <key>`.
pub fn bearer_headers(api_key: &str) -> Result<HeaderMap, OpenAiError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);

    Ok(headers)
}

/// `choices[0].delta.content`; missing, empty or non-string means no token.
pub fn delta_content(payload: &Value) -> Option<String> {
    payload
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// `choices[0].message.content`, or an empty string.
pub fn message_content(payload: &Value) -> String {
    payload
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

pub fn status_message(provider_name: &str, status: u16, status_text: Option<&str>) -> String {
    match status {
        401 => format!(
            "Authentication failed: invalid API key. Please check that your {provider_name} API key is configured correctly."
        ),
        403 => format!(
            "The {provider_name} API key has no access or its quota is exhausted. Please check your API key or contact the provider."
        ),
        429 => "Too many requests (rate limited), please try again later.".to_owned(),
        500 => "AI server error, please try again later.".to_owned(),
        _ => format!(
            "Request failed ({status}): {}",
            status_text.filter(|t| !t.is_empty()).unwrap_or("Unknown error")
        ),
    }
}

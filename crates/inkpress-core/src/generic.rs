//! Generic message, role and prompt types used by the *inkpress-core* crate.
//!
//! They mirror the concepts exposed by every OpenAI-compatible provider:
//! “system”, “user”, “assistant” and “tool”.  Backend crates convert them
//! into their wire structs via plain `From` impls.
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A single chat message, independent of any specific provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericMessage {
    pub role: GenericRole,
    pub content: String,
}

impl GenericMessage {
    /// Convenience constructor mirroring the field order used by common HTTP
    /// APIs (`role`, then `content`).
    ///
    /// ```rust
    /// use inkpress_core::generic::{GenericMessage, GenericRole};
    ///
    /// let sys = GenericMessage::new(GenericRole::System, "You are a copy editor.");
    /// assert_eq!(sys.content, "You are a copy editor.");
    /// ```
    pub fn new(role: GenericRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(GenericRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(GenericRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(GenericRole::Assistant, content)
    }
}

/// High-level chat roles recognised by OpenAI-compatible providers.
///
/// The `Display` implementation renders the canonical lowercase name.
#[derive(Debug, Clone, Serialize, Deserialize, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GenericRole {
    /// “System” messages define global behaviour and style guidelines.
    System,
    /// Messages produced by the assistant / model.
    Assistant,
    /// Messages originating from the human user.
    User,
    /// Structured results injected back into the conversation.
    Tool,
}

impl Display for GenericRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenericRole::System => write!(f, "system"),
            GenericRole::Assistant => write!(f, "assistant"),
            GenericRole::User => write!(f, "user"),
            GenericRole::Tool => write!(f, "tool"),
        }
    }
}

/// What the editor asks the model.
///
/// The three shapes cover every call site in the editor: a free-form
/// instruction, a full conversation, or a system/user pair produced by one
/// of the canned prompts in `inkpress-prompt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prompt {
    Text(String),
    Messages(Vec<GenericMessage>),
    Pair {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        system: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<String>,
    },
}

impl Prompt {
    pub fn pair(system: impl Into<String>, user: impl Into<String>) -> Self {
        Prompt::Pair {
            system: Some(system.into()),
            user: Some(user.into()),
        }
    }

    /// Expand the prompt into chat messages, in order.
    ///
    /// A pair always yields a system message followed by a user message;
    /// missing halves become empty strings and are filtered out later by the
    /// request builder.
    pub fn into_messages(self) -> Vec<GenericMessage> {
        match self {
            Prompt::Text(text) => vec![GenericMessage::user(text)],
            Prompt::Messages(messages) => messages,
            Prompt::Pair { system, user } => vec![
                GenericMessage::system(system.unwrap_or_default()),
                GenericMessage::user(user.unwrap_or_default()),
            ],
        }
    }
}

impl From<&str> for Prompt {
    fn from(value: &str) -> Self {
        Prompt::Text(value.to_owned())
    }
}

impl From<String> for Prompt {
    fn from(value: String) -> Self {
        Prompt::Text(value)
    }
}

impl From<Vec<GenericMessage>> for Prompt {
    fn from(value: Vec<GenericMessage>) -> Self {
        Prompt::Messages(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_expands_to_system_then_user() {
        let messages = Prompt::Pair {
            system: None,
            user: Some("rewrite this".into()),
        }
        .into_messages();

        assert_eq!(
            messages,
            vec![GenericMessage::system(""), GenericMessage::user("rewrite this")]
        );
    }

    #[test]
    fn prompt_deserializes_all_three_shapes() {
        let text: Prompt = serde_json::from_str(r#""hello""#).unwrap();
        assert_eq!(text, Prompt::Text("hello".into()));

        let messages: Prompt =
            serde_json::from_str(r#"[{"role":"user","content":"hi"}]"#).unwrap();
        assert_eq!(messages, Prompt::Messages(vec![GenericMessage::user("hi")]));

        let pair: Prompt = serde_json::from_str(r#"{"system":"be brief"}"#).unwrap();
        assert_eq!(
            pair,
            Prompt::Pair {
                system: Some("be brief".into()),
                user: None
            }
        );
    }
}

//! Builder-style helper for assembling **plain-text prompts** line by line.
//!
//! ```rust
//! use inkpress_prompt::builder::PromptBuilder;
//!
//! let text = PromptBuilder::new()
//!     .add_line("Rewrite the paragraph below.")
//!     .add_blank_line()
//!     .add_line("Requirements:")
//!     .add_bullet("Keep the author's voice")
//!     .finalize();
//!
//! assert_eq!(text, "Rewrite the paragraph below.\n\nRequirements:\n- Keep the author's voice\n");
//! ```
//!
//! Newlines and whitespace are emitted exactly as requested.

use std::fmt::Display;

/// Fluent helper that owns a growing `String`.
#[derive(Debug, Default)]
pub struct PromptBuilder {
    buffer: String,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a line of text and a trailing newline.
    pub fn add_line(mut self, line: impl Display) -> Self {
        self.buffer.push_str(&format!("{line}\n"));
        self
    }

    /// Add a `- item` line.
    pub fn add_bullet(self, item: impl Display) -> Self {
        self.add_line(format_args!("- {item}"))
    }

    /// Add a `- item` line per element.
    pub fn add_bullets<I>(self, items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        items
            .into_iter()
            .fold(self, |builder, item| builder.add_bullet(item))
    }

    pub fn add_blank_line(mut self) -> Self {
        self.buffer.push('\n');
        self
    }

    /// Retrieve the accumulated text and consume the builder.
    pub fn finalize(self) -> String {
        self.buffer
    }
}

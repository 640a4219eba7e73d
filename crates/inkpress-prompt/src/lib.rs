//! Prompt helpers for the Inkpress AI writing assistant.
//!
//! * [`builder::PromptBuilder`] – line-by-line text assembly.
//! * [`css`] – the canned prompt behind the CSS rewrite action.
pub mod builder;
pub mod css;

pub use css::{CssRewriteOption, CssRewriteRequest};

//! Prompt for the "rewrite my theme CSS" action.

use std::{fmt, str::FromStr};

use inkpress_core::{error::InkpressError, generic::Prompt};

use crate::builder::PromptBuilder;

/// One checkbox in the CSS rewrite dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CssRewriteOption {
    Optimize,
    Readability,
    Simplify,
    Comment,
    Selectors,
    Important,
    Media,
    Animation,
}

impl CssRewriteOption {
    pub const ALL: [CssRewriteOption; 8] = [
        CssRewriteOption::Optimize,
        CssRewriteOption::Readability,
        CssRewriteOption::Simplify,
        CssRewriteOption::Comment,
        CssRewriteOption::Selectors,
        CssRewriteOption::Important,
        CssRewriteOption::Media,
        CssRewriteOption::Animation,
    ];

    pub fn key(self) -> &'static str {
        match self {
            CssRewriteOption::Optimize => "optimize",
            CssRewriteOption::Readability => "readability",
            CssRewriteOption::Simplify => "simplify",
            CssRewriteOption::Comment => "comment",
            CssRewriteOption::Selectors => "selectors",
            CssRewriteOption::Important => "important",
            CssRewriteOption::Media => "media",
            CssRewriteOption::Animation => "animation",
        }
    }

    /// The bullet this option contributes to the system prompt.
    pub fn instruction(self) -> &'static str {
        match self {
            CssRewriteOption::Optimize => {
                "Optimize the CSS structure with more sensible selectors and nesting"
            }
            CssRewriteOption::Readability => {
                "Improve readability with appropriate blank lines and indentation"
            }
            CssRewriteOption::Simplify => "Simplify the code by removing redundant declarations",
            CssRewriteOption::Comment => "Add comments explaining the important style blocks",
            CssRewriteOption::Selectors => "Keep the original selector names unchanged",
            CssRewriteOption::Important => "Keep every !important declaration",
            CssRewriteOption::Media => "Keep every media query",
            CssRewriteOption::Animation => "Keep all animation-related code",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|option| option.key() == key)
    }
}

impl fmt::Display for CssRewriteOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for CssRewriteOption {
    type Err = InkpressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s)
            .ok_or_else(|| InkpressError::Invalid(format!("unknown CSS rewrite option: {s:?}")))
    }
}

/// What the user picked in the dialog, as option keys.
///
/// Keys stay strings because they come straight from the UI; unknown keys
/// contribute nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssRewriteRequest {
    pub styles: Vec<String>,
    pub retains: Vec<String>,
    pub css: String,
    pub custom_prompt: Option<String>,
}

impl CssRewriteRequest {
    pub fn new(css: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            ..Self::default()
        }
    }

    pub fn with_style(mut self, option: CssRewriteOption) -> Self {
        self.styles.push(option.key().to_owned());
        self
    }

    pub fn with_retain(mut self, option: CssRewriteOption) -> Self {
        self.retains.push(option.key().to_owned());
        self
    }

    pub fn with_custom_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.custom_prompt = Some(prompt.into());
        self
    }

    pub fn system_prompt(&self) -> String {
        let mut builder = PromptBuilder::new()
            .add_line(
                "You are a professional CSS optimization expert. Your task is to optimize the CSS code according to the following requirements:",
            )
            .add_blank_line()
            .add_line("Optimization requirements:")
            .add_bullets(instructions(&self.styles));

        if !self.retains.is_empty() {
            builder = builder
                .add_blank_line()
                .add_line("Retention requirements:")
                .add_bullets(instructions(&self.retains));
        }

        if let Some(custom) = self.custom_prompt.as_deref().map(str::trim)
            && !custom.is_empty()
        {
            builder = builder
                .add_blank_line()
                .add_line("Custom requirements:")
                .add_line(custom);
        }

        builder
            .add_blank_line()
            .add_line("Follow these steps strictly:")
            .add_line("1. Read the optimization and retention requirements above carefully")
            .add_line("2. Analyze the structure and characteristics of the CSS code")
            .add_line("3. Optimize the code as required while keeping the specified features")
            .add_line("4. Check that the optimized code meets every requirement")
            .add_blank_line()
            .add_line("CSS code to optimize:")
            .add_blank_line()
            .add_line(&self.css)
            .add_blank_line()
            .add_line("Start optimizing:")
            .finalize()
    }

    /// System prompt plus the CSS itself as the user message.
    pub fn into_prompt(self) -> Prompt {
        let system = self.system_prompt();
        Prompt::pair(system, self.css)
    }
}

impl From<CssRewriteRequest> for Prompt {
    fn from(value: CssRewriteRequest) -> Self {
        value.into_prompt()
    }
}

fn instructions(keys: &[String]) -> impl Iterator<Item = &'static str> + '_ {
    keys.iter()
        .filter_map(|key| CssRewriteOption::from_key(key))
        .map(CssRewriteOption::instruction)
}

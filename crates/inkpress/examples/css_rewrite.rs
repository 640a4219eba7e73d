//! # Non-streaming CSS rewrite
//!
//! Builds the CSS rewrite prompt and sends it with `call_ai`, which waits for
//! the whole answer (with the adapter's timeout) instead of streaming.
//!
//! ```bash
//! export INKPRESS_API_DOMAIN=… INKPRESS_API_KEY=… INKPRESS_MODEL=…
//! cargo run -p inkpress --example css_rewrite
//! ```

use std::time::Duration;

use inkpress::{
    AssistantClient,
    config::ProviderSettings,
    openai::OpenAiAdapterBuilder,
    prompt::{CssRewriteOption, CssRewriteRequest},
};

const THEME: &str = r#"
h1 { font-size: 2em; color: #333 !important; }
h1 { margin-bottom: 0.5em; }
@media (max-width: 600px) { h1 { font-size: 1.5em; } }
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let backend = OpenAiAdapterBuilder::new_from_env()
        .with_timeout(Duration::from_secs(60))
        .build()?;
    let client = AssistantClient::new(backend, ProviderSettings::from_env()?);

    let request = CssRewriteRequest::new(THEME)
        .with_style(CssRewriteOption::Simplify)
        .with_style(CssRewriteOption::Readability)
        .with_retain(CssRewriteOption::Important)
        .with_retain(CssRewriteOption::Media)
        .with_custom_prompt("Use rem units for font sizes.");

    let css = client.call_ai(request).await?;
    println!("{css}");
    Ok(())
}

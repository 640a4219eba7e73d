//! # Streaming completion with callbacks
//!
//! Streams a reply into the terminal through an [`FnSink`]; press Ctrl-C to
//! cancel the request mid-flight.
//!
//! ```bash
//! export INKPRESS_API_DOMAIN=https://api.openai.com/v1/chat/completions
//! export INKPRESS_API_KEY=sk-…
//! export INKPRESS_MODEL=gpt-4o-mini
//! export INKPRESS_PROVIDER=openai     # optional, selects error messages
//! RUST_LOG=inkpress_openai=debug cargo run -p inkpress --example chat_stream
//! ```

use std::io::{self, Write};

use inkpress::{
    AssistantClient,
    config::ProviderSettings,
    openai::OpenAiAdapterBuilder,
    request::StreamRequest,
    sink::{FnSink, StreamOutcome},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let backend = OpenAiAdapterBuilder::new_from_env().build()?;
    let client = AssistantClient::new(backend, ProviderSettings::from_env()?);

    let request = StreamRequest::new("Tell me a short story about a markdown editor that learned to write.")
        .with_deep_thinking(std::env::args().any(|arg| arg == "--deep"));

    let mut sink = FnSink::new()
        .with_token(|token| {
            print!("{token}");
            io::stdout().flush().ok();
        })
        .with_error(|err| eprintln!("\n\nError while streaming: {err}"))
        .with_finish(|| println!("\n\nStream finished"));

    let canceller = client.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel_ai_request();
        }
    });

    let outcome = client.stream_ai_content(request, &mut sink).await;

    if outcome == StreamOutcome::Cancelled {
        println!("\n\nCancelled");
    }
    Ok(())
}

//! # Consuming the token stream directly
//!
//! [`AssistantClient::start`] hands back the stream instead of driving a
//! sink.  The handle travels with it, so this example stops after a fixed
//! number of tokens by cancelling its own request.
//!
//! ```bash
//! export INKPRESS_API_DOMAIN=… INKPRESS_API_KEY=… INKPRESS_MODEL=…
//! cargo run -p inkpress --example raw_stream
//! ```

use futures_util::StreamExt;
use inkpress::{
    AssistantClient, config::ProviderSettings, openai::OpenAiAdapterBuilder,
    request::StreamRequest,
};

const TOKEN_LIMIT: usize = 40;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let backend = OpenAiAdapterBuilder::new_from_env().build()?;
    let client = AssistantClient::new(backend, ProviderSettings::from_env()?);

    let mut stream = client.start(StreamRequest::new("List ten tips for writing good headings."))?;
    let mut seen = 0;

    while let Some(token) = stream.next().await {
        print!("{}", token?);
        seen += 1;
        if seen == TOKEN_LIMIT {
            stream.cancel();
        }
    }

    println!(
        "\n\n{seen} tokens, cancelled: {}",
        stream.handle().is_cancelled()
    );
    Ok(())
}

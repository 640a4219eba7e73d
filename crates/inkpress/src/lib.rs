//! # `inkpress` – the umbrella crate
//!
//! One dependency line for the AI side of the Inkpress markdown editor:
//!
//! | Crate                  | What it provides                                                        |
//! |------------------------|-------------------------------------------------------------------------|
//! | **`inkpress-core`**    | `AssistantClient`, prompts, settings, the configuration store, errors   |
//! | **`inkpress-prompt`**  | Prompt builder and canned prompts such as the CSS rewrite               |
//! | **`inkpress-openai`**  | Streaming backend for OpenAI-compatible providers *(feature `openai`)*  |
//!
//! ## Quick example
//!
//! ```rust,no_run
//! use inkpress::{
//!     AssistantClient,
//!     config::ProviderSettings,
//!     openai::OpenAiAdapterBuilder,
//!     request::StreamRequest,
//!     sink::FnSink,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = OpenAiAdapterBuilder::new_from_env().build()?;
//!     let client = AssistantClient::new(backend, ProviderSettings::from_env()?);
//!
//!     let mut sink = FnSink::new()
//!         .with_token(|token| print!("{token}"))
//!         .with_error(|err| eprintln!("\n{err}"));
//!     client
//!         .stream_ai_content(StreamRequest::new("Give this post a title."), &mut sink)
//!         .await;
//!     Ok(())
//! }
//! ```
#![doc(html_root_url = "https://docs.rs/inkpress/latest")]

pub use inkpress_core::*;
pub use inkpress_prompt as prompt;

#[cfg(feature = "openai")]
pub use inkpress_openai as openai;

//! OpenAI-compatible streaming backend for Inkpress.
//!
//! Every supported provider (OpenAI, NVIDIA, Qwen, Zhipu, DeepSeek, Doubao,
//! Tencent and custom endpoints) speaks the chat-completions dialect; the
//! differences live in [`profile`].  [`OpenAiAdapter`] implements the
//! `inkpress_core::provider` traits on top of [`OpenAiClient`], which in turn
//! uses [`sse::SseDecoder`] to turn the response body into tokens.
mod adapter;
pub mod api_v1;
mod client;
pub mod error;
pub mod profile;
mod provider_impl_chat;
mod provider_impl_chat_stream;
pub mod sse;

pub use adapter::{OpenAiAdapter, OpenAiAdapterBuilder};
pub use client::{DEFAULT_TIMEOUT, OpenAiClient};

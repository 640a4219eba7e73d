//! Provider-agnostic building blocks for the Inkpress AI writing assistant.
//!
//! * [`generic`] – prompts and chat messages.
//! * [`config`] – provider settings and the saved-configuration store.
//! * [`provider`] – the traits a backend crate implements.
//! * [`request`] – prompt preprocessing (preset words, deep-thinking mode).
//! * [`client`] – [`AssistantClient`], which runs streaming calls end to end.
//! * [`sink`] / [`cancel`] – callback sinks and per-call cancellation.
pub mod cancel;
pub mod client;
pub mod config;
pub mod error;
pub mod generic;
pub mod provider;
pub mod request;
pub mod sink;

pub use client::{ActiveStream, AssistantClient};

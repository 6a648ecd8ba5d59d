//! Client for the remote generative-AI capability.
//!
//! [`api::GenAiApi`] speaks the `generateContent` REST protocol,
//! [`prompts`] builds the instructions sent with each call, and
//! [`GenAiGenerator`] adapts both to the
//! [`ContentGenerator`](kana_core::generation::ContentGenerator) contract.

pub mod api;
pub mod config;
pub mod fetcher;
pub mod generator;
pub mod prompts;

pub use api::{GenAiApi, GenAiError};
pub use config::GenAiConfig;
pub use fetcher::HttpImageFetcher;
pub use generator::GenAiGenerator;

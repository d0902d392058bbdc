// OpenAI-compatible chat completion backends

pub mod client;
pub mod completion;

pub use client::{OpenAICompatibleConfig, OpenAICompatibleProvider, OPENAI_API_BASE, OPENROUTER_API_BASE};
pub use completion::{chunk_words, CompletionProvider};

//! Concrete [`LlmProvider`](crate::agent::provider::LlmProvider)
//! implementations.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

//! Reasoning-loop agent system.
//!
//! Provides the provider abstraction, one-time provider selection with
//! ordered-credential fallback, and the bounded tool-calling loop that
//! drives the query-resolution pipeline.
//!
//! # Architecture
//!
//! ```text
//! Query → QueryResolver
//!   ├── select_provider (once, at bootstrap)
//!   ├── run_loop (model ↔ retrieval tools, capped)
//!   └── structured-output parser → ValidatedRecord
//! ```

pub mod agentic_loop;
pub mod config;
pub mod executor;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod selector;

pub use agentic_loop::{LoopOutcome, run_loop};
pub use config::{Credential, CredentialKind, ResolverConfig};
pub use executor::ToolExecutor;
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role};
pub use provider::LlmProvider;
pub use selector::select_provider;

//! refdesk - an AI research assistant for book and topic queries.
//!
//! Resolves natural-language queries ("find book X", "research topic Y")
//! by orchestrating a pluggable language-reasoning backend and a set of
//! information-retrieval tools, then coercing the free-text result into a
//! validated structured record for persistence and display.
//!
//! # Architecture
//!
//! ```text
//! HTTP request
//!   └── QueryResolver (pipeline)
//!        ├── select_provider   — ordered-credential fallback, once at boot
//!        ├── run_loop          — bounded model ↔ tool round-trip
//!        │     └── RetrievalTool: book_search / research_overview /
//!        │         wikipedia_search / web_search / fetch_page
//!        ├── parse_book / parse_research — structured-output recovery
//!        └── CsvStore          — append-only persistence
//! ```
//!
//! Tool and network failures are recovered as text observations inside
//! the loop; only provider unavailability, parse failure, and not-found
//! reach the HTTP surface as distinct outcomes.

pub mod agent;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod server;
pub mod store;
pub mod tools;

pub use error::Error;
pub use pipeline::QueryResolver;

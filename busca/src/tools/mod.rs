//! Built-in tools.
//!
//! The assistant registers exactly one capability: [`WebSearchTool`].

pub mod web_search;

pub use web_search::{SearchEngine, SearchResult, WebSearchArgs, WebSearchTool};

//! LLM backend implementations.
//!
//! # Available Backends
//!
//! - [`ollama`] - Ollama local LLM server

pub mod ollama;

pub use ollama::{Ollama, OllamaConfig};

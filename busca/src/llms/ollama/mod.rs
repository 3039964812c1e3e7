//! Ollama API client implementation.
//!
//! This module provides a client for the Ollama local LLM server, supporting
//! non-streaming chat completions through `POST /api/chat`.

mod chat;
mod client;
mod config;

pub use client::Ollama;
pub use config::OllamaConfig;

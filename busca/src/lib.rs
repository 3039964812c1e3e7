//! Busca - a reason-act web search assistant for local language models
//!
//! This crate provides the pieces of a console chat assistant: a bounded
//! conversation history, a reason-act agent runtime that talks to Ollama and
//! searches the web, and the loop that ties them to a terminal.

pub mod agent;
pub mod chat;
pub mod conversation;
pub mod error;
pub mod history;
pub mod llms;
pub mod message;
pub mod prelude;
pub mod prompts;
pub mod tool;
pub mod tools;

pub use error::{Error, LlmError, Result, ToolError};

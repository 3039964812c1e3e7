//! Chat types and the provider trait used by the agent runtime.
//!
//! This module provides:
//! - [`ChatRequest`]: Request parameters for chat completions
//! - [`ChatResponse`]: Response from chat completions
//! - [`ChatProvider`]: Core trait for LLM backends
//!
//! # Example
//!
//! ```rust,ignore
//! use busca::prelude::*;
//!
//! let request = ChatRequest::new("gemma:4b")
//!     .user("Qual a capital da França?")
//!     .stop(vec!["\nObservação:".into()]);
//!
//! let response = provider.chat(&request).await?;
//! println!("{}", response.text());
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;

/// A chat completion request to an LLM.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier (e.g., "gemma:4b"). Empty means the provider default.
    #[serde(default)]
    pub model: String,

    /// Conversation messages.
    #[serde(default)]
    pub messages: Vec<Message>,

    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Stop sequences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

impl ChatRequest {
    /// Creates a new request with the specified model.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Adds a user message.
    #[must_use]
    pub fn user(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the stop sequences.
    #[must_use]
    pub fn stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }
}

/// A chat completion response from an LLM.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated message.
    pub message: Message,

    /// Model identifier used for this response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Whether generation stopped because of the length limit.
    #[serde(default)]
    pub truncated: bool,
}

impl ChatResponse {
    /// Creates a response from text content.
    #[must_use]
    pub fn from_text(content: impl Into<String>) -> Self {
        Self {
            message: Message::assistant(content),
            model: None,
            truncated: false,
        }
    }

    /// Returns the text content of the response.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.message.content
    }
}

/// Trait for providers that support chat completions.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send a chat completion request and receive a complete response.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot be reached, answers with a
    /// non-success status, or sends a body that cannot be decoded.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;

    /// Get the name of this provider.
    ///
    /// Used for error messages and logging.
    fn provider_name(&self) -> &'static str;

    /// Get the default model for this provider.
    fn default_model(&self) -> &str;
}

/// Type alias for an Arc-wrapped `ChatProvider`.
pub type SharedChatProvider = Arc<dyn ChatProvider>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    mod chat_request {
        use super::*;

        #[test]
        fn new_creates_with_model() {
            let req = ChatRequest::new("gemma:4b");
            assert_eq!(req.model, "gemma:4b");
            assert!(req.messages.is_empty());
            assert!(req.stop.is_none());
        }

        #[test]
        fn builder_chains_messages_in_order() {
            let req = ChatRequest::new("m").user("primeiro").user("segundo");
            assert_eq!(req.messages.len(), 2);
            assert_eq!(req.messages[0].role, Role::User);
            assert_eq!(req.messages[1].content, "segundo");
        }

        #[test]
        fn stop_and_temperature_are_set() {
            let req = ChatRequest::new("m")
                .stop(vec!["\nObservação:".to_owned()])
                .temperature(0.0);
            assert_eq!(req.stop.as_deref(), Some(&["\nObservação:".to_owned()][..]));
            assert_eq!(req.temperature, Some(0.0));
        }
    }

    mod chat_response {
        use super::*;

        #[test]
        fn default_is_empty_and_complete() {
            let resp = ChatResponse::default();
            assert_eq!(resp.text(), "");
            assert!(resp.model.is_none());
            assert!(!resp.truncated);
        }

        #[test]
        fn from_text_is_assistant_message() {
            let resp = ChatResponse::from_text("olá");
            assert_eq!(resp.message.role, Role::Assistant);
            assert_eq!(resp.text(), "olá");
            assert!(resp.model.is_none());
        }
    }
}

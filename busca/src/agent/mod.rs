//! Agent runtime: the reason-act loop behind a single trait.
//!
//! The conversation loop only knows [`AgentRuntime`]: it passes the user
//! question with the rendered history and gets back the final answer, or an
//! error it treats as a failed turn.
//!
//! [`AgentExecutor`] is the built-in runtime. Each iteration it:
//!
//! 1. Renders the prompt template with tools, history, question and scratchpad
//! 2. Calls the model with the stop sequence `"\nObservação:"`
//! 3. Parses the completion with [`ReActOutputParser`]
//! 4. Returns the final answer, or runs the requested tool and records the
//!    observation for the next iteration
//!
//! A turn that runs out of iterations still answers, with [`STOPPED_EARLY`].
//!
//! # Example
//!
//! ```rust,ignore
//! use busca::prelude::*;
//!
//! let executor = AgentExecutor::new(Arc::new(Ollama::with_defaults()?), tools)
//!     .max_iterations(15)
//!     .verbose(true);
//!
//! let output = executor
//!     .invoke(&AgentInput::new("Qual a capital da França?", history.render()))
//!     .await?;
//! println!("{}", output.output);
//! ```

mod executor;
mod parser;

pub use executor::{AgentExecutor, STOP_SEQUENCE, STOPPED_EARLY};
pub use parser::{AgentAction, AgentDecision, AgentFinish, OutputParserError, ReActOutputParser};

use async_trait::async_trait;

use crate::error::Result;

/// What the conversation loop hands to the runtime for one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentInput {
    /// The user question, verbatim.
    pub input: String,
    /// Rendered conversation history.
    pub chat_history: String,
}

impl AgentInput {
    /// Create an input.
    #[must_use]
    pub fn new(input: impl Into<String>, chat_history: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            chat_history: chat_history.into(),
        }
    }
}

/// A tool invocation and what it returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentStep {
    /// The action the model asked for.
    pub action: AgentAction,
    /// Text fed back to the model.
    pub observation: String,
}

/// Result of a successful turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentOutput {
    /// The final answer.
    pub output: String,
    /// Steps taken before the answer, oldest first.
    pub intermediate_steps: Vec<AgentStep>,
}

impl AgentOutput {
    /// An output with no intermediate steps.
    #[must_use]
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            intermediate_steps: Vec::new(),
        }
    }
}

/// Something that turns a question plus history into an answer.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Answer one user turn.
    ///
    /// # Errors
    ///
    /// Any failure of the turn: model unreachable, unparseable output with
    /// parsing-error handling disabled, iteration limit exhausted.
    async fn invoke(&self, input: &AgentInput) -> Result<AgentOutput>;
}

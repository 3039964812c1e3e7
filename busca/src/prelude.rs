//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```rust,ignore
//! use busca::prelude::*;
//! ```

pub use crate::agent::{
    AgentAction, AgentDecision, AgentExecutor, AgentFinish, AgentInput, AgentOutput, AgentRuntime,
    AgentStep, OutputParserError, ReActOutputParser, STOPPED_EARLY,
};
pub use crate::chat::{ChatProvider, ChatRequest, ChatResponse, SharedChatProvider};
pub use crate::conversation::{ConversationLoop, LoopState};
pub use crate::error::{Error, LlmError, Result, ToolError};
pub use crate::history::{HistoryBuffer, Turn, TurnRole};
pub use crate::llms::{Ollama, OllamaConfig};
pub use crate::message::{Message, Role};
pub use crate::prompts::{PromptError, PromptTemplate};
pub use crate::tool::{BoxedTool, DynTool, Tool, ToolBox, ToolDefinition};
pub use crate::tools::{SearchEngine, WebSearchTool};

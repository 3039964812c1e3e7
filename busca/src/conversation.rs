//! The interactive chat loop.
//!
//! [`ConversationLoop`] reads one line at a time, sends it with the rendered
//! history to an [`AgentRuntime`], prints the answer and records the
//! exchange. A failed turn is reported and the loop keeps going; only an exit
//! keyword, end of input or a console I/O error stops it.

use std::io::{BufRead, Write};

use tracing::{debug, error};

use crate::agent::{AgentInput, AgentRuntime};
use crate::error::Result;
use crate::history::HistoryBuffer;

/// Inputs that end the conversation (compared case-insensitively, untrimmed).
pub const EXIT_KEYWORDS: [&str; 3] = ["sair", "exit", "quit"];

/// Printed before every read.
pub const PROMPT: &str = "\nVocê: ";

/// Printed when the conversation ends.
pub const FAREWELL: &str = "Encerrando a conversa. Até mais!";

/// Printed around every answer.
pub const SEPARATOR: &str = "---------------------------------";

/// Whether the loop accepts more input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    /// Waiting for the next line.
    #[default]
    AwaitingInput,
    /// The user left.
    Terminated,
}

/// Returns `true` if `input` is one of [`EXIT_KEYWORDS`].
#[must_use]
pub fn is_exit_keyword(input: &str) -> bool {
    let lowered = input.to_lowercase();
    EXIT_KEYWORDS.contains(&lowered.as_str())
}

/// Banner printed once at startup.
#[must_use]
pub fn welcome(model: &str) -> String {
    format!("Bem-vindo ao assistente de busca com {model}!\nDigite 'sair' para encerrar.")
}

/// Drives an [`AgentRuntime`] from a line-oriented console.
#[derive(Debug)]
pub struct ConversationLoop<R> {
    runtime: R,
    history: HistoryBuffer,
    capacity: usize,
    state: LoopState,
}

impl<R: AgentRuntime> ConversationLoop<R> {
    /// Create a loop with an empty history of the default capacity.
    #[must_use]
    pub const fn new(runtime: R) -> Self {
        Self {
            runtime,
            history: HistoryBuffer::new(),
            capacity: HistoryBuffer::DEFAULT_CAPACITY,
            state: LoopState::AwaitingInput,
        }
    }

    /// Keep at most `capacity` turns after each exchange.
    #[must_use]
    pub const fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Conversation so far.
    #[must_use]
    pub const fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> LoopState {
        self.state
    }

    /// The wrapped runtime.
    #[must_use]
    pub const fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Handle one line of input and write the result to `out`.
    ///
    /// Runtime failures are printed and logged; they never end the loop.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if writing to `out` fails.
    pub async fn handle_input<W: Write + Send>(
        &mut self,
        input: &str,
        out: &mut W,
    ) -> Result<LoopState> {
        if self.state == LoopState::Terminated {
            return Ok(self.state);
        }

        if is_exit_keyword(input) {
            writeln!(out, "{FAREWELL}")?;
            self.state = LoopState::Terminated;
            return Ok(self.state);
        }

        let request = AgentInput::new(input, self.history.render());
        match self.runtime.invoke(&request).await {
            Ok(answer) => {
                writeln!(out, "\n{SEPARATOR}")?;
                writeln!(out, "Agente: {}", answer.output)?;
                writeln!(out, "{SEPARATOR}")?;
                self.history.record_exchange(input, answer.output);
                self.history.trim(self.capacity);
                debug!(turns = self.history.len(), "exchange recorded");
            }
            Err(e) => {
                error!(error = %e, "turn failed");
                writeln!(out, "Ocorreu um erro: {e}")?;
                writeln!(out, "Tentando novamente...")?;
            }
        }

        Ok(self.state)
    }

    /// Read lines from `input` until an exit keyword or end of input.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the console cannot be read or written.
    pub async fn run<I, W>(&mut self, mut input: I, mut out: W) -> Result<()>
    where
        I: BufRead + Send,
        W: Write + Send,
    {
        let mut line = String::new();
        while self.state == LoopState::AwaitingInput {
            write!(out, "{PROMPT}")?;
            out.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                writeln!(out, "{FAREWELL}")?;
                self.state = LoopState::Terminated;
                break;
            }

            let text = line.trim_end_matches(['\n', '\r']);
            self.handle_input(text, &mut out).await?;
        }
        out.flush()?;
        Ok(())
    }
}

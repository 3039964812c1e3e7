//! Bounded conversation history.
//!
//! The conversation loop owns one [`HistoryBuffer`]. After every successful
//! exchange it appends the user turn and the agent turn, then trims the
//! buffer back to its capacity so only the most recent exchanges are sent to
//! the model.

use std::fmt;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnRole {
    /// Text typed by the user.
    User,
    /// Final answer produced by the agent runtime.
    Agent,
}

impl TurnRole {
    /// Label used when the history is rendered into the prompt.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "Usuário",
            Self::Agent => "Agente",
        }
    }
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One utterance in the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    role: TurnRole,
    text: String,
}

impl Turn {
    /// Create a turn.
    #[must_use]
    pub fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    /// A user turn.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(TurnRole::User, text)
    }

    /// An agent turn.
    #[must_use]
    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(TurnRole::Agent, text)
    }

    /// Who produced the turn.
    #[must_use]
    pub const fn role(&self) -> TurnRole {
        self.role
    }

    /// The turn text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.role, self.text)
    }
}

/// Ordered list of turns, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryBuffer {
    turns: Vec<Turn>,
}

impl HistoryBuffer {
    /// Turns kept by the conversation loop (five exchanges).
    pub const DEFAULT_CAPACITY: usize = 10;

    /// Rendering of an empty buffer.
    pub const EMPTY_SENTINEL: &'static str = "Nenhuma interação anterior.";

    /// Create an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self { turns: Vec::new() }
    }

    /// Push a turn at the end.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Append a user turn followed by an agent turn.
    pub fn record_exchange(&mut self, user: impl Into<String>, agent: impl Into<String>) {
        self.append(Turn::user(user));
        self.append(Turn::agent(agent));
    }

    /// Keep only the last `max_len` turns.
    pub fn trim(&mut self, max_len: usize) {
        let excess = self.turns.len().saturating_sub(max_len);
        if excess > 0 {
            self.turns.drain(..excess);
        }
    }

    /// Render one `label: text` line per turn, or the sentinel when empty.
    #[must_use]
    pub fn render(&self) -> String {
        if self.turns.is_empty() {
            return Self::EMPTY_SENTINEL.to_owned();
        }
        self.turns
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether there are no turns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Iterate turns, oldest first.
    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    /// Drop every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

impl<'a> IntoIterator for &'a HistoryBuffer {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

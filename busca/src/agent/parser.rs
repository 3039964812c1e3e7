//! Parser for reason-act completions.

use std::sync::LazyLock;

use regex::Regex;

use crate::tool::strip_quotes;

/// Marker preceding the final answer.
pub(crate) const FINAL_ANSWER: &str = "Resposta Final:";

/// `Ferramenta: <name>` ... `Entrada da Ferramenta: <input>`.
static ACTION_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?s)Ferramenta\s*\d*\s*:[\s]*(.*?)[\s]*Entrada\s+da\s+Ferramenta\s*\d*\s*:[\s]*(.*)",
    )
    .ok()
});

/// A `Ferramenta:` line that is not part of `Entrada da Ferramenta:`.
static ACTION_LINE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*Ferramenta\s*\d*\s*:").ok());

/// The model asked to run a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentAction {
    /// Tool name.
    pub tool: String,
    /// Free-text tool input.
    pub tool_input: String,
    /// The full completion that produced this action.
    pub log: String,
}

impl AgentAction {
    /// Create an action.
    #[must_use]
    pub fn new(
        tool: impl Into<String>,
        tool_input: impl Into<String>,
        log: impl Into<String>,
    ) -> Self {
        Self {
            tool: tool.into(),
            tool_input: tool_input.into(),
            log: log.into(),
        }
    }
}

/// The model produced its final answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentFinish {
    /// Text after `Resposta Final:`.
    pub output: String,
    /// The full completion.
    pub log: String,
}

/// What a completion asks the executor to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentDecision {
    /// Run a tool and continue.
    Action(AgentAction),
    /// Stop with an answer.
    Finish(AgentFinish),
}

/// A completion that does not follow the reason-act format.
///
/// Each variant carries the offending completion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum OutputParserError {
    /// Neither a tool nor a final answer.
    #[error("missing 'Ferramenta:' after 'Raciocínio:' in: {0}")]
    MissingAction(String),

    /// A tool without its input.
    #[error("missing 'Entrada da Ferramenta:' after 'Ferramenta:' in: {0}")]
    MissingActionInput(String),

    /// A tool and a final answer in the same completion.
    #[error("found both a tool and a final answer in: {0}")]
    Ambiguous(String),
}

impl OutputParserError {
    /// The completion that failed to parse.
    #[must_use]
    pub fn llm_output(&self) -> &str {
        match self {
            Self::MissingAction(text) | Self::MissingActionInput(text) | Self::Ambiguous(text) => {
                text
            }
        }
    }

    /// Hint sent back to the model when parsing errors are handled.
    #[must_use]
    pub const fn observation(&self) -> &'static str {
        match self {
            Self::MissingAction(_) => {
                "Formato inválido: faltou 'Ferramenta:' depois de 'Raciocínio:'. \
                 Use uma ferramenta ou escreva 'Resposta Final:'."
            }
            Self::MissingActionInput(_) => {
                "Formato inválido: faltou 'Entrada da Ferramenta:' depois de 'Ferramenta:'."
            }
            Self::Ambiguous(_) => {
                "Formato inválido: a resposta contém uma ferramenta e uma resposta final. \
                 Escolha apenas uma."
            }
        }
    }
}

/// Parses completions written in the reason-act vocabulary.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReActOutputParser;

impl ReActOutputParser {
    /// Parse one completion.
    ///
    /// # Errors
    ///
    /// Returns an [`OutputParserError`] when the text has no usable action or
    /// final answer, or has both.
    pub fn parse(text: &str) -> Result<AgentDecision, OutputParserError> {
        let action = ACTION_RE.as_ref().and_then(|re| re.captures(text));
        let final_answer = text.rfind(FINAL_ANSWER);

        match (action, final_answer) {
            (Some(_), Some(_)) => Err(OutputParserError::Ambiguous(text.to_owned())),
            (None, Some(pos)) => Ok(AgentDecision::Finish(AgentFinish {
                output: text[pos + FINAL_ANSWER.len()..].trim().to_owned(),
                log: text.to_owned(),
            })),
            (Some(caps), None) => {
                let tool = caps.get(1).map_or("", |m| m.as_str());
                let raw_input = caps.get(2).map_or("", |m| m.as_str());
                let raw_input = raw_input
                    .split_once("Observação:")
                    .map_or(raw_input, |(before, _)| before);
                Ok(AgentDecision::Action(AgentAction::new(
                    strip_quotes(tool.trim()),
                    strip_quotes(raw_input.trim()),
                    text,
                )))
            }
            (None, None) => {
                let has_action = ACTION_LINE_RE
                    .as_ref()
                    .is_some_and(|re| re.is_match(text));
                if has_action {
                    Err(OutputParserError::MissingActionInput(text.to_owned()))
                } else {
                    Err(OutputParserError::MissingAction(text.to_owned()))
                }
            }
        }
    }
}

//! Prompt template for the reason-act agent.
//!
//! Templates are Jinja2 text rendered with minijinja. The agent runtime
//! fills:
//!
//! - `tools`: `name: description` lines for every registered tool
//! - `tool_names`: comma separated tool names
//! - `chat_history`: rendered conversation history
//! - `input`: the user question
//! - `agent_scratchpad`: previous reasoning steps of the current turn

use std::collections::{BTreeSet, HashMap};

use minijinja::{Environment, UndefinedBehavior};

/// Variables a reason-act template must reference.
pub const REQUIRED_VARIABLES: [&str; 4] = ["tools", "tool_names", "input", "agent_scratchpad"];

/// Built-in reason-act template (Portuguese vocabulary).
pub const REACT_PROMPT: &str = "Responda às seguintes perguntas da melhor forma possível. \
Você tem acesso às seguintes ferramentas:

{{ tools }}

Use o seguinte formato:

Pergunta: a pergunta de entrada que você deve responder
Raciocínio: você deve sempre pensar sobre o que fazer
Ferramenta: o nome da ferramenta a ser usada, deve ser uma de [{{ tool_names }}]
Entrada da Ferramenta: a entrada para a ferramenta
Observação: o resultado da ferramenta
... (este Raciocínio/Ferramenta/Entrada da Ferramenta/Observação pode se repetir N vezes)
Raciocínio: agora eu sei a resposta final
Resposta Final: a resposta final para a pergunta original

Comece!

Histórico da Conversa:
{{ chat_history }}

Pergunta: {{ input }}
Raciocínio:{{ agent_scratchpad }}";

/// Jinja environment for prompt templates.
///
/// Undefined variables are errors, never empty strings.
fn engine<'source>() -> Environment<'source> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_trim_blocks(false);
    env.set_lstrip_blocks(false);
    env
}

/// Errors produced while compiling or rendering a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum PromptError {
    /// The template is not valid Jinja syntax.
    #[error("template syntax error: {0}")]
    Syntax(String),

    /// Rendering failed.
    #[error("template render error: {0}")]
    Render(String),

    /// A variable referenced by the template has no value.
    #[error("missing value for template variable '{0}'")]
    MissingVariable(String),

    /// The template lacks a variable the agent needs.
    #[error("template never uses required variable '{0}'")]
    MissingPlaceholder(String),
}

/// A compiled-once, validated prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
    variables: BTreeSet<String>,
}

impl PromptTemplate {
    /// Compile a template and collect the variables it reads.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Syntax`] if minijinja rejects the source.
    pub fn new(source: impl Into<String>) -> Result<Self, PromptError> {
        let source = source.into();
        let variables = {
            let env = engine();
            let template = env
                .template_from_str(&source)
                .map_err(|e| PromptError::Syntax(e.to_string()))?;
            template.undeclared_variables(false).into_iter().collect()
        };
        Ok(Self { source, variables })
    }

    /// The built-in reason-act template.
    #[must_use]
    pub fn react() -> Self {
        Self::new(REACT_PROMPT).unwrap_or_else(|_| Self {
            source: REACT_PROMPT.to_owned(),
            variables: REQUIRED_VARIABLES.iter().map(|v| (*v).to_owned()).collect(),
        })
    }

    /// Compile a template and check it uses every reason-act variable.
    ///
    /// # Errors
    ///
    /// Returns a syntax error or [`PromptError::MissingPlaceholder`].
    pub fn react_from(source: impl Into<String>) -> Result<Self, PromptError> {
        let template = Self::new(source)?;
        template.validate_react()?;
        Ok(template)
    }

    /// Check that the template uses every reason-act variable.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::MissingPlaceholder`] naming the first absent one.
    pub fn validate_react(&self) -> Result<(), PromptError> {
        REQUIRED_VARIABLES
            .iter()
            .find(|required| !self.variables.contains(**required))
            .map_or(Ok(()), |missing| {
                Err(PromptError::MissingPlaceholder((*missing).to_owned()))
            })
    }

    /// Top-level variables the template reads, sorted by name.
    #[must_use]
    pub fn variables(&self) -> Vec<&str> {
        self.variables.iter().map(String::as_str).collect()
    }

    /// Render the template.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::MissingVariable`] if a variable has no value,
    /// or [`PromptError::Render`] if minijinja fails.
    pub fn format(&self, values: &HashMap<&str, String>) -> Result<String, PromptError> {
        if let Some(missing) = self
            .variables
            .iter()
            .find(|name| !values.contains_key(name.as_str()))
        {
            return Err(PromptError::MissingVariable(missing.clone()));
        }

        engine()
            .render_str(&self.source, values)
            .map_err(|e| PromptError::Render(e.to_string()))
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::react()
    }
}

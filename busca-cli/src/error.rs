//! Error types for the busca CLI.

use crate::config::ConfigError;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// Anything that stops the CLI before or outside the chat loop.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration could not be read, parsed or validated.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The assistant could not be built or the console failed.
    #[error("{0}")]
    Agent(#[from] busca::Error),
}

impl CliError {
    /// Create an invalid-configuration error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::Config(ConfigError::InvalidValue(message.into()))
    }
}

impl From<busca::prompts::PromptError> for CliError {
    fn from(err: busca::prompts::PromptError) -> Self {
        Self::invalid_config(format!("agent.prompt_template: {err}"))
    }
}

impl From<busca::ToolError> for CliError {
    fn from(err: busca::ToolError) -> Self {
        Self::Agent(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_errors_are_configuration_errors() {
        let err = CliError::from(busca::prompts::PromptError::MissingPlaceholder("input".into()));
        assert!(matches!(err, CliError::Config(ConfigError::InvalidValue(_))));
        assert!(err.to_string().starts_with("configuration error: invalid config value: agent.prompt_template"));
    }

    #[test]
    fn library_errors_keep_their_message() {
        let err = CliError::from(busca::Error::agent("boom"));
        assert_eq!(err.to_string(), "Agent error: boom");
    }
}
